use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging for binaries and tools
///
/// The `RUST_LOG` environment variable takes precedence; otherwise the
/// crate logs at the given level and third-party modules stay at warn.
/// Safe to call more than once (later calls are ignored), which keeps it
/// usable from tests.
pub fn init(default_level: LevelFilter) {
    let mut builder = Builder::new();

    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module("artistimage", default_level);
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .ok();
}
