/// Safely truncate a UTF-8 string to a maximum number of characters
///
/// This function ensures that the truncation happens at character boundaries,
/// not byte boundaries, preventing panics when dealing with multi-byte UTF-8
/// characters. Used when logging excerpts of external API responses.
///
/// # Arguments
/// * `input` - The string to truncate
/// * `max_chars` - Maximum number of characters to keep
///
/// # Returns
/// * `&str` - A slice of the input string, truncated to at most `max_chars` characters
pub fn safe_truncate(input: &str, max_chars: usize) -> &str {
    if input.len() <= max_chars {
        input
    } else {
        // Find a safe truncation point at a character boundary
        match input.char_indices().nth(max_chars) {
            Some((byte_index, _)) => &input[..byte_index],
            None => input, // Less than max_chars characters total
        }
    }
}
