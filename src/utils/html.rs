/// Clean author-supplied HTML with ammonia.
///
/// Whitelist-based: safe tags (<b>, <p>) survive, <script>/<iframe> and
/// event-handler attributes are stripped. Applied to quiz, question and option
/// text before storage; plain text passes through unchanged apart from entity
/// escaping of `<`, `>` and `&`.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Trims and cleans an optional field, mapping blank input to `None`.
pub fn clean_optional(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(clean_html)
}
