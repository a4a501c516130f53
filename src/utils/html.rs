use ammonia;

/// Strips unsafe markup from user-supplied free text (descriptions, messages, review comments).
///
/// Safe formatting tags such as <b> and <p> survive; <script>, <iframe> and event-handler
/// attributes are removed together with script bodies.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input.trim())
}

/// Like `clean_html`, for optional fields. Blank input becomes `None`.
pub fn clean_optional(input: Option<String>) -> Option<String> {
    input
        .map(|s| clean_html(&s))
        .filter(|s| !s.is_empty())
}
