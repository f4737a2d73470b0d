use regex::Regex;
use std::sync::LazyLock;

// `.` does not cross newlines, so a directive broken over lines never matches.
static GENERATE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[GENERATE_IMAGE:\s*(.*?)\]\]").unwrap());

/// Finds the first `[[GENERATE_IMAGE: <prompt>]]` directive in model output and
/// returns its prompt. Unterminated directives and empty prompts yield `None`.
pub fn extract_image_prompt(text: &str) -> Option<String> {
    GENERATE_IMAGE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|prompt| !prompt.is_empty())
        .map(String::from)
}
