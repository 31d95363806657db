//! Markdown fence stripping for service output.
//!
//! Services like to wrap JSON and source code in fenced blocks. Before the
//! text is parsed or executed the fence is removed: when the trimmed text
//! begins with a fence marker its first line is dropped (whatever language
//! tag it carries) together with everything from the last fence marker
//! onward. The rule is reapplied while the result still opens with a fence,
//! and a dangling closing fence line with no opener is dropped too.

/// Markdown fence marker.
pub const FENCE: &str = "```";

/// Strip leading/trailing fenced-block delimiters from service output.
pub fn strip_fences(text: &str) -> String {
    let mut current = text.trim();

    while current.starts_with(FENCE) {
        let body = match current.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        };
        let body = match body.rfind(FENCE) {
            Some(idx) => &body[..idx],
            None => body,
        };
        current = body.trim();
    }

    if let Some((head, last_line)) = current.rsplit_once('\n')
        && last_line.trim_start().starts_with(FENCE)
    {
        current = head.trim_end();
    }

    current.to_string()
}
