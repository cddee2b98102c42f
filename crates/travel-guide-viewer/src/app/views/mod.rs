//! Pages and shared chrome of the application

pub mod admin;
pub mod detail;
pub mod list;
pub mod status;

/// Shorten `text` to `max_chars` characters, marking the cut with `…`
pub fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}
