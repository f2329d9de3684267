pub mod catalog;
pub mod check;
pub mod evaluate;
pub mod init;
pub mod questions;

/// Shorten `text` to at most `max` characters for table cells.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let text = text.replace('\n', " ");
    if text.chars().count() <= max {
        return text;
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate("Define osmosis.", 40), "Define osmosis.");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        assert_eq!(truncate("éééééééééé", 6), "ééé...");
    }

    #[test]
    fn newlines_flattened() {
        assert_eq!(truncate("a\nb", 10), "a b");
    }
}
