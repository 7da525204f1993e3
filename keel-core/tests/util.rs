#[cfg(test)]
mod tests {
    use indoc::indoc;
    use keel_core::{compact_whitespace, prefix_at_boundary, truncate_long};

    #[test]
    fn compact() {
        assert_eq!(
            compact_whitespace(indoc! {"
                SELECT symbol,
                       quantity
                FROM   trades
                WHERE  quantity > 10
            "}),
            "SELECT symbol, quantity FROM trades WHERE quantity > 10"
        );
        assert_eq!(compact_whitespace(" \t\n"), "");
    }

    #[test]
    fn boundary() {
        assert_eq!(prefix_at_boundary("hello", 10), "hello");
        assert_eq!(prefix_at_boundary("hello", 3), "hel");
        assert_eq!(prefix_at_boundary("€uro", 1), "");
        assert_eq!(prefix_at_boundary("€uro", 3), "€");
    }

    #[test]
    fn truncate() {
        let short = "SELECT 1";
        assert_eq!(format!("{}", truncate_long!(short)), "SELECT 1");
        let long = format!("SELECT '{}'", "ä".repeat(400));
        let truncated = format!("{}", truncate_long!(long));
        assert!(truncated.len() <= 500);
        assert!(truncated.ends_with("..."));
        assert!(long.starts_with(truncated.trim_end_matches("...")));
    }
}
