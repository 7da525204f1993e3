/// Collapses every run of whitespace into a single space.
pub fn compact_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest prefix of `value` not exceeding `max` bytes that ends on a char boundary.
pub fn prefix_at_boundary(value: &str, max: usize) -> &str {
    let mut end = max.min(value.len());
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::prefix_at_boundary(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Logs the error and evaluates to it.
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        let error = $error;
        log::error!("{:#}", error);
        error
    }};
}
