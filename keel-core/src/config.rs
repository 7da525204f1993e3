use crate::{Context, Error, Result, compact_whitespace, truncate_long};
use std::{borrow::Cow, str::FromStr};

/// Logs every command text right before it is prepared.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatementLogger {
    /// Also print the statements to stdout.
    pub show_sql: bool,
    /// Collapse the whitespace of the statements before logging them.
    pub format_sql: bool,
}

impl StatementLogger {
    pub fn log(&self, sql: &str) {
        let sql = if self.format_sql {
            Cow::Owned(compact_whitespace(sql))
        } else {
            Cow::Borrowed(sql)
        };
        log::debug!(target: "keel::sql", "{}", truncate_long!(sql));
        if self.show_sql {
            println!("keel: {}", sql);
        }
    }
}

/// Settings of a logical connection consulted while preparing statements.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub generated_keys_enabled: bool,
    pub scrollable_result_sets_enabled: bool,
    /// Fetch size hint for query statements, `None` leaves the driver default.
    pub fetch_size: Option<u32>,
    pub statement_logger: StatementLogger,
}

impl SessionConfig {
    pub const GENERATED_KEYS: &'static str = "keel.generated_keys";
    pub const SCROLLABLE_RESULT_SETS: &'static str = "keel.scrollable_result_sets";
    pub const FETCH_SIZE: &'static str = "keel.fetch_size";
    pub const SHOW_SQL: &'static str = "keel.show_sql";
    pub const FORMAT_SQL: &'static str = "keel.format_sql";

    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_generated_keys(mut self, enabled: bool) -> Self {
        self.generated_keys_enabled = enabled;
        self
    }

    pub fn with_scrollable_result_sets(mut self, enabled: bool) -> Self {
        self.scrollable_result_sets_enabled = enabled;
        self
    }

    pub fn with_fetch_size(mut self, fetch_size: Option<u32>) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn with_statement_logger(mut self, statement_logger: StatementLogger) -> Self {
        self.statement_logger = statement_logger;
        self
    }

    /// Build the configuration from `keel.*` key value pairs, other keys are ignored.
    ///
    /// An empty `keel.fetch_size` means no hint.
    pub fn from_properties<I, K, V>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut result = Self::default();
        for (key, value) in properties {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            match key {
                Self::GENERATED_KEYS => result.generated_keys_enabled = parse(key, value)?,
                Self::SCROLLABLE_RESULT_SETS => {
                    result.scrollable_result_sets_enabled = parse(key, value)?
                }
                Self::FETCH_SIZE => {
                    result.fetch_size = if value.is_empty() {
                        None
                    } else {
                        Some(parse(key, value)?)
                    }
                }
                Self::SHOW_SQL => result.statement_logger.show_sql = parse(key, value)?,
                Self::FORMAT_SQL => result.statement_logger.format_sql = parse(key, value)?,
                _ => {
                    if key.starts_with("keel.") {
                        log::warn!("Unknown configuration property `{}`", key);
                    }
                }
            }
        }
        Ok(result)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .map_err(Error::new)
        .with_context(|| format!("Invalid value `{}` for the property `{}`", value, key))
}
