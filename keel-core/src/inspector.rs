use crate::Result;

/// Hook allowed to rewrite a command text before it is prepared.
///
/// Returning `None` (or an empty string) keeps the incoming text.
pub trait Inspector {
    fn inspect(&self, sql: &str) -> Result<Option<String>>;
}

impl<F> Inspector for F
where
    F: Fn(&str) -> Result<Option<String>>,
{
    fn inspect(&self, sql: &str) -> Result<Option<String>> {
        self(sql)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInspector;

impl Inspector for NoopInspector {
    fn inspect(&self, _sql: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
