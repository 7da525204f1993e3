use crate::{Context, Observer, Provider, Result};
use std::mem;

/// Executes whatever was queued on the logical connection so far.
pub trait BatchExecutor {
    fn flush_pending_batch(&mut self) -> Result<()>;
}

impl<F> BatchExecutor for F
where
    F: FnMut() -> Result<()>,
{
    fn flush_pending_batch(&mut self) -> Result<()> {
        self()
    }
}

/// Commands queued for batched execution.
#[derive(Debug, Default, Clone)]
pub struct PendingBatch {
    statements: Vec<String>,
}

impl PendingBatch {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&mut self, sql: impl Into<String>) {
        self.statements.push(sql.into());
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn take(&mut self) -> Vec<String> {
        mem::take(&mut self.statements)
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }
}

/// Flushes a [`PendingBatch`] through the provider that owns it.
///
/// The batch is cleared even when its execution fails.
pub struct BatchFlush<'a, P: Provider> {
    provider: &'a P,
    batch: &'a mut PendingBatch,
    observer: &'a dyn Observer,
}

impl<'a, P: Provider> BatchFlush<'a, P> {
    pub fn new(provider: &'a P, batch: &'a mut PendingBatch, observer: &'a dyn Observer) -> Self {
        Self {
            provider,
            batch,
            observer,
        }
    }
}

impl<P: Provider> BatchExecutor for BatchFlush<'_, P> {
    fn flush_pending_batch(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let statements = self.batch.take();
        self.observer.batch_start();
        let result = self.provider.execute_batch(&statements);
        self.observer.batch_end();
        let rows = result.with_context(|| {
            format!(
                "While executing a batch of {} statements on {}",
                statements.len(),
                P::NAME
            )
        })?;
        log::debug!(
            "Executed a batch of {} statements, {} rows affected",
            statements.len(),
            rows
        );
        Ok(())
    }
}
