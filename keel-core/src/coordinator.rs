use crate::{
    BatchExecutor, BatchFlush, Error, EventSink, Handle, Inspector, LogEventSink, NoopInspector,
    NoopObserver, Observer, PendingBatch, PrepareContext, PrepareError, PrepareResult, Provider,
    ResourceRegistry, Result, ScrollMode, SessionConfig, Template, TransactionTimer, Variant,
};
use std::{sync::Arc, time::Duration};

/// Owns a logical connection: the provider, its settings and collaborators, the
/// pending batch, the transaction timer and the registry of the live statements.
///
/// Closing (explicitly or on drop) releases every registered statement before the
/// provider is closed.
pub struct Coordinator<P: Provider> {
    provider: P,
    config: SessionConfig,
    inspector: Box<dyn Inspector>,
    observer: Arc<dyn Observer>,
    events: Arc<dyn EventSink>,
    batch: PendingBatch,
    transaction: TransactionTimer,
    registry: ResourceRegistry<P::Statement>,
    closed: bool,
}

impl<P: Provider> Coordinator<P> {
    pub fn new(provider: P, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            inspector: Box::new(NoopInspector),
            observer: Arc::new(NoopObserver),
            events: Arc::new(LogEventSink),
            batch: PendingBatch::new(),
            transaction: TransactionTimer::new(),
            registry: ResourceRegistry::new(),
            closed: false,
        }
    }

    pub fn with_inspector(mut self, inspector: impl Inspector + 'static) -> Self {
        self.inspector = Box::new(inspector);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ResourceRegistry<P::Statement> {
        &self.registry
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn with_context<R>(
        &mut self,
        f: impl FnOnce(&mut PrepareContext<'_, P>) -> PrepareResult<R>,
    ) -> PrepareResult<R> {
        if self.closed {
            return Err(PrepareError::Closed);
        }
        let mut batch = BatchFlush::new(&self.provider, &mut self.batch, self.observer.as_ref());
        let mut context = PrepareContext {
            provider: &self.provider,
            config: &self.config,
            inspector: self.inspector.as_ref(),
            batch: &mut batch,
            deadline: &self.transaction,
            observer: self.observer.as_ref(),
            events: self.events.as_ref(),
            registry: &self.registry,
        };
        f(&mut context)
    }

    /// Create a bare statement, to run literal commands through [`Handle::execute_sql`].
    pub fn create_statement(&mut self) -> PrepareResult<Handle<P::Statement>> {
        self.with_context(|context| context.create_statement())
    }

    /// Prepare a plain statement, the pending batch is left untouched.
    pub fn prepare_statement(&mut self, sql: &str) -> PrepareResult<Handle<P::Statement>> {
        self.prepare_statement_with(sql, Variant::Plain)
    }

    pub fn prepare_callable(&mut self, sql: &str) -> PrepareResult<Handle<P::Statement>> {
        self.prepare_statement_with(sql, Variant::Callable)
    }

    pub fn prepare_statement_with(
        &mut self,
        sql: &str,
        variant: Variant,
    ) -> PrepareResult<Handle<P::Statement>> {
        self.with_context(|context| context.prepare(sql, Template::Statement, variant))
    }

    /// Prepare a result producing statement and remember it as the last query.
    ///
    /// A forward only cursor (or no `scroll` at all) is the driver default one, it
    /// does not need scrollable result sets to be enabled.
    pub fn prepare_query_statement(
        &mut self,
        sql: &str,
        callable: bool,
        scroll: Option<ScrollMode>,
    ) -> PrepareResult<Handle<P::Statement>> {
        let variant = match scroll {
            Some(mode) if !mode.is_forward_only() => Variant::Scrollable { mode, callable },
            _ if callable => Variant::Callable,
            _ => Variant::Plain,
        };
        let handle =
            self.with_context(|context| context.prepare(sql, Template::Query, variant))?;
        self.registry.register_last_query(&handle);
        Ok(handle)
    }

    /// Queue a command, it runs on the next flush.
    pub fn add_to_batch(&mut self, sql: impl Into<String>) {
        self.batch.add(sql);
    }

    pub fn pending_batch(&self) -> &PendingBatch {
        &self.batch
    }

    /// Flush the pending batch now.
    pub fn execute_batch(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::new(PrepareError::Closed));
        }
        BatchFlush::new(&self.provider, &mut self.batch, self.observer.as_ref())
            .flush_pending_batch()
    }

    /// Start timing a transaction, statements prepared from now on inherit its remaining time.
    pub fn begin_transaction(&mut self, timeout: Option<Duration>) {
        self.transaction.begin(timeout);
    }

    pub fn end_transaction(&mut self) {
        self.transaction.end();
    }

    /// Release a statement before the connection is closed.
    pub fn release(&mut self, handle: &Handle<P::Statement>) -> Result<()> {
        self.observer.release_start();
        let result = self.registry.release(handle);
        self.observer.release_end();
        result
    }

    pub fn cancel_last_query(&self) -> Result<()> {
        self.registry.cancel_last_query()
    }

    /// Release every statement and close the provider. Closing twice does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !self.batch.is_empty() {
            log::warn!(
                "Discarding {} batched statements on close of a {} connection",
                self.batch.len(),
                P::NAME
            );
            self.batch.clear();
        }
        self.transaction.end();
        self.observer.release_start();
        let released = self.registry.release_all();
        self.observer.release_end();
        let closed = self.provider.close();
        released.and(closed)
    }
}

impl<P: Provider> Drop for Coordinator<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("{:#}", e);
        }
    }
}
