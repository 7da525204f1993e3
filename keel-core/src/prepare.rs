use crate::{
    BatchExecutor, DeadlineSource, EventSink, Handle, Inspector, Observer, PrepareBracket,
    PrepareError, PrepareResult, Provider, ResourceRegistry, SessionConfig, Statement, Template,
    Variant,
};
use std::borrow::Cow;

/// Everything a statement preparation needs from the logical connection.
pub struct PrepareContext<'a, P: Provider> {
    pub provider: &'a P,
    pub config: &'a SessionConfig,
    pub inspector: &'a dyn Inspector,
    pub batch: &'a mut dyn BatchExecutor,
    pub deadline: &'a dyn DeadlineSource,
    pub observer: &'a dyn Observer,
    pub events: &'a dyn EventSink,
    pub registry: &'a ResourceRegistry<P::Statement>,
}

impl<'a, P: Provider> PrepareContext<'a, P> {
    /// Prepare `sql` as the requested variant.
    ///
    /// In order: the inspector may replace the text, the variant is checked against
    /// the configuration, the pending batch is flushed (unless [`Variant::Plain`]),
    /// the text is logged, the driver prepares the statement inside the telemetry
    /// bracket, the transaction deadline becomes the statement timeout, and finally
    /// the statement is registered (queries also get the fetch size hint).
    pub fn prepare(
        &mut self,
        sql: &str,
        template: Template,
        variant: Variant,
    ) -> PrepareResult<Handle<P::Statement>> {
        let inspected = self.inspect(sql)?;
        let sql = inspected.as_ref();
        self.check(&variant)?;
        if variant.flushes_batch() {
            self.batch
                .flush_pending_batch()
                .map_err(PrepareError::Batch)?;
        }
        self.config.statement_logger.log(sql);
        let handle = {
            let _bracket = PrepareBracket::open(self.observer, self.events, sql);
            let statement = self
                .provider
                .prepare_command(sql, &variant.preparation())
                .map_err(|e| {
                    PrepareError::preparation("could not prepare statement", Some(sql), e)
                })?;
            let handle = Handle::new(statement);
            if let Err(e) = self.apply_deadline(&handle, sql) {
                discard(&handle);
                return Err(e);
            }
            handle
        };
        self.post_process(&handle, template, sql)?;
        Ok(handle)
    }

    /// Create a bare statement. No inspection, telemetry nor deadline, only registration.
    pub fn create_statement(&mut self) -> PrepareResult<Handle<P::Statement>> {
        let statement = self
            .provider
            .create_statement()
            .map_err(|e| PrepareError::preparation("could not create statement", None, e))?;
        let handle = Handle::new(statement);
        self.registry
            .register(&handle, true)
            .map_err(PrepareError::Registry)?;
        Ok(handle)
    }

    fn inspect<'s>(&self, sql: &'s str) -> PrepareResult<Cow<'s, str>> {
        Ok(
            match self.inspector.inspect(sql).map_err(PrepareError::Inspection)? {
                Some(inspected) if !inspected.is_empty() => {
                    if inspected != sql {
                        log::trace!("The inspector rewrote the statement into `{}`", inspected);
                    }
                    Cow::Owned(inspected)
                }
                _ => Cow::Borrowed(sql),
            },
        )
    }

    fn check(&self, variant: &Variant) -> PrepareResult<()> {
        match variant {
            Variant::ReturnGeneratedKeys(keys)
                if keys.is_requested() && !self.config.generated_keys_enabled =>
            {
                Err(PrepareError::Configuration(
                    "generated keys support is not enabled".into(),
                ))
            }
            Variant::Scrollable { mode, .. }
                if !mode.is_forward_only() && !self.config.scrollable_result_sets_enabled =>
            {
                Err(PrepareError::Configuration(
                    "scrollable result sets are not enabled".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    fn apply_deadline(&self, handle: &Handle<P::Statement>, sql: &str) -> PrepareResult<()> {
        let budget = self.deadline.remaining_budget().map_err(|e| {
            PrepareError::Assertion(format!(
                "could not determine the remaining transaction timeout: {:#}",
                e
            ))
        })?;
        if budget > 0 {
            let seconds = u32::try_from(budget).unwrap_or(u32::MAX);
            handle
                .with(|s| s.set_timeout(seconds))
                .map_err(|e| PrepareError::preparation("could not set the timeout", Some(sql), e))?;
        }
        Ok(())
    }

    fn post_process(
        &self,
        handle: &Handle<P::Statement>,
        template: Template,
        sql: &str,
    ) -> PrepareResult<()> {
        self.registry
            .register(handle, true)
            .map_err(PrepareError::Registry)?;
        if let (Template::Query, Some(rows)) = (template, self.config.fetch_size) {
            if let Err(e) = handle.with(|s| s.set_fetch_size(rows)) {
                if let Err(e) = self.registry.release(handle) {
                    log::error!("{:#}", e);
                }
                return Err(PrepareError::preparation(
                    "could not set the fetch size",
                    Some(sql),
                    e,
                ));
            }
        }
        Ok(())
    }
}

fn discard<S: Statement>(handle: &Handle<S>) {
    if let Err(e) = handle.close() {
        log::error!("{:#}", e);
    }
}
