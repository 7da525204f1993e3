use crate::{Error, Result};
use std::{
    fmt::{self, Debug},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};
use uuid::Uuid;

/// A driver statement: either a bare executable statement or a prepared command.
///
/// The preparation protocol only touches the timeout and the fetch size, the rest
/// is what callers need to use and release the statement.
pub trait Statement: Send {
    /// Command text this statement was prepared with, `None` for bare statements.
    fn sql(&self) -> Option<&str>;

    fn timeout(&self) -> Option<u32>;
    /// Execution deadline in seconds.
    fn set_timeout(&mut self, seconds: u32) -> Result<()>;

    fn fetch_size(&self) -> Option<u32>;
    /// Number of rows the driver should fetch at once.
    fn set_fetch_size(&mut self, rows: u32) -> Result<()>;

    /// Execute the prepared command, returns the rows affected or produced.
    fn execute(&mut self) -> Result<u64>;

    /// Execute a literal command on the connection of this statement.
    fn execute_sql(&mut self, sql: &str) -> Result<u64>;

    /// Last key generated by an execution, when generated keys were requested.
    fn generated_key(&self) -> Option<i64> {
        None
    }

    /// Interrupt a running execution.
    fn cancel(&mut self) -> Result<()> {
        Err(Error::msg("Cancellation is not supported by this driver"))
    }

    /// Handle able to interrupt this statement from another thread while it executes.
    ///
    /// Without one, cancelling waits for the statement to be idle and calls [`Statement::cancel`].
    fn interrupter(&self) -> Option<Arc<dyn Interrupter>> {
        None
    }

    /// Release the driver resources. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// Interrupts the execution of a statement without locking it.
pub trait Interrupter: Send + Sync {
    fn interrupt(&self) -> Result<()>;
}

/// Shared handle to a statement, owned by the caller and the [`ResourceRegistry`](crate::ResourceRegistry).
pub struct Handle<S: Statement> {
    id: Uuid,
    statement: Arc<Mutex<S>>,
    interrupter: Option<Arc<dyn Interrupter>>,
    closed: Arc<AtomicBool>,
}

impl<S: Statement> Handle<S> {
    pub fn new(statement: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            interrupter: statement.interrupter(),
            closed: Arc::new(AtomicBool::new(statement.is_closed())),
            statement: Arc::new(Mutex::new(statement)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, S>> {
        self.statement
            .lock()
            .map_err(|_| Error::msg(format!("The statement {} is poisoned", self.id)))
    }

    /// Run `f` with exclusive access to the statement.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> Result<R>) -> Result<R> {
        f(&mut *self.lock()?)
    }

    pub fn sql(&self) -> Result<Option<String>> {
        self.with(|s| Ok(s.sql().map(ToOwned::to_owned)))
    }

    pub fn timeout(&self) -> Result<Option<u32>> {
        self.with(|s| Ok(s.timeout()))
    }

    pub fn fetch_size(&self) -> Result<Option<u32>> {
        self.with(|s| Ok(s.fetch_size()))
    }

    pub fn execute(&self) -> Result<u64> {
        self.with(|s| s.execute())
    }

    pub fn execute_sql(&self, sql: &str) -> Result<u64> {
        self.with(|s| s.execute_sql(sql))
    }

    pub fn generated_key(&self) -> Result<Option<i64>> {
        self.with(|s| Ok(s.generated_key()))
    }

    pub fn is_closed(&self) -> Result<bool> {
        self.with(|s| Ok(s.is_closed()))
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.with(|s| s.close())
    }

    /// Interrupt the statement, a running execution is reached through its interrupter.
    /// Closed statements are left alone.
    pub(crate) fn cancel(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        match &self.interrupter {
            Some(interrupter) => interrupter.interrupt(),
            None => self.with(|s| {
                if s.is_closed() {
                    return Ok(());
                }
                s.cancel()
            }),
        }
    }
}

impl<S: Statement> Clone for Handle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            statement: self.statement.clone(),
            interrupter: self.interrupter.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<S: Statement> PartialEq for Handle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S: Statement> Debug for Handle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).finish()
    }
}
