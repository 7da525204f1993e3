use crate::{Error, Handle, Result, Statement};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct Entry<S: Statement> {
    handle: Handle<S>,
    release_on_close: bool,
}

struct State<S: Statement> {
    entries: Vec<Entry<S>>,
    last_query: Option<Handle<S>>,
    closed: bool,
}

/// Tracks the live statements of one logical connection until they are released.
///
/// Every mutation goes through a lock owned by the registry, so the teardown can
/// drain and close the statements even if someone registers concurrently. Once
/// the registry is closed it refuses (and closes) every new statement.
pub struct ResourceRegistry<S: Statement> {
    state: Mutex<State<S>>,
}

impl<S: Statement> ResourceRegistry<S> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: Vec::new(),
                last_query: None,
                closed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `handle`, when `release_on_close` the teardown will also close it.
    pub fn register(&self, handle: &Handle<S>, release_on_close: bool) -> Result<()> {
        let mut state = self.state();
        if state.closed {
            drop(state);
            if let Err(e) = handle.close() {
                log::error!("{:#}", e);
            }
            let error = Error::msg(format!(
                "Cannot register the statement {} on a closed connection",
                handle.id()
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        if state.entries.iter().any(|v| v.handle == *handle) {
            return Ok(());
        }
        state.entries.push(Entry {
            handle: handle.clone(),
            release_on_close,
        });
        log::trace!("Registered the statement {}", handle.id());
        Ok(())
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.state().entries.iter().any(|v| v.handle.id() == id)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Stop tracking `handle` and close it.
    pub fn release(&self, handle: &Handle<S>) -> Result<()> {
        {
            let mut state = self.state();
            state.entries.retain(|v| v.handle != *handle);
            if state.last_query.as_ref() == Some(handle) {
                state.last_query = None;
            }
        }
        log::trace!("Releasing the statement {}", handle.id());
        handle.close()
    }

    /// Remember the most recent query, the one [`Self::cancel_last_query`] interrupts.
    pub fn register_last_query(&self, handle: &Handle<S>) {
        let mut state = self.state();
        if !state.closed {
            state.last_query = Some(handle.clone());
        }
    }

    pub fn last_query(&self) -> Option<Handle<S>> {
        self.state().last_query.clone()
    }

    pub fn clear_last_query(&self) {
        self.state().last_query = None;
    }

    /// Cancel the last query, if it is still open. The query is forgotten either way.
    ///
    /// A query running on another thread is interrupted when its statement has an
    /// [`Interrupter`](crate::Interrupter).
    pub fn cancel_last_query(&self) -> Result<()> {
        let Some(handle) = self.state().last_query.take() else {
            return Ok(());
        };
        handle.cancel()
    }

    /// Close the registry: every tracked statement is dropped from it and, when
    /// registered to be released on close, closed. Calling it again does nothing.
    ///
    /// All the statements are attempted, the first failure is returned.
    pub fn release_all(&self) -> Result<()> {
        let entries = {
            let mut state = self.state();
            state.closed = true;
            state.last_query = None;
            std::mem::take(&mut state.entries)
        };
        if !entries.is_empty() {
            log::debug!("Releasing {} statements", entries.len());
        }
        let mut result = Ok(());
        for entry in entries.into_iter().filter(|v| v.release_on_close) {
            if let Err(e) = entry.handle.close() {
                log::error!("{:#}", e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl<S: Statement> Default for ResourceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
