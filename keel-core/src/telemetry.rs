use crate::{Observer, truncate_long};
use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};
use time::OffsetDateTime;
use uuid::Uuid;

/// Record of a single statement preparation.
#[derive(Debug, Clone)]
pub struct PrepareEvent {
    pub id: Uuid,
    pub started_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
    pub elapsed: Duration,
    /// Effective command text, only known once the preparation completed.
    pub sql: Option<String>,
    started: Instant,
}

impl PrepareEvent {
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: OffsetDateTime::now_utc(),
            finished_at: None,
            elapsed: Duration::ZERO,
            sql: None,
            started: Instant::now(),
        }
    }

    pub fn complete(mut self, sql: &str) -> Self {
        self.elapsed = self.started.elapsed();
        self.finished_at = Some(OffsetDateTime::now_utc());
        self.sql = Some(sql.to_owned());
        self
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Destination of the preparation telemetry.
pub trait EventSink {
    fn begin_event(&self) -> PrepareEvent {
        PrepareEvent::begin()
    }

    fn complete_event(&self, event: PrepareEvent, sql: &str);
}

/// Writes every completed event to the `keel::telemetry` log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn complete_event(&self, event: PrepareEvent, sql: &str) {
        let event = event.complete(sql);
        log::trace!(
            target: "keel::telemetry",
            "Prepared in {:?} ({}): {}",
            event.elapsed,
            event.id,
            truncate_long!(sql)
        );
    }
}

/// Keeps the completed events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<PrepareEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn events(&self) -> Vec<PrepareEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemoryEventSink {
    fn complete_event(&self, event: PrepareEvent, sql: &str) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.complete(sql));
    }
}

/// Brackets a driver preparation call: the event is begun and the observer notified
/// on creation, the event is completed and the observer notified again on drop.
pub struct PrepareBracket<'a> {
    observer: &'a dyn Observer,
    events: &'a dyn EventSink,
    event: Option<PrepareEvent>,
    sql: &'a str,
}

impl<'a> PrepareBracket<'a> {
    pub fn open(observer: &'a dyn Observer, events: &'a dyn EventSink, sql: &'a str) -> Self {
        let event = events.begin_event();
        observer.prepare_start();
        Self {
            observer,
            events,
            event: Some(event),
            sql,
        }
    }
}

impl Drop for PrepareBracket<'_> {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            self.events.complete_event(event, self.sql);
        }
        self.observer.prepare_end();
    }
}
