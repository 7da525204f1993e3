//! Keel: guarded statement preparation for the Rust data layer.
//!
//! Every statement of a logical connection goes through the same protocol: the
//! inspector may rewrite it, the configuration is checked, pending batched work is
//! flushed, the text is logged, the driver preparation is timed and observed, the
//! transaction deadline becomes the statement timeout and the statement is tracked
//! by the connection registry until it is released.
//!
//! ```rust,ignore
//! let mut coordinator = Coordinator::new(connection, SessionConfig::new().with_fetch_size(Some(100)));
//! coordinator.begin_transaction(Some(Duration::from_secs(30)));
//! let query = coordinator.prepare_query_statement("SELECT * FROM trade", false, None)?;
//! query.execute()?;
//! coordinator.close()?;
//! ```
pub use keel_core::*;
