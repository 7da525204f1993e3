mod batch;
mod config;
mod coordinator;
mod deadline;
mod error;
mod inspector;
mod observer;
mod prepare;
mod provider;
mod registry;
mod statement;
mod telemetry;
mod util;
mod variant;

pub use ::anyhow::Context;
pub use batch::*;
pub use config::*;
pub use coordinator::*;
pub use deadline::*;
pub use error::*;
pub use inspector::*;
pub use observer::*;
pub use prepare::*;
pub use provider::*;
pub use registry::*;
pub use statement::*;
pub use telemetry::*;
pub use util::*;
pub use variant::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
