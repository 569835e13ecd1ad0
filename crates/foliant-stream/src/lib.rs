//! # foliant-stream
//!
//! In-process registry of live client connections, keyed by tenant, used to
//! push processed results to sessions in real time.
//!
//! This is a best-effort channel: clients not connected at broadcast time
//! receive nothing retroactively. Durable state lives in the resource rows,
//! which clients re-fetch on reconnect.

mod event;
mod hub;

pub use event::StreamEvent;
pub use hub::BroadcastHub;
