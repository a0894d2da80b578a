//! Pulse - lock-free latest-value broadcast with service runtime utilities.
//!
//! The core of the crate is [`BroadcastRing`], a fixed-capacity ring where
//! producers publish fixed-size payloads and readers always observe the most
//! recently produced one. Neither side ever blocks the other; a read that
//! overlapped a write is reported as [`ReadOutcome::PossiblyTorn`] instead of
//! being retried internally.
//!
//! ## Components
//!
//! | Component | Type | Use Case |
//! |-----------|------|----------|
//! | Broadcast | `BroadcastRing` | Latest-value fan-out, torn-read detection |
//! | Lifecycle | `Service` / `ServiceStack` | Ordered start/stop of threaded services |
//! | Janitor | `ThreadReaper` | Joining short-lived worker threads |
//! | Liveness | `Watchdog` | Heartbeat tracking for named threads |
//! | Introspection | `struct_schema!` | Field iteration over config structs |
//!
//! ## Not a queue
//!
//! The ring is a *latest-value* primitive: no FIFO delivery, no per-item
//! consumption, no backpressure. A slow reader simply observes fewer
//! intermediate values.
//!
//! See `demos/` for usage patterns.

pub mod broadcast;
pub mod constants;
pub mod error;
pub mod schema;
pub mod service;

pub use broadcast::{ BroadcastRing, ReadOutcome, RingConfig, Sequence };
pub use error::{ PulseError, ReadError, Result };
pub use schema::{ FieldValue, StructSchema };
pub use service::reaper::ThreadReaper;
pub use service::watchdog::Watchdog;
pub use service::{ Service, ServiceStack };
