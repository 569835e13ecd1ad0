//! # foliant-events
//!
//! Kafka transport for outbound processing requests: the "queue" leg of the
//! dual-transport publisher. Delivery durability on this leg is delegated to
//! the broker; consumers are expected to be idempotent (the pipeline is
//! at-least-once end to end).
//!
//! ## Cargo features
//!
//! - `kafka`: enable the producer (requires librdkafka). Without it the
//!   crate still provides the [`Event`] trait, envelope, and configuration,
//!   so webhook-only deployments compile without the native dependency.
//!
//! ## Example
//!
//! ```rust,ignore
//! use foliant_events::{EventProducer, KafkaConfig, events::DocumentSubmitted};
//!
//! let config = KafkaConfig::from_env()?;
//! let producer = EventProducer::new(config)?;
//! producer.publish(event, tenant_id).await?;
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod event;
pub mod events;
#[cfg(feature = "kafka")]
pub mod producer;

pub use config::KafkaConfig;
pub use envelope::EventEnvelope;
pub use error::EventError;
pub use event::Event;
#[cfg(feature = "kafka")]
pub use producer::EventProducer;
