//! # foliant-delivery
//!
//! Reliable outbound delivery for foliant: the webhook transport with HMAC
//! request signing, the exponential-backoff retry scheduler that drains the
//! delivery record queue, and the dual-transport publisher that routes
//! processing requests over webhook, Kafka, or both.

pub mod backoff;
pub mod error;
pub mod payload;
pub mod publisher;
pub mod scheduler;
pub mod webhook;

pub use backoff::RetryPolicy;
pub use error::DeliveryError;
pub use payload::{ChatProcessingRequest, DocumentProcessingRequest, ProcessingRequest};
pub use publisher::{OutboundPublisher, TransportMode};
pub use scheduler::RetryScheduler;
pub use webhook::WebhookSender;
