//! Event trait for type-safe publishing.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types published as Kafka events.
///
/// Implementors bind themselves to a topic and an event type name at
/// compile time; payloads travel as JSON inside an
/// [`crate::EventEnvelope`].
///
/// Naming convention: `foliant.<area>.<entity>.<action>`.
///
/// # Example
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use foliant_events::Event;
/// use uuid::Uuid;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// pub struct DocumentPurged {
///     pub document_id: Uuid,
/// }
///
/// impl Event for DocumentPurged {
///     const TOPIC: &'static str = "foliant.ingest.document.purged";
///     const EVENT_TYPE: &'static str = "foliant.ingest.document.purged";
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The Kafka topic this event is published to.
    const TOPIC: &'static str;

    /// Fully qualified event type name, stored in the envelope.
    const EVENT_TYPE: &'static str;
}
