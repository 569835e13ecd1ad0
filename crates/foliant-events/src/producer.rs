//! Kafka event producer.

use crate::config::KafkaConfig;
use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::Event;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Bound on one broker send, including queueing.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka producer for the queue transport leg.
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    /// Create a producer from the given configuration. Connection is lazy;
    /// a bad broker address surfaces on the first publish.
    pub fn new(config: KafkaConfig) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("security.protocol", config.security_protocol.as_str())
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .create()
            .map_err(|e| EventError::ConnectionFailed {
                broker: config.bootstrap_servers.clone(),
                cause: e.to_string(),
            })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            "Event producer created"
        );

        Ok(Self { producer })
    }

    /// Publish an event wrapped in a fresh envelope.
    #[instrument(skip(self, event), fields(event_type = %E::EVENT_TYPE, tenant_id = %tenant_id))]
    pub async fn publish<E: Event>(&self, event: E, tenant_id: Uuid) -> Result<(), EventError> {
        self.publish_envelope(EventEnvelope::new(event, tenant_id))
            .await
    }

    /// Publish a pre-constructed envelope.
    #[instrument(skip(self, envelope), fields(
        event_id = %envelope.event_id,
        event_type = %envelope.event_type,
        tenant_id = %envelope.tenant_id
    ))]
    pub async fn publish_envelope<E: Event>(
        &self,
        envelope: EventEnvelope<E>,
    ) -> Result<(), EventError> {
        let topic = E::TOPIC;
        let key = envelope.partition_key();
        let payload = envelope.to_json_bytes()?;

        debug!(topic = %topic, key = %key, payload_size = payload.len(), "Publishing event");

        let (partition, offset) = self
            .producer
            .send(
                FutureRecord::to(topic).key(&key).payload(&payload),
                SEND_TIMEOUT,
            )
            .await
            .map_err(|(err, _)| EventError::PublishFailed {
                topic: topic.to_string(),
                cause: err.to_string(),
            })?;

        debug!(partition, offset, "Event published");

        Ok(())
    }
}
