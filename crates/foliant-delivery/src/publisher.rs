//! Dual-transport outbound publisher.
//!
//! Routes processing requests by transport mode: webhook POST, Kafka
//! publish, or both. Submission handlers call [`OutboundPublisher::dispatch`]
//! fire-and-forget; a failed webhook attempt is parked as a delivery record
//! and the retry scheduler takes it from there, while queue durability is
//! the broker's job.

use std::str::FromStr;
#[cfg(feature = "kafka")]
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, warn};

#[cfg(feature = "kafka")]
use foliant_events::events::{ChatMessageSubmitted, DocumentSubmitted};
#[cfg(feature = "kafka")]
use foliant_events::EventProducer;

use foliant_db::models::{CreateDeliveryRecord, DeliveryRecord};

use crate::backoff::RetryPolicy;
use crate::error::DeliveryError;
use crate::payload::ProcessingRequest;
use crate::webhook::WebhookSender;

/// Which transport(s) carry outbound processing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Direct webhook POST, with database-backed retries on failure.
    Webhook,
    /// Kafka publish only; durability delegated to the broker.
    Queue,
    /// Both legs, attempted concurrently.
    Hybrid,
}

impl TransportMode {
    #[must_use]
    pub fn uses_webhook(self) -> bool {
        matches!(self, TransportMode::Webhook | TransportMode::Hybrid)
    }

    #[must_use]
    pub fn uses_queue(self) -> bool {
        matches!(self, TransportMode::Queue | TransportMode::Hybrid)
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportMode::Webhook => "webhook",
            TransportMode::Queue => "queue",
            TransportMode::Hybrid => "hybrid",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TransportMode {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webhook" => Ok(TransportMode::Webhook),
            "queue" => Ok(TransportMode::Queue),
            "hybrid" => Ok(TransportMode::Hybrid),
            other => Err(DeliveryError::InvalidTransportMode(other.to_string())),
        }
    }
}

/// Mode-routed publisher for processing requests.
#[derive(Clone)]
pub struct OutboundPublisher {
    mode: TransportMode,
    webhook: WebhookSender,
    pool: PgPool,
    policy: RetryPolicy,
    #[cfg(feature = "kafka")]
    producer: Option<Arc<EventProducer>>,
}

impl OutboundPublisher {
    pub fn new(
        mode: TransportMode,
        webhook: WebhookSender,
        pool: PgPool,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            mode,
            webhook,
            pool,
            policy,
            #[cfg(feature = "kafka")]
            producer: None,
        }
    }

    /// Attach the Kafka producer used by the queue leg.
    #[cfg(feature = "kafka")]
    #[must_use]
    pub fn with_producer(mut self, producer: Arc<EventProducer>) -> Self {
        self.producer = Some(producer);
        self
    }

    #[must_use]
    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    /// Fail fast at startup if the mode needs a transport that is absent.
    pub fn validate(&self) -> Result<(), DeliveryError> {
        if self.mode.uses_queue() && !self.queue_configured() {
            return Err(DeliveryError::QueueUnavailable(self.mode.to_string()));
        }
        Ok(())
    }

    fn queue_configured(&self) -> bool {
        #[cfg(feature = "kafka")]
        {
            self.producer.is_some()
        }
        #[cfg(not(feature = "kafka"))]
        {
            false
        }
    }

    /// Publish on a background task; submission latency never includes the
    /// processor's availability.
    pub fn dispatch(&self, request: ProcessingRequest) {
        let publisher = self.clone();
        tokio::spawn(async move {
            if let Err(cause) = publisher.publish(&request).await {
                error!(
                    target: "outbound_publisher",
                    tenant_id = %request.tenant_id(),
                    resource_id = %request.resource_id(),
                    error = %cause,
                    "outbound publish failed"
                );
            }
        });
    }

    /// Publish a request over the configured transport(s).
    ///
    /// In hybrid mode both legs run concurrently and the request counts as
    /// accepted once it is safely in local hands: a failed webhook attempt
    /// is parked for retry, so only local errors surface to the caller.
    pub async fn publish(&self, request: &ProcessingRequest) -> Result<(), DeliveryError> {
        match self.mode {
            TransportMode::Webhook => self.webhook_leg(request).await,
            TransportMode::Queue => self.queue_leg(request).await,
            TransportMode::Hybrid => {
                let (webhook, queue) = tokio::join!(self.webhook_leg(request), self.queue_leg(request));
                if let Err(cause) = queue {
                    warn!(
                        target: "outbound_publisher",
                        resource_id = %request.resource_id(),
                        error = %cause,
                        "hybrid queue leg failed"
                    );
                }
                webhook
            }
        }
    }

    /// Webhook attempt; a retryable failure parks the request for the
    /// scheduler instead of surfacing.
    async fn webhook_leg(&self, request: &ProcessingRequest) -> Result<(), DeliveryError> {
        let payload = serde_json::to_value(request)?;
        match self.webhook.send(&payload).await {
            Ok(()) => {
                info!(
                    target: "outbound_publisher",
                    tenant_id = %request.tenant_id(),
                    resource_id = %request.resource_id(),
                    "webhook delivered"
                );
                Ok(())
            }
            Err(cause) if cause.is_retryable() => {
                warn!(
                    target: "outbound_publisher",
                    tenant_id = %request.tenant_id(),
                    resource_id = %request.resource_id(),
                    error = %cause,
                    "initial webhook attempt failed, parked for retry"
                );
                DeliveryRecord::create(
                    &self.pool,
                    CreateDeliveryRecord {
                        tenant_id: request.tenant_id(),
                        delivery_type: request.delivery_type(),
                        payload,
                        max_retries: self.policy.max_retries,
                        next_retry_at: Utc::now(),
                        last_error: Some(cause.to_string()),
                    },
                )
                .await?;
                Ok(())
            }
            Err(cause) => Err(cause),
        }
    }

    #[cfg(feature = "kafka")]
    async fn queue_leg(&self, request: &ProcessingRequest) -> Result<(), DeliveryError> {
        let Some(producer) = &self.producer else {
            return Err(DeliveryError::QueueUnavailable(self.mode.to_string()));
        };
        match request {
            ProcessingRequest::Document(doc) => {
                producer
                    .publish(
                        DocumentSubmitted {
                            document_id: doc.document_id,
                            filename: doc.filename.clone(),
                            content_type: doc.content_type.clone(),
                            download_url: doc.download_url.clone(),
                            markdown_callback_url: doc.markdown_callback_url.clone(),
                            vectors_callback_url: doc.vectors_callback_url.clone(),
                            callback_token: doc.callback_token.clone(),
                        },
                        doc.tenant_id,
                    )
                    .await?;
            }
            ProcessingRequest::Chat(chat) => {
                producer
                    .publish(
                        ChatMessageSubmitted {
                            exchange_id: chat.exchange_id,
                            conversation_id: chat.conversation_id,
                            message: chat.message.clone(),
                            reply_callback_url: chat.reply_callback_url.clone(),
                            callback_token: chat.callback_token.clone(),
                        },
                        chat.tenant_id,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    #[cfg(not(feature = "kafka"))]
    async fn queue_leg(&self, _request: &ProcessingRequest) -> Result<(), DeliveryError> {
        Err(DeliveryError::QueueUnavailable(self.mode.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            TransportMode::from_str("webhook").unwrap(),
            TransportMode::Webhook
        );
        assert_eq!(
            TransportMode::from_str("queue").unwrap(),
            TransportMode::Queue
        );
        assert_eq!(
            TransportMode::from_str("hybrid").unwrap(),
            TransportMode::Hybrid
        );
        assert!(TransportMode::from_str("carrier-pigeon").is_err());
    }

    #[test]
    fn test_mode_legs() {
        assert!(TransportMode::Webhook.uses_webhook());
        assert!(!TransportMode::Webhook.uses_queue());
        assert!(!TransportMode::Queue.uses_webhook());
        assert!(TransportMode::Queue.uses_queue());
        assert!(TransportMode::Hybrid.uses_webhook());
        assert!(TransportMode::Hybrid.uses_queue());
    }

    #[test]
    fn test_mode_display_roundtrip() {
        for mode in [
            TransportMode::Webhook,
            TransportMode::Queue,
            TransportMode::Hybrid,
        ] {
            assert_eq!(TransportMode::from_str(&mode.to_string()).unwrap(), mode);
        }
    }
}
