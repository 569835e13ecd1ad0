//! Background retry scheduler.
//!
//! Sweeps the delivery record queue on an interval, claims due records, and
//! re-attempts them over the webhook transport. Claiming happens in a single
//! conditional UPDATE (see `DeliveryRecord::claim_due`), so any number of
//! scheduler instances can run against the same database without
//! double-sending.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use foliant_core::TenantId;
use foliant_db::models::{ChatExchange, DeliveryRecord, Document};
use foliant_stream::{BroadcastHub, StreamEvent};

use crate::backoff::RetryPolicy;
use crate::error::DeliveryError;
use crate::payload::ProcessingRequest;
use crate::webhook::WebhookSender;

/// Default pause between queue sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of records claimed per sweep.
pub const DEFAULT_BATCH_SIZE: i64 = 10;

/// Interval-driven worker that drains due delivery records.
#[derive(Clone)]
pub struct RetryScheduler {
    pool: PgPool,
    sender: WebhookSender,
    hub: BroadcastHub,
    policy: RetryPolicy,
    sweep_interval: Duration,
    batch_size: i64,
}

impl RetryScheduler {
    pub fn new(pool: PgPool, sender: WebhookSender, hub: BroadcastHub, policy: RetryPolicy) -> Self {
        Self {
            pool,
            sender,
            hub,
            policy,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Run the sweep loop on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                target: "retry_scheduler",
                interval_secs = self.sweep_interval.as_secs(),
                batch_size = self.batch_size,
                "retry scheduler started"
            );
            let mut ticker = tokio::time::interval(self.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match self.sweep().await {
                    Ok(0) => {}
                    Ok(claimed) => {
                        debug!(target: "retry_scheduler", claimed, "sweep processed due deliveries");
                    }
                    Err(error) => {
                        error!(target: "retry_scheduler", error = %error, "sweep failed");
                    }
                }
            }
        })
    }

    /// Claim and attempt one batch of due records. Returns the claim count.
    pub async fn sweep(&self) -> Result<usize, DeliveryError> {
        let claimed = DeliveryRecord::claim_due(&self.pool, self.batch_size).await?;
        let count = claimed.len();
        for record in claimed {
            self.attempt(record).await;
        }
        Ok(count)
    }

    /// Attempt one claimed record and settle its outcome.
    ///
    /// Per-record errors are absorbed here; one bad record must not stall
    /// the rest of the batch.
    async fn attempt(&self, record: DeliveryRecord) {
        match self.sender.send(&record.payload).await {
            Ok(()) => {
                info!(
                    target: "retry_scheduler",
                    delivery_id = %record.id,
                    tenant_id = %record.tenant_id,
                    attempts = record.retry_count,
                    "delivery succeeded on retry"
                );
                if let Err(error) = DeliveryRecord::mark_succeeded(&self.pool, record.id).await {
                    error!(
                        target: "retry_scheduler",
                        delivery_id = %record.id,
                        error = %error,
                        "failed to mark delivery succeeded"
                    );
                }
            }
            Err(cause) => {
                let message = cause.to_string();
                // retry_count was already incremented by the claim, so it is
                // the number of attempts made.
                if record.retry_count >= record.max_retries {
                    warn!(
                        target: "retry_scheduler",
                        delivery_id = %record.id,
                        tenant_id = %record.tenant_id,
                        attempts = record.retry_count,
                        error = %message,
                        "retry budget exhausted, delivery failed"
                    );
                    if let Err(error) =
                        DeliveryRecord::mark_failed(&self.pool, record.id, &message).await
                    {
                        error!(
                            target: "retry_scheduler",
                            delivery_id = %record.id,
                            error = %error,
                            "failed to mark delivery failed"
                        );
                    }
                    self.fail_resource(&record, &message).await;
                } else {
                    let due = self.policy.next_retry_at(Utc::now(), record.retry_count);
                    debug!(
                        target: "retry_scheduler",
                        delivery_id = %record.id,
                        attempts = record.retry_count,
                        next_retry_at = %due,
                        error = %message,
                        "delivery attempt failed, rescheduled"
                    );
                    if let Err(error) =
                        DeliveryRecord::reschedule(&self.pool, record.id, due, &message).await
                    {
                        error!(
                            target: "retry_scheduler",
                            delivery_id = %record.id,
                            error = %error,
                            "failed to reschedule delivery"
                        );
                    }
                }
            }
        }
    }

    /// Propagate a dead delivery to the resource it was initiated for.
    ///
    /// The resource moves to `failed` and connected clients are told, so a
    /// user is never left watching a document that will never finish.
    async fn fail_resource(&self, record: &DeliveryRecord, reason: &str) {
        let request: ProcessingRequest = match serde_json::from_value(record.payload.clone()) {
            Ok(request) => request,
            Err(error) => {
                error!(
                    target: "retry_scheduler",
                    delivery_id = %record.id,
                    error = %error,
                    "delivery payload is not a processing request, cannot fail resource"
                );
                return;
            }
        };

        let tenant = TenantId::from_uuid(record.tenant_id);
        let reason = format!("Delivery to processor failed permanently: {reason}");

        match &request {
            ProcessingRequest::Document(doc) => {
                match Document::mark_failed(&self.pool, record.tenant_id, doc.document_id, &reason)
                    .await
                {
                    Ok(true) => {
                        self.hub
                            .broadcast(
                                tenant,
                                StreamEvent::status_changed("document", doc.document_id, "failed"),
                            )
                            .await;
                    }
                    Ok(false) => {
                        // Already terminal; a late callback may have landed.
                        debug!(
                            target: "retry_scheduler",
                            document_id = %doc.document_id,
                            "document already terminal, not marking failed"
                        );
                    }
                    Err(error) => {
                        error!(
                            target: "retry_scheduler",
                            document_id = %doc.document_id,
                            error = %error,
                            "failed to mark document failed"
                        );
                    }
                }
            }
            ProcessingRequest::Chat(chat) => {
                match ChatExchange::mark_failed(
                    &self.pool,
                    record.tenant_id,
                    chat.exchange_id,
                    &reason,
                )
                .await
                {
                    Ok(true) => {
                        self.hub
                            .broadcast(
                                tenant,
                                StreamEvent::status_changed(
                                    "chat_exchange",
                                    chat.exchange_id,
                                    "failed",
                                ),
                            )
                            .await;
                    }
                    Ok(false) => {
                        debug!(
                            target: "retry_scheduler",
                            exchange_id = %chat.exchange_id,
                            "exchange already terminal, not marking failed"
                        );
                    }
                    Err(error) => {
                        error!(
                            target: "retry_scheduler",
                            exchange_id = %chat.exchange_id,
                            error = %error,
                            "failed to mark exchange failed"
                        );
                    }
                }
            }
        }
    }
}
