//! The broadcast hub: tenant-keyed registry of connection handles.
//!
//! The registry is a shared map behind a `tokio::sync::RwLock`, injected
//! into handlers as a cloneable service object. Each connection is an
//! `mpsc` sender; per-handle ordering follows broadcast call order because
//! the channel is the single writer for that client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::RwLock;

use crate::event::StreamEvent;
use foliant_core::{ClientId, TenantId};

/// Default heartbeat period for registered connections.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Buffered events per connection before a slow client counts as failed.
const CHANNEL_CAPACITY: usize = 64;

type Registry = HashMap<TenantId, HashMap<ClientId, mpsc::Sender<StreamEvent>>>;

/// Registry of live client connections, keyed by (tenant, client).
#[derive(Clone)]
pub struct BroadcastHub {
    connections: Arc<RwLock<Registry>>,
    heartbeat_interval: Duration,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    /// Create a hub with the default 15s heartbeat.
    #[must_use]
    pub fn new() -> Self {
        Self::with_heartbeat_interval(DEFAULT_HEARTBEAT_INTERVAL)
    }

    /// Create a hub with a custom heartbeat period (tests use short ones).
    #[must_use]
    pub fn with_heartbeat_interval(heartbeat_interval: Duration) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            heartbeat_interval,
        }
    }

    /// Register a connection and start its heartbeat writer.
    ///
    /// Returns the receiving end for the transport layer to drain. The
    /// heartbeat task detects a dead client by its failed write and
    /// unregisters the handle.
    pub async fn register(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        {
            let mut registry = self.connections.write().await;
            registry
                .entry(tenant_id)
                .or_default()
                .insert(client_id, tx.clone());
        }

        tracing::debug!(
            target: "broadcast_hub",
            tenant_id = %tenant_id,
            client_id = %client_id,
            "Client connected"
        );

        let hub = self.clone();
        let interval = self.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if tx.send(StreamEvent::heartbeat()).await.is_err() {
                    hub.unregister(tenant_id, client_id).await;
                    break;
                }
            }
        });

        rx
    }

    /// Remove a connection. Invoked on disconnect or write failure.
    pub async fn unregister(&self, tenant_id: TenantId, client_id: ClientId) {
        let mut registry = self.connections.write().await;
        if let Some(clients) = registry.get_mut(&tenant_id) {
            if clients.remove(&client_id).is_some() {
                tracing::debug!(
                    target: "broadcast_hub",
                    tenant_id = %tenant_id,
                    client_id = %client_id,
                    "Client disconnected"
                );
            }
            if clients.is_empty() {
                registry.remove(&tenant_id);
            }
        }
    }

    /// Fan an event out to every connection registered for one tenant.
    ///
    /// A write failure on one handle does not block delivery to the rest;
    /// the failing handle is unregistered. Zero registered clients is a
    /// silent no-op. Other tenants never see the event.
    pub async fn broadcast(&self, tenant_id: TenantId, event: StreamEvent) {
        let targets: Vec<(ClientId, mpsc::Sender<StreamEvent>)> = {
            let registry = self.connections.read().await;
            match registry.get(&tenant_id) {
                Some(clients) => clients
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => return,
            }
        };

        let mut failed = Vec::new();
        for (client_id, tx) in &targets {
            if tx.try_send(event.clone()).is_err() {
                failed.push(*client_id);
            }
        }

        if !failed.is_empty() {
            tracing::warn!(
                target: "broadcast_hub",
                tenant_id = %tenant_id,
                event = %event.event,
                failed = failed.len(),
                delivered = targets.len() - failed.len(),
                "Dropping unreachable stream clients"
            );
            for client_id in failed {
                self.unregister(tenant_id, client_id).await;
            }
        }
    }

    /// Number of live connections for a tenant.
    pub async fn connection_count(&self, tenant_id: TenantId) -> usize {
        self.connections
            .read()
            .await
            .get(&tenant_id)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_broadcast_reaches_all_tenant_clients_in_order() {
        let hub = BroadcastHub::new();
        let tenant = TenantId::new();
        let mut rx_a = hub.register(tenant, ClientId::new()).await;
        let mut rx_b = hub.register(tenant, ClientId::new()).await;

        hub.broadcast(tenant, StreamEvent::new("first", json!(1)))
            .await;
        hub.broadcast(tenant, StreamEvent::new("second", json!(2)))
            .await;

        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.recv().await.unwrap().event, "first");
            assert_eq!(rx.recv().await.unwrap().event, "second");
        }
    }

    #[tokio::test]
    async fn test_broadcast_is_tenant_scoped() {
        let hub = BroadcastHub::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let mut rx_a = hub.register(tenant_a, ClientId::new()).await;
        let mut rx_b = hub.register(tenant_b, ClientId::new()).await;

        hub.broadcast(tenant_a, StreamEvent::new("for_a", json!({})))
            .await;

        assert_eq!(rx_a.recv().await.unwrap().event, "for_a");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_clients_is_noop() {
        let hub = BroadcastHub::new();
        // Must not panic or error.
        hub.broadcast(TenantId::new(), StreamEvent::heartbeat())
            .await;
    }

    #[tokio::test]
    async fn test_failed_handle_is_dropped_others_still_served() {
        let hub = BroadcastHub::new();
        let tenant = TenantId::new();
        let client_dead = ClientId::new();
        let client_live = ClientId::new();

        let rx_dead = hub.register(tenant, client_dead).await;
        let mut rx_live = hub.register(tenant, client_live).await;
        assert_eq!(hub.connection_count(tenant).await, 2);

        drop(rx_dead);
        hub.broadcast(tenant, StreamEvent::new("ping", json!({})))
            .await;

        assert_eq!(rx_live.recv().await.unwrap().event, "ping");
        assert_eq!(hub.connection_count(tenant).await, 1);

        // A second broadcast reaches only the remaining client.
        hub.broadcast(tenant, StreamEvent::new("pong", json!({})))
            .await;
        assert_eq!(rx_live.recv().await.unwrap().event, "pong");
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let hub = BroadcastHub::new();
        let tenant = TenantId::new();
        let client = ClientId::new();
        let _rx = hub.register(tenant, client).await;

        hub.unregister(tenant, client).await;
        assert_eq!(hub.connection_count(tenant).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_is_written_periodically() {
        let hub = BroadcastHub::with_heartbeat_interval(Duration::from_millis(50));
        let tenant = TenantId::new();
        let mut rx = hub.register(tenant, ClientId::new()).await;

        tokio::time::advance(Duration::from_millis(120)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, "heartbeat");
    }
}
