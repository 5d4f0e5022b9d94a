use anyhow::{Context, Result};
use async_nats::Client;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::messages::EventMessage;
use crate::events::EventEnvelope;

/// Forwards recorder events to NATS subjects
pub struct EventPublisher {
    client: Client,
    subject_prefix: String,
}

impl EventPublisher {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject_prefix: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix,
        })
    }

    pub fn subject_for(&self, event_name: &str) -> String {
        format!("{}.{}", self.subject_prefix, event_name)
    }

    /// Publish a single event
    pub async fn publish(&self, envelope: &EventEnvelope) -> Result<()> {
        let message = EventMessage::from(envelope);
        let subject = self.subject_for(&message.event);
        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish event")?;

        info!("Published {} to {}", message.event, subject);

        Ok(())
    }

    /// Forward every event from `rx` until the emitter goes away
    pub fn spawn_forwarder(self, mut rx: broadcast::Receiver<EventEnvelope>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("NATS event forwarder started");

            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        if let Err(e) = self.publish(&envelope).await {
                            // Keep forwarding even if one publish fails
                            error!("Failed to forward event: {:#}", e);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("NATS forwarder lagged, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            if let Err(e) = self.client.flush().await {
                warn!("Failed to flush NATS connection: {}", e);
            }

            info!("NATS event forwarder stopped");
        })
    }
}
