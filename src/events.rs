//! Domain event publishing.
//!
//! Events are always traced; with a NATS connection they are also published
//! as JSON. Publishing is best-effort and never fails the request that
//! raised the events.

use tracing::{info, warn};

use crate::domain::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self {
        Self { nats }
    }

    /// Connects when a URL is given; a failed connection degrades to
    /// log-only publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::default() };
        match async_nats::connect(url).await {
            Ok(client) => {
                info!(url, "Connected to event bus");
                Self::new(Some(client))
            }
            Err(e) => {
                warn!(url, error = %e, "Event bus unavailable, events will only be logged");
                Self::default()
            }
        }
    }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let subject = event.subject();
            info!(subject, event = ?event, "Domain event");
            let Some(nats) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => {
                    warn!(subject, error = %e, "Event serialization failed");
                    continue;
                }
            };
            if let Err(e) = nats.publish(subject.to_string(), payload.into()).await {
                warn!(subject, error = %e, "Event publish failed");
            }
        }
    }
}
