//! Durable pub/sub bus for the ride-hailing services (spec §5 "Event bus
//! contract"), built on NATS JetStream the way
//! `examples/other_examples/.../apps-platform-src-server.rs.rs` wires up
//! `jetstream::Context` alongside a plain `async_nats::Client`.
//!
//! Delivery is at-least-once: consumers are durable, ack explicitly, and
//! must treat redelivery as expected (the persistence-layer idempotency
//! keys and `ON CONFLICT` upserts absorb the duplicates).

pub mod events;

use std::time::Duration;

use async_nats::jetstream::{self, consumer::pull::Config as PullConfig, stream::Config as StreamConfig};
use futures::StreamExt;

pub use events::Event;

/// Connection configuration, mirroring the `PM__BUS__*` env-var prefixed
/// settings layered in by each service's `config` crate.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub nats_url: String,
    pub ack_wait_secs: u64,
    pub max_deliver: i64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://127.0.0.1:4222".to_string(),
            ack_wait_secs: 30,
            max_deliver: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("nats connect failed: {0}")]
    Connect(#[from] async_nats::ConnectError),
    #[error("jetstream stream error: {0}")]
    Stream(#[from] async_nats::jetstream::context::CreateStreamError),
    #[error("jetstream consumer error: {0}")]
    Consumer(String),
    #[error("publish failed: {0}")]
    Publish(#[from] async_nats::jetstream::context::PublishError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Handle shared by every service: one NATS client, one JetStream context.
#[derive(Clone)]
pub struct Bus {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl Bus {
    /// Connects and ensures all four streams exist (idempotent — each
    /// service calls this on startup regardless of which streams it
    /// actually reads).
    pub async fn connect(config: &BusConfig) -> Result<Self, BusError> {
        let client = async_nats::connect(&config.nats_url).await?;
        let jetstream = jetstream::new(client.clone());

        for (name, subjects) in [
            (events::stream::USER, vec!["user.beacon", "user.finder"]),
            (
                events::stream::MATCH,
                vec!["match.found", "match.accepted", "match.rejected"],
            ),
            (
                events::stream::RIDE,
                vec!["ride.pickup", "ride.started", "ride.arrived", "ride.completed"],
            ),
            (
                events::stream::LOCATION,
                vec!["location.update", "location.aggregate"],
            ),
        ] {
            jetstream
                .create_stream(StreamConfig {
                    name: name.to_string(),
                    subjects: subjects.into_iter().map(String::from).collect(),
                    ..Default::default()
                })
                .await?;
        }

        Ok(Self { client, jetstream })
    }

    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    pub fn jetstream(&self) -> &jetstream::Context {
        &self.jetstream
    }

    /// Liveness check for health endpoints (spec §6 "per-dependency checker
    /// results").
    pub fn is_connected(&self) -> bool {
        matches!(self.client.connection_state(), async_nats::connection::State::Connected)
    }

    /// Publishes an event to its subject; the stream it lands in follows
    /// from the subject binding configured in `connect`.
    pub async fn publish(&self, event: &Event) -> Result<(), BusError> {
        let payload = serde_json::to_vec(event)?;
        self.jetstream
            .publish(event.subject(), payload.into())
            .await?
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))?;
        Ok(())
    }

    /// Binds (creating if absent) a durable pull consumer on `stream_name`
    /// filtered to `subject`, named `durable_name` (spec §5 "Consumer
    /// groups" — one durable per subscribing service, never shared).
    pub async fn durable_consumer(
        &self,
        stream_name: &str,
        durable_name: &str,
        subject: &str,
        config: &BusConfig,
    ) -> Result<jetstream::consumer::Consumer<PullConfig>, BusError> {
        let stream = self
            .jetstream
            .get_stream(stream_name)
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))?;

        let consumer = stream
            .get_or_create_consumer(
                durable_name,
                PullConfig {
                    durable_name: Some(durable_name.to_string()),
                    filter_subject: subject.to_string(),
                    ack_wait: Duration::from_secs(config.ack_wait_secs),
                    max_deliver: config.max_deliver,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))?;

        Ok(consumer)
    }
}

/// A single delivered message, deserialized and ready to ack/nak.
pub struct Delivery {
    pub event: Event,
    message: jetstream::Message,
}

impl Delivery {
    pub async fn ack(self) -> Result<(), BusError> {
        self.message
            .ack()
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))
    }

    /// Negative-acks for redelivery; used when a handler hits a transient
    /// error (spec §5 "redelivery on handler failure").
    pub async fn nak(self) -> Result<(), BusError> {
        self.message
            .ack_with(jetstream::AckKind::Nak(None))
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))
    }

    /// Number of times NATS has attempted delivery of this message,
    /// counting this one. Consumers use this to detect a poison message
    /// and terminate it instead of nak'ing forever.
    pub fn delivery_count(&self) -> u64 {
        self.message
            .info()
            .map(|info| info.delivered as u64)
            .unwrap_or(1)
    }

    pub async fn terminate(self) -> Result<(), BusError> {
        self.message
            .ack_with(jetstream::AckKind::Term)
            .await
            .map_err(|e| BusError::Consumer(e.to_string()))
    }
}

/// Pulls a bounded batch of messages from a durable consumer and
/// deserializes each one, skipping (and acking away) payloads that fail
/// to parse rather than blocking the consumer forever on a poison message.
pub async fn fetch_batch(
    consumer: &jetstream::consumer::Consumer<PullConfig>,
    batch_size: usize,
    expires: Duration,
) -> Result<Vec<Delivery>, BusError> {
    let mut messages = consumer
        .fetch()
        .max_messages(batch_size)
        .expires(expires.as_millis() as u64)
        .messages()
        .await
        .map_err(|e| BusError::Consumer(e.to_string()))?;

    let mut out = Vec::with_capacity(batch_size);
    while let Some(next) = messages.next().await {
        let message = match next {
            Ok(m) => m,
            Err(_) => continue,
        };
        match serde_json::from_slice::<Event>(&message.payload) {
            Ok(event) => out.push(Delivery { event, message }),
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed bus message");
                let _ = message.ack_with(jetstream::AckKind::Term).await;
            }
        }
    }
    Ok(out)
}
