//! Fans bus events out to connected WebSocket clients (spec §4.5 "the
//! WebSocket edge subscribes to match/ride events and pushes them to the
//! relevant user's connection"). One durable pull consumer per subject this
//! service cares about, polled on a loop the way
//! `examples/other_examples/.../apps-platform-src-server.rs.rs`'s
//! `run_location_consumer` polls its own durable.

use std::time::Duration;

use bus::events::{consumer, stream};
use bus::{Bus, BusConfig, Event};
use domain::services::{Envelope, Notifier};
use persistence::repositories::ride::RideRepository;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::WsRegistry;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

/// Spawns one polling task per subject this service consumes, each binding
/// its own durable consumer so delivery tracking never collides across
/// subjects (spec §5 "one durable per subscriber").
pub fn spawn_all(bus: Bus, bus_config: BusConfig, registry: WsRegistry, pool: PgPool) {
    let subjects: &[(&str, &str, &str)] = &[
        (stream::MATCH, consumer::MATCH_FOUND_USERS, "match.found"),
        (stream::MATCH, consumer::MATCH_ACCEPTED_USERS, "match.accepted"),
        (stream::MATCH, consumer::MATCH_REJECTED_USERS, "match.rejected"),
        (stream::RIDE, consumer::RIDE_PICKUP_USERS, "ride.pickup"),
        (stream::RIDE, consumer::RIDE_STARTED_USERS, "ride.started"),
        (stream::RIDE, consumer::RIDE_ARRIVED_USERS, "ride.arrived"),
        (stream::RIDE, consumer::RIDE_COMPLETED_USERS, "ride.completed"),
    ];

    for (stream_name, durable_name, subject) in subjects {
        let bus = bus.clone();
        let bus_config = bus_config.clone();
        let registry = registry.clone();
        let pool = pool.clone();
        let stream_name = stream_name.to_string();
        let durable_name = durable_name.to_string();
        let subject = subject.to_string();

        tokio::spawn(async move {
            run_consumer(bus, bus_config, registry, pool, stream_name, durable_name, subject).await;
        });
    }
}

async fn run_consumer(
    bus: Bus,
    bus_config: BusConfig,
    registry: WsRegistry,
    pool: PgPool,
    stream_name: String,
    durable_name: String,
    subject: String,
) {
    let consumer = loop {
        match bus.durable_consumer(&stream_name, &durable_name, &subject, &bus_config).await {
            Ok(c) => break c,
            Err(err) => {
                tracing::error!(error = %err, %subject, "failed to bind durable consumer, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    };
    let rides = RideRepository::new(pool);

    loop {
        let deliveries = match bus::fetch_batch(&consumer, POLL_BATCH, POLL_EXPIRES).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::error!(error = %err, %subject, "failed to fetch from bus");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        for delivery in deliveries {
            let recipients = match recipients_for(&delivery.event, &rides).await {
                Some(r) => r,
                None => {
                    let _ = delivery.terminate().await;
                    continue;
                }
            };

            for (user_id, envelope) in recipients {
                registry.notify(user_id, envelope).await;
            }
            if let Err(err) = delivery.ack().await {
                tracing::warn!(error = %err, "failed to ack bus delivery");
            }
        }
    }
}

/// Resolves which user(s) an event should be pushed to and builds the
/// envelope for each. Match events carry both parties' IDs directly; ride
/// events only carry `ride_id`, so the ride row is looked up to find both
/// the driver and the passenger (spec §4.5: every involved user sees the
/// same events).
async fn recipients_for(event: &Event, rides: &RideRepository) -> Option<Vec<(Uuid, Envelope)>> {
    match event {
        Event::MatchFound(payload) => {
            let data = serde_json::to_value(payload).ok()?;
            Some(vec![
                (payload.driver_id, Envelope::new("match.found", data.clone())),
                (payload.passenger_id, Envelope::new("match.found", data)),
            ])
        }
        Event::MatchAccepted(payload) => {
            let data = serde_json::to_value(payload).ok()?;
            Some(vec![
                (payload.driver_id, Envelope::new("match.accepted", data.clone())),
                (payload.passenger_id, Envelope::new("match.accepted", data)),
            ])
        }
        Event::MatchRejected(payload) => {
            let data = serde_json::to_value(payload).ok()?;
            Some(vec![
                (payload.driver_id, Envelope::new("match.rejected", data.clone())),
                (payload.passenger_id, Envelope::new("match.rejected", data)),
            ])
        }
        Event::RidePickup(payload) => ride_participants(payload.ride_id, "ride.pickup", payload, rides).await,
        Event::RideStarted(payload) => ride_participants(payload.ride_id, "ride.started", payload, rides).await,
        Event::RideArrived(payload) => ride_participants(payload.ride_id, "ride.arrived", payload, rides).await,
        Event::RideCompleted(payload) => ride_participants(payload.ride_id, "ride.completed", payload, rides).await,
        _ => None,
    }
}

async fn ride_participants<P: serde::Serialize>(
    ride_id: Uuid,
    event_name: &str,
    payload: &P,
    rides: &RideRepository,
) -> Option<Vec<(Uuid, Envelope)>> {
    let ride = rides.find_by_id(ride_id).await.ok()??;
    let data = serde_json::to_value(payload).ok()?;
    Some(vec![
        (ride.driver_id, Envelope::new(event_name, data.clone())),
        (ride.passenger_id, Envelope::new(event_name, data)),
    ])
}
