//! `CreateRide` (spec §4.2 "Creation"): consumes `match.accepted` and
//! inserts the Ride row in PENDING, immediately transitioned to PICKUP,
//! publishing `ride.pickup` exactly once per `match_id` (spec §4.2, §8
//! "at-least-once consumer idempotence"). Redelivery finds the row already
//! created and acks without republishing (spec §8 scenario 6).

use std::time::Duration;

use bus::events::{consumer, stream, RidePickup};
use bus::{Bus, BusConfig, Event};
use domain::models::RideEvent;
use persistence::repositories::ride::RideRepository;
use sqlx::PgPool;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

pub fn spawn(bus: Bus, bus_config: BusConfig, pool: PgPool) {
    tokio::spawn(async move {
        run_consumer(bus, bus_config, pool).await;
    });
}

async fn run_consumer(bus: Bus, bus_config: BusConfig, pool: PgPool) {
    let subject = "match.accepted";
    let consumer = loop {
        match bus.durable_consumer(stream::MATCH, consumer::MATCH_ACCEPTED_RIDES, subject, &bus_config).await {
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
            let result = match &delivery.event {
                Event::MatchAccepted(payload) => create_ride(&rides, &bus, payload).await,
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, %subject, "match.accepted consumer failed, nak'ing for redelivery");
                    let _ = delivery.nak().await;
                }
            }
        }
    }
}

/// Inserts the Ride row keyed by `match_id` (the `ON CONFLICT (match_id) DO
/// NOTHING` upsert in `create_for_match` makes this redelivery-safe), then
/// runs the PENDING -> PICKUP transition and publishes `ride.pickup` only
/// when this call was the one that actually inserted the row.
async fn create_ride(
    rides: &RideRepository,
    bus: &Bus,
    payload: &bus::events::MatchAccepted,
) -> Result<(), anyhow::Error> {
    let (entity, inserted) = rides
        .create_for_match(payload.ride_id, payload.match_id, payload.driver_id, payload.passenger_id)
        .await?;

    if !inserted {
        tracing::debug!(ride_id = %payload.ride_id, "ride.pickup already handled for this match, skipping");
        return Ok(());
    }

    rides.apply_transition(entity.ride_id, RideEvent::MatchAccepted).await?;

    bus.publish(&Event::RidePickup(RidePickup {
        ride_id: entity.ride_id,
        match_id: entity.match_id,
    }))
    .await?;

    Ok(())
}
