//! Pool release (spec §4.1 "Pool release"): once a ride completes, the
//! active-ride-lock pair match-svc set at confirmation time is torn down so
//! both parties can be matched again. Re-joining the availability pool is a
//! client action (a fresh `user.beacon`/`user.finder`), not automatic.

use std::time::Duration;

use bus::events::{consumer, stream};
use bus::{Bus, BusConfig, Event};
use domain::models::Role;
use persistence::repositories::ride::RideRepository;
use sqlx::PgPool;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

pub fn spawn(bus: Bus, bus_config: BusConfig, geo: geo_index::GeoIndex, pool: PgPool) {
    tokio::spawn(async move {
        run_consumer(bus, bus_config, geo, pool).await;
    });
}

async fn run_consumer(bus: Bus, bus_config: BusConfig, geo: geo_index::GeoIndex, pool: PgPool) {
    let subject = "ride.completed";
    let consumer = loop {
        match bus.durable_consumer(stream::RIDE, consumer::RIDE_COMPLETED_MATCH, subject, &bus_config).await {
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
                Event::RideCompleted(payload) => release(&geo, &rides, payload.ride_id).await,
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, %subject, "pool release consumer failed, nak'ing for redelivery");
                    let _ = delivery.nak().await;
                }
            }
        }
    }
}

/// Ride events only carry `ride_id`; the driver/passenger pair is looked up
/// from the ride row to release both locks (spec §4.1 "Pool release").
async fn release(geo: &geo_index::GeoIndex, rides: &RideRepository, ride_id: uuid::Uuid) -> Result<(), anyhow::Error> {
    let ride = match rides.find_by_id(ride_id).await? {
        Some(r) => r,
        None => {
            tracing::warn!(%ride_id, "ride.completed for unknown ride, skipping pool release");
            return Ok(());
        }
    };

    geo.release_active_ride_lock(Role::Driver, ride.driver_id).await?;
    geo.release_active_ride_lock(Role::Passenger, ride.passenger_id).await?;
    Ok(())
}
