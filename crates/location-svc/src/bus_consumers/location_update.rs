//! `StoreLocation` (spec §4.3): on each `location.update` sample, compare
//! against the ride's previous location and publish the computed segment
//! distance, or just seed the previous-location key if this is the first
//! sample for the ride.

use std::time::Duration;

use bus::events::{consumer, stream, LocationAggregate};
use bus::{Bus, BusConfig, Event};
use chrono::Utc;
use shared::geo::haversine;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

pub fn spawn(bus: Bus, bus_config: BusConfig, geo: geo_index::GeoIndex) {
    tokio::spawn(async move {
        run_consumer(bus, bus_config, geo).await;
    });
}

async fn run_consumer(bus: Bus, bus_config: BusConfig, geo: geo_index::GeoIndex) {
    let subject = "location.update";
    let consumer = loop {
        match bus
            .durable_consumer(stream::LOCATION, consumer::LOCATION_UPDATE_LOCATION, subject, &bus_config)
            .await
        {
            Ok(c) => break c,
            Err(err) => {
                tracing::error!(error = %err, %subject, "failed to bind durable consumer, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    };

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
                Event::LocationUpdate(payload) => store_location(&geo, &bus, payload).await,
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, %subject, "location update consumer failed, nak'ing for redelivery");
                    let _ = delivery.nak().await;
                }
            }
        }
    }
}

/// Spec §4.3 "StoreLocation": no previous location means this is the first
/// sample for the ride, so it's written as the seed without publishing an
/// aggregate; otherwise the segment distance is computed and the sample
/// becomes the new "previous" before publishing.
async fn store_location(
    geo: &geo_index::GeoIndex,
    bus: &Bus,
    payload: &bus::events::LocationUpdate,
) -> Result<(), anyhow::Error> {
    let previous = geo.ride_previous_location(payload.ride_id).await?;

    geo.store_ride_location(payload.ride_id, payload.location).await?;

    let Some(previous) = previous else {
        return Ok(());
    };

    let distance_km = haversine(previous, payload.location);

    bus.publish(&Event::LocationAggregate(LocationAggregate {
        ride_id: payload.ride_id,
        distance_km,
        lat: payload.location.lat,
        lng: payload.location.lng,
        ts: Utc::now(),
    }))
    .await?;

    Ok(())
}
