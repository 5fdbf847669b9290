//! `ProcessBillingUpdate` (spec §4.2 "Billing aggregation"): consumes
//! `location.aggregate` and appends a billing ledger row, incrementing
//! `rides.total_cost` under the ride-row lock when the segment clears
//! `min_distance_km` (spec §4.2 steps 2-4).

use std::time::Duration;

use bus::events::{consumer, stream};
use bus::{Bus, BusConfig, Event};
use domain::models::segment_cost_minor_units;
use persistence::repositories::ride::{RideRepoError, RideRepository};
use sqlx::PgPool;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct BillingParams {
    pub min_distance_km: f64,
    pub rate_per_km: f64,
}

pub fn spawn(bus: Bus, bus_config: BusConfig, pool: PgPool, params: BillingParams) {
    tokio::spawn(async move {
        run_consumer(bus, bus_config, pool, params).await;
    });
}

async fn run_consumer(bus: Bus, bus_config: BusConfig, pool: PgPool, params: BillingParams) {
    let subject = "location.aggregate";
    let consumer = loop {
        match bus.durable_consumer(stream::LOCATION, consumer::LOCATION_AGGREGATE_RIDES, subject, &bus_config).await
        {
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
                Event::LocationAggregate(payload) => process_update(&rides, params, payload).await,
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                // A ride that has already completed (or hasn't started yet)
                // is not a transient failure; redelivering it forever would
                // just poison the consumer on every late sample from a ride
                // that finished while a segment was in flight, so this acks
                // away rather than nak'ing (spec §5 "ordering is not
                // guaranteed... the business computation is commutative").
                Err(err) if is_not_billable(&err) => {
                    tracing::debug!(%err, "billing update for a ride outside ONGOING, dropping");
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, %subject, "billing consumer failed, nak'ing for redelivery");
                    let _ = delivery.nak().await;
                }
            }
        }
    }
}

fn is_not_billable(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<RideRepoError>(), Some(RideRepoError::NotBillable) | Some(RideRepoError::NotFound))
}

async fn process_update(
    rides: &RideRepository,
    params: BillingParams,
    payload: &bus::events::LocationAggregate,
) -> Result<(), anyhow::Error> {
    let cost_minor_units = segment_cost_minor_units(payload.distance_km, params.min_distance_km, params.rate_per_km);
    rides
        .record_billing_segment(payload.ride_id, payload.distance_km, cost_minor_units)
        .await?;
    Ok(())
}
