//! Availability-pool maintenance and the proposal algorithm (spec §4.1
//! "Availability operations", "Proposal algorithm"), driven off `user.beacon`
//! and `user.finder` — the "bus-reaction to user events" half of availability
//! management (the service-internal HTTP half lives in location-svc).

use std::collections::HashSet;
use std::time::Duration;

use bus::events::{consumer, stream, MatchFound, UserBeacon, UserFinder};
use bus::{Bus, BusConfig, Event};
use domain::models::{NearbyCandidate, Role};
use domain::services::select_candidate;
use persistence::repositories::match_proposal::{MatchRepository, NewMatch};
use shared::geo::GeoPoint;

use crate::config::MatchingConfig;

const POLL_BATCH: usize = 32;
const POLL_EXPIRES: Duration = Duration::from_secs(5);

pub fn spawn_all(
    bus: Bus,
    bus_config: BusConfig,
    geo: geo_index::GeoIndex,
    pool: sqlx::PgPool,
    matching: MatchingConfig,
) {
    spawn_one(
        bus.clone(),
        bus_config.clone(),
        geo.clone(),
        pool.clone(),
        matching.clone(),
        stream::USER,
        consumer::USER_FINDER_MATCH,
        "user.finder",
    );
    spawn_one(bus, bus_config, geo, pool, matching, stream::USER, consumer::USER_BEACON_MATCH, "user.beacon");
}

fn spawn_one(
    bus: Bus,
    bus_config: BusConfig,
    geo: geo_index::GeoIndex,
    pool: sqlx::PgPool,
    matching: MatchingConfig,
    stream_name: &'static str,
    durable_name: &'static str,
    subject: &'static str,
) {
    tokio::spawn(async move {
        run_consumer(bus, bus_config, geo, pool, matching, stream_name, durable_name, subject).await;
    });
}

async fn run_consumer(
    bus: Bus,
    bus_config: BusConfig,
    geo: geo_index::GeoIndex,
    pool: sqlx::PgPool,
    matching: MatchingConfig,
    stream_name: &str,
    durable_name: &str,
    subject: &str,
) {
    let consumer = loop {
        match bus.durable_consumer(stream_name, durable_name, subject, &bus_config).await {
            Ok(c) => break c,
            Err(err) => {
                tracing::error!(error = %err, %subject, "failed to bind durable consumer, retrying");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    };
    let matches = MatchRepository::new(pool);

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
                Event::UserBeacon(payload) => handle_beacon(&geo, &bus, &matches, &matching, payload).await,
                Event::UserFinder(payload) => handle_finder(&geo, &bus, &matches, &matching, payload).await,
                _ => Ok(()),
            };

            match result {
                Ok(()) => {
                    if let Err(err) = delivery.ack().await {
                        tracing::warn!(error = %err, "failed to ack bus delivery");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, %subject, "proposal consumer failed, nak'ing for redelivery");
                    let _ = delivery.nak().await;
                }
            }
        }
    }
}

async fn handle_beacon(
    geo: &geo_index::GeoIndex,
    bus: &Bus,
    matches: &MatchRepository,
    matching: &MatchingConfig,
    payload: &UserBeacon,
) -> Result<(), anyhow::Error> {
    if !payload.active {
        geo.remove_available(Role::Driver, payload.driver_id).await?;
        return Ok(());
    }

    geo.add_available(Role::Driver, payload.driver_id, payload.location, matching.availability_ttl_secs())
        .await?;

    if !matching.beacon_triggers_match {
        return Ok(());
    }

    let candidates = geo.nearby(Role::Passenger, payload.location, matching.search_radius_km).await?;
    let candidate = match select_unlocked_candidate(geo, Role::Passenger, &candidates).await? {
        Some(c) => c,
        None => return Ok(()),
    };

    // The driver-initiated path has no declared destination for the
    // passenger; the candidate's last-known location stands in until the
    // finder-triggered path (which always carries one) confirms the pair.
    propose(
        matches,
        bus,
        payload.driver_id,
        payload.location,
        candidate.user_id,
        candidate.location,
        candidate.location,
    )
    .await
}

async fn handle_finder(
    geo: &geo_index::GeoIndex,
    bus: &Bus,
    matches: &MatchRepository,
    matching: &MatchingConfig,
    payload: &UserFinder,
) -> Result<(), anyhow::Error> {
    if !payload.active {
        geo.remove_available(Role::Passenger, payload.passenger_id).await?;
        return Ok(());
    }

    geo.add_available(Role::Passenger, payload.passenger_id, payload.pickup, matching.availability_ttl_secs())
        .await?;

    let candidates = geo.nearby(Role::Driver, payload.pickup, matching.search_radius_km).await?;
    let candidate = match select_unlocked_candidate(geo, Role::Driver, &candidates).await? {
        Some(c) => c,
        None => return Ok(()),
    };

    propose(
        matches,
        bus,
        candidate.user_id,
        candidate.location,
        payload.passenger_id,
        payload.pickup,
        payload.destination,
    )
    .await
}

/// Step 2 of the proposal algorithm: drops candidates no longer in the
/// `candidate_role` available-set (a stale geo entry whose TTL has not yet
/// fired — spec §4.1 step 2) and candidates already holding an active-ride
/// lock, then hands the remainder to `select_candidate` for the
/// nearest-unlocked pick (candidates arrive pre-sorted ascending by distance
/// from the geo-index radius query).
async fn select_unlocked_candidate(
    geo: &geo_index::GeoIndex,
    candidate_role: Role,
    candidates: &[NearbyCandidate],
) -> Result<Option<NearbyCandidate>, anyhow::Error> {
    let mut excluded = HashSet::new();
    for candidate in candidates {
        if !geo.is_available(candidate_role, candidate.user_id).await? {
            excluded.insert(candidate.user_id);
            continue;
        }
        if geo.get_active_ride_lock(Role::Driver, candidate.user_id).await?.is_some()
            || geo.get_active_ride_lock(Role::Passenger, candidate.user_id).await?.is_some()
        {
            excluded.insert(candidate.user_id);
        }
    }
    Ok(select_candidate(candidates, &excluded).cloned())
}

async fn propose(
    matches: &MatchRepository,
    bus: &Bus,
    driver_id: uuid::Uuid,
    driver_location: GeoPoint,
    passenger_id: uuid::Uuid,
    passenger_location: GeoPoint,
    target_location: GeoPoint,
) -> Result<(), anyhow::Error> {
    let entity = matches
        .create_or_reuse_pending(NewMatch {
            driver_id,
            passenger_id,
            driver_lat: driver_location.lat,
            driver_lng: driver_location.lng,
            passenger_lat: passenger_location.lat,
            passenger_lng: passenger_location.lng,
            target_lat: target_location.lat,
            target_lng: target_location.lng,
        })
        .await?;

    bus.publish(&Event::MatchFound(MatchFound {
        match_id: entity.id,
        driver_id: entity.driver_id,
        passenger_id: entity.passenger_id,
    }))
    .await?;

    Ok(())
}
