//! Pure proposal-selection logic for the match engine (spec §4.1 "Proposal
//! algorithm", steps 1-2). Candidates are assumed already sorted ascending
//! by distance and already filtered to `search_radius_km` by the geo-index
//! query; this picks the first one not currently holding an active-ride
//! lock.

use std::collections::HashSet;
use uuid::Uuid;

use crate::models::NearbyCandidate;

/// Returns the first candidate without an active-ride lock, or `None` if
/// every candidate in radius is already riding.
pub fn select_candidate<'a>(
    candidates: &'a [NearbyCandidate],
    locked_user_ids: &HashSet<Uuid>,
) -> Option<&'a NearbyCandidate> {
    candidates
        .iter()
        .find(|c| !locked_user_ids.contains(&c.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::geo::GeoPoint;

    fn candidate(id: Uuid, dist: f64) -> NearbyCandidate {
        NearbyCandidate {
            user_id: id,
            location: GeoPoint::new(0.0, 0.0),
            distance_km: dist,
        }
    }

    #[test]
    fn picks_nearest_unlocked() {
        let locked_one = Uuid::new_v4();
        let unlocked = Uuid::new_v4();
        let candidates = vec![candidate(locked_one, 0.1), candidate(unlocked, 0.5)];
        let mut locked = HashSet::new();
        locked.insert(locked_one);

        let picked = select_candidate(&candidates, &locked).unwrap();
        assert_eq!(picked.user_id, unlocked);
    }

    #[test]
    fn none_when_all_locked() {
        let a = Uuid::new_v4();
        let candidates = vec![candidate(a, 0.1)];
        let mut locked = HashSet::new();
        locked.insert(a);

        assert!(select_candidate(&candidates, &locked).is_none());
    }
}
