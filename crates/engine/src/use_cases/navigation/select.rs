//! Pure next-location selection.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scanquest_domain::{InstanceSettings, Location, LocationId, NavigationMode, TeamCode};
use sha2::{Digest, Sha256};

/// Seed for a team's random route. Depends only on the code, so every
/// request for the same team shuffles the locations identically.
pub fn team_seed(code: &TeamCode) -> u64 {
    let digest = Sha256::digest(code.as_str().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// The locations a team may visit next, or `None` once every location has
/// been visited.
///
/// `locations` is every location in the instance; `visited` holds the ids
/// the team has checked in at.
pub fn select_next_locations(
    settings: &InstanceSettings,
    team_code: &TeamCode,
    locations: &[Location],
    visited: &HashSet<LocationId>,
) -> Option<Vec<Location>> {
    let visited_here = locations
        .iter()
        .filter(|l| visited.contains(&l.id))
        .count();
    if visited_here == locations.len() {
        return None;
    }

    let mut ordered: Vec<&Location> = locations.iter().collect();
    ordered.sort_by_key(|l| (l.order, l.id));

    let next: Vec<Location> = match settings.navigation_mode {
        NavigationMode::Ordered => ordered
            .into_iter()
            .find(|l| !visited.contains(&l.id))
            .cloned()
            .into_iter()
            .collect(),
        NavigationMode::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(team_seed(team_code));
            ordered.shuffle(&mut rng);
            ordered
                .into_iter()
                .filter(|l| !visited.contains(&l.id))
                .take(settings.max_next_locations() as usize)
                .cloned()
                .collect()
        }
        NavigationMode::FreeRoam => ordered
            .into_iter()
            .filter(|l| !visited.contains(&l.id))
            .cloned()
            .collect(),
    };

    (!next.is_empty()).then_some(next)
}
