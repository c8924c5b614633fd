// 🗺️ Distance Table - Static city and intercity distances
// City distances are stored once per unordered pair; intercity distances
// are measured from the Frankfurt origin.

use crate::fare::RideType;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Origin of every intercity ride
pub const INTERCITY_ORIGIN: &str = "Frankfurt";

/// Used when a city pair is not in the table
pub const DEFAULT_CITY_KM: u32 = 10;

/// Used when an intercity destination is not in the table
pub const DEFAULT_INTERCITY_KM: u32 = 300;

const CITY_DISTANCES: &[(&str, &str, u32)] = &[
    ("Frankfurt Main Station", "Frankfurt Airport", 12),
    ("Frankfurt Main Station", "Frankfurt Westend", 4),
    ("Frankfurt Main Station", "Frankfurt Ostend", 5),
    ("Frankfurt Main Station", "Frankfurt Nordend", 3),
    ("Frankfurt Main Station", "Frankfurt Bornheim", 4),
    ("Frankfurt Main Station", "Frankfurt Sachsenhausen", 3),
    ("Frankfurt Main Station", "Frankfurt Bockenheim", 5),
    ("Frankfurt Main Station", "Frankfurt Höchst", 10),
    ("Frankfurt Main Station", "Frankfurt Niederrad", 7),
    ("Frankfurt Airport", "Frankfurt Westend", 15),
    ("Frankfurt Airport", "Frankfurt Ostend", 16),
    ("Frankfurt Airport", "Frankfurt Nordend", 14),
    ("Frankfurt Airport", "Frankfurt Bornheim", 15),
    ("Frankfurt Airport", "Frankfurt Sachsenhausen", 10),
    ("Frankfurt Airport", "Frankfurt Bockenheim", 16),
    ("Frankfurt Airport", "Frankfurt Höchst", 18),
    ("Frankfurt Airport", "Frankfurt Niederrad", 6),
    ("Frankfurt Westend", "Frankfurt Ostend", 6),
    ("Frankfurt Westend", "Frankfurt Nordend", 3),
    ("Frankfurt Westend", "Frankfurt Bornheim", 5),
    ("Frankfurt Westend", "Frankfurt Sachsenhausen", 5),
    ("Frankfurt Westend", "Frankfurt Bockenheim", 3),
    ("Frankfurt Westend", "Frankfurt Höchst", 12),
    ("Frankfurt Westend", "Frankfurt Niederrad", 9),
    ("Frankfurt Ostend", "Frankfurt Nordend", 2),
    ("Frankfurt Ostend", "Frankfurt Bornheim", 2),
    ("Frankfurt Ostend", "Frankfurt Sachsenhausen", 6),
    ("Frankfurt Ostend", "Frankfurt Bockenheim", 8),
    ("Frankfurt Ostend", "Frankfurt Höchst", 14),
    ("Frankfurt Ostend", "Frankfurt Niederrad", 10),
    ("Frankfurt Nordend", "Frankfurt Bornheim", 2),
    ("Frankfurt Nordend", "Frankfurt Sachsenhausen", 5),
    ("Frankfurt Nordend", "Frankfurt Bockenheim", 5),
    ("Frankfurt Nordend", "Frankfurt Höchst", 12),
    ("Frankfurt Nordend", "Frankfurt Niederrad", 9),
    ("Frankfurt Bornheim", "Frankfurt Sachsenhausen", 6),
    ("Frankfurt Bornheim", "Frankfurt Bockenheim", 7),
    ("Frankfurt Bornheim", "Frankfurt Höchst", 13),
    ("Frankfurt Bornheim", "Frankfurt Niederrad", 10),
    ("Frankfurt Sachsenhausen", "Frankfurt Bockenheim", 7),
    ("Frankfurt Sachsenhausen", "Frankfurt Höchst", 12),
    ("Frankfurt Sachsenhausen", "Frankfurt Niederrad", 5),
    ("Frankfurt Bockenheim", "Frankfurt Höchst", 9),
    ("Frankfurt Bockenheim", "Frankfurt Niederrad", 11),
    ("Frankfurt Höchst", "Frankfurt Niederrad", 14),
];

const INTERCITY_DISTANCES: &[(&str, u32)] = &[
    ("Berlin", 545),
    ("Munich", 390),
    ("Hamburg", 490),
    ("Cologne", 190),
    ("Stuttgart", 205),
    ("Düsseldorf", 220),
    ("Leipzig", 385),
    ("Dresden", 455),
    ("Nuremberg", 225),
    ("Hannover", 350),
];

// ============================================================================
// PAIR KEY
// ============================================================================

/// Unordered pair of city locations, stored with the names sorted
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            PairKey(a.to_string(), b.to_string())
        } else {
            PairKey(b.to_string(), a.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("distance {from} -> {to} is {existing} km in one direction and {conflicting} km in the other")]
    AsymmetricDistance {
        from: String,
        to: String,
        existing: u32,
        conflicting: u32,
    },
    #[error("a location cannot have a distance to itself: {0}")]
    SelfLoop(String),
}

/// Pickup and dropoff choices offered for a ride type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptions {
    pub pickup_options: Vec<String>,
    pub dropoff_options: Vec<String>,
}

// ============================================================================
// DISTANCE TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    /// City locations in declaration order
    city_locations: Vec<String>,
    city: HashMap<PairKey, u32>,
    /// Intercity destinations in declaration order
    destinations: Vec<String>,
    intercity: HashMap<String, u32>,
}

impl DistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Frankfurt table
    pub fn frankfurt() -> Self {
        let mut table = DistanceTable::new();

        for (from, to, km) in CITY_DISTANCES {
            // The built-in data has one entry per pair, so this cannot conflict
            if let Err(e) = table.insert_city(from, to, *km) {
                tracing::error!("Built-in distance table rejected {} -> {}: {}", from, to, e);
            }
        }

        for (destination, km) in INTERCITY_DISTANCES {
            table.insert_intercity(destination, *km);
        }

        table
    }

    /// Register a city distance. Re-inserting a pair in either direction with a
    /// different distance is rejected.
    pub fn insert_city(&mut self, from: &str, to: &str, km: u32) -> Result<(), TableError> {
        if from == to {
            return Err(TableError::SelfLoop(from.to_string()));
        }

        let key = PairKey::new(from, to);
        if let Some(&existing) = self.city.get(&key) {
            if existing != km {
                return Err(TableError::AsymmetricDistance {
                    from: from.to_string(),
                    to: to.to_string(),
                    existing,
                    conflicting: km,
                });
            }
            return Ok(());
        }

        for name in [from, to] {
            if !self.city_locations.iter().any(|l| l == name) {
                self.city_locations.push(name.to_string());
            }
        }

        self.city.insert(key, km);
        Ok(())
    }

    /// Register (or overwrite) the distance from Frankfurt to a destination
    pub fn insert_intercity(&mut self, destination: &str, km: u32) {
        if !self.destinations.iter().any(|d| d == destination) {
            self.destinations.push(destination.to_string());
        }
        self.intercity.insert(destination.to_string(), km);
    }

    pub fn is_city_location(&self, name: &str) -> bool {
        self.city_locations.iter().any(|l| l == name)
    }

    pub fn is_intercity_destination(&self, name: &str) -> bool {
        self.intercity.contains_key(name)
    }

    pub fn city_locations(&self) -> &[String] {
        &self.city_locations
    }

    pub fn intercity_destinations(&self) -> &[String] {
        &self.destinations
    }

    /// Distance in km between pickup and dropoff. Unknown routes fall back to
    /// the ride type's default distance instead of failing.
    pub fn resolve_distance(&self, pickup: &str, dropoff: &str, ride_type: RideType) -> u32 {
        match ride_type {
            RideType::City => match self.city.get(&PairKey::new(pickup, dropoff)) {
                Some(&km) => km,
                None => {
                    tracing::debug!(pickup, dropoff, "Unknown city route, using default distance");
                    DEFAULT_CITY_KM
                }
            },
            // Intercity rides always leave from Frankfurt; the pickup is not consulted
            RideType::Intercity => match self.intercity.get(dropoff) {
                Some(&km) => km,
                None => {
                    tracing::debug!(dropoff, "Unknown intercity destination, using default distance");
                    DEFAULT_INTERCITY_KM
                }
            },
        }
    }

    pub fn list_locations(&self, ride_type: RideType) -> LocationOptions {
        match ride_type {
            RideType::City => LocationOptions {
                pickup_options: self.city_locations.clone(),
                dropoff_options: self.city_locations.clone(),
            },
            RideType::Intercity => LocationOptions {
                pickup_options: vec![INTERCITY_ORIGIN.to_string()],
                dropoff_options: self.destinations.clone(),
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frankfurt_table_shape() {
        let table = DistanceTable::frankfurt();
        assert_eq!(table.city_locations().len(), 10);
        assert_eq!(table.city_locations()[0], "Frankfurt Main Station");
        assert_eq!(table.city_locations()[9], "Frankfurt Niederrad");
        assert_eq!(table.intercity_destinations().len(), 10);
        assert_eq!(table.intercity_destinations()[0], "Berlin");
    }

    #[test]
    fn test_city_lookup_both_directions() {
        let table = DistanceTable::frankfurt();
        let forward = table.resolve_distance("Frankfurt Main Station", "Frankfurt Airport", RideType::City);
        let reverse = table.resolve_distance("Frankfurt Airport", "Frankfurt Main Station", RideType::City);
        assert_eq!(forward, 12);
        assert_eq!(reverse, 12);
    }

    #[test]
    fn test_city_symmetry_for_every_pair() {
        let table = DistanceTable::frankfurt();
        let locations = table.city_locations().to_vec();
        for a in &locations {
            for b in &locations {
                assert_eq!(
                    table.resolve_distance(a, b, RideType::City),
                    table.resolve_distance(b, a, RideType::City)
                );
            }
        }
    }

    #[test]
    fn test_unknown_city_route_defaults() {
        let table = DistanceTable::frankfurt();
        assert_eq!(table.resolve_distance("UnknownPlace", "UnknownPlace2", RideType::City), 10);
        // Same location is not a stored pair either
        assert_eq!(
            table.resolve_distance("Frankfurt Westend", "Frankfurt Westend", RideType::City),
            DEFAULT_CITY_KM
        );
    }

    #[test]
    fn test_intercity_lookup() {
        let table = DistanceTable::frankfurt();
        assert_eq!(table.resolve_distance("Frankfurt", "Munich", RideType::Intercity), 390);
        assert_eq!(table.resolve_distance("Frankfurt", "Düsseldorf", RideType::Intercity), 220);
        assert_eq!(table.resolve_distance("Frankfurt", "UnknownCity", RideType::Intercity), 300);
    }

    #[test]
    fn test_intercity_has_no_reverse_lookup() {
        let table = DistanceTable::frankfurt();
        assert_eq!(
            table.resolve_distance("Munich", "Frankfurt", RideType::Intercity),
            DEFAULT_INTERCITY_KM
        );
    }

    #[test]
    fn test_list_locations() {
        let table = DistanceTable::frankfurt();

        let city = table.list_locations(RideType::City);
        assert_eq!(city.pickup_options, city.dropoff_options);
        assert_eq!(city.pickup_options.len(), 10);

        let intercity = table.list_locations(RideType::Intercity);
        assert_eq!(intercity.pickup_options, vec!["Frankfurt".to_string()]);
        assert_eq!(intercity.dropoff_options[1], "Munich");
    }

    #[test]
    fn test_asymmetric_insert_rejected() {
        let mut table = DistanceTable::new();
        table.insert_city("A", "B", 4).unwrap();
        assert!(table.insert_city("B", "A", 4).is_ok());

        let err = table.insert_city("B", "A", 5).unwrap_err();
        assert!(matches!(err, TableError::AsymmetricDistance { existing: 4, conflicting: 5, .. }));
        assert_eq!(table.resolve_distance("A", "B", RideType::City), 4);
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut table = DistanceTable::new();
        assert_eq!(table.insert_city("A", "A", 1), Err(TableError::SelfLoop("A".to_string())));
        assert!(table.city_locations().is_empty());
    }

    #[test]
    fn test_pair_key_is_canonical() {
        assert_eq!(PairKey::new("x", "y"), PairKey::new("y", "x"));
    }
}
