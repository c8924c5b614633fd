// ✅ Ride Validation - Feasibility checks before pricing
// Rules run in order and the first failure wins

use crate::fare::{RideType, VehicleType};
use crate::locations::{DistanceTable, INTERCITY_ORIGIN};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// REJECTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RideRejection {
    #[error("{vehicle} can only accommodate {capacity} passengers.")]
    CapacityExceeded {
        vehicle: VehicleType,
        capacity: u32,
        requested: u32,
    },
    #[error("Both pickup and dropoff locations must be within Frankfurt for city rides.")]
    OutsideCity,
    #[error("Pickup location must be Frankfurt for intercity rides.")]
    PickupNotFrankfurt,
    #[error("Dropoff location must be a valid German city for intercity rides.")]
    UnsupportedDestination,
    #[error("Pickup and dropoff locations must be different.")]
    SameLocation,
}

/// Wire form of a validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RideValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&Result<(), RideRejection>> for RideValidation {
    fn from(result: &Result<(), RideRejection>) -> Self {
        match result {
            Ok(()) => RideValidation {
                valid: true,
                message: None,
            },
            Err(rejection) => RideValidation {
                valid: false,
                message: Some(rejection.to_string()),
            },
        }
    }
}

// ============================================================================
// RULES
// ============================================================================

pub fn validate_ride(
    table: &DistanceTable,
    pickup: &str,
    dropoff: &str,
    passengers: u32,
    vehicle: VehicleType,
    ride_type: RideType,
) -> Result<(), RideRejection> {
    let capacity = vehicle.capacity();
    if passengers > capacity {
        return Err(RideRejection::CapacityExceeded {
            vehicle,
            capacity,
            requested: passengers,
        });
    }

    match ride_type {
        RideType::City => {
            if !table.is_city_location(pickup) || !table.is_city_location(dropoff) {
                return Err(RideRejection::OutsideCity);
            }
        }
        RideType::Intercity => {
            if pickup != INTERCITY_ORIGIN {
                return Err(RideRejection::PickupNotFrankfurt);
            }
            if !table.is_intercity_destination(dropoff) {
                return Err(RideRejection::UnsupportedDestination);
            }
        }
    }

    if pickup == dropoff {
        return Err(RideRejection::SameLocation);
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DistanceTable {
        DistanceTable::frankfurt()
    }

    #[test]
    fn test_valid_city_ride() {
        let result = validate_ride(
            &table(),
            "Frankfurt Main Station",
            "Frankfurt Airport",
            2,
            VehicleType::Sedan,
            RideType::City,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_capacity_exceeded() {
        let err = validate_ride(
            &table(),
            "Frankfurt Main Station",
            "Frankfurt Airport",
            5,
            VehicleType::Sedan,
            RideType::City,
        )
        .unwrap_err();

        assert_eq!(
            err,
            RideRejection::CapacityExceeded {
                vehicle: VehicleType::Sedan,
                capacity: 4,
                requested: 5
            }
        );
        assert_eq!(err.to_string(), "Sedan can only accommodate 4 passengers.");
    }

    #[test]
    fn test_suv_takes_six() {
        let result = validate_ride(&table(), "Frankfurt", "Berlin", 6, VehicleType::Suv, RideType::Intercity);
        assert!(result.is_ok());
    }

    #[test]
    fn test_capacity_checked_before_locations() {
        let err = validate_ride(&table(), "Nowhere", "Nowhere", 7, VehicleType::Suv, RideType::City).unwrap_err();
        assert!(matches!(err, RideRejection::CapacityExceeded { .. }));
    }

    #[test]
    fn test_city_ride_outside_city() {
        let err = validate_ride(
            &table(),
            "Frankfurt Westend",
            "Munich",
            1,
            VehicleType::Sedan,
            RideType::City,
        )
        .unwrap_err();
        assert_eq!(err, RideRejection::OutsideCity);
    }

    #[test]
    fn test_intercity_pickup_must_be_frankfurt() {
        let err = validate_ride(
            &table(),
            "Frankfurt Airport",
            "Berlin",
            1,
            VehicleType::Sedan,
            RideType::Intercity,
        )
        .unwrap_err();
        assert_eq!(err, RideRejection::PickupNotFrankfurt);
    }

    #[test]
    fn test_intercity_unknown_destination() {
        let err = validate_ride(&table(), "Frankfurt", "Paris", 1, VehicleType::Luxury, RideType::Intercity)
            .unwrap_err();
        assert_eq!(err, RideRejection::UnsupportedDestination);
    }

    #[test]
    fn test_same_location_rejected() {
        let err = validate_ride(
            &table(),
            "Frankfurt Main Station",
            "Frankfurt Main Station",
            1,
            VehicleType::Sedan,
            RideType::City,
        )
        .unwrap_err();
        assert_eq!(err, RideRejection::SameLocation);
    }

    #[test]
    fn test_validation_wire_form() {
        let ok: RideValidation = (&Ok(())).into();
        assert!(ok.valid);
        assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({ "valid": true }));

        let rejected: RideValidation = (&Err(RideRejection::SameLocation)).into();
        assert!(!rejected.valid);
        assert_eq!(
            rejected.message.as_deref(),
            Some("Pickup and dropoff locations must be different.")
        );
    }
}
