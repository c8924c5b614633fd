// 🚕 Fare Engine - validate → resolve distance → price
// Holds the distance table and the active fare formula as explicit configuration

use crate::fare::{compute_fare, FareFormula, RideType, VehicleType};
use crate::locations::{DistanceTable, LocationOptions};
use crate::validation::{validate_ride, RideRejection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A ride the customer wants priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    pub pickup: String,
    pub dropoff: String,
    pub ride_type: RideType,
    pub vehicle_type: VehicleType,
    pub passengers: u32,
}

/// Priced ride, ready for the passenger-details step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareQuote {
    pub request: RideRequest,
    pub distance_km: u32,
    pub fare: f64,
}

#[derive(Debug, Clone)]
pub struct FareEngine {
    table: DistanceTable,
    formula: FareFormula,
}

impl FareEngine {
    pub fn new(table: DistanceTable, formula: FareFormula) -> Self {
        FareEngine { table, formula }
    }

    pub fn formula(&self) -> &FareFormula {
        &self.formula
    }

    /// Swap in a new formula. Validation is the caller's job (see `FareSettings`).
    pub fn set_formula(&mut self, formula: FareFormula) {
        self.formula = formula;
    }

    pub fn table(&self) -> &DistanceTable {
        &self.table
    }

    pub fn resolve_distance(&self, pickup: &str, dropoff: &str, ride_type: RideType) -> u32 {
        self.table.resolve_distance(pickup, dropoff, ride_type)
    }

    pub fn compute_fare(&self, distance_km: u32, vehicle: VehicleType, ride_type: RideType) -> f64 {
        compute_fare(distance_km, vehicle, ride_type, &self.formula)
    }

    pub fn list_locations(&self, ride_type: RideType) -> LocationOptions {
        self.table.list_locations(ride_type)
    }

    pub fn validate_ride(
        &self,
        pickup: &str,
        dropoff: &str,
        passengers: u32,
        vehicle: VehicleType,
        ride_type: RideType,
    ) -> Result<(), RideRejection> {
        validate_ride(&self.table, pickup, dropoff, passengers, vehicle, ride_type)
    }

    pub fn quote(&self, request: &RideRequest) -> Result<FareQuote, RideRejection> {
        quote(&self.table, &self.formula, request)
    }
}

/// Price a ride against a table and a formula snapshot
pub fn quote(table: &DistanceTable, formula: &FareFormula, request: &RideRequest) -> Result<FareQuote, RideRejection> {
    validate_ride(
        table,
        &request.pickup,
        &request.dropoff,
        request.passengers,
        request.vehicle_type,
        request.ride_type,
    )?;

    let distance_km = table.resolve_distance(&request.pickup, &request.dropoff, request.ride_type);
    let fare = compute_fare(distance_km, request.vehicle_type, request.ride_type, formula);

    debug!(
        pickup = %request.pickup,
        dropoff = %request.dropoff,
        distance_km,
        fare,
        "Quoted {} ride in {}",
        request.ride_type,
        request.vehicle_type
    );

    Ok(FareQuote {
        request: request.clone(),
        distance_km,
        fare,
    })
}

impl Default for FareEngine {
    fn default() -> Self {
        FareEngine::new(DistanceTable::frankfurt(), FareFormula::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pickup: &str, dropoff: &str, ride_type: RideType, vehicle: VehicleType, passengers: u32) -> RideRequest {
        RideRequest {
            pickup: pickup.to_string(),
            dropoff: dropoff.to_string(),
            ride_type,
            vehicle_type: vehicle,
            passengers,
        }
    }

    #[test]
    fn test_city_quote_end_to_end() {
        let engine = FareEngine::default();
        let quote = engine
            .quote(&request(
                "Frankfurt Main Station",
                "Frankfurt Airport",
                RideType::City,
                VehicleType::Suv,
                3,
            ))
            .unwrap();

        assert_eq!(quote.distance_km, 12);
        assert!((quote.fare - 34.58).abs() < 1e-9);
    }

    #[test]
    fn test_intercity_quote_end_to_end() {
        let engine = FareEngine::default();
        let quote = engine
            .quote(&request("Frankfurt", "Munich", RideType::Intercity, VehicleType::Luxury, 1))
            .unwrap();

        assert_eq!(quote.distance_km, 390);
        assert!((quote.fare - 724.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_rejects_invalid_ride() {
        let engine = FareEngine::default();
        let err = engine
            .quote(&request("Frankfurt", "Frankfurt", RideType::Intercity, VehicleType::Sedan, 1))
            .unwrap_err();
        assert_eq!(err, RideRejection::UnsupportedDestination);
    }

    #[test]
    fn test_formula_change_reprices() {
        let mut engine = FareEngine::default();
        let before = engine.compute_fare(10, VehicleType::Sedan, RideType::City);

        let mut formula = *engine.formula();
        formula.city_ride.base_rate = 15.0;
        engine.set_formula(formula);

        let after = engine.compute_fare(10, VehicleType::Sedan, RideType::City);
        assert!((after - before - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_quote_uses_given_formula_snapshot() {
        let table = DistanceTable::frankfurt();
        let mut formula = FareFormula::default();
        formula.intercity_ride.luxury = 1.5;

        let priced = quote(
            &table,
            &formula,
            &request("Frankfurt", "Munich", RideType::Intercity, VehicleType::Luxury, 1),
        )
        .unwrap();
        assert!((priced.fare - 543.0).abs() < 1e-9);
    }

    #[test]
    fn test_request_json_shape() {
        let json = r#"{
            "pickup": "Frankfurt",
            "dropoff": "Berlin",
            "rideType": "intercity",
            "vehicleType": "suv",
            "passengers": 4
        }"#;
        let parsed: RideRequest = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.vehicle_type, VehicleType::Suv);
        assert_eq!(parsed.ride_type, RideType::Intercity);
    }
}
