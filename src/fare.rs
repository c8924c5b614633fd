// 💶 Fare Formulas - Pricing as Data
// Linear fare formulas (base + per-km) scaled by a vehicle multiplier

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Lowest multiplier the admin form accepts
pub const MIN_MULTIPLIER: f64 = 0.1;

// ============================================================================
// RIDE & VEHICLE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideType {
    /// Trip wholly within the Frankfurt district table
    City,
    /// Trip from Frankfurt to another listed German city
    Intercity,
}

impl RideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideType::City => "city",
            RideType::Intercity => "intercity",
        }
    }
}

impl fmt::Display for RideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "city" => Ok(RideType::City),
            "intercity" => Ok(RideType::Intercity),
            _ => Err(ParseTypeError::RideType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Sedan,
    Suv,
    Luxury,
}

impl VehicleType {
    pub const ALL: [VehicleType; 3] = [VehicleType::Sedan, VehicleType::Suv, VehicleType::Luxury];

    /// Maximum number of passengers the vehicle seats
    pub fn capacity(&self) -> u32 {
        match self {
            VehicleType::Sedan => 4,
            VehicleType::Suv => 6,
            VehicleType::Luxury => 4,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VehicleType::Sedan => "Sedan",
            VehicleType::Suv => "SUV",
            VehicleType::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for VehicleType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedan" => Ok(VehicleType::Sedan),
            "suv" => Ok(VehicleType::Suv),
            "luxury" => Ok(VehicleType::Luxury),
            _ => Err(ParseTypeError::VehicleType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseTypeError {
    #[error("unknown ride type '{0}' (expected city or intercity)")]
    RideType(String),
    #[error("unknown vehicle type '{0}' (expected sedan, suv or luxury)")]
    VehicleType(String),
}

// ============================================================================
// RATE CARD
// ============================================================================

/// Pricing for one ride type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    /// Flat charge per ride
    pub base_rate: f64,
    /// Charge per kilometer
    pub per_km: f64,
    pub sedan: f64,
    pub suv: f64,
    pub luxury: f64,
}

impl RateCard {
    pub fn multiplier(&self, vehicle: VehicleType) -> f64 {
        match vehicle {
            VehicleType::Sedan => self.sedan,
            VehicleType::Suv => self.suv,
            VehicleType::Luxury => self.luxury,
        }
    }

    fn check(&self, ride_type: RideType, errors: &mut Vec<FormulaError>) {
        let rates = [("baseRate", self.base_rate), ("perKm", self.per_km)];
        for (field, value) in rates {
            if !(value >= 0.0) {
                errors.push(FormulaError::NegativeRate { ride_type, field, value });
            }
        }

        for vehicle in VehicleType::ALL {
            let value = self.multiplier(vehicle);
            if !(value >= MIN_MULTIPLIER) {
                errors.push(FormulaError::MultiplierTooSmall { ride_type, vehicle, value });
            }
        }
    }
}

// ============================================================================
// FARE FORMULA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("{ride_type} {field} must be a positive number, got {value}")]
    NegativeRate {
        ride_type: RideType,
        field: &'static str,
        value: f64,
    },
    #[error("{ride_type} {vehicle} multiplier must be at least 0.1, got {value}")]
    MultiplierTooSmall {
        ride_type: RideType,
        vehicle: VehicleType,
        value: f64,
    },
}

/// Fare formulas for both ride types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareFormula {
    pub city_ride: RateCard,
    pub intercity_ride: RateCard,
}

impl Default for FareFormula {
    fn default() -> Self {
        FareFormula {
            city_ride: RateCard {
                base_rate: 5.0,
                per_km: 1.8,
                sedan: 1.0,
                suv: 1.3,
                luxury: 1.8,
            },
            intercity_ride: RateCard {
                base_rate: 50.0,
                per_km: 0.8,
                sedan: 1.0,
                suv: 1.4,
                luxury: 2.0,
            },
        }
    }
}

impl FareFormula {
    /// Load and validate a formula from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read fare formula file: {:?}", path.as_ref()))?;

        let formula: FareFormula =
            serde_json::from_str(&content).context("Failed to parse fare formula JSON")?;

        if let Err(errors) = formula.validate() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::bail!("Invalid fare formula: {}", joined.join("; "));
        }

        Ok(formula)
    }

    pub fn rate_card(&self, ride_type: RideType) -> &RateCard {
        match ride_type {
            RideType::City => &self.city_ride,
            RideType::Intercity => &self.intercity_ride,
        }
    }

    /// Check every rate and multiplier, collecting all violations
    pub fn validate(&self) -> std::result::Result<(), Vec<FormulaError>> {
        let mut errors = Vec::new();
        self.city_ride.check(RideType::City, &mut errors);
        self.intercity_ride.check(RideType::Intercity, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Price a ride: `(base + km * per_km) * multiplier`, rounded to cents
pub fn compute_fare(
    distance_km: u32,
    vehicle: VehicleType,
    ride_type: RideType,
    formula: &FareFormula,
) -> f64 {
    let card = formula.rate_card(ride_type);
    let base = card.base_rate + f64::from(distance_km) * card.per_km;
    round_cents(base * card.multiplier(vehicle))
}

/// Round half up on the cents value
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0 + 0.5).floor() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
