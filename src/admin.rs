// 🛠️ Admin - fare settings and booking ledger
// Both stores live in memory only; a restart brings back the defaults

use crate::booking::{demo_bookings, Booking, BookingStatus};
use crate::fare::{FareFormula, FormulaError, VehicleType};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// FARE SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaRevision {
    pub version: u32,
    pub formula: FareFormula,
    pub updated_at: DateTime<Utc>,
}

/// Admin-editable fare formula with its revision history (append-only)
#[derive(Debug, Clone)]
pub struct FareSettings {
    revisions: Arc<RwLock<Vec<FormulaRevision>>>,
}

impl FareSettings {
    pub fn new(initial: FareFormula) -> Self {
        FareSettings {
            revisions: Arc::new(RwLock::new(vec![FormulaRevision {
                version: 1,
                formula: initial,
                updated_at: Utc::now(),
            }])),
        }
    }

    pub fn current(&self) -> FormulaRevision {
        let revisions = read(&self.revisions);
        match revisions.last() {
            Some(revision) => revision.clone(),
            // `new` always seeds one revision and nothing removes them
            None => FormulaRevision {
                version: 0,
                formula: FareFormula::default(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn formula(&self) -> FareFormula {
        self.current().formula
    }

    /// Validate and store a new formula as the next revision
    pub fn update(&self, formula: FareFormula) -> std::result::Result<FormulaRevision, Vec<FormulaError>> {
        formula.validate()?;

        let mut revisions = write(&self.revisions);
        let version = revisions.last().map(|r| r.version).unwrap_or(0) + 1;
        let revision = FormulaRevision {
            version,
            formula,
            updated_at: Utc::now(),
        };
        revisions.push(revision.clone());

        info!(version, "Updated fare formulas: {:?}", formula);
        Ok(revision)
    }

    /// Restore the built-in formula as a new revision
    pub fn reset(&self) -> FormulaRevision {
        let mut revisions = write(&self.revisions);
        let version = revisions.last().map(|r| r.version).unwrap_or(0) + 1;
        let revision = FormulaRevision {
            version,
            formula: FareFormula::default(),
            updated_at: Utc::now(),
        };
        revisions.push(revision.clone());
        revision
    }

    pub fn history(&self) -> Vec<FormulaRevision> {
        read(&self.revisions).clone()
    }
}

impl Default for FareSettings {
    fn default() -> Self {
        Self::new(FareFormula::default())
    }
}

// ============================================================================
// BOOKING LEDGER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStat {
    pub vehicle_type: VehicleType,
    pub count: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub total_bookings: usize,
    pub total_revenue: f64,
    pub pending: usize,
    pub confirmed: usize,
    pub completed: usize,
    pub by_vehicle: Vec<VehicleStat>,
}

/// Flat CSV form of a booking; every row has the same columns
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
    pickup: &'a str,
    dropoff: &'a str,
    date: &'a str,
    time: &'a str,
    passengers: u32,
    vehicle_type: &'static str,
    fare: String,
    special_requests: &'a str,
    status: &'static str,
}

impl<'a> From<&'a Booking> for CsvRow<'a> {
    fn from(b: &'a Booking) -> Self {
        CsvRow {
            id: &b.id,
            first_name: &b.first_name,
            last_name: &b.last_name,
            email: &b.email,
            phone: &b.phone,
            pickup: &b.pickup,
            dropoff: &b.dropoff,
            date: &b.date,
            time: &b.time,
            passengers: b.passengers,
            vehicle_type: b.vehicle_type.display_name(),
            fare: format!("{:.2}", b.fare),
            special_requests: b.special_requests.as_deref().unwrap_or(""),
            status: b.status.as_str(),
        }
    }
}

/// Bookings visible on the admin dashboard
#[derive(Debug, Clone, Default)]
pub struct BookingLedger {
    bookings: Arc<RwLock<Vec<Booking>>>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-filled with the demo bookings
    pub fn with_demo_bookings() -> Self {
        let ledger = Self::new();
        for booking in demo_bookings() {
            ledger.add(booking);
        }
        ledger
    }

    pub fn add(&self, booking: Booking) {
        write(&self.bookings).push(booking);
    }

    pub fn all(&self) -> Vec<Booking> {
        read(&self.bookings).clone()
    }

    pub fn find(&self, id: &str) -> Option<Booking> {
        read(&self.bookings).iter().find(|b| b.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.bookings).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> LedgerSummary {
        let bookings = read(&self.bookings);

        let count_status = |status: BookingStatus| bookings.iter().filter(|b| b.status == status).count();

        let by_vehicle = VehicleType::ALL
            .iter()
            .map(|&vehicle_type| {
                let matching = bookings.iter().filter(|b| b.vehicle_type == vehicle_type);
                VehicleStat {
                    vehicle_type,
                    count: matching.clone().count(),
                    revenue: matching.map(|b| b.fare).sum(),
                }
            })
            .collect();

        LedgerSummary {
            total_bookings: bookings.len(),
            total_revenue: bookings.iter().map(|b| b.fare).sum(),
            pending: count_status(BookingStatus::Pending),
            confirmed: count_status(BookingStatus::Confirmed),
            completed: count_status(BookingStatus::Completed),
            by_vehicle,
        }
    }

    /// Write every booking as a CSV row (header included)
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for booking in read(&self.bookings).iter() {
            wtr.serialize(CsvRow::from(booking))
                .with_context(|| format!("Failed to write booking {} as CSV", booking.id))?;
        }
        wtr.flush().context("Failed to flush CSV export")?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.export_csv(&mut buffer)?;
        String::from_utf8(buffer).context("CSV export is not valid UTF-8")
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_start_at_version_one() {
        let settings = FareSettings::default();
        let current = settings.current();
        assert_eq!(current.version, 1);
        assert_eq!(current.formula, FareFormula::default());
    }

    #[test]
    fn test_update_appends_revision() {
        let settings = FareSettings::default();
        let mut formula = settings.formula();
        formula.city_ride.per_km = 2.1;

        let revision = settings.update(formula).unwrap();
        assert_eq!(revision.version, 2);
        assert_eq!(settings.formula().city_ride.per_km, 2.1);
        assert_eq!(settings.history().len(), 2);
    }

    #[test]
    fn test_invalid_update_is_rejected() {
        let settings = FareSettings::default();
        let mut formula = settings.formula();
        formula.city_ride.suv = 0.0;

        let errors = settings.update(formula).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(settings.current().version, 1);
    }

    #[test]
    fn test_reset_restores_default() {
        let settings = FareSettings::default();
        let mut formula = settings.formula();
        formula.intercity_ride.base_rate = 80.0;
        settings.update(formula).unwrap();

        let revision = settings.reset();
        assert_eq!(revision.version, 3);
        assert_eq!(settings.formula(), FareFormula::default());
    }

    #[test]
    fn test_clones_share_state() {
        let settings = FareSettings::default();
        let handle = settings.clone();
        let mut formula = settings.formula();
        formula.city_ride.base_rate = 6.0;
        handle.update(formula).unwrap();
        assert_eq!(settings.formula().city_ride.base_rate, 6.0);
    }

    #[test]
    fn test_ledger_summary() {
        let ledger = BookingLedger::with_demo_bookings();
        let summary = ledger.summary();

        assert_eq!(summary.total_bookings, 3);
        assert!((summary.total_revenue - 735.5).abs() < 1e-9);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.completed, 1);

        let suv = summary
            .by_vehicle
            .iter()
            .find(|v| v.vehicle_type == VehicleType::Suv)
            .unwrap();
        assert_eq!(suv.count, 1);
        assert!((suv.revenue - 320.0).abs() < 1e-9);
    }

    #[test]
    fn test_ledger_find() {
        let ledger = BookingLedger::with_demo_bookings();
        assert_eq!(ledger.find("RB-1235").unwrap().first_name, "Jane");
        assert!(ledger.find("RB-0000").is_none());
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = BookingLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.summary().total_revenue, 0.0);
        assert_eq!(ledger.to_csv_string().unwrap(), "");
    }

    #[test]
    fn test_csv_export() {
        let ledger = BookingLedger::with_demo_bookings();
        let csv = ledger.to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id,firstName,lastName,email"));
        assert!(lines[1].starts_with("RB-1234,John,Doe"));
        assert!(lines[2].contains(",SUV,320.00,,Confirmed"));
    }
}
