// RideSmarter - Core Library
// Exposes the fare engine, booking flow and admin stores for the CLI, API server and tests

pub mod fare;        // Fare formulas, ride and vehicle types
pub mod locations;   // Static distance table
pub mod validation;  // Ride feasibility rules
pub mod engine;      // validate → distance → fare
pub mod booking;     // Booking wizard and records
pub mod notify;      // Mock email notifications
pub mod admin;       // Fare settings + booking ledger
pub mod config;      // App configuration and tracing setup

// Re-export commonly used types
pub use fare::{
    FareFormula, RateCard, RideType, VehicleType, FormulaError, ParseTypeError,
    compute_fare, round_cents,
};
pub use locations::{
    DistanceTable, LocationOptions, PairKey, TableError,
    INTERCITY_ORIGIN, DEFAULT_CITY_KM, DEFAULT_INTERCITY_KM,
};
pub use validation::{validate_ride, RideRejection, RideValidation};
pub use engine::{quote, FareEngine, FareQuote, RideRequest};
pub use booking::{
    Booking, BookingError, BookingStatus, BookingStep, BookingWizard,
    FieldError, PassengerDetails, PaymentDetails, demo_bookings, new_booking_id,
};
pub use notify::{
    Mailer, MockMailer, EmailMessage, Recipient, DeliveryReceipt,
    NotificationOutcome, NotifyError, send_booking_confirmations,
};
pub use admin::{BookingLedger, FareSettings, FormulaRevision, LedgerSummary, VehicleStat};
pub use config::{AppConfig, init_tracing};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
