// 🧾 Booking Flow - fare estimate → passenger details → payment → confirmation
// One wizard per customer session; nothing survives the session

use crate::engine::FareQuote;
use crate::fare::VehicleType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::info;

// ============================================================================
// STEPS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStep {
    FareEstimate,
    PassengerDetails,
    Payment,
    Confirmation,
}

impl BookingStep {
    pub fn title(&self) -> &'static str {
        match self {
            BookingStep::FareEstimate => "Fare Estimate",
            BookingStep::PassengerDetails => "Passenger Details",
            BookingStep::Payment => "Payment",
            BookingStep::Confirmation => "Confirmation",
        }
    }

    /// Step reached by going back once. Confirmation is final.
    pub fn previous(&self) -> Option<BookingStep> {
        match self {
            BookingStep::FareEstimate => None,
            BookingStep::PassengerDetails => Some(BookingStep::FareEstimate),
            BookingStep::Payment => Some(BookingStep::PassengerDetails),
            BookingStep::Confirmation => None,
        }
    }
}

impl fmt::Display for BookingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ============================================================================
// FORM INPUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    #[error("cannot do that during {actual}; expected {expected}")]
    WrongStep {
        expected: BookingStep,
        actual: BookingStep,
    },
    #[error("invalid passenger details: {}", join_fields(.0))]
    InvalidDetails(Vec<FieldError>),
    #[error("invalid payment details: {}", join_fields(.0))]
    InvalidPayment(Vec<FieldError>),
    #[error("cannot go back from {0}")]
    CannotGoBack(BookingStep),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub special_requests: Option<String>,
}

impl PassengerDetails {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.first_name.trim().chars().count() < 2 {
            errors.push(FieldError {
                field: "firstName",
                message: "First name must be at least 2 characters.",
            });
        }
        if self.last_name.trim().chars().count() < 2 {
            errors.push(FieldError {
                field: "lastName",
                message: "Last name must be at least 2 characters.",
            });
        }
        if !is_valid_email(&self.email) {
            errors.push(FieldError {
                field: "email",
                message: "Please enter a valid email address.",
            });
        }
        if self.phone.trim().chars().count() < 10 {
            errors.push(FieldError {
                field: "phone",
                message: "Please enter a valid phone number.",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
        }
        None => false,
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub card_number: String,
    pub card_name: String,
    pub expiry_date: String,
    pub cvv: String,
}

// Card data never reaches the logs in full
impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &self.masked_card_number())
            .field("card_name", &self.card_name)
            .field("expiry_date", &self.expiry_date)
            .finish_non_exhaustive()
    }
}

impl PaymentDetails {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.card_number.trim().chars().count() < 16 {
            errors.push(FieldError {
                field: "cardNumber",
                message: "Please enter a valid card number.",
            });
        }
        if self.card_name.trim().chars().count() < 2 {
            errors.push(FieldError {
                field: "cardName",
                message: "Please enter the name on card.",
            });
        }
        if self.expiry_date.trim().chars().count() < 5 {
            errors.push(FieldError {
                field: "expiryDate",
                message: "Please enter a valid expiry date (MM/YY).",
            });
        }
        if self.cvv.trim().chars().count() < 3 {
            errors.push(FieldError {
                field: "cvv",
                message: "Please enter a valid CVV.",
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn masked_card_number(&self) -> String {
        let digits: Vec<char> = self.card_number.chars().filter(|c| !c.is_whitespace()).collect();
        let tail: String = digits.iter().skip(digits.len().saturating_sub(4)).collect();
        format!("**** {}", tail)
    }
}

// ============================================================================
// BOOKING RECORD
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub pickup: String,
    pub dropoff: String,
    /// dd/mm/yyyy
    pub date: String,
    /// HH:MM
    pub time: String,
    pub passengers: u32,
    pub vehicle_type: VehicleType,
    pub fare: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub status: BookingStatus,
}

impl Booking {
    pub fn passenger_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Random booking reference, `RB-` plus four digits
pub fn new_booking_id() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 10_000;
    format!("RB-{:04}", n)
}

/// Demo bookings shown on the admin dashboard
pub fn demo_bookings() -> Vec<Booking> {
    vec![
        Booking {
            id: "RB-1234".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "+49 123 456 7890".to_string(),
            pickup: "Frankfurt Main Station".to_string(),
            dropoff: "Frankfurt Airport".to_string(),
            date: "15/06/2023".to_string(),
            time: "14:30".to_string(),
            passengers: 2,
            vehicle_type: VehicleType::Sedan,
            fare: 35.50,
            special_requests: None,
            status: BookingStatus::Completed,
        },
        Booking {
            id: "RB-1235".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            phone: "+49 987 654 3210".to_string(),
            pickup: "Frankfurt Airport".to_string(),
            dropoff: "Berlin".to_string(),
            date: "16/06/2023".to_string(),
            time: "09:00".to_string(),
            passengers: 3,
            vehicle_type: VehicleType::Suv,
            fare: 320.00,
            special_requests: None,
            status: BookingStatus::Confirmed,
        },
        Booking {
            id: "RB-1236".to_string(),
            first_name: "Michael".to_string(),
            last_name: "Brown".to_string(),
            email: "michael.brown@example.com".to_string(),
            phone: "+49 555 123 4567".to_string(),
            pickup: "Frankfurt Westend".to_string(),
            dropoff: "Munich".to_string(),
            date: "17/06/2023".to_string(),
            time: "11:15".to_string(),
            passengers: 1,
            vehicle_type: VehicleType::Luxury,
            fare: 380.00,
            special_requests: None,
            status: BookingStatus::Pending,
        },
    ]
}

// ============================================================================
// WIZARD
// ============================================================================

/// Linear booking wizard for a single customer session
#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: BookingStep,
    quote: Option<FareQuote>,
    details: Option<PassengerDetails>,
    booking: Option<Booking>,
}

impl BookingWizard {
    pub fn new() -> Self {
        BookingWizard {
            step: BookingStep::FareEstimate,
            quote: None,
            details: None,
            booking: None,
        }
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn quote(&self) -> Option<&FareQuote> {
        self.quote.as_ref()
    }

    pub fn details(&self) -> Option<&PassengerDetails> {
        self.details.as_ref()
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    fn expect_step(&self, expected: BookingStep) -> Result<(), BookingError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(BookingError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Accept the estimated fare and move on to passenger details
    pub fn accept_quote(&mut self, quote: FareQuote) -> Result<(), BookingError> {
        self.expect_step(BookingStep::FareEstimate)?;
        self.quote = Some(quote);
        self.step = BookingStep::PassengerDetails;
        Ok(())
    }

    pub fn submit_details(&mut self, details: PassengerDetails) -> Result<(), BookingError> {
        self.expect_step(BookingStep::PassengerDetails)?;
        details.validate().map_err(BookingError::InvalidDetails)?;
        self.details = Some(details);
        self.step = BookingStep::Payment;
        Ok(())
    }

    /// Take (mock) payment and confirm the booking. The booking is stamped with `now`.
    pub fn submit_payment(&mut self, payment: &PaymentDetails, now: NaiveDateTime) -> Result<&Booking, BookingError> {
        self.expect_step(BookingStep::Payment)?;
        payment.validate().map_err(BookingError::InvalidPayment)?;

        let (quote, details) = match (&self.quote, &self.details) {
            (Some(q), Some(d)) => (q, d),
            _ => {
                return Err(BookingError::WrongStep {
                    expected: BookingStep::FareEstimate,
                    actual: self.step,
                })
            }
        };

        info!(card = %payment.masked_card_number(), fare = quote.fare, "Processing mock payment");

        let booking = Booking {
            id: new_booking_id(),
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            pickup: quote.request.pickup.clone(),
            dropoff: quote.request.dropoff.clone(),
            date: now.format("%d/%m/%Y").to_string(),
            time: now.format("%H:%M").to_string(),
            passengers: quote.request.passengers,
            vehicle_type: quote.request.vehicle_type,
            fare: quote.fare,
            special_requests: details
                .special_requests
                .clone()
                .filter(|s| !s.trim().is_empty()),
            status: BookingStatus::Confirmed,
        };

        info!(id = %booking.id, "Booking confirmed");
        self.step = BookingStep::Confirmation;
        Ok(&*self.booking.insert(booking))
    }

    /// Go back exactly one step; entered data is kept
    pub fn back(&mut self) -> Result<BookingStep, BookingError> {
        let previous = self.step.previous().ok_or(BookingError::CannotGoBack(self.step))?;
        self.step = previous;
        Ok(previous)
    }
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FareEngine, RideRequest};
    use crate::fare::RideType;
    use chrono::NaiveDate;

    fn quote() -> FareQuote {
        FareEngine::default()
            .quote(&RideRequest {
                pickup: "Frankfurt Main Station".to_string(),
                dropoff: "Frankfurt Airport".to_string(),
                ride_type: RideType::City,
                vehicle_type: VehicleType::Sedan,
                passengers: 2,
            })
            .unwrap()
    }

    fn details() -> PassengerDetails {
        PassengerDetails {
            first_name: "Anna".to_string(),
            last_name: "Schmidt".to_string(),
            email: "anna@example.de".to_string(),
            phone: "+49 69 1234567".to_string(),
            special_requests: Some("Child seat".to_string()),
        }
    }

    fn payment() -> PaymentDetails {
        PaymentDetails {
            card_number: "4242424242424242".to_string(),
            card_name: "Anna Schmidt".to_string(),
            expiry_date: "12/29".to_string(),
            cvv: "123".to_string(),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_full_flow() {
        let mut wizard = BookingWizard::new();
        assert_eq!(wizard.step(), BookingStep::FareEstimate);

        wizard.accept_quote(quote()).unwrap();
        assert_eq!(wizard.step(), BookingStep::PassengerDetails);

        wizard.submit_details(details()).unwrap();
        assert_eq!(wizard.step(), BookingStep::Payment);

        let booking = wizard.submit_payment(&payment(), now()).unwrap().clone();
        assert_eq!(wizard.step(), BookingStep::Confirmation);
        assert!(booking.id.starts_with("RB-"));
        assert_eq!(booking.id.len(), 7);
        assert_eq!(booking.date, "09/03/2024");
        assert_eq!(booking.time, "08:05");
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.special_requests.as_deref(), Some("Child seat"));
        assert_eq!(booking.passenger_name(), "Anna Schmidt");
    }

    #[test]
    fn test_back_one_step() {
        let mut wizard = BookingWizard::new();
        assert!(matches!(wizard.back(), Err(BookingError::CannotGoBack(BookingStep::FareEstimate))));

        wizard.accept_quote(quote()).unwrap();
        wizard.submit_details(details()).unwrap();
        assert_eq!(wizard.back().unwrap(), BookingStep::PassengerDetails);
        assert!(wizard.details().is_some());

        wizard.submit_details(details()).unwrap();
        wizard.submit_payment(&payment(), now()).unwrap();
        assert!(wizard.back().is_err());
    }

    #[test]
    fn test_steps_cannot_be_skipped() {
        let mut wizard = BookingWizard::new();
        let err = wizard.submit_details(details()).unwrap_err();
        assert_eq!(
            err,
            BookingError::WrongStep {
                expected: BookingStep::PassengerDetails,
                actual: BookingStep::FareEstimate
            }
        );
        assert!(wizard.submit_payment(&payment(), now()).is_err());
    }

    #[test]
    fn test_invalid_details_keep_step() {
        let mut wizard = BookingWizard::new();
        wizard.accept_quote(quote()).unwrap();

        let mut bad = details();
        bad.first_name = "A".to_string();
        bad.email = "not-an-email".to_string();

        match wizard.submit_details(bad) {
            Err(BookingError::InvalidDetails(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["firstName", "email"]);
            }
            other => panic!("expected invalid details, got {:?}", other),
        }
        assert_eq!(wizard.step(), BookingStep::PassengerDetails);
    }

    #[test]
    fn test_invalid_payment() {
        let mut bad = payment();
        bad.card_number = "4242".to_string();
        bad.cvv = "1".to_string();
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_blank_special_request_dropped() {
        let mut wizard = BookingWizard::new();
        wizard.accept_quote(quote()).unwrap();
        let mut d = details();
        d.special_requests = Some("   ".to_string());
        wizard.submit_details(d).unwrap();
        let booking = wizard.submit_payment(&payment(), now()).unwrap();
        assert_eq!(booking.special_requests, None);
    }

    #[test]
    fn test_email_check() {
        assert!(is_valid_email("a@b.de"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.de"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(!is_valid_email("a@@c.de"));
    }

    #[test]
    fn test_email_rejects_empty_domain_labels() {
        assert!(is_valid_email("lena@mail.example.de"));
        assert!(!is_valid_email("a@b..c"));
        assert!(!is_valid_email("a@.b.c"));
        assert!(!is_valid_email("a@b.c."));
    }

    #[test]
    fn test_card_number_masked_in_debug() {
        let debug = format!("{:?}", payment());
        assert!(!debug.contains("4242424242424242"));
        assert!(debug.contains("**** 4242"));
    }

    #[test]
    fn test_demo_bookings() {
        let bookings = demo_bookings();
        assert_eq!(bookings.len(), 3);
        assert_eq!(bookings[1].vehicle_type, VehicleType::Suv);
        assert_eq!(bookings[2].status, BookingStatus::Pending);
    }
}
