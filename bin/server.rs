// RideSmarter - Web Server
// REST API for fare estimates, bookings and fare settings

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use ridesmarter::{
    init_tracing, send_booking_confirmations, AppConfig, Booking, BookingError, BookingLedger,
    BookingStatus, BookingWizard, DistanceTable, FareFormula, FareQuote, FareSettings, LedgerSummary,
    LocationOptions, Mailer, MockMailer, NotificationOutcome, PassengerDetails, PaymentDetails,
    RideRequest, RideType, RideValidation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Shared application state. `settings` is the only home of the active formula.
#[derive(Clone)]
struct AppState {
    table: Arc<DistanceTable>,
    settings: FareSettings,
    ledger: BookingLedger,
    mailer: Arc<dyn Mailer>,
    config: Arc<AppConfig>,
}

impl AppState {
    fn new(config: AppConfig, formula: FareFormula, mailer: Arc<dyn Mailer>) -> Self {
        let ledger = if config.demo_bookings {
            BookingLedger::with_demo_bookings()
        } else {
            BookingLedger::new()
        };

        Self {
            table: Arc::new(DistanceTable::frankfurt()),
            settings: FareSettings::new(formula),
            ledger,
            mailer,
            config: Arc::new(config),
        }
    }

    fn quote(&self, request: &RideRequest) -> Result<FareQuote, ridesmarter::RideRejection> {
        ridesmarter::quote(&self.table, &self.settings.formula(), request)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

/// Fare estimate response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateResponse {
    validation: RideValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote: Option<FareQuote>,
}

/// Everything the booking wizard collects, in one request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    ride: RideRequest,
    passenger: PassengerDetails,
    payment: PaymentDetails,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingResponse {
    booking: Booking,
    notifications: NotificationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

/// GET /api/locations/:ride_type - Pickup and dropoff options
async fn get_locations(State(state): State<AppState>, Path(ride_type): Path<String>) -> Response {
    let ride_type = match ride_type.parse::<RideType>() {
        Ok(ride_type) => ride_type,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let options: LocationOptions = state.table.list_locations(ride_type);
    ApiResponse::ok(options)
}

/// POST /api/fare/estimate - Validate and price a ride
async fn estimate_fare(State(state): State<AppState>, Json(request): Json<RideRequest>) -> Response {
    let result = state.quote(&request);
    let validation = RideValidation::from(&result.as_ref().map(|_| ()).map_err(Clone::clone));

    match result {
        Ok(quote) => ApiResponse::ok(EstimateResponse {
            validation,
            quote: Some(quote),
        }),
        Err(rejection) => {
            info!(pickup = %request.pickup, dropoff = %request.dropoff, "Ride rejected: {}", rejection);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse {
                    success: false,
                    data: Some(EstimateResponse { validation, quote: None }),
                    error: Some(rejection.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// POST /api/bookings - Run the booking flow end to end
async fn create_booking(State(state): State<AppState>, Json(request): Json<BookingRequest>) -> Response {
    let quote = match state.quote(&request.ride) {
        Ok(quote) => quote,
        Err(rejection) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, rejection.to_string()),
    };

    let mut wizard = BookingWizard::new();
    let prepared = wizard
        .accept_quote(quote)
        .and_then(|_| wizard.submit_details(request.passenger))
        .and_then(|_| request.payment.validate().map_err(BookingError::InvalidPayment));
    if let Err(e) = prepared {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string());
    }

    // Simulated payment processing
    tokio::time::sleep(state.config.payment_delay()).await;

    let booking = match wizard.submit_payment(&request.payment, Local::now().naive_local()) {
        Ok(booking) => booking.clone(),
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };
    state.ledger.add(booking.clone());

    // The booking stands even if nobody could be notified
    let notifications = send_booking_confirmations(state.mailer.as_ref(), &booking, &state.config.admin_email);
    let warning = if notifications.customer_notified {
        None
    } else {
        warn!(id = %booking.id, "Customer confirmation email was not delivered");
        Some("We couldn't send the confirmation email. Please contact support.".to_string())
    };

    ApiResponse::ok(BookingResponse {
        booking,
        notifications,
        warning,
    })
}

/// GET /api/bookings - All bookings
async fn list_bookings(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.ledger.all())
}

/// GET /api/bookings/summary - Dashboard totals
async fn bookings_summary(State(state): State<AppState>) -> Response {
    let summary: LedgerSummary = state.ledger.summary();
    ApiResponse::ok(summary)
}

/// GET /api/bookings/export - Bookings as CSV
async fn export_bookings(State(state): State<AppState>) -> Response {
    match state.ledger.to_csv_string() {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"bookings.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("Error exporting bookings: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to export bookings")
        }
    }
}

/// GET /api/bookings/:id - One booking
async fn get_booking(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // `Path` has already percent-decoded the id
    match state.ledger.find(&id) {
        Some(booking) => ApiResponse::ok(booking),
        None => error_response(StatusCode::NOT_FOUND, format!("Booking not found: {}", id)),
    }
}

/// GET /api/admin/fare-formula - Active formula revision
async fn get_fare_formula(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.settings.current())
}

/// GET /api/admin/fare-formula/history - Every revision since startup
async fn fare_formula_history(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.settings.history())
}

/// PUT /api/admin/fare-formula - Replace the active formula
async fn update_fare_formula(State(state): State<AppState>, Json(formula): Json<FareFormula>) -> Response {
    match state.settings.update(formula) {
        Ok(revision) => ApiResponse::ok(revision),
        Err(errors) => {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            error_response(StatusCode::UNPROCESSABLE_ENTITY, messages.join("; "))
        }
    }
}

/// POST /api/admin/fare-formula/reset - Back to the built-in formula
async fn reset_fare_formula(State(state): State<AppState>) -> Response {
    ApiResponse::ok(state.settings.reset())
}

/// GET /api/test-email - Send the confirmation emails for a throwaway booking
async fn test_email(State(state): State<AppState>) -> Response {
    let now = Local::now();
    let booking = Booking {
        id: format!("TEST-{:04}", uuid::Uuid::new_v4().as_u128() % 10_000),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        email: "test@example.com".to_string(),
        phone: "+49 123 456 7890".to_string(),
        pickup: "Frankfurt Main Station".to_string(),
        dropoff: "Frankfurt Airport".to_string(),
        date: now.format("%d/%m/%Y").to_string(),
        time: now.format("%H:%M").to_string(),
        passengers: 2,
        vehicle_type: ridesmarter::VehicleType::Sedan,
        fare: 35.50,
        special_requests: Some("This is a test booking to verify email functionality".to_string()),
        status: BookingStatus::Confirmed,
    };

    let notifications = send_booking_confirmations(state.mailer.as_ref(), &booking, &state.config.admin_email);
    ApiResponse::ok(BookingResponse {
        booking,
        notifications,
        warning: None,
    })
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/locations/:ride_type", get(get_locations))
        .route("/fare/estimate", post(estimate_fare))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/summary", get(bookings_summary))
        .route("/bookings/export", get(export_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/admin/fare-formula", get(get_fare_formula).put(update_fare_formula))
        .route("/admin/fare-formula/history", get(fare_formula_history))
        .route("/admin/fare-formula/reset", post(reset_fare_formula))
        .route("/test-email", get(test_email))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    println!("🌐 RideSmarter - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::load()?;
    let formula = config.fare_formula()?;
    let addr = config.bind_address.clone();

    let state = AppState::new(config, formula, Arc::new(MockMailer::new()));
    info!(bookings = state.ledger.len(), "Booking ledger ready");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/fare/estimate", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
