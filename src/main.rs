// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::env;

// Use library instead of local modules
use ridesmarter::{
    init_tracing, send_booking_confirmations, AppConfig, Booking, BookingStatus, FareEngine,
    MockMailer, RideRequest, RideType, VehicleType,
};

const USAGE: &str = "\
Usage:
  ridesmarter quote <city|intercity> <sedan|suv|luxury> <passengers> <pickup> <dropoff>
  ridesmarter locations <city|intercity>
  ridesmarter test-email
  ridesmarter admin";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    // Log lines would tear the TUI, so the dashboard runs without a subscriber
    if !matches!(command, Some("admin") | None) {
        init_tracing();
    }

    let config = AppConfig::load()?;

    match command {
        Some("quote") => run_quote(&config, &args[2..])?,
        Some("locations") => run_locations(&config, &args[2..])?,
        Some("test-email") => run_test_email(&config)?,
        Some("admin") | None => run_admin(&config)?,
        Some("help") | Some("--help") | Some("-h") => println!("{}", USAGE),
        Some(other) => bail!("Unknown command '{}'\n{}", other, USAGE),
    }

    Ok(())
}

fn engine(config: &AppConfig) -> Result<FareEngine> {
    let formula = config.fare_formula()?;
    let mut engine = FareEngine::default();
    engine.set_formula(formula);
    Ok(engine)
}

fn run_quote(config: &AppConfig, args: &[String]) -> Result<()> {
    if args.len() != 5 {
        bail!("quote takes 5 arguments\n{}", USAGE);
    }

    let request = RideRequest {
        ride_type: args[0].parse::<RideType>()?,
        vehicle_type: args[1].parse::<VehicleType>()?,
        passengers: args[2]
            .parse()
            .with_context(|| format!("Passenger count must be a number, got {:?}", args[2]))?,
        pickup: args[3].clone(),
        dropoff: args[4].clone(),
    };

    println!("🚕 Fare Estimate");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match engine(config)?.quote(&request) {
        Ok(quote) => {
            println!("  {} → {}", request.pickup, request.dropoff);
            println!("  {} ride, {} ({} passengers)", request.ride_type, request.vehicle_type, request.passengers);
            println!("  Distance: {} km", quote.distance_km);
            println!("\n✓ Estimated fare: €{:.2}", quote.fare);
        }
        Err(rejection) => {
            eprintln!("❌ {}", rejection);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn run_locations(config: &AppConfig, args: &[String]) -> Result<()> {
    let ride_type = match args.first() {
        Some(arg) => arg.parse::<RideType>()?,
        None => bail!("locations needs a ride type\n{}", USAGE),
    };

    let options = engine(config)?.list_locations(ride_type);

    println!("📍 Pickup ({}):", ride_type);
    for name in &options.pickup_options {
        println!("   {}", name);
    }
    println!("\n📍 Dropoff ({}):", ride_type);
    for name in &options.dropoff_options {
        println!("   {}", name);
    }

    Ok(())
}

fn run_test_email(config: &AppConfig) -> Result<()> {
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
        vehicle_type: VehicleType::Sedan,
        fare: 35.50,
        special_requests: Some("This is a test booking to verify email functionality".to_string()),
        status: BookingStatus::Confirmed,
    };

    let mailer = MockMailer::new();
    let outcome = send_booking_confirmations(&mailer, &booking, &config.admin_email);

    println!("✉️  Test emails for {}", booking.id);
    println!("   Customer notified: {}", outcome.customer_notified);
    println!("   Admin notified:    {}", outcome.admin_notified);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_admin(config: &AppConfig) -> Result<()> {
    use ridesmarter::{BookingLedger, FareSettings};

    println!("🖥️  Loading RideSmarter admin dashboard...\n");

    let settings = FareSettings::new(config.fare_formula()?);
    let ledger = if config.demo_bookings {
        BookingLedger::with_demo_bookings()
    } else {
        BookingLedger::new()
    };

    println!("✓ Loaded {} bookings", ledger.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(engine(config)?, settings, ledger);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_admin(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ Admin dashboard not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin ridesmarter-server --features server");
    std::process::exit(1);
}
