// ✉️ Booking Notifications - customer confirmation + admin notice
// Delivery goes through the `Mailer` trait; `MockMailer` only logs

use crate::booking::Booking;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{info, warn};

pub const ADMIN_EMAIL: &str = "admin@ridesmarter.de";
pub const NOREPLY_EMAIL: &str = "noreply@ridesmarter.de";

/// Company details printed in the email templates
#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: &'static str,
    pub address: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub website: &'static str,
    pub logo: &'static str,
}

pub const COMPANY: CompanyInfo = CompanyInfo {
    name: "RideSmarter",
    address: "Mainzer Landstraße 123, 60329 Frankfurt am Main, Germany",
    phone: "+49 69 123456789",
    email: "info@ridesmarter.de",
    website: "www.ridesmarter.de",
    logo: "https://ridesmarter.de/logo.png",
};

// ============================================================================
// MESSAGES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Recipient {
            email: email.into(),
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: Recipient,
    pub from: Recipient,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
}

/// Result of notifying both parties about a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub customer_notified: bool,
    pub admin_notified: bool,
}

// ============================================================================
// MAILERS
// ============================================================================

pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotifyError>;
}

/// Logs outgoing mail instead of delivering it
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: AtomicUsize,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages "sent" so far
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Mailer for MockMailer {
    fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotifyError> {
        let preview: String = message.html.chars().take(100).collect();
        info!(
            to = %message.to.email,
            from = %message.from.email,
            subject = %message.subject,
            "Sending email: {}...",
            preview.trim()
        );

        self.sent.fetch_add(1, Ordering::Relaxed);

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Ok(DeliveryReceipt {
            message_id: format!("mock-{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..9]),
        })
    }
}

// ============================================================================
// TEMPLATES
// ============================================================================

/// Escape customer-supplied text before it lands in markup
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn booking_details_block(booking: &Booking) -> String {
    let special = match &booking.special_requests {
        Some(requests) => format!("<p><strong>Special Requests:</strong> {}</p>", escape_html(requests)),
        None => String::new(),
    };

    format!(
        r#"<div class="booking-details">
        <p><strong>Booking ID:</strong> <span class="booking-id">{id}</span></p>
        <p><strong>Pickup:</strong> {pickup}</p>
        <p><strong>Dropoff:</strong> {dropoff}</p>
        <p><strong>Date &amp; Time:</strong> {date} at {time}</p>
        <p><strong>Passengers:</strong> {passengers}</p>
        <p><strong>Vehicle Type:</strong> {vehicle}</p>
        <p><strong>Fare:</strong> €{fare:.2}</p>
        {special}
      </div>"#,
        id = escape_html(&booking.id),
        pickup = escape_html(&booking.pickup),
        dropoff = escape_html(&booking.dropoff),
        date = escape_html(&booking.date),
        time = escape_html(&booking.time),
        passengers = booking.passengers,
        vehicle = booking.vehicle_type,
        fare = booking.fare,
        special = special,
    )
}

pub fn customer_confirmation_html(booking: &Booking) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Booking Confirmation</title>
  </head>
  <body>
    <div class="header">
      <img src="{logo}" alt="{company} Logo" class="logo">
      <h1>Your Ride is Confirmed!</h1>
    </div>
    <p>Dear {first_name},</p>
    <p>Thank you for booking with {company}. Your ride has been confirmed with the following details:</p>
    {details}
    <p>You will receive driver details shortly before your scheduled pickup. The driver will contact you at {phone}.</p>
    <p>Need to make changes to your booking? Please contact our customer service at {company_phone} or reply to this email.</p>
    <p>Best regards,<br>The {company} Team</p>
    <div class="footer">
      <p>{company}<br>{address}<br>{company_phone}<br>{company_email}<br>
      <a href="https://{website}">{website}</a></p>
    </div>
  </body>
</html>"#,
        logo = COMPANY.logo,
        company = COMPANY.name,
        first_name = escape_html(&booking.first_name),
        details = booking_details_block(booking),
        phone = escape_html(&booking.phone),
        company_phone = COMPANY.phone,
        address = COMPANY.address,
        company_email = COMPANY.email,
        website = COMPANY.website,
    )
}

pub fn admin_notification_html(booking: &Booking) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>New Booking Notification</title>
  </head>
  <body>
    <div class="header">
      <h1>New Booking Received</h1>
    </div>
    <p>A new booking has been made through the {company} platform. Details are as follows:</p>
    {details}
    <div class="customer-info">
      <h2>Customer Information</h2>
      <p><strong>Name:</strong> {name}</p>
      <p><strong>Email:</strong> {email}</p>
      <p><strong>Phone:</strong> {phone}</p>
    </div>
    <p><a href="https://{website}/admin" class="button">View in Admin Dashboard</a></p>
    <div class="footer">
      <p>This is an automated notification from the {company} booking system.</p>
    </div>
  </body>
</html>"#,
        company = COMPANY.name,
        details = booking_details_block(booking),
        name = escape_html(&booking.passenger_name()),
        email = escape_html(&booking.email),
        phone = escape_html(&booking.phone),
        website = COMPANY.website,
    )
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Email the customer and the admin. A failed delivery is logged and reported
/// in the outcome; it never blocks the booking.
pub fn send_booking_confirmations(mailer: &dyn Mailer, booking: &Booking, admin_email: &str) -> NotificationOutcome {
    let from = Recipient::new(NOREPLY_EMAIL, COMPANY.name);

    let customer = EmailMessage {
        to: Recipient::new(booking.email.clone(), booking.passenger_name()),
        from: from.clone(),
        subject: format!("Booking Confirmation - {} - {}", COMPANY.name, booking.id),
        html: customer_confirmation_html(booking),
    };

    let admin = EmailMessage {
        to: Recipient::new(admin_email, format!("{} Admin", COMPANY.name)),
        from,
        subject: format!("New Booking: {} - {}", booking.id, booking.passenger_name()),
        html: admin_notification_html(booking),
    };

    NotificationOutcome {
        customer_notified: deliver(mailer, &customer),
        admin_notified: deliver(mailer, &admin),
    }
}

fn deliver(mailer: &dyn Mailer, message: &EmailMessage) -> bool {
    match mailer.send(message) {
        Ok(receipt) => {
            info!(message_id = %receipt.message_id, to = %message.to.email, "Email delivered");
            true
        }
        Err(e) => {
            warn!("Error sending email: {}", e);
            false
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::demo_bookings;
    use std::sync::Mutex;

    /// Fails every message addressed to `reject`
    struct FlakyMailer {
        reject: String,
        seen: Mutex<Vec<String>>,
    }

    impl Mailer for FlakyMailer {
        fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, NotifyError> {
            self.seen.lock().unwrap().push(message.subject.clone());
            if message.to.email == self.reject {
                return Err(NotifyError::Delivery {
                    recipient: message.to.email.clone(),
                    reason: "mailbox unavailable".to_string(),
                });
            }
            Ok(DeliveryReceipt {
                message_id: "ok".to_string(),
            })
        }
    }

    #[test]
    fn test_mock_mailer_notifies_both() {
        let mailer = MockMailer::new();
        let booking = &demo_bookings()[0];

        let outcome = send_booking_confirmations(&mailer, booking, ADMIN_EMAIL);
        assert_eq!(
            outcome,
            NotificationOutcome {
                customer_notified: true,
                admin_notified: true
            }
        );
        assert_eq!(mailer.sent_count(), 2);
    }

    #[test]
    fn test_mock_message_id_format() {
        let mailer = MockMailer::new();
        let message = EmailMessage {
            to: Recipient::new("a@b.de", "A"),
            from: Recipient::new(NOREPLY_EMAIL, "RideSmarter"),
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
        };
        let receipt = mailer.send(&message).unwrap();
        let parts: Vec<&str> = receipt.message_id.split('-').collect();
        assert_eq!(parts[0], "mock");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn test_customer_failure_does_not_stop_admin() {
        let booking = &demo_bookings()[0];
        let mailer = FlakyMailer {
            reject: booking.email.clone(),
            seen: Mutex::new(Vec::new()),
        };

        let outcome = send_booking_confirmations(&mailer, booking, ADMIN_EMAIL);
        assert!(!outcome.customer_notified);
        assert!(outcome.admin_notified);

        let seen = mailer.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], "Booking Confirmation - RideSmarter - RB-1234");
        assert_eq!(seen[1], "New Booking: RB-1234 - John Doe");
    }

    #[test]
    fn test_customer_template() {
        let mut booking = demo_bookings()[0].clone();
        let html = customer_confirmation_html(&booking);
        assert!(html.contains("Dear John,"));
        assert!(html.contains("€35.50"));
        assert!(html.contains("RB-1234"));
        assert!(!html.contains("Special Requests"));

        booking.special_requests = Some("Extra luggage".to_string());
        let html = customer_confirmation_html(&booking);
        assert!(html.contains("<strong>Special Requests:</strong> Extra luggage"));
    }

    #[test]
    fn test_admin_template() {
        let booking = &demo_bookings()[1];
        let html = admin_notification_html(booking);
        assert!(html.contains("Jane Smith"));
        assert!(html.contains("jane.smith@example.com"));
        assert!(html.contains("€320.00"));
        assert!(html.contains("SUV"));
    }

    #[test]
    fn test_customer_text_is_escaped() {
        let mut booking = demo_bookings()[0].clone();
        booking.first_name = "<b>Eve</b>".to_string();
        booking.pickup = "Main & \"Station\"".to_string();
        booking.special_requests = Some("<script>alert('x')</script>".to_string());

        let admin = admin_notification_html(&booking);
        assert!(!admin.contains("<script>"));
        assert!(admin.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(admin.contains("&lt;b&gt;Eve&lt;/b&gt; Doe"));
        assert!(admin.contains("Main &amp; &quot;Station&quot;"));

        let customer = customer_confirmation_html(&booking);
        assert!(customer.contains("Dear &lt;b&gt;Eve&lt;/b&gt;,"));
    }
}
