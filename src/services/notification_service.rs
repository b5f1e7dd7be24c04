// src/services/notification_service.rs
use async_trait::async_trait;

use crate::{
    config::NotificationConfig,
    errors::{DispatchError, DispatchResult},
    models::{
        booking::{AssignmentNotifications, Booking, Invoice},
        driver::Driver,
        messages::{NotificationKind, OutboundMessage, Recipient},
    },
};

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

/// Formats WhatsApp messages and deep links. Nothing is sent from here.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    config: NotificationConfig,
}

impl Default for NotificationComposer {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl NotificationComposer {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Digits only, country code prefixed unless already present. Applying it
    /// to its own output returns the same number.
    pub fn normalize_phone(&self, raw: &str) -> DispatchResult<String> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            return Err(DispatchError::InvalidPhoneNumber(raw.to_string()));
        }

        let country_code = self.config.country_code.as_str();
        let normalized = if digits.len() > MIN_PHONE_DIGITS && digits.starts_with(country_code) {
            digits
        } else {
            format!("{}{}", country_code, digits)
        };

        if normalized.len() > MAX_PHONE_DIGITS {
            return Err(DispatchError::InvalidPhoneNumber(raw.to_string()));
        }
        Ok(normalized)
    }

    pub fn whatsapp_link(&self, normalized_phone: &str, text: &str) -> String {
        format!(
            "{}/{}?text={}",
            self.config.whatsapp_base_url.trim_end_matches('/'),
            normalized_phone,
            urlencoding::encode(text.trim())
        )
    }

    pub fn driver_message(&self, booking: &Booking) -> String {
        format!(
            "🚖 New Trip Assigned\n\n\
             Booking: {}\n\
             Pickup: {}\n\
             Drop: {}\n\
             Pickup Time: {}\n\
             Customer: {}",
            booking.booking_code,
            booking.pickup_location.address,
            booking.dropoff_location.address,
            booking.pickup_time.format("%d %b %Y %H:%M"),
            booking.customer_phone
        )
    }

    pub fn customer_message(&self, driver: &Driver) -> String {
        format!(
            "✅ Driver Assigned\n\n\
             Driver: {}\n\
             Phone: {}\n\
             Vehicle: {}",
            driver.name, driver.phone, driver.registration_number
        )
    }

    pub fn invoice_message(&self, invoice: &Invoice) -> String {
        let fare = &invoice.fare;
        let mut lines = vec![
            format!("🧾 {}", self.config.brand_name.to_uppercase()),
            String::new(),
            format!("Invoice No: {}", invoice.invoice_code),
            format!("Booking ID: {}", invoice.booking_code),
            format!("Distance: {} KM", format_amount(invoice.distance_km)),
            String::new(),
            format!("Base Fare: ₹{}", format_amount(fare.base_fare.unwrap_or(0.0))),
            format!("Distance Charge: ₹{}", format_amount(fare.distance_charge.unwrap_or(0.0))),
            format!("Waiting: ₹{}", format_amount(fare.waiting_charge.unwrap_or(0.0))),
            format!("Driver Batta: ₹{}", format_amount(fare.driver_batta.unwrap_or(0.0))),
        ];
        if let Some(day_halt) = fare.day_halt_charge.filter(|c| *c > 0.0) {
            lines.push(format!("Day Halt: ₹{}", format_amount(day_halt)));
        }
        if let Some(night_halt) = fare.night_halt_charge.filter(|c| *c > 0.0) {
            lines.push(format!("Night Halt: ₹{}", format_amount(night_halt)));
        }
        lines.push(String::new());
        lines.push(format!("Total Amount: ₹{}", format_amount(fare.total)));
        lines.push(String::new());
        lines.push("Thank you for choosing us!".to_string());

        lines.join("\n")
    }

    pub fn message(
        &self,
        kind: NotificationKind,
        recipient: Recipient,
        phone: &str,
        text: String,
    ) -> DispatchResult<OutboundMessage> {
        let phone = self.normalize_phone(phone)?;
        let link = self.whatsapp_link(&phone, &text);

        Ok(OutboundMessage {
            kind,
            recipient,
            phone,
            text,
            link,
        })
    }

    pub fn compose_assignment(
        &self,
        booking: &Booking,
        driver: &Driver,
    ) -> DispatchResult<AssignmentNotifications> {
        Ok(AssignmentNotifications {
            driver: self.message(
                NotificationKind::DriverAssigned,
                Recipient::Driver,
                &driver.phone,
                self.driver_message(booking),
            )?,
            customer: self.message(
                NotificationKind::DriverDetails,
                Recipient::Customer,
                &booking.customer_phone,
                self.customer_message(driver),
            )?,
        })
    }

    pub fn compose_invoice(&self, booking: &Booking, invoice: &Invoice) -> DispatchResult<OutboundMessage> {
        self.message(
            NotificationKind::TripCompleted,
            Recipient::Customer,
            &booking.customer_phone,
            self.invoice_message(invoice),
        )
    }
}

/// Whole rupees print without decimals.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

/// Delivery seam for composed messages.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, message: &OutboundMessage) -> DispatchResult<()>;
}

/// Logs the link an operator would open. Used until a delivery channel exists.
#[derive(Debug, Default)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, message: &OutboundMessage) -> DispatchResult<()> {
        tracing::info!(
            "[WHATSAPP] Would send {:?} to {:?} {}: {}",
            message.kind,
            message.recipient,
            message.phone,
            message.link
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fare::FareBreakdown;
    use chrono::{TimeZone, Utc};

    fn invoice() -> Invoice {
        Invoice {
            invoice_code: "INV-20261016-0001".to_string(),
            booking_code: "BK-20261016-0001".to_string(),
            distance_km: 100.0,
            fare: FareBreakdown {
                distance_charge: Some(1700.0),
                driver_batta: Some(500.0),
                day_halt_charge: Some(1200.0),
                night_halt_charge: Some(0.0),
                total: 3400.0,
                ..Default::default()
            },
            issued_at: Utc.with_ymd_and_hms(2026, 10, 16, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_phone_normalization() {
        let composer = NotificationComposer::default();
        assert_eq!(composer.normalize_phone("9876543210").unwrap(), "919876543210");
        assert_eq!(composer.normalize_phone("+91 98765 43210").unwrap(), "919876543210");
        assert_eq!(composer.normalize_phone("(987) 654-3210").unwrap(), "919876543210");
    }

    #[test]
    fn test_phone_normalization_is_idempotent() {
        let composer = NotificationComposer::default();
        for raw in ["9876543210", "+91 98765 43210", "9112345678", "44 20 7946 0958"] {
            let once = composer.normalize_phone(raw).unwrap();
            assert_eq!(composer.normalize_phone(&once).unwrap(), once, "{}", raw);
        }
    }

    #[test]
    fn test_ten_digit_number_starting_with_91_gets_prefixed() {
        let composer = NotificationComposer::default();
        assert_eq!(composer.normalize_phone("9112345678").unwrap(), "919112345678");
    }

    #[test]
    fn test_invalid_phone_numbers() {
        let composer = NotificationComposer::default();
        for raw in ["", "12345", "abc", "1234567890123456", "44207946095812"] {
            assert!(
                matches!(composer.normalize_phone(raw), Err(DispatchError::InvalidPhoneNumber(_))),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_whatsapp_link_encodes_trimmed_text() {
        let composer = NotificationComposer::default();
        let link = composer.whatsapp_link("919876543210", "\n Hello & bye \n");
        assert_eq!(link, "https://wa.me/919876543210?text=Hello%20%26%20bye");
    }

    #[test]
    fn test_custom_base_url() {
        let composer = NotificationComposer::new(NotificationConfig {
            whatsapp_base_url: "https://api.whatsapp.com/send/".to_string(),
            ..Default::default()
        });
        assert!(composer
            .whatsapp_link("919876543210", "hi")
            .starts_with("https://api.whatsapp.com/send/919876543210?text=hi"));
    }

    #[test]
    fn test_invoice_message_lists_charges() {
        let text = NotificationComposer::default().invoice_message(&invoice());
        assert!(text.starts_with("🧾 MOBILE TRACK TAXI"));
        assert!(text.contains("Invoice No: INV-20261016-0001"));
        assert!(text.contains("Base Fare: ₹0"));
        assert!(text.contains("Day Halt: ₹1200"));
        assert!(!text.contains("Night Halt"));
        assert!(text.contains("Total Amount: ₹3400"));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(522.0), "522");
        assert_eq!(format_amount(212.5), "212.50");
    }
}
