use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    DriverAssigned,  // To the driver: pickup, drop, customer contact
    DriverDetails,   // To the customer: who is coming
    TripCompleted,   // To the customer: invoice
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recipient {
    Driver,
    Customer,
}

/// A composed message plus the deep link that opens it in WhatsApp.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutboundMessage {
    pub kind: NotificationKind,
    pub recipient: Recipient,
    pub phone: String, // Normalized, country code included
    pub text: String,
    pub link: String,
}
