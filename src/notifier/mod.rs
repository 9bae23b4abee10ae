// src/notifier/mod.rs
mod alert;
mod smtp;

pub use alert::{AlertMessage, ALERT_SUBJECT};
pub use smtp::{build_message, DeliveryError, Notifier, SmtpNotifier};
