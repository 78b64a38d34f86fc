//! Booking requests.
//!
//! A booking is the customer's contact form plus a snapshot of their cart,
//! submitted once at checkout. [`BookingService`] takes it through rate
//! limiting, the honeypot check, validation and composition, then hands the
//! result to a [`Notifier`](crate::notifier::Notifier).

mod compose;
mod service;
mod validate;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::cart::{line_cost, CartItem};
use crate::catalog::CateringSize;

pub use compose::{compose, escape_html, render_html, render_text};
pub use service::{BookingError, BookingOutcome, BookingService};
pub use validate::{is_valid_email, validate};

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read a required form field as text.
///
/// Numbers and `true` are kept in their JSON spelling, while `null` and `false`
/// read as empty. Arrays and objects are rejected.
fn scalar_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null | Value::Bool(false)) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(true)) => Ok("true".to_string()),
        Some(Value::Array(_) | Value::Object(_)) => {
            Err(serde::de::Error::custom("expected a text field"))
        }
    }
}

/// Whether a JSON value counts as filled in: anything but `null`, `false`,
/// zero and the empty string.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Contact and party details from the checkout form.
///
/// Every field defaults to empty so that a missing field surfaces as a
/// validation failure rather than a parse failure. Required fields also accept
/// JSON numbers, so a phone sent as `5551234567` is read as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    /// Parent or contact name.
    #[serde(deserialize_with = "scalar_as_text")]
    pub parent_name: String,
    /// Contact email; replies go here.
    #[serde(deserialize_with = "scalar_as_text")]
    pub email: String,
    /// Contact phone.
    #[serde(deserialize_with = "scalar_as_text")]
    pub phone: String,
    /// Party date.
    #[serde(deserialize_with = "scalar_as_text")]
    pub date: String,
    /// Party start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Party location.
    #[serde(deserialize_with = "scalar_as_text")]
    pub address: String,
    /// Party theme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Allergies and dietary notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_notes: Option<String>,
    /// Anything else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One cart entry as submitted with a booking.
///
/// Only the fields the notification needs are read; anything else the client
/// sends along (ids, timestamps) is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingLine {
    /// Package display name.
    pub package_name: String,
    /// Catering size.
    pub catering_size: CateringSize,
    /// Guest count.
    pub guest_count: u32,
    /// Booked hours.
    pub hours: u32,
    /// Hourly rate.
    pub hourly_rate: u32,
    /// Entertainment bought as an add-on.
    pub is_entertainment_add_on: bool,
}

impl BookingLine {
    /// Estimated cost of the line.
    #[must_use]
    pub fn cost(&self) -> u64 {
        line_cost(self.hourly_rate, self.hours, self.is_entertainment_add_on)
    }
}

impl From<&CartItem> for BookingLine {
    fn from(item: &CartItem) -> Self {
        Self {
            package_name: item.package_name.clone(),
            catering_size: item.catering_size,
            guest_count: item.guest_count,
            hours: item.hours,
            hourly_rate: item.hourly_rate,
            is_entertainment_add_on: item.is_entertainment_add_on,
        }
    }
}

/// The checkout payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    /// Contact and party details.
    #[serde(deserialize_with = "null_as_default")]
    pub customer: Customer,
    /// Cart snapshot at submission time.
    #[serde(deserialize_with = "null_as_default")]
    pub cart: Vec<BookingLine>,
    /// Total estimate as displayed to the customer, e.g. `$140`.
    #[serde(deserialize_with = "null_as_default")]
    pub total_estimate: String,
    /// Hidden form field. Humans leave it empty; bots fill it with anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honeypot: Option<Value>,
}

impl BookingRequest {
    /// Build a request from a customer and the items of a cart.
    #[must_use]
    pub fn new(customer: Customer, items: &[CartItem], total_estimate: impl Into<String>) -> Self {
        Self {
            customer,
            cart: items.iter().map(BookingLine::from).collect(),
            total_estimate: total_estimate.into(),
            honeypot: None,
        }
    }

    /// Check whether the honeypot field was filled in.
    #[must_use]
    pub fn is_honeypotted(&self) -> bool {
        self.honeypot.as_ref().is_some_and(is_filled)
    }
}
