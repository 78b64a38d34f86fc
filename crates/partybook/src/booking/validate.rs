//! Booking field validation.

use std::sync::LazyLock;

use regex::Regex;

use super::{BookingError, Customer};

/// Local part, `@`, a domain with at least one dot, no whitespace anywhere.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Check an address against the simple email pattern.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Check the customer details of a booking.
///
/// Required fields are checked before the email format, and a missing field
/// is reported without saying which one.
///
/// # Errors
///
/// Returns [`BookingError::MissingFields`] if name, email, phone, date or
/// address is empty, and [`BookingError::InvalidEmail`] if the email doesn't
/// look like an address.
pub fn validate(customer: &Customer) -> Result<(), BookingError> {
    let required = [
        &customer.parent_name,
        &customer.email,
        &customer.phone,
        &customer.date,
        &customer.address,
    ];
    if required.iter().any(|value| is_blank(value)) {
        return Err(BookingError::MissingFields);
    }

    if !is_valid_email(&customer.email) {
        return Err(BookingError::InvalidEmail);
    }

    Ok(())
}
