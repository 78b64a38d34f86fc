//! Rendering of booking notifications.

use std::fmt::Write as _;

use super::{BookingLine, BookingRequest, Customer};
use crate::catalog::ENTERTAINMENT_FEE;
use crate::notifier::BookingEmail;

const NOT_SPECIFIED: &str = "Not specified";
const NONE: &str = "None";
const NO_PACKAGES: &str = "(no packages selected)";

const ACCENT: &str = "#d4679a";
const LABEL_CELL: &str = "padding: 4px 8px; font-weight: bold;";
const VALUE_CELL: &str = "padding: 4px 8px;";

/// An optional field, or the fallback when it is absent or empty.
fn or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}

/// Escape text for inclusion in HTML element content or attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn text_line(line: &BookingLine) -> String {
    let mut out = format!(
        "• {} — {} ({} guests), {} hr(s) @ ${}/hr",
        line.package_name, line.catering_size, line.guest_count, line.hours, line.hourly_rate
    );
    if line.is_entertainment_add_on {
        let _ = write!(out, " + Entertainment (${ENTERTAINMENT_FEE})");
    }
    let _ = write!(out, " = ${}", line.cost());
    out
}

/// Render the plain-text body.
#[must_use]
pub fn render_text(request: &BookingRequest) -> String {
    let c = &request.customer;

    let packages = if request.cart.is_empty() {
        NO_PACKAGES.to_string()
    } else {
        request
            .cart
            .iter()
            .map(text_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    [
        format!("New Booking Request from {}", c.parent_name),
        String::new(),
        "--- Contact Info ---".to_string(),
        format!("Name: {}", c.parent_name),
        format!("Email: {}", c.email),
        format!("Phone: {}", c.phone),
        String::new(),
        "--- Party Details ---".to_string(),
        format!("Date: {}", c.date),
        format!("Start Time: {}", or(c.start_time.as_deref(), NOT_SPECIFIED)),
        format!("Location: {}", c.address),
        format!("Theme: {}", or(c.theme.as_deref(), NOT_SPECIFIED)),
        format!("Dietary Notes: {}", or(c.dietary_notes.as_deref(), NONE)),
        format!("Special Requests: {}", or(c.notes.as_deref(), NONE)),
        String::new(),
        "--- Packages ---".to_string(),
        packages,
        String::new(),
        format!("Estimated Total: {}", request.total_estimate),
    ]
    .join("\n")
}

fn html_row(out: &mut String, label: &str, value_html: &str) {
    let _ = write!(
        out,
        r#"<tr><td style="{LABEL_CELL}">{label}:</td><td style="{VALUE_CELL}">{value_html}</td></tr>"#
    );
}

fn html_contact(out: &mut String, c: &Customer) {
    let email = escape_html(&c.email);
    out.push_str("<h3>Contact Info</h3>");
    out.push_str(r#"<table style="border-collapse: collapse; width: 100%;">"#);
    html_row(out, "Name", &escape_html(&c.parent_name));
    html_row(
        out,
        "Email",
        &format!(r#"<a href="mailto:{email}">{email}</a>"#),
    );
    html_row(out, "Phone", &escape_html(&c.phone));
    out.push_str("</table>");
}

fn html_party(out: &mut String, c: &Customer) {
    out.push_str("<h3>Party Details</h3>");
    out.push_str(r#"<table style="border-collapse: collapse; width: 100%;">"#);
    html_row(out, "Date", &escape_html(&c.date));
    html_row(
        out,
        "Start Time",
        &escape_html(or(c.start_time.as_deref(), NOT_SPECIFIED)),
    );
    html_row(out, "Location", &escape_html(&c.address));
    html_row(
        out,
        "Theme",
        &escape_html(or(c.theme.as_deref(), NOT_SPECIFIED)),
    );
    html_row(
        out,
        "Dietary Notes",
        &escape_html(or(c.dietary_notes.as_deref(), NONE)),
    );
    html_row(
        out,
        "Special Requests",
        &escape_html(or(c.notes.as_deref(), NONE)),
    );
    out.push_str("</table>");
}

fn html_line(out: &mut String, line: &BookingLine) {
    let _ = write!(
        out,
        "<li><strong>{}</strong> — {} ({} guests), {} hr(s) = <strong>${}</strong>",
        escape_html(&line.package_name),
        line.catering_size,
        line.guest_count,
        line.hours,
        line.cost()
    );
    if line.is_entertainment_add_on {
        let _ = write!(out, " <em>(+Entertainment ${ENTERTAINMENT_FEE})</em>");
    }
    out.push_str("</li>");
}

/// Render the HTML body. Every customer-supplied value is escaped.
#[must_use]
pub fn render_html(request: &BookingRequest) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">"#,
    );
    let _ = write!(
        out,
        r#"<h2 style="color: {ACCENT};">New Booking Request</h2>"#
    );

    html_contact(&mut out, &request.customer);
    html_party(&mut out, &request.customer);

    out.push_str("<h3>Packages</h3><ul>");
    for line in &request.cart {
        html_line(&mut out, line);
    }
    out.push_str("</ul>");

    let _ = write!(
        out,
        r#"<p style="font-size: 18px; font-weight: bold; color: {ACCENT};">Estimated Total: {}</p>"#,
        escape_html(&request.total_estimate)
    );
    out.push_str("</div>");
    out
}

/// Compose the notification for a validated booking.
#[must_use]
pub fn compose(request: &BookingRequest) -> BookingEmail {
    BookingEmail {
        subject: format!("New Booking Request from {}", request.customer.parent_name),
        reply_to: request.customer.email.clone(),
        text: render_text(request),
        html: render_html(request),
    }
}
