//! `partybook` - Party package catalog, cart and booking service
//!
//! This library provides the package catalog, a locally persisted cart with
//! price estimation, and the booking endpoint that turns a checkout into an
//! email to the business inbox, rate limited per client.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod booking;
pub mod cart;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod ratelimit;
pub mod server;
pub mod storage;

pub use booking::{BookingError, BookingOutcome, BookingRequest, BookingService, Customer};
pub use cart::{Cart, CartItem, CartUpdate, NewCartItem};
pub use catalog::{CateringSize, Package};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use notifier::{BookingEmail, Notifier, NotifyError, SmtpNotifier};
pub use ratelimit::{RateLimiter, SlidingWindowLimiter};
pub use storage::{CartStore, MemoryCartStore, SqliteCartStore};
