//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::booking::Customer;
use crate::cart::{CartItem, CartUpdate, MAX_HOURS, MIN_HOURS};
use crate::catalog::{self, CateringSize};
use crate::error::{Error, Result};

/// Server command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind_addr`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Package listing arguments.
#[derive(Debug, Args)]
pub struct PackagesCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Cart commands.
#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show the cart and its total
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a customized package
    Add(AddArgs),

    /// Remove an item
    Remove {
        /// Item id
        id: String,
    },

    /// Change an item's package, size, hours or entertainment
    Update(UpdateArgs),

    /// Remove every item
    Clear,

    /// Submit the cart as a booking request
    Checkout(CheckoutArgs),
}

/// Arguments for `cart add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Package id, e.g. `package-a`
    pub package: String,

    /// Catering size
    #[arg(short, long, value_enum, default_value_t = SizeArg::Medium)]
    pub size: SizeArg,

    /// Hours of service
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(i64::from(MIN_HOURS)..=i64::from(MAX_HOURS)))]
    pub hours: u32,

    /// Add entertainment (ignored when the package includes it)
    #[arg(short, long)]
    pub entertainment: bool,
}

/// Arguments for `cart update`.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Item id
    pub id: String,

    /// Switch to another package
    #[arg(short, long)]
    pub package: Option<String>,

    /// New catering size
    #[arg(short, long, value_enum)]
    pub size: Option<SizeArg>,

    /// New hours of service
    #[arg(long, value_parser = clap::value_parser!(u32).range(i64::from(MIN_HOURS)..=i64::from(MAX_HOURS)))]
    pub hours: Option<u32>,

    /// Turn the entertainment add-on on or off
    #[arg(short, long, value_name = "BOOL")]
    pub entertainment: Option<bool>,
}

impl UpdateArgs {
    /// Work out the update for `item`, keeping whatever wasn't given.
    ///
    /// The rate, guest count and add-on flag are recomputed from the
    /// (possibly new) package so they stay consistent.
    ///
    /// # Errors
    ///
    /// Returns an error if the package id is not in the catalog.
    pub fn to_update(&self, item: &CartItem) -> Result<CartUpdate> {
        let package_id = self.package.as_deref().unwrap_or(&item.package_id);
        let package = catalog::find(package_id).ok_or_else(|| Error::unknown_package(package_id))?;

        let size = self.size.map_or(item.catering_size, CateringSize::from);
        let hours = self.hours.unwrap_or(item.hours);
        let entertainment = self.entertainment.unwrap_or(item.is_entertainment_add_on);

        Ok(CartUpdate::reconfigure(package, size, hours, entertainment))
    }
}

/// Arguments for `cart checkout`.
#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Parent or contact name
    #[arg(long)]
    pub name: String,

    /// Contact email
    #[arg(long)]
    pub email: String,

    /// Contact phone
    #[arg(long)]
    pub phone: String,

    /// Party date
    #[arg(long)]
    pub date: String,

    /// Party location
    #[arg(long)]
    pub address: String,

    /// Party start time
    #[arg(long)]
    pub start_time: Option<String>,

    /// Party theme
    #[arg(long)]
    pub theme: Option<String>,

    /// Allergies and dietary notes
    #[arg(long)]
    pub dietary_notes: Option<String>,

    /// Anything else
    #[arg(long)]
    pub notes: Option<String>,

    /// Print the notification instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl CheckoutArgs {
    /// The customer details for the booking.
    #[must_use]
    pub fn customer(&self) -> Customer {
        Customer {
            parent_name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            date: self.date.clone(),
            start_time: self.start_time.clone(),
            address: self.address.clone(),
            theme: self.theme.clone(),
            dietary_notes: self.dietary_notes.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

/// Catering size argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SizeArg {
    /// 10 guests
    Small,
    /// 20 guests
    Medium,
    /// 30 guests
    Large,
}

impl From<SizeArg> for CateringSize {
    fn from(arg: SizeArg) -> Self {
        match arg {
            SizeArg::Small => Self::Small,
            SizeArg::Medium => Self::Medium,
            SizeArg::Large => Self::Large,
        }
    }
}
