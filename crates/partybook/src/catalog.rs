//! Party package catalog.
//!
//! The catalog is a fixed table defined at startup. Every package carries an
//! hourly rate per catering size; the cart resolves the rate for the chosen
//! size when an item is built, so prices never depend on the catalog after
//! that point.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Flat fee for adding entertainment to a package that doesn't include it.
pub const ENTERTAINMENT_FEE: u32 = 25;

/// Catering size chosen for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CateringSize {
    /// A few kids plus parents.
    Small,
    /// A solid party crew.
    #[default]
    Medium,
    /// A big celebration.
    Large,
}

impl CateringSize {
    /// All sizes in display order.
    pub const ALL: [CateringSize; 3] = [Self::Small, Self::Medium, Self::Large];

    /// Guest count implied by the size.
    #[must_use]
    pub fn guest_count(self) -> u32 {
        match self {
            Self::Small => 10,
            Self::Medium => 20,
            Self::Large => 30,
        }
    }

    /// Short description shown next to the size.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Small => "Few kids + parents",
            Self::Medium => "Solid party crew",
            Self::Large => "Big celebration",
        }
    }
}

impl fmt::Display for CateringSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "Small"),
            Self::Medium => write!(f, "Medium"),
            Self::Large => write!(f, "Large"),
        }
    }
}

impl FromStr for CateringSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown catering size: {other}")),
        }
    }
}

/// Hourly rate per catering size, in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateTable {
    /// Rate for [`CateringSize::Small`].
    pub small: u32,
    /// Rate for [`CateringSize::Medium`].
    pub medium: u32,
    /// Rate for [`CateringSize::Large`].
    pub large: u32,
}

impl RateTable {
    /// Rate for the given size.
    #[must_use]
    pub fn get(&self, size: CateringSize) -> u32 {
        match size {
            CateringSize::Small => self.small,
            CateringSize::Medium => self.medium,
            CateringSize::Large => self.large,
        }
    }
}

/// A catalog offering of bundled party services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Stable identifier, e.g. `package-a`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Hourly rate per catering size.
    pub rates: RateTable,
    /// Included services, in display order.
    pub includes: &'static [&'static str],
    /// Highlighted as the most popular choice.
    pub is_popular: bool,
    /// Entertainment comes with the package at no extra cost.
    pub has_entertainment_included: bool,
}

impl Package {
    /// Hourly rate for the given size.
    #[must_use]
    pub fn hourly_rate(&self, size: CateringSize) -> u32 {
        self.rates.get(size)
    }

    /// Lowest hourly rate across sizes.
    #[must_use]
    pub fn min_hourly(&self) -> u32 {
        self.rates.small.min(self.rates.medium).min(self.rates.large)
    }

    /// Highest hourly rate across sizes.
    #[must_use]
    pub fn max_hourly(&self) -> u32 {
        self.rates.small.max(self.rates.medium).max(self.rates.large)
    }

    /// Display price range, e.g. `$55–$85`.
    #[must_use]
    pub fn price_range(&self) -> String {
        format!("${}–${}", self.min_hourly(), self.max_hourly())
    }
}

static PACKAGES: [Package; 4] = [
    Package {
        id: "package-a",
        name: "All-Inclusive Premium",
        rates: RateTable {
            small: 55,
            medium: 70,
            large: 85,
        },
        includes: &["Setup", "Catering", "Serving", "Decorating", "Entertainment"],
        is_popular: true,
        has_entertainment_included: true,
    },
    Package {
        id: "package-b",
        name: "All-Inclusive",
        rates: RateTable {
            small: 45,
            medium: 60,
            large: 75,
        },
        includes: &["Setup", "Catering", "Serving", "Decorating"],
        is_popular: false,
        has_entertainment_included: false,
    },
    Package {
        id: "package-c",
        name: "Bundle Premium",
        rates: RateTable {
            small: 35,
            medium: 50,
            large: 65,
        },
        includes: &["Setup", "Catering", "Serving"],
        is_popular: false,
        has_entertainment_included: false,
    },
    Package {
        id: "package-d",
        name: "Bundle",
        rates: RateTable {
            small: 25,
            medium: 35,
            large: 45,
        },
        includes: &["Setup", "Catering"],
        is_popular: false,
        has_entertainment_included: false,
    },
];

/// All packages in display order.
#[must_use]
pub fn packages() -> &'static [Package] {
    &PACKAGES
}

/// Look up a package by identifier.
#[must_use]
pub fn find(id: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// Catalog entry as served over HTTP, with the derived display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageView {
    /// The package itself.
    #[serde(flatten)]
    pub package: &'static Package,
    /// Display price range.
    pub price_range: String,
    /// Lowest hourly rate.
    pub min_hourly: u32,
    /// Highest hourly rate.
    pub max_hourly: u32,
}

impl From<&'static Package> for PackageView {
    fn from(package: &'static Package) -> Self {
        Self {
            package,
            price_range: package.price_range(),
            min_hourly: package.min_hourly(),
            max_hourly: package.max_hourly(),
        }
    }
}
