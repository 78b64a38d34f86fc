//! Cart and price estimation.
//!
//! A [`Cart`] is an ordered list of customized packages. Each mutation is
//! written through to its [`CartStore`], and the cart is rehydrated from the
//! store on [`Cart::load`]. Prices are whole dollars:
//!
//! ```text
//! item cost = hourly rate x hours + (entertainment add-on ? 25 : 0)
//! ```
//!
//! The hourly rate is resolved from the package's rate table when the item is
//! built, so the cart total is a single number rather than a min/max range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{CateringSize, Package, ENTERTAINMENT_FEE};
use crate::error::Result;
use crate::storage::CartStore;

/// Fewest hours a party can be booked for.
pub const MIN_HOURS: u32 = 1;

/// Most hours a party can be booked for.
pub const MAX_HOURS: u32 = 4;

/// Cost of one line: `rate * hours`, plus the entertainment fee when it was
/// added on.
#[must_use]
pub fn line_cost(hourly_rate: u32, hours: u32, is_entertainment_add_on: bool) -> u64 {
    let fee = if is_entertainment_add_on {
        u64::from(ENTERTAINMENT_FEE)
    } else {
        0
    };
    u64::from(hourly_rate) * u64::from(hours) + fee
}

/// Format a dollar amount the way estimates are displayed, e.g. `$140`.
#[must_use]
pub fn format_dollars(amount: u64) -> String {
    format!("${amount}")
}

/// One customized package in the cart.
///
/// Package id and name are copies taken when the item was built, not a live
/// link into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Unique item identifier.
    pub id: String,
    /// Source package identifier.
    pub package_id: String,
    /// Source package display name.
    pub package_name: String,
    /// Chosen catering size.
    pub catering_size: CateringSize,
    /// Guest count implied by the catering size.
    pub guest_count: u32,
    /// Booked hours.
    pub hours: u32,
    /// Hourly rate resolved for the catering size.
    pub hourly_rate: u32,
    /// Entertainment is part of the party, included or added.
    pub has_entertainment: bool,
    /// Entertainment was bought as a paid add-on.
    pub is_entertainment_add_on: bool,
    /// When the item was put in the cart.
    #[serde(default = "Utc::now")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Estimated cost of this item.
    #[must_use]
    pub fn cost(&self) -> u64 {
        line_cost(self.hourly_rate, self.hours, self.is_entertainment_add_on)
    }
}

/// A cart item before it has been given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    /// Source package identifier.
    pub package_id: String,
    /// Source package display name.
    pub package_name: String,
    /// Chosen catering size.
    pub catering_size: CateringSize,
    /// Guest count implied by the catering size.
    pub guest_count: u32,
    /// Booked hours.
    pub hours: u32,
    /// Hourly rate for the catering size.
    pub hourly_rate: u32,
    /// Entertainment is part of the party.
    pub has_entertainment: bool,
    /// Entertainment is a paid add-on.
    pub is_entertainment_add_on: bool,
}

impl NewCartItem {
    /// Customize a catalog package.
    ///
    /// Resolves the hourly rate and guest count for `size` and clamps `hours`
    /// into `1..=4`. Asking for entertainment on a package that already
    /// includes it does not produce an add-on.
    #[must_use]
    pub fn from_package(
        package: &Package,
        size: CateringSize,
        hours: u32,
        add_entertainment: bool,
    ) -> Self {
        Self {
            package_id: package.id.to_string(),
            package_name: package.name.to_string(),
            catering_size: size,
            guest_count: size.guest_count(),
            hours: hours.clamp(MIN_HOURS, MAX_HOURS),
            hourly_rate: package.hourly_rate(size),
            has_entertainment: package.has_entertainment_included || add_entertainment,
            is_entertainment_add_on: !package.has_entertainment_included && add_entertainment,
        }
    }

    /// Estimated cost of the item.
    #[must_use]
    pub fn cost(&self) -> u64 {
        line_cost(self.hourly_rate, self.hours, self.is_entertainment_add_on)
    }

    /// Turn this into a [`CartItem`] with the given id.
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> CartItem {
        CartItem {
            id: id.into(),
            package_id: self.package_id,
            package_name: self.package_name,
            catering_size: self.catering_size,
            guest_count: self.guest_count,
            hours: self.hours,
            hourly_rate: self.hourly_rate,
            has_entertainment: self.has_entertainment,
            is_entertainment_add_on: self.is_entertainment_add_on,
            added_at: Utc::now(),
        }
    }
}

/// Fields to merge into an existing cart item. `None` leaves a field alone.
///
/// The cart applies these as given. Use [`CartUpdate::reconfigure`] to get an
/// update whose rate and add-on flag agree with the package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartUpdate {
    /// New package identifier.
    pub package_id: Option<String>,
    /// New package name.
    pub package_name: Option<String>,
    /// New catering size.
    pub catering_size: Option<CateringSize>,
    /// New guest count.
    pub guest_count: Option<u32>,
    /// New hours.
    pub hours: Option<u32>,
    /// New hourly rate.
    pub hourly_rate: Option<u32>,
    /// New entertainment flag.
    pub has_entertainment: Option<bool>,
    /// New add-on flag.
    pub is_entertainment_add_on: Option<bool>,
}

impl CartUpdate {
    /// A complete update that re-customizes an item from a package.
    #[must_use]
    pub fn reconfigure(
        package: &Package,
        size: CateringSize,
        hours: u32,
        add_entertainment: bool,
    ) -> Self {
        let item = NewCartItem::from_package(package, size, hours, add_entertainment);
        Self {
            package_id: Some(item.package_id),
            package_name: Some(item.package_name),
            catering_size: Some(item.catering_size),
            guest_count: Some(item.guest_count),
            hours: Some(item.hours),
            hourly_rate: Some(item.hourly_rate),
            has_entertainment: Some(item.has_entertainment),
            is_entertainment_add_on: Some(item.is_entertainment_add_on),
        }
    }

    /// Check whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(self, item: &mut CartItem) {
        if let Some(v) = self.package_id {
            item.package_id = v;
        }
        if let Some(v) = self.package_name {
            item.package_name = v;
        }
        if let Some(v) = self.catering_size {
            item.catering_size = v;
        }
        if let Some(v) = self.guest_count {
            item.guest_count = v;
        }
        if let Some(v) = self.hours {
            item.hours = v;
        }
        if let Some(v) = self.hourly_rate {
            item.hourly_rate = v;
        }
        if let Some(v) = self.has_entertainment {
            item.has_entertainment = v;
        }
        if let Some(v) = self.is_entertainment_add_on {
            item.is_entertainment_add_on = v;
        }
    }
}

/// User-facing confirmation that an item was added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    /// Identifier of the new item.
    pub item_id: String,
    /// Short headline.
    pub title: &'static str,
    /// One-line description.
    pub description: String,
}

/// The shopping cart.
#[derive(Debug)]
pub struct Cart<S: CartStore> {
    items: Vec<CartItem>,
    store: S,
}

impl<S: CartStore> Cart<S> {
    /// Rehydrate the cart from its store.
    ///
    /// Unreadable or corrupt stored data is logged and treated as an empty
    /// cart.
    pub fn load(store: S) -> Self {
        let items = match store.load() {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to parse cart, starting empty: {e}");
                Vec::new()
            }
        };
        debug!("Loaded cart with {} item(s)", items.len());
        Self { items, store }
    }

    /// Items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append an item under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart can't be persisted, in which case the
    /// item is not added.
    pub fn add_item(&mut self, item: NewCartItem) -> Result<Acknowledgment> {
        let item = item.with_id(Uuid::new_v4().to_string());
        let ack = Acknowledgment {
            item_id: item.id.clone(),
            title: "Added to Cart!",
            description: format!("{} has been added.", item.package_name),
        };
        let package_id = item.package_id.clone();
        self.items.push(item);
        if let Err(e) = self.persist() {
            self.items.pop();
            return Err(e);
        }
        info!(item_id = %ack.item_id, package = %package_id, "Added item to cart");
        Ok(ack)
    }

    /// Remove an item. Returns `false` (and writes nothing) if it wasn't there.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart can't be persisted.
    pub fn remove_item(&mut self, id: &str) -> Result<bool> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Merge `update` into an item. Returns `false` if it wasn't there.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart can't be persisted.
    pub fn update_item(&mut self, id: &str, update: CartUpdate) -> Result<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        update.apply_to(item);
        self.persist()?;
        Ok(true)
    }

    /// Empty the cart and drop the stored entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored entry can't be removed.
    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.store.clear()
    }

    /// Sum of item costs. Zero for an empty cart.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.items.iter().map(CartItem::cost).sum()
    }

    /// Total estimate as sent with a booking, e.g. `$140`.
    #[must_use]
    pub fn total_display(&self) -> String {
        format_dollars(self.total())
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{self, packages};
    use crate::storage::MemoryCartStore;

    fn premium() -> &'static Package {
        catalog::find("package-a").unwrap()
    }

    fn bundle() -> &'static Package {
        catalog::find("package-d").unwrap()
    }

    #[test]
    fn test_line_cost() {
        assert_eq!(line_cost(70, 2, false), 140);
        assert_eq!(line_cost(45, 3, true), 160);
        assert_eq!(line_cost(0, 4, true), 25);
    }

    #[test]
    fn test_line_cost_does_not_overflow() {
        assert_eq!(
            line_cost(u32::MAX, u32::MAX, true),
            u64::from(u32::MAX) * u64::from(u32::MAX) + 25
        );
    }

    #[test]
    fn test_cost_formula_for_every_package_and_size() {
        for package in packages() {
            for size in CateringSize::ALL {
                for hours in MIN_HOURS..=MAX_HOURS {
                    for add in [false, true] {
                        let item = NewCartItem::from_package(package, size, hours, add);
                        let fee = if item.is_entertainment_add_on { 25 } else { 0 };
                        assert_eq!(
                            item.cost(),
                            u64::from(package.hourly_rate(size)) * u64::from(hours) + fee
                        );
                        if package.has_entertainment_included {
                            assert!(!item.is_entertainment_add_on);
                            assert!(item.has_entertainment);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_from_package_resolves_size() {
        let item = NewCartItem::from_package(bundle(), CateringSize::Large, 2, false);
        assert_eq!(item.guest_count, 30);
        assert_eq!(item.hourly_rate, 45);
        assert!(!item.has_entertainment);
        assert!(!item.is_entertainment_add_on);
    }

    #[test]
    fn test_entertainment_add_on_only_when_not_included() {
        let added = NewCartItem::from_package(bundle(), CateringSize::Small, 1, true);
        assert!(added.has_entertainment);
        assert!(added.is_entertainment_add_on);

        let included = NewCartItem::from_package(premium(), CateringSize::Small, 1, true);
        assert!(included.has_entertainment);
        assert!(!included.is_entertainment_add_on);
    }

    #[test]
    fn test_hours_are_clamped() {
        assert_eq!(
            NewCartItem::from_package(bundle(), CateringSize::Small, 0, false).hours,
            1
        );
        assert_eq!(
            NewCartItem::from_package(bundle(), CateringSize::Small, 9, false).hours,
            4
        );
    }

    #[test]
    fn test_add_item_generates_unique_ids() {
        let mut cart = Cart::load(MemoryCartStore::new());
        let item = NewCartItem::from_package(premium(), CateringSize::Medium, 2, false);

        let first = cart.add_item(item.clone()).unwrap();
        let second = cart.add_item(item).unwrap();

        assert_ne!(first.item_id, second.item_id);
        assert_eq!(cart.count(), 2);
        assert_eq!(first.title, "Added to Cart!");
        assert_eq!(first.description, "All-Inclusive Premium has been added.");
    }

    struct ReadOnlyStore;

    impl CartStore for ReadOnlyStore {
        fn load(&self) -> Result<Vec<CartItem>> {
            Ok(Vec::new())
        }

        fn save(&self, _items: &[CartItem]) -> Result<()> {
            Err(std::io::Error::other("read-only file system").into())
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_add_leaves_cart_unchanged() {
        let mut cart = Cart::load(ReadOnlyStore);
        let item = NewCartItem::from_package(premium(), CateringSize::Medium, 2, false);

        let err = cart.add_item(item).unwrap_err();

        assert!(err.to_string().contains("read-only"));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn test_mutations_are_persisted() {
        let store = MemoryCartStore::new();
        let mut cart = Cart::load(&store);
        let ack = cart
            .add_item(NewCartItem::from_package(bundle(), CateringSize::Small, 1, false))
            .unwrap();

        assert_eq!(store.load().unwrap().len(), 1);

        cart.update_item(
            &ack.item_id,
            CartUpdate {
                hours: Some(3),
                ..CartUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(store.load().unwrap()[0].hours, 3);

        cart.remove_item(&ack.item_id).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_rehydrates_from_store() {
        let store = MemoryCartStore::new();
        {
            let mut cart = Cart::load(&store);
            cart.add_item(NewCartItem::from_package(premium(), CateringSize::Large, 4, false))
                .unwrap();
        }

        let cart = Cart::load(&store);
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.items()[0].package_name, "All-Inclusive Premium");
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        crate::logging::init_test_logging();
        let cart = Cart::load(MemoryCartStore::with_raw("not json at all"));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = MemoryCartStore::new();
        let mut cart = Cart::load(&store);

        assert!(!cart.remove_item("missing").unwrap());
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut cart = Cart::load(MemoryCartStore::new());
        let changed = cart
            .update_item("missing", CartUpdate::reconfigure(bundle(), CateringSize::Small, 1, false))
            .unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let mut cart = Cart::load(MemoryCartStore::new());
        let ack = cart
            .add_item(NewCartItem::from_package(bundle(), CateringSize::Medium, 2, true))
            .unwrap();

        cart.update_item(
            &ack.item_id,
            CartUpdate {
                hourly_rate: Some(99),
                ..CartUpdate::default()
            },
        )
        .unwrap();

        let item = cart.get(&ack.item_id).unwrap();
        assert_eq!(item.hourly_rate, 99);
        assert_eq!(item.catering_size, CateringSize::Medium);
        assert_eq!(item.hours, 2);
        assert!(item.is_entertainment_add_on);
    }

    #[test]
    fn test_reconfigure_switches_package_consistently() {
        let mut cart = Cart::load(MemoryCartStore::new());
        let ack = cart
            .add_item(NewCartItem::from_package(bundle(), CateringSize::Small, 1, true))
            .unwrap();

        cart.update_item(
            &ack.item_id,
            CartUpdate::reconfigure(premium(), CateringSize::Medium, 2, true),
        )
        .unwrap();

        let item = cart.get(&ack.item_id).unwrap();
        assert_eq!(item.package_id, "package-a");
        assert_eq!(item.hourly_rate, 70);
        assert_eq!(item.guest_count, 20);
        assert!(!item.is_entertainment_add_on);
        assert_eq!(item.cost(), 140);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::load(MemoryCartStore::new());
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.total_display(), "$0");

        cart.add_item(NewCartItem::from_package(premium(), CateringSize::Medium, 2, false))
            .unwrap();
        cart.add_item(NewCartItem::from_package(bundle(), CateringSize::Small, 3, true))
            .unwrap();

        let expected: u64 = cart.items().iter().map(CartItem::cost).sum();
        assert_eq!(cart.total(), expected);
        assert_eq!(cart.total(), 140 + 25 * 3 + 25);
        assert_eq!(cart.total_display(), "$240");
    }

    #[test]
    fn test_clear() {
        let store = MemoryCartStore::new();
        let mut cart = Cart::load(&store);
        cart.add_item(NewCartItem::from_package(bundle(), CateringSize::Small, 1, false))
            .unwrap();

        cart.clear().unwrap();

        assert!(cart.is_empty());
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_cart_item_deserializes_without_timestamp() {
        let json = r#"{
            "id": "x",
            "packageId": "package-b",
            "packageName": "All-Inclusive",
            "cateringSize": "Large",
            "guestCount": 30,
            "hours": 2,
            "hourlyRate": 75,
            "hasEntertainment": false,
            "isEntertainmentAddOn": false
        }"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.cost(), 150);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(CartUpdate::default().is_empty());
        assert!(!CartUpdate::reconfigure(bundle(), CateringSize::Small, 1, false).is_empty());
    }
}
