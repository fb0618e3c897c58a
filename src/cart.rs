//! Shopper cart kept on the client side.
//!
//! The cart never lives in the database. Clients hold it in a key-value
//! store (browser local storage, a file, memory) under [`CART_STORAGE_KEY`]
//! and hand the item list to the quote and checkout endpoints, which fold it
//! back into a [`Cart`] so duplicate rows collapse the same way they do on
//! the client.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const CART_STORAGE_KEY: &str = "grocery-cart";

/// Largest quantity a single cart row may carry.
pub const MAX_LINE_QUANTITY: i32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    /// Product id, or `{product_id}-{variant-slug}` for a variant purchase.
    #[serde(default)]
    pub key: String,
    pub product_id: Uuid,
    pub variant_name: Option<String>,
    #[serde(default)]
    pub name: String,
    pub image_url: Option<String>,
    /// Unit price in yen as last seen by the client.
    #[serde(default)]
    pub price: i64,
    pub quantity: i32,
}

impl CartItem {
    pub fn new(product_id: Uuid, name: impl Into<String>, price: i64, quantity: i32) -> Self {
        Self {
            key: item_key(product_id, None),
            product_id,
            variant_name: None,
            name: name.into(),
            image_url: None,
            price,
            quantity,
        }
    }

    pub fn with_variant(mut self, variant_name: impl Into<String>) -> Self {
        let variant_name = variant_name.into();
        self.key = item_key(self.product_id, Some(&variant_name));
        self.variant_name = Some(variant_name);
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// `None` when price times quantity does not fit in an `i64`.
    pub fn subtotal(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }

    /// Recompute the key from product and variant, ignoring whatever the client sent.
    fn normalize_key(&mut self) {
        self.key = item_key(self.product_id, self.variant_name.as_deref());
    }
}

pub fn item_key(product_id: Uuid, variant_name: Option<&str>) -> String {
    match variant_name.map(slugify).filter(|slug| !slug.is_empty()) {
        Some(slug) => format!("{product_id}-{slug}"),
        None => product_id.to_string(),
    }
}

/// Lowercase, alphanumerics kept, every other run of characters becomes one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a client-supplied item list, merging rows that share a key.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            cart.add(item);
        }
        cart
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.key == key)
    }

    /// Adds the item, or bumps the quantity of the row with the same key.
    /// Merged quantities stop at `i32::MAX` instead of wrapping.
    pub fn add(&mut self, mut item: CartItem) {
        item.normalize_key();
        match self.items.iter_mut().find(|existing| existing.key == item.key) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .unwrap_or(i32::MAX);
                existing.price = item.price;
            }
            None => self.items.push(item),
        }
    }

    /// Sets the quantity of a row; zero or less drops the row. Returns false if the key is unknown.
    pub fn update_quantity(&mut self, key: &str, quantity: i32) -> bool {
        let Some(index) = self.items.iter().position(|item| item.key == key) else {
            return false;
        };
        if quantity <= 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        true
    }

    /// Takes one unit off a row.
    pub fn remove_one(&mut self, key: &str) -> bool {
        match self.get(key).map(|item| item.quantity) {
            Some(quantity) => self.update_quantity(key, quantity - 1),
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<CartItem> {
        let index = self.items.iter().position(|item| item.key == key)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of the row subtotals at the client's prices, `None` on overflow.
    pub fn total(&self) -> Option<i64> {
        self.items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.subtotal()?))
    }

    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    /// Reads the cart under [`CART_STORAGE_KEY`]. Missing or unreadable data yields an empty cart.
    pub fn load<S: CartStorage + ?Sized>(storage: &S) -> io::Result<Self> {
        let Some(raw) = storage.get_item(CART_STORAGE_KEY)? else {
            return Ok(Self::new());
        };
        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => Ok(cart),
            Err(err) => {
                tracing::warn!(error = %err, "discarding malformed stored cart");
                Ok(Self::new())
            }
        }
    }

    pub fn save<S: CartStorage + ?Sized>(&self, storage: &mut S) -> io::Result<()> {
        if self.items.is_empty() {
            return storage.remove_item(CART_STORAGE_KEY);
        }
        let raw = serde_json::to_string(self).map_err(io::Error::other)?;
        storage.set_item(CART_STORAGE_KEY, raw)
    }
}

/// String key-value store with local-storage semantics.
pub trait CartStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: String) -> io::Result<()>;
    fn remove_item(&mut self, key: &str) -> io::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl CartStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slugify(key)))
    }
}

impl CartStorage for FileStorage {
    fn get_item(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> io::Result<()> {
        fs::write(self.path_for(key), value)
    }

    fn remove_item(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indomie() -> CartItem {
        CartItem::new(Uuid::from_u128(1), "Indomie Goreng", 150, 1)
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(indomie());
        cart.add(CartItem {
            quantity: 2,
            ..indomie()
        });

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Some(450));
    }

    #[test]
    fn merging_huge_quantities_does_not_wrap() {
        let huge = CartItem {
            quantity: i32::MAX,
            ..indomie()
        };
        let cart = Cart::from_items([huge.clone(), huge]);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, i32::MAX);
    }

    #[test]
    fn overflowing_subtotal_is_none() {
        let item = CartItem::new(Uuid::from_u128(2), "Beras", i64::MAX, 2);
        assert_eq!(item.subtotal(), None);

        let cart = Cart::from_items([item, indomie()]);
        assert_eq!(cart.total(), None);
    }

    #[test]
    fn variants_are_separate_rows() {
        let mut cart = Cart::new();
        cart.add(indomie().with_variant("Pedas Level 3"));
        cart.add(indomie().with_variant("Original"));
        cart.add(indomie().with_variant("pedas  level-3"));

        assert_eq!(cart.items().len(), 2);
        let key = item_key(Uuid::from_u128(1), Some("Pedas Level 3"));
        assert!(key.ends_with("-pedas-level-3"));
        assert_eq!(cart.get(&key).unwrap().quantity, 2);
    }

    #[test]
    fn removing_last_unit_drops_row() {
        let mut cart = Cart::from_items([CartItem {
            quantity: 2,
            ..indomie()
        }]);
        let key = indomie().key;

        assert!(cart.remove_one(&key));
        assert_eq!(cart.get(&key).unwrap().quantity, 1);
        assert!(cart.remove_one(&key));
        assert!(cart.is_empty());
        assert!(!cart.remove_one(&key));
    }

    #[test]
    fn update_quantity_zero_removes() {
        let mut cart = Cart::from_items([indomie()]);
        let key = indomie().key;
        assert!(cart.update_quantity(&key, 5));
        assert_eq!(cart.item_count(), 5);
        assert!(cart.update_quantity(&key, 0));
        assert!(cart.is_empty());
        assert!(!cart.update_quantity("missing", 1));
    }

    #[test]
    fn client_supplied_key_is_ignored() {
        let mut item = indomie();
        item.key = "bogus".into();
        let cart = Cart::from_items([item, indomie()]);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].key, Uuid::from_u128(1).to_string());
    }

    #[test]
    fn save_and_load_through_memory_storage() {
        let mut storage = MemoryStorage::default();
        let mut cart = Cart::from_items([indomie().with_image("https://img/indomie.png")]);
        cart.save(&mut storage).unwrap();

        let loaded = Cart::load(&storage).unwrap();
        assert_eq!(loaded, cart);

        cart.clear();
        cart.save(&mut storage).unwrap();
        assert!(storage.get_item(CART_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn malformed_storage_yields_empty_cart() {
        let mut storage = MemoryStorage::default();
        storage
            .set_item(CART_STORAGE_KEY, "{not json".to_string())
            .unwrap();
        assert!(Cart::load(&storage).unwrap().is_empty());
    }

    #[test]
    fn file_storage_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();
        Cart::from_items([indomie()]).save(&mut storage).unwrap();

        let reopened = FileStorage::new(dir.path()).unwrap();
        let cart = Cart::load(&reopened).unwrap();
        assert_eq!(cart.item_count(), 1);
    }
}
