//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│     Batch       │◄──│ InventoryRecord │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  base_code      │   │  barcode        │       │
//! │  │  category_id    │   │  quantity       │   │  status         │       │
//! │  │  attributes     │   │  admitted       │   │  location       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │     Field       │   │     Store       │       │
//! │  │  parent_id      │   │  field_type     │   │  store_type     │       │
//! │  │  sort_order     │   │  options        │   │  (warehouse)    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: `base_code` for batches, `barcode` for
//!   inventory units, `sku` for products

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Optional Stock Keeping Unit. Unique when present.
    pub sku: Option<String>,

    /// Display name shown in the back office and the storefront.
    pub name: String,

    pub description: Option<String>,

    /// Category the product is filed under.
    pub category_id: Option<String>,

    /// List price in cents. Batches carry their own selling price.
    pub selling_price_cents: i64,

    /// Values for custom fields, keyed by field name.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[ts(type = "Record<string, unknown>")]
    pub attributes: BTreeMap<String, serde_json::Value>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Custom Fields
// =============================================================================

/// The value type a custom field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Boolean => "boolean",
        }
    }
}

/// A custom attribute definition products can carry (color, size, material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Field {
    pub id: String,
    /// Attribute key, unique across fields.
    pub name: String,
    pub field_type: FieldType,
    /// Allowed values for `select` fields; empty otherwise.
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    pub options: Vec<String>,
    pub required: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A node in the category hierarchy, stored flat with a parent pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// `None` for root categories.
    pub parent_id: Option<String>,
    /// Position among siblings (ascending).
    pub sort_order: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Store
// =============================================================================

/// What a store location is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Receives stock; admission writes its name onto inventory records.
    Warehouse,
    /// Physical shop front.
    Retail,
    /// Social-commerce / web channel.
    Online,
}

/// A physical or virtual location that holds stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub store_type: StoreType,
    pub address: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Batch
// =============================================================================

/// Whether every unit of a batch has been scanned into inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AdmittedFlag {
    #[default]
    No,
    Yes,
}

impl AdmittedFlag {
    /// Flag value implied by an admitted unit count.
    pub fn for_count(admitted_count: i64, quantity: i64) -> Self {
        if admitted_count >= quantity {
            AdmittedFlag::Yes
        } else {
            AdmittedFlag::No
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, AdmittedFlag::Yes)
    }
}

/// A purchase lot of one product waiting to be scanned into inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,

    /// Sequential batch number, assigned at creation.
    pub number: i64,

    /// `BATCH<number>`; every unit barcode of this batch starts with it.
    pub base_code: String,

    pub product_id: String,

    /// Purchase cost per unit, in cents.
    pub cost_price_cents: i64,

    /// Selling price per unit, in cents.
    pub selling_price_cents: i64,

    /// Total units expected.
    pub quantity: i64,

    pub admitted: AdmittedFlag,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Total purchase cost of the batch (unit cost × quantity).
    pub fn total_cost(&self) -> Money {
        self.cost_price().multiply_quantity(self.quantity)
    }

    /// Selling price over cost, in basis points of cost.
    pub fn markup_bps(&self) -> Option<i64> {
        self.selling_price().markup_bps(self.cost_price())
    }
}

/// Builds the base code for a batch number.
///
/// ```rust
/// use stockroom_core::types::batch_base_code;
///
/// assert_eq!(batch_base_code(1000), "BATCH1000");
/// ```
pub fn batch_base_code(number: i64) -> String {
    format!("BATCH{}", number)
}

// =============================================================================
// Inventory
// =============================================================================

/// The condition of a single physical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryStatus {
    /// On the shelf, can be sold.
    #[default]
    Available,
    Damaged,
    /// Moving between stores.
    InTransit,
    Sold,
}

impl InventoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryStatus::Available => "available",
            InventoryStatus::Damaged => "damaged",
            InventoryStatus::InTransit => "in-transit",
            InventoryStatus::Sold => "sold",
        }
    }
}

impl std::str::FromStr for InventoryStatus {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(InventoryStatus::Available),
            "damaged" => Ok(InventoryStatus::Damaged),
            "in-transit" => Ok(InventoryStatus::InTransit),
            "sold" => Ok(InventoryStatus::Sold),
            _ => Err(crate::error::ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["available", "damaged", "in-transit", "sold"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// One physical unit, keyed by a globally unique barcode.
///
/// Pricing is a snapshot of the batch at admission time, so later batch
/// edits do not rewrite the value of stock already on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryRecord {
    pub id: String,
    pub product_id: String,
    pub batch_id: String,
    pub barcode: String,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub location: String,
    pub status: InventoryStatus,
    #[ts(as = "String")]
    pub admitted_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Storefront
// =============================================================================

/// Public listing of an active product.
///
/// `price_cents` is the lowest selling price among available units, falling
/// back to the product's list price when none are on the shelf. `price` is
/// the same amount as a two-place decimal for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StorefrontProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[ts(type = "Record<string, unknown>")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub price_cents: i64,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub price: String,
    pub available_units: i64,
}

impl StorefrontProduct {
    /// Fills `price` from `price_cents`.
    pub fn with_display_price(mut self) -> Self {
        self.price = Money::from_cents(self.price_cents).to_string();
        self
    }
}

// =============================================================================
// Users
// =============================================================================

/// A back-office account. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: crate::access::Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
