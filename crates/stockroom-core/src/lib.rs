//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! Everything the back office decides, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Admin UI / Storefront (HTTP JSON)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-api (axum handlers)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ admission │  │   types   │  │ category  │  │  access   │  │   │
//! │  │   │  session  │  │   money   │  │   tree    │  │  roles    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-db (SQLite repositories)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`admission`] - Batch-to-inventory admission state machine
//! - [`types`] - Domain entities (Batch, InventoryRecord, Product, ...)
//! - [`money`] - Integer-cent money
//! - [`category_tree`] - Arena over the category hierarchy
//! - [`access`] - Roles and permissions
//! - [`validation`] - Input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::admission::unit_code;
//! use stockroom_core::types::batch_base_code;
//!
//! let base = batch_base_code(1000);
//! assert_eq!(unit_code(&base, 3), "BATCH1000-03");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod admission;
pub mod category_tree;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{Permission, Role};
pub use admission::{AdmissionError, AdmissionPhase, AdmissionSession, AdmissionStatus};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Location written onto admitted units when no active warehouse store exists.
pub const DEFAULT_WAREHOUSE_LOCATION: &str = "Main Warehouse";

/// Upper bound on units per batch. Keeps a mistyped quantity from
/// generating thousands of expected codes.
pub const MAX_BATCH_QUANTITY: i64 = 999;

/// Number given to the first batch; later batches count up from it.
pub const FIRST_BATCH_NUMBER: i64 = 1001;

/// Deepest allowed category nesting (a root is depth 1).
pub const MAX_CATEGORY_DEPTH: usize = 5;
