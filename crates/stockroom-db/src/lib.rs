//! # stockroom-db: Database Layer for Stockroom
//!
//! SQLite storage for the back office, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/batches/:id/admission)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BatchRepo      │    │ 001_initial_ │  │   │
//! │  │   │ WAL + FKs     │    │ AdmissionRepo  │    │  schema.sql  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (stockroom.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per collection, plus the admission driver
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("stockroom.db")).await?;
//!
//! let batch = db.batches().create(new_batch).await?;
//! let outcome = db.admission().submit(&batch.id, "BATCH1001-01").await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::admission::{AdmissionOutcome, AdmissionRepository};
pub use repository::batch::{BatchPatch, BatchRepository, NewBatch};
pub use repository::category::{CategoryPatch, CategoryRepository, NewCategory};
pub use repository::field::{FieldPatch, FieldRepository, NewField};
pub use repository::inventory::{InventoryFilter, InventoryPatch, InventoryRepository};
pub use repository::product::{NewProduct, ProductPatch, ProductRepository};
pub use repository::store::{NewStore, StorePatch, StoreRepository};
pub use repository::user::{NewUser, UserPatch, UserRepository};
