//! # stockroom-store: Persistence Layer for Stockroom
//!
//! This crate keeps every collection in its own JSON snapshot file and
//! provides the services that change several collections at once.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  Caller (menu, seed binary, tests)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  stockroom-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Services    │    │     auth     │  │   │
//! │  │   │ (database.rs) │    │ OrderProcessor│    │  argon2 +    │  │   │
//! │  │   │ Arc stores    │◄───│ StockReceiving│    │  Session     │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           ▼                                                     │   │
//! │  │   EntityStore<T> ── Mutex ──► Codec<T> (JsonFileCodec)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  <data_dir>/products.json, orders.json, customers.json, ...    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Data directory and load policy
//! - [`codec`] - Whole-collection load/save
//! - [`store`] - Generic locked CRUD per entity type
//! - [`database`] - Shared store handles
//! - [`service`] - Order processing and stock receiving
//! - [`auth`] - Password hashing and login
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stockroom_store::{Database, StoreConfig};
//!
//! let config = StoreConfig::load(None)?;
//! let db = Database::open(config)?;
//!
//! let orders = db.order_processor().get_by_customer(1)?;
//! println!("{} orders", orders.len());
//! # Ok::<(), stockroom_store::StoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod codec;
pub mod config;
pub mod database;
pub mod error;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use codec::{Codec, InMemoryCodec, JsonFileCodec};
pub use config::{LoadPolicy, StoreConfig};
pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use service::{OrderProcessor, StockReceiving};
pub use store::EntityStore;
