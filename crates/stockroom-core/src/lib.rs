//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate holds the domain model of the inventory/order tool with zero
//! I/O dependencies. Persistence lives in `stockroom-store`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Callers (menus, reports, supplier flows)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockroom-store (file I/O)                      │   │
//! │  │   OrderProcessor ──► EntityStore<T> ──► Codec ──► *.json        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses types from                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  reports  │  │ validation│  │   │
//! │  │   │  Entity   │  │   Money   │  │  daily    │  │   rules   │  │   │
//! │  │   │  Order    │  │           │  │  best/low │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO LOCKS • PURE FUNCTIONS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities and the [`Entity`] identity trait
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//! - [`reports`] - Sales and stock aggregations
//! - [`session`] - Explicit logged-in employee context
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::{Money, Order, OrderItem, Product};
//! use chrono::Utc;
//!
//! let pen = Product::new("Pen", Money::from_cents(1500), 200);
//! let order = Order::new(1, Utc::now(), vec![OrderItem::snapshot(&pen, 5)]);
//!
//! assert_eq!(order.total_amount().to_string(), "75.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reports;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use session::Session;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted display name.
pub const MAX_NAME_LEN: usize = 200;
