//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate is the **heart** of the Tally POS transactional core. It
//! contains all business decisions as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            REST Controllers (out of scope)                      │   │
//! │  │    createSale ──► voidSale ──► openShift ──► closeShift         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-engine (services)                      │   │
//! │  │    SaleCoordinator, InventoryLedger, ShiftLedger                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐ ┌───────────┐ ┌──────────────┐ ┌───────────┐  │   │
//! │  │   │   types   │ │   money   │ │ availability │ │ validation│  │   │
//! │  │   │ Sale/Shift│ │   Money   │ │   resolver   │ │   rules   │  │   │
//! │  │   └───────────┘ └───────────┘ └──────────────┘ └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, Payment, InventoryBalance, PosShift, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`availability`] - The pure sellability decision function
//! - [`requests`] - Request records accepted by the engine services
//! - [`validation`] - Fail-fast request validation
//! - [`folio`] - Timestamp-derived human-readable sale codes
//! - [`error`] - Domain error types

pub mod availability;
pub mod error;
pub mod folio;
pub mod money;
pub mod requests;
pub mod types;
pub mod validation;

pub use error::{ItemUnavailability, ValidationError};
pub use money::Money;
pub use types::*;

/// Maximum quantity of a single line item in a sale.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Can be made configurable per-tenant in future versions.
pub const MAX_ITEM_QUANTITY: i64 = 999;
