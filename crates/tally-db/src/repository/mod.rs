//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Engine Service                                                         │
//! │       │                                                                 │
//! │       │  db.sales().get_by_client_sale_id(...)      (pool read)        │
//! │       │  SaleRepository::insert_sale(&mut tx, ...)  (tx write)         │
//! │       ▼                                                                 │
//! │  Repository ── SQL ──► SQLite                                           │
//! │                                                                         │
//! │  Writes that must be atomic with other writes are associated            │
//! │  functions over `&mut SqliteConnection`; the engine owns the            │
//! │  transaction and the commit.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - product/extra/option reads, overrides
//! - [`sale::SaleRepository`] - sale, items, payments, breakdowns
//! - [`inventory::InventoryRepository`] - balances and adjustment ledger
//! - [`shift::ShiftRepository`] - register shift lifecycle
//! - [`settings::SettingsRepository`] - POS settings and store directory
//! - [`audit::AuditRepository`] - append-only audit log

pub mod audit;
pub mod catalog;
pub mod inventory;
pub mod sale;
pub mod settings;
pub mod shift;
