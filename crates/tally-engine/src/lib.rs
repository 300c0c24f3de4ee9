//! # tally-engine: Transactional Services for Tally POS
//!
//! The services the (out-of-scope) REST controllers talk to. Owns
//! transactions, the retry policy around them, and the collaborator seams.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            REST Controllers (out of scope)                              │
//! │                          │                                              │
//! │  ┌───────────────────────▼─────────────────────────────────────────┐   │
//! │  │                ★ tally-engine (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌────────────────┐ ┌────────────────┐ ┌────────────────┐      │   │
//! │  │  │ SaleCoordinator│ │ InventoryLedger│ │  ShiftLedger   │      │   │
//! │  │  │ create / void  │ │ consume/reverse│ │ open/preview/  │      │   │
//! │  │  │ / reverse      │ │ / set / query  │ │ close/current  │      │   │
//! │  │  └───────┬────────┘ └───────┬────────┘ └───────┬────────┘      │   │
//! │  │          └────── store context ── retry ───────┘               │   │
//! │  │          seams: Clock, PointsReversalNotifier                  │   │
//! │  └───────────────────────┬─────────────────────────────────────────┘   │
//! │                          │                                              │
//! │         tally-db (storage)      tally-core (pure logic)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operation Surface
//!
//! - [`sale::SaleCoordinator`] - `create_sale`, `void_sale`, `reverse_for_void`
//! - [`shift::ShiftLedger`] - `open_shift`, `close_preview`, `close_shift`,
//!   `current_shift`
//! - [`inventory::InventoryLedger`] - `set_on_hand`, `query_balances` (plus
//!   the tx-scoped consume/reverse used by the sale flows)
//! - [`context::resolve_store_context`] - effective store + policy

pub mod clock;
pub mod context;
pub mod error;
pub mod inventory;
pub mod points;
pub mod retry;
pub mod sale;
pub mod shift;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::{resolve_store_context, StoreContext};
pub use error::{EngineError, EngineResult, ErrorCode};
pub use inventory::InventoryLedger;
pub use points::{NoopPointsNotifier, PointsReversalNotifier};
pub use sale::{SaleCoordinator, SaleResponse, VoidResponse};
pub use shift::{CloseShiftResponse, ClosePreviewResponse, ShiftLedger, ShiftResponse};
