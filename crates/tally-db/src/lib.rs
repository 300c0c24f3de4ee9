//! # tally-db: Database Layer for Tally POS
//!
//! SQLite storage for the transactional core: connection pool, embedded
//! migrations, and repositories.
//!
//! ## Design
//! - Reads go through repository methods on the pool.
//! - Writes that must be atomic with other writes take a
//!   `&mut SqliteConnection`, so `tally-engine` can compose them inside one
//!   transaction obtained from [`Database::begin`].
//! - Transient lock contention is classified by [`DbError::is_retryable`];
//!   the engine re-runs the whole operation, which the idempotency-key
//!   design makes safe.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
