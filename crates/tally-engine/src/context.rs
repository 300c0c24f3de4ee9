//! # Store Context Resolution
//!
//! Every store-scoped operation starts here: fix the effective store, load
//! the tenant's POS policy, fail closed on cross-store confusion.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  no pos_settings row            → Conflict ("POS not configured")       │
//! │  multi-store off + requested    → Validation (fail closed; a register   │
//! │    store != default               must not silently write cross-store)  │
//! │  multi-store on  + requested    → requested store                       │
//! │  otherwise                      → default store                         │
//! │  resolved store missing/closed  → Validation                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use tally_core::{PosSettings, ValidationError};
use tally_db::Database;

/// The resolved scope of one operation: which store, under which policy.
#[derive(Debug, Clone)]
pub struct StoreContext {
    pub tenant_id: String,
    pub store_id: String,
    pub settings: PosSettings,
}

/// Resolves the effective store for an operation.
///
/// Called at the start of every sale, shift and inventory operation;
/// settings are re-read each time, never cached process-wide.
pub async fn resolve_store_context(
    db: &Database,
    tenant_id: &str,
    requested_store_id: Option<&str>,
) -> EngineResult<StoreContext> {
    let settings = db
        .settings()
        .get_pos_settings(tenant_id)
        .await?
        .ok_or_else(|| EngineError::conflict("POS is not configured for this tenant"))?;

    let store_id = match requested_store_id {
        Some(requested) if settings.multi_store_enabled => requested.to_string(),
        Some(requested) if requested != settings.default_store_id => {
            return Err(EngineError::Validation(ValidationError::InvalidFormat {
                field: "storeId".to_string(),
                reason: "multi-store is disabled; only the default store may be used"
                    .to_string(),
            }));
        }
        _ => settings.default_store_id.clone(),
    };

    let store = db
        .settings()
        .get_store(&store_id)
        .await?
        .filter(|store| store.tenant_id == tenant_id);

    match store {
        Some(store) if store.is_active => {
            debug!(tenant_id, store_id = %store.id, "Store context resolved");
            Ok(StoreContext {
                tenant_id: tenant_id.to_string(),
                store_id: store.id,
                settings,
            })
        }
        Some(store) => Err(EngineError::Validation(ValidationError::InvalidFormat {
            field: "storeId".to_string(),
            reason: format!("store {} is inactive", store.id),
        })),
        None => Err(EngineError::Validation(ValidationError::InvalidFormat {
            field: "storeId".to_string(),
            reason: format!("store {store_id} does not exist"),
        })),
    }
}
