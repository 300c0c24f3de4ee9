//! # Loyalty Points Reversal Notifier
//!
//! Best-effort collaborator contract. When a sale that awarded points is
//! voided, the coordinator asks the external loyalty engine to claw them
//! back - strictly after the void has committed, never inside the
//! transaction, and a failure there is logged, not surfaced.

use async_trait::async_trait;
use tracing::info;

/// Contract for the external loyalty points engine.
#[async_trait]
pub trait PointsReversalNotifier: Send + Sync {
    /// Requests reversal of `points` awarded by `sale_id`. Must not panic;
    /// errors are the implementation's to swallow and log.
    async fn request_reversal(&self, tenant_id: &str, sale_id: &str, points: i64);
}

/// Notifier for deployments without a loyalty engine; logs and moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPointsNotifier;

#[async_trait]
impl PointsReversalNotifier for NoopPointsNotifier {
    async fn request_reversal(&self, tenant_id: &str, sale_id: &str, points: i64) {
        info!(tenant_id, sale_id, points, "Points reversal requested (noop)");
    }
}

