//! Deterministic points engine: tier table, user ledger, accrual and purchase policies.

pub mod engine;
pub mod ledger;
pub mod tiers;

pub use engine::{PointsEngine, PurchaseError, PurchaseReceipt, RoleState};
pub use ledger::{LedgerError, PointsLedger, UserAccount};
pub use tiers::{TierTable, TierTableError};
