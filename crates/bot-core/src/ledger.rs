use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use contracts::AccountSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    InsufficientPoints {
        user_id: String,
        requested: i64,
        available: i64,
    },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPoints {
                user_id,
                requested,
                available,
            } => write!(
                f,
                "cannot debit {requested} points from {user_id}: balance is {available}"
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAccount {
    pub points: i64,
    pub unlocked_roles: BTreeSet<String>,
    pub last_counted_at_unix: Option<u64>,
}

/// In-memory per-user accounts. Exclusively owned by the engine; all access
/// goes through lookup by user id.
#[derive(Debug, Clone, Default)]
pub struct PointsLedger {
    accounts: BTreeMap<String, UserAccount>,
}

impl PointsLedger {
    /// Returns the account for `user_id`, inserting a zero-valued record on
    /// first access.
    pub fn account(&mut self, user_id: &str) -> &mut UserAccount {
        self.accounts.entry(user_id.to_string()).or_default()
    }

    pub fn credit(&mut self, user_id: &str, delta: i64) -> i64 {
        let account = self.account(user_id);
        account.points += delta;
        account.points
    }

    /// Fails without mutating when `amount` exceeds the balance, so a balance
    /// can never go negative even if the caller skipped its pre-check.
    pub fn debit(&mut self, user_id: &str, amount: i64) -> Result<i64, LedgerError> {
        let account = self.account(user_id);
        if amount > account.points {
            return Err(LedgerError::InsufficientPoints {
                user_id: user_id.to_string(),
                requested: amount,
                available: account.points,
            });
        }
        account.points -= amount;
        Ok(account.points)
    }

    pub fn has_unlocked(&self, user_id: &str, role_name: &str) -> bool {
        self.accounts
            .get(user_id)
            .map(|account| account.unlocked_roles.contains(role_name))
            .unwrap_or(false)
    }

    /// Caller guarantees the role is not already unlocked for this user.
    pub fn mark_unlocked(&mut self, user_id: &str, role_name: &str) {
        self.account(user_id)
            .unlocked_roles
            .insert(role_name.to_string());
    }

    pub fn snapshot_accounts(&self) -> Vec<AccountSnapshot> {
        self.accounts
            .iter()
            .map(|(user_id, account)| AccountSnapshot {
                user_id: user_id.clone(),
                points: account.points,
                unlocked_roles: account.unlocked_roles.iter().cloned().collect(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_access_creates_zero_account() {
        let mut ledger = PointsLedger::default();
        assert!(ledger.is_empty());

        let account = ledger.account("user_a");
        assert_eq!(account.points, 0);
        assert!(account.unlocked_roles.is_empty());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn credit_then_debit_round_trip() {
        let mut ledger = PointsLedger::default();
        assert_eq!(ledger.credit("user_a", 12), 12);
        assert_eq!(ledger.debit("user_a", 10).expect("debit succeeds"), 2);
    }

    #[test]
    fn debit_rejects_overdraw_without_mutating() {
        let mut ledger = PointsLedger::default();
        ledger.credit("user_a", 3);

        let err = ledger.debit("user_a", 5).expect_err("should fail");
        assert_eq!(
            err,
            LedgerError::InsufficientPoints {
                user_id: "user_a".to_string(),
                requested: 5,
                available: 3,
            }
        );
        assert_eq!(ledger.account("user_a").points, 3);
    }

    #[test]
    fn unlock_tracking_is_per_role() {
        let mut ledger = PointsLedger::default();
        assert!(!ledger.has_unlocked("user_a", "Elite"));

        ledger.mark_unlocked("user_a", "Elite");
        assert!(ledger.has_unlocked("user_a", "Elite"));
        assert!(!ledger.has_unlocked("user_a", "Legend"));
        assert!(!ledger.has_unlocked("user_b", "Elite"));
    }
}
