use std::fmt;

use contracts::{
    Accrual, ActivityEvent, BotConfig, Event, EventType, LedgerSnapshot, MilestoneNotice,
    TierRecord, SCHEMA_VERSION_V1,
};
use serde_json::{json, Value};

use crate::ledger::{LedgerError, PointsLedger};
use crate::tiers::{TierTable, TierTableError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseError {
    UnknownRole(String),
    AlreadyOwned(String),
    InsufficientFunds { role_name: String, shortfall: i64 },
    LedgerGuard(LedgerError),
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRole(role_name) => {
                write!(f, "role {role_name} is not in the tier table")
            }
            Self::AlreadyOwned(role_name) => write!(f, "role {role_name} is already unlocked"),
            Self::InsufficientFunds {
                role_name,
                shortfall,
            } => write!(f, "need {shortfall} more points for role {role_name}"),
            Self::LedgerGuard(err) => write!(f, "ledger rejected deduction: {err}"),
        }
    }
}

impl std::error::Error for PurchaseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub user_id: String,
    pub role_name: String,
    pub price: i64,
    pub new_total: i64,
}

/// Per-(user, role) standing. Eligible and Owned are reachable from Locked;
/// Owned is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    Locked,
    Eligible,
    Owned,
}

/// The points store plus the policies that mutate it. Callers serialize
/// access; no operation here suspends or blocks.
#[derive(Debug)]
pub struct PointsEngine {
    config: BotConfig,
    tiers: TierTable,
    ledger: PointsLedger,
    event_log: Vec<Event>,
    next_sequence: u64,
}

impl PointsEngine {
    pub fn from_config(config: BotConfig) -> Result<Self, TierTableError> {
        let tiers = TierTable::from_records(config.tiers.clone())?;
        Ok(Self {
            config,
            tiers,
            ledger: PointsLedger::default(),
            event_log: Vec::new(),
            next_sequence: 0,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn bot_id(&self) -> &str {
        &self.config.bot_id
    }

    /// Counts one qualifying activity event and reports any tiers whose
    /// thresholds the new total has reached while still unpurchased. Crossing
    /// a threshold never unlocks the role or deducts points.
    pub fn record_activity(&mut self, event: &ActivityEvent) -> Accrual {
        let cooldown = self.config.accrual_cooldown_secs;
        let account = self.ledger.account(&event.user_id);

        if cooldown > 0 {
            if let Some(last_counted) = account.last_counted_at_unix {
                if event.observed_at_unix < last_counted.saturating_add(cooldown) {
                    return Accrual::not_counted(event.user_id.clone(), account.points);
                }
            }
        }
        account.last_counted_at_unix = Some(event.observed_at_unix);

        let delta = self.config.points_per_message;
        let new_total = self.ledger.credit(&event.user_id, delta);
        let old_total = new_total - delta;
        self.push_event(
            EventType::PointsAccrued,
            &event.user_id,
            Some(&event.channel_id),
            event.observed_at_unix,
            Some(json!({ "delta": delta, "new_total": new_total })),
        );

        // One notice per threshold this increment newly crossed. The unlocked
        // check reads current ledger state, not a pre-increment snapshot;
        // notices follow tier declaration order.
        let tiers = self.tiers.records().to_vec();
        let mut milestones = Vec::new();
        for tier in &tiers {
            if new_total >= tier.point_threshold
                && old_total < tier.point_threshold
                && !self.ledger.has_unlocked(&event.user_id, &tier.role_name)
            {
                self.push_event(
                    EventType::MilestoneReached,
                    &event.user_id,
                    Some(&event.channel_id),
                    event.observed_at_unix,
                    Some(json!({
                        "role_name": &tier.role_name,
                        "points": new_total,
                        "threshold": tier.point_threshold,
                    })),
                );
                milestones.push(MilestoneNotice::new(
                    event.user_id.clone(),
                    event.channel_id.clone(),
                    tier.role_name.clone(),
                    new_total,
                    tier.point_threshold,
                ));
            }
        }

        Accrual::counted(event.user_id.clone(), new_total, milestones)
    }

    /// Spends `threshold` points to unlock `role_name`. Each failure is a
    /// distinct terminal outcome; on success the deduction and the unlock
    /// commit together with no observable intermediate state.
    pub fn purchase_role(
        &mut self,
        user_id: &str,
        channel_id: Option<&str>,
        role_name: &str,
        at_unix: u64,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let Some(price) = self.tiers.threshold_of(role_name) else {
            return Err(PurchaseError::UnknownRole(role_name.to_string()));
        };

        if self.ledger.has_unlocked(user_id, role_name) {
            return Err(PurchaseError::AlreadyOwned(role_name.to_string()));
        }

        let points = self.ledger.account(user_id).points;
        if points < price {
            return Err(PurchaseError::InsufficientFunds {
                role_name: role_name.to_string(),
                shortfall: price - points,
            });
        }

        let new_total = self
            .ledger
            .debit(user_id, price)
            .map_err(PurchaseError::LedgerGuard)?;
        self.ledger.mark_unlocked(user_id, role_name);

        self.push_event(
            EventType::RolePurchased,
            user_id,
            channel_id,
            at_unix,
            Some(json!({
                "role_name": role_name,
                "price": price,
                "new_total": new_total,
            })),
        );

        Ok(PurchaseReceipt {
            user_id: user_id.to_string(),
            role_name: role_name.to_string(),
            price,
            new_total,
        })
    }

    /// Records that the platform-side grant for an already-committed purchase
    /// failed. The deduction is not rolled back.
    pub fn record_grant_failure(
        &mut self,
        user_id: &str,
        role_name: &str,
        reason: &str,
        at_unix: u64,
    ) {
        self.push_event(
            EventType::RoleGrantFailed,
            user_id,
            None,
            at_unix,
            Some(json!({ "role_name": role_name, "reason": reason })),
        );
    }

    pub fn current_points(&mut self, user_id: &str) -> i64 {
        self.ledger.account(user_id).points
    }

    /// Tiers currently in the Eligible state for this user, in declaration
    /// order.
    pub fn available_roles(&mut self, user_id: &str) -> Vec<TierRecord> {
        let points = self.ledger.account(user_id).points;
        self.tiers
            .records()
            .iter()
            .filter(|tier| {
                points >= tier.point_threshold
                    && !self.ledger.has_unlocked(user_id, &tier.role_name)
            })
            .cloned()
            .collect()
    }

    pub fn all_tiers(&self) -> &[TierRecord] {
        self.tiers.records()
    }

    pub fn role_state(&mut self, user_id: &str, role_name: &str) -> Option<RoleState> {
        let threshold = self.tiers.threshold_of(role_name)?;
        if self.ledger.has_unlocked(user_id, role_name) {
            return Some(RoleState::Owned);
        }
        let points = self.ledger.account(user_id).points;
        Some(if points >= threshold {
            RoleState::Eligible
        } else {
            RoleState::Locked
        })
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            bot_id: self.config.bot_id.clone(),
            generated_at_sequence: self.next_sequence,
            accounts: self.ledger.snapshot_accounts(),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    fn push_event(
        &mut self,
        event_type: EventType,
        user_id: &str,
        channel_id: Option<&str>,
        observed_at_unix: u64,
        details: Option<Value>,
    ) -> String {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let event_id = format!("evt:{sequence}");
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            event_id: event_id.clone(),
            sequence,
            observed_at_unix,
            event_type,
            user_id: user_id.to_string(),
            channel_id: channel_id.map(str::to_string),
            details,
        });
        event_id
    }
}
