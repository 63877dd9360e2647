//! v1 cross-boundary contracts for the points engine, API surface, and gateway glue.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// One unlockable reward level: a role name and the point price to unlock it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierRecord {
    pub role_name: String,
    pub point_threshold: i64,
}

impl TierRecord {
    pub fn new(role_name: impl Into<String>, point_threshold: i64) -> Self {
        Self {
            role_name: role_name.into(),
            point_threshold,
        }
    }
}

/// The stock tier table shipped with the bot.
pub fn default_tiers() -> Vec<TierRecord> {
    vec![
        TierRecord::new("Well-Known", 10),
        TierRecord::new("Respected", 20),
        TierRecord::new("Elite", 30),
        TierRecord::new("Legend", 50),
        TierRecord::new("Divine", 100),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotConfig {
    pub schema_version: String,
    pub bot_id: String,
    pub points_per_message: i64,
    /// Minimum seconds between counted activity events per user. 0 disables
    /// the cooldown and every qualifying message counts.
    #[serde(default)]
    pub accrual_cooldown_secs: u64,
    pub tiers: Vec<TierRecord>,
    pub notes: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            bot_id: "bot_local_001".to_string(),
            points_per_message: 1,
            accrual_cooldown_secs: 0,
            tiers: default_tiers(),
            notes: None,
        }
    }
}

/// One qualifying user action, delivered once per action by the gateway glue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityEvent {
    pub schema_version: String,
    pub user_id: String,
    pub channel_id: String,
    pub observed_at_unix: u64,
}

impl ActivityEvent {
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        observed_at_unix: u64,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            observed_at_unix,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    QueryPoints,
    QueryAvailableRoles,
    QueryAllRoles,
    PurchaseRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    QueryPoints,
    QueryAvailableRoles,
    QueryAllRoles,
    PurchaseRole { role_name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub schema_version: String,
    pub command_id: String,
    pub user_id: String,
    pub channel_id: Option<String>,
    /// Platform guild the command was issued from; consumed by the outbound
    /// role grant, never by the ledger.
    pub guild_id: Option<String>,
    pub issued_at_unix: u64,
    pub command_type: CommandType,
    pub payload: CommandPayload,
}

impl Command {
    pub fn new(
        command_id: impl Into<String>,
        user_id: impl Into<String>,
        issued_at_unix: u64,
        command_type: CommandType,
        payload: CommandPayload,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command_id.into(),
            user_id: user_id.into(),
            channel_id: None,
            guild_id: None,
            issued_at_unix,
            command_type,
            payload,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    UnknownRole,
    AlreadyOwned,
    InsufficientFunds,
    InsufficientPoints,
    InvalidCommand,
    InvalidQuery,
    ContractVersionUnsupported,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

/// The single reply produced for every inbound command, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandReply {
    pub schema_version: String,
    pub command_id: String,
    pub user_id: String,
    pub channel_id: Option<String>,
    pub text: String,
    pub error: Option<ApiError>,
}

impl CommandReply {
    pub fn replied(command: &Command, text: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            user_id: command.user_id.clone(),
            channel_id: command.channel_id.clone(),
            text: text.into(),
            error: None,
        }
    }

    pub fn rejected(command: &Command, text: impl Into<String>, error: ApiError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            command_id: command.command_id.clone(),
            user_id: command.user_id.clone(),
            channel_id: command.channel_id.clone(),
            text: text.into(),
            error: Some(error),
        }
    }
}

/// Informational prompt emitted when a user's total first reaches a tier
/// threshold. Reaching a threshold never unlocks the role by itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilestoneNotice {
    pub schema_version: String,
    pub user_id: String,
    pub channel_id: String,
    pub role_name: String,
    pub points: i64,
    pub threshold: i64,
}

impl MilestoneNotice {
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        role_name: impl Into<String>,
        points: i64,
        threshold: i64,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            role_name: role_name.into(),
            points,
            threshold,
        }
    }
}

/// Outcome of one activity event: whether it counted, the resulting total,
/// and any milestone prompts it produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Accrual {
    pub schema_version: String,
    pub user_id: String,
    pub counted: bool,
    pub new_total: i64,
    pub milestones: Vec<MilestoneNotice>,
}

impl Accrual {
    pub fn counted(
        user_id: impl Into<String>,
        new_total: i64,
        milestones: Vec<MilestoneNotice>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            user_id: user_id.into(),
            counted: true,
            new_total,
            milestones,
        }
    }

    pub fn not_counted(user_id: impl Into<String>, current_total: i64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            user_id: user_id.into(),
            counted: false,
            new_total: current_total,
            milestones: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PointsAccrued,
    MilestoneReached,
    RolePurchased,
    RoleGrantFailed,
}

/// Append-only audit log entry recorded by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub event_id: String,
    pub sequence: u64,
    pub observed_at_unix: u64,
    pub event_type: EventType,
    pub user_id: String,
    pub channel_id: Option<String>,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub user_id: String,
    pub points: i64,
    pub unlocked_roles: Vec<String>,
}

impl fmt::Display for AccountSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user_id={} points={} unlocked=[{}]",
            self.user_id,
            self.points,
            self.unlocked_roles.join(", ")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub schema_version: String,
    pub bot_id: String,
    pub generated_at_sequence: u64,
    pub accounts: Vec<AccountSnapshot>,
}

/// Generic projection envelope returned by the read-only API routes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub schema_version: String,
    pub query_type: String,
    pub generated_at_sequence: u64,
    pub data: Value,
}
