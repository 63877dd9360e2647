//! In-process API facade with command validation, reply formatting, and the
//! platform collaborator boundary.

mod grant;
mod server;

use bot_core::{PointsEngine, PurchaseError, TierTableError};
use contracts::{
    Accrual, ActivityEvent, ApiError, BotConfig, Command, CommandPayload, CommandReply,
    CommandType, ErrorCode, Event, LedgerSnapshot, MilestoneNotice, TierRecord, SCHEMA_VERSION_V1,
};

pub use grant::{GrantError, LoggingGranter, RoleGranter};
pub use server::{serve, ServerError};

pub struct BotApi {
    engine: PointsEngine,
    reply_log: Vec<CommandReply>,
    granter: Box<dyn RoleGranter>,
}

impl BotApi {
    pub fn from_config(config: BotConfig) -> Result<Self, TierTableError> {
        Self::with_granter(config, Box::new(LoggingGranter))
    }

    pub fn with_granter(
        config: BotConfig,
        granter: Box<dyn RoleGranter>,
    ) -> Result<Self, TierTableError> {
        Ok(Self {
            engine: PointsEngine::from_config(config)?,
            reply_log: Vec::new(),
            granter,
        })
    }

    pub fn record_activity(&mut self, event: &ActivityEvent) -> Result<Accrual, ApiError> {
        if event.schema_version != SCHEMA_VERSION_V1 {
            return Err(ApiError::new(
                ErrorCode::ContractVersionUnsupported,
                "Unsupported schema_version",
                Some(format!(
                    "got={} expected={}",
                    event.schema_version, SCHEMA_VERSION_V1
                )),
            ));
        }
        if event.user_id.trim().is_empty() {
            return Err(ApiError::new(
                ErrorCode::InvalidCommand,
                "activity event requires a user_id",
                None,
            ));
        }

        Ok(self.engine.record_activity(event))
    }

    /// Every inbound command produces exactly one reply. Validation failures
    /// reply too, with the error code attached.
    pub fn handle_command(&mut self, command: Command) -> CommandReply {
        let reply = match self.validate_command(&command) {
            Some(error) => CommandReply::rejected(
                &command,
                "Sorry, that command could not be processed.",
                error,
            ),
            None => self.dispatch(&command),
        };
        self.reply_log.push(reply.clone());
        reply
    }

    fn dispatch(&mut self, command: &Command) -> CommandReply {
        match &command.payload {
            CommandPayload::QueryPoints => {
                let points = self.engine.current_points(&command.user_id);
                CommandReply::replied(command, format!("You have **{points} points**."))
            }
            CommandPayload::QueryAvailableRoles => {
                let available = self.engine.available_roles(&command.user_id);
                if available.is_empty() {
                    CommandReply::replied(command, "You have no roles available to unlock.")
                } else {
                    let names = available
                        .iter()
                        .map(|tier| tier.role_name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    CommandReply::replied(
                        command,
                        format!("You can unlock the following roles: **{names}**."),
                    )
                }
            }
            CommandPayload::QueryAllRoles => {
                CommandReply::replied(command, format_all_roles(self.engine.all_tiers()))
            }
            CommandPayload::PurchaseRole { role_name } => self.purchase(command, role_name),
        }
    }

    fn purchase(&mut self, command: &Command, role_name: &str) -> CommandReply {
        let channel_id = command.channel_id.as_deref();
        match self.engine.purchase_role(
            &command.user_id,
            channel_id,
            role_name,
            command.issued_at_unix,
        ) {
            Ok(receipt) => {
                // The ledger commit stands regardless of the grant outcome;
                // a failed grant stays visible through the event log.
                if let Err(err) = self.granter.grant_role(
                    command.guild_id.as_deref(),
                    &receipt.user_id,
                    &receipt.role_name,
                ) {
                    tracing::warn!(
                        user_id = %receipt.user_id,
                        role_name = %receipt.role_name,
                        error = %err,
                        "platform role grant failed after ledger commit"
                    );
                    self.engine.record_grant_failure(
                        &receipt.user_id,
                        &receipt.role_name,
                        &err.to_string(),
                        command.issued_at_unix,
                    );
                }
                CommandReply::replied(
                    command,
                    format!(
                        "🎉 You have successfully purchased the **{}** role!",
                        receipt.role_name
                    ),
                )
            }
            Err(err) => {
                let (text, error_code) = match &err {
                    PurchaseError::UnknownRole(role) => (
                        format!("The role **{role}** does not exist."),
                        ErrorCode::UnknownRole,
                    ),
                    PurchaseError::AlreadyOwned(role) => (
                        format!("You already have the **{role}** role."),
                        ErrorCode::AlreadyOwned,
                    ),
                    PurchaseError::InsufficientFunds {
                        role_name,
                        shortfall,
                    } => (
                        format!(
                            "You don't have enough points to buy the **{role_name}** role. \
                             You need **{shortfall}** more points."
                        ),
                        ErrorCode::InsufficientFunds,
                    ),
                    PurchaseError::LedgerGuard(_) => (
                        "Sorry, that purchase could not be processed.".to_string(),
                        ErrorCode::InsufficientPoints,
                    ),
                };
                CommandReply::rejected(
                    command,
                    text,
                    ApiError::new(error_code, err.to_string(), None),
                )
            }
        }
    }

    fn validate_command(&self, command: &Command) -> Option<ApiError> {
        if command.schema_version != SCHEMA_VERSION_V1 {
            return Some(ApiError::new(
                ErrorCode::ContractVersionUnsupported,
                "Unsupported schema_version",
                Some(format!(
                    "got={} expected={}",
                    command.schema_version, SCHEMA_VERSION_V1
                )),
            ));
        }

        if command.user_id.trim().is_empty() {
            return Some(ApiError::new(
                ErrorCode::InvalidCommand,
                "command requires a user_id",
                None,
            ));
        }

        if !command_type_matches_payload(command.command_type, &command.payload) {
            return Some(ApiError::new(
                ErrorCode::InvalidCommand,
                "command_type does not match payload variant",
                None,
            ));
        }

        if let CommandPayload::PurchaseRole { role_name } = &command.payload {
            if role_name.trim().is_empty() {
                return Some(ApiError::new(
                    ErrorCode::InvalidCommand,
                    "purchase_role requires a role name",
                    None,
                ));
            }
        }

        None
    }

    pub fn current_points(&mut self, user_id: &str) -> i64 {
        self.engine.current_points(user_id)
    }

    pub fn available_roles(&mut self, user_id: &str) -> Vec<TierRecord> {
        self.engine.available_roles(user_id)
    }

    pub fn all_tiers(&self) -> &[TierRecord] {
        self.engine.all_tiers()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.engine.snapshot()
    }

    pub fn events(&self) -> &[Event] {
        self.engine.events()
    }

    pub fn replies(&self) -> &[CommandReply] {
        &self.reply_log
    }

    /// Expose the underlying engine for direct inspection.
    pub fn engine(&self) -> &PointsEngine {
        &self.engine
    }
}

fn command_type_matches_payload(command_type: CommandType, payload: &CommandPayload) -> bool {
    matches!(
        (command_type, payload),
        (CommandType::QueryPoints, CommandPayload::QueryPoints)
            | (
                CommandType::QueryAvailableRoles,
                CommandPayload::QueryAvailableRoles
            )
            | (CommandType::QueryAllRoles, CommandPayload::QueryAllRoles)
            | (
                CommandType::PurchaseRole,
                CommandPayload::PurchaseRole { .. }
            )
    )
}

/// The channel prompt sent when a user first reaches a tier threshold.
pub fn milestone_text(notice: &MilestoneNotice) -> String {
    format!(
        "You now have **{} points**! Use `/buy-role role:{}` to purchase the **{}** role!",
        notice.points, notice.role_name, notice.role_name
    )
}

fn format_all_roles(tiers: &[TierRecord]) -> String {
    let listing = tiers
        .iter()
        .map(|tier| format!("**{}**: {} points", tier.role_name, tier.point_threshold))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Here are all the roles and their required points:\n{listing}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TierRecord;

    struct FailingGranter;

    impl RoleGranter for FailingGranter {
        fn grant_role(
            &self,
            _guild_id: Option<&str>,
            _user_id: &str,
            role_name: &str,
        ) -> Result<(), GrantError> {
            Err(GrantError::RoleMissing(role_name.to_string()))
        }
    }

    fn two_tier_config() -> BotConfig {
        BotConfig {
            tiers: vec![TierRecord::new("A", 10), TierRecord::new("B", 20)],
            ..BotConfig::default()
        }
    }

    fn api() -> BotApi {
        BotApi::from_config(two_tier_config()).expect("config is valid")
    }

    fn earn(api: &mut BotApi, user_id: &str, count: u64) {
        for offset in 0..count {
            api.record_activity(&ActivityEvent::new(user_id, "chan_general", 1_000 + offset))
                .expect("activity is valid");
        }
    }

    fn command(user_id: &str, command_type: CommandType, payload: CommandPayload) -> Command {
        Command::new("cmd_1", user_id, 9_000, command_type, payload)
    }

    #[test]
    fn points_query_replies_with_balance() {
        let mut api = api();
        earn(&mut api, "user_a", 3);

        let reply = api.handle_command(command(
            "user_a",
            CommandType::QueryPoints,
            CommandPayload::QueryPoints,
        ));
        assert_eq!(reply.text, "You have **3 points**.");
        assert!(reply.error.is_none());
    }

    #[test]
    fn available_roles_reply_wording() {
        let mut api = api();

        let reply = api.handle_command(command(
            "user_a",
            CommandType::QueryAvailableRoles,
            CommandPayload::QueryAvailableRoles,
        ));
        assert_eq!(reply.text, "You have no roles available to unlock.");

        earn(&mut api, "user_a", 25);
        let reply = api.handle_command(command(
            "user_a",
            CommandType::QueryAvailableRoles,
            CommandPayload::QueryAvailableRoles,
        ));
        assert_eq!(reply.text, "You can unlock the following roles: **A, B**.");
    }

    #[test]
    fn all_roles_reply_lists_every_tier() {
        let mut api = api();
        let reply = api.handle_command(command(
            "user_a",
            CommandType::QueryAllRoles,
            CommandPayload::QueryAllRoles,
        ));
        assert_eq!(
            reply.text,
            "Here are all the roles and their required points:\n**A**: 10 points\n**B**: 20 points"
        );
    }

    #[test]
    fn purchase_reply_wording_for_each_outcome() {
        let mut api = api();
        earn(&mut api, "user_a", 12);

        let reply = api.handle_command(command(
            "user_a",
            CommandType::PurchaseRole,
            CommandPayload::PurchaseRole {
                role_name: "Phantom".to_string(),
            },
        ));
        assert_eq!(reply.text, "The role **Phantom** does not exist.");
        assert_eq!(
            reply.error.as_ref().map(|error| error.error_code),
            Some(ErrorCode::UnknownRole)
        );

        let reply = api.handle_command(command(
            "user_a",
            CommandType::PurchaseRole,
            CommandPayload::PurchaseRole {
                role_name: "B".to_string(),
            },
        ));
        assert_eq!(
            reply.text,
            "You don't have enough points to buy the **B** role. You need **8** more points."
        );
        assert_eq!(
            reply.error.as_ref().map(|error| error.error_code),
            Some(ErrorCode::InsufficientFunds)
        );

        let reply = api.handle_command(command(
            "user_a",
            CommandType::PurchaseRole,
            CommandPayload::PurchaseRole {
                role_name: "A".to_string(),
            },
        ));
        assert_eq!(
            reply.text,
            "🎉 You have successfully purchased the **A** role!"
        );
        assert!(reply.error.is_none());

        let reply = api.handle_command(command(
            "user_a",
            CommandType::PurchaseRole,
            CommandPayload::PurchaseRole {
                role_name: "A".to_string(),
            },
        ));
        assert_eq!(reply.text, "You already have the **A** role.");
        assert_eq!(
            reply.error.as_ref().map(|error| error.error_code),
            Some(ErrorCode::AlreadyOwned)
        );
    }

    #[test]
    fn mismatched_payload_is_rejected_without_touching_the_ledger() {
        let mut api = api();

        let reply = api.handle_command(command(
            "user_a",
            CommandType::QueryPoints,
            CommandPayload::PurchaseRole {
                role_name: "A".to_string(),
            },
        ));
        assert_eq!(
            reply.error.as_ref().map(|error| error.error_code),
            Some(ErrorCode::InvalidCommand)
        );
        assert!(api.events().is_empty());
    }

    #[test]
    fn unsupported_schema_version_is_rejected() {
        let mut api = api();
        let mut bad = command("user_a", CommandType::QueryPoints, CommandPayload::QueryPoints);
        bad.schema_version = "0.9".to_string();

        let reply = api.handle_command(bad);
        assert_eq!(
            reply.error.as_ref().map(|error| error.error_code),
            Some(ErrorCode::ContractVersionUnsupported)
        );
    }

    #[test]
    fn grant_failure_keeps_the_deduction_and_records_an_event() {
        let mut api = BotApi::with_granter(two_tier_config(), Box::new(FailingGranter))
            .expect("config is valid");
        earn(&mut api, "user_a", 10);

        let reply = api.handle_command(command(
            "user_a",
            CommandType::PurchaseRole,
            CommandPayload::PurchaseRole {
                role_name: "A".to_string(),
            },
        ));
        assert_eq!(
            reply.text,
            "🎉 You have successfully purchased the **A** role!"
        );
        assert_eq!(api.current_points("user_a"), 0);
        assert!(api
            .events()
            .iter()
            .any(|event| event.event_type == contracts::EventType::RoleGrantFailed));
    }

    #[test]
    fn milestone_text_matches_the_channel_prompt() {
        let notice = MilestoneNotice::new("user_a", "chan_general", "A", 10, 10);
        assert_eq!(
            milestone_text(&notice),
            "You now have **10 points**! Use `/buy-role role:A` to purchase the **A** role!"
        );
    }
}
