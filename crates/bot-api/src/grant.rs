use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    RoleMissing(String),
    Rejected(String),
}

impl fmt::Display for GrantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleMissing(role_name) => {
                write!(f, "role {role_name} does not exist on the platform")
            }
            Self::Rejected(reason) => write!(f, "platform rejected the grant: {reason}"),
        }
    }
}

impl std::error::Error for GrantError {}

/// Outbound boundary for the platform-level role assignment. The real
/// adapter lives with the gateway glue; a failure here never reaches the
/// ledger.
pub trait RoleGranter: Send {
    fn grant_role(
        &self,
        guild_id: Option<&str>,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), GrantError>;
}

/// Default granter for local runs: logs the grant and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingGranter;

impl RoleGranter for LoggingGranter {
    fn grant_role(
        &self,
        guild_id: Option<&str>,
        user_id: &str,
        role_name: &str,
    ) -> Result<(), GrantError> {
        tracing::info!(
            guild_id = guild_id.unwrap_or("-"),
            %user_id,
            %role_name,
            "granting platform role"
        );
        Ok(())
    }
}
