pub mod config;
pub mod resolve;
pub mod validate;

use pricerule_core::catalog::PolicyCatalog;
use pricerule_core::config::AppConfig;
use pricerule_core::domain::context::PolicyContext;
use pricerule_core::domain::policy::CommercialPolicy;
use pricerule_core::errors::ApplicationError;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Serialize)]
struct CommandPayload<'a, T: Serialize> {
    command: &'a str,
    status: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            error.exit_code(),
        )
    }

    /// Successful result whose body fields sit next to `command` and `status`.
    pub fn with_body<T: Serialize>(command: &str, body: &T) -> Self {
        let payload = CommandPayload { command, status: "ok", body };
        match serde_json::to_string_pretty(&payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Candidate policies for a context: the tenant's own and unscoped policies,
/// or the whole catalog when the context names no tenant (or a blank one).
pub(crate) fn load_candidates(
    config: &AppConfig,
    context: &PolicyContext,
) -> Result<Vec<CommercialPolicy>, ApplicationError> {
    let path = config.catalog.policies_path.as_deref().ok_or_else(|| {
        ApplicationError::InvalidInput(
            "no policy catalog given; pass --policies or set catalog.policies_path".to_string(),
        )
    })?;
    let catalog = PolicyCatalog::load(path)?;

    Ok(match context.tenant() {
        Some(tenant_id) => catalog.for_tenant(tenant_id),
        None => catalog.into_policies(),
    })
}
