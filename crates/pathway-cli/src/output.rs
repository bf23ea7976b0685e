//! Output formatting for the CLI.

use clap::ValueEnum;
use pathway_auth::{visible_tabs, DashboardView, NavTab, ResolvedSessionState, SessionSummary};
use serde::Serialize;
use std::fmt;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format.
pub fn print<T: Serialize + fmt::Display>(value: &T, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            } else {
                println!("{}", value);
            }
        }
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "status": "success", "message": message })
            );
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Resolved session as shown by `status`, `login`, and `watch`.
#[derive(Debug, Serialize)]
pub struct SessionReport {
    #[serde(flatten)]
    pub summary: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardView>,
    pub tabs: Vec<NavTab>,
}

impl From<&ResolvedSessionState> for SessionReport {
    fn from(state: &ResolvedSessionState) -> Self {
        Self {
            summary: SessionSummary::from(state),
            dashboard: DashboardView::for_state(state),
            tabs: visible_tabs(state),
        }
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, value: &str) -> fmt::Result {
    writeln!(f, "{:<10} {}", format!("{}:", label), value)
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.summary;
        let auth = if !summary.resolved {
            "unresolved"
        } else if summary.authenticated {
            "logged in"
        } else {
            "not logged in"
        };
        row(f, "Auth", auth)?;

        if let Some(user_id) = &summary.user_id {
            row(f, "User ID", user_id)?;
        }
        if let Some(email) = &summary.email {
            row(f, "Email", email)?;
        }
        if let Some(role) = summary.role {
            row(f, "Role", role.as_str())?;
        }
        if let Some(dashboard) = self.dashboard {
            row(f, "Dashboard", &format!("{:?}", dashboard).to_lowercase())?;
        }

        let tabs: Vec<String> = self
            .tabs
            .iter()
            .map(|tab| format!("{:?}", tab).to_lowercase())
            .collect();
        write!(f, "{:<10} {}", "Tabs:", tabs.join(", "))
    }
}
