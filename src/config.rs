//! Constants and environment-driven settings.

use crate::error::{BackendFailure, Phase};
use std::path::PathBuf;
use std::time::Duration;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
pub const TEMPLATE_DESCRIPTION: &str = "VPC Stack Generator CLI";
pub const DEFAULT_TEMPLATE_PATH: &str = "template.yaml";
pub const DEFAULT_AWS_CLI: &str = "aws";
/// Pause between remote calls, in milliseconds.
pub const DEFAULT_CALL_PAUSE_MSEC: u64 = 0;
pub const DEFAULT_REPORT_DIR: &str = ".";

/// Run settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub template_path: PathBuf,
    pub aws_cli: String,
    pub aws_profile: Option<String>,
    pub call_pause: Duration,
    pub report_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            aws_cli: DEFAULT_AWS_CLI.to_string(),
            aws_profile: None,
            call_pause: Duration::from_millis(DEFAULT_CALL_PAUSE_MSEC),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Settings, BackendFailure> {
        Settings::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, BackendFailure> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(path) = get("VPC_TEMPLATE_PATH") {
            settings.template_path = PathBuf::from(path);
        }
        if let Some(cli) = get("VPC_AWS_CLI") {
            settings.aws_cli = cli;
        }
        settings.aws_profile = get("VPC_AWS_PROFILE");
        if let Some(pause) = get("VPC_CALL_PAUSE_MSEC") {
            let msec: u64 = pause.trim().parse().map_err(|e| {
                BackendFailure::new(
                    Phase::Configuration,
                    format!("VPC_CALL_PAUSE_MSEC='{pause}': {e}"),
                )
            })?;
            settings.call_pause = Duration::from_millis(msec);
        }
        if let Some(dir) = get("VPC_REPORT_DIR") {
            settings.report_dir = PathBuf::from(dir);
        }

        log::debug!("{settings:?}");
        Ok(settings)
    }
}
