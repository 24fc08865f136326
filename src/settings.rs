#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    checkio::{CheckiOAccount, CheckiOPlatform},
    hyperskill::HyperskillAccount,
    stepik::StepikAccount,
};

/// Accounts and new-course notifier state kept between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Logged-in Stepik user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepik_account:     Option<StepikAccount>,
    /// Logged-in CheckiO users by platform.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checkio_accounts:   BTreeMap<CheckiOPlatform, CheckiOAccount>,
    /// Logged-in Hyperskill user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperskill_account: Option<HyperskillAccount>,
    /// When new courses were last looked for.
    #[serde(default)]
    pub last_time_checked:  DateTime<Utc>,
    /// Ids of courses already announced.
    #[serde(default)]
    pub shown_course_ids:   BTreeSet<u64>,
}

impl Settings {
    /// Reads settings from `path`; a missing file gives defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Could not parse settings in {}", path.display()))
    }

    /// Writes settings to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("Could not serialize settings")?;
        std::fs::write(path, text)
            .with_context(|| format!("Could not write settings to {}", path.display()))
    }
}
