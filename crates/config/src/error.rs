//! Config extraction errors

use figment::providers::{Format, Toml};
use itertools::Itertools;
use std::fmt;

/// A `metaswap.toml` or environment setting that could not be read.
#[derive(Clone, Debug, PartialEq)]
pub struct SettingIssue {
    /// Whether the value came from a toml file rather than the environment or the defaults.
    pub from_file: bool,
    /// Dotted path of the setting, empty when the whole source failed.
    pub setting: String,
    pub message: String,
}

impl fmt::Display for SettingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let origin = if self.from_file { "metaswap.toml error" } else { "metaswap config error" };
        write!(f, "{origin}: {}", self.message)?;
        if !self.setting.is_empty() {
            write!(f, " for setting `{}`", self.setting)?;
        }
        Ok(())
    }
}

/// The [`Config`](crate::Config) could not be extracted from its figment.
///
/// Every figment error is flattened into a [`SettingIssue`], repeats are reported once.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("failed to extract metaswap config:\n{}", .issues.iter().join("\n"))]
pub struct ExtractConfigError {
    pub issues: Vec<SettingIssue>,
}

impl ExtractConfigError {
    pub fn new(error: figment::Error) -> Self {
        let issues = error
            .into_iter()
            .map(|err| SettingIssue {
                from_file: err.metadata.as_ref().is_some_and(|meta| meta.name.contains(Toml::NAME)),
                setting: err.path.join("."),
                message: err.kind.to_string(),
            })
            .unique_by(ToString::to_string)
            .collect();
        Self { issues }
    }
}
