//! Account registry loaded from YAML.
//!
//! The registry is the single source of truth for which accounts the
//! collector tracks. It is loaded once at startup, validated, and treated
//! as immutable for the rest of the run.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Whether an account belongs to an organization or an individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A political party's official account.
    Party,
    /// An individual politician or commentator.
    Personality,
}

impl Category {
    /// Stable slug used in output paths and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Party => "party",
            Category::Personality => "personality",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked account from the registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Platform username, used as the stable account identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Registry category the account is collected under.
    pub category: Category,
    /// Party affiliation, set for personalities that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
}

/// Top-level shape of the accounts YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountsFile {
    pub accounts: Vec<AccountConfig>,
}

impl AccountsFile {
    /// Returns the accounts matching `filter`, or all accounts when the
    /// filter is `None`. Registry order is preserved.
    #[must_use]
    pub fn for_category(&self, filter: Option<Category>) -> Vec<AccountConfig> {
        self.accounts
            .iter()
            .filter(|account| filter.is_none_or(|category| account.category == category))
            .cloned()
            .collect()
    }
}

/// Loads and validates the account registry at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::AccountsFileIo`] when the file cannot be read,
/// [`ConfigError::AccountsFileParse`] when it is not valid YAML for the
/// expected shape, and [`ConfigError::Validation`] when entries are
/// malformed or duplicated.
pub fn load_accounts(path: &Path) -> Result<AccountsFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::AccountsFileIo {
        path: path.display().to_string(),
        source,
    })?;
    let file: AccountsFile = serde_yaml::from_str(&raw)?;
    validate_accounts(&file)?;
    Ok(file)
}

fn validate_accounts(file: &AccountsFile) -> Result<(), ConfigError> {
    if file.accounts.is_empty() {
        return Err(ConfigError::Validation(
            "accounts file contains no accounts".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();
    for account in &file.accounts {
        if account.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "account id must be non-empty".to_string(),
            ));
        }
        if account.id.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "account id '{}' must not contain whitespace",
                account.id
            )));
        }
        if account.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "account '{}' has an empty name",
                account.id
            )));
        }
        if let Some(party) = &account.party {
            if party.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "account '{}' has a blank party affiliation",
                    account.id
                )));
            }
        }
        if !seen_ids.insert(account.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate account id: '{}'",
                account.id
            )));
        }
    }

    Ok(())
}
