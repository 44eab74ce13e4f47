//! Author metadata carried in kind-0 events.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub nip05: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub lud16: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Profile {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// `"<display_name> (<name>)"`; never empty, degrades to `" ()"`
    pub fn attribution(&self) -> String {
        format!(
            "{} ({})",
            self.display_name.as_deref().unwrap_or_default(),
            self.name.as_deref().unwrap_or_default()
        )
    }

    /// Portrait reference, if the profile has a non-blank one
    pub fn portrait(&self) -> Option<&str> {
        self.picture.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}
