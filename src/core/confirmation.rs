//! Explicit confirmation for irreversible admin actions.

use crate::errors::{Error, Result};
use serde::Deserialize;

/// Whether the user confirmed an irreversible action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    /// The user accepted the warning
    Confirmed,
    /// No confirmation was given
    #[default]
    NotConfirmed,
}

impl Confirmation {
    /// Maps a `confirm` request flag to a confirmation
    #[must_use]
    pub const fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::NotConfirmed
        }
    }

    /// Fails unless the action was confirmed
    ///
    /// # Errors
    /// Returns `Error::ConfirmationRequired` naming `action`
    pub fn require(self, action: &str) -> Result<()> {
        match self {
            Self::Confirmed => Ok(()),
            Self::NotConfirmed => Err(Error::ConfirmationRequired {
                action: action.to_string(),
            }),
        }
    }
}

/// `{"confirm": true}` / `?confirm=true` as sent by the admin panel
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ConfirmFlag {
    /// Set once the user accepted the warning dialog
    #[serde(default)]
    pub confirm: bool,
}

impl From<ConfirmFlag> for Confirmation {
    fn from(flag: ConfirmFlag) -> Self {
        Self::from_flag(flag.confirm)
    }
}
