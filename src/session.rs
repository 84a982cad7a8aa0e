//! Identity supplied by the external auth provider
//!
//! The session decides where the inventory lives: a remote per-user record when
//! identified, the on-device record otherwise.

use serde::{Deserialize, Serialize};

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Current session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Identified(Identity),
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Identified(identity) => Some(&identity.user_id),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Session::Anonymous => None,
            Session::Identified(identity) => Some(identity),
        }
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, Session::Identified(_))
    }
}
