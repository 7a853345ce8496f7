//! Well-known role names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use authgate_core::AppError;

/// Roles recognised by the service.
///
/// Identities store role names as plain strings; unknown names are kept but
/// never match a `Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrator.
    Admin,
    /// Support staff with read access to all projects.
    Support,
    /// Project manager.
    Manager,
    /// Regular user.
    User,
    /// Machine account using tokens.
    Api,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Support => "support",
            Self::Manager => "manager",
            Self::User => "user",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "support" => Ok(Self::Support),
            "manager" => Ok(Self::Manager),
            "user" => Ok(Self::User),
            "api" => Ok(Self::Api),
            _ => Err(AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: admin, support, manager, user, api"
            ))),
        }
    }
}
