/// Closed set of account roles
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Exact, case-sensitive match against the role names
    pub fn from_name(s: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|role| role.as_str() == s)
    }
}

/// True iff `role` is non-empty and one of the known roles
pub fn is_valid_role(role: &str) -> bool {
    Role::from_name(role).is_some()
}

/// Role used for authorization: the stored role, or `user` when unset
pub fn effective_role(stored: &str) -> &str {
    if stored.is_empty() {
        Role::User.as_str()
    } else {
        stored
    }
}
