//! Actor identity and role-based capabilities.

use serde::{Deserialize, Serialize};

use super::complaint::Action;

/// Role supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Committee,
    Admin,
}

impl Role {
    /// Returns whether this role holds the capability for `action`.
    ///
    /// Students file and react to complaints, the committee triages them and
    /// the admin works them to resolution. Nobody holds another role's
    /// capabilities.
    pub fn can(self, action: Action) -> bool {
        match action {
            Action::Submit | Action::Upvote | Action::Confirm | Action::Flag => {
                self == Role::Student
            }
            Action::AssignUrgency | Action::Reject => self == Role::Committee,
            Action::Respond | Action::Resolve | Action::ExtendDeadline => self == Role::Admin,
        }
    }

    /// Committee and admin see every complaint, including private ones.
    pub fn sees_private(self) -> bool {
        matches!(self, Role::Committee | Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Committee => write!(f, "committee"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "committee" => Ok(Role::Committee),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An authenticated caller. The engine trusts this value as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn student(id: impl Into<String>) -> Self {
        Self::new(id, Role::Student)
    }

    pub fn committee(id: impl Into<String>) -> Self {
        Self::new(id, Role::Committee)
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, Role::Admin)
    }
}
