// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standard account, assigned at signup.
    #[default]
    Athlete,
    Scout,
    Coach,
    Admin,
}

impl Role {
    /// Roles allowed to change other players' stats and verify achievements.
    pub const STAFF: &'static [Role] = &[Role::Coach, Role::Admin];
    pub const ADMIN_ONLY: &'static [Role] = &[Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Athlete => "athlete",
            Role::Scout => "scout",
            Role::Coach => "coach",
            Role::Admin => "admin",
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Role::Coach | Role::Admin)
    }

    /// Whether this role is a member of `allowed`.
    pub fn is_allowed(self, allowed: &[Role]) -> bool {
        allowed.contains(&self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
