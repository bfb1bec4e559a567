pub mod store;

use serde::{Deserialize, Serialize};

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};

/// The durable record of who is logged in and which truck they are tracking.
///
/// Serialized under the fixed keys `user`, `token` and `truckNumber`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(rename = "token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "truckNumber", skip_serializing_if = "Option::is_none")]
    pub truck_number: Option<String>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.token.is_none() && self.truck_number.is_none()
    }

    /// Token used for bearer authentication, empty when nobody is logged in.
    pub fn bearer_token(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }

    /// Drops fields that would violate the session invariants: a token or a
    /// truck without a user is meaningless.
    pub(crate) fn normalized(mut self) -> Self {
        if self.user.is_none() {
            self.token = None;
            self.truck_number = None;
        }
        self
    }

    fn apply(&mut self, patch: SessionPatch) {
        patch.user.apply_to(&mut self.user);
        patch.token.apply_to(&mut self.token);
        patch.truck_number.apply_to(&mut self.truck_number);
    }
}

/// Change to a single session field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FieldUpdate {
    #[default]
    Keep,
    Set(String),
    Unset,
}

impl FieldUpdate {
    fn apply_to(self, field: &mut Option<String>) {
        match self {
            FieldUpdate::Keep => {}
            FieldUpdate::Set(value) => *field = Some(value),
            FieldUpdate::Unset => *field = None,
        }
    }
}

/// Partial session update merged by [`SessionStore::save`]. Fields left at
/// [`FieldUpdate::Keep`] are not touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub user: FieldUpdate,
    pub token: FieldUpdate,
    pub truck_number: FieldUpdate,
}

impl SessionPatch {
    /// A fresh login: new identity, no truck yet.
    pub fn login(user: &str, token: &str) -> Self {
        Self {
            user: FieldUpdate::Set(user.to_string()),
            token: FieldUpdate::Set(token.to_string()),
            truck_number: FieldUpdate::Unset,
        }
    }

    pub fn truck(truck_number: &str) -> Self {
        Self {
            truck_number: FieldUpdate::Set(truck_number.to_string()),
            ..Default::default()
        }
    }

    pub fn forget_truck() -> Self {
        Self {
            truck_number: FieldUpdate::Unset,
            ..Default::default()
        }
    }
}
