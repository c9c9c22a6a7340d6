use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repository::{Entity, HasLastModified};

use super::role::Role;

/// Stored user record. Identity fields (id, name, email) are immutable after
/// creation; only the role may change, and only through an admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub salt: String,
    pub role: Role,
    #[serde(default)]
    pub team_id: Option<ObjectId>,
    pub created_at: i64,
    pub last_modified: i64,
}

impl Entity for User {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl HasLastModified for User {
    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn set_last_modified(&mut self, timestamp: i64) {
        self.last_modified = timestamp;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub created_at: i64,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
            team_id: user.team_id.map(|id| id.to_hex()),
            created_at: user.created_at,
        }
    }
}
