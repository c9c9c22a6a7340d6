use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repository::{Entity, HasLastModified};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum AuditAction {
    #[serde(rename = "CREATED")]
    Created,
    #[serde(rename = "ASSIGNED")]
    Assigned,
    #[serde(rename = "STATUS_CHANGED")]
    StatusChanged,
}

/// Immutable record of one state-changing action on a ticket. Written in the
/// same logical transaction as the mutation it describes; a mutation without
/// its audit row is never observable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub id: ObjectId,
    pub ticket_id: ObjectId,
    pub action: AuditAction,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    /// None means the change was applied by the system itself.
    #[serde(default)]
    pub updated_by: Option<ObjectId>,
    pub timestamp: i64,
}

impl Entity for AuditEntry {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl HasLastModified for AuditEntry {
    fn last_modified(&self) -> i64 {
        self.timestamp
    }

    fn set_last_modified(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PublicAuditEntry {
    pub id: String,
    pub ticket_id: String,
    pub action: AuditAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub timestamp: i64,
}

impl From<AuditEntry> for PublicAuditEntry {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id.to_hex(),
            ticket_id: entry.ticket_id.to_hex(),
            action: entry.action,
            old_value: entry.old_value,
            new_value: entry.new_value,
            updated_by: entry.updated_by.map(|id| id.to_hex()),
            timestamp: entry.timestamp,
        }
    }
}
