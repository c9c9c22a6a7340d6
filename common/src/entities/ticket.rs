use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    context::GeneralContext,
    error::{self, AddKind, ErrorKind},
    repository::{Entity, HasLastModified},
};

use super::user::{PublicUser, User};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Status {
    #[serde(rename = "OPEN", alias = "open", alias = "Open")]
    Open,
    #[serde(rename = "INPROGRESS", alias = "inprogress", alias = "InProgress")]
    InProgress,
    #[serde(rename = "ONHOLD", alias = "onhold", alias = "OnHold")]
    OnHold,
    #[serde(rename = "COMPLETED", alias = "completed", alias = "Completed")]
    Completed,
    #[serde(rename = "REJECTED", alias = "rejected", alias = "Rejected")]
    Rejected,
}

impl Status {
    pub fn parse(s: &str) -> error::Result<Status> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Status::Open),
            "inprogress" => Ok(Status::InProgress),
            "onhold" => Ok(Status::OnHold),
            "completed" => Ok(Status::Completed),
            "rejected" => Ok(Status::Rejected),
            _ => Err(anyhow::anyhow!("Invalid status: {}", s).kind(ErrorKind::ValidationError)),
        }
    }

    pub fn stringify(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::InProgress => "INPROGRESS",
            Status::OnHold => "ONHOLD",
            Status::Completed => "COMPLETED",
            Status::Rejected => "REJECTED",
        }
    }

    /// Completed and rejected tickets accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Rejected)
    }

    pub fn can_transition(&self, target: &Status) -> bool {
        match (self, target) {
            (Status::Open, Status::InProgress) => true,
            (Status::Open, Status::Rejected) => true,
            (Status::InProgress, Status::OnHold) => true,
            (Status::InProgress, Status::Completed) => true,
            (Status::InProgress, Status::Rejected) => true,
            (Status::OnHold, Status::InProgress) => true,
            (Status::OnHold, Status::Rejected) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Priority {
    #[serde(rename = "LOW", alias = "low", alias = "Low")]
    Low,
    #[serde(rename = "MEDIUM", alias = "medium", alias = "Medium")]
    Medium,
    #[serde(rename = "HIGH", alias = "high", alias = "High")]
    High,
    // the legacy client used "critical" and "URGENT" interchangeably
    #[serde(
        rename = "URGENT",
        alias = "urgent",
        alias = "Urgent",
        alias = "CRITICAL",
        alias = "critical",
        alias = "Critical"
    )]
    Urgent,
}

impl Priority {
    pub fn parse(s: &str) -> error::Result<Priority> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" => Ok(Priority::Urgent),
            _ => Err(anyhow::anyhow!("Invalid priority: {}", s).kind(ErrorKind::ValidationError)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum RequestType {
    #[serde(rename = "ACCESS", alias = "access", alias = "Access")]
    Access,
    #[serde(rename = "ISSUE", alias = "issue", alias = "Issue")]
    Issue,
}

impl RequestType {
    pub fn parse(s: &str) -> error::Result<RequestType> {
        match s.to_lowercase().as_str() {
            "access" => Ok(RequestType::Access),
            "issue" => Ok(RequestType::Issue),
            _ => {
                Err(anyhow::anyhow!("Invalid request type: {}", s).kind(ErrorKind::ValidationError))
            }
        }
    }
}

/// Stored ticket record. The requester never changes; the assignee and the
/// status change only through the assignment and status transition services,
/// which pair every mutation with an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub request_type: RequestType,
    pub priority: Priority,
    pub status: Status,
    pub requester_id: ObjectId,
    #[serde(default)]
    pub assigned_to: Option<ObjectId>,
    #[serde(default)]
    pub requested_dataset: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    pub created_at: i64,
    pub last_modified: i64,
}

impl Entity for Ticket {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl HasLastModified for Ticket {
    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn set_last_modified(&mut self, timestamp: i64) {
        self.last_modified = timestamp;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PublicTicket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub request_type: RequestType,
    pub priority: Priority,
    pub status: Status,
    pub requester: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<PublicUser>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_dataset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub created_at: i64,
    pub last_modified: i64,
}

impl PublicTicket {
    pub async fn new(context: &GeneralContext, ticket: Ticket) -> error::Result<PublicTicket> {
        let users = context.try_get_repository::<User>()?;

        let requester = users
            .find("id", &Bson::ObjectId(ticket.requester_id))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Requester not found").kind(ErrorKind::NotFound))?;

        let assigned_to = match ticket.assigned_to {
            Some(id) => users.find("id", &Bson::ObjectId(id)).await?.map(Into::into),
            None => None,
        };

        Ok(PublicTicket {
            id: ticket.id.to_hex(),
            title: ticket.title,
            description: ticket.description,
            request_type: ticket.request_type,
            priority: ticket.priority,
            status: ticket.status,
            requester: requester.into(),
            assigned_to,
            requested_dataset: ticket.requested_dataset,
            due_date: ticket.due_date,
            created_at: ticket.created_at,
            last_modified: ticket.last_modified,
        })
    }
}
