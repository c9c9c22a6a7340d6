use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::{
    access_rules::{AccessRules, Read},
    api::notifications::{notify, NewNotification},
    context::GeneralContext,
    default_timestamp,
    entities::{
        audit_log::{AuditAction, AuditEntry, PublicAuditEntry},
        ticket::{Priority, PublicTicket, RequestType, Status, Ticket},
        user::User,
    },
    error::{self, AddKind, ErrorKind},
    repository::Repository,
};

use super::visibility::{self, TicketFilter};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    #[serde(default, alias = "requestType")]
    pub request_type: Option<RequestType>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub requested_dataset: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
}

pub struct TicketService {
    context: GeneralContext,
}

impl TicketService {
    pub fn new(context: GeneralContext) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: CreateTicket) -> error::Result<PublicTicket> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;
        let users = self.context.try_get_repository::<User>()?;
        let audit_log = self.context.try_get_repository::<AuditEntry>()?;

        let Some(requester_id) = auth.id() else {
            return Err(anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized));
        };

        if request.title.trim().is_empty() {
            return Err(anyhow::anyhow!("Title must not be empty").kind(ErrorKind::ValidationError));
        }
        if request.description.trim().is_empty() {
            return Err(
                anyhow::anyhow!("Description must not be empty").kind(ErrorKind::ValidationError)
            );
        }

        if users
            .find("id", &Bson::ObjectId(requester_id))
            .await?
            .is_none()
        {
            return Err(anyhow::anyhow!("Requester not found").kind(ErrorKind::NotFound));
        }

        let ticket = Ticket {
            id: ObjectId::new(),
            title: request.title,
            description: request.description,
            request_type: request.request_type.unwrap_or(RequestType::Access),
            priority: request.priority.unwrap_or(Priority::Low),
            status: Status::Open,
            requester_id,
            assigned_to: None,
            requested_dataset: request.requested_dataset,
            due_date: request.due_date,
            created_at: default_timestamp(),
            last_modified: default_timestamp(),
        };

        tickets.insert(&ticket).await?;

        let entry = AuditEntry {
            id: ObjectId::new(),
            ticket_id: ticket.id,
            action: AuditAction::Created,
            old_value: None,
            new_value: Some(ticket.status.stringify().to_string()),
            updated_by: Some(requester_id),
            timestamp: default_timestamp(),
        };

        if let Err(err) = audit_log.insert(&entry).await {
            if let Err(rollback_err) = tickets.delete("id", &ticket.id).await {
                log::error!(
                    "Failed to roll back ticket {}: {}",
                    ticket.id,
                    rollback_err
                );
            }
            return Err(err);
        }

        notify(
            &self.context,
            NewNotification::new(
                requester_id,
                "Ticket created".to_string(),
                format!("Your ticket \"{}\" has been created", ticket.title),
            ),
        );

        PublicTicket::new(&self.context, ticket).await
    }

    pub async fn find(&self, id: ObjectId) -> error::Result<PublicTicket> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;

        let Some(ticket) = tickets.find("id", &Bson::ObjectId(id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !Read.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not allowed to read this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        PublicTicket::new(&self.context, ticket).await
    }

    pub async fn list(&self, filter: TicketFilter) -> error::Result<Vec<PublicTicket>> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;

        let all = tickets.find_all(0, u32::MAX).await?;
        let scoped = visibility::scope(&auth, all)?;

        self.stringify(visibility::apply(&filter, scoped)).await
    }

    pub async fn open_pool(&self) -> error::Result<Vec<PublicTicket>> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;

        let all = tickets.find_all(0, u32::MAX).await?;

        self.stringify(visibility::open_pool(&auth, all)?).await
    }

    pub async fn assigned_to(&self, user_id: ObjectId) -> error::Result<Vec<PublicTicket>> {
        let auth = self.context.auth();

        if !auth.full_access() && auth.id() != Some(user_id) {
            return Err(
                anyhow::anyhow!("User is not allowed to read this queue")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        let tickets = self.context.try_get_repository::<Ticket>()?;
        let assigned = tickets
            .find_many("assigned_to", &Bson::ObjectId(user_id))
            .await?;

        self.stringify(assigned).await
    }

    /// Audit trail for a ticket, newest first.
    pub async fn history(&self, ticket_id: ObjectId) -> error::Result<Vec<PublicAuditEntry>> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;
        let audit_log = self.context.try_get_repository::<AuditEntry>()?;

        let Some(ticket) = tickets.find("id", &Bson::ObjectId(ticket_id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !Read.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not allowed to read this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        let mut entries = audit_log
            .find_many("ticket_id", &Bson::ObjectId(ticket_id))
            .await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn stringify(&self, tickets: Vec<Ticket>) -> error::Result<Vec<PublicTicket>> {
        let mut public_tickets = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            public_tickets.push(PublicTicket::new(&self.context, ticket).await?);
        }
        Ok(public_tickets)
    }
}
