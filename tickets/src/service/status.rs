use mongodb::bson::{oid::ObjectId, Bson};

use common::{
    access_rules::{AccessRules, Edit},
    api::notifications::{notify, NewNotification},
    context::GeneralContext,
    default_timestamp,
    entities::{
        audit_log::{AuditAction, AuditEntry},
        ticket::{PublicTicket, Status, Ticket},
    },
    error::{self, AddKind, ErrorKind},
    repository::Repository,
};

use super::commit_with_audit;

pub struct StatusService {
    context: GeneralContext,
}

impl StatusService {
    pub fn new(context: GeneralContext) -> Self {
        Self { context }
    }

    /// Moves a ticket through the state machine. Terminal tickets accept
    /// nothing; a transition to the current status of a live ticket is a
    /// no-op and leaves no audit row.
    pub async fn change(&self, ticket_id: ObjectId, target: Status) -> error::Result<PublicTicket> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;

        let Some(mut ticket) = tickets.find("id", &Bson::ObjectId(ticket_id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !Edit.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not allowed to change this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        let current = ticket.status;

        if current.is_terminal() {
            return Err(anyhow::anyhow!(
                "Ticket is {}, no further transitions are allowed",
                current.stringify()
            )
            .kind(ErrorKind::InvalidTransition));
        }

        if target == current {
            return PublicTicket::new(&self.context, ticket).await;
        }

        if !current.can_transition(&target) {
            return Err(anyhow::anyhow!(
                "Cannot move a ticket from {} to {}",
                current.stringify(),
                target.stringify()
            )
            .kind(ErrorKind::InvalidTransition));
        }

        let entry = AuditEntry {
            id: ObjectId::new(),
            ticket_id: ticket.id,
            action: AuditAction::StatusChanged,
            old_value: Some(current.stringify().to_string()),
            new_value: Some(target.stringify().to_string()),
            updated_by: auth.id(),
            timestamp: default_timestamp(),
        };

        ticket.status = target;

        let ticket = commit_with_audit(&self.context, &ticket, entry).await?;

        notify(
            &self.context,
            NewNotification::new(
                ticket.requester_id,
                "Ticket status changed".to_string(),
                format!(
                    "Your ticket \"{}\" moved from {} to {}",
                    ticket.title,
                    current.stringify(),
                    target.stringify()
                ),
            ),
        );

        PublicTicket::new(&self.context, ticket).await
    }
}
