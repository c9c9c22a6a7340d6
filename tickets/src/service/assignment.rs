use mongodb::bson::{oid::ObjectId, Bson};

use common::{
    access_rules::{AccessRules, Assign},
    api::notifications::{notify, NewNotification},
    context::GeneralContext,
    default_timestamp,
    entities::{
        audit_log::{AuditAction, AuditEntry},
        role::Role,
        ticket::{PublicTicket, Status, Ticket},
        user::User,
    },
    error::{self, AddKind, ErrorKind},
    repository::Repository,
};

use super::commit_with_audit;

pub struct AssignmentService {
    context: GeneralContext,
}

impl AssignmentService {
    pub fn new(context: GeneralContext) -> Self {
        Self { context }
    }

    /// Hands an open ticket to a data member. Assignment never changes the
    /// ticket status; a ticket that has left `Open` cannot be reassigned.
    pub async fn assign(
        &self,
        ticket_id: ObjectId,
        assignee_id: ObjectId,
    ) -> error::Result<PublicTicket> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;
        let users = self.context.try_get_repository::<User>()?;

        let Some(mut ticket) = tickets.find("id", &Bson::ObjectId(ticket_id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !Assign.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not allowed to assign this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        if ticket.status != Status::Open {
            return Err(anyhow::anyhow!(
                "Only open tickets can be assigned, current status is {}",
                ticket.status.stringify()
            )
            .kind(ErrorKind::InvalidState));
        }

        let Some(assignee) = users.find("id", &Bson::ObjectId(assignee_id)).await? else {
            return Err(anyhow::anyhow!("Assignee not found").kind(ErrorKind::NotFound));
        };

        if assignee.role != Role::DataMember {
            return Err(anyhow::anyhow!(
                "Tickets can only be assigned to data members, {} is a {}",
                assignee.name,
                assignee.role.stringify()
            )
            .kind(ErrorKind::InvalidRole));
        }

        // Assigning the current assignee again is a no-op: no audit row.
        if ticket.assigned_to == Some(assignee_id) {
            return PublicTicket::new(&self.context, ticket).await;
        }

        let entry = AuditEntry {
            id: ObjectId::new(),
            ticket_id: ticket.id,
            action: AuditAction::Assigned,
            old_value: ticket.assigned_to.map(|id| id.to_hex()),
            new_value: Some(assignee_id.to_hex()),
            updated_by: auth.id(),
            timestamp: default_timestamp(),
        };

        ticket.assigned_to = Some(assignee_id);

        let ticket = commit_with_audit(&self.context, &ticket, entry).await?;

        notify(
            &self.context,
            NewNotification::new(
                assignee_id,
                "Ticket assigned".to_string(),
                format!("Ticket \"{}\" has been assigned to you", ticket.title),
            ),
        );
        notify(
            &self.context,
            NewNotification::new(
                ticket.requester_id,
                "Ticket assigned".to_string(),
                format!(
                    "Your ticket \"{}\" has been assigned to {}",
                    ticket.title, assignee.name
                ),
            ),
        );

        PublicTicket::new(&self.context, ticket).await
    }
}

#[cfg(test)]
mod tests {
    use common::auth::Auth;

    use crate::service::fixtures;

    use super::*;

    async fn setup() -> (GeneralContext, Ticket, User) {
        let admin = ObjectId::new();
        let context = fixtures::context_with(Auth::Admin(admin));

        let requester = fixtures::user(Role::Requester);
        let member = fixtures::user(Role::DataMember);
        fixtures::seed_user(&context, &requester).await;
        fixtures::seed_user(&context, &member).await;

        let ticket = fixtures::ticket(requester.id);
        fixtures::seed_ticket(&context, &ticket).await;

        (context, ticket, member)
    }

    #[actix_web::test]
    async fn assign_open_ticket_to_data_member() {
        let (context, ticket, member) = setup().await;

        let assigned = AssignmentService::new(context.clone())
            .assign(ticket.id, member.id)
            .await
            .unwrap();

        assert_eq!(assigned.status, Status::Open);
        assert_eq!(
            assigned.assigned_to.map(|user| user.id),
            Some(member.id.to_hex())
        );

        let entries = context
            .try_get_repository::<AuditEntry>()
            .unwrap()
            .find_many("ticket_id", &Bson::ObjectId(ticket.id))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Assigned);
        assert_eq!(entries[0].new_value, Some(member.id.to_hex()));
    }

    #[actix_web::test]
    async fn requester_cannot_assign() {
        let (context, ticket, member) = setup().await;
        let stranger = fixtures::user(Role::Requester);

        let context = match context {
            GeneralContext::Test(mut test) => {
                test.user_auth = Auth::User(stranger.id, Role::Requester);
                GeneralContext::Test(test)
            }
            other => other,
        };

        let err = AssignmentService::new(context)
            .assign(ticket.id, member.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[actix_web::test]
    async fn assignment_requires_open_status() {
        let (context, mut ticket, member) = setup().await;

        ticket.status = Status::InProgress;
        context
            .try_get_repository::<Ticket>()
            .unwrap()
            .update_one(mongodb::bson::doc! {"id": ticket.id}, &ticket)
            .await
            .unwrap();

        let err = AssignmentService::new(context)
            .assign(ticket.id, member.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[actix_web::test]
    async fn assignee_must_be_a_data_member() {
        let (context, ticket, _member) = setup().await;
        let requester = fixtures::user(Role::Requester);
        fixtures::seed_user(&context, &requester).await;

        let err = AssignmentService::new(context)
            .assign(ticket.id, requester.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRole);
    }

    #[actix_web::test]
    async fn reassigning_the_same_assignee_is_idempotent() {
        let (context, ticket, member) = setup().await;
        let service = AssignmentService::new(context.clone());

        service.assign(ticket.id, member.id).await.unwrap();
        let again = service.assign(ticket.id, member.id).await.unwrap();

        assert_eq!(
            again.assigned_to.map(|user| user.id),
            Some(member.id.to_hex())
        );

        let entries = context
            .try_get_repository::<AuditEntry>()
            .unwrap()
            .find_many("ticket_id", &Bson::ObjectId(ticket.id))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[actix_web::test]
    async fn reassignment_to_another_member_while_open_overwrites() {
        let (context, ticket, member) = setup().await;
        let other = fixtures::user(Role::DataMember);
        fixtures::seed_user(&context, &other).await;

        let service = AssignmentService::new(context.clone());
        service.assign(ticket.id, member.id).await.unwrap();
        let reassigned = service.assign(ticket.id, other.id).await.unwrap();

        assert_eq!(
            reassigned.assigned_to.map(|user| user.id),
            Some(other.id.to_hex())
        );

        let entries = context
            .try_get_repository::<AuditEntry>()
            .unwrap()
            .find_many("ticket_id", &Bson::ObjectId(ticket.id))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }
}
