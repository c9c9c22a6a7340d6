use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::{
    access_rules::{AccessRules, AddComment},
    context::GeneralContext,
    default_timestamp,
    entities::{
        comment::{Comment, PublicComment},
        ticket::Ticket,
    },
    error::{self, AddKind, ErrorKind},
    repository::Repository,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateComment {
    pub comment: String,
}

pub struct CommentService {
    context: GeneralContext,
}

impl CommentService {
    pub fn new(context: GeneralContext) -> Self {
        Self { context }
    }

    /// The thread is private to the ticket's parties: requester, assignee
    /// and admins.
    pub async fn add(
        &self,
        ticket_id: ObjectId,
        request: CreateComment,
    ) -> error::Result<PublicComment> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;
        let comments = self.context.try_get_repository::<Comment>()?;

        if request.comment.trim().is_empty() {
            return Err(
                anyhow::anyhow!("Comment must not be empty").kind(ErrorKind::ValidationError)
            );
        }

        let Some(ticket) = tickets.find("id", &Bson::ObjectId(ticket_id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !AddComment.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not a party to this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        let Some(user_id) = auth.id() else {
            return Err(anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized));
        };

        let comment = Comment {
            id: ObjectId::new(),
            ticket_id,
            user_id,
            comment: request.comment,
            created_at: default_timestamp(),
            last_modified: default_timestamp(),
        };

        comments.insert(&comment).await?;

        PublicComment::new(&self.context, comment).await
    }

    pub async fn list(&self, ticket_id: ObjectId) -> error::Result<Vec<PublicComment>> {
        let auth = self.context.auth();
        let tickets = self.context.try_get_repository::<Ticket>()?;
        let comments = self.context.try_get_repository::<Comment>()?;

        let Some(ticket) = tickets.find("id", &Bson::ObjectId(ticket_id)).await? else {
            return Err(anyhow::anyhow!("Ticket not found").kind(ErrorKind::NotFound));
        };

        if !AddComment.get_access(&auth, &ticket) {
            return Err(
                anyhow::anyhow!("User is not a party to this ticket")
                    .kind(ErrorKind::Unauthorized),
            );
        }

        let mut thread = comments
            .find_many("ticket_id", &Bson::ObjectId(ticket_id))
            .await?;
        thread.sort_by_key(|comment| comment.created_at);

        let mut result = Vec::with_capacity(thread.len());
        for comment in thread {
            result.push(PublicComment::new(&self.context, comment).await?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use common::{auth::Auth, entities::role::Role};

    use crate::service::fixtures;

    use super::*;

    async fn setup() -> (GeneralContext, Ticket) {
        let context = fixtures::context_with(Auth::Admin(ObjectId::new()));

        let requester = fixtures::user(Role::Requester);
        let member = fixtures::user(Role::DataMember);
        fixtures::seed_user(&context, &requester).await;
        fixtures::seed_user(&context, &member).await;

        let mut ticket = fixtures::ticket(requester.id);
        ticket.assigned_to = Some(member.id);
        fixtures::seed_ticket(&context, &ticket).await;

        (context, ticket)
    }

    fn as_user(context: &GeneralContext, auth: Auth) -> GeneralContext {
        match context.clone() {
            GeneralContext::Test(mut test) => {
                test.user_auth = auth;
                GeneralContext::Test(test)
            }
            other => other,
        }
    }

    #[actix_web::test]
    async fn parties_can_comment_and_read_the_thread() {
        let (context, ticket) = setup().await;
        let requester = as_user(
            &context,
            Auth::User(ticket.requester_id, Role::Requester),
        );
        let assignee = as_user(
            &context,
            Auth::User(ticket.assigned_to.unwrap(), Role::DataMember),
        );

        CommentService::new(requester.clone())
            .add(
                ticket.id,
                CreateComment {
                    comment: "Any update?".to_string(),
                },
            )
            .await
            .unwrap();
        CommentService::new(assignee)
            .add(
                ticket.id,
                CreateComment {
                    comment: "Working on it".to_string(),
                },
            )
            .await
            .unwrap();

        let thread = CommentService::new(requester).list(ticket.id).await.unwrap();
        assert_eq!(thread.len(), 2);
        // oldest first
        assert_eq!(thread[0].comment, "Any update?");
        assert_eq!(thread[1].comment, "Working on it");
    }

    #[actix_web::test]
    async fn blank_comments_are_rejected() {
        let (context, ticket) = setup().await;

        let err = CommentService::new(context)
            .add(
                ticket.id,
                CreateComment {
                    comment: "  \n ".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[actix_web::test]
    async fn strangers_cannot_comment_or_read() {
        let (context, ticket) = setup().await;
        let stranger = fixtures::user(Role::Requester);
        fixtures::seed_user(&context, &stranger).await;
        let context = as_user(&context, Auth::User(stranger.id, Role::Requester));

        let service = CommentService::new(context);

        let err = service
            .add(
                ticket.id,
                CreateComment {
                    comment: "Let me in".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = service.list(ticket.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[actix_web::test]
    async fn service_callers_cannot_author_comments() {
        let (context, ticket) = setup().await;
        let context = as_user(&context, Auth::Service("scheduler".to_string(), false));

        let err = CommentService::new(context)
            .add(
                ticket.id,
                CreateComment {
                    comment: "ping".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[actix_web::test]
    async fn comments_on_a_missing_ticket_fail() {
        let (context, _ticket) = setup().await;

        let err = CommentService::new(context)
            .add(
                ObjectId::new(),
                CreateComment {
                    comment: "Hello?".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
