use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    context::GeneralContext,
    error::{self, AddKind, ErrorKind},
    repository::{Entity, HasLastModified},
};

use super::user::{PublicUser, User};

/// One entry of a ticket's discussion thread. Append-only: comments are
/// never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: ObjectId,
    pub ticket_id: ObjectId,
    pub user_id: ObjectId,
    pub comment: String,
    pub created_at: i64,
    pub last_modified: i64,
}

impl Entity for Comment {
    fn id(&self) -> ObjectId {
        self.id
    }
}

impl HasLastModified for Comment {
    fn last_modified(&self) -> i64 {
        self.last_modified
    }

    fn set_last_modified(&mut self, timestamp: i64) {
        self.last_modified = timestamp;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PublicComment {
    pub id: String,
    pub ticket_id: String,
    pub user: PublicUser,
    pub comment: String,
    pub created_at: i64,
}

impl PublicComment {
    pub async fn new(context: &GeneralContext, comment: Comment) -> error::Result<PublicComment> {
        let users = context.try_get_repository::<User>()?;

        let user = users
            .find("id", &Bson::ObjectId(comment.user_id))
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment author not found").kind(ErrorKind::NotFound))?;

        Ok(PublicComment {
            id: comment.id.to_hex(),
            ticket_id: comment.ticket_id.to_hex(),
            user: user.into(),
            comment: comment.comment,
            created_at: comment.created_at,
        })
    }
}
