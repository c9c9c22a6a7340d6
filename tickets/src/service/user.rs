use mongodb::bson::{doc, oid::ObjectId, Bson};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use common::{
    access_rules::{AccessRules, Edit, Read},
    context::GeneralContext,
    default_timestamp,
    entities::{
        role::Role,
        user::{PublicUser, User},
    },
    error::{self, AddKind, ErrorKind},
    repository::Repository,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub team_id: Option<String>,
}

pub struct UserService {
    context: GeneralContext,
}

impl UserService {
    pub fn new(context: GeneralContext) -> Self {
        Self { context }
    }

    pub async fn create(&self, request: CreateUser) -> error::Result<PublicUser> {
        let auth = self.context.auth();
        let users = self.context.try_get_repository::<User>()?;

        if request.name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(
                anyhow::anyhow!("Name and email must not be empty").kind(ErrorKind::ValidationError)
            );
        }

        if users
            .find("email", &Bson::String(request.email.clone()))
            .await?
            .is_some()
        {
            return Err(anyhow::anyhow!("Email {} is already taken", request.email)
                .kind(ErrorKind::ValidationError));
        }

        // Only admins hand out elevated roles.
        let role = match request.role {
            Some(role) if role != Role::Requester && !auth.full_access() => {
                return Err(
                    anyhow::anyhow!("Only an admin can create a {}", role.stringify())
                        .kind(ErrorKind::Unauthorized),
                );
            }
            Some(role) => role,
            None => Role::Requester,
        };

        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(10)
            .map(char::from)
            .collect();

        let mut password = request.password;
        password.push_str(&salt);
        let password = sha256::digest(password);

        let team_id = request
            .team_id
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|_| {
                anyhow::anyhow!("Malformed team id").kind(ErrorKind::ValidationError)
            })?;

        let user = User {
            id: ObjectId::new(),
            name: request.name,
            email: request.email,
            password,
            salt,
            role,
            team_id,
            created_at: default_timestamp(),
            last_modified: default_timestamp(),
        };

        users.insert(&user).await?;

        Ok(user.into())
    }

    pub async fn find(&self, id: ObjectId) -> error::Result<PublicUser> {
        let auth = self.context.auth();
        let users = self.context.try_get_repository::<User>()?;

        let Some(user) = users.find("id", &Bson::ObjectId(id)).await? else {
            return Err(anyhow::anyhow!("User not found").kind(ErrorKind::NotFound));
        };

        if !Read.get_access(&auth, &user) {
            return Err(
                anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized)
            );
        }

        Ok(user.into())
    }

    /// Used by the assignment UI to list eligible data members.
    pub async fn list_by_role(&self, role: Role) -> error::Result<Vec<PublicUser>> {
        let auth = self.context.auth();
        let users = self.context.try_get_repository::<User>()?;

        if matches!(auth, common::auth::Auth::None) {
            return Err(
                anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized)
            );
        }

        let found = users
            .find_many("role", &Bson::String(role.stringify().to_string()))
            .await?;

        Ok(found.into_iter().map(Into::into).collect())
    }

    /// Identity fields are immutable; the role is the only mutable attribute
    /// and only an admin may change it.
    pub async fn change_role(&self, id: ObjectId, role: Role) -> error::Result<PublicUser> {
        let auth = self.context.auth();
        let users = self.context.try_get_repository::<User>()?;

        let Some(mut user) = users.find("id", &Bson::ObjectId(id)).await? else {
            return Err(anyhow::anyhow!("User not found").kind(ErrorKind::NotFound));
        };

        if !Edit.get_access(&auth, &user) {
            return Err(
                anyhow::anyhow!("Only an admin can change roles").kind(ErrorKind::Unauthorized)
            );
        }

        user.role = role;
        let user = users.update_one(doc! {"id": user.id}, &user).await?;

        Ok(user.into())
    }
}
