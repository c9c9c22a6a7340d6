use actix_web::{
    get, patch, post,
    web::{self, Json, Path},
};

use common::{
    context::GeneralContext,
    entities::{role::Role, user::PublicUser},
    error,
};

use crate::service::user::{CreateUser, UserService};

use super::parse_id;

#[utoipa::path(
    request_body(
        content = CreateUser
    ),
    responses(
        (status = 200, body = PublicUser)
    )
)]
#[post("/api/users")]
pub async fn post_user(
    context: GeneralContext,
    Json(data): web::Json<CreateUser>,
) -> error::Result<Json<PublicUser>> {
    Ok(Json(UserService::new(context).create(data).await?))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = [PublicUser])
    )
)]
#[get("/api/users/role/{role}")]
pub async fn get_users_by_role(
    context: GeneralContext,
    role: Path<String>,
) -> error::Result<Json<Vec<PublicUser>>> {
    Ok(Json(
        UserService::new(context)
            .list_by_role(Role::parse(&role)?)
            .await?,
    ))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = PublicUser)
    )
)]
#[patch("/api/users/{id}/role/{role}")]
pub async fn patch_user_role(
    context: GeneralContext,
    path: Path<(String, String)>,
) -> error::Result<Json<PublicUser>> {
    let (id, role) = path.into_inner();
    Ok(Json(
        UserService::new(context)
            .change_role(parse_id(&id)?, Role::parse(&role)?)
            .await?,
    ))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = PublicUser)
    )
)]
#[get("/api/users/{id}")]
pub async fn get_user(
    context: GeneralContext,
    id: Path<String>,
) -> error::Result<Json<PublicUser>> {
    Ok(Json(UserService::new(context).find(parse_id(&id)?).await?))
}
