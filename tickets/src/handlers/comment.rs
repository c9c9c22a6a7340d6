use actix_web::{
    get, post,
    web::{self, Json, Path, Query},
    HttpResponse,
};

use common::{context::GeneralContext, entities::comment::PublicComment, error};

use crate::service::comment::{CommentService, CreateComment};

use super::{paginate, parse_id, PaginationParams};

#[post("/api/comments/ticket/{id}")]
pub async fn post_comment(
    context: GeneralContext,
    id: Path<String>,
    Json(data): web::Json<CreateComment>,
) -> error::Result<HttpResponse> {
    Ok(HttpResponse::Created().json(
        CommentService::new(context)
            .add(parse_id(&id)?, data)
            .await?,
    ))
}

#[get("/api/comments/ticket/{id}")]
pub async fn get_comments(
    context: GeneralContext,
    id: Path<String>,
    pagination: Query<PaginationParams>,
) -> error::Result<Json<Vec<PublicComment>>> {
    let thread = CommentService::new(context).list(parse_id(&id)?).await?;
    Ok(Json(paginate(thread, &pagination)))
}
