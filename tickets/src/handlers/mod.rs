pub mod comment;
pub mod ticket;
pub mod user;

use actix_web::{get, HttpResponse};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use utoipa::IntoParams;

use common::error::{self, AddKind, ErrorKind};

#[get("/api/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().body("pong")
}

/// Path ids arrive as hex strings; a malformed one is the caller's mistake,
/// not a server fault.
pub(crate) fn parse_id(id: &str) -> error::Result<ObjectId> {
    id.parse()
        .map_err(|_| anyhow::anyhow!("Invalid id: {}", id).kind(ErrorKind::ValidationError))
}

/// Offset/limit paging over an already-scoped result. Absent on both fields
/// means no paging at all.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct PaginationParams {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

pub fn paginate<T>(items: Vec<T>, params: &PaginationParams) -> Vec<T> {
    if params.page.is_none() && params.per_page.is_none() {
        return items;
    }

    let per_page = params.per_page.unwrap_or(10).max(1);
    let page = params.page.unwrap_or(1).max(1);

    items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect()
}
