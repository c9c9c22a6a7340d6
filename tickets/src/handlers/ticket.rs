use actix_web::{
    get, post, put,
    web::{self, Json, Path, Query},
    HttpResponse,
};
use serde::Deserialize;

use common::{
    context::GeneralContext,
    entities::{audit_log::PublicAuditEntry, ticket::{PublicTicket, Status}},
    error,
};

use crate::service::{
    assignment::AssignmentService,
    status::StatusService,
    ticket::{CreateTicket, TicketService},
    visibility::TicketFilter,
};

use super::{paginate, parse_id, PaginationParams};

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    request_body(
        content = CreateTicket
    ),
    responses(
        (status = 201, body = PublicTicket)
    )
)]
#[post("/api/tickets")]
pub async fn post_ticket(
    context: GeneralContext,
    Json(data): web::Json<CreateTicket>,
) -> error::Result<HttpResponse> {
    Ok(HttpResponse::Created().json(TicketService::new(context).create(data).await?))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        TicketFilter,
        PaginationParams,
    ),
    responses(
        (status = 200, body = [PublicTicket])
    )
)]
#[get("/api/tickets")]
pub async fn get_tickets(
    context: GeneralContext,
    filter: Query<TicketFilter>,
    pagination: Query<PaginationParams>,
) -> error::Result<Json<Vec<PublicTicket>>> {
    let tickets = TicketService::new(context)
        .list(filter.into_inner())
        .await?;
    Ok(Json(paginate(tickets, &pagination)))
}

#[get("/api/tickets/open")]
pub async fn get_open_tickets(
    context: GeneralContext,
    pagination: Query<PaginationParams>,
) -> error::Result<Json<Vec<PublicTicket>>> {
    let tickets = TicketService::new(context).open_pool().await?;
    Ok(Json(paginate(tickets, &pagination)))
}

#[get("/api/tickets/assigned-to/{user_id}")]
pub async fn get_assigned_tickets(
    context: GeneralContext,
    user_id: Path<String>,
) -> error::Result<Json<Vec<PublicTicket>>> {
    Ok(Json(
        TicketService::new(context)
            .assigned_to(parse_id(&user_id)?)
            .await?,
    ))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = [PublicAuditEntry])
    )
)]
#[get("/api/tickets/audit/{id}")]
pub async fn get_ticket_audit(
    context: GeneralContext,
    id: Path<String>,
) -> error::Result<Json<Vec<PublicAuditEntry>>> {
    Ok(Json(TicketService::new(context).history(parse_id(&id)?).await?))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = PublicTicket)
    )
)]
#[put("/api/tickets/{id}/assign/{user_id}")]
pub async fn assign_ticket(
    context: GeneralContext,
    path: Path<(String, String)>,
) -> error::Result<Json<PublicTicket>> {
    let (id, user_id) = path.into_inner();
    Ok(Json(
        AssignmentService::new(context)
            .assign(parse_id(&id)?, parse_id(&user_id)?)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: String,
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("status" = String, Query, description = "Target status"),
    ),
    responses(
        (status = 200, body = PublicTicket)
    )
)]
#[put("/api/tickets/{id}/status")]
pub async fn change_ticket_status(
    context: GeneralContext,
    id: Path<String>,
    query: Query<StatusQuery>,
) -> error::Result<Json<PublicTicket>> {
    let target = Status::parse(&query.status)?;
    Ok(Json(
        StatusService::new(context)
            .change(parse_id(&id)?, target)
            .await?,
    ))
}

#[utoipa::path(
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
    ),
    responses(
        (status = 200, body = PublicTicket)
    )
)]
#[get("/api/tickets/{id}")]
pub async fn get_ticket(
    context: GeneralContext,
    id: Path<String>,
) -> error::Result<Json<PublicTicket>> {
    Ok(Json(TicketService::new(context).find(parse_id(&id)?).await?))
}

#[cfg(test)]
mod tests {
    use actix_web::test::{self, init_service};
    use common::{
        auth::Auth,
        entities::{role::Role, ticket::PublicTicket, user::PublicUser},
    };
    use mongodb::bson::oid::ObjectId;

    use crate::{
        create_test_app,
        service::{fixtures, user::CreateUser},
    };

    fn create_user_request(
        name: &str,
        role: Option<Role>,
        token: Option<&str>,
    ) -> test::TestRequest {
        let mut req = test::TestRequest::post()
            .uri("/api/users")
            .set_json(CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password: "hunter2".to_string(),
                role,
                team_id: None,
            });
        if let Some(token) = token {
            req = req.insert_header(("Authorization", format!("Bearer {}", token)));
        }
        req
    }

    #[actix_web::test]
    async fn ticket_flow_over_http() {
        fixtures::init_env();
        let app = init_service(create_test_app()).await;

        let admin_token = Auth::Admin(ObjectId::new()).to_token().unwrap();

        let res = test::call_service(&app, create_user_request("req", None, None).to_request())
            .await;
        assert!(res.status().is_success());
        let requester: PublicUser = test::read_body_json(res).await;

        let res = test::call_service(
            &app,
            create_user_request("member", Some(Role::DataMember), Some(&admin_token))
                .to_request(),
        )
        .await;
        assert!(res.status().is_success());
        let member: PublicUser = test::read_body_json(res).await;

        let requester_token = Auth::User(requester.id.parse().unwrap(), Role::Requester)
            .to_token()
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/api/tickets")
            .insert_header(("Authorization", format!("Bearer {}", requester_token)))
            .set_json(serde_json::json!({
                "title": "Access to sales",
                "description": "Quarterly report",
                "requestType": "ACCESS",
                "priority": "HIGH"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::CREATED);
        let ticket: PublicTicket = test::read_body_json(res).await;

        let req = test::TestRequest::put()
            .uri(&format!(
                "/api/tickets/{}/assign/{}",
                ticket.id, member.id
            ))
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
        let assigned: PublicTicket = test::read_body_json(res).await;
        assert_eq!(assigned.assigned_to.map(|user| user.id), Some(member.id.clone()));

        let member_token = Auth::User(member.id.parse().unwrap(), Role::DataMember)
            .to_token()
            .unwrap();
        let req = test::TestRequest::put()
            .uri(&format!("/api/tickets/{}/status?status=INPROGRESS", ticket.id))
            .insert_header(("Authorization", format!("Bearer {}", member_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/tickets")
            .insert_header(("Authorization", format!("Bearer {}", requester_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
        let listed: Vec<PublicTicket> = test::read_body_json(res).await;
        assert_eq!(listed.len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/tickets/audit/{}", ticket.id))
            .insert_header(("Authorization", format!("Bearer {}", requester_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());
    }

    #[actix_web::test]
    async fn anonymous_requests_are_rejected() {
        fixtures::init_env();
        let app = init_service(create_test_app()).await;

        let req = test::TestRequest::post()
            .uri("/api/tickets")
            .set_json(serde_json::json!({
                "title": "No token",
                "description": "Should fail"
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn malformed_ticket_id_is_a_bad_request() {
        fixtures::init_env();
        let app = init_service(create_test_app()).await;

        let admin_token = Auth::Admin(ObjectId::new()).to_token().unwrap();
        let req = test::TestRequest::get()
            .uri("/api/tickets/not-a-hex-id")
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn invalid_status_value_is_a_bad_request() {
        fixtures::init_env();
        let app = init_service(create_test_app()).await;

        let admin_token = Auth::Admin(ObjectId::new()).to_token().unwrap();
        let req = test::TestRequest::put()
            .uri(&format!(
                "/api/tickets/{}/status?status=bogus",
                ObjectId::new()
            ))
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
