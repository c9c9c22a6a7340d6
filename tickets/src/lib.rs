use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware, web, App,
};
use common::{
    context::effectfull_context::ServiceState,
    entities::{audit_log::AuditEntry, comment::Comment, ticket::Ticket, user::User},
    repository::test_repository::TestRepository,
    services::API_PREFIX,
};

pub mod handlers;
pub mod service;

pub fn create_app(
    state: Arc<ServiceState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = actix_web::Error,
    >,
> {
    let cors = Cors::permissive();

    #[allow(clippy::let_and_return)]
    let app = App::new()
        .wrap(cors)
        .wrap(middleware::Logger::default())
        .app_data(web::Data::new(state))
        .service(
            web::scope(&API_PREFIX)
                .service(handlers::ping)
                .service(handlers::ticket::post_ticket)
                .service(handlers::ticket::get_tickets)
                // literal segments before the {id} routes
                .service(handlers::ticket::get_open_tickets)
                .service(handlers::ticket::get_assigned_tickets)
                .service(handlers::ticket::get_ticket_audit)
                .service(handlers::ticket::assign_ticket)
                .service(handlers::ticket::change_ticket_status)
                .service(handlers::ticket::get_ticket)
                .service(handlers::comment::post_comment)
                .service(handlers::comment::get_comments)
                .service(handlers::user::post_user)
                .service(handlers::user::get_users_by_role)
                .service(handlers::user::patch_user_role)
                .service(handlers::user::get_user),
        );
    app
}

pub fn create_test_app() -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = actix_web::Error,
    >,
> {
    let mut state = ServiceState::new("tickets".to_string());
    state.insert(Arc::new(TestRepository::<Ticket>::new()));
    state.insert(Arc::new(TestRepository::<User>::new()));
    state.insert(Arc::new(TestRepository::<Comment>::new()));
    state.insert(Arc::new(TestRepository::<AuditEntry>::new()));

    create_app(Arc::new(state))
}
