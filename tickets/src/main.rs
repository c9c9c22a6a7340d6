use std::{env, sync::Arc};

use actix_web::HttpServer;

use common::{
    context::effectfull_context::ServiceState,
    entities::{audit_log::AuditEntry, comment::Comment, ticket::Ticket, user::User},
    repository::mongo_repository::MongoRepository,
};
use tickets::create_app;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let mongo_uri = env::var("MONGOURI").expect("MONGOURI must be set");

    let ticket_repo: MongoRepository<Ticket> =
        MongoRepository::new(&mongo_uri, "tickets", "tickets").await;
    let user_repo: MongoRepository<User> =
        MongoRepository::new(&mongo_uri, "tickets", "users").await;
    let comment_repo: MongoRepository<Comment> =
        MongoRepository::new(&mongo_uri, "tickets", "comments").await;
    let audit_repo: MongoRepository<AuditEntry> =
        MongoRepository::new(&mongo_uri, "tickets", "audit_log").await;

    let mut state = ServiceState::new("tickets".to_string());
    state.insert(Arc::new(ticket_repo));
    state.insert(Arc::new(user_repo));
    state.insert(Arc::new(comment_repo));
    state.insert(Arc::new(audit_repo));
    let state = Arc::new(state);

    HttpServer::new(move || create_app(state.clone()))
        .bind(("0.0.0.0", 8080))?
        .run()
        .await
}
