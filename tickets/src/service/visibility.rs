use serde::Deserialize;
use utoipa::IntoParams;

use common::{
    auth::Auth,
    entities::{
        role::Role,
        ticket::{Priority, RequestType, Status, Ticket},
    },
    error::{self, AddKind, ErrorKind},
};

/// Query-string filters. All conditions are conjunctive; an absent or empty
/// value matches everything, an unparseable value matches nothing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TicketFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(alias = "requestType")]
    pub request_type: Option<String>,
}

/// Role scoping: admins and services see everything, requesters their own
/// tickets, data members their queue. The open pool is a separate view.
pub fn scope(viewer: &Auth, tickets: Vec<Ticket>) -> error::Result<Vec<Ticket>> {
    match viewer {
        Auth::None => {
            Err(anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized))
        }
        Auth::Service(_, _) | Auth::Admin(_) | Auth::User(_, Role::Admin) => Ok(tickets),
        Auth::User(id, Role::Requester) => Ok(tickets
            .into_iter()
            .filter(|ticket| &ticket.requester_id == id)
            .collect()),
        Auth::User(id, Role::DataMember) => Ok(tickets
            .into_iter()
            .filter(|ticket| ticket.assigned_to.as_ref() == Some(id))
            .collect()),
    }
}

/// The triage view over unassigned work. Data members, admins and services
/// see every open ticket; a requester only their own.
pub fn open_pool(viewer: &Auth, tickets: Vec<Ticket>) -> error::Result<Vec<Ticket>> {
    let open: Vec<Ticket> = tickets
        .into_iter()
        .filter(|ticket| ticket.status == Status::Open)
        .collect();

    match viewer {
        Auth::None => {
            Err(anyhow::anyhow!("Authentication required").kind(ErrorKind::Unauthorized))
        }
        Auth::Service(_, _) | Auth::Admin(_) | Auth::User(_, Role::Admin) => Ok(open),
        Auth::User(_, Role::DataMember) => Ok(open),
        Auth::User(id, Role::Requester) => Ok(open
            .into_iter()
            .filter(|ticket| &ticket.requester_id == id)
            .collect()),
    }
}

pub fn apply(filter: &TicketFilter, mut tickets: Vec<Ticket>) -> Vec<Ticket> {
    if let Some(search) = filter.search.as_deref().filter(|value| !value.is_empty()) {
        let needle = search.to_lowercase();
        tickets.retain(|ticket| {
            ticket.id.to_hex().to_lowercase().contains(&needle)
                || ticket.title.to_lowercase().contains(&needle)
        });
    }

    if let Some(value) = filter.status.as_deref().filter(|value| !value.is_empty()) {
        match Status::parse(value) {
            Ok(status) => tickets.retain(|ticket| ticket.status == status),
            Err(_) => return Vec::new(),
        }
    }

    if let Some(value) = filter.priority.as_deref().filter(|value| !value.is_empty()) {
        match Priority::parse(value) {
            Ok(priority) => tickets.retain(|ticket| ticket.priority == priority),
            Err(_) => return Vec::new(),
        }
    }

    if let Some(value) = filter
        .request_type
        .as_deref()
        .filter(|value| !value.is_empty())
    {
        match RequestType::parse(value) {
            Ok(request_type) => tickets.retain(|ticket| ticket.request_type == request_type),
            Err(_) => return Vec::new(),
        }
    }

    tickets
}

#[cfg(test)]
mod tests {
    use common::entities::role::Role;
    use mongodb::bson::oid::ObjectId;

    use crate::service::fixtures;

    use super::*;

    #[test]
    fn requester_sees_only_own_tickets() {
        let requester = ObjectId::new();
        let other = ObjectId::new();

        let mine = fixtures::ticket(requester);
        let not_mine = fixtures::ticket(other);

        let scoped = scope(
            &Auth::User(requester, Role::Requester),
            vec![mine.clone(), not_mine],
        )
        .unwrap();

        assert_eq!(scoped, vec![mine]);
    }

    #[test]
    fn data_member_sees_only_assigned_tickets() {
        let member = ObjectId::new();

        let mut assigned = fixtures::ticket(ObjectId::new());
        assigned.assigned_to = Some(member);
        let unassigned = fixtures::ticket(ObjectId::new());

        let scoped = scope(
            &Auth::User(member, Role::DataMember),
            vec![assigned.clone(), unassigned],
        )
        .unwrap();

        assert_eq!(scoped, vec![assigned]);
    }

    #[test]
    fn admin_sees_everything() {
        let tickets = vec![
            fixtures::ticket(ObjectId::new()),
            fixtures::ticket(ObjectId::new()),
        ];
        let scoped = scope(&Auth::Admin(ObjectId::new()), tickets.clone()).unwrap();
        assert_eq!(scoped, tickets);
    }

    #[test]
    fn anonymous_viewer_is_rejected() {
        let result = scope(&Auth::None, vec![fixtures::ticket(ObjectId::new())]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn open_pool_keeps_only_open_tickets() {
        let open = fixtures::ticket(ObjectId::new());
        let mut in_progress = fixtures::ticket(ObjectId::new());
        in_progress.status = Status::InProgress;

        let pool = open_pool(
            &Auth::User(ObjectId::new(), Role::DataMember),
            vec![open.clone(), in_progress],
        )
        .unwrap();

        assert_eq!(pool, vec![open]);
    }

    #[test]
    fn open_pool_hides_other_requesters_tickets() {
        let requester = ObjectId::new();
        let mine = fixtures::ticket(requester);
        let strangers = fixtures::ticket(ObjectId::new());

        let pool = open_pool(
            &Auth::User(requester, Role::Requester),
            vec![mine.clone(), strangers],
        )
        .unwrap();

        assert_eq!(pool, vec![mine]);
    }

    #[test]
    fn filters_are_conjunctive_and_case_insensitive() {
        let mut sales = fixtures::ticket(ObjectId::new());
        sales.title = "Sales dashboard is broken".to_string();
        sales.status = Status::InProgress;

        let other = fixtures::ticket(ObjectId::new());

        let filter = TicketFilter {
            search: Some("SALES".to_string()),
            status: Some("inprogress".to_string()),
            ..Default::default()
        };

        assert_eq!(apply(&filter, vec![sales.clone(), other]), vec![sales]);
    }

    #[test]
    fn search_matches_the_hex_id() {
        let ticket = fixtures::ticket(ObjectId::new());
        let filter = TicketFilter {
            search: Some(ticket.id.to_hex()),
            ..Default::default()
        };
        assert_eq!(apply(&filter, vec![ticket.clone()]), vec![ticket]);
    }

    #[test]
    fn unparseable_filter_matches_nothing() {
        let filter = TicketFilter {
            status: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(apply(&filter, vec![fixtures::ticket(ObjectId::new())]).is_empty());
    }

    #[test]
    fn empty_filter_values_match_everything() {
        let tickets = vec![fixtures::ticket(ObjectId::new())];
        let filter = TicketFilter {
            status: Some(String::new()),
            priority: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(apply(&filter, tickets.clone()), tickets);
    }
}
