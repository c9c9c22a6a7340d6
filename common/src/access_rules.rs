use crate::{
    auth::Auth,
    entities::{
        role::Role,
        ticket::{Status, Ticket},
        user::User,
    },
};

pub trait AccessRules<Object, Subject> {
    fn get_access(&self, object: Object, subject: Subject) -> bool;
}

pub struct Read;

pub struct Edit;

pub struct Assign;

pub struct AddComment;

impl<'a, 'b> AccessRules<&'a Auth, &'b User> for Read {
    fn get_access(&self, auth: &'a Auth, _user: &'b User) -> bool {
        !matches!(auth, Auth::None)
    }
}

impl<'a, 'b> AccessRules<&'a Auth, &'b User> for Edit {
    fn get_access(&self, auth: &'a Auth, _user: &'b User) -> bool {
        matches!(auth, Auth::Service(_, _) | Auth::Admin(_) | Auth::User(_, Role::Admin))
    }
}

impl<'a, 'b> AccessRules<&'a Auth, &'b Ticket> for Read {
    fn get_access(&self, auth: &'a Auth, ticket: &'b Ticket) -> bool {
        match auth {
            Auth::Service(_, _) | Auth::Admin(_) => true,
            Auth::User(_, Role::Admin) => true,
            Auth::User(id, Role::Requester) => &ticket.requester_id == id,
            // Data members see their own queue plus the open pool.
            Auth::User(id, Role::DataMember) => {
                ticket.assigned_to.as_ref() == Some(id) || ticket.status == Status::Open
            }
            Auth::None => false,
        }
    }
}

impl<'a, 'b> AccessRules<&'a Auth, &'b Ticket> for Edit {
    fn get_access(&self, auth: &'a Auth, ticket: &'b Ticket) -> bool {
        match auth {
            Auth::Service(_, _) | Auth::Admin(_) => true,
            Auth::User(_, Role::Admin) => true,
            Auth::User(id, Role::DataMember) => ticket.assigned_to.as_ref() == Some(id),
            Auth::User(_, Role::Requester) => false,
            Auth::None => false,
        }
    }
}

impl<'a, 'b> AccessRules<&'a Auth, &'b Ticket> for Assign {
    fn get_access(&self, auth: &'a Auth, _ticket: &'b Ticket) -> bool {
        matches!(auth, Auth::Service(_, _) | Auth::Admin(_) | Auth::User(_, Role::Admin))
    }
}

impl<'a, 'b> AccessRules<&'a Auth, &'b Ticket> for AddComment {
    fn get_access(&self, auth: &'a Auth, ticket: &'b Ticket) -> bool {
        match auth {
            Auth::Admin(_) => true,
            Auth::User(_, Role::Admin) => true,
            Auth::User(id, _) => {
                &ticket.requester_id == id || ticket.assigned_to.as_ref() == Some(id)
            }
            // a service token carries no user id to attribute a comment to
            Auth::Service(_, _) => false,
            Auth::None => false,
        }
    }
}
