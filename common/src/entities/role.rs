use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{self, AddKind, ErrorKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum Role {
    #[serde(rename = "REQUESTER", alias = "requester", alias = "Requester")]
    Requester,
    #[serde(rename = "DATAMEMBER", alias = "datamember", alias = "DataMember")]
    DataMember,
    #[serde(rename = "ADMIN", alias = "admin", alias = "Admin")]
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> error::Result<Role> {
        match s.to_lowercase().as_str() {
            "requester" => Ok(Role::Requester),
            "datamember" => Ok(Role::DataMember),
            "admin" => Ok(Role::Admin),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s).kind(ErrorKind::InvalidRole)),
        }
    }

    pub fn stringify(&self) -> &'static str {
        match self {
            Role::Requester => "REQUESTER",
            Role::DataMember => "DATAMEMBER",
            Role::Admin => "ADMIN",
        }
    }
}
