use chrono::{Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    entities::role::Role,
    error::{self, AddKind, ErrorKind},
};

pub static ENCODING_KEY: Lazy<EncodingKey> = Lazy::new(|| {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    EncodingKey::from_secret(secret.as_bytes())
});

pub static DECODING_KEY: Lazy<DecodingKey> = Lazy::new(|| {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    DecodingKey::from_secret(secret.as_bytes())
});

static TOKEN_DURATION: Lazy<Duration> = Lazy::new(|| Duration::days(1));

/// Caller identity for every core call. There is no ambient session: handlers
/// decode the bearer token into an `Auth` and services receive it through the
/// context.
#[derive(Debug, Clone, PartialEq)]
pub enum Auth {
    /// Another backend service; the flag marks whether it acts for a
    /// verified end user.
    Service(String, bool),
    Admin(ObjectId),
    /// An end user together with their role (requester or data member).
    User(ObjectId, Role),
    None,
}

impl Auth {
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Auth::Admin(id) => Some(*id),
            Auth::User(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Auth::Admin(_) => Some(Role::Admin),
            Auth::User(_, role) => Some(*role),
            _ => None,
        }
    }

    pub fn full_access(&self) -> bool {
        matches!(self, Auth::Admin(_) | Auth::Service(_, _))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TokenRole {
    Admin,
    Requester,
    DataMember,
    Service,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    role: TokenRole,
    user_id: Option<String>,
    service_name: Option<String>,
    exp: i64,
}

impl Auth {
    pub fn from_token(token: &str) -> error::Result<Self> {
        let claims = decode::<Claims>(token, &DECODING_KEY, &Validation::new(Algorithm::HS512))
            .map_err(|err| anyhow::anyhow!("Invalid token: {}", err).kind(ErrorKind::Unauthorized))?
            .claims;

        let user_id = |id: Option<String>| -> error::Result<ObjectId> {
            id.ok_or_else(|| anyhow::anyhow!("Token carries no user id").kind(ErrorKind::Unauthorized))?
                .parse()
                .map_err(|_| anyhow::anyhow!("Malformed user id in token").kind(ErrorKind::Unauthorized))
        };

        match claims.role {
            TokenRole::Admin => Ok(Auth::Admin(user_id(claims.user_id)?)),
            TokenRole::Requester => Ok(Auth::User(user_id(claims.user_id)?, Role::Requester)),
            TokenRole::DataMember => Ok(Auth::User(user_id(claims.user_id)?, Role::DataMember)),
            TokenRole::Service => {
                let name = claims.service_name.unwrap_or_default();
                Ok(Auth::Service(name, true))
            }
        }
    }

    pub fn to_token(&self) -> error::Result<String> {
        let header = Header {
            alg: Algorithm::HS512,
            ..Default::default()
        };
        let exp = Utc::now().timestamp() + TOKEN_DURATION.num_seconds();
        let claims = match self {
            Auth::Service(name, _) => Claims {
                role: TokenRole::Service,
                user_id: None,
                service_name: Some(name.clone()),
                exp,
            },
            Auth::Admin(id) => Claims {
                role: TokenRole::Admin,
                user_id: Some(id.to_hex()),
                service_name: None,
                exp,
            },
            Auth::User(id, Role::Requester) => Claims {
                role: TokenRole::Requester,
                user_id: Some(id.to_hex()),
                service_name: None,
                exp,
            },
            Auth::User(id, Role::DataMember) => Claims {
                role: TokenRole::DataMember,
                user_id: Some(id.to_hex()),
                service_name: None,
                exp,
            },
            Auth::User(id, Role::Admin) => Claims {
                role: TokenRole::Admin,
                user_id: Some(id.to_hex()),
                service_name: None,
                exp,
            },
            Auth::None => {
                return Err(anyhow::anyhow!("Cannot create token for Auth::None")
                    .kind(ErrorKind::Internal))
            }
        };

        jsonwebtoken::encode(&header, &claims, &ENCODING_KEY)
            .map_err(|_| anyhow::anyhow!("Failed to encode token").kind(ErrorKind::Internal))
    }
}
