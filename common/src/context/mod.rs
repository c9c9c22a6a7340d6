use std::sync::Arc;

use actix_web::{dev::Payload, web::Data, FromRequest, HttpRequest};
use anyhow::anyhow;

use crate::context::effectfull_context::{EffectfullContext, HandlerContext, ServiceState};
use crate::{
    auth::Auth,
    error::{self, AddKind, ErrorKind, ServiceError},
    repository::RepositoryObject,
};

pub mod effectfull_context;
pub mod test_context;

use self::test_context::TestContext;

#[derive(Clone)]
pub enum GeneralContext {
    Test(TestContext),
    Effectfull(EffectfullContext),
}

impl FromRequest for GeneralContext {
    type Error = ServiceError;

    type Future = futures_util::future::LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut actix_web::dev::Payload) -> Self::Future {
        fn from_request_inner(
            req: &HttpRequest,
            _payload: &mut Payload,
        ) -> error::Result<GeneralContext> {
            let auth = req
                .headers()
                .get("Authorization")
                .and_then(|x| x.to_str().ok())
                .and_then(|x| x.strip_prefix("Bearer "))
                .map(Auth::from_token);

            let user_auth = match auth {
                Some(Ok(res)) => {
                    log::info!("Token parsed successfully");
                    res
                }
                Some(Err(err)) => {
                    log::error!("Error parsing token: {:?}", err);
                    Auth::None
                }
                None => {
                    log::error!("No header provided");
                    Auth::None
                }
            };

            let Some(state) = req.app_data::<Data<Arc<ServiceState>>>() else {
                return Err(anyhow!("No state provided").into());
            };

            Ok(GeneralContext::Effectfull(EffectfullContext(
                Arc::clone(state),
                HandlerContext { user_auth },
            )))
        }
        let result = from_request_inner(req, payload);

        Box::pin(async move { result })
    }
}

impl GeneralContext {
    pub fn server_auth(&self) -> Auth {
        match self {
            GeneralContext::Effectfull(context) => context.server_auth(),
            GeneralContext::Test(context) => context.service_auth.clone(),
        }
    }

    pub fn try_get_repository<T: 'static>(&self) -> error::Result<RepositoryObject<T>> {
        let repository = match self {
            GeneralContext::Effectfull(context) => {
                context.0.repositories.get::<RepositoryObject<T>>().cloned()
            }
            GeneralContext::Test(context) => {
                context.repositories.get::<RepositoryObject<T>>().cloned()
            }
        };
        repository.ok_or_else(|| {
            anyhow!(
                "Repository for type {} not found",
                std::any::type_name::<T>()
            )
            .kind(ErrorKind::Internal)
        })
    }

    pub fn auth(&self) -> Auth {
        match self {
            GeneralContext::Effectfull(context) => context.1.user_auth.clone(),
            GeneralContext::Test(context) => context.user_auth.clone(),
        }
    }

    pub fn client(&self) -> Option<&reqwest::Client> {
        match self {
            GeneralContext::Effectfull(context) => Some(&context.0.client),
            GeneralContext::Test(_context) => None,
        }
    }
}
