use std::{sync::Arc, time::Duration};

use type_map::concurrent::TypeMap;

use crate::error::{self, AddKind, ErrorKind};
use crate::{auth::Auth, repository::RepositoryObject};

pub struct ServiceState {
    pub repositories: TypeMap,
    pub client: reqwest::Client,
    pub service_auth: Auth,
}

impl ServiceState {
    pub fn new(service_name: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            repositories: TypeMap::new(),
            client,
            service_auth: Auth::Service(service_name, false),
        }
    }

    pub fn insert<T: 'static>(&mut self, repository: RepositoryObject<T>) {
        self.repositories.insert(repository);
    }
}

#[derive(Clone)]
pub struct HandlerContext {
    pub user_auth: Auth,
}

#[derive(Clone)]
pub struct EffectfullContext(pub Arc<ServiceState>, pub HandlerContext);

impl EffectfullContext {
    pub fn server_auth(&self) -> Auth {
        self.0.service_auth.clone()
    }

    pub fn try_get_repository<T: 'static>(&self) -> error::Result<RepositoryObject<T>> {
        self.0
            .repositories
            .get::<RepositoryObject<T>>()
            .cloned()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Repository for type {} not found",
                    std::any::type_name::<T>()
                )
                .kind(ErrorKind::Internal)
            })
    }

    pub fn auth(&self) -> &Auth {
        &self.1.user_auth
    }
}
