use std::sync::Arc;

use type_map::concurrent::TypeMap;

use crate::{auth::Auth, repository::RepositoryObject};

/// Context for service-level tests: same repository lookup surface as the
/// effectfull variant, but backed by in-memory repositories and with no
/// outbound client.
#[derive(Clone)]
pub struct TestContext {
    pub repositories: Arc<TypeMap>,
    pub service_auth: Auth,
    pub user_auth: Auth,
}

impl TestContext {
    pub fn new(user_auth: Auth) -> Self {
        Self {
            repositories: Arc::new(TypeMap::new()),
            service_auth: Auth::Service("test".to_string(), false),
            user_auth,
        }
    }

    pub fn with_repository<T: 'static>(mut self, repository: RepositoryObject<T>) -> Self {
        if let Some(map) = Arc::get_mut(&mut self.repositories) {
            map.insert(repository);
        }
        self
    }
}
