use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::Config;
use crate::store::{EventStore, MemoryStore, PgStore, TicketStore, UserStore};
use crate::uploads::ImageStore;

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub events: Arc<dyn EventStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub tokens: TokenService,
    pub images: ImageStore,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        tickets: Arc<dyn TicketStore>,
    ) -> Self {
        let tokens = TokenService::new(
            config.jwt_secret.as_bytes(),
            config.token_ttl,
            config.production,
        );
        let images = ImageStore::new(config.upload_dir.clone(), config.max_upload_bytes);

        Self {
            config: Arc::new(config),
            users,
            events,
            tickets,
            tokens,
            images,
        }
    }

    pub fn with_postgres(config: Config, store: PgStore) -> Self {
        let store = Arc::new(store);
        Self::new(config, store.clone(), store.clone(), store)
    }

    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(config, store.clone(), store.clone(), store)
    }
}
