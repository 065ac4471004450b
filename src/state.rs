use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, BookingService, RecoveryService, SeaOrmAuthService, SeaOrmBookingService,
    SeaOrmRecoveryService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub booking_service: Arc<dyn BookingService>,

    pub recovery_service: Arc<dyn RecoveryService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services around an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let config = Arc::new(config);

        let auth_service =
            Arc::new(SeaOrmAuthService::new(store.clone(), config.clone())) as Arc<dyn AuthService>;
        let booking_service = Arc::new(SeaOrmBookingService::new(store.clone(), config.clone()))
            as Arc<dyn BookingService>;
        let recovery_service = Arc::new(SeaOrmRecoveryService::new(store.clone(), config.clone()))
            as Arc<dyn RecoveryService>;

        Self {
            config,
            store,
            auth_service,
            booking_service,
            recovery_service,
        }
    }
}
