use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};

use crate::{
    config::AppConfig,
    db::DbPool,
    services::ride_store::{RideStore, SqliteRideStore, TimedStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub rides: Arc<dyn RideStore>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        let rides = Arc::new(SqliteRideStore::new(db.clone()));
        Self::with_store(config, db, rides)
    }

    /// Every store is bounded by `config.store_timeout`.
    pub fn with_store(config: AppConfig, db: DbPool, rides: Arc<dyn RideStore>) -> Self {
        let rides: Arc<dyn RideStore> = Arc::new(TimedStore::new(rides, config.store_timeout));
        let digest = Sha512::digest(config.cookie_secret.as_bytes());
        let cookie_key = Key::from(&digest[..]);
        Self {
            config,
            db,
            rides,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
