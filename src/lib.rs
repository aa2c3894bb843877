pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::debounce::{LookupOutcome, PlateDebouncer};
use services::exchange_rate::ExchangeRateProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub rates: Arc<ExchangeRateProvider>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> AppResult<Self> {
        let rates = Arc::new(ExchangeRateProvider::new(config.rates.clone())?);
        Ok(Self { db, config, rates })
    }

    /// Debounced plate lookups against this database, using the configured delay.
    pub fn plate_debouncer(&self) -> (PlateDebouncer, tokio::sync::mpsc::UnboundedReceiver<LookupOutcome>) {
        PlateDebouncer::spawn(Arc::new(self.db.clone()), self.config.plate_lookup_debounce)
    }
}
