use std::sync::Arc;

use crate::{
    config::Config, models::question::Catalog, repository::PgStore,
    services::assessment::AssessmentService,
};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub catalog: Arc<Catalog>,
    pub store: PgStore,
    pub assessments: AssessmentService<PgStore>,
}

impl AppState {
    /// Builds the state around one pool, one catalog and one random source.
    pub fn new(pool: PgPool, config: Config, catalog: Catalog, rng: rand::rngs::StdRng) -> Self {
        let catalog = Arc::new(catalog);
        let store = PgStore::new(pool.clone());
        let assessments =
            AssessmentService::new(Arc::new(store.clone()), Arc::clone(&catalog), rng);
        Self {
            pool,
            config,
            catalog,
            store,
            assessments,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for PgStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<Catalog> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.catalog)
    }
}

impl FromRef<AppState> for AssessmentService<PgStore> {
    fn from_ref(state: &AppState) -> Self {
        state.assessments.clone()
    }
}
