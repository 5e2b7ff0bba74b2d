use std::sync::Arc;

use crate::{metrics::HttpMetrics, store::Store, views::Views};

/// Everything a handler needs, built once in `main` and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub metrics: Arc<HttpMetrics>,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Result<Self, tera::Error> {
        Ok(Self {
            store,
            metrics: Arc::new(HttpMetrics::new()),
            views: Arc::new(Views::new()?),
        })
    }
}
