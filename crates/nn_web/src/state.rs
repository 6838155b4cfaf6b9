use std::sync::Arc;

use nn_scrapers::AnalysisPipeline;
use nn_storage::StorageManager;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub storage: StorageManager,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        let storage = pipeline.storage().clone();
        Self {
            pipeline: Arc::new(pipeline),
            storage,
        }
    }
}
