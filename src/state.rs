use crate::analysis::SleepAnalyzer;
use crate::models::AppData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub analyzer: Arc<dyn SleepAnalyzer>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData, analyzer: Arc<dyn SleepAnalyzer>) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
            analyzer,
        }
    }
}
