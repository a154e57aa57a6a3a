use std::sync::Arc;

use river_classifier::Classifier;

pub mod api;
pub mod build_info;
pub mod db;
pub mod model;
pub mod server;
pub mod storage;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

use util::config::Config;

/// 应用状态结构
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<dyn db::Database>,
    pub storage: Arc<dyn storage::Storage>,
    pub classifier: Arc<dyn Classifier>,
    pub config: Arc<Config>,
}
