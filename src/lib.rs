pub mod analysis;
pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod timer;

pub use app::router;
pub use config::ServerConfig;
pub use state::AppState;
pub use storage::load_data;
