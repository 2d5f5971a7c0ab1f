pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
pub mod service;
pub mod session;
pub mod stats;
pub mod storage;
pub mod state;
pub mod widgets;

pub use app::router;
pub use config::Config;
pub use service::PlannerService;
pub use state::AppState;
pub use storage::{load_database, persist_database, DocumentStore, FileStore, MemoryStore};
