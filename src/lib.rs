pub mod app;
pub mod commands;
pub mod config;
pub mod errors;
pub mod filter;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod stats;
pub mod status;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use ledger::{Ledger, reconcile};
pub use state::AppState;
pub use status::{Status, classify};
pub use storage::Store;
