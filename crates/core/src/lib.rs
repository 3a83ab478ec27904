pub mod classify;
pub mod client;
pub mod code_view;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod insights;
pub mod logging;
pub mod refresh;
pub mod router;
pub mod state;

pub use client::HttpBackend;
pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use error::{CoreError, Result};
pub use router::{DispatchOutcome, QueryKind};
pub use state::{DashboardState, StatePatch, StateStore};
