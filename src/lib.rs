pub mod api;
pub mod catalog;
pub mod config;
pub mod copilot;
pub mod error;
pub mod gate;
pub mod prompt;
pub mod query;
pub mod repair;
pub mod retry;
pub mod risk;
pub mod services;

pub use catalog::FieldCatalog;
pub use config::Settings;
pub use copilot::{Copilot, RunOutcome};
pub use error::{CopilotError, Result};
pub use gate::{Decision, ExecutionGate};
pub use query::Query;
pub use repair::{RepairLoop, RepairResult};
pub use risk::{RiskAssessment, RiskLevel, RiskScorer};
