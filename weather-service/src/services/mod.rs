pub mod advisor;
pub mod cache;
pub mod executor;
pub mod metrics;
pub mod providers;
pub mod risk_model;

pub use advisor::{Recommendations, RecommendationSource, SafetyAdvisor};
pub use cache::RecommendationCache;
pub use executor::{CommandError, CommandExecutor};
pub use metrics::{get_metrics, init_metrics};
pub use risk_model::{RiskAssessment, RiskModel, RiskScorer, RiskSource, DEFAULT_RISK_SCORE};
