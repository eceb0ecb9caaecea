pub mod conditions;
pub mod fetch;
pub mod probe;
pub mod reports;
pub mod sources;

pub use conditions::ConditionsClient;
pub use fetch::JsonFetcher;
pub use probe::{ProbeStatus, SourceProbe, SourceStatus};
pub use reports::{current_risk, current_summary, resolved_kp};
pub use sources::{KpSourceAdapter, ProviderAdapter, SourceRegistry};
