pub mod engine;
pub mod explain;
pub mod metrics;
pub mod models;
pub mod report;
pub mod stress;


pub use engine::{BacktestEngine, Decision};
pub use explain::{explain_run, TemplateExplainer, NO_DATA_EXPLANATION};
pub use metrics::{calculate_metrics, max_drawdown, metrics_from_values, regime_breakdown};
pub use models::*;
pub use report::{build_report, BacktestReport, StressTestSummary};
pub use stress::{crisis_reaction, inject_shock, run_stress_test};
