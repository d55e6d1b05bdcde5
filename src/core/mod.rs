mod engine;
mod types;

pub use engine::{project, project_with_rounding, return_on_investment_percent, summarize};
pub use types::{
    MAX_INVESTMENT_PERIOD_YEARS, ParameterError, ProjectionResult, ProjectionSummary,
    RoundingPolicy, SimulationParameters, YearlySnapshot,
};
