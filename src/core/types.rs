use serde::Serialize;
use thiserror::Error;

/// Longest horizon accepted at the input boundary.
pub const MAX_INVESTMENT_PERIOD_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Round total value and principal independently, then subtract.
    #[default]
    SeparateFields,
    /// Round the unrounded difference between total value and principal.
    RoundedDifference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub initial_investment: f64,
    pub monthly_contribution: f64,
    pub annual_return_rate_percent: f64,
    pub investment_period_years: u32,
}

impl SimulationParameters {
    /// Checks the caller-side input boundary. The engine itself never calls this.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (name, value) in [
            ("initialInvestment", self.initial_investment),
            ("monthlyContribution", self.monthly_contribution),
            ("annualReturnRate", self.annual_return_rate_percent),
        ] {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite(name));
            }
        }

        if self.initial_investment < 0.0 {
            return Err(ParameterError::NegativeInitialInvestment(
                self.initial_investment,
            ));
        }
        if self.monthly_contribution < 0.0 {
            return Err(ParameterError::NegativeMonthlyContribution(
                self.monthly_contribution,
            ));
        }
        if self.annual_return_rate_percent < 0.0 {
            return Err(ParameterError::NegativeReturnRate(
                self.annual_return_rate_percent,
            ));
        }
        if self.investment_period_years < 1 {
            return Err(ParameterError::PeriodTooShort);
        }
        if self.investment_period_years > MAX_INVESTMENT_PERIOD_YEARS {
            return Err(ParameterError::PeriodTooLong(self.investment_period_years));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    #[error("initialInvestment must be >= 0, got {0}")]
    NegativeInitialInvestment(f64),

    #[error("monthlyContribution must be >= 0, got {0}")]
    NegativeMonthlyContribution(f64),

    #[error("annualReturnRate must be >= 0, got {0}")]
    NegativeReturnRate(f64),

    #[error("investmentPeriod must be >= 1")]
    PeriodTooShort,

    #[error("investmentPeriod must be <= {max}, got {0}", max = MAX_INVESTMENT_PERIOD_YEARS)]
    PeriodTooLong(u32),

    #[error("monthlyContribution and monthlyContributionTenThousands are mutually exclusive")]
    ConflictingContribution,

    #[error("projection overflowed at year {0}; lower the return rate or amounts")]
    NonFiniteResult(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySnapshot {
    pub year_index: u32,
    pub total_value: f64,
    pub invested_principal: f64,
    pub accrued_return: f64,
}

impl YearlySnapshot {
    pub fn is_finite(&self) -> bool {
        self.total_value.is_finite()
            && self.invested_principal.is_finite()
            && self.accrued_return.is_finite()
    }
}

/// Year-by-year series from year 0 through the final year, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProjectionResult {
    snapshots: Vec<YearlySnapshot>,
}

impl ProjectionResult {
    pub(crate) fn new(snapshots: Vec<YearlySnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &[YearlySnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn final_snapshot(&self) -> Option<&YearlySnapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, YearlySnapshot> {
        self.snapshots.iter()
    }
}

impl<'a> IntoIterator for &'a ProjectionResult {
    type Item = &'a YearlySnapshot;
    type IntoIter = std::slice::Iter<'a, YearlySnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSummary {
    pub final_total_value: f64,
    pub final_invested_principal: f64,
    pub final_accrued_return: f64,
    pub return_on_investment_percent: f64,
}
