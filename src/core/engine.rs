use super::types::{
    ProjectionResult, ProjectionSummary, RoundingPolicy, SimulationParameters, YearlySnapshot,
};

const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, Copy)]
struct Balance {
    total_value: f64,
    invested_principal: f64,
}

impl Balance {
    fn opening(initial_investment: f64) -> Self {
        Self {
            total_value: initial_investment,
            invested_principal: initial_investment,
        }
    }

    /// Contribution lands first; interest accrues on the post-contribution balance.
    fn apply_month(&mut self, contribution: f64, monthly_rate: f64) {
        self.total_value += contribution;
        self.invested_principal += contribution;
        let interest = self.total_value * monthly_rate;
        self.total_value += interest;
    }
}

pub fn project(params: SimulationParameters) -> ProjectionResult {
    project_with_rounding(params, RoundingPolicy::SeparateFields)
}

pub fn project_with_rounding(
    params: SimulationParameters,
    rounding: RoundingPolicy,
) -> ProjectionResult {
    let monthly_rate = monthly_rate(params.annual_return_rate_percent);
    let mut balance = Balance::opening(params.initial_investment);

    let mut snapshots = Vec::with_capacity(params.investment_period_years as usize + 1);
    snapshots.push(YearlySnapshot {
        year_index: 0,
        total_value: balance.total_value,
        invested_principal: balance.invested_principal,
        accrued_return: 0.0,
    });

    for year in 1..=params.investment_period_years {
        for _ in 0..MONTHS_PER_YEAR {
            balance.apply_month(params.monthly_contribution, monthly_rate);
        }
        snapshots.push(year_end_snapshot(year, balance, rounding));
    }

    ProjectionResult::new(snapshots)
}

/// Accrued return as a percentage of principal; `0` when nothing was invested.
pub fn return_on_investment_percent(snapshot: &YearlySnapshot) -> f64 {
    if snapshot.invested_principal == 0.0 {
        return 0.0;
    }
    snapshot.accrued_return / snapshot.invested_principal * 100.0
}

pub fn summarize(result: &ProjectionResult) -> Option<ProjectionSummary> {
    let last = result.final_snapshot()?;
    Some(ProjectionSummary {
        final_total_value: last.total_value,
        final_invested_principal: last.invested_principal,
        final_accrued_return: last.accrued_return,
        return_on_investment_percent: return_on_investment_percent(last),
    })
}

fn monthly_rate(annual_return_rate_percent: f64) -> f64 {
    (annual_return_rate_percent / 100.0) / MONTHS_PER_YEAR as f64
}

fn year_end_snapshot(year_index: u32, balance: Balance, rounding: RoundingPolicy) -> YearlySnapshot {
    let total_value = balance.total_value.round();
    let invested_principal = balance.invested_principal.round();
    let accrued_return = match rounding {
        RoundingPolicy::SeparateFields => total_value - invested_principal,
        RoundingPolicy::RoundedDifference => {
            (balance.total_value - balance.invested_principal).round()
        }
    };

    YearlySnapshot {
        year_index,
        total_value,
        invested_principal,
        accrued_return,
    }
}
