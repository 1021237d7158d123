use std::collections::HashMap;

use aw_config::{AccountId, PluginSpec};
use aw_core::error::{CoreError, CoreReason, CoreResult};
use aw_core::plugin::{AlertRule, plugin_params};
use aw_core::report::{RowMut, RowView};
use chrono::{Datelike, Local, NaiveDate};
use orion_error::prelude::*;
use serde::Deserialize;

use super::{EXTERNAL_CUSTOMER_ID, convert_micros, parse_number};

pub const MONTHLY_BUDGET_COLUMN: &str = "AccountMonthlyBudget";
const COST_COLUMN: &str = "Cost";
const GRACE_DAYS: u32 = 3;
const SPEND_RATIO: f64 = 0.6;

#[derive(Debug, Deserialize)]
struct Params {
    /// Account id → monthly budget. `0` means unlimited.
    #[serde(rename = "Budgets", default)]
    budgets: HashMap<String, f64>,
    #[serde(rename = "DefaultBudget", default = "default_budget")]
    default_budget: f64,
}

fn default_budget() -> f64 {
    100.0
}

/// Adds the account's monthly budget, converts `Cost` from micros, and
/// keeps only accounts that are under-spending their budget.
///
/// A row is dropped when the budget is unlimited (`0`), during the first
/// three days of the month, or when average daily spend so far exceeds 60%
/// of the daily budget.
#[derive(Debug, Clone)]
pub struct AddAccountMonthlyBudget {
    budgets: HashMap<AccountId, f64>,
    default_budget: f64,
    today: Option<NaiveDate>,
}

impl AddAccountMonthlyBudget {
    pub fn from_spec(spec: &PluginSpec) -> CoreResult<Self> {
        let params: Params = plugin_params(spec)?;
        let mut budgets = HashMap::with_capacity(params.budgets.len());
        for (raw, budget) in params.budgets {
            let account: AccountId = raw
                .parse()
                .map_err(|e| {
                    CoreError::from(CoreReason::ConfigLoad)
                        .with_detail(format!("AddAccountMonthlyBudget.Budgets: {e}"))
                })?;
            budgets.insert(account, budget);
        }
        Ok(Self {
            budgets,
            default_budget: params.default_budget,
            today: None,
        })
    }

    /// Pin the evaluation date instead of using the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn budget_for(&self, account: AccountId) -> f64 {
        self.budgets
            .get(&account)
            .copied()
            .unwrap_or(self.default_budget)
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl AlertRule for AddAccountMonthlyBudget {
    fn new_columns(&self) -> Vec<String> {
        vec![MONTHLY_BUDGET_COLUMN.to_string()]
    }

    fn populate_row(&self, row: &mut RowMut<'_>) -> CoreResult<()> {
        let account: AccountId = row
            .require(EXTERNAL_CUSTOMER_ID)?
            .parse()
            .map_err(|e| {
                CoreError::from(CoreReason::InvalidArgument).with_detail(format!("{EXTERNAL_CUSTOMER_ID}: {e}"))
            })?;
        row.set(MONTHLY_BUDGET_COLUMN, self.budget_for(account).to_string())?;

        let cost = convert_micros(COST_COLUMN, row.require(COST_COLUMN)?)?;
        row.set(COST_COLUMN, cost)
    }

    fn should_remove(&self, row: &RowView<'_>) -> CoreResult<bool> {
        let budget: f64 = parse_number(MONTHLY_BUDGET_COLUMN, row.require(MONTHLY_BUDGET_COLUMN)?)?;
        if budget == 0.0 {
            return Ok(true);
        }

        let today = self.today();
        let day = today.day();
        if day <= GRACE_DAYS {
            return Ok(true);
        }

        let cost: f64 = parse_number(COST_COLUMN, row.require(COST_COLUMN)?)?;
        let days_in_month = days_in_month(today);
        Ok(cost / f64::from(day) > SPEND_RATIO * budget / f64::from(days_in_month))
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use aw_core::report::Report;

    use super::*;

    fn rule(today: NaiveDate) -> AddAccountMonthlyBudget {
        let spec = PluginSpec::new("AddAccountMonthlyBudget")
            .with_param("Budgets", serde_json::json!({"111-111-1111": 0, "2222222222": 300}))
            .with_param("DefaultBudget", 100);
        AddAccountMonthlyBudget::from_spec(&spec).unwrap().with_today(today)
    }

    fn run(rule: &AddAccountMonthlyBudget, rows: &[(&str, &str)]) -> Report {
        let mut report = Report::new("R", AccountId::new(1), [EXTERNAL_CUSTOMER_ID, COST_COLUMN]).unwrap();
        for (id, cost) in rows {
            report.add_row(vec![id.to_string(), cost.to_string()]).unwrap();
        }
        report.append_column(MONTHLY_BUDGET_COLUMN).unwrap();
        report.pad_rows();
        report.try_for_each_row_mut(|row| rule.populate_row(row)).unwrap();
        report.try_remove_rows_where(|row| rule.should_remove(row)).unwrap();
        report
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(date(2016, 2, 10)), 29);
        assert_eq!(days_in_month(date(2015, 12, 31)), 31);
        assert_eq!(days_in_month(date(2016, 4, 1)), 30);
    }

    #[test]
    fn keeps_only_under_spending_accounts() {
        // 15 of 30 days: daily budget 100/30, threshold 0.6 * 3.33 = 2.0 per day.
        let report = run(
            &rule(date(2016, 4, 15)),
            &[
                ("1111111111", "1000000"),  // unlimited budget
                ("2222222222", "45000000"), // 3.0/day vs 6.0 threshold: kept
                ("3333333333", "15000000"), // 1.0/day vs 2.0: kept
                ("4444444444", "60000000"), // 4.0/day vs 2.0: dropped
            ],
        );
        let ids: Vec<_> = report
            .row_views()
            .map(|r| r.get(EXTERNAL_CUSTOMER_ID).unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["2222222222", "3333333333"]);
        let row = report.row(0).unwrap();
        assert_eq!(row.get(COST_COLUMN), Some("45"));
        assert_eq!(row.get(MONTHLY_BUDGET_COLUMN), Some("300"));
    }

    #[test]
    fn first_days_of_month_never_alert() {
        let report = run(&rule(date(2016, 4, 3)), &[("3333333333", "0")]);
        assert!(report.is_empty());
    }
}
