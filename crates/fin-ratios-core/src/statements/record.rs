use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Money;

/// One annual fundamentals row as delivered by a data loader, keyed by
/// entity and fiscal period end date. Compustat mnemonics are accepted as
/// field aliases so loader output can be deserialised unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    /// Global company key
    pub gvkey: String,
    /// Ticker symbol
    pub tic: String,
    /// Company name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conm: Option<String>,
    /// Fiscal period end date
    pub datadate: NaiveDate,
    #[serde(default, alias = "at")]
    pub total_assets: Option<Money>,
    #[serde(default, alias = "lt")]
    pub total_liabilities: Option<Money>,
    #[serde(default, alias = "act")]
    pub current_assets: Option<Money>,
    #[serde(default, alias = "lct")]
    pub current_liabilities: Option<Money>,
    #[serde(default, alias = "seq")]
    pub shareholders_equity: Option<Money>,
    #[serde(default, alias = "dltt")]
    pub long_term_debt: Option<Money>,
    #[serde(default, alias = "dlc")]
    pub short_term_debt: Option<Money>,
    #[serde(default, alias = "ni")]
    pub net_income: Option<Money>,
    #[serde(default, alias = "sale")]
    pub sales: Option<Money>,
    #[serde(default)]
    pub cogs: Option<Money>,
    #[serde(default, alias = "oibdp")]
    pub operating_income_before_depreciation: Option<Money>,
    #[serde(default, alias = "oiadp")]
    pub operating_income_after_depreciation: Option<Money>,
    #[serde(default, alias = "invt")]
    pub inventory: Option<Money>,
    #[serde(default, alias = "rect")]
    pub accounts_receivable: Option<Money>,
    #[serde(default, alias = "ap")]
    pub accounts_payable: Option<Money>,
}

impl FundamentalsRecord {
    /// Record with identity fields set and every line item empty.
    pub fn new(gvkey: impl Into<String>, tic: impl Into<String>, datadate: NaiveDate) -> Self {
        Self {
            gvkey: gvkey.into(),
            tic: tic.into(),
            conm: None,
            datadate,
            total_assets: None,
            total_liabilities: None,
            current_assets: None,
            current_liabilities: None,
            shareholders_equity: None,
            long_term_debt: None,
            short_term_debt: None,
            net_income: None,
            sales: None,
            cogs: None,
            operating_income_before_depreciation: None,
            operating_income_after_depreciation: None,
            inventory: None,
            accounts_receivable: None,
            accounts_payable: None,
        }
    }

    /// Calendar year of the period end date.
    pub fn fiscal_year(&self) -> i32 {
        self.datadate.year()
    }

    /// Label used in warnings, e.g. "AAPL 2023-09-30".
    pub(crate) fn label(&self) -> String {
        format!("{} {}", self.tic, self.datadate)
    }
}

/// Most recent record for every ticker, ordered by period end date and then
/// ticker. When a ticker has two records on the same date the later one in
/// the input wins.
pub fn latest_by_ticker(records: &[FundamentalsRecord]) -> Vec<FundamentalsRecord> {
    let mut latest: BTreeMap<&str, &FundamentalsRecord> = BTreeMap::new();
    for record in records {
        match latest.get(record.tic.as_str()) {
            Some(current) if current.datadate > record.datadate => {}
            _ => {
                latest.insert(record.tic.as_str(), record);
            }
        }
    }

    let mut out: Vec<FundamentalsRecord> = latest.into_values().cloned().collect();
    out.sort_by(|a, b| a.datadate.cmp(&b.datadate).then_with(|| a.tic.cmp(&b.tic)));
    out
}
