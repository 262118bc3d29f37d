use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::record::FundamentalsRecord;
use crate::{types::*, RatioError, RatioResult};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Leverage, liquidity and profitability ratios for one fundamentals record.
/// A ratio is `None` when an operand is missing or its denominator is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub gvkey: String,
    pub tic: String,
    pub datadate: NaiveDate,
    pub fiscal_year: i32,
    // Leverage
    /// Long-term plus short-term debt
    pub debt: Option<Money>,
    pub de_ratio: Option<Multiple>,
    pub da_ratio: Option<Rate>,
    // Liquidity
    pub current_ratio: Option<Multiple>,
    pub quick_ratio: Option<Multiple>,
    // Profitability
    pub roa: Option<Rate>,
    pub roe: Option<Rate>,
    pub gross_margin: Option<Rate>,
    /// Operating income before depreciation / sales
    pub operating_margin: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute leverage, liquidity and profitability ratios for every record,
/// preserving input order.
pub fn compute_financial_metrics(
    records: &[FundamentalsRecord],
) -> RatioResult<ComputationOutput<Vec<FinancialMetrics>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if records.is_empty() {
        return Err(RatioError::InsufficientData(
            "At least one fundamentals record is required.".into(),
        ));
    }

    let metrics: Vec<FinancialMetrics> = records
        .iter()
        .map(|r| compute_record_metrics(r, &mut warnings))
        .collect::<RatioResult<Vec<_>>>()?;

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "debt": "long_term_debt + short_term_debt",
        "quick_ratio": "(current_assets - inventory) / current_liabilities",
        "operating_margin": "operating income before depreciation / sales",
        "missing_or_zero_denominator": "ratio reported as null"
    });

    Ok(with_metadata(
        "Financial Statement Ratios (leverage, liquidity, profitability)",
        &assumptions,
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compute_record_metrics(
    r: &FundamentalsRecord,
    warnings: &mut Vec<String>,
) -> RatioResult<FinancialMetrics> {
    let label = r.label();
    let mut ratio = |num: Option<Decimal>, den: Option<Decimal>, metric: &str| {
        checked_ratio(num, den, &label, metric, warnings)
    };

    // -- Leverage -------------------------------------------------------------
    let debt = combine(
        r.long_term_debt,
        r.short_term_debt,
        Decimal::checked_add,
        &label,
        "debt",
    )?;
    let de_ratio = ratio(debt, r.shareholders_equity, "de_ratio")?;
    let da_ratio = ratio(debt, r.total_assets, "da_ratio")?;

    // -- Liquidity ------------------------------------------------------------
    let current_ratio = ratio(r.current_assets, r.current_liabilities, "current_ratio")?;
    let quick_assets = combine(
        r.current_assets,
        r.inventory,
        Decimal::checked_sub,
        &label,
        "quick assets",
    )?;
    let quick_ratio = ratio(quick_assets, r.current_liabilities, "quick_ratio")?;

    // -- Profitability --------------------------------------------------------
    let roa = ratio(r.net_income, r.total_assets, "roa")?;
    let roe = ratio(r.net_income, r.shareholders_equity, "roe")?;
    let gross_profit = combine(r.sales, r.cogs, Decimal::checked_sub, &label, "gross profit")?;
    let gross_margin = ratio(gross_profit, r.sales, "gross_margin")?;
    let operating_margin = ratio(
        r.operating_income_before_depreciation,
        r.sales,
        "operating_margin",
    )?;

    if matches!(r.shareholders_equity, Some(eq) if eq < Decimal::ZERO) {
        warnings.push(format!(
            "{label}: negative shareholders' equity; D/E and ROE are not meaningful."
        ));
    }

    Ok(FinancialMetrics {
        gvkey: r.gvkey.clone(),
        tic: r.tic.clone(),
        datadate: r.datadate,
        fiscal_year: r.fiscal_year(),
        debt,
        de_ratio,
        da_ratio,
        current_ratio,
        quick_ratio,
        roa,
        roe,
        gross_margin,
        operating_margin,
    })
}

/// Applies `op` when both operands are present; `Ok(None)` otherwise.
fn combine(
    a: Option<Money>,
    b: Option<Money>,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
    label: &str,
    what: &str,
) -> RatioResult<Option<Money>> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(None),
    };
    op(a, b).map(Some).ok_or_else(|| RatioError::Overflow {
        context: format!("{label} {what}"),
    })
}

fn checked_ratio(
    numerator: Option<Decimal>,
    denominator: Option<Decimal>,
    label: &str,
    metric: &str,
    warnings: &mut Vec<String>,
) -> RatioResult<Option<Decimal>> {
    let (num, den) = match (numerator, denominator) {
        (Some(num), Some(den)) => (num, den),
        _ => return Ok(None),
    };
    if den.is_zero() {
        warnings.push(format!("{label}: zero denominator; {metric} not computed."));
        return Ok(None);
    }
    num.checked_div(den).map(Some).ok_or_else(|| RatioError::Overflow {
        context: format!("{label} {metric}"),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
