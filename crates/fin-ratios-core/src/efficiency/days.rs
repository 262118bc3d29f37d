use rust_decimal::Decimal;

use crate::{types::*, RatioError, RatioResult};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Days Sales Outstanding = accounts receivable / revenue * days in year.
pub fn calculate_dso(
    accounts_receivable: Money,
    revenue: Money,
    days_in_year: u32,
) -> RatioResult<Days> {
    annualised_ratio(accounts_receivable, revenue, days_in_year, "revenue")
}

/// Days Inventory Outstanding = inventory / COGS * days in year.
pub fn calculate_dio(
    inventory: Money,
    cost_of_goods_sold: Money,
    days_in_year: u32,
) -> RatioResult<Days> {
    annualised_ratio(
        inventory,
        cost_of_goods_sold,
        days_in_year,
        "cost_of_goods_sold",
    )
}

/// Days Payable Outstanding = accounts payable / COGS * days in year.
pub fn calculate_dpo(
    accounts_payable: Money,
    cost_of_goods_sold: Money,
    days_in_year: u32,
) -> RatioResult<Days> {
    annualised_ratio(
        accounts_payable,
        cost_of_goods_sold,
        days_in_year,
        "cost_of_goods_sold",
    )
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `numerator / denominator * days_in_year`, evaluated left to right.
pub(crate) fn annualised_ratio(
    numerator: Money,
    denominator: Money,
    days_in_year: u32,
    denominator_name: &str,
) -> RatioResult<Days> {
    if denominator.is_zero() {
        return Err(RatioError::InvalidDivisor {
            context: denominator_name.to_string(),
        });
    }
    validate_days_in_year(days_in_year)?;
    numerator
        .checked_div(denominator)
        .and_then(|r| r.checked_mul(Decimal::from(days_in_year)))
        .ok_or_else(|| RatioError::Overflow {
            context: format!("{denominator_name}-based day count"),
        })
}

fn validate_days_in_year(days_in_year: u32) -> RatioResult<()> {
    if days_in_year == 0 {
        return Err(RatioError::InvalidInput {
            field: "days_in_year".into(),
            reason: "Days in year must be positive.".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
