use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::days::annualised_ratio;
use crate::{types::*, RatioError, RatioResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Inputs for the Cash Conversion Cycle. Each of DSO, DIO and DPO is taken
/// from its precomputed ratio when present, otherwise derived from the two
/// raw line items behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CccInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dso: Option<Days>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dio: Option<Days>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpo: Option<Days>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_receivable: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Money>,
    #[serde(default, alias = "cogs", skip_serializing_if = "Option::is_none")]
    pub cost_of_goods_sold: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_payable: Option<Money>,
    /// Period length used when a term is derived from raw items (default 365)
    #[serde(default = "default_days_in_year")]
    pub days_in_year: u32,
}

impl Default for CccInput {
    fn default() -> Self {
        Self {
            dso: None,
            dio: None,
            dpo: None,
            accounts_receivable: None,
            revenue: None,
            inventory: None,
            cost_of_goods_sold: None,
            accounts_payable: None,
            days_in_year: DEFAULT_DAYS_IN_YEAR,
        }
    }
}

fn default_days_in_year() -> u32 {
    DEFAULT_DAYS_IN_YEAR
}

/// One component of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CccTerm {
    Dso,
    Dio,
    Dpo,
}

impl CccTerm {
    /// Resolution order. The first unresolvable term decides the message.
    pub const ORDER: [CccTerm; 3] = [CccTerm::Dso, CccTerm::Dio, CccTerm::Dpo];

    /// Message returned when neither the ratio nor both raw items are given.
    pub fn missing_message(self) -> &'static str {
        match self {
            Self::Dso => "Either dso or both accounts_receivable and revenue must be provided",
            Self::Dio => "Either dio or both inventory and cogs must be provided",
            Self::Dpo => "Either dpo or both accounts_payable and cogs must be provided",
        }
    }

    fn raw_names(self) -> (&'static str, &'static str) {
        match self {
            Self::Dso => ("accounts_receivable", "revenue"),
            Self::Dio => ("inventory", "cost_of_goods_sold"),
            Self::Dpo => ("accounts_payable", "cost_of_goods_sold"),
        }
    }

    /// (supplied ratio, raw numerator, raw denominator) for this term.
    fn sources(self, input: &CccInput) -> (Option<Days>, Option<Money>, Option<Money>) {
        match self {
            Self::Dso => (input.dso, input.accounts_receivable, input.revenue),
            Self::Dio => (input.dio, input.inventory, input.cost_of_goods_sold),
            Self::Dpo => (input.dpo, input.accounts_payable, input.cost_of_goods_sold),
        }
    }
}

impl std::fmt::Display for CccTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Dso => "dso",
            Self::Dio => "dio",
            Self::Dpo => "dpo",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermSource {
    /// Precomputed ratio taken as-is
    Supplied,
    /// Computed from raw line items
    Derived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTerm {
    pub term: CccTerm,
    pub days: Days,
    pub source: TermSource,
}

/// Either the cycle in days, or a description of the first term that could
/// not be resolved. Missing inputs are not an error: callers must check the
/// variant before treating the value as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CccOutcome {
    Cycle(Days),
    Incomplete(String),
}

impl CccOutcome {
    pub fn cycle(&self) -> Option<Days> {
        match self {
            Self::Cycle(days) => Some(*days),
            Self::Incomplete(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Cycle(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CccAnalysis {
    /// Terms resolved before the cycle completed or stopped
    pub terms: Vec<ResolvedTerm>,
    pub outcome: CccOutcome,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Cash Conversion Cycle = DSO + DIO - DPO.
///
/// Terms are resolved in the order DSO, DIO, DPO. A supplied ratio always
/// wins over raw items. If a term has neither its ratio nor both raw items the
/// result is `CccOutcome::Incomplete` with that term's message. A zero raw
/// denominator is still a hard `InvalidDivisor` error.
pub fn calculate_ccc(input: &CccInput) -> RatioResult<CccOutcome> {
    let (_, outcome) = resolve_cycle(input)?;
    Ok(outcome)
}

/// Same resolution as [`calculate_ccc`], wrapped in the standard output
/// envelope with the per-term breakdown and warnings.
pub fn analyze_ccc(input: &CccInput) -> RatioResult<ComputationOutput<CccAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (terms, outcome) = resolve_cycle(input)?;

    for resolved in terms.iter().filter(|t| t.source == TermSource::Supplied) {
        let (_, numerator, denominator) = resolved.term.sources(input);
        if numerator.is_some() || denominator.is_some() {
            let (num_name, den_name) = resolved.term.raw_names();
            warnings.push(format!(
                "{} supplied directly; {}/{} ignored.",
                resolved.term, num_name, den_name
            ));
        }
    }

    let any_derived = terms.iter().any(|t| t.source == TermSource::Derived);
    if any_derived && input.days_in_year != DEFAULT_DAYS_IN_YEAR {
        warnings.push(format!(
            "Derived ratios use a {}-day period instead of {}.",
            input.days_in_year, DEFAULT_DAYS_IN_YEAR
        ));
    }

    match &outcome {
        CccOutcome::Cycle(days) if *days < Decimal::ZERO => {
            warnings.push(format!(
                "Negative cash conversion cycle ({days} days): suppliers fund operations."
            ));
        }
        CccOutcome::Incomplete(msg) => warnings.push(msg.clone()),
        _ => {}
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cash Conversion Cycle (DSO + DIO - DPO)",
        input,
        warnings,
        elapsed,
        CccAnalysis { terms, outcome },
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn resolve_cycle(input: &CccInput) -> RatioResult<(Vec<ResolvedTerm>, CccOutcome)> {
    let mut terms = Vec::with_capacity(CccTerm::ORDER.len());

    for term in CccTerm::ORDER {
        match resolve_term(term, input)? {
            Some(resolved) => terms.push(resolved),
            None => {
                let outcome = CccOutcome::Incomplete(term.missing_message().to_string());
                return Ok((terms, outcome));
            }
        }
    }

    let cycle = terms[0]
        .days
        .checked_add(terms[1].days)
        .and_then(|d| d.checked_sub(terms[2].days))
        .ok_or_else(|| RatioError::Overflow {
            context: "dso + dio - dpo".into(),
        })?;
    Ok((terms, CccOutcome::Cycle(cycle)))
}

/// `Ok(None)` when the term has neither its ratio nor both raw items.
fn resolve_term(term: CccTerm, input: &CccInput) -> RatioResult<Option<ResolvedTerm>> {
    let resolved = match term.sources(input) {
        (Some(days), _, _) => Some(ResolvedTerm {
            term,
            days,
            source: TermSource::Supplied,
        }),
        (None, Some(numerator), Some(denominator)) => {
            let (_, den_name) = term.raw_names();
            let days = annualised_ratio(numerator, denominator, input.days_in_year, den_name)?;
            Some(ResolvedTerm {
                term,
                days,
                source: TermSource::Derived,
            })
        }
        _ => None,
    };
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn raw_input() -> CccInput {
        CccInput {
            accounts_receivable: Some(dec!(100)),
            revenue: Some(dec!(50)),
            inventory: Some(dec!(20)),
            cost_of_goods_sold: Some(dec!(10)),
            accounts_payable: Some(dec!(5)),
            ..Default::default()
        }
    }

    #[test]
    fn test_ccc_from_raw_items() {
        // 730 + 730 - 182.5 = 1277.5
        let outcome = calculate_ccc(&raw_input()).unwrap();
        assert_eq!(outcome, CccOutcome::Cycle(dec!(1277.5)));
    }

    #[test]
    fn test_ccc_from_ratios() {
        let input = CccInput {
            dso: Some(dec!(45)),
            dio: Some(dec!(60)),
            dpo: Some(dec!(30)),
            ..Default::default()
        };
        assert_eq!(calculate_ccc(&input).unwrap().cycle(), Some(dec!(75)));
    }

    #[test]
    fn test_supplied_ratios_take_precedence() {
        let input = CccInput {
            dso: Some(dec!(45)),
            dio: Some(dec!(60)),
            dpo: Some(dec!(30)),
            ..raw_input()
        };
        assert_eq!(calculate_ccc(&input).unwrap(), CccOutcome::Cycle(dec!(75)));
    }

    #[test]
    fn test_mixed_supplied_and_derived() {
        // dso supplied = 10, dio = 730, dpo = 182.5
        let input = CccInput {
            dso: Some(dec!(10)),
            accounts_receivable: None,
            revenue: None,
            ..raw_input()
        };
        assert_eq!(
            calculate_ccc(&input).unwrap(),
            CccOutcome::Cycle(dec!(557.5))
        );
    }

    #[test]
    fn test_all_absent_reports_dso_first() {
        let outcome = calculate_ccc(&CccInput::default()).unwrap();
        assert_eq!(
            outcome,
            CccOutcome::Incomplete(
                "Either dso or both accounts_receivable and revenue must be provided".into()
            )
        );
        assert!(!outcome.is_complete());
        assert_eq!(outcome.cycle(), None);
    }

    #[test]
    fn test_missing_dio_message() {
        let input = CccInput {
            dso: Some(dec!(40)),
            inventory: Some(dec!(20)),
            ..Default::default()
        };
        assert_eq!(
            calculate_ccc(&input).unwrap(),
            CccOutcome::Incomplete("Either dio or both inventory and cogs must be provided".into())
        );
    }

    #[test]
    fn test_missing_dpo_message() {
        let input = CccInput {
            accounts_payable: None,
            ..raw_input()
        };
        assert_eq!(
            calculate_ccc(&input).unwrap(),
            CccOutcome::Incomplete(
                "Either dpo or both accounts_payable and cogs must be provided".into()
            )
        );
    }

    #[test]
    fn test_zero_revenue_on_raw_path_is_hard_error() {
        let input = CccInput {
            revenue: Some(Decimal::ZERO),
            ..raw_input()
        };
        match calculate_ccc(&input).unwrap_err() {
            RatioError::InvalidDivisor { context } => assert_eq!(context, "revenue"),
            other => panic!("Expected InvalidDivisor, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_days_ignored_when_all_ratios_supplied() {
        let input = CccInput {
            dso: Some(dec!(1)),
            dio: Some(dec!(2)),
            dpo: Some(dec!(3)),
            days_in_year: 0,
            ..Default::default()
        };
        assert_eq!(calculate_ccc(&input).unwrap(), CccOutcome::Cycle(dec!(0)));
    }

    #[test]
    fn test_cycle_overflow_is_an_error() {
        let input = CccInput {
            dso: Some(Decimal::MAX),
            dio: Some(Decimal::MAX),
            dpo: Some(Decimal::ZERO),
            ..Default::default()
        };
        match calculate_ccc(&input).unwrap_err() {
            RatioError::Overflow { context } => assert_eq!(context, "dso + dio - dpo"),
            other => panic!("Expected Overflow, got {other:?}"),
        }
    }

    #[test]
    fn test_large_terms_that_cancel_do_not_overflow() {
        let input = CccInput {
            dso: Some(Decimal::MAX),
            dio: Some(Decimal::ZERO),
            dpo: Some(Decimal::MAX),
            ..Default::default()
        };
        assert_eq!(calculate_ccc(&input).unwrap(), CccOutcome::Cycle(Decimal::ZERO));
    }

    #[test]
    fn test_derived_term_overflow_is_an_error() {
        let input = CccInput {
            accounts_receivable: Some(Decimal::MAX),
            revenue: Some(dec!(0.1)),
            ..raw_input()
        };
        assert!(matches!(
            calculate_ccc(&input).unwrap_err(),
            RatioError::Overflow { .. }
        ));
    }

    #[test]
    fn test_idempotent() {
        let input = raw_input();
        let first = calculate_ccc(&input).unwrap();
        let second = calculate_ccc(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_analyze_breakdown_and_sources() {
        let input = CccInput {
            dso: Some(dec!(10)),
            ..raw_input()
        };
        let result = analyze_ccc(&input).unwrap();
        let terms = &result.result.terms;
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[0].source, TermSource::Supplied);
        assert_eq!(terms[1].source, TermSource::Derived);
        assert_eq!(terms[1].days, dec!(730));
        assert_eq!(terms[2].days, dec!(182.5));
        assert_eq!(result.result.outcome, CccOutcome::Cycle(dec!(557.5)));
        assert!(result.warnings.iter().any(|w| w.contains("ignored")));
    }

    #[test]
    fn test_analyze_incomplete_keeps_resolved_prefix() {
        let input = CccInput {
            dso: Some(dec!(40)),
            ..Default::default()
        };
        let result = analyze_ccc(&input).unwrap();
        assert_eq!(result.result.terms.len(), 1);
        assert!(!result.result.outcome.is_complete());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_negative_cycle_warning() {
        let input = CccInput {
            dso: Some(dec!(5)),
            dio: Some(dec!(10)),
            dpo: Some(dec!(60)),
            ..Default::default()
        };
        let result = analyze_ccc(&input).unwrap();
        assert_eq!(result.result.outcome.cycle(), Some(dec!(-45)));
        assert!(result.warnings.iter().any(|w| w.contains("Negative")));
    }

    #[test]
    fn test_analyze_non_standard_day_count_warning() {
        let input = CccInput {
            days_in_year: 360,
            ..raw_input()
        };
        let result = analyze_ccc(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("360-day")));
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_input_deserialises_with_defaults() {
        let input: CccInput =
            serde_json::from_str(r#"{"dso": "12", "inventory": "20", "cogs": "10", "dpo": "3"}"#)
                .unwrap();
        assert_eq!(input.days_in_year, DEFAULT_DAYS_IN_YEAR);
        assert_eq!(input.cost_of_goods_sold, Some(dec!(10)));
        // 12 + 730 - 3
        assert_eq!(calculate_ccc(&input).unwrap().cycle(), Some(dec!(739)));
    }

    #[test]
    fn test_outcome_serialises_tagged() {
        let json = serde_json::to_value(CccOutcome::Incomplete("x".into())).unwrap();
        assert_eq!(json, serde_json::json!({"status": "incomplete", "value": "x"}));
    }
}
