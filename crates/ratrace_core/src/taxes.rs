//! UK tax calculations
//!
//! Income tax, National Insurance and capital gains tax for a single tax
//! year, using the schedules in `UkTaxConfig`. All functions are pure.

use serde::{Deserialize, Serialize};

use crate::model::{Jurisdiction, Person, TaxBracket, UkTaxConfig};

/// Annual income by source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeSources {
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub pension: f64,
    #[serde(default)]
    pub dividends: f64,
    #[serde(default)]
    pub capital_gains: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub gross_income: f64,
    pub taxable_income: f64,
    pub income_tax: f64,
    pub national_insurance: f64,
    pub capital_gains_tax: f64,
    pub total_tax: f64,
    /// Total tax over gross income, as a fraction
    pub effective_rate: f64,
}

impl TaxCalculationResult {
    pub fn net_income(&self) -> f64 {
        self.gross_income - self.total_tax
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxEfficiencyMetrics {
    pub effective_rate: f64,
    pub marginal_rate: f64,
    /// Gross income over gross income plus allowance, capped at 1
    pub allowance_utilization: f64,
    pub total_tax: f64,
}

/// Apply brackets top-down: income above each threshold is taxed at that
/// bracket's rate, then the remainder falls through to the next bracket.
fn tax_from_top(income: f64, brackets: &[TaxBracket]) -> f64 {
    let mut remaining = income;
    let mut tax = 0.0;
    for bracket in brackets {
        if remaining > bracket.threshold {
            tax += (remaining - bracket.threshold) * bracket.rate;
            remaining = bracket.threshold;
        }
    }
    tax
}

/// Income tax on taxable income (after the personal allowance)
pub fn calculate_income_tax(
    taxable_income: f64,
    jurisdiction: Jurisdiction,
    config: &UkTaxConfig,
) -> f64 {
    if taxable_income <= 0.0 {
        return 0.0;
    }
    tax_from_top(taxable_income, config.brackets(jurisdiction))
}

/// Employee Class 1 contributions on gross earnings
pub fn calculate_national_insurance(gross_income: f64, config: &UkTaxConfig) -> f64 {
    if gross_income <= config.ni_primary_threshold {
        return 0.0;
    }
    let mut earnings = gross_income;
    let mut ni = 0.0;
    if earnings > config.ni_upper_earnings_limit {
        ni += (earnings - config.ni_upper_earnings_limit) * config.ni_upper_rate;
        earnings = config.ni_upper_earnings_limit;
    }
    if earnings > config.ni_primary_threshold {
        ni += (earnings - config.ni_primary_threshold) * config.ni_main_rate;
    }
    ni
}

/// Gains above the annual exemption, at the higher rate when other income
/// plus gains exceed the basic-rate threshold
pub fn calculate_capital_gains_tax(
    capital_gains: f64,
    other_income: f64,
    config: &UkTaxConfig,
) -> f64 {
    if capital_gains <= 0.0 {
        return 0.0;
    }
    let taxable = (capital_gains - config.cgt_annual_exemption).max(0.0);
    if taxable <= 0.0 {
        return 0.0;
    }
    let rate = if other_income + capital_gains > config.basic_rate_threshold {
        config.cgt_higher_rate
    } else {
        config.cgt_basic_rate
    };
    taxable * rate
}

/// Every tax owed by `person` on `income`. National Insurance is charged on
/// salary plus pension; dividends count toward gross income only.
pub fn calculate_total_tax(
    person: &Person,
    income: &IncomeSources,
    config: &UkTaxConfig,
) -> TaxCalculationResult {
    let gross_income = income.salary + income.pension + income.dividends;
    let taxable_income = (gross_income - person.personal_allowance).max(0.0);

    let income_tax = calculate_income_tax(taxable_income, person.jurisdiction(), config);
    let national_insurance = calculate_national_insurance(income.salary + income.pension, config);
    let capital_gains_tax = calculate_capital_gains_tax(income.capital_gains, gross_income, config);

    let total_tax = income_tax + national_insurance + capital_gains_tax;
    let effective_rate = if gross_income > 0.0 {
        total_tax / gross_income
    } else {
        0.0
    };

    TaxCalculationResult {
        gross_income,
        taxable_income,
        income_tax,
        national_insurance,
        capital_gains_tax,
        total_tax,
        effective_rate,
    }
}

/// Rate on the next pound of taxable income
pub fn marginal_rate(taxable_income: f64, jurisdiction: Jurisdiction, config: &UkTaxConfig) -> f64 {
    let brackets = config.brackets(jurisdiction);
    brackets
        .iter()
        .find(|b| taxable_income > b.threshold)
        .or(brackets.last())
        .map_or(0.0, |b| b.rate)
}

pub fn calculate_tax_efficiency(
    person: &Person,
    result: &TaxCalculationResult,
    config: &UkTaxConfig,
) -> TaxEfficiencyMetrics {
    let gross = result.gross_income;
    let allowance_utilization = if gross > 0.0 {
        (gross / (gross + person.personal_allowance)).min(1.0)
    } else {
        0.0
    };
    TaxEfficiencyMetrics {
        effective_rate: result.effective_rate,
        marginal_rate: marginal_rate(result.taxable_income, person.jurisdiction(), config),
        allowance_utilization,
        total_tax: result.total_tax,
    }
}
