//! UK tax rates and thresholds (2024/25)

use serde::{Deserialize, Serialize};

/// Which income tax schedule applies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    /// England, Wales and Northern Ireland
    #[default]
    RestOfUk,
    Scotland,
}

/// Income above `threshold` is taxed at `rate`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

/// Tax tables. Bracket lists are ordered from the highest threshold down
/// and end with a zero threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UkTaxConfig {
    pub income_tax_brackets: Vec<TaxBracket>,
    pub scottish_income_tax_brackets: Vec<TaxBracket>,
    pub personal_allowance: f64,
    pub basic_rate_threshold: f64,

    pub ni_primary_threshold: f64,
    pub ni_upper_earnings_limit: f64,
    pub ni_main_rate: f64,
    pub ni_upper_rate: f64,

    pub cgt_annual_exemption: f64,
    pub cgt_basic_rate: f64,
    pub cgt_higher_rate: f64,
}

impl Default for UkTaxConfig {
    fn default() -> Self {
        Self {
            income_tax_brackets: vec![
                TaxBracket {
                    threshold: 125_140.0,
                    rate: 0.45,
                },
                TaxBracket {
                    threshold: 50_270.0,
                    rate: 0.40,
                },
                TaxBracket {
                    threshold: 0.0,
                    rate: 0.20,
                },
            ],
            scottish_income_tax_brackets: vec![
                TaxBracket {
                    threshold: 62_500.0,
                    rate: 0.47,
                },
                TaxBracket {
                    threshold: 39_800.0,
                    rate: 0.42,
                },
                TaxBracket {
                    threshold: 23_600.0,
                    rate: 0.21,
                },
                TaxBracket {
                    threshold: 15_100.0,
                    rate: 0.20,
                },
                TaxBracket {
                    threshold: 0.0,
                    rate: 0.19,
                },
            ],
            personal_allowance: 12_570.0,
            basic_rate_threshold: 50_270.0,

            ni_primary_threshold: 12_570.0,
            ni_upper_earnings_limit: 50_270.0,
            ni_main_rate: 0.08,
            ni_upper_rate: 0.02,

            cgt_annual_exemption: 12_300.0,
            cgt_basic_rate: 0.10,
            cgt_higher_rate: 0.20,
        }
    }
}

impl UkTaxConfig {
    pub fn brackets(&self, jurisdiction: Jurisdiction) -> &[TaxBracket] {
        match jurisdiction {
            Jurisdiction::RestOfUk => &self.income_tax_brackets,
            Jurisdiction::Scotland => &self.scottish_income_tax_brackets,
        }
    }
}
