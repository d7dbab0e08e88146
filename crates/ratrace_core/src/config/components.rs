//! Reusable scenario building blocks
//!
//! A component expands into a set of entities and the per-period events
//! that drive them. Every generated event is targeted and scheduled for
//! every period; annual and monthly figures are scaled to the period length.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{CalculationRule, Entity, EntityCategory, EntityId, Event, Person};
use crate::timeline::PeriodLength;

/// The closed set of component kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Component {
    RentalProperty(RentalProperty),
    InvestmentPortfolio(InvestmentPortfolio),
    Person(Person),
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Component::RentalProperty(c) => &c.id,
            Component::InvestmentPortfolio(c) => &c.id,
            Component::Person(p) => &p.id,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Component::RentalProperty(c) => c.name(),
            Component::InvestmentPortfolio(c) => c.name(),
            Component::Person(p) => p.name(),
        }
    }

    pub fn entities(&self) -> Vec<Entity> {
        match self {
            Component::RentalProperty(c) => c.entities(),
            Component::InvestmentPortfolio(c) => c.entities(),
            Component::Person(p) => p.entities(),
        }
    }

    pub fn events(&self, period_length: PeriodLength) -> Vec<Event> {
        match self {
            Component::RentalProperty(c) => c.events(period_length),
            Component::InvestmentPortfolio(c) => c.events(period_length),
            Component::Person(_) => Vec::new(),
        }
    }

    /// `as_of` is the scenario start date
    pub fn validate(&self, as_of: Date) -> Result<(), ValidationError> {
        match self {
            Component::RentalProperty(c) => c.validate(),
            Component::InvestmentPortfolio(c) => c.validate(),
            Component::Person(p) => p.validate(as_of),
        }
    }

    pub fn describe(&self, as_of: Date) -> String {
        match self {
            Component::RentalProperty(c) => c.describe(),
            Component::InvestmentPortfolio(c) => c.describe(),
            Component::Person(p) => p.describe(as_of),
        }
    }
}

fn months_per_period(period_length: PeriodLength) -> f64 {
    12.0 / f64::from(period_length.periods_per_year())
}

fn check_range(
    context: &str,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            context: context.to_string(),
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_non_negative(context: &str, field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::Negative {
            context: context.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

fn check_id(kind: &str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyField {
            context: kind.to_string(),
            field: "id",
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rental property
// ---------------------------------------------------------------------------

fn default_appreciation_rate() -> f64 {
    0.03
}

fn default_mortgage_rate() -> f64 {
    0.045
}

fn default_mortgage_term_years() -> u32 {
    30
}

/// Longest mortgage term accepted by validation
pub const MAX_MORTGAGE_TERM_YEARS: u32 = 50;

fn default_vacancy_rate() -> f64 {
    0.05
}

fn default_property_tax_rate() -> f64 {
    0.012
}

/// A let property with optional mortgage and running costs.
///
/// Expense entities accumulate positive totals. The mortgage entity starts
/// at the negative amount owed and each payment moves it toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalProperty {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub property_value: f64,
    /// Annual, as a fraction
    #[serde(default = "default_appreciation_rate")]
    pub appreciation_rate: f64,
    #[serde(default)]
    pub mortgage_amount: f64,
    #[serde(default = "default_mortgage_rate")]
    pub mortgage_rate: f64,
    #[serde(default = "default_mortgage_term_years")]
    pub mortgage_term_years: u32,
    #[serde(default)]
    pub monthly_rent: f64,
    #[serde(default = "default_vacancy_rate")]
    pub vacancy_rate: f64,
    /// Monthly maintenance and utilities
    #[serde(default)]
    pub ancillary_costs: f64,
    #[serde(default = "default_property_tax_rate")]
    pub property_tax_rate: f64,
    #[serde(default)]
    pub insurance_annual: f64,
}

impl RentalProperty {
    pub fn new(id: impl Into<String>, property_value: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            property_value,
            appreciation_rate: default_appreciation_rate(),
            mortgage_amount: 0.0,
            mortgage_rate: default_mortgage_rate(),
            mortgage_term_years: default_mortgage_term_years(),
            monthly_rent: 0.0,
            vacancy_rate: default_vacancy_rate(),
            ancillary_costs: 0.0,
            property_tax_rate: default_property_tax_rate(),
            insurance_annual: 0.0,
        }
    }

    #[must_use]
    pub fn mortgage(mut self, amount: f64, rate: f64, term_years: u32) -> Self {
        self.mortgage_amount = amount;
        self.mortgage_rate = rate;
        self.mortgage_term_years = term_years;
        self
    }

    #[must_use]
    pub fn rent(mut self, monthly_rent: f64, vacancy_rate: f64) -> Self {
        self.monthly_rent = monthly_rent;
        self.vacancy_rate = vacancy_rate;
        self
    }

    #[must_use]
    pub fn costs(mut self, ancillary_monthly: f64, property_tax_rate: f64, insurance_annual: f64) -> Self {
        self.ancillary_costs = ancillary_monthly;
        self.property_tax_rate = property_tax_rate;
        self.insurance_annual = insurance_annual;
        self
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Rental Property {}", self.id))
    }

    fn entity_id(&self, suffix: &str) -> EntityId {
        EntityId(format!("{}_{suffix}", self.id))
    }

    pub fn property_id(&self) -> EntityId {
        self.entity_id("property")
    }

    pub fn mortgage_id(&self) -> EntityId {
        self.entity_id("mortgage")
    }

    pub fn rent_income_id(&self) -> EntityId {
        self.entity_id("rent_income")
    }

    pub fn ancillary_id(&self) -> EntityId {
        self.entity_id("ancillary_expenses")
    }

    pub fn property_tax_id(&self) -> EntityId {
        self.entity_id("property_tax")
    }

    pub fn insurance_id(&self) -> EntityId {
        self.entity_id("insurance")
    }

    pub fn entities(&self) -> Vec<Entity> {
        let name = self.name();
        let mut entities = vec![
            Entity::new(self.property_id(), format!("{name} Property"))
                .with_category(EntityCategory::Asset)
                .with_detailed_category("Real Estate")
                .with_initial_value(self.property_value),
        ];
        if self.mortgage_amount > 0.0 {
            entities.push(
                Entity::new(self.mortgage_id(), format!("{name} Mortgage"))
                    .with_category(EntityCategory::Liability)
                    .with_detailed_category("Secured Debt")
                    .with_initial_value(-self.mortgage_amount),
            );
        }
        entities.push(
            Entity::new(self.rent_income_id(), format!("{name} Rental Income"))
                .with_category(EntityCategory::Income)
                .with_detailed_category("Rental Income"),
        );
        let expenses = [
            (self.ancillary_costs, self.ancillary_id(), "Ancillary Expenses", "Property Maintenance"),
            (self.property_tax_rate, self.property_tax_id(), "Property Tax", "Property Tax"),
            (self.insurance_annual, self.insurance_id(), "Insurance", "Property Insurance"),
        ];
        for (gate, id, label, detail) in expenses {
            if gate > 0.0 {
                entities.push(
                    Entity::new(id, format!("{name} {label}"))
                        .with_category(EntityCategory::Expense)
                        .with_detailed_category(detail),
                );
            }
        }
        entities
    }

    pub fn events(&self, period_length: PeriodLength) -> Vec<Event> {
        let months = months_per_period(period_length);
        let mut events = Vec::new();

        if self.appreciation_rate > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_appreciation", self.id),
                    period_length.per_period(self.property_value * self.appreciation_rate),
                )
                .labeled("appreciation")
                .targeting(self.property_id()),
            );
        }
        if self.monthly_rent > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_rent_collection", self.id),
                    self.monthly_rent * (1.0 - self.vacancy_rate) * months,
                )
                .labeled("rent")
                .targeting(self.rent_income_id()),
            );
        }
        if self.ancillary_costs > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_ancillary_expenses_event", self.id),
                    self.ancillary_costs * months,
                )
                .labeled("ancillary_costs")
                .targeting(self.ancillary_id()),
            );
        }
        if self.mortgage_amount > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_mortgage_payment", self.id),
                    self.monthly_mortgage_payment() * months,
                )
                .labeled("mortgage_payment")
                .targeting(self.mortgage_id()),
            );
        }
        if self.property_tax_rate > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_property_tax", self.id),
                    period_length.per_period(self.property_value * self.property_tax_rate),
                )
                .labeled("property_tax")
                .targeting(self.property_tax_id()),
            );
        }
        if self.insurance_annual > 0.0 {
            events.push(
                Event::recurring(
                    format!("{}_insurance", self.id),
                    period_length.per_period(self.insurance_annual),
                )
                .labeled("insurance")
                .targeting(self.insurance_id()),
            );
        }

        events.into_iter().map(Event::every_period).collect()
    }

    /// Standard annuity payment; 0 without a mortgage, rate or term
    pub fn monthly_mortgage_payment(&self) -> f64 {
        if self.mortgage_amount <= 0.0 || self.mortgage_rate <= 0.0 || self.mortgage_term_years == 0 {
            return 0.0;
        }
        let monthly_rate = self.mortgage_rate / 12.0;
        let payments = i32::try_from(self.mortgage_term_years.saturating_mul(12)).unwrap_or(i32::MAX);
        let growth = (1.0 + monthly_rate).powi(payments);
        self.mortgage_amount * monthly_rate / (1.0 - growth.recip())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("rental property", &self.id)?;
        let context = format!("rental property {}", self.id);
        if self.property_value <= 0.0 {
            return Err(ValidationError::NotPositive {
                context,
                field: "property value",
                value: self.property_value,
            });
        }
        if self.mortgage_amount > self.property_value {
            return Err(ValidationError::MortgageExceedsPropertyValue {
                context,
                mortgage: self.mortgage_amount,
                property_value: self.property_value,
            });
        }
        check_range(&context, "mortgage rate", self.mortgage_rate, 0.0, 1.0)?;
        check_range(
            &context,
            "mortgage term",
            f64::from(self.mortgage_term_years),
            0.0,
            f64::from(MAX_MORTGAGE_TERM_YEARS),
        )?;
        check_range(&context, "appreciation rate", self.appreciation_rate, -0.5, 1.0)?;
        check_non_negative(&context, "monthly rent", self.monthly_rent)?;
        check_range(&context, "vacancy rate", self.vacancy_rate, 0.0, 1.0)?;
        check_non_negative(&context, "ancillary costs", self.ancillary_costs)?;
        check_range(&context, "property tax rate", self.property_tax_rate, 0.0, 0.1)?;
        check_non_negative(&context, "insurance", self.insurance_annual)
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "Rental Property [{}]: {:.0} property",
            self.id, self.property_value
        );
        if self.mortgage_amount > 0.0 {
            out.push_str(&format!(
                ", {:.0} mortgage at {:.1}%",
                self.mortgage_amount,
                self.mortgage_rate * 100.0
            ));
        }
        if self.monthly_rent > 0.0 {
            out.push_str(&format!(", {:.0}/month rent", self.monthly_rent));
            if self.vacancy_rate > 0.0 {
                out.push_str(&format!(
                    " ({:.0}% occupancy)",
                    (1.0 - self.vacancy_rate) * 100.0
                ));
            }
        }
        if self.appreciation_rate > 0.0 {
            out.push_str(&format!(
                ", {:.1}% annual appreciation",
                self.appreciation_rate * 100.0
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Investment portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    #[default]
    Stocks,
    Bonds,
    Options,
    Crypto,
}

impl InvestmentType {
    pub fn category_label(&self) -> &'static str {
        match self {
            InvestmentType::Stocks => "Equity Investment",
            InvestmentType::Bonds => "Fixed Income Investment",
            InvestmentType::Options => "Derivative Investment",
            InvestmentType::Crypto => "Cryptocurrency Asset",
        }
    }

    pub fn inflation_affected(&self) -> bool {
        !matches!(self, InvestmentType::Crypto)
    }

    fn label(&self) -> &'static str {
        match self {
            InvestmentType::Stocks => "STOCKS",
            InvestmentType::Bonds => "BONDS",
            InvestmentType::Options => "OPTIONS",
            InvestmentType::Crypto => "CRYPTO",
        }
    }
}

fn default_expected_return() -> f64 {
    0.07
}

fn default_volatility() -> f64 {
    0.15
}

fn default_inflation_adjustment() -> f64 {
    0.02
}

/// An investment account with optional monthly contributions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPortfolio {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub initial_value: f64,
    /// Annual, as a fraction
    #[serde(default = "default_expected_return")]
    pub expected_return: f64,
    #[serde(default)]
    pub monthly_contribution: f64,
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default = "default_inflation_adjustment")]
    pub inflation_adjustment: f64,
    /// Seed for the return draws
    #[serde(default)]
    pub seed: u64,
}

impl InvestmentPortfolio {
    pub fn new(id: impl Into<String>, investment_type: InvestmentType, initial_value: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            investment_type,
            initial_value,
            expected_return: default_expected_return(),
            monthly_contribution: 0.0,
            volatility: default_volatility(),
            inflation_adjustment: default_inflation_adjustment(),
            seed: 0,
        }
    }

    #[must_use]
    pub fn contributing(mut self, monthly: f64) -> Self {
        self.monthly_contribution = monthly;
        self
    }

    #[must_use]
    pub fn returns(mut self, expected_return: f64, volatility: f64) -> Self {
        self.expected_return = expected_return;
        self.volatility = volatility;
        self
    }

    #[must_use]
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{} Portfolio {}", self.investment_type.label(), self.id))
    }

    pub fn account_id(&self) -> EntityId {
        EntityId(format!("{}_account", self.id))
    }

    pub fn contributions_id(&self) -> EntityId {
        EntityId(format!("{}_contributions", self.id))
    }

    pub fn entities(&self) -> Vec<Entity> {
        let name = self.name();
        let mut entities = vec![
            Entity::new(self.account_id(), format!("{name} Account"))
                .with_category(EntityCategory::Asset)
                .with_detailed_category(self.investment_type.category_label())
                .with_initial_value(self.initial_value),
        ];
        if self.monthly_contribution > 0.0 {
            entities.push(
                Entity::new(self.contributions_id(), format!("{name} Contributions"))
                    .with_category(EntityCategory::Income)
                    .with_detailed_category("Investment Contributions"),
            );
        }
        entities
    }

    /// Contributions land in the account and in the tracker; returns apply
    /// to the account only, after contributions.
    pub fn events(&self, period_length: PeriodLength) -> Vec<Event> {
        let mut events = Vec::new();

        if self.monthly_contribution > 0.0 {
            let amount = self.monthly_contribution * months_per_period(period_length);
            events.push(
                Event::recurring(format!("{}_contribution", self.id), amount)
                    .labeled("contribution")
                    .targeting(self.account_id()),
            );
            events.push(
                Event::recurring(format!("{}_contribution_tracked", self.id), amount)
                    .labeled("contribution")
                    .targeting(self.contributions_id()),
            );
        }
        if self.expected_return > 0.0 {
            events.push(
                Event::calculation(
                    format!("{}_returns", self.id),
                    CalculationRule::InvestmentReturns {
                        expected_return: period_length.per_period(self.expected_return),
                        volatility: self.volatility,
                        inflation_affected: self.investment_type.inflation_affected(),
                        inflation_rate: period_length.per_period(self.inflation_adjustment),
                        seed: self.seed,
                    },
                )
                .labeled("investment_returns")
                .targeting(self.account_id()),
            );
        }

        events.into_iter().map(Event::every_period).collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("investment portfolio", &self.id)?;
        let context = format!("investment portfolio {}", self.id);
        check_non_negative(&context, "initial value", self.initial_value)?;
        check_range(&context, "expected return", self.expected_return, -0.5, 2.0)?;
        check_non_negative(&context, "monthly contribution", self.monthly_contribution)?;
        check_range(&context, "volatility", self.volatility, 0.0, 1.0)?;
        check_range(
            &context,
            "inflation adjustment",
            self.inflation_adjustment,
            -0.1,
            0.1,
        )
    }

    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} Portfolio [{}]: {:.0} initial",
            self.investment_type.label(),
            self.id,
            self.initial_value
        );
        if self.monthly_contribution > 0.0 {
            out.push_str(&format!(
                ", {:.0}/month contributions",
                self.monthly_contribution
            ));
        }
        if self.expected_return > 0.0 {
            out.push_str(&format!(
                ", {:.1}% expected return",
                self.expected_return * 100.0
            ));
            if self.volatility > 0.0 {
                out.push_str(&format!(" (+/-{:.1}% volatility)", self.volatility * 100.0));
            }
        }
        if self.investment_type.inflation_affected() {
            out.push_str(", inflation-adjusted");
        } else {
            out.push_str(", inflation-immune");
        }
        out
    }
}
