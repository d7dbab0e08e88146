//! A person in the UK tax system
//!
//! Holds allowances, tax code and links to the entities that carry the
//! person's income and holdings. Tax results are returned by
//! `crate::taxes::calculate_total_tax`; the person itself is never updated.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityCategory};
use super::ids::EntityId;
use super::tax_config::Jurisdiction;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    CivilPartnership,
    Divorced,
    Widowed,
}

fn default_tax_code() -> String {
    "1257L".to_string()
}

fn default_personal_allowance() -> f64 {
    12_570.0
}

fn default_tax_year() -> i16 {
    2024
}

fn default_date_of_birth() -> Date {
    jiff::civil::date(1995, 1, 1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default = "default_date_of_birth")]
    pub date_of_birth: Date,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    #[serde(default = "default_tax_code")]
    pub tax_code: String,
    #[serde(default = "default_personal_allowance")]
    pub personal_allowance: f64,
    #[serde(default)]
    pub marriage_allowance: f64,
    #[serde(default)]
    pub blind_persons_allowance: f64,
    #[serde(default)]
    pub scottish_taxpayer: bool,
    /// UK tax year by starting year (2024 = 2024/25)
    #[serde(default = "default_tax_year")]
    pub tax_year: i16,

    #[serde(default)]
    pub salary_entities: Vec<EntityId>,
    #[serde(default)]
    pub pension_entities: Vec<EntityId>,
    #[serde(default)]
    pub dividend_entities: Vec<EntityId>,
    #[serde(default)]
    pub owned_assets: Vec<EntityId>,
    #[serde(default)]
    pub owned_liabilities: Vec<EntityId>,
}

impl Person {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: default_date_of_birth(),
            marital_status: MaritalStatus::default(),
            tax_code: default_tax_code(),
            personal_allowance: default_personal_allowance(),
            marriage_allowance: 0.0,
            blind_persons_allowance: 0.0,
            scottish_taxpayer: false,
            tax_year: default_tax_year(),
            salary_entities: Vec::new(),
            pension_entities: Vec::new(),
            dividend_entities: Vec::new(),
            owned_assets: Vec::new(),
            owned_liabilities: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn jurisdiction(&self) -> Jurisdiction {
        if self.scottish_taxpayer {
            Jurisdiction::Scotland
        } else {
            Jurisdiction::RestOfUk
        }
    }

    /// Age in whole years on `as_of`
    pub fn age(&self, as_of: Date) -> i16 {
        let mut age = as_of.year() - self.date_of_birth.year();
        if (as_of.month(), as_of.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age
    }

    pub fn has_marriage_allowance(&self) -> bool {
        self.marriage_allowance > 0.0
    }

    pub fn is_blind(&self) -> bool {
        self.blind_persons_allowance > 0.0
    }

    pub fn tax_calculation_entity_id(&self) -> EntityId {
        EntityId(format!("{}_tax_calculation", self.id))
    }

    pub fn personal_allowance_entity_id(&self) -> EntityId {
        EntityId(format!("{}_personal_allowance", self.id))
    }

    pub fn entities(&self) -> Vec<Entity> {
        let name = self.name();
        vec![
            Entity::new(self.tax_calculation_entity_id(), format!("{name} Tax Calculation"))
                .with_category(EntityCategory::Expense)
                .with_detailed_category("Tax Calculation"),
            Entity::new(
                self.personal_allowance_entity_id(),
                format!("{name} Personal Allowance"),
            )
            .with_category(EntityCategory::Asset)
            .with_detailed_category("Tax Allowance")
            .with_initial_value(self.personal_allowance),
        ]
    }

    pub fn validate(&self, as_of: Date) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                context: "person".to_string(),
                field: "id",
            });
        }
        let context = format!("person {}", self.id);
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                context,
                field: "first name",
            });
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                context,
                field: "last name",
            });
        }
        if self.personal_allowance < 0.0 {
            return Err(ValidationError::Negative {
                context,
                field: "personal allowance",
                value: self.personal_allowance,
            });
        }
        if self.date_of_birth > as_of {
            return Err(ValidationError::BirthDateAfter {
                context,
                date_of_birth: self.date_of_birth,
                as_of,
            });
        }
        if !is_valid_tax_code(&self.tax_code) {
            return Err(ValidationError::InvalidTaxCode {
                context,
                code: self.tax_code.clone(),
            });
        }
        Ok(())
    }

    pub fn describe(&self, as_of: Date) -> String {
        let mut out = format!(
            "Person [{}]: {} ({:?}, {} years old)",
            self.id,
            self.name(),
            self.marital_status,
            self.age(as_of)
        );
        out.push_str(&format!("\n  Tax Code: {}", self.tax_code));
        out.push_str(&format!(
            "\n  Personal Allowance: {:.0}",
            self.personal_allowance
        ));
        if self.has_marriage_allowance() {
            out.push_str(&format!(
                "\n  Marriage Allowance: {:.0}",
                self.marriage_allowance
            ));
        }
        if self.is_blind() {
            out.push_str(&format!(
                "\n  Blind Person's Allowance: {:.0}",
                self.blind_persons_allowance
            ));
        }
        out.push_str(&format!(
            "\n  Tax Year: {}/{}",
            self.tax_year,
            self.tax_year + 1
        ));
        for (label, ids) in [
            ("Salary Sources", &self.salary_entities),
            ("Pension Sources", &self.pension_entities),
            ("Owned Assets", &self.owned_assets),
        ] {
            if !ids.is_empty() {
                let joined: Vec<&str> = ids.iter().map(EntityId::as_str).collect();
                out.push_str(&format!("\n  {label}: {}", joined.join(", ")));
            }
        }
        out
    }
}

/// Digits followed by one suffix letter, e.g. "1257L"
fn is_valid_tax_code(code: &str) -> bool {
    let Some(suffix) = code.chars().last() else {
        return false;
    };
    let digits = &code[..code.len() - suffix.len_utf8()];
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && matches!(suffix, 'L' | 'M' | 'N' | 'T' | 'P' | 'Y')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> Date {
        jiff::civil::date(2025, 1, 1)
    }

    #[test]
    fn test_tax_code_format() {
        assert!(is_valid_tax_code("1257L"));
        assert!(is_valid_tax_code("0T"));
        assert!(!is_valid_tax_code("L"));
        assert!(!is_valid_tax_code("1257"));
        assert!(!is_valid_tax_code("BR"));
        assert!(!is_valid_tax_code(""));
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Person::new("p1", "Ada", "Lovelace").validate(as_of()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut p = Person::new("p1", "Ada", "");
        assert!(matches!(
            p.validate(as_of()),
            Err(ValidationError::EmptyField { field: "last name", .. })
        ));

        p.last_name = "Lovelace".into();
        p.personal_allowance = -1.0;
        assert!(matches!(
            p.validate(as_of()),
            Err(ValidationError::Negative { .. })
        ));

        p.personal_allowance = 12_570.0;
        p.date_of_birth = jiff::civil::date(2030, 1, 1);
        assert!(matches!(
            p.validate(as_of()),
            Err(ValidationError::BirthDateAfter { .. })
        ));

        p.date_of_birth = jiff::civil::date(1990, 1, 1);
        p.tax_code = "XYZ".into();
        assert!(matches!(
            p.validate(as_of()),
            Err(ValidationError::InvalidTaxCode { .. })
        ));
    }

    #[test]
    fn test_age_respects_birthday() {
        let mut p = Person::new("p", "A", "B");
        p.date_of_birth = jiff::civil::date(1990, 6, 15);
        assert_eq!(p.age(jiff::civil::date(2025, 6, 14)), 34);
        assert_eq!(p.age(jiff::civil::date(2025, 6, 15)), 35);
    }

    #[test]
    fn test_describe_lists_extra_allowances() {
        let mut p = Person::new("p1", "Ada", "Lovelace");
        p.date_of_birth = jiff::civil::date(1990, 1, 1);
        let plain = p.describe(as_of());
        assert!(plain.starts_with("Person [p1]: Ada Lovelace"));
        assert!(plain.contains("35 years old"));
        assert!(!plain.contains("Marriage Allowance"));
        assert!(!plain.contains("Blind"));

        p.marriage_allowance = 1_260.0;
        p.blind_persons_allowance = 3_070.0;
        assert!(p.has_marriage_allowance());
        assert!(p.is_blind());
        let text = p.describe(as_of());
        assert!(text.contains("\n  Marriage Allowance: 1260"));
        assert!(text.contains("\n  Blind Person's Allowance: 3070"));
    }

    #[test]
    fn test_entities() {
        let p = Person::new("p1", "Ada", "Lovelace");
        let entities = p.entities();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].initial_value, 12_570.0);
        assert_eq!(entities[0].category, EntityCategory::Expense);
    }
}
