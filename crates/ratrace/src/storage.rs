//! Scenario file storage
//!
//! Directory structure:
//! ~/.ratrace/
//!   ratrace.log
//!   scenarios/
//!     savings.yaml
//!     landlord.json
//!
//! Files ending in `.json` are read and written as JSON, everything else
//! as YAML.

use std::fs;
use std::path::{Path, PathBuf};

use ratrace_core::Scenario;

#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Parse(String),
    Serialize(String),
    NotFound(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "IO error: {msg}"),
            StorageError::Parse(msg) => write!(f, "Parse error: {msg}"),
            StorageError::Serialize(msg) => write!(f, "Serialization error: {msg}"),
            StorageError::NotFound(name) => write!(f, "No scenario named {name:?}"),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioFormat {
    Yaml,
    Json,
}

impl ScenarioFormat {
    pub fn from_path(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext == "json") {
            ScenarioFormat::Json
        } else {
            ScenarioFormat::Yaml
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ScenarioFormat::Yaml => "yaml",
            ScenarioFormat::Json => "json",
        }
    }
}

pub fn parse_scenario(content: &str, format: ScenarioFormat) -> Result<Scenario, StorageError> {
    match format {
        ScenarioFormat::Yaml => serde_saphyr::from_str(content)
            .map_err(|e| StorageError::Parse(format!("Failed to parse YAML: {e}"))),
        ScenarioFormat::Json => serde_json::from_str(content)
            .map_err(|e| StorageError::Parse(format!("Failed to parse JSON: {e}"))),
    }
}

pub fn render_scenario(scenario: &Scenario, format: ScenarioFormat) -> Result<String, StorageError> {
    match format {
        ScenarioFormat::Yaml => serde_saphyr::to_string(scenario)
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize scenario: {e}"))),
        ScenarioFormat::Json => serde_json::to_string_pretty(scenario)
            .map_err(|e| StorageError::Serialize(format!("Failed to serialize scenario: {e}"))),
    }
}

pub fn read_scenario(path: &Path) -> Result<Scenario, StorageError> {
    let content = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
    parse_scenario(&content, ScenarioFormat::from_path(path))
}

pub fn write_scenario(path: &Path, scenario: &Scenario) -> Result<(), StorageError> {
    let content = render_scenario(scenario, ScenarioFormat::from_path(path))?;
    fs::write(path, content)
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))
}

/// Scenario files under a data directory
pub struct ScenarioStore {
    root: PathBuf,
}

impl ScenarioStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `~/.ratrace/`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ratrace")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scenarios_dir(&self) -> PathBuf {
        self.root.join("scenarios")
    }

    pub fn exists(&self) -> bool {
        self.root.exists() && self.scenarios_dir().exists()
    }

    pub fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.scenarios_dir())
            .map_err(|e| StorageError::Io(format!("Failed to create scenarios directory: {e}")))
    }

    /// Path a scenario named `name` is saved to in `format`
    pub fn scenario_path(&self, name: &str, format: ScenarioFormat) -> PathBuf {
        self.scenarios_dir()
            .join(format!("{}.{}", sanitize_filename(name), format.extension()))
    }

    /// Stored file for `name`, trying YAML before JSON
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let stem = sanitize_filename(name);
        ["yaml", "yml", "json"]
            .iter()
            .map(|ext| self.scenarios_dir().join(format!("{stem}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Load a scenario by stored name, or from a file path
    pub fn load(&self, reference: &str) -> Result<Scenario, StorageError> {
        let path = Path::new(reference);
        if path.is_file() {
            return read_scenario(path);
        }
        let path = self
            .find(reference)
            .ok_or_else(|| StorageError::NotFound(reference.to_string()))?;
        read_scenario(&path)
    }

    pub fn save(
        &self,
        name: &str,
        scenario: &Scenario,
        format: ScenarioFormat,
    ) -> Result<PathBuf, StorageError> {
        if !self.exists() {
            self.init()?;
        }
        let path = self.scenario_path(name, format);
        write_scenario(&path, scenario)?;
        tracing::debug!(scenario = name, path = %path.display(), "scenario saved");
        Ok(path)
    }

    /// Names of stored scenarios, sorted
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let dir = self.scenarios_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir)
            .map_err(|e| StorageError::Io(format!("Failed to read scenarios directory: {e}")))?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "json")
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratrace_core::config::{InvestmentPortfolio, InvestmentType, RentalProperty};
    use ratrace_core::model::{
        BalanceCondition, CalculationRule, Entity, EntityCategory, EntityId, Event, EventKind,
        Person, PropertyValue, Schedule,
    };
    use ratrace_core::{Component, PeriodLength, ScenarioBuilder, simulate};
    use tempfile::TempDir;

    fn sample() -> Scenario {
        ScenarioBuilder::new()
            .name("Sample")
            .periods(3)
            .entity(Entity::new("cash", "Cash").with_initial_value(50.0))
            .event_for("cash", Event::recurring("top_up", 10.0).every_period())
            .build()
    }

    #[test]
    fn test_init_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = ScenarioStore::new(temp_dir.path().join(".ratrace"));

        assert!(!store.exists());
        store.init().unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_yaml_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = ScenarioStore::new(temp_dir.path().to_path_buf());

        let path = store.save("sample", &sample(), ScenarioFormat::Yaml).unwrap();
        assert!(path.ends_with("scenarios/sample.yaml"));
        assert_eq!(store.load("sample").unwrap(), sample());
    }

    /// Every event variant, every component and every property encoding
    fn household() -> Scenario {
        ScenarioBuilder::new()
            .name("Household")
            .start(2024, 4, 6)
            .period_length(PeriodLength::Quarterly)
            .periods(4)
            .entity(
                Entity::new("current", "Current Account")
                    .with_category(EntityCategory::Asset)
                    .with_detailed_category("Cash")
                    .with_initial_value(2_500.0)
                    .with_property("bank", "Example Bank")
                    .with_property("sort_code", "500")
                    .with_property("overdraft", 500.0)
                    .with_property("joint", true),
            )
            .event_for("current", Event::recurring("wage", 3_000.0).labeled("salary").every_period())
            .event_for(
                "current",
                Event::conditional("sweep", BalanceCondition::GreaterThanOrEqual(10_000.0), -1_000.0)
                    .every_period(),
            )
            .event_for(
                "current",
                Event::calculation("tier", CalculationRule::default()).every_period(),
            )
            .event_for(
                "current",
                Event::calculation(
                    "growth",
                    CalculationRule::InvestmentReturns {
                        expected_return: 0.04,
                        volatility: 0.1,
                        inflation_affected: false,
                        inflation_rate: 0.02,
                        seed: 7,
                    },
                )
                .at_period(3),
            )
            .latent_event(
                Event::creation("open_isa", vec![Entity::new("isa", "ISA").as_template()])
                    .targeting("current")
                    .at_period(2),
            )
            .template("isa", Entity::new("isa", "ISA").as_template())
            .component(Component::RentalProperty(
                RentalProperty::new("flat", 150_000.0)
                    .mortgage(100_000.0, 0.05, 25)
                    .rent(800.0, 0.1),
            ))
            .component(Component::InvestmentPortfolio(
                InvestmentPortfolio::new("btc", InvestmentType::Crypto, 1_000.0).seeded(9),
            ))
            .component(Component::Person(Person::new("me", "Jo", "Bloggs")))
            .build()
    }

    #[test]
    fn test_yaml_round_trip_keeps_every_encoding() {
        let temp_dir = TempDir::new().unwrap();
        let store = ScenarioStore::new(temp_dir.path().to_path_buf());
        let scenario = household();

        store.save("household", &scenario, ScenarioFormat::Yaml).unwrap();
        let back = store.load("household").unwrap();
        assert_eq!(back, scenario);

        let current = back.entity(&EntityId::from("current")).unwrap();
        assert_eq!(
            current.base_properties.get("sort_code"),
            Some(&PropertyValue::Text("500".into()))
        );
        assert_eq!(
            current.base_properties.get("overdraft"),
            Some(&PropertyValue::Number(500.0))
        );
        assert_eq!(
            current.base_properties.get("joint"),
            Some(&PropertyValue::Flag(true))
        );

        let events = &back.event_templates[&EntityId::from("current")];
        assert_eq!(events.len(), 4);
        match &events[0].kind {
            EventKind::Recurring(p) => assert_eq!(p.amount, 3_000.0),
            other => panic!("expected recurring, got {other:?}"),
        }
        assert_eq!(events[0].label, "salary");
        assert_eq!(events[0].schedule, Schedule::EveryPeriod);
        match &events[1].kind {
            EventKind::Conditional(p) => {
                assert_eq!(p.condition, BalanceCondition::GreaterThanOrEqual(10_000.0));
                assert_eq!(p.amount, -1_000.0);
            }
            other => panic!("expected conditional, got {other:?}"),
        }
        assert_eq!(
            events[2].kind,
            EventKind::Calculation(CalculationRule::default())
        );
        match &events[3].kind {
            EventKind::Calculation(CalculationRule::InvestmentReturns {
                expected_return,
                seed,
                inflation_affected,
                ..
            }) => {
                assert_eq!(*expected_return, 0.04);
                assert_eq!(*seed, 7);
                assert!(!inflation_affected);
            }
            other => panic!("expected investment returns, got {other:?}"),
        }
        assert_eq!(events[3].schedule, Schedule::AtPeriod(3));

        let creation = &back.latent_events[0];
        assert_eq!(creation.target, Some(EntityId::from("current")));
        assert_eq!(creation.schedule, Schedule::AtPeriod(2));
        match &creation.kind {
            EventKind::Creation(p) => {
                assert_eq!(p.entities.len(), 1);
                assert!(p.entities[0].is_template);
            }
            other => panic!("expected creation, got {other:?}"),
        }

        assert_eq!(back.components, scenario.components);
        assert!(matches!(back.components[0], Component::RentalProperty(_)));
        assert!(matches!(back.components[1], Component::InvestmentPortfolio(_)));
        assert!(matches!(back.components[2], Component::Person(_)));
    }

    #[test]
    fn test_yaml_round_trip_runs_identically() {
        let scenario = household();
        let yaml = render_scenario(&scenario, ScenarioFormat::Yaml).unwrap();
        let back = parse_scenario(&yaml, ScenarioFormat::Yaml).unwrap();

        let a = simulate(&scenario).unwrap();
        let b = simulate(&back).unwrap();
        assert_eq!(a.timeline, b.timeline);
        assert_eq!(a.audit, b.audit);
    }

    #[test]
    fn test_json_chosen_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plan.json");
        write_scenario(&path, &sample()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.trim_start().starts_with('{'));

        let store = ScenarioStore::new(temp_dir.path().join("data"));
        let loaded = store.load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_list_is_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let store = ScenarioStore::new(temp_dir.path().to_path_buf());
        assert!(store.list().unwrap().is_empty());

        store.save("zeta", &sample(), ScenarioFormat::Yaml).unwrap();
        store.save("alpha", &sample(), ScenarioFormat::Json).unwrap();
        fs::write(temp_dir.path().join("scenarios/notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_missing_and_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let store = ScenarioStore::new(temp_dir.path().to_path_buf());
        assert!(matches!(store.load("nope"), Err(StorageError::NotFound(_))));

        store.init().unwrap();
        fs::write(temp_dir.path().join("scenarios/broken.json"), "{ not json").unwrap();
        assert!(matches!(store.load("broken"), Err(StorageError::Parse(_))));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my plan/2025"), "my plan_2025");
        assert_eq!(sanitize_filename("../etc"), "___etc");
    }
}
