//! Persona catalog
//!
//! One persona per scenario key. The catalog is process-wide configuration:
//! built in, optionally extended or overridden from TOML.

use crate::core::error::{EchoError, Result, SimulationError};
use crate::core::types::{ScenarioKey, Tension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The simulated character for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDescriptor {
    /// Scenario key (set from the TOML table name when loaded)
    #[serde(default = "unset_key", skip_serializing)]
    pub key: ScenarioKey,
    /// Character name used in the role-play prompt
    pub name: String,
    /// Short scenario brief for the trainee
    #[serde(default)]
    pub brief: String,
    /// Behavioral directive embedded in every response prompt
    pub directive: String,
    /// Tension at the start of a session
    pub initial_tension: Tension,
}

fn unset_key() -> ScenarioKey {
    ScenarioKey::new("")
}

impl PersonaDescriptor {
    /// Label shown in scenario pickers, e.g. "ER (Sarah)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.key, self.name)
    }
}

/// Lookup table of scenario key -> persona
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaCatalog {
    personas: BTreeMap<ScenarioKey, PersonaDescriptor>,
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    personas: BTreeMap<String, PersonaDescriptor>,
}

impl PersonaCatalog {
    /// Catalog containing the three reference scenarios
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.insert(PersonaDescriptor {
            key: ScenarioKey::new("ER"),
            name: "Sarah".into(),
            brief: "Sarah, 24, is terrified of needles and refusing IV medication.".into(),
            directive: "You are 'Sarah', a terrified patient in a hospital ER.\n\
                        - Context: You are hyper-ventilating. You believe the medicine is poison.\n\
                        - Behavior: Interrupt often. Scream if angry. Calm down only if validated."
                .into(),
            initial_tension: Tension::clamped(90),
        });
        catalog.insert(PersonaDescriptor {
            key: ScenarioKey::new("School"),
            name: "Alex".into(),
            brief: "Alex is hiding in the bathroom, afraid to go to class.".into(),
            directive: "You are 'Alex', a student who is being bullied.\n\
                        - Context: You are hiding in the bathroom. You are afraid to go to class.\n\
                        - Behavior: Whisper. Cry. Refuse to open the door unless you feel safe."
                .into(),
            initial_tension: Tension::clamped(80),
        });
        catalog.insert(PersonaDescriptor {
            key: ScenarioKey::new("Customer"),
            name: "Karen".into(),
            brief: "Karen is furious about a cancelled flight and missing a wedding.".into(),
            directive: "You are 'Karen', a furious customer whose flight was cancelled.\n\
                        - Context: You are missing your daughter's wedding.\n\
                        - Behavior: Yell. Demand a manager. Insult the user. \
                        Calm down if offered a solution AND empathy."
                .into(),
            initial_tension: Tension::clamped(95),
        });
        catalog
    }

    pub fn empty() -> Self {
        Self {
            personas: BTreeMap::new(),
        }
    }

    /// Parse personas from TOML (`[personas.<key>]` tables)
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(contents)?;
        let mut catalog = Self::empty();
        for (key, mut persona) in file.personas {
            if persona.directive.trim().is_empty() {
                return Err(EchoError::Config(format!(
                    "Persona {} has an empty directive",
                    key
                )));
            }
            persona.key = ScenarioKey::new(key);
            catalog.insert(persona);
        }
        Ok(catalog)
    }

    /// Load personas from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let catalog = Self::from_toml(&contents)?;
        tracing::debug!("Loaded {} personas from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    /// Add every persona of `other`, replacing entries with the same key
    pub fn merge(&mut self, other: PersonaCatalog) {
        self.personas.extend(other.personas);
    }

    pub fn insert(&mut self, persona: PersonaDescriptor) {
        self.personas.insert(persona.key.clone(), persona);
    }

    pub fn get(&self, key: &ScenarioKey) -> std::result::Result<&PersonaDescriptor, SimulationError> {
        self.personas
            .get(key)
            .ok_or_else(|| SimulationError::UnknownScenario(key.to_string()))
    }

    pub fn contains(&self, key: &ScenarioKey) -> bool {
        self.personas.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ScenarioKey> {
        self.personas.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonaDescriptor> {
        self.personas.values()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
