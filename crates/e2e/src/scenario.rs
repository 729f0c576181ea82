//! Ordered scenario registry

use std::collections::HashSet;

use futures::future::BoxFuture;
use tracing::warn;

use crate::error::{E2eError, E2eResult};
use crate::page::Page;

/// A scenario body: a sequence of UI actions and assertions against one page
pub type ScenarioBody = for<'a> fn(&'a mut Page) -> BoxFuture<'a, E2eResult<()>>;

/// One named, ordered unit of work
#[derive(Clone)]
pub struct Scenario {
    /// Defines execution order
    pub id: u32,

    /// Short name used on the command line, e.g. `create_item`
    pub name: &'static str,

    /// Human-readable description
    pub title: &'static str,

    /// Earlier scenarios whose side effects this one depends on
    pub requires: &'static [&'static str],

    pub body: ScenarioBody,
}

impl Scenario {
    /// The unittest-style name, e.g. `test_01_create_item`
    pub fn qualified_name(&self) -> String {
        format!("test_{:02}_{}", self.id, self.name)
    }

    fn answers_to(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        if wanted == self.name || wanted == self.qualified_name() {
            return true;
        }
        // Accept `Tests.test_01_create_item` and similar dotted forms
        if let Some(last) = wanted.rsplit('.').next() {
            if last == self.qualified_name() || last == self.name {
                return true;
            }
        }
        wanted.parse::<u32>().map(|id| id == self.id).unwrap_or(false)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("requires", &self.requires)
            .finish()
    }
}

/// Scenarios in registration order
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scenario.
    ///
    /// Ids must increase and names must be unique; prerequisites must
    /// already be registered.
    pub fn register(mut self, scenario: Scenario) -> E2eResult<Self> {
        if let Some(last) = self.scenarios.last() {
            if scenario.id <= last.id {
                return Err(E2eError::Config(format!(
                    "scenario {} ({}) registered after {} ({})",
                    scenario.id, scenario.name, last.id, last.name
                )));
            }
        }
        if self.get(scenario.name).is_some() {
            return Err(E2eError::Config(format!("scenario {} registered twice", scenario.name)));
        }
        for required in scenario.requires {
            if self.get(required).is_none() {
                return Err(E2eError::Config(format!(
                    "scenario {} requires unknown or later scenario {}",
                    scenario.name, required
                )));
            }
        }
        self.scenarios.push(scenario);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    /// Resolve command-line selections.
    ///
    /// The result is always in registration order, whatever order the names
    /// were given in. An empty selection means every scenario.
    pub fn select(&self, wanted: &[String]) -> E2eResult<Vec<Scenario>> {
        if wanted.is_empty() {
            return Ok(self.scenarios.clone());
        }

        for name in wanted {
            if !self.scenarios.iter().any(|s| s.answers_to(name)) {
                return Err(E2eError::Config(format!("no scenario named {}", name)));
            }
        }

        let selected: Vec<Scenario> = self
            .scenarios
            .iter()
            .filter(|s| wanted.iter().any(|w| s.answers_to(w)))
            .cloned()
            .collect();

        let names: HashSet<&str> = selected.iter().map(|s| s.name).collect();
        for scenario in &selected {
            for required in scenario.requires {
                if !names.contains(required) {
                    warn!(
                        "{} depends on {}, which is not selected; it relies on data left by an earlier run",
                        scenario.name, required
                    );
                }
            }
        }

        Ok(selected)
    }
}
