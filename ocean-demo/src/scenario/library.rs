//! Built-in scenario library

use super::model::{Scenario, Step, StepAction};
use crate::error::Result;
use std::sync::Arc;

/// Immutable, ordered collection of scenarios
#[derive(Debug, Clone, Default)]
pub struct ScenarioLibrary {
    scenarios: Vec<Arc<Scenario>>,
}

impl ScenarioLibrary {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
        }
    }

    /// The three guided demos shipped with OceanGPT
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(vec![
            equatorial_salinity()?,
            atlantic_temperature()?,
            pacific_depth()?,
        ]))
    }

    pub fn get(&self, id: &str) -> Option<Arc<Scenario>> {
        self.scenarios.iter().find(|s| s.id() == id).cloned()
    }

    pub fn list(&self) -> &[Arc<Scenario>] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn equatorial_salinity() -> Result<Scenario> {
    Scenario::new(
        "equatorial-salinity",
        "Equatorial Salinity Analysis",
        "Explore salinity variations near the equator and discover ocean circulation patterns.",
        "Show me salinity profiles near the equator in March 2023",
        vec![
            Step::new(StepAction::Chat, "AI processes natural language query", 2.0),
            Step::new(StepAction::FocusViewer, "Globe animates to equatorial region", 3.0)
                .with_target("R12345"),
            Step::new(
                StepAction::HighlightEntities,
                "Relevant floats highlight with pulse animation",
                2.0,
            )
            .with_targets(["R12345", "R67890"]),
            Step::new(StepAction::ShowProfile, "Temperature/salinity profiles display", 4.0)
                .with_target("R12345"),
            Step::new(StepAction::Chat, "AI provides oceanographic insights", 4.0),
        ],
    )
}

fn atlantic_temperature() -> Result<Scenario> {
    Scenario::new(
        "atlantic-temperature",
        "Atlantic Temperature Trends",
        "Compare temperature profiles across different Atlantic Ocean regions.",
        "Compare temperature profiles in the North vs South Atlantic",
        vec![
            Step::new(StepAction::Chat, "Voice query processing simulation", 3.0),
            // No Atlantic floats in the bundled dataset: visual-only focus
            Step::new(StepAction::FocusViewer, "Globe shows Atlantic Ocean overview", 2.0),
            Step::new(StepAction::Compare, "Side-by-side profile comparison", 6.0)
                .with_targets(["R12345", "R67890"]),
            Step::new(StepAction::Annotate, "ML-driven pattern analysis", 4.0),
            Step::new(StepAction::Export, "Generate shareable report", 3.0),
        ],
    )
}

fn pacific_depth() -> Result<Scenario> {
    Scenario::new(
        "pacific-depth",
        "Pacific Deep Water Analysis",
        "Investigate deep water properties in the Pacific using multi-parameter analysis.",
        "Analyze deep water oxygen levels in the Pacific Ocean",
        vec![
            Step::new(StepAction::Chat, "Multi-parameter query processing", 3.0),
            Step::new(
                StepAction::FocusViewer,
                "Pacific Ocean focus with 3D depth visualization",
                4.0,
            ),
            Step::new(
                StepAction::HighlightEntities,
                "Apply depth and oxygen parameter filters",
                3.0,
            )
            .with_targets(["R12345"]),
            Step::new("timeline", "Temporal analysis over multiple seasons", 6.0),
            Step::new(StepAction::Annotate, "Scientific interpretation and export", 4.0),
        ],
    )
}
