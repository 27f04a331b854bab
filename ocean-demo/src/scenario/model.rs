//! Scenario and step data model
//!
//! Scenarios are configuration: built once, validated, never mutated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest duration a single step may hold the stage, in step-seconds
pub const MAX_STEP_DURATION_SECS: f64 = 86_400.0;

/// Symbolic action of a step
///
/// The tag decides which shared state the step mutates. Unknown tags are
/// kept as `Custom` and behave like the presentation-only actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    /// Append a user or assistant message
    Chat,
    /// Select the step's target float
    FocusViewer,
    /// Replace the viewer highlight set
    HighlightEntities,
    ShowProfile,
    Compare,
    Annotate,
    Export,
    Custom(String),
}

impl StepAction {
    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Chat => "chat",
            StepAction::FocusViewer => "focus-viewer",
            StepAction::HighlightEntities => "highlight-entities",
            StepAction::ShowProfile => "show-profile",
            StepAction::Compare => "compare",
            StepAction::Annotate => "annotate",
            StepAction::Export => "export",
            StepAction::Custom(tag) => tag,
        }
    }

    /// Whether the action only drives presentation (no shared-state change)
    pub fn is_presentation_only(&self) -> bool {
        !matches!(
            self,
            StepAction::Chat | StepAction::FocusViewer | StepAction::HighlightEntities
        )
    }
}

impl From<String> for StepAction {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "chat" => StepAction::Chat,
            "focus-viewer" => StepAction::FocusViewer,
            "highlight-entities" => StepAction::HighlightEntities,
            "show-profile" => StepAction::ShowProfile,
            "compare" => StepAction::Compare,
            "annotate" => StepAction::Annotate,
            "export" => StepAction::Export,
            _ => StepAction::Custom(tag),
        }
    }
}

impl From<&str> for StepAction {
    fn from(tag: &str) -> Self {
        StepAction::from(tag.to_string())
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        match action {
            StepAction::Custom(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Float(s) a step refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepTarget {
    Entity(String),
    Entities(Vec<String>),
}

impl StepTarget {
    /// Primary entity: the single target or the first of a set
    pub fn primary(&self) -> Option<&str> {
        match self {
            StepTarget::Entity(id) => Some(id),
            StepTarget::Entities(ids) => ids.first().map(String::as_str),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        match self {
            StepTarget::Entity(id) => vec![id.clone()],
            StepTarget::Entities(ids) => ids.clone(),
        }
    }
}

/// One timed unit of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: StepAction,
    pub description: String,
    /// Seconds this step holds the stage; in (0, `MAX_STEP_DURATION_SECS`]
    /// in a built scenario
    #[serde(rename = "duration")]
    pub duration_secs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<StepTarget>,
}

impl Step {
    pub fn new(action: impl Into<StepAction>, description: impl Into<String>, duration_secs: f64) -> Self {
        Self {
            action: action.into(),
            description: description.into(),
            duration_secs,
            target: None,
        }
    }

    pub fn with_target(mut self, entity_id: impl Into<String>) -> Self {
        self.target = Some(StepTarget::Entity(entity_id.into()));
        self
    }

    pub fn with_targets<I, S>(mut self, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = Some(StepTarget::Entities(
            entity_ids.into_iter().map(Into::into).collect(),
        ));
        self
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(Error::InvalidScenario(format!(
                "step {} ({}) has non-positive duration {}",
                index, self.action, self.duration_secs
            )));
        }
        if self.duration_secs > MAX_STEP_DURATION_SECS {
            return Err(Error::InvalidScenario(format!(
                "step {} ({}) duration {} exceeds the {} s maximum",
                index, self.action, self.duration_secs, MAX_STEP_DURATION_SECS
            )));
        }
        Ok(())
    }
}

/// A named, ordered, pre-authored sequence of timed steps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    id: String,
    title: String,
    description: String,
    query: String,
    /// Informational only; playback timing comes from the steps
    duration_secs: f64,
    steps: Vec<Step>,
}

impl Scenario {
    /// Build a scenario, validating every step
    ///
    /// The nominal duration defaults to the sum of step durations.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        query: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidScenario("scenario id must not be empty".to_string()));
        }
        for (index, step) in steps.iter().enumerate() {
            step.validate(index)?;
        }
        let duration_secs = steps.iter().map(|s| s.duration_secs).sum();
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            query: query.into(),
            duration_secs,
            steps,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Example query typed by the first chat step
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
