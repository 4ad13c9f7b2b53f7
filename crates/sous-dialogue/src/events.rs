//! Dialogue event types

use serde::{Deserialize, Serialize};

use crate::step::Step;
use crate::store::Visibility;

/// Progress events emitted while a turn runs.
///
/// Nothing in the dialogue depends on them; they exist so a front end can show
/// what a slow generation turn is doing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueEvent {
    /// A turn started
    TurnStart { step: Step },

    /// The machine moved to a step
    StepEntered { step: Step },

    /// The trend pipeline did not run
    TrendSearchSkipped { reason: String },

    /// Search queries came back from the model
    TrendQueriesGenerated { country: String, queries: Vec<String> },

    /// Web search finished
    TrendResultsFetched { query: String, count: usize },

    /// A trend summary is ready to annotate the prompt
    TrendSummaryReady { country: String, chars: usize },

    /// Forecast concepts were chosen (possibly none)
    ConceptsSelected { selected: Vec<String> },

    /// A recipe was generated or revised
    RecipeGenerated { structured: bool, revision: bool },

    /// The backend accepted the recipe
    RecipeSaved {
        id: Option<String>,
        visibility: Visibility,
    },

    /// Saving failed; the menu keeps Save enabled
    SaveFailed { message: String },

    /// A turn finished and paused at `step`
    TurnEnd { step: Step },
}

impl DialogueEvent {
    /// Whether this event closes a turn
    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueEvent::TurnEnd { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let event = DialogueEvent::TrendResultsFetched {
            query: "q".into(),
            count: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "trend_results_fetched");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn test_terminal() {
        assert!(DialogueEvent::TurnEnd {
            step: Step::PostGenerationMenu
        }
        .is_terminal());
        assert!(!DialogueEvent::TurnStart { step: Step::Intro }.is_terminal());
    }
}
