//! Error types for sous-dialogue

use thiserror::Error;

use crate::step::Step;

/// Result type alias using sous-dialogue Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that escape a dialogue turn.
///
/// Search and selection failures never show up here; they degrade inside their
/// pipelines. What remains is an unusable LLM during synthesis and state bugs.
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the adapter layer
    #[error(transparent)]
    Ai(#[from] sous_ai::Error),

    /// The machine tried to move along an edge the transition table forbids
    #[error("Invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: Step, to: Step },

    /// A step was entered before the data it needs was collected
    #[error("Step {step:?} requires {field}")]
    MissingField { step: Step, field: &'static str },

    /// The persistence backend failed
    #[error("Recipe store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_errors() {
        let e = Error::InvalidTransition {
            from: Step::Intro,
            to: Step::RecipeGeneration,
        };
        assert!(e.to_string().contains("Intro"));

        let e = Error::MissingField {
            step: Step::RecipeGeneration,
            field: "prompt",
        };
        assert_eq!(e.to_string(), "Step RecipeGeneration requires prompt");
    }

    #[test]
    fn test_ai_errors_are_transparent() {
        let e: Error = sous_ai::Error::EmptyResponse.into();
        assert!(matches!(e, Error::Ai(sous_ai::Error::EmptyResponse)));
        assert_eq!(e.to_string(), "Model returned an empty response");
    }
}
