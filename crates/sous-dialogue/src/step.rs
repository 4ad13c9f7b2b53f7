//! Dialogue nodes and the allowed-transition table.

use serde::{Deserialize, Serialize};

/// A node of the recipe dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Greeting; never paused on
    #[default]
    Intro,
    /// Pick a trend country or opt out (options)
    CountrySelection,
    /// Menu or existing recipe to start from (free text)
    BaseRecipeInput,
    /// Extra conditions and ideas (free text)
    ConstraintsInput,
    /// Build the generation prompt; never paused on
    PromptAssembly,
    /// Trend search, concept selection and synthesis; never paused on
    RecipeGeneration,
    /// Regenerate or save (options)
    PostGenerationMenu,
    /// What to change in the current recipe (free text)
    RevisionInput,
    /// Public or private save (options)
    SaveVisibility,
}

/// What kind of input a paused step waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// One of the presented options
    Choice,
    /// Free text; empty counts as skip
    FreeText,
    /// The machine passes through this step without waiting
    None,
}

impl Step {
    /// Input the step waits for
    pub fn input_kind(self) -> InputKind {
        match self {
            Step::CountrySelection | Step::PostGenerationMenu | Step::SaveVisibility => {
                InputKind::Choice
            }
            Step::BaseRecipeInput | Step::ConstraintsInput | Step::RevisionInput => {
                InputKind::FreeText
            }
            Step::Intro | Step::PromptAssembly | Step::RecipeGeneration => InputKind::None,
        }
    }

    /// Whether a turn stops at this step
    pub fn is_pause(self) -> bool {
        self.input_kind() != InputKind::None
    }

    /// Steps reachable from this one in a single move.
    pub fn successors(self) -> &'static [Step] {
        match self {
            Step::Intro => &[Step::CountrySelection],
            Step::CountrySelection => &[Step::BaseRecipeInput],
            Step::BaseRecipeInput => &[Step::ConstraintsInput],
            Step::ConstraintsInput => &[Step::PromptAssembly],
            Step::PromptAssembly => &[Step::RecipeGeneration],
            Step::RecipeGeneration => &[Step::PostGenerationMenu],
            Step::PostGenerationMenu => &[Step::RevisionInput, Step::SaveVisibility],
            Step::RevisionInput => &[Step::RecipeGeneration],
            Step::SaveVisibility => &[Step::PostGenerationMenu],
        }
    }

    /// Check the transition table
    pub fn can_transition_to(self, next: Step) -> bool {
        self.successors().contains(&next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Step; 9] = [
        Step::Intro,
        Step::CountrySelection,
        Step::BaseRecipeInput,
        Step::ConstraintsInput,
        Step::PromptAssembly,
        Step::RecipeGeneration,
        Step::PostGenerationMenu,
        Step::RevisionInput,
        Step::SaveVisibility,
    ];

    #[test]
    fn test_linear_prefix() {
        assert!(Step::Intro.can_transition_to(Step::CountrySelection));
        assert!(Step::ConstraintsInput.can_transition_to(Step::PromptAssembly));
        assert!(!Step::Intro.can_transition_to(Step::BaseRecipeInput));
        assert!(!Step::BaseRecipeInput.can_transition_to(Step::RecipeGeneration));
    }

    #[test]
    fn test_revision_loop_goes_back_to_generation() {
        assert!(Step::PostGenerationMenu.can_transition_to(Step::RevisionInput));
        assert!(Step::RevisionInput.can_transition_to(Step::RecipeGeneration));
        assert!(!Step::RevisionInput.can_transition_to(Step::PromptAssembly));
    }

    #[test]
    fn test_save_returns_to_menu() {
        assert!(Step::PostGenerationMenu.can_transition_to(Step::SaveVisibility));
        assert!(Step::SaveVisibility.can_transition_to(Step::PostGenerationMenu));
    }

    #[test]
    fn test_transient_steps_always_have_an_exit() {
        for step in ALL {
            if !step.is_pause() {
                assert!(!step.successors().is_empty(), "{step:?} would dead-end");
            }
        }
    }

    #[test]
    fn test_input_kinds() {
        assert_eq!(Step::CountrySelection.input_kind(), InputKind::Choice);
        assert_eq!(Step::RevisionInput.input_kind(), InputKind::FreeText);
        assert_eq!(Step::RecipeGeneration.input_kind(), InputKind::None);
        assert!(!Step::Intro.is_pause());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Step::PostGenerationMenu).unwrap();
        assert_eq!(json, "\"post_generation_menu\"");
    }
}
