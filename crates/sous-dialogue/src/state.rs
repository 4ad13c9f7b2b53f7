//! Conversation state: transcript, current step, collected inputs and the
//! last generated recipe.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::step::{InputKind, Step};

/// Who wrote a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the user-facing transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Completion markers for each dialogue phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepFlags {
    pub base_done: bool,
    pub constraints_done: bool,
    pub trend_selected: bool,
    pub recipe_generated: bool,
    pub await_revision: bool,
    pub await_save_visibility: bool,
    /// Set while a revision cycle is rewriting the current recipe
    pub regenerate: bool,
}

/// The single record threaded through every dialogue turn.
///
/// Holds plain data only, so it can be serialized between turns and handed to
/// any transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    /// Current node
    pub step: Step,
    /// Transcript shown to the user
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub flags: StepFlags,
    /// Choices for the current step; `None` when free text is expected
    pub options: Option<Vec<String>>,
    pub base_recipe: Option<String>,
    pub constraints: Option<String>,
    pub country: Option<String>,
    pub trend_enabled: bool,
    pub revision_request: Option<String>,
    /// Candidate concepts supplied by the host application
    pub trend_forecast_items: Vec<String>,
    /// Generation prompt, set by prompt assembly
    pub prompt: Option<String>,
    /// Last recipe: JSON text when structured, otherwise the raw model output
    pub recipe: Option<String>,
    pub save_disabled: bool,
    pub saved_recipe_id: Option<String>,
}

impl ConversationState {
    /// Fresh state at session start
    pub fn new(trend_forecast_items: Vec<String>) -> Self {
        Self {
            trend_forecast_items,
            ..Default::default()
        }
    }

    /// Append a user line
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Append an assistant line
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Present options for the current step
    pub fn offer(&mut self, options: Vec<String>) {
        self.options = Some(options);
    }

    /// Expect free text for the current step
    pub fn expect_text(&mut self) {
        self.options = None;
    }

    /// Options currently on offer, empty when free text is expected
    pub fn current_options(&self) -> &[String] {
        self.options.as_deref().unwrap_or(&[])
    }

    /// Move to `next`, checking the transition table and the data `next` needs.
    pub fn transition(&mut self, next: Step) -> Result<()> {
        if !self.step.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.step,
                to: next,
            });
        }
        self.check_entry(next)?;
        tracing::debug!(from = ?self.step, to = ?next, "step transition");
        self.step = next;
        Ok(())
    }

    /// Fields a step cannot run without. Catches stage-skipping early.
    fn check_entry(&self, step: Step) -> Result<()> {
        let missing = |field| Err(Error::MissingField { step, field });
        match step {
            Step::BaseRecipeInput if !self.flags.trend_selected => missing("trend_selected"),
            Step::ConstraintsInput if !self.flags.base_done => missing("base_done"),
            Step::PromptAssembly if !self.flags.constraints_done => missing("constraints_done"),
            Step::RecipeGeneration if self.flags.regenerate && self.recipe.is_none() => {
                missing("recipe")
            }
            Step::RecipeGeneration if !self.flags.regenerate && self.prompt.is_none() => {
                missing("prompt")
            }
            Step::RevisionInput | Step::SaveVisibility if self.recipe.is_none() => {
                missing("recipe")
            }
            _ => Ok(()),
        }
    }

    /// Whether the state is stopped at a step that waits for input, with the
    /// options/free-text invariant holding.
    pub fn is_consistent_pause(&self) -> bool {
        match self.step.input_kind() {
            InputKind::Choice => !self.current_options().is_empty(),
            InputKind::FreeText => self.options.is_none(),
            InputKind::None => false,
        }
    }
}
