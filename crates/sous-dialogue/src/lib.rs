//! sous-dialogue: step-wise recipe generation dialogue
//!
//! This crate holds the conversation state machine that collects a user's
//! recipe request, optionally researches local food trends, picks forecast
//! concepts and has an LLM write (and rewrite) the recipe. [`RecipeChat`] is
//! the entry point; everything it needs from the outside world comes in
//! through [`ChatServices`].

pub mod chat;
pub mod error;
pub mod events;
pub mod extract;
pub mod forecast;
pub mod locale;
pub mod prompts;
pub mod state;
pub mod step;
pub mod store;
pub mod synthesis;
pub mod trend;
pub mod trend_log;

#[cfg(test)]
mod testing;

pub use chat::{ChatConfig, ChatServices, RecipeChat, TurnView, UserInput};
pub use error::{Error, Result};
pub use events::DialogueEvent;
pub use extract::{Recipe, RecipeOutput};
pub use state::{ChatMessage, ConversationState, Role};
pub use step::Step;
pub use store::{HttpRecipeStore, NoopStore, RecipePayload, RecipeStore, SaveOutcome, Visibility};
