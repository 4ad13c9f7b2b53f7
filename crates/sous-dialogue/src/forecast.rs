//! Forecast concept selection.

use std::sync::Arc;

use sous_ai::{CompletionRequest, LlmProvider};

use crate::extract::parse_json_array;
use crate::prompts::{FORECAST_SELECTION_SYSTEM_PROMPT, forecast_selection_prompt};

/// Most concepts that go into one recipe
pub const MAX_SELECTED: usize = 2;

/// Narrows host-supplied candidate concepts to the ones that fit the request.
pub struct ConceptSelector {
    llm: Arc<dyn LlmProvider>,
}

impl ConceptSelector {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Pick up to [`MAX_SELECTED`] candidates.
    ///
    /// The answer is always drawn from `candidates`, in the model's order.
    /// No candidates means no model call; a failed call selects nothing.
    pub async fn select(
        &self,
        candidates: &[String],
        base_recipe: Option<&str>,
        constraints: Option<&str>,
        trend_summary: Option<&str>,
    ) -> Vec<String> {
        if candidates.is_empty() {
            return vec![];
        }

        let prompt = forecast_selection_prompt(candidates, base_recipe, constraints, trend_summary);
        let request = CompletionRequest::new(FORECAST_SELECTION_SYSTEM_PROMPT, prompt);
        let answer = match self.llm.complete(&request).await {
            Ok(completion) => completion.text,
            Err(e) => {
                tracing::warn!(error = %e, "concept selection failed, selecting nothing");
                return vec![];
            }
        };

        let selected = filter_selection(parse_json_array(&answer), candidates);
        tracing::info!(?selected, "forecast concepts selected");
        selected
    }
}

/// Keep model picks that are real candidates, without repeats, capped.
pub fn filter_selection(picked: Vec<String>, candidates: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::with_capacity(MAX_SELECTED);
    for item in picked {
        if selected.len() == MAX_SELECTED {
            break;
        }
        if candidates.contains(&item) && !selected.contains(&item) {
            selected.push(item);
        }
    }
    selected
}
