//! Recipe synthesis and revision.

use std::sync::Arc;

use sous_ai::{CompletionRequest, LlmProvider};

use crate::error::Result;
use crate::extract::{RecipeOutput, parse_recipe_output};
use crate::prompts::{SYSTEM_PROMPT, annotate_with_trends, resolve_forecast, revision_prompt};

/// Final generation prompt: trends appended as an internal annotation, the
/// forecast placeholder resolved.
pub fn final_prompt(prompt: &str, trend_summary: &str, selected: &[String]) -> String {
    let annotated = if trend_summary.trim().is_empty() {
        prompt.to_string()
    } else {
        annotate_with_trends(prompt, trend_summary)
    };
    resolve_forecast(&annotated, selected)
}

pub struct RecipeSynthesizer {
    llm: Arc<dyn LlmProvider>,
}

impl RecipeSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate a recipe from an assembled prompt.
    ///
    /// A model failure is returned. Unparseable output is not an error; it
    /// comes back as [`RecipeOutput::Raw`].
    pub async fn synthesize(
        &self,
        prompt: &str,
        trend_summary: &str,
        selected: &[String],
    ) -> Result<RecipeOutput> {
        let prompt = final_prompt(prompt, trend_summary, selected);
        self.generate(prompt).await
    }

    /// Rewrite the stored recipe according to the user's request.
    pub async fn revise(&self, recipe: &str, request: &str) -> Result<RecipeOutput> {
        self.generate(revision_prompt(recipe, request)).await
    }

    async fn generate(&self, prompt: String) -> Result<RecipeOutput> {
        let completion = self
            .llm
            .complete(&CompletionRequest::new(SYSTEM_PROMPT, prompt))
            .await?;
        let output = parse_recipe_output(&completion.text);
        if !output.is_structured() {
            tracing::warn!("recipe response was not JSON, keeping raw text");
        }
        Ok(output)
    }
}
