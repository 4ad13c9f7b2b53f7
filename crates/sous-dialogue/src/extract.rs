//! Pulling structured data out of model text, and rendering recipes.
//!
//! Models are asked for bare JSON but often wrap it in code fences or prose.
//! Every parser here tries a strict parse first, then a bracket slice, and
//! never fails: unusable text degrades to an empty or raw result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const TITLE_LABEL: &str = "레시피 이름:";
const INGREDIENTS_LABEL: &str = "재료(2~3인분 기준):";
const STEPS_LABEL: &str = "조리 순서:";
const DESCRIPTION_LABEL: &str = "레시피 소개:";

/// Structured recipe as the model is asked to return it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

impl Recipe {
    /// Read the canonical fields out of a JSON object, tolerating nulls and
    /// non-string list items.
    pub fn from_object(object: &serde_json::Map<String, Value>) -> Self {
        let text = |key: &str| object.get(key).map(value_text).unwrap_or_default();
        let list = |key: &str| match object.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(value_text)
                .filter(|item| !item.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => vec![],
        };

        Self {
            title: text("title"),
            description: text("description"),
            ingredients: list("ingredients"),
            steps: list("steps"),
        }
    }
}

/// Outcome of parsing a synthesis response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOutput {
    /// The response held a JSON object; `json` is the extracted text
    Structured { json: String, recipe: Recipe },
    /// Nothing parseable; the whole response is the deliverable
    Raw(String),
}

impl RecipeOutput {
    /// Value kept in the conversation state
    pub fn stored(&self) -> &str {
        match self {
            RecipeOutput::Structured { json, .. } => json,
            RecipeOutput::Raw(text) => text,
        }
    }

    /// Text shown to the user
    pub fn rendered(&self) -> String {
        match self {
            RecipeOutput::Structured { recipe, .. } => render_recipe(recipe),
            RecipeOutput::Raw(text) => text.clone(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, RecipeOutput::Structured { .. })
    }
}

/// Remove markdown code fences around a model answer.
pub fn strip_code_fences(text: &str) -> String {
    let cleaned = text.trim();
    if cleaned.starts_with("```") {
        cleaned
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string()
    } else {
        cleaned.to_string()
    }
}

/// Find the JSON object text inside a model answer, if any.
pub fn extract_json_object(text: &str) -> Option<String> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        return Some(cleaned);
    }
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    (end > start).then(|| cleaned[start..=end].to_string())
}

/// Parse a synthesis response into a structured recipe or raw text.
pub fn parse_recipe_output(text: &str) -> RecipeOutput {
    let structured = extract_json_object(text).and_then(|json| {
        match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(object)) if !object.is_empty() => {
                let recipe = Recipe::from_object(&object);
                Some(RecipeOutput::Structured { json, recipe })
            }
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "recipe JSON did not parse, keeping raw text");
                None
            }
        }
    });
    structured.unwrap_or_else(|| RecipeOutput::Raw(text.to_string()))
}

/// Parse a JSON array of strings out of a model answer.
///
/// Accepts a bare array, an object whose first array-valued field holds the
/// items, or either one embedded in surrounding text. Anything else is empty.
pub fn parse_json_array(text: &str) -> Vec<String> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return vec![];
    }

    if let Some(items) = serde_json::from_str::<Value>(&cleaned)
        .ok()
        .and_then(array_items)
    {
        return items;
    }

    let sliced = match (cleaned.find('['), cleaned.rfind(']')) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => return vec![],
    };
    serde_json::from_str::<Value>(sliced)
        .ok()
        .and_then(array_items)
        .unwrap_or_default()
}

fn array_items(value: Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(object) => object.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        })?,
        _ => return None,
    };
    Some(
        items
            .iter()
            .map(value_text)
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Render a recipe for the transcript.
///
/// Sections come in a fixed order (title, ingredients, steps, description),
/// empty ones are left out, and a single blank line separates sections.
pub fn render_recipe(recipe: &Recipe) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(4);

    if !recipe.title.is_empty() {
        sections.push(format!("{} {}", TITLE_LABEL, recipe.title));
    }
    if !recipe.ingredients.is_empty() {
        let mut lines = vec![INGREDIENTS_LABEL.to_string()];
        lines.extend(recipe.ingredients.iter().map(|item| format!("- {}", item)));
        sections.push(lines.join("\n"));
    }
    if !recipe.steps.is_empty() {
        let mut lines = vec![STEPS_LABEL.to_string()];
        lines.extend(
            recipe
                .steps
                .iter()
                .enumerate()
                .map(|(idx, step)| format!("{}) {}", idx + 1, step)),
        );
        sections.push(lines.join("\n"));
    }
    if !recipe.description.is_empty() {
        sections.push(format!("{}\n{}", DESCRIPTION_LABEL, recipe.description));
    }

    sections.join("\n\n")
}
