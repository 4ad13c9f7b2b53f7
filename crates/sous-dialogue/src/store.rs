//! Recipe persistence adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::extract::{RecipeOutput, parse_recipe_output};

/// Title used when the recipe has none
pub const UNTITLED_RECIPE: &str = "AI 레시피";

const SAVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Who can see a saved recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// Option label shown at the visibility step
    pub fn label(self) -> &'static str {
        match self {
            Visibility::Public => "공개",
            Visibility::Private => "비공개",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Visibility::Public, Visibility::Private]
            .into_iter()
            .find(|v| v.label() == label)
    }

    fn open_yn(self) -> &'static str {
        match self {
            Visibility::Public => "Y",
            Visibility::Private => "N",
        }
    }
}

fn serialize_open_yn<S: Serializer>(visibility: &Visibility, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(visibility.open_yn())
}

/// Body sent to the recipe backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipePayload {
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    #[serde(rename = "openYn", serialize_with = "serialize_open_yn")]
    pub visibility: Visibility,
}

impl RecipePayload {
    /// Build a payload from the recipe kept in the conversation state.
    ///
    /// Raw-text recipes go out whole as the description.
    pub fn from_stored(stored: &str, base_recipe: Option<&str>, visibility: Visibility) -> Self {
        let fallback_title = || {
            base_recipe
                .filter(|b| !b.trim().is_empty())
                .unwrap_or(UNTITLED_RECIPE)
                .to_string()
        };

        match parse_recipe_output(stored) {
            RecipeOutput::Structured { recipe, .. } => Self {
                title: if recipe.title.is_empty() {
                    fallback_title()
                } else {
                    recipe.title
                },
                description: recipe.description,
                ingredients: recipe.ingredients,
                steps: recipe.steps,
                visibility,
            },
            RecipeOutput::Raw(text) => Self {
                title: fallback_title(),
                description: text,
                ingredients: vec![],
                steps: vec![],
                visibility,
            },
        }
    }
}

/// What the backend said about a save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    pub success: bool,
    pub id: Option<String>,
}

impl SaveOutcome {
    pub fn saved(id: Option<String>) -> Self {
        Self { success: true, id }
    }

    pub fn failed() -> Self {
        Self::default()
    }
}

/// Somewhere recipes can be saved
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn save(&self, payload: &RecipePayload) -> Result<SaveOutcome>;
}

/// Posts recipes as JSON to `<base_url>/api/recipes`.
pub struct HttpRecipeStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecipeStore {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SAVE_TIMEOUT)
            .build()
            .map_err(sous_ai::Error::from)?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/recipes", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RecipeStore for HttpRecipeStore {
    async fn save(&self, payload: &RecipePayload) -> Result<SaveOutcome> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "recipe backend rejected save");
            return Ok(SaveOutcome::failed());
        }

        // The id is optional; an unreadable body still counts as saved
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        Ok(SaveOutcome::saved(response_id(&body)))
    }
}

fn response_id(body: &serde_json::Value) -> Option<String> {
    match body.get("id")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Used when no backend is configured. Every save fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

#[async_trait]
impl RecipeStore for NoopStore {
    async fn save(&self, _payload: &RecipePayload) -> Result<SaveOutcome> {
        tracing::warn!("no recipe backend configured, not saving");
        Ok(SaveOutcome::failed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_structured_recipe() {
        let stored = r#"{"title":"된장찌개","description":"구수함","ingredients":["된장"],"steps":["끓이기"]}"#;
        let payload = RecipePayload::from_stored(stored, Some("찌개"), Visibility::Public);
        assert_eq!(payload.title, "된장찌개");
        assert_eq!(payload.ingredients, vec!["된장".to_string()]);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["openYn"], "Y");
        assert!(json.get("visibility").is_none());
    }

    #[test]
    fn test_payload_from_raw_text() {
        let payload = RecipePayload::from_stored("그냥 글", None, Visibility::Private);
        assert_eq!(payload.title, UNTITLED_RECIPE);
        assert_eq!(payload.description, "그냥 글");
        assert!(payload.steps.is_empty());
        assert_eq!(serde_json::to_value(&payload).unwrap()["openYn"], "N");
    }

    #[test]
    fn test_untitled_structured_uses_base_recipe() {
        let payload = RecipePayload::from_stored(r#"{"steps":["a"]}"#, Some("비빔밥"), Visibility::Public);
        assert_eq!(payload.title, "비빔밥");
    }

    #[test]
    fn test_visibility_labels() {
        assert_eq!(Visibility::from_label("공개"), Some(Visibility::Public));
        assert_eq!(Visibility::from_label("비공개"), Some(Visibility::Private));
        assert_eq!(Visibility::from_label("public"), None);
    }

    #[test]
    fn test_response_id() {
        assert_eq!(response_id(&serde_json::json!({"id": 42})), Some("42".into()));
        assert_eq!(response_id(&serde_json::json!({"id": "abc"})), Some("abc".into()));
        assert_eq!(response_id(&serde_json::json!({})), None);
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let store = HttpRecipeStore::new("http://localhost:8080/").unwrap();
        assert_eq!(store.endpoint(), "http://localhost:8080/api/recipes");
    }

    #[tokio::test]
    async fn test_noop_store_fails() {
        let payload = RecipePayload::from_stored("x", None, Visibility::Public);
        let outcome = NoopStore.save(&payload).await.unwrap();
        assert!(!outcome.success);
    }
}
