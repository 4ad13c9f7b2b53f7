//! The recipe dialogue: one call per user action, advancing the state to the
//! next pause.
//!
//! ```text
//! Intro -> CountrySelection -> BaseRecipeInput -> ConstraintsInput
//!       -> PromptAssembly -> RecipeGeneration -> PostGenerationMenu
//! PostGenerationMenu -> RevisionInput -> RecipeGeneration (revision branch)
//! PostGenerationMenu -> SaveVisibility -> PostGenerationMenu
//! ```
//!
//! Steps without input (`Intro`, `PromptAssembly`, `RecipeGeneration`) are
//! passed through inside a turn. A turn either reaches a pause or fails with
//! the state rolled back to where it started.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sous_ai::{LlmProvider, SearchProvider};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::DialogueEvent;
use crate::forecast::ConceptSelector;
use crate::locale::{NO_TREND_OPTION, country_options};
use crate::prompts::generation_prompt;
use crate::state::{ChatMessage, ConversationState};
use crate::step::{InputKind, Step};
use crate::store::{RecipePayload, RecipeStore, Visibility};
use crate::synthesis::RecipeSynthesizer;
use crate::trend::{TrendPipeline, TrendRequest};
use crate::trend_log::TrendLogger;

pub const REGENERATE_OPTION: &str = "다시 생성하기";
pub const SAVE_OPTION: &str = "저장하기";
/// Replaces [`SAVE_OPTION`] once the current recipe is saved
pub const SAVED_OPTION: &str = "저장 완료";

const GREETING: &str = "안녕하세요! 원하시는 조건에 맞게, 혹은 랜덤으로 레시피를 만들어 드릴게요.";
const COUNTRY_QUESTION: &str =
    "어느 나라의 트렌드를 반영할까요? 반영하지 않으려면 '트렌드 반영 안 함'을 선택하세요.";
const BASE_RECIPE_QUESTION: &str =
    "만들고 싶은 메뉴나 참고할 기존 레시피가 있으면 알려주세요. 없으면 비워 두고 다음으로 넘어가세요.";
const CONSTRAINTS_QUESTION: &str =
    "추가 조건이나 아이디어가 있나요? (예: 넣고 싶은 재료, 조리 시간, 맛) 없으면 비워 두세요.";
const REVISION_QUESTION: &str = "어떻게 바꿔 드릴까요? 수정하고 싶은 내용을 입력하세요.";
const VISIBILITY_QUESTION: &str = "레시피를 공개할까요?";
const SAVE_FAILED: &str = "레시피 저장에 실패했어요. 잠시 후 다시 시도해 주세요.";
const ALREADY_SAVED: &str = "이미 저장된 레시피예요.";

/// External services the dialogue calls.
#[derive(Clone)]
pub struct ChatServices {
    pub llm: Arc<dyn LlmProvider>,
    pub search: Arc<dyn SearchProvider>,
    pub store: Arc<dyn RecipeStore>,
}

#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Where trend records go; `None` disables the log
    pub trend_log_dir: Option<PathBuf>,
}

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    /// Typed text; empty means "next" and skips optional answers
    Text(String),
    /// A picked option
    Select(String),
}

impl UserInput {
    pub fn text(s: impl Into<String>) -> Self {
        UserInput::Text(s.into())
    }

    pub fn select(s: impl Into<String>) -> Self {
        UserInput::Select(s.into())
    }
}

/// What the front end renders after a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub transcript: Vec<ChatMessage>,
    /// Empty when free text is expected
    pub options: Vec<String>,
}

impl TurnView {
    pub fn of(state: &ConversationState) -> Self {
        Self {
            transcript: state.messages.clone(),
            options: state.current_options().to_vec(),
        }
    }
}

fn menu_options(saved: bool) -> Vec<String> {
    let save = if saved { SAVED_OPTION } else { SAVE_OPTION };
    vec![REGENERATE_OPTION.to_string(), save.to_string()]
}

/// Drives [`ConversationState`]s through the recipe dialogue.
///
/// Holds only services and configuration, so one instance can serve any
/// number of sessions, each with its own state.
pub struct RecipeChat {
    trends: TrendPipeline,
    selector: ConceptSelector,
    synthesizer: RecipeSynthesizer,
    store: Arc<dyn RecipeStore>,
    events: broadcast::Sender<DialogueEvent>,
}

impl RecipeChat {
    pub fn new(services: ChatServices, config: ChatConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        let logger = config.trend_log_dir.map(TrendLogger::new);
        Self {
            trends: TrendPipeline::new(
                services.llm.clone(),
                services.search,
                logger,
                events.clone(),
            ),
            selector: ConceptSelector::new(services.llm.clone()),
            synthesizer: RecipeSynthesizer::new(services.llm),
            store: services.store,
            events,
        }
    }

    /// Subscribe to dialogue events
    pub fn subscribe(&self) -> broadcast::Receiver<DialogueEvent> {
        self.events.subscribe()
    }

    /// Greet and pause at country selection. Does nothing for a state that
    /// has already started.
    pub fn start(&self, state: &mut ConversationState) -> Result<TurnView> {
        if state.step != Step::Intro {
            return Ok(TurnView::of(state));
        }
        state.push_assistant(GREETING);
        self.enter(state, Step::CountrySelection)?;
        state.push_assistant(COUNTRY_QUESTION);
        state.offer(country_options());
        Ok(TurnView::of(state))
    }

    /// Apply one user action and run to the next pause.
    ///
    /// Input that does not fit the current step leaves the state untouched.
    /// On error the state is restored to what it was before the call.
    pub async fn advance(
        &self,
        state: &mut ConversationState,
        input: UserInput,
    ) -> Result<TurnView> {
        let snapshot = state.clone();
        let _ = self.events.send(DialogueEvent::TurnStart { step: state.step });

        if let Err(e) = self.apply(state, input).await {
            tracing::error!(error = %e, step = ?state.step, "turn failed, restoring state");
            *state = snapshot;
            return Err(e);
        }

        let _ = self.events.send(DialogueEvent::TurnEnd { step: state.step });
        Ok(TurnView::of(state))
    }

    async fn apply(&self, state: &mut ConversationState, input: UserInput) -> Result<()> {
        if matches!(&input, UserInput::Select(s) if s.is_empty()) {
            return Ok(());
        }

        match state.step.input_kind() {
            InputKind::Choice => {
                let choice = match input {
                    UserInput::Select(s) | UserInput::Text(s) => s,
                };
                if !state.current_options().contains(&choice) {
                    tracing::debug!(choice = %choice, "ignoring input that is not an option");
                    return Ok(());
                }
                state.push_user(choice.as_str());
                self.on_choice(state, &choice).await
            }
            InputKind::FreeText => {
                let text = match input {
                    UserInput::Text(s) => s,
                    // A pending revision takes whatever arrives
                    UserInput::Select(s) if state.step == Step::RevisionInput => s,
                    UserInput::Select(_) => return Ok(()),
                };
                let text = text.trim().to_string();
                if !text.is_empty() {
                    state.push_user(text.as_str());
                }
                self.on_text(state, text).await
            }
            InputKind::None if state.step == Step::Intro => self.start(state).map(|_| ()),
            InputKind::None => Ok(()),
        }
    }

    async fn on_choice(&self, state: &mut ConversationState, choice: &str) -> Result<()> {
        match state.step {
            Step::CountrySelection => {
                if choice == NO_TREND_OPTION {
                    state.trend_enabled = false;
                    state.country = None;
                } else {
                    state.trend_enabled = true;
                    state.country = Some(choice.to_string());
                }
                state.flags.trend_selected = true;
                self.enter(state, Step::BaseRecipeInput)?;
                state.push_assistant(BASE_RECIPE_QUESTION);
                state.expect_text();
                Ok(())
            }
            Step::PostGenerationMenu => self.on_menu(state, choice),
            Step::SaveVisibility => {
                let Some(visibility) = Visibility::from_label(choice) else {
                    return Ok(());
                };
                state.flags.await_save_visibility = false;
                self.save(state, visibility).await;
                self.enter(state, Step::PostGenerationMenu)?;
                state.offer(menu_options(state.save_disabled));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn on_menu(&self, state: &mut ConversationState, choice: &str) -> Result<()> {
        match choice {
            REGENERATE_OPTION => {
                state.flags.recipe_generated = false;
                state.flags.await_revision = true;
                self.enter(state, Step::RevisionInput)?;
                state.push_assistant(REVISION_QUESTION);
                state.expect_text();
            }
            SAVE_OPTION if !state.save_disabled => {
                state.flags.await_save_visibility = true;
                self.enter(state, Step::SaveVisibility)?;
                state.push_assistant(VISIBILITY_QUESTION);
                state.offer(vec![
                    Visibility::Public.label().to_string(),
                    Visibility::Private.label().to_string(),
                ]);
            }
            SAVE_OPTION | SAVED_OPTION => {
                state.push_assistant(ALREADY_SAVED);
                state.offer(menu_options(true));
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_text(&self, state: &mut ConversationState, text: String) -> Result<()> {
        let answer = (!text.is_empty()).then(|| text.clone());
        match state.step {
            Step::BaseRecipeInput => {
                state.base_recipe = answer;
                state.flags.base_done = true;
                self.enter(state, Step::ConstraintsInput)?;
                state.push_assistant(CONSTRAINTS_QUESTION);
                state.expect_text();
                Ok(())
            }
            Step::ConstraintsInput => {
                state.constraints = answer;
                state.flags.constraints_done = true;
                self.enter(state, Step::PromptAssembly)?;
                state.prompt = Some(generation_prompt(
                    state.base_recipe.as_deref(),
                    state.constraints.as_deref(),
                ));
                self.enter(state, Step::RecipeGeneration)?;
                self.generate(state).await
            }
            Step::RevisionInput => {
                // Empty is a real request: rewrite with no instructions
                state.revision_request = Some(text);
                state.flags.await_revision = false;
                state.flags.recipe_generated = false;
                state.flags.regenerate = true;
                self.enter(state, Step::RecipeGeneration)?;
                self.generate(state).await
            }
            _ => Ok(()),
        }
    }

    /// Run the generation node, either fresh or as a revision.
    async fn generate(&self, state: &mut ConversationState) -> Result<()> {
        let revision = state.flags.regenerate;
        let output = if revision {
            let recipe = state.recipe.clone().unwrap_or_default();
            let request = state.revision_request.take().unwrap_or_default();
            tracing::info!(request = %request, "revising recipe");
            self.synthesizer.revise(&recipe, &request).await?
        } else {
            let prompt = state.prompt.clone().unwrap_or_default();
            let trend_summary = self
                .trends
                .run(&TrendRequest {
                    trend_enabled: state.trend_enabled,
                    country: state.country.as_deref(),
                    base_recipe: state.base_recipe.as_deref(),
                    constraints: state.constraints.as_deref(),
                })
                .await;
            let summary = (!trend_summary.is_empty()).then_some(trend_summary.as_str());
            let selected = self
                .selector
                .select(
                    &state.trend_forecast_items,
                    state.base_recipe.as_deref(),
                    state.constraints.as_deref(),
                    summary,
                )
                .await;
            let _ = self.events.send(DialogueEvent::ConceptsSelected {
                selected: selected.clone(),
            });
            self.synthesizer
                .synthesize(&prompt, &trend_summary, &selected)
                .await?
        };

        state.recipe = Some(output.stored().to_string());
        state.push_assistant(output.rendered());
        state.flags.recipe_generated = true;
        state.flags.regenerate = false;
        state.save_disabled = false;
        state.saved_recipe_id = None;
        let _ = self.events.send(DialogueEvent::RecipeGenerated {
            structured: output.is_structured(),
            revision,
        });

        self.enter(state, Step::PostGenerationMenu)?;
        state.offer(menu_options(false));
        Ok(())
    }

    /// Persist the current recipe. Failures are reported in the transcript
    /// and leave Save enabled.
    async fn save(&self, state: &mut ConversationState, visibility: Visibility) {
        let Some(recipe) = state.recipe.as_deref() else {
            return;
        };
        let payload = RecipePayload::from_stored(recipe, state.base_recipe.as_deref(), visibility);

        let failure = match self.store.save(&payload).await {
            Ok(outcome) if outcome.success => {
                tracing::info!(id = ?outcome.id, ?visibility, "recipe saved");
                state.save_disabled = true;
                state.saved_recipe_id = outcome.id.clone();
                state.push_assistant(format!(
                    "레시피를 {}로 저장했어요.",
                    visibility.label()
                ));
                let _ = self.events.send(DialogueEvent::RecipeSaved {
                    id: outcome.id,
                    visibility,
                });
                return;
            }
            Ok(_) => "backend reported failure".to_string(),
            Err(e) => e.to_string(),
        };

        tracing::warn!(error = %failure, "recipe save failed");
        state.push_assistant(SAVE_FAILED);
        let _ = self
            .events
            .send(DialogueEvent::SaveFailed { message: failure });
    }

    fn enter(&self, state: &mut ConversationState, step: Step) -> Result<()> {
        state.transition(step)?;
        let _ = self.events.send(DialogueEvent::StepEntered { step });
        Ok(())
    }
}
