//! sous - conversational recipe assistant CLI

mod config;
mod session;
mod utils;

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sous_ai::search::{DEFAULT_SEARCH_TIMEOUT, SerpApiSearch};
use sous_ai::providers::{DEFAULT_COMPLETION_TIMEOUT, create_provider};
use sous_ai::{Model, Provider};
use sous_dialogue::{
    ChatConfig, ChatServices, ConversationState, DialogueEvent, HttpRecipeStore, NoopStore,
    RecipeChat, RecipeStore, Role, UserInput,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing_subscriber::EnvFilter;

/// sous - step-by-step recipe assistant with food trend research
#[derive(Parser, Debug)]
#[command(name = "sous")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model to use (default: gpt-4.1-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Provider (openai, anthropic, groq, openrouter, ollama)
    #[arg(short, long)]
    provider: Option<String>,

    /// Recipe backend base URL used for saving
    #[arg(long)]
    backend_url: Option<String>,

    /// Candidate trend concept; repeat for several
    #[arg(long = "forecast-item")]
    forecast_items: Vec<String>,

    /// Directory for trend search records
    #[arg(long)]
    trend_log_dir: Option<PathBuf>,

    /// Disable trend search records
    #[arg(long)]
    no_trend_log: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Resume a previous session by ID
    #[arg(long)]
    resume: Option<String>,

    /// List saved sessions
    #[arg(long)]
    sessions: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,
}

fn resolve_model(provider: &str, model_id: &str) -> Model {
    sous_ai::models::get_model_by_id(model_id)
        .unwrap_or_else(|| sous_ai::models::custom_model(Provider::parse(provider), model_id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("sous=debug,sous_ai=debug,sous_dialogue=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    // List sessions and exit
    if args.sessions {
        return list_sessions();
    }

    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let provider = args
        .provider
        .or(cfg.provider.clone())
        .unwrap_or_else(|| "openai".to_string());
    let model_id = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| sous_ai::models::DEFAULT_MODEL_ID.to_string());
    let model = resolve_model(&provider, &model_id);

    let llm_timeout = cfg
        .llm_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_COMPLETION_TIMEOUT);
    let search_timeout = cfg
        .search_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SEARCH_TIMEOUT);

    let api_key = cfg.get_api_key(&provider);
    let llm = match create_provider(model.clone(), api_key.as_deref(), llm_timeout) {
        Ok(llm) => llm,
        Err(e) => {
            let var = model.provider.api_key_env_var().unwrap_or("OPENAI_API_KEY");
            eprintln!("Error: {}", e);
            eprintln!("Set your API key with: export {}=your-key", var);
            eprintln!("Or add it to config file: sous --init-config");
            std::process::exit(1);
        }
    };

    let search = SerpApiSearch::new(cfg.serpapi_key(), search_timeout)?;
    if cfg.serpapi_key().is_none() {
        tracing::info!("SERPAPI_API_KEY not set, trend research disabled");
    }

    let store: Arc<dyn RecipeStore> = match args.backend_url.or(cfg.backend_url.clone()) {
        Some(url) => Arc::new(HttpRecipeStore::new(&url)?),
        None => Arc::new(NoopStore),
    };

    let trend_log_dir = if args.no_trend_log {
        None
    } else {
        Some(args.trend_log_dir.unwrap_or_else(|| cfg.trend_log_dir()))
    };

    let chat = RecipeChat::new(
        ChatServices {
            llm,
            search: Arc::new(search),
            store,
        },
        ChatConfig { trend_log_dir },
    );

    let forecast_items = if args.forecast_items.is_empty() {
        cfg.forecast_items.clone()
    } else {
        args.forecast_items
    };

    // Resume session if specified, otherwise start fresh
    let (mut session, mut state) = match args.resume {
        Some(ref session_id) => match session::SessionManager::load(session_id) {
            Ok((session, state)) => {
                println!("Resuming session {}", session_id);
                let state = state.unwrap_or_else(|| ConversationState::new(forecast_items));
                (Some(session), state)
            }
            Err(e) => {
                eprintln!("Error loading session: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let session = match session::SessionManager::new(&model.id) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(error = %e, "session autosave disabled");
                    None
                }
            };
            (session, ConversationState::new(forecast_items))
        }
    };

    run_interactive(&chat, &mut state, session.as_mut()).await
}

async fn run_interactive(
    chat: &RecipeChat,
    state: &mut ConversationState,
    mut session: Option<&mut session::SessionManager>,
) -> anyhow::Result<()> {
    println!("sous - recipe assistant");
    println!("Type a number to pick an option, an empty line to skip, /quit to exit.");
    if let Some(ref s) = session {
        println!("Session: {}", s.id());
    }
    println!();

    // Replay the transcript of a resumed session
    let mut shown = 0;
    print_new_messages(state, &mut shown, true);

    let view = chat.start(state)?;
    print_new_messages(state, &mut shown, false);
    print_options(&view.options);
    autosave(&mut session, state);

    let mut receiver = chat.subscribe();

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if matches!(input.trim(), "/quit" | "/exit") {
            break;
        }

        let input = parse_input(input, state.current_options());
        let before = state.messages.len();
        let result = chat.advance(state, input).await;
        for event in drain_turn_events(&mut receiver) {
            print_event(&event);
        }
        match result {
            Ok(view) => {
                if state.messages.len() == before {
                    println!("[Input ignored: pick one of the options below]");
                }
                print_new_messages(state, &mut shown, false);
                print_options(&view.options);
                autosave(&mut session, state);
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Nothing was changed; try again.");
                print_options(state.current_options());
            }
        }
    }

    Ok(())
}

/// Take the events a finished turn left in the channel, up to its `TurnEnd`.
fn drain_turn_events(receiver: &mut broadcast::Receiver<DialogueEvent>) -> Vec<DialogueEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => {
                let done = event.is_terminal();
                events.push(event);
                if done {
                    break;
                }
            }
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "dropped progress events");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    events
}

/// Map a typed line to a dialogue input. A number picks the matching option.
fn parse_input(line: &str, options: &[String]) -> UserInput {
    if !options.is_empty() {
        if let Ok(n) = line.trim().parse::<usize>() {
            if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
                return UserInput::select(option.clone());
            }
        }
        return UserInput::select(line.trim());
    }
    UserInput::text(line)
}

fn print_new_messages(state: &ConversationState, shown: &mut usize, include_user: bool) {
    for message in state.messages.iter().skip(*shown) {
        match message.role {
            Role::Assistant => println!("\nsous> {}\n", message.content),
            // Typed lines are already on screen
            Role::User if include_user => println!("> {}", message.content),
            Role::User => {}
        }
    }
    *shown = state.messages.len();
}

fn print_options(options: &[String]) {
    for (i, option) in options.iter().enumerate() {
        println!("  {}) {}", i + 1, option);
    }
}

fn print_event(event: &DialogueEvent) {
    match event {
        DialogueEvent::TrendSearchSkipped { reason } => {
            println!("[Trend research skipped: {}]", reason);
        }
        DialogueEvent::TrendQueriesGenerated { country, queries } => {
            if let Some(first) = queries.first() {
                println!(
                    "[Searching {} trends: {}]",
                    country,
                    utils::truncate_chars(first, 60)
                );
            }
        }
        DialogueEvent::TrendResultsFetched { count, .. } => {
            println!("[{} search results]", count);
        }
        DialogueEvent::ConceptsSelected { selected } if !selected.is_empty() => {
            println!("[Trend concepts: {}]", selected.join(", "));
        }
        DialogueEvent::StepEntered { step } => {
            tracing::debug!(?step, "step entered");
        }
        DialogueEvent::RecipeGenerated { structured, revision } => {
            tracing::debug!(structured, revision, "recipe generated");
        }
        DialogueEvent::RecipeSaved { id, visibility } => {
            println!(
                "[Saved as {} recipe{}]",
                visibility.label(),
                id.as_deref().map(|id| format!(" #{}", id)).unwrap_or_default()
            );
        }
        DialogueEvent::SaveFailed { message } => {
            tracing::warn!(%message, "save failed");
        }
        _ => {}
    }
}

fn autosave(session: &mut Option<&mut session::SessionManager>, state: &ConversationState) {
    if let Some(s) = session.as_deref_mut() {
        if let Err(e) = s.append_snapshot(state) {
            tracing::warn!(error = %e, "failed to save session snapshot");
        }
    }
}

fn list_sessions() -> anyhow::Result<()> {
    match session::SessionManager::list_sessions() {
        Ok(sessions) => {
            if sessions.is_empty() {
                println!("No saved sessions found.");
                println!(
                    "Sessions are stored in: {}",
                    session::SessionManager::sessions_dir().display()
                );
            } else {
                println!("Saved sessions:\n");
                println!(
                    "{:<38} {:<18} {:<16} {:<7} Step",
                    "ID", "Created", "Model", "Turns"
                );
                println!("{}", "-".repeat(100));
                for s in sessions {
                    let step = s
                        .last_step
                        .map(|step| format!("{:?}", step))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<38} {:<18} {:<16} {:<7} {}",
                        s.id,
                        s.created_at_display(),
                        utils::truncate_chars(&s.model, 16),
                        s.turn_count,
                        step
                    );
                }
                println!("\nResume with: sous --resume <session-id>");
            }
        }
        Err(e) => {
            eprintln!("Error listing sessions: {}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<String> {
        vec!["다시 생성하기".into(), "저장하기".into()]
    }

    #[test]
    fn test_number_picks_option() {
        assert_eq!(parse_input("2", &options()), UserInput::select("저장하기"));
        assert_eq!(parse_input(" 1 ", &options()), UserInput::select("다시 생성하기"));
    }

    #[test]
    fn test_out_of_range_number_is_literal() {
        assert_eq!(parse_input("3", &options()), UserInput::select("3"));
        assert_eq!(parse_input("0", &options()), UserInput::select("0"));
    }

    #[test]
    fn test_option_label_is_a_selection() {
        assert_eq!(parse_input("저장하기", &options()), UserInput::select("저장하기"));
    }

    #[test]
    fn test_free_text_keeps_line() {
        assert_eq!(parse_input("김치찌개", &[]), UserInput::text("김치찌개"));
        assert_eq!(parse_input("", &[]), UserInput::text(""));
    }

    #[test]
    fn test_drain_stops_at_turn_end() {
        use sous_dialogue::Step;

        let (tx, mut rx) = broadcast::channel(16);
        tx.send(DialogueEvent::TurnStart {
            step: Step::SaveVisibility,
        })
        .unwrap();
        tx.send(DialogueEvent::RecipeSaved {
            id: Some("7".into()),
            visibility: sous_dialogue::Visibility::Public,
        })
        .unwrap();
        tx.send(DialogueEvent::TurnEnd {
            step: Step::PostGenerationMenu,
        })
        .unwrap();
        tx.send(DialogueEvent::TurnStart {
            step: Step::PostGenerationMenu,
        })
        .unwrap();

        let first = drain_turn_events(&mut rx);
        assert_eq!(first.len(), 3);
        assert!(matches!(first[1], DialogueEvent::RecipeSaved { .. }));
        assert!(first[2].is_terminal());

        let rest = drain_turn_events(&mut rx);
        assert_eq!(rest.len(), 1);
        assert!(drain_turn_events(&mut rx).is_empty());
    }

    #[test]
    fn test_resolve_unknown_model() {
        let model = resolve_model("ollama", "llama3.2");
        assert_eq!(model.id, "llama3.2");
        assert_eq!(model.provider, Provider::Ollama);
        assert_eq!(model.base_url, "http://localhost:11434/v1");
    }
}
