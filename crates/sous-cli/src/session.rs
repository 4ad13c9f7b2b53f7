//! Session persistence: one JSONL file per conversation, holding a state
//! snapshot per turn

use serde::{Deserialize, Serialize};
use sous_dialogue::{ConversationState, Step};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Session entry types for JSONL format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEntry {
    /// Session metadata
    Metadata {
        id: String,
        created_at: i64,
        model: String,
    },
    /// Conversation state after a turn
    Snapshot {
        state: Box<ConversationState>,
        timestamp: i64,
    },
}

/// Session manager for persisting conversations
pub struct SessionManager {
    id: String,
    writer: BufWriter<File>,
}

impl SessionManager {
    /// Get the sessions directory
    pub fn sessions_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sous")
            .join("sessions")
    }

    /// Create a new session in the default directory
    pub fn new(model: &str) -> std::io::Result<Self> {
        Self::create_in(&Self::sessions_dir(), model)
    }

    pub fn create_in(dir: &Path, model: &str) -> std::io::Result<Self> {
        let id = uuid::Uuid::new_v4().to_string();
        fs::create_dir_all(dir)?;

        let file = File::create(dir.join(format!("{}.jsonl", id)))?;
        let mut writer = BufWriter::new(file);

        let metadata = SessionEntry::Metadata {
            id: id.clone(),
            created_at: chrono::Utc::now().timestamp_millis(),
            model: model.to_string(),
        };
        writeln!(writer, "{}", serde_json::to_string(&metadata)?)?;
        writer.flush()?;

        Ok(Self { id, writer })
    }

    /// Load a session from the default directory
    pub fn load(id: &str) -> std::io::Result<(Self, Option<ConversationState>)> {
        Self::load_in(&Self::sessions_dir(), id)
    }

    /// Open an existing session for appending and return its last snapshot.
    pub fn load_in(dir: &Path, id: &str) -> std::io::Result<(Self, Option<ConversationState>)> {
        let path = dir.join(format!("{}.jsonl", id));
        if !path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Session not found: {}", id),
            ));
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut last = None;
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            // Lines that no longer parse are skipped rather than failing the load
            if let Ok(SessionEntry::Snapshot { state, .. }) =
                serde_json::from_str::<SessionEntry>(&line)
            {
                last = Some(*state);
            }
        }

        let file = File::options().append(true).open(&path)?;
        Ok((
            Self {
                id: id.to_string(),
                writer: BufWriter::new(file),
            },
            last,
        ))
    }

    /// Get session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a state snapshot
    pub fn append_snapshot(&mut self, state: &ConversationState) -> std::io::Result<()> {
        let entry = SessionEntry::Snapshot {
            state: Box::new(state.clone()),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        writeln!(self.writer, "{}", serde_json::to_string(&entry)?)?;
        self.writer.flush()
    }

    /// List sessions in the default directory
    pub fn list_sessions() -> std::io::Result<Vec<SessionInfo>> {
        Self::list_in(&Self::sessions_dir())
    }

    /// List sessions, newest first
    pub fn list_in(dir: &Path) -> std::io::Result<Vec<SessionInfo>> {
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                if let Some(info) = Self::read_session_info(&path) {
                    sessions.push(info);
                }
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    fn read_session_info(path: &Path) -> Option<SessionInfo> {
        let reader = BufReader::new(File::open(path).ok()?);
        let mut lines = reader.lines().map_while(Result::ok);

        let SessionEntry::Metadata {
            id,
            created_at,
            model,
        } = serde_json::from_str::<SessionEntry>(&lines.next()?).ok()?
        else {
            return None;
        };

        let mut turn_count = 0;
        let mut last_step = None;
        for line in lines {
            if let Ok(SessionEntry::Snapshot { state, .. }) = serde_json::from_str::<SessionEntry>(&line) {
                turn_count += 1;
                last_step = Some(state.step);
            }
        }

        Some(SessionInfo {
            id,
            created_at,
            model,
            turn_count,
            last_step,
        })
    }
}

/// Information about a saved session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: i64,
    pub model: String,
    pub turn_count: usize,
    pub last_step: Option<Step>,
}

impl SessionInfo {
    /// Format the created_at timestamp for display
    pub fn created_at_display(&self) -> String {
        use chrono::{TimeZone, Utc};
        Utc.timestamp_millis_opt(self.created_at)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(step: Step, country: &str) -> ConversationState {
        let mut state = ConversationState::new(vec!["유자".into()]);
        state.step = step;
        state.country = Some(country.into());
        state.push_assistant("안녕하세요");
        state
    }

    #[test]
    fn test_resume_returns_last_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = SessionManager::create_in(tmp.path(), "gpt-4.1-mini").unwrap();
        session
            .append_snapshot(&state_at(Step::CountrySelection, "한국"))
            .unwrap();
        let last = state_at(Step::BaseRecipeInput, "일본");
        session.append_snapshot(&last).unwrap();
        let id = session.id().to_string();
        drop(session);

        let (mut resumed, state) = SessionManager::load_in(tmp.path(), &id).unwrap();
        assert_eq!(state, Some(last));

        // Appending after resume keeps the same file
        resumed
            .append_snapshot(&state_at(Step::ConstraintsInput, "일본"))
            .unwrap();
        let sessions = SessionManager::list_in(tmp.path()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].turn_count, 3);
        assert_eq!(sessions[0].last_step, Some(Step::ConstraintsInput));
        assert_eq!(sessions[0].model, "gpt-4.1-mini");
    }

    #[test]
    fn test_new_session_has_no_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let id = SessionManager::create_in(tmp.path(), "m")
            .unwrap()
            .id()
            .to_string();
        let (_, state) = SessionManager::load_in(tmp.path(), &id).unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn test_missing_session() {
        let tmp = tempfile::tempdir().unwrap();
        let err = SessionManager::load_in(tmp.path(), "nope").err().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_list_ignores_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        fs::write(tmp.path().join("broken.jsonl"), "not json\n").unwrap();
        SessionManager::create_in(tmp.path(), "m").unwrap();

        let sessions = SessionManager::list_in(tmp.path()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].turn_count, 0);
        assert!(sessions[0].last_step.is_none());
    }

    #[test]
    fn test_list_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(SessionManager::list_in(&tmp.path().join("none")).unwrap().is_empty());
    }
}
