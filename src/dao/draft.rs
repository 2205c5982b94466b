//! Locally persisted prediction draft: the mutable, in-progress guest
//! submission that survives reloads until it is finalized remotely.

use std::{
    fs,
    io::{self, ErrorKind},
    path::PathBuf,
    sync::Mutex,
};

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dao::models::{EpochMillis, GameScores, Hypothesis, Minigame};

/// The in-progress guest submission, filled field by field by the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Draft {
    /// Opaque identifier generated once and stable for the draft's lifetime.
    pub session_id: String,
    /// The guess; may be changed any number of times before submission.
    pub hypothesis: Option<Hypothesis>,
    /// Guest display name.
    pub user_name: String,
    /// Name suggested for the baby.
    pub suggested_name: String,
    /// Free-text message for the parents.
    pub message: String,
    /// Mini-game scores with their derived total.
    pub scores: GameScores,
    /// When the draft was first created.
    pub created_at: EpochMillis,
    /// Refreshed on every mutation.
    pub updated_at: EpochMillis,
}

impl Draft {
    fn fresh() -> Self {
        let now = EpochMillis::now();
        Self {
            session_id: new_session_id(now),
            hypothesis: None,
            user_name: String::new(),
            suggested_name: String::new(),
            message: String::new(),
            scores: GameScores::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Hypothesis and personal fields are filled and valid; game scores may
    /// still be missing. This is the bar the submission gate enforces.
    pub fn is_partially_complete(&self) -> bool {
        self.hypothesis.is_some()
            && self.user_name.chars().count() >= 2
            && self.suggested_name.chars().count() >= 2
            && self.message.chars().count() >= 10
    }

    /// Everything is filled, including at least one non-zero game score.
    pub fn is_complete(&self) -> bool {
        self.is_partially_complete() && self.scores.total > 0
    }
}

/// Generate a session identifier: `user_<epoch millis>_<9 alphanumerics>`.
fn new_session_id(now: EpochMillis) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    format!("user_{}_{}", now.0, suffix.to_lowercase())
}

/// Raw persistence slot the draft is serialized into: a single key holding a
/// JSON value.
pub trait DraftSlot: Send {
    /// Read the raw slot contents, `None` when the slot is empty.
    fn load(&self) -> io::Result<Option<String>>;
    /// Overwrite the slot contents.
    fn store(&self, raw: &str) -> io::Result<()>;
    /// Empty the slot.
    fn remove(&self) -> io::Result<()>;
}

/// File-backed slot holding the draft as a small JSON document on disk.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// Create a slot at the given path; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DraftSlot for FileSlot {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn store(&self, raw: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Stage the write in a scratch file and rename it into place;
        // the live path only ever holds a complete document.
        let scratch = self.path.with_extension("tmp");
        fs::write(&scratch, raw)?;
        fs::rename(&scratch, &self.path)
    }

    fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Ephemeral slot keeping the draft in memory; used by tests and storeless
/// demo runs.
#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl DraftSlot for MemorySlot {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.value.lock().expect("slot poisoned").clone())
    }

    fn store(&self, raw: &str) -> io::Result<()> {
        *self.value.lock().expect("slot poisoned") = Some(raw.to_owned());
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        *self.value.lock().expect("slot poisoned") = None;
        Ok(())
    }
}

/// Owner of the locally persisted draft.
///
/// Every operation is synchronous and the draft is durable in the slot before
/// the call returns. Reads self-heal: a missing or unparseable slot yields a
/// freshly initialized draft instead of an error.
pub struct DraftStore {
    slot: Mutex<Box<dyn DraftSlot>>,
}

impl DraftStore {
    /// Wrap a slot implementation.
    pub fn new(slot: Box<dyn DraftSlot>) -> Self {
        Self {
            slot: Mutex::new(slot),
        }
    }

    /// Create and persist a fresh draft, overwriting whatever the slot held.
    pub fn initialize(&self) -> Draft {
        let slot = self.slot.lock().expect("draft slot poisoned");
        Self::initialize_locked(&**slot)
    }

    fn initialize_locked(slot: &dyn DraftSlot) -> Draft {
        let draft = Draft::fresh();
        Self::persist(slot, &draft);
        debug!(session_id = %draft.session_id, "initialized fresh draft");
        draft
    }

    /// Return the persisted draft, initializing one if the slot is empty or
    /// holds something unparseable.
    pub fn get(&self) -> Draft {
        let slot = self.slot.lock().expect("draft slot poisoned");
        Self::load_locked(&**slot)
    }

    fn load_locked(slot: &dyn DraftSlot) -> Draft {
        let raw = match slot.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::initialize_locked(slot),
            Err(err) => {
                warn!(error = %err, "failed to read draft slot; reinitializing");
                return Self::initialize_locked(slot);
            }
        };

        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) => draft,
            Err(err) => {
                warn!(error = %err, "corrupt draft slot; reinitializing");
                Self::initialize_locked(slot)
            }
        }
    }

    /// Whether a draft currently exists in the slot.
    pub fn exists(&self) -> bool {
        let slot = self.slot.lock().expect("draft slot poisoned");
        matches!(slot.load(), Ok(Some(_)))
    }

    /// Remove the persisted draft entirely.
    pub fn clear(&self) {
        let slot = self.slot.lock().expect("draft slot poisoned");
        if let Err(err) = slot.remove() {
            warn!(error = %err, "failed to clear draft slot");
        }
    }

    /// Record the guest's hypothesis.
    pub fn set_hypothesis(&self, hypothesis: Hypothesis) {
        self.mutate(|draft| draft.hypothesis = Some(hypothesis));
    }

    /// Record the personal data fields in one write.
    pub fn set_personal_data(&self, user_name: &str, suggested_name: &str, message: &str) {
        self.mutate(|draft| {
            draft.user_name = user_name.to_owned();
            draft.suggested_name = suggested_name.to_owned();
            draft.message = message.to_owned();
        });
    }

    /// Record one mini-game sub-score; the total is recomputed on the spot.
    pub fn set_score(&self, game: Minigame, score: u16) {
        self.mutate(|draft| draft.scores.record(game, score));
    }

    fn mutate(&self, apply: impl FnOnce(&mut Draft)) {
        let slot = self.slot.lock().expect("draft slot poisoned");
        let mut draft = Self::load_locked(&**slot);
        apply(&mut draft);
        draft.updated_at = EpochMillis::now();
        Self::persist(&**slot, &draft);
    }

    fn persist(slot: &dyn DraftSlot, draft: &Draft) {
        let raw = match serde_json::to_string(draft) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to serialize draft");
                return;
            }
        };
        if let Err(err) = slot.store(&raw) {
            warn!(error = %err, "failed to persist draft slot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> DraftStore {
        DraftStore::new(Box::new(MemorySlot::default()))
    }

    #[test]
    fn get_initializes_when_slot_is_empty() {
        let store = memory_store();
        assert!(!store.exists());

        let draft = store.get();
        assert!(draft.session_id.starts_with("user_"));
        assert_eq!(draft.scores, GameScores::default());
        assert!(store.exists());
    }

    #[test]
    fn mutations_survive_a_reload() {
        let store = memory_store();
        let original = store.get();

        store.set_hypothesis(Hypothesis::XY);
        store.set_personal_data("Ana Gomez", "Luna", "Mucho amor para ustedes");

        // A re-`get` plays the role of a page reload: same slot, fresh read.
        let reloaded = store.get();
        assert_eq!(reloaded.session_id, original.session_id);
        assert_eq!(reloaded.hypothesis, Some(Hypothesis::XY));
        assert_eq!(reloaded.user_name, "Ana Gomez");
    }

    #[test]
    fn score_total_invariant_holds_across_writes() {
        let store = memory_store();
        store.get();

        store.set_score(Minigame::Collider, 70);
        store.set_score(Minigame::Equation, 90);
        store.set_score(Minigame::Collider, 40);
        store.set_score(Minigame::Synthesis, 100);

        let draft = store.get();
        assert_eq!(draft.scores.collider, 40);
        assert_eq!(draft.scores.equation, 90);
        assert_eq!(draft.scores.synthesis, 100);
        assert_eq!(draft.scores.total, 230);
    }

    #[test]
    fn corrupt_slot_is_treated_as_absent() {
        let slot = MemorySlot::default();
        slot.store("{not json at all").unwrap();
        let store = DraftStore::new(Box::new(slot));

        let draft = store.get();
        assert!(draft.session_id.starts_with("user_"));
        assert_eq!(draft.hypothesis, None);
    }

    #[test]
    fn clear_removes_the_draft() {
        let store = memory_store();
        let first = store.get();
        store.clear();
        assert!(!store.exists());

        let second = store.get();
        assert_ne!(first.session_id, second.session_id);
    }

    #[test]
    fn partial_completion_gate() {
        let store = memory_store();
        store.get();
        store.set_hypothesis(Hypothesis::XX);
        store.set_personal_data("Ana Gomez", "Luna", "corto");
        assert!(!store.get().is_partially_complete());

        store.set_personal_data("Ana Gomez", "Luna", "un mensaje suficientemente largo");
        let draft = store.get();
        assert!(draft.is_partially_complete());
        // Still not fully complete: no game has been played.
        assert!(!draft.is_complete());

        store.set_score(Minigame::Equation, 5);
        assert!(store.get().is_complete());
    }

    #[test]
    fn file_slot_round_trip_and_corruption_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");

        let store = DraftStore::new(Box::new(FileSlot::new(path.clone())));
        let draft = store.get();
        store.set_hypothesis(Hypothesis::XY);

        // Reopen the same file through a new store, as a process restart would.
        let reopened = DraftStore::new(Box::new(FileSlot::new(path.clone())));
        let reloaded = reopened.get();
        assert_eq!(reloaded.session_id, draft.session_id);
        assert_eq!(reloaded.hypothesis, Some(Hypothesis::XY));

        // Scribble over the file: the next read must self-heal.
        fs::write(&path, "]]garbage[[").unwrap();
        let healed = reopened.get();
        assert_ne!(healed.session_id, draft.session_id);
        assert_eq!(healed.hypothesis, None);
    }

    #[test]
    fn file_slot_replaces_the_target_in_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        let scratch = path.with_extension("tmp");
        let slot = FileSlot::new(path.clone());

        slot.store(r#"{"v":1}"#).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"v":1}"#);
        assert!(!scratch.exists());

        // A stale scratch file from an interrupted write never reaches the
        // live path and is gone after the next successful store.
        fs::write(&scratch, "{half").unwrap();
        slot.store(r#"{"v":2}"#).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"v":2}"#);
        assert!(!scratch.exists());
    }
}
