//! Best-effort voicing of court reaction lines.
//!
//! Lines produced here are cosmetic. Scoring has already happened by the time
//! a line is voiced, and any failure falls back to the scripted text.

use log::warn;
use std::cell::Cell;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::constants::{DIALOGUE_COOLDOWN_SECS, DIALOGUE_MAX_CHARS, DIALOGUE_MIN_CHARS};
use crate::court::{CourtStrategy, MessageScene, NpcState};
use crate::state::GameState;

const LAST_RESORT_LINE: &str = "I will follow the court's decision.";

/// Everything a voice needs to phrase one line.
#[derive(Debug, Clone, Copy)]
pub struct DialogueRequest<'a> {
    pub state: &'a GameState,
    pub npc: &'a NpcState,
    pub fallback: &'a str,
    pub strategy: Option<CourtStrategy>,
    pub scene: MessageScene,
    pub statement: Option<&'a str>,
}

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("line generator failed: {0}")]
    Generator(String),
    #[error("generated line was empty or too short")]
    EmptyLine,
}

/// Produces the final text for an NPC line. Must never fail.
pub trait DialogueService {
    fn voice(&self, request: &DialogueRequest<'_>) -> String;
}

/// Uses the scripted fallback verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedDialogue;

impl DialogueService for ScriptedDialogue {
    fn voice(&self, request: &DialogueRequest<'_>) -> String {
        sanitize(request.fallback, &request.npc.display_name)
            .unwrap_or_else(|| LAST_RESORT_LINE.to_string())
    }
}

/// A fallible line source, such as a remote text model.
pub trait LineGenerator {
    /// # Errors
    ///
    /// Returns `DialogueError` when no line could be produced.
    fn generate(&self, request: &DialogueRequest<'_>) -> Result<String, DialogueError>;
}

/// Wraps a generator with sanitising and a failure cooldown.
#[derive(Debug)]
pub struct GuardedDialogue<G> {
    generator: G,
    cooldown: Duration,
    blocked_until: Cell<Option<Instant>>,
}

impl<G: LineGenerator> GuardedDialogue<G> {
    #[must_use]
    pub fn new(generator: G) -> Self {
        Self::with_cooldown(generator, Duration::from_secs(DIALOGUE_COOLDOWN_SECS))
    }

    #[must_use]
    pub const fn with_cooldown(generator: G, cooldown: Duration) -> Self {
        Self {
            generator,
            cooldown,
            blocked_until: Cell::new(None),
        }
    }

    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.blocked_until
            .get()
            .is_some_and(|until| Instant::now() < until)
    }

    fn trip(&self, err: &DialogueError) {
        warn!("dialogue generator disabled for {:?}: {err}", self.cooldown);
        self.blocked_until.set(Some(Instant::now() + self.cooldown));
    }
}

impl<G: LineGenerator> DialogueService for GuardedDialogue<G> {
    fn voice(&self, request: &DialogueRequest<'_>) -> String {
        let fallback = ScriptedDialogue.voice(request);
        if self.is_cooling_down() {
            return fallback;
        }
        let generated = self.generator.generate(request).and_then(|raw| {
            sanitize(&raw, &request.npc.display_name).ok_or(DialogueError::EmptyLine)
        });
        match generated {
            Ok(line) => {
                self.blocked_until.set(None);
                line
            }
            Err(err) => {
                self.trip(&err);
                fallback
            }
        }
    }
}

/// Normalise a candidate line: collapse whitespace, strip a speaker prefix
/// and surrounding quotes, reject very short lines, and cap the length.
#[must_use]
pub fn sanitize(raw: &str, speaker_name: &str) -> Option<String> {
    let mut line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    for separator in ["：", ":", " "] {
        let prefix = format!("{speaker_name}{separator}");
        if !speaker_name.is_empty() && line.starts_with(&prefix) {
            line = line[prefix.len()..].trim().to_string();
        }
    }
    let quotes: &[char] = &['“', '”', '"', '\'', ' '];
    let line = line.trim_matches(quotes);
    if line.chars().count() < DIALOGUE_MIN_CHARS {
        return None;
    }
    if line.chars().count() <= DIALOGUE_MAX_CHARS {
        return Some(line.to_string());
    }
    let clipped: String = line.chars().take(DIALOGUE_MAX_CHARS).collect();
    let trailing: &[char] = &['，', ',', '。', '.', '!', '?', '；', ';', '：', ':', ' '];
    Some(format!("{}.", clipped.trim_end_matches(trailing)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Canned(RefCell<Vec<Result<String, DialogueError>>>);

    impl LineGenerator for Canned {
        fn generate(&self, _request: &DialogueRequest<'_>) -> Result<String, DialogueError> {
            self.0
                .borrow_mut()
                .pop()
                .unwrap_or_else(|| Err(DialogueError::Generator("exhausted".into())))
        }
    }

    fn request<'a>(state: &'a GameState, fallback: &'a str) -> DialogueRequest<'a> {
        DialogueRequest {
            state,
            npc: &state.court.npcs[0],
            fallback,
            strategy: Some(CourtStrategy::RationalArgument),
            scene: MessageScene::Round,
            statement: None,
        }
    }

    #[test]
    fn sanitize_strips_prefix_and_quotes() {
        assert_eq!(
            sanitize("  Wei Yan:   \"Give me   ten thousand men!\" ", "Wei Yan").as_deref(),
            Some("Give me ten thousand men!")
        );
        assert_eq!(sanitize("\"no\"", "Wei Yan"), None);
        let long = "a".repeat(200);
        let clipped = sanitize(&long, "x").unwrap();
        assert_eq!(clipped.chars().count(), DIALOGUE_MAX_CHARS + 1);
        assert!(clipped.ends_with('.'));
    }

    #[test]
    fn scripted_voice_returns_fallback() {
        let state = GameState::new("d", 1);
        let line = ScriptedDialogue.voice(&request(&state, "The granaries are thin."));
        assert_eq!(line, "The granaries are thin.");
        let line = ScriptedDialogue.voice(&request(&state, ""));
        assert_eq!(line, LAST_RESORT_LINE);
    }

    #[test]
    fn failure_triggers_cooldown() {
        let state = GameState::new("d", 1);
        let generator = Canned(RefCell::new(vec![
            Ok("Generated line that should be skipped.".into()),
            Err(DialogueError::Generator("timeout".into())),
        ]));
        let voice = GuardedDialogue::new(generator);
        let line = voice.voice(&request(&state, "Scripted fallback."));
        assert_eq!(line, "Scripted fallback.");
        assert!(voice.is_cooling_down());
        let line = voice.voice(&request(&state, "Scripted fallback."));
        assert_eq!(line, "Scripted fallback.");
    }

    #[test]
    fn success_uses_generated_line() {
        let state = GameState::new("d", 1);
        let generator = Canned(RefCell::new(vec![Ok("  A fresh   line. ".into())]));
        let voice = GuardedDialogue::with_cooldown(generator, Duration::ZERO);
        assert_eq!(
            voice.voice(&request(&state, "Scripted fallback.")),
            "A fresh line."
        );
        assert!(!voice.is_cooling_down());
    }
}
