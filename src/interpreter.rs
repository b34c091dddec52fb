use crate::{
    commands::{CommandEntry, CommandMatcher},
    debounce::DebounceGate,
    recognition::{select_command, MatchDecision, RecognitionResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VoiceEvent {
    CommandMatched {
        command: String,
        transcript: String,
        confidence: f32,
        timestamp: DateTime<Utc>,
    },
    /// Free text for whatever handles general conversation
    GeneralInput {
        transcript: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Interim,
    Empty,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interpretation<'a> {
    Command {
        command: &'a CommandEntry,
        event: VoiceEvent,
    },
    GeneralInput(VoiceEvent),
    Ignored(IgnoreReason),
}

/// Turns recognizer results into voice events.
///
/// Only final results are considered. The debounce gate runs on the top
/// transcript before any matching happens.
pub struct VoiceInterpreter {
    matcher: CommandMatcher,
    gate: DebounceGate,
    max_alternatives: usize,
}

impl VoiceInterpreter {
    pub fn new(matcher: CommandMatcher, gate: DebounceGate, max_alternatives: usize) -> Self {
        Self {
            matcher,
            gate,
            max_alternatives: max_alternatives.max(1),
        }
    }

    pub fn matcher(&self) -> &CommandMatcher {
        &self.matcher
    }

    pub fn interpret(&mut self, result: &RecognitionResult, now: Instant) -> Interpretation<'_> {
        if !result.is_final {
            return Interpretation::Ignored(IgnoreReason::Interim);
        }
        let transcript = result.transcript();
        if transcript.is_empty() {
            return Interpretation::Ignored(IgnoreReason::Empty);
        }
        let top_confidence = result
            .alternatives
            .first()
            .map(|alternative| alternative.effective_confidence())
            .unwrap_or_default();
        info!(
            "Recognized: {:?} (confidence: {})",
            transcript, top_confidence
        );

        if !self.gate.admit(&transcript, now) {
            info!("Duplicate command ignored (debounced)");
            return Interpretation::Ignored(IgnoreReason::Duplicate);
        }

        match select_command(result, &self.matcher, self.max_alternatives) {
            MatchDecision::Command {
                command,
                confidence,
                ..
            } => {
                info!(
                    "Matched command: {:?} (confidence: {})",
                    command.name, confidence
                );
                Interpretation::Command {
                    command,
                    event: VoiceEvent::CommandMatched {
                        command: command.name.clone(),
                        transcript,
                        confidence,
                        timestamp: Utc::now(),
                    },
                }
            }
            MatchDecision::NoMatch => {
                info!("General input: {:?}", transcript);
                Interpretation::GeneralInput(VoiceEvent::GeneralInput {
                    transcript,
                    timestamp: Utc::now(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commands::CommandTable, recognition::Alternative};
    use std::time::Duration;

    fn interpreter() -> VoiceInterpreter {
        VoiceInterpreter::new(
            CommandMatcher::new(CommandTable::builtin(), true),
            DebounceGate::default(),
            5,
        )
    }

    fn command_name(interpretation: &Interpretation) -> Option<String> {
        match interpretation {
            Interpretation::Command { command, .. } => Some(command.name.clone()),
            _ => None,
        }
    }

    #[test]
    fn wake_phrase_activates_phoenix() {
        let mut interpreter = interpreter();
        let result = RecognitionResult::from_text("hey phoenix wake up");
        let interpretation = interpreter.interpret(&result, Instant::now());
        assert_eq!(command_name(&interpretation), Some("activate phoenix".into()));
        match interpretation {
            Interpretation::Command {
                event: VoiceEvent::CommandMatched { transcript, .. },
                ..
            } => assert_eq!(transcript, "hey phoenix wake up"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn question_matches_help() {
        let mut interpreter = interpreter();
        let result = RecognitionResult::from_text("What can you do for me today");
        assert_eq!(
            command_name(&interpreter.interpret(&result, Instant::now())),
            Some("help".into())
        );
    }

    #[test]
    fn unknown_text_is_general_input() {
        let mut interpreter = interpreter();
        let result = RecognitionResult::from_text("the weather is nice");
        match interpreter.interpret(&result, Instant::now()) {
            Interpretation::GeneralInput(VoiceEvent::GeneralInput { transcript, .. }) => {
                assert_eq!(transcript, "the weather is nice")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn repeated_stop_is_debounced() {
        let mut interpreter = interpreter();
        let now = Instant::now();
        let stop = RecognitionResult::from_text("stop");
        assert_eq!(
            command_name(&interpreter.interpret(&stop, now)),
            Some("stop".into())
        );
        assert_eq!(
            interpreter.interpret(&stop, now + Duration::from_millis(500)),
            Interpretation::Ignored(IgnoreReason::Duplicate)
        );
        assert_eq!(
            command_name(&interpreter.interpret(&stop, now + Duration::from_millis(3001))),
            Some("stop".into())
        );
    }

    #[test]
    fn interim_and_empty_results_are_ignored() {
        let mut interpreter = interpreter();
        let interim = RecognitionResult::new(vec![Alternative::new("stop", 0.9)], false);
        assert_eq!(
            interpreter.interpret(&interim, Instant::now()),
            Interpretation::Ignored(IgnoreReason::Interim)
        );
        let empty = RecognitionResult::new(vec![], true);
        assert_eq!(
            interpreter.interpret(&empty, Instant::now()),
            Interpretation::Ignored(IgnoreReason::Empty)
        );
    }

    #[test]
    fn interim_result_does_not_arm_debounce() {
        let mut interpreter = interpreter();
        let now = Instant::now();
        let interim = RecognitionResult::new(vec![Alternative::new("help", 0.9)], false);
        interpreter.interpret(&interim, now);
        let result = RecognitionResult::from_text("help");
        assert_eq!(
            command_name(&interpreter.interpret(&result, now)),
            Some("help".into())
        );
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = VoiceEvent::GeneralInput {
            transcript: "hello".to_owned(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "general_input");
        assert_eq!(json["transcript"], "hello");
    }
}
