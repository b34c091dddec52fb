use crate::commands::{CommandEntry, CommandMatcher};
use serde::{Deserialize, Serialize};

/// Confidence assumed when the recognizer doesn't report one.
/// Browsers report 0 for missing values so that is treated the same way.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub transcript: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl Alternative {
    pub fn new(transcript: &str, confidence: f32) -> Self {
        Self {
            transcript: transcript.to_owned(),
            confidence: Some(confidence),
        }
    }

    pub fn effective_confidence(&self) -> f32 {
        match self.confidence {
            Some(confidence) if confidence > 0.0 => confidence,
            _ => DEFAULT_CONFIDENCE,
        }
    }
}

/// One recognizer callback worth of output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub alternatives: Vec<Alternative>,
    #[serde(default = "default_is_final")]
    pub is_final: bool,
}

fn default_is_final() -> bool {
    true
}

impl RecognitionResult {
    pub fn new(alternatives: Vec<Alternative>, is_final: bool) -> Self {
        Self {
            alternatives,
            is_final,
        }
    }

    /// Final result with a single alternative of unknown confidence
    pub fn from_text(text: &str) -> Self {
        Self {
            alternatives: vec![Alternative {
                transcript: text.to_owned(),
                confidence: None,
            }],
            is_final: true,
        }
    }

    /// Normalized transcript of the top alternative
    pub fn transcript(&self) -> String {
        self.alternatives
            .first()
            .map(|alternative| alternative.transcript.trim().to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchDecision<'a> {
    Command {
        command: &'a CommandEntry,
        confidence: f32,
        alternative_index: usize,
    },
    NoMatch,
}

/// Picks the command matched by the most confident alternative.
///
/// Alternatives that match nothing never win, even when they are the most
/// confident ones. Ties keep the earlier alternative.
pub fn select_command<'a>(
    result: &RecognitionResult,
    matcher: &'a CommandMatcher,
    max_alternatives: usize,
) -> MatchDecision<'a> {
    let mut best = MatchDecision::NoMatch;
    let mut best_confidence = 0.0;
    for (index, alternative) in result
        .alternatives
        .iter()
        .take(max_alternatives)
        .enumerate()
    {
        let confidence = alternative.effective_confidence();
        tracing::trace!(
            "Alternative {}: {:?} (confidence: {})",
            index,
            alternative.transcript,
            confidence
        );
        if let Some(command) = matcher.find_command(&alternative.transcript) {
            if confidence > best_confidence {
                best_confidence = confidence;
                best = MatchDecision::Command {
                    command,
                    confidence,
                    alternative_index: index,
                };
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandEntry, CommandTable};

    fn matcher() -> CommandMatcher {
        CommandMatcher::new(CommandTable::builtin(), true)
    }

    #[test]
    fn more_confident_matching_alternative_wins() {
        let matcher = matcher();
        let result = RecognitionResult::new(
            vec![
                Alternative::new("stop the music", 0.4),
                Alternative::new("stop", 0.9),
            ],
            true,
        );
        match select_command(&result, &matcher, 5) {
            MatchDecision::Command {
                command,
                confidence,
                alternative_index,
            } => {
                assert_eq!(command.name, "stop");
                assert_eq!(confidence, 0.9);
                assert_eq!(alternative_index, 1);
            }
            MatchDecision::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn confident_alternative_without_match_is_skipped() {
        let matcher = matcher();
        let result = RecognitionResult::new(
            vec![
                Alternative::new("the weather is nice", 0.95),
                Alternative::new("system status", 0.3),
            ],
            true,
        );
        match select_command(&result, &matcher, 5) {
            MatchDecision::Command { command, .. } => assert_eq!(command.name, "status"),
            MatchDecision::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn ties_keep_first_alternative() {
        let table = CommandTable::new(vec![
            CommandEntry::new("help", &[]),
            CommandEntry::new("status", &[]),
        ])
        .unwrap();
        let matcher = CommandMatcher::new(table, true);
        let result = RecognitionResult::new(
            vec![Alternative::new("status", 0.7), Alternative::new("help", 0.7)],
            true,
        );
        match select_command(&result, &matcher, 5) {
            MatchDecision::Command {
                command,
                alternative_index,
                ..
            } => {
                assert_eq!(command.name, "status");
                assert_eq!(alternative_index, 0);
            }
            MatchDecision::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn alternatives_past_limit_are_ignored() {
        let matcher = matcher();
        let result = RecognitionResult::new(
            vec![Alternative::new("hello there", 0.9), Alternative::new("help", 0.8)],
            true,
        );
        assert_eq!(select_command(&result, &matcher, 1), MatchDecision::NoMatch);
    }

    #[test]
    fn missing_confidence_uses_default() {
        let zero = Alternative::new("help", 0.0);
        let missing = RecognitionResult::from_text("help");
        assert_eq!(zero.effective_confidence(), DEFAULT_CONFIDENCE);
        assert_eq!(
            missing.alternatives[0].effective_confidence(),
            DEFAULT_CONFIDENCE
        );
    }

    #[test]
    fn parses_recognizer_json() {
        let json = r#"{"alternatives":[{"transcript":" Hey Phoenix ","confidence":0.8},{"transcript":"hey venice"}]}"#;
        let result: RecognitionResult = serde_json::from_str(json).unwrap();
        assert!(result.is_final);
        assert_eq!(result.transcript(), "hey phoenix");
        assert_eq!(result.alternatives[1].confidence, None);
    }
}
