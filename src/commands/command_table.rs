use crate::error::{PhoenixError, PhoenixResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::*;

/// One canonical voice command and the phrases that trigger it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Sentence spoken back when the command runs
    #[serde(default)]
    pub response: Option<String>,
    /// Running this command ends the listening session
    #[serde(default)]
    pub stop_listening: bool,
}

impl CommandEntry {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            response: None,
            stop_listening: false,
        }
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response = Some(response.to_owned());
        self
    }

    pub fn stopping(mut self) -> Self {
        self.stop_listening = true;
        self
    }

    /// Canonical name followed by all aliases
    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// A phrase claimed by more than one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasCollision {
    pub phrase: String,
    /// Command that wins because it was registered first
    pub winner: String,
    pub shadowed: String,
}

/// Ordered, immutable set of voice commands.
///
/// Order is registration order and decides which command wins when two of
/// them claim the same phrase.
#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    collisions: Vec<AliasCollision>,
}

pub(crate) fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

impl CommandTable {
    pub fn new(entries: Vec<CommandEntry>) -> PhoenixResult<Self> {
        let mut normalized: Vec<CommandEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = normalize(&entry.name);
            if name.is_empty() {
                return Err(PhoenixError::EmptyCommandName);
            }
            if normalized.iter().any(|existing| existing.name == name) {
                return Err(PhoenixError::DuplicateCommand(name));
            }
            let mut aliases: Vec<String> = Vec::with_capacity(entry.aliases.len());
            for alias in entry.aliases.iter().map(|alias| normalize(alias)) {
                if !alias.is_empty() && alias != name && !aliases.contains(&alias) {
                    aliases.push(alias);
                }
            }
            normalized.push(CommandEntry {
                name,
                aliases,
                response: entry.response,
                stop_listening: entry.stop_listening,
            });
        }

        let collisions = find_collisions(&normalized);
        for collision in &collisions {
            warn!(
                "Phrase {:?} is claimed by {:?} and {:?}, {:?} wins",
                collision.phrase, collision.winner, collision.shadowed, collision.winner
            );
        }

        Ok(Self {
            entries: normalized,
            collisions,
        })
    }

    /// Default command set of the Phoenix assistant
    pub fn builtin() -> Self {
        let entries = vec![
            CommandEntry::new(
                "activate phoenix",
                &[
                    "wake up phoenix",
                    "phoenix activate",
                    "hey phoenix",
                    "start phoenix",
                ],
            )
            .with_response("Phoenix systems activated. How can I assist you?"),
            CommandEntry::new("help", &["what can you do", "commands", "options", "menu"])
                .with_response(
                    "I can help you with ordering food, booking rides, scheduling meetings, \
                     and much more. Just tell me what you need.",
                ),
            CommandEntry::new(
                "stop",
                &["shut down", "stop listening", "pause", "quiet"],
            )
            .with_response("Going to standby mode.")
            .stopping(),
            CommandEntry::new(
                "status",
                &[
                    "how are you",
                    "system status",
                    "check status",
                    "diagnostics",
                ],
            )
            .with_response(
                "All systems operational. Voice recognition enhanced. Butler service ready.",
            ),
        ];
        Self {
            collisions: find_collisions(&entries),
            entries,
        }
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        let name = normalize(name);
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn collisions(&self) -> &[AliasCollision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn find_collisions(entries: &[CommandEntry]) -> Vec<AliasCollision> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut collisions = vec![];
    for entry in entries {
        for phrase in entry.phrases() {
            match owners.get(phrase) {
                Some(owner) if *owner != entry.name => collisions.push(AliasCollision {
                    phrase: phrase.to_owned(),
                    winner: owner.to_string(),
                    shadowed: entry.name.clone(),
                }),
                Some(_) => {}
                None => {
                    owners.insert(phrase, &entry.name);
                }
            }
        }
    }
    collisions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_no_collisions() {
        let table = CommandTable::builtin();
        assert_eq!(table.len(), 4);
        assert!(table.collisions().is_empty());
        assert!(table.get("stop").unwrap().stop_listening);
    }

    #[test]
    fn entries_are_normalized() {
        let table = CommandTable::new(vec![CommandEntry::new(
            "  Lights ON ",
            &["Turn On The Lights", "", "lights on"],
        )])
        .unwrap();
        let entry = table.get("lights on").unwrap();
        assert_eq!(entry.name, "lights on");
        assert_eq!(entry.aliases, vec!["turn on the lights".to_owned()]);
    }

    #[test]
    fn duplicate_command_is_rejected() {
        let result = CommandTable::new(vec![
            CommandEntry::new("help", &[]),
            CommandEntry::new("HELP", &["menu"]),
        ]);
        assert!(matches!(result, Err(PhoenixError::DuplicateCommand(name)) if name == "help"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let result = CommandTable::new(vec![CommandEntry::new("   ", &["menu"])]);
        assert!(matches!(result, Err(PhoenixError::EmptyCommandName)));
    }

    #[test]
    fn collisions_are_reported_in_table_order() {
        let table = CommandTable::new(vec![
            CommandEntry::new("stop", &["pause"]),
            CommandEntry::new("pause music", &["pause", "stop"]),
        ])
        .unwrap();
        assert_eq!(
            table.collisions(),
            &[
                AliasCollision {
                    phrase: "pause".to_owned(),
                    winner: "stop".to_owned(),
                    shadowed: "pause music".to_owned(),
                },
                AliasCollision {
                    phrase: "stop".to_owned(),
                    winner: "stop".to_owned(),
                    shadowed: "pause music".to_owned(),
                },
            ]
        );
    }
}
