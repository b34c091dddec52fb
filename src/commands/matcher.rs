use super::command_table::{normalize, CommandEntry, CommandTable};

/// Maps transcripts to commands of a [`CommandTable`].
///
/// Exact phrases are checked across the whole table first. With fuzzy
/// matching on, the transcript then only has to contain a phrase, so
/// "please don't stop the music" still triggers `stop`.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    table: CommandTable,
    fuzzy_match: bool,
}

impl CommandMatcher {
    pub fn new(table: CommandTable, fuzzy_match: bool) -> Self {
        Self { table, fuzzy_match }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn find_command(&self, transcript: &str) -> Option<&CommandEntry> {
        let normalized = normalize(transcript);
        if normalized.is_empty() {
            return None;
        }

        if let Some(entry) = self
            .table
            .entries()
            .iter()
            .find(|entry| entry.phrases().any(|phrase| phrase == normalized))
        {
            return Some(entry);
        }

        if self.fuzzy_match {
            return self.table.entries().iter().find(|entry| {
                entry
                    .phrases()
                    .any(|phrase| normalized.contains(phrase))
            });
        }

        None
    }
}
