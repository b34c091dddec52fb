mod command_table;
mod matcher;

pub use command_table::{AliasCollision, CommandEntry, CommandTable};
pub use matcher::CommandMatcher;
