// Console layer - the line-oriented terminal front end.

#[path = "commands.rs"]
pub mod commands;

#[path = "formatter.rs"]
pub mod formatter;

#[path = "repl.rs"]
pub mod repl;

pub use repl::Console;
