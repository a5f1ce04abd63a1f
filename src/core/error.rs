use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Source unreadable: {}: {source}", path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },
    #[error(
        "No entities found in {0}: no `export const <name> = <builder>Table(\"...\", {{ ... }})` declaration matched"
    )]
    NoEntitiesFound(String),
    #[error("Duplicate symbol name `{0}`: every entity and alias must be declared exactly once")]
    DuplicateSymbolName(String),
    #[error("Unterminated declaration `{name}`: {reason}")]
    UnterminatedDeclaration { name: String, reason: String },
    #[error("Write failure: {}: {source}", path.display())]
    WriteFailure { path: PathBuf, source: io::Error },
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Import cycle between modules: {0}")]
    ImportCycle(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Stale output: {0}")]
    StaleOutput(String),
}
