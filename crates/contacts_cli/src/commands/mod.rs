//! CLI command implementations.

pub mod create;
pub mod delta;
pub mod init;
pub mod inspect;
pub mod list;
pub mod trash;
pub mod update;

use crate::error::{CliError, CliResult};
use contacts_core::{Contacts, StorageConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Database directory.
    pub path: Option<PathBuf>,
    /// Storage settings built from global flags.
    pub config: StorageConfig,
}

impl Context {
    /// Returns the database path or fails naming `command`.
    pub fn path(&self, command: &'static str) -> CliResult<&Path> {
        self.path
            .as_deref()
            .ok_or(CliError::MissingPath { command })
    }

    /// Opens an existing database. Only `init` creates files.
    pub fn open(&self, command: &'static str) -> CliResult<Contacts> {
        let path = self.path(command)?;
        if !path.exists() {
            return Err(CliError::NoDatabase {
                path: path.to_path_buf(),
            });
        }
        let config = self.config.clone().create_if_missing(false);
        Ok(Contacts::open_with_config(path, config)?)
    }
}

/// Prints a value as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
