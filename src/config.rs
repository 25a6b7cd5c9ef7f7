use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

use crate::funclist::FuncList;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for compiling one unit of source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NakoConfig {
    /// エラーメッセージに付けるファイル名
    #[serde(default)]
    pub filename: Option<String>,

    /// Line number given to the first source line (0-based).
    #[serde(default = "default_start_line")]
    pub start_line: u32,

    /// Append the closing eol/eof pair. Off when lexing a fragment.
    #[serde(default = "default_true")]
    pub append_eof: bool,

    /// Built-in and plugin function signatures.
    #[serde(default)]
    pub functions: FuncList,
}

impl Default for NakoConfig {
    fn default() -> Self {
        Self {
            filename: None,
            start_line: default_start_line(),
            append_eof: default_true(),
            functions: FuncList::default(),
        }
    }
}

impl NakoConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    // JSONファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

// デフォルト値の定義
fn default_start_line() -> u32 {
    0
}
fn default_true() -> bool {
    true
}
