use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::info;

/// Opens text read-only in an external editor. Best effort: callers log and
/// swallow failures.
pub trait DocumentOpener: Send + Sync {
    fn open(&self, text: &str, language: &str) -> Result<()>;
}

/// Writes the text to a temp file and launches an editor on it without waiting.
pub struct EditorOpener {
    program: String,
    dir: PathBuf,
}

impl EditorOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), dir: std::env::temp_dir() }
    }

    fn extension(language: &str) -> &str {
        match language {
            "yaml" | "yml" => "yaml",
            "json" => "json",
            _ => "txt",
        }
    }

    fn temp_path(&self, language: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        self.dir.join(format!("kindlens-{}.{}", nanos, Self::extension(language)))
    }
}

impl DocumentOpener for EditorOpener {
    fn open(&self, text: &str, language: &str) -> Result<()> {
        let path = self.temp_path(language);
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        // the program may carry flags, e.g. "code --wait"
        let mut parts = self.program.split_whitespace();
        let bin = parts.next().context("empty editor command")?;
        Command::new(bin)
            .args(parts)
            .arg(&path)
            .spawn()
            .with_context(|| format!("launching {}", self.program))?;
        info!(editor = %self.program, path = %path.display(), "opener: document opened");
        Ok(())
    }
}
