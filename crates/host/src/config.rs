use kindlens_core::protocol::ALL_NAMESPACES;

/// Host knobs, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Scope selected before the user picks one; `None` means all namespaces.
    pub default_namespace: Option<String>,
    /// Cap on rows per results payload.
    pub max_rows: usize,
    /// Program used to open YAML documents.
    pub editor: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { default_namespace: None, max_rows: 5000, editor: "vi".to_string() }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let default_namespace = std::env::var("KINDLENS_DEFAULT_NAMESPACE")
            .ok()
            .filter(|s| !s.is_empty() && s != ALL_NAMESPACES);
        let max_rows = std::env::var("KINDLENS_MAX_ROWS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_rows);
        let editor = std::env::var("KINDLENS_EDITOR")
            .or_else(|_| std::env::var("EDITOR"))
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.editor);
        Self { default_namespace, max_rows, editor }
    }
}
