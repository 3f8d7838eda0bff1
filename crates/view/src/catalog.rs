//! Catalog list with a local filter query.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use kindlens_core::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    /// Index into [`CatalogState::entries`].
    pub index: usize,
    pub score: i64,
    /// Whether the query occurs verbatim (case-insensitively); these rank first.
    pub substring: bool,
    /// Character positions in `kind` to highlight.
    pub hi_indices: Vec<usize>,
}

#[derive(Default)]
pub struct CatalogState {
    entries: Vec<CatalogEntry>,
    query: String,
    matches: Vec<CatalogMatch>,
}

impl CatalogState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_entries(&mut self, entries: Vec<CatalogEntry>) {
        self.entries = entries;
        self.rematch();
    }

    pub fn set_query(&mut self, query: &str) {
        if query == self.query {
            return;
        }
        self.query = query.to_string();
        self.rematch();
    }

    pub fn matches(&self) -> &[CatalogMatch] {
        &self.matches
    }

    /// Entries passing the query, best first.
    pub fn visible(&self) -> Vec<&CatalogEntry> {
        self.matches.iter().map(|m| &self.entries[m.index]).collect()
    }

    pub fn find(&self, display_key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.display_key == display_key)
    }

    fn rematch(&mut self) {
        let q = self.query.trim();
        if q.is_empty() {
            self.matches = (0..self.entries.len())
                .map(|index| CatalogMatch { index, score: 0, substring: true, hi_indices: Vec::new() })
                .collect();
            return;
        }
        let matcher = SkimMatcherV2::default();
        let needle = q.to_lowercase();
        let mut out: Vec<CatalogMatch> = Vec::new();
        for (index, e) in self.entries.iter().enumerate() {
            let substring = e.kind.to_lowercase().contains(&needle)
                || e.display_key.to_lowercase().contains(&needle)
                || e.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&needle));
            let fuzzy = matcher.fuzzy_indices(&e.kind, q);
            if !substring && fuzzy.is_none() {
                continue;
            }
            let (score, hi_indices) = fuzzy.unwrap_or((0, Vec::new()));
            out.push(CatalogMatch { index, score, substring, hi_indices });
        }
        // stable: ties keep catalog order
        out.sort_by(|a, b| b.substring.cmp(&a.substring).then(b.score.cmp(&a.score)));
        self.matches = out;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: &str, group: &str, description: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            display_key: format!("{}/v1/{}", group, kind),
            kind: kind.into(),
            description: description.map(str::to_string),
        }
    }

    fn kinds(c: &CatalogState) -> Vec<&str> {
        c.visible().iter().map(|e| e.kind.as_str()).collect()
    }

    fn sample() -> CatalogState {
        let mut c = CatalogState::new();
        c.set_entries(vec![
            entry("Certificate", "cert-manager.io", Some("A certificate request")),
            entry("Issuer", "cert-manager.io", None),
            entry("Widget", "example.com", Some("Widgets for testing")),
            entry("VirtualService", "networking.istio.io", None),
        ]);
        c
    }

    #[test]
    fn empty_query_keeps_catalog_order() {
        let c = sample();
        assert_eq!(kinds(&c), vec!["Certificate", "Issuer", "Widget", "VirtualService"]);
    }

    #[test]
    fn substring_on_key_or_description() {
        let mut c = sample();
        c.set_query("CERT-manager");
        assert_eq!(kinds(&c), vec!["Certificate", "Issuer"]);
        c.set_query("testing");
        assert_eq!(kinds(&c), vec!["Widget"]);
    }

    #[test]
    fn fuzzy_kind_matches_rank_after_substring_hits() {
        let mut c = sample();
        c.set_query("vs");
        let visible = kinds(&c);
        assert_eq!(visible.first(), Some(&"VirtualService"));
        let m = &c.matches()[0];
        assert!(!m.substring);
        assert!(!m.hi_indices.is_empty());
    }

    #[test]
    fn no_match_yields_empty_list() {
        let mut c = sample();
        c.set_query("zzzz");
        assert!(c.visible().is_empty());
        assert!(c.find("example.com/v1/Widget").is_some());
    }
}
