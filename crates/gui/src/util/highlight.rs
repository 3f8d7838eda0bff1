#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId, TextStyle};
use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

// schema YAML changes once per selection, so a tiny memo keyed by content is enough
static JOBS: Lazy<Mutex<HashMap<(u64, bool), LayoutJob>>> = Lazy::new(|| Mutex::new(HashMap::new()));
const MAX_JOBS: usize = 16;

fn to_color32(c: syntect::highlighting::Color) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

fn content_hash(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

fn theme(dark: bool) -> Option<&'static Theme> {
    let preferred = if dark { "base16-ocean.dark" } else { "InspiredGitHub" };
    THEME_SET.themes.get(preferred).or_else(|| THEME_SET.themes.values().next())
}

/// YAML text as a syntax-coloured layout job, in the monospace style of `ui`.
pub fn yaml_job(text: &str, ui: &egui::Ui) -> LayoutJob {
    let dark = ui.visuals().dark_mode;
    let key = (content_hash(text), dark);
    if let Some(job) = JOBS.lock().ok().and_then(|m| m.get(&key).cloned()) {
        return job;
    }
    let mono = TextStyle::Monospace.resolve(ui.style());
    let job = build_job(text, dark, mono, ui.visuals().text_color());
    if let Ok(mut m) = JOBS.lock() {
        if m.len() >= MAX_JOBS {
            m.clear();
        }
        m.insert(key, job.clone());
    }
    job
}

fn build_job(text: &str, dark: bool, font: FontId, fallback: Color32) -> LayoutJob {
    let mut job = LayoutJob::default();
    let plain = |color| TextFormat { font_id: font.clone(), color, ..Default::default() };
    let Some(theme) = theme(dark) else {
        job.append(text, 0.0, plain(fallback));
        return job;
    };
    let syntax = SYNTAX_SET
        .find_syntax_by_extension("yaml")
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let mut hl = HighlightLines::new(syntax, theme);
    for line in text.split_inclusive('\n') {
        match hl.highlight_line(line, &SYNTAX_SET) {
            Ok(regions) => {
                for (style, piece) in regions {
                    job.append(piece, 0.0, plain(to_color32(style.foreground)));
                }
            }
            Err(_) => job.append(line, 0.0, plain(fallback)),
        }
    }
    job
}
