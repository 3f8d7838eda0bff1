#![forbid(unsafe_code)]

pub mod highlight;

/// Split `text` into runs, flagging the characters whose positions appear in `hits`.
pub(crate) fn highlight_runs(text: &str, hits: &[usize]) -> Vec<(String, bool)> {
    let mut runs: Vec<(String, bool)> = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let hit = hits.contains(&i);
        match runs.last_mut() {
            Some((run, flag)) if *flag == hit => run.push(ch),
            _ => runs.push((ch.to_string(), hit)),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_group_adjacent_hits() {
        let runs = highlight_runs("Widget", &[0, 1, 4]);
        assert_eq!(
            runs,
            vec![("Wi".to_string(), true), ("dg".to_string(), false), ("e".to_string(), true), ("t".to_string(), false)]
        );
        assert!(highlight_runs("", &[1]).is_empty());
    }
}
