//! Highlighted excerpts around the densest cluster of matched tokens.

use crate::tokenizer::analyze;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SnippetConfig {
    /// Tokens kept on each side of the window centre.
    pub radius: usize,
    pub open_tag: String,
    pub close_tag: String,
    pub ellipsis: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        SnippetConfig {
            radius: 8,
            open_tag: "<em>".to_string(),
            close_tag: "</em>".to_string(),
            ellipsis: "...".to_string(),
        }
    }
}

/// Render an excerpt of `text`. `matches` are (term, position) pairs in the
/// normalized token stream of the same text, as produced by evaluation.
pub fn generate_snippet(text: &str, matches: &[(String, u32)], config: &SnippetConfig) -> String {
    let tokens = analyze(text);
    if tokens.is_empty() {
        let head: String = text.chars().take(200).collect();
        return collapse_whitespace(&head).trim().to_string();
    }
    let last = tokens.len() - 1;
    let hits: BTreeSet<usize> = matches
        .iter()
        .map(|(_, p)| *p as usize)
        .filter(|&p| p <= last)
        .collect();
    let width = 2 * config.radius;

    let (first_tok, last_tok) = match densest_window(&hits, width) {
        Some((lo, hi)) => {
            let centre = (lo + hi) / 2;
            let start = centre.saturating_sub(config.radius);
            let end = (start + width).min(last);
            (end.saturating_sub(width).min(start), end)
        }
        None => (0, width.min(last)),
    };

    let mut body = String::new();
    let mut cursor = if first_tok == 0 { 0 } else { tokens[first_tok].span.start };
    for tok in &tokens[first_tok..=last_tok] {
        body.push_str(&collapse_whitespace(&text[cursor..tok.span.start]));
        let word = &text[tok.span.clone()];
        if hits.contains(&tok.position) {
            body.push_str(&config.open_tag);
            body.push_str(word);
            body.push_str(&config.close_tag);
        } else {
            body.push_str(word);
        }
        cursor = tok.span.end;
    }
    if last_tok == last {
        body.push_str(&collapse_whitespace(&text[cursor..]));
    }

    let mut out = String::new();
    if first_tok > 0 {
        out.push_str(&config.ellipsis);
    }
    out.push_str(body.trim());
    if last_tok < last {
        out.push_str(&config.ellipsis);
    }
    out
}

/// First and last hit of the window of `width + 1` positions holding the
/// most hits; the earliest such window wins ties.
fn densest_window(hits: &BTreeSet<usize>, width: usize) -> Option<(usize, usize)> {
    let sorted: Vec<usize> = hits.iter().copied().collect();
    let mut best: Option<(usize, usize, usize)> = None;
    let mut hi = 0;
    for lo in 0..sorted.len() {
        if hi < lo {
            hi = lo;
        }
        while hi + 1 < sorted.len() && sorted[hi + 1] - sorted[lo] <= width {
            hi += 1;
        }
        let count = hi - lo + 1;
        if best.map_or(true, |(c, _, _)| count > c) {
            best = Some((count, sorted[lo], sorted[hi]));
        }
    }
    best.map(|(_, lo, hi)| (lo, hi))
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
