//! Prompt normalization and SQL denormalization.
//!
//! ```text
//! "get all emp with age > 25"
//!        │ normalize_prompt
//!        ▼
//! "get all employees with age > 25"  ──► model ──►  "SELECT * FROM employees WHERE age > 25"
//!                                                          │ denormalize_sql (prompt mentions "emp")
//!                                                          ▼
//!                                                   "SELECT * FROM emp WHERE age > 25"
//! ```
//!
//! Denormalization is only a best-effort inverse: an entry is reversed when
//! its alias occurs in the original prompt and its canonical noun occurs in
//! the generated SQL. Anything else is left untouched.

use std::collections::HashMap;

use regex::{Captures, Regex};

use super::{AliasTable, MatchMode};

/// Rewrite every alias in `prompt` to its canonical noun.
///
/// The caller is expected to lower-case the prompt first; matching is
/// case-sensitive.
pub fn normalize_prompt(prompt: &str, table: &AliasTable, mode: MatchMode) -> String {
    match mode {
        MatchMode::Substring => {
            let mut out = prompt.to_string();
            for entry in table.iter().filter(|e| !e.alias.is_empty()) {
                if out.contains(&entry.alias) {
                    out = out.replace(&entry.alias, &entry.canonical);
                }
            }
            out
        }
        MatchMode::WordBoundary => {
            let forward: HashMap<&str, &str> = table
                .iter()
                .map(|e| (e.alias.as_str(), e.canonical.as_str()))
                .collect();
            replace_terms(prompt, &forward)
        }
    }
}

/// Map canonical nouns in generated SQL back to the aliases the user typed.
///
/// `prompt` is the original (lower-cased, not normalized) user prompt.
pub fn denormalize_sql(sql: &str, prompt: &str, table: &AliasTable, mode: MatchMode) -> String {
    match mode {
        MatchMode::Substring => {
            let mut out = sql.to_string();
            for entry in table
                .iter()
                .filter(|e| !e.alias.is_empty() && !e.canonical.is_empty())
            {
                if prompt.contains(&entry.alias) && out.contains(&entry.canonical) {
                    out = out.replace(&entry.canonical, &entry.alias);
                }
            }
            out
        }
        MatchMode::WordBoundary => {
            let mut reverse: HashMap<&str, &str> = HashMap::new();
            for entry in table.iter() {
                if reverse.contains_key(entry.canonical.as_str()) {
                    continue;
                }
                if contains_word(prompt, &entry.alias) && contains_word(sql, &entry.canonical) {
                    reverse.insert(entry.canonical.as_str(), entry.alias.as_str());
                }
            }
            replace_terms(sql, &reverse)
        }
    }
}

/// Alternation of whole-term matches, longer terms first so multi-word
/// aliases win over their own prefixes.
fn term_pattern<'a>(terms: impl Iterator<Item = &'a str>) -> Option<Regex> {
    let mut terms: Vec<&str> = terms.filter(|t| !t.is_empty()).collect();
    if terms.is_empty() {
        return None;
    }
    terms.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

    let alternation: Vec<String> = terms.iter().map(|t| bounded(t)).collect();
    match Regex::new(&alternation.join("|")) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "alias pattern rejected; leaving text unchanged");
            None
        }
    }
}

/// Escape `term` and anchor both edges.
///
/// A word-character edge needs `\b`. A punctuation edge (`c++`, `emp.`) needs
/// `\B`: the neighbour must also be a non-word character or the text edge.
fn bounded(term: &str) -> String {
    let edge = |c: Option<char>| match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => r"\B",
    };
    format!(
        "(?:{}{}{})",
        edge(term.chars().next()),
        regex::escape(term),
        edge(term.chars().last())
    )
}

fn contains_word(text: &str, term: &str) -> bool {
    term_pattern(std::iter::once(term)).is_some_and(|re| re.is_match(text))
}

/// Single pass over whole-word matches; replacements are never rescanned.
fn replace_terms(text: &str, map: &HashMap<&str, &str>) -> String {
    let Some(re) = term_pattern(map.keys().copied()) else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        let found = &caps[0];
        map.get(found).copied().unwrap_or(found).to_string()
    })
    .into_owned()
}
