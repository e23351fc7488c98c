//! Alias table mapping informal domain nouns to canonical schema nouns.
//!
//! The generation model was trained on a fixed vocabulary of table names
//! (`employees`, `students`, ...). Users write `emp`, `staff` or `pupil`
//! instead. An [`AliasTable`] holds the ordered `alias -> canonical` pairs
//! that the [`rewrite`] functions apply before and after inference.
//!
//! # Ordering and duplicates
//!
//! A table behaves like an insertion-ordered map:
//!
//! - entries are applied in the order their alias was first inserted
//! - inserting an alias that already exists overwrites its canonical value
//!   in place (last write wins) without moving it
//!
//! The built-in data has duplicate keys and canonical values that are
//! themselves aliases. [`AliasTable::conflicts`] reports these so they can be
//! logged when a table is loaded.
//!
//! ```text
//! emp      -> employees        students  -> studentss   (overwrote "student")
//! employee -> employees        lib       -> libraries
//! ...                          employees -> employeess  (canonical is also an alias)
//! ```

pub mod rewrite;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

pub use rewrite::{denormalize_sql, normalize_prompt};

/// Raw alias data, in source order. Duplicate keys are intentional and are
/// resolved by [`AliasTable::from_pairs`].
const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("emp", "employees"),
    ("employee", "employees"),
    ("staff", "employees"),
    ("pupil", "students"),
    ("learner", "students"),
    ("item", "products"),
    ("purchase", "orders"),
    ("subject", "courses"),
    ("students", "student"),
    ("lib", "libraries"),
    ("library", "libraries"),
    ("students", "studentss"),
    ("employees", "employeess"),
];

static BUILTIN: LazyLock<AliasTable> =
    LazyLock::new(|| AliasTable::from_pairs(BUILTIN_PAIRS.iter().copied()));

/// A single `alias -> canonical` mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    /// Informal noun as the user types it.
    pub alias: String,
    /// Schema noun the model expects.
    pub canonical: String,
}

impl AliasEntry {
    pub fn new(alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            canonical: canonical.into(),
        }
    }
}

/// How aliases are matched inside prompts and generated SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Plain substring replacement applied entry by entry, in table order.
    ///
    /// Later entries see the output of earlier ones, so rewrites can cascade
    /// (`emp` -> `employees` -> `employeess`).
    #[default]
    Substring,

    /// Whole-word replacement in a single pass; replaced text is never
    /// matched again.
    ///
    /// An alias only matches where neither neighbour continues it: `emp`
    /// skips `temp`, and `c++` skips `abc++`.
    WordBoundary,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Substring => write!(f, "substring"),
            MatchMode::WordBoundary => write!(f, "word_boundary"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(MatchMode::Substring),
            "word_boundary" | "word-boundary" | "word" => Ok(MatchMode::WordBoundary),
            other => Err(format!("unknown alias match mode: {}", other)),
        }
    }
}

/// A data-quality problem found in an alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasConflict {
    /// The same alias was inserted more than once; `kept` won.
    DuplicateAlias {
        alias: String,
        overwritten: String,
        kept: String,
    },

    /// Several aliases map to one canonical noun, so the reverse mapping is
    /// ambiguous. `aliases` are in table order; the first one is used.
    AmbiguousCanonical {
        canonical: String,
        aliases: Vec<String>,
    },

    /// A canonical noun is itself an alias and will be rewritten again in
    /// substring mode.
    Chained {
        alias: String,
        canonical: String,
        next: String,
    },
}

impl fmt::Display for AliasConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AliasConflict::DuplicateAlias {
                alias,
                overwritten,
                kept,
            } => write!(
                f,
                "alias '{}' defined more than once: '{}' overwritten by '{}'",
                alias, overwritten, kept
            ),
            AliasConflict::AmbiguousCanonical { canonical, aliases } => write!(
                f,
                "canonical '{}' has several aliases ({}); reverse lookup uses '{}'",
                canonical,
                aliases.join(", "),
                aliases[0]
            ),
            AliasConflict::Chained {
                alias,
                canonical,
                next,
            } => write!(
                f,
                "'{}' maps to '{}', which is itself an alias of '{}'",
                alias, canonical, next
            ),
        }
    }
}

/// Ordered alias table with last-write-wins duplicate handling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
    overwrites: Vec<AliasConflict>,
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shipped with the model.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Build a table from pairs in insertion order.
    pub fn from_pairs<A, C>(pairs: impl IntoIterator<Item = (A, C)>) -> Self
    where
        A: Into<String>,
        C: Into<String>,
    {
        let mut table = Self::new();
        for (alias, canonical) in pairs {
            table.insert(alias, canonical);
        }
        table
    }

    /// Insert or overwrite an alias.
    ///
    /// An existing alias keeps its position and takes the new canonical value.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        let alias = alias.into();
        let canonical = canonical.into();

        match self.entries.iter_mut().find(|e| e.alias == alias) {
            Some(existing) => {
                if existing.canonical != canonical {
                    self.overwrites.push(AliasConflict::DuplicateAlias {
                        alias: alias.clone(),
                        overwritten: existing.canonical.clone(),
                        kept: canonical.clone(),
                    });
                }
                existing.canonical = canonical;
            }
            None => self.entries.push(AliasEntry { alias, canonical }),
        }
    }

    /// Append every entry of `other`, with the same overwrite rule.
    pub fn extend(&mut self, other: impl IntoIterator<Item = AliasEntry>) {
        for entry in other {
            self.insert(entry.alias, entry.canonical);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical noun for an alias.
    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .map(|e| e.canonical.as_str())
    }

    /// First alias (in table order) that maps to `canonical`.
    pub fn reverse_lookup(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.canonical == canonical)
            .map(|e| e.alias.as_str())
    }

    /// Derived `canonical -> alias` map, first alias wins.
    pub fn reverse_map(&self) -> HashMap<&str, &str> {
        let mut map = HashMap::new();
        for entry in &self.entries {
            map.entry(entry.canonical.as_str())
                .or_insert(entry.alias.as_str());
        }
        map
    }

    /// Every data-quality problem in the table.
    ///
    /// Duplicate aliases come first (in the order they were overwritten),
    /// then ambiguous canonicals and chains, in table order.
    pub fn conflicts(&self) -> Vec<AliasConflict> {
        let mut conflicts = self.overwrites.clone();

        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if seen.contains(&entry.canonical.as_str()) {
                continue;
            }
            seen.push(&entry.canonical);

            let aliases: Vec<String> = self
                .entries
                .iter()
                .filter(|e| e.canonical == entry.canonical)
                .map(|e| e.alias.clone())
                .collect();
            if aliases.len() > 1 {
                conflicts.push(AliasConflict::AmbiguousCanonical {
                    canonical: entry.canonical.clone(),
                    aliases,
                });
            }
        }

        for entry in &self.entries {
            if let Some(next) = self.canonical(&entry.canonical) {
                conflicts.push(AliasConflict::Chained {
                    alias: entry.alias.clone(),
                    canonical: entry.canonical.clone(),
                    next: next.to_string(),
                });
            }
        }

        conflicts
    }

    /// Log every conflict at `warn`.
    pub fn log_conflicts(&self) {
        for conflict in self.conflicts() {
            tracing::warn!("alias table: {}", conflict);
        }
    }
}

impl FromIterator<AliasEntry> for AliasTable {
    fn from_iter<I: IntoIterator<Item = AliasEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
