//! Prompt → SQL pipeline around a [`SqlGenerator`].

use tracing::debug;

use crate::alias::{denormalize_sql, normalize_prompt, AliasTable, MatchMode};
use crate::inference::{GenerationResult, SqlGenerator};

/// Every intermediate form of one translated prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Lower-cased user prompt.
    pub prompt: String,
    /// Prompt as sent to the model.
    pub normalized: String,
    /// SQL exactly as the model produced it.
    pub generated: String,
    /// SQL with aliases restored; this is what gets shown and executed.
    pub sql: String,
}

/// Alias rewriting plus generation.
pub struct Translator<G> {
    generator: G,
    aliases: AliasTable,
    mode: MatchMode,
}

impl<G: SqlGenerator> Translator<G> {
    pub fn new(generator: G, aliases: AliasTable, mode: MatchMode) -> Self {
        Self {
            generator,
            aliases,
            mode,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Send the prompt to the model untouched.
    pub fn generate_raw(&mut self, prompt: &str) -> GenerationResult<String> {
        let sql = self.generator.generate(prompt)?;
        debug!(backend = self.generator.name(), sql = %sql, "generated");
        Ok(sql)
    }

    /// Lower-case, normalize, generate, and denormalize.
    pub fn translate(&mut self, prompt: &str) -> GenerationResult<Translation> {
        let prompt = prompt.to_lowercase();
        let normalized = normalize_prompt(&prompt, &self.aliases, self.mode);
        debug!(prompt = %prompt, normalized = %normalized, "normalized prompt");

        let generated = self.generate_raw(&normalized)?;
        let sql = denormalize_sql(&generated, &prompt, &self.aliases, self.mode);
        if sql != generated {
            debug!(sql = %sql, "denormalized sql");
        }

        Ok(Translation {
            prompt,
            normalized,
            generated,
            sql,
        })
    }
}
