//! Text-to-SQL inference.
//!
//! The model is consumed through a single text-in/text-out contract,
//! [`SqlGenerator`]. The production backend is [`T5Generator`]
//! (tokenize → beam-search generate → decode); tests substitute a mock.
//!
//! ```text
//! prompt ──► tokenizer ──► encoder ──► beam search (decoder steps) ──► tokenizer.decode ──► SQL
//! ```

pub mod beam;
pub mod t5;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use beam::{BeamSearch, StepScorer};
pub use t5::T5Generator;

/// Result type for inference operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors raised while loading or running the model.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// A required model artifact is missing.
    #[error(
        "model file not found: {0} (the model directory needs config.json, \
         model.safetensors and tokenizer.json; re-save a slow-tokenizer or \
         pytorch_model.bin export with save_pretrained, see nl2sql::inference::t5)"
    )]
    MissingArtifact(PathBuf),

    #[error("failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("tensor backend error: {0}")]
    Backend(#[from] candle_core::Error),

    /// Beam search was configured with values it cannot run with.
    #[error("invalid generation options: {0}")]
    InvalidOptions(String),

    /// The scorer returned a result of the wrong shape.
    #[error("scorer returned {got} rows for {expected} prefixes")]
    ScorerShape { expected: usize, got: usize },

    /// Any other failure reported by a generator implementation.
    #[error("{0}")]
    Other(String),
}

/// Decoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Beam width.
    pub num_beams: usize,

    /// Maximum decoder sequence length, counting the start token.
    pub max_length: usize,

    /// Stop once `num_beams` hypotheses have finished.
    pub early_stopping: bool,

    /// Exponent applied to the generated length when ranking hypotheses.
    pub length_penalty: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            num_beams: 4,
            max_length: 64,
            early_stopping: true,
            length_penalty: 1.0,
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> GenerationResult<()> {
        if self.num_beams == 0 {
            return Err(GenerationError::InvalidOptions(
                "num_beams must be at least 1".to_string(),
            ));
        }
        if self.max_length < 2 {
            return Err(GenerationError::InvalidOptions(
                "max_length must leave room for at least one generated token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Text-in/text-out SQL generation.
pub trait SqlGenerator {
    /// Generate SQL for a (possibly normalized) prompt.
    fn generate(&mut self, text: &str) -> GenerationResult<String>;

    /// Short backend name for logs.
    fn name(&self) -> &str {
        "generator"
    }
}

impl<G: SqlGenerator + ?Sized> SqlGenerator for Box<G> {
    fn generate(&mut self, text: &str) -> GenerationResult<String> {
        (**self).generate(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

type Loader<G> = Box<dyn FnMut() -> GenerationResult<G>>;

/// Defers loading a generator until the first request, then keeps it.
///
/// A failed load is reported to the caller and attempted again on the next
/// request.
pub struct LazyGenerator<G> {
    loader: Loader<G>,
    loaded: Option<G>,
}

impl<G: SqlGenerator> LazyGenerator<G> {
    pub fn new(loader: impl FnMut() -> GenerationResult<G> + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            loaded: None,
        }
    }

    /// Whether the underlying generator has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    fn get(&mut self) -> GenerationResult<&mut G> {
        if self.loaded.is_none() {
            let generator = (self.loader)()?;
            tracing::info!(backend = generator.name(), "generator loaded");
            self.loaded = Some(generator);
        }
        match self.loaded.as_mut() {
            Some(generator) => Ok(generator),
            None => Err(GenerationError::Other("generator not loaded".to_string())),
        }
    }
}

impl<G: SqlGenerator> SqlGenerator for LazyGenerator<G> {
    fn generate(&mut self, text: &str) -> GenerationResult<String> {
        self.get()?.generate(text)
    }

    fn name(&self) -> &str {
        match &self.loaded {
            Some(generator) => generator.name(),
            None => "lazy",
        }
    }
}

impl<G> fmt::Debug for LazyGenerator<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyGenerator")
            .field("loaded", &self.loaded.is_some())
            .finish()
    }
}
