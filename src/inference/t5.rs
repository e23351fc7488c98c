//! T5 seq2seq backend built on candle.
//!
//! The model directory must contain the Hugging Face export of a
//! `T5ForConditionalGeneration` checkpoint:
//!
//! ```text
//! nl_to_sql_model/
//! ├── config.json
//! ├── model.safetensors
//! └── tokenizer.json
//! ```
//!
//! A checkpoint saved with only `spiece.model` (slow `T5Tokenizer`) or with
//! `pytorch_model.bin` weights is rejected with
//! [`GenerationError::MissingArtifact`]. Convert it once with `transformers`:
//!
//! ```text
//! from transformers import AutoTokenizer, T5ForConditionalGeneration
//! AutoTokenizer.from_pretrained(dir, use_fast=True).save_pretrained(dir)
//! T5ForConditionalGeneration.from_pretrained(dir).save_pretrained(dir, safe_serialization=True)
//! ```

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor, D};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::beam::{BeamSearch, StepScorer};
use super::{GenerationError, GenerationOptions, GenerationResult, SqlGenerator};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "model.safetensors";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Where to run inference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevicePreference {
    /// CUDA when available, otherwise CPU.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl DevicePreference {
    fn device(self) -> GenerationResult<Device> {
        let device = match self {
            DevicePreference::Auto => Device::cuda_if_available(0)?,
            DevicePreference::Cpu => Device::Cpu,
            DevicePreference::Cuda => Device::new_cuda(0)?,
        };
        Ok(device)
    }
}

/// Locations of the three model artifacts.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
    pub tokenizer: PathBuf,
}

impl ModelFiles {
    /// Resolve and check the artifacts inside `dir`.
    pub fn in_dir(dir: &Path) -> GenerationResult<Self> {
        let files = Self {
            config: dir.join(CONFIG_FILE),
            weights: dir.join(WEIGHTS_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
        };
        for path in [&files.config, &files.weights, &files.tokenizer] {
            if !path.exists() {
                return Err(GenerationError::MissingArtifact(path.clone()));
            }
        }
        Ok(files)
    }
}

/// Pretrained T5 text-to-SQL model.
pub struct T5Generator {
    model: T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
    search: BeamSearch,
}

impl T5Generator {
    /// Load the model from a local directory.
    pub fn load(
        dir: &Path,
        options: GenerationOptions,
        device: DevicePreference,
    ) -> GenerationResult<Self> {
        options.validate()?;
        let files = ModelFiles::in_dir(dir)?;
        let device = device.device()?;
        info!(model_dir = %dir.display(), device = ?device, "loading T5 model");

        let mut config: T5Config = serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;
        // Beams are rescored from the full prefix every step.
        config.use_cache = false;

        // Safety: the weights file is not modified while it is mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], DType::F32, &device)? };
        let model = T5ForConditionalGeneration::load(vb, &config)?;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;

        let start_token = config
            .decoder_start_token_id
            .unwrap_or(config.pad_token_id) as u32;
        let search = BeamSearch::new(options, start_token, config.eos_token_id as u32);

        Ok(Self {
            model,
            tokenizer,
            device,
            search,
        })
    }
}

impl SqlGenerator for T5Generator {
    fn generate(&mut self, text: &str) -> GenerationResult<String> {
        self.model.clear_kv_cache();

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let encoder_output = self.model.encode(&input_ids)?;

        let mut scorer = T5Scorer {
            model: &mut self.model,
            encoder_output: &encoder_output,
            device: &self.device,
        };
        let tokens = self.search.run(&mut scorer)?;
        debug!(tokens = tokens.len(), "beam search finished");

        let sql = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| GenerationError::Tokenizer(e.to_string()))?;
        Ok(sql.trim().to_string())
    }

    fn name(&self) -> &str {
        "t5"
    }
}

/// Scores every live beam in one batched decoder pass.
struct T5Scorer<'a> {
    model: &'a mut T5ForConditionalGeneration,
    encoder_output: &'a Tensor,
    device: &'a Device,
}

impl StepScorer for T5Scorer<'_> {
    fn next_log_probs(&mut self, prefixes: &[Vec<u32>]) -> GenerationResult<Vec<Vec<f32>>> {
        let batch = prefixes.len();
        let len = prefixes.first().map(Vec::len).unwrap_or(0);
        let flat: Vec<u32> = prefixes.iter().flatten().copied().collect();

        let decoder_ids = Tensor::from_vec(flat, (batch, len), self.device)?;
        let encoder_output = self.encoder_output.repeat((batch, 1, 1))?;
        let logits = self.model.decode(&decoder_ids, &encoder_output)?;
        let log_probs = candle_nn::ops::log_softmax(&logits.to_dtype(DType::F32)?, D::Minus1)?;

        Ok(log_probs.to_vec2::<f32>()?)
    }
}
