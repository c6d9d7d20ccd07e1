//! Sentence-transformer encoder (all-MiniLM-L6-v2) via ONNX Runtime.
//!
//! The exported model returns token-level `last_hidden_state`; the sentence
//! embedding is the attention-masked mean of it, L2-normalized, which is what
//! the model's own pooling and normalize modules produce.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::value::{Tensor, Value};

use super::onnx::{self, TextTokenizer};
use super::{EmbedderKind, TextEmbedder};
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// ONNX model filename inside the model directory.
pub const MODEL_FILENAME: &str = "model.onnx";

/// Tokenizer filename inside the model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// Sentence-transformer wrapper.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct SentenceEncoder {
    session: Mutex<Session>,
    tokenizer: TextTokenizer,
    name: String,
    batch_size: usize,
    uses_token_type_ids: bool,
}

impl SentenceEncoder {
    /// Load from `{model_dir}/{sentence_model}/`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let name = config.sentence_model.clone();
        let dir = model_dir.join(&name);

        tracing::info!("Loading sentence model {} from {:?}", name, dir);
        let session = onnx::load_session(&name, &dir.join(MODEL_FILENAME))?;
        let tokenizer = TextTokenizer::load(
            &name,
            &dir.join(TOKENIZER_FILENAME),
            config.sentence_max_length,
        )?;
        let uses_token_type_ids = onnx::input_names(&session)
            .iter()
            .any(|n| n == "token_type_ids");
        tracing::info!("Sentence model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            name,
            batch_size: config.batch_size,
            uses_token_type_ids,
        })
    }

    /// Check whether the model files exist.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        let dir = model_dir.join(&config.sentence_model);
        dir.join(MODEL_FILENAME).exists() && dir.join(TOKENIZER_FILENAME).exists()
    }

    /// Directory the model files are expected in.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.sentence_model)
    }

    /// Encode one batch into L2-normalized sentence embeddings.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let tokens = self.tokenizer.encode_batch(&self.name, texts)?;
        let (batch_size, seq_len) = (tokens.batch_size, tokens.seq_len);
        let shape = tokens.shape();

        let input_ids = self.tensor(shape.clone(), tokens.input_ids)?;
        let attention_mask = self.tensor(shape.clone(), tokens.attention_mask.clone())?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| self.err(format!("Session lock poisoned: {e}")))?;

        let outputs = if self.uses_token_type_ids {
            let token_type_ids = self.tensor(shape, tokens.token_type_ids)?;
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(|e| self.err(format!("ONNX inference failed: {e}")))?;

        let hidden = outputs
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .ok_or_else(|| self.err("Model did not produce last_hidden_state".to_string()))?;

        let (hidden_shape, data) = hidden
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| self.err(format!("Failed to extract last_hidden_state: {e}")))?;

        if hidden_shape.len() != 3 {
            return Err(self.err(format!(
                "Unexpected last_hidden_state shape: {:?}",
                hidden_shape
            )));
        }
        let hidden_dim = hidden_shape[2] as usize;

        let embeddings = onnx::masked_mean_pool(
            data,
            &tokens.attention_mask,
            batch_size,
            seq_len,
            hidden_dim,
        )
        .iter()
        .map(|v| crate::math::l2_normalize(v))
        .collect();

        Ok(embeddings)
    }

    fn tensor(&self, shape: Vec<i64>, data: Vec<i64>) -> Result<Tensor<i64>, EmbeddingError> {
        Value::from_array((shape, data))
            .map_err(|e| self.err(format!("Failed to create input tensor: {e}")))
    }

    fn err(&self, message: String) -> EmbeddingError {
        EmbeddingError::Inference {
            model: self.name.clone(),
            message,
        }
    }
}

impl TextEmbedder for SentenceEncoder {
    fn kind(&self) -> EmbedderKind {
        EmbedderKind::Sentence
    }

    /// Trim each text, then encode in fixed-size batches.
    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, EmbeddingError> {
        let trimmed: Vec<String> = texts.iter().map(|t| t.trim().to_string()).collect();
        super::embed_in_batches(&self.name, &trimmed, self.batch_size, |batch| {
            self.encode_batch(batch)
        })
    }
}
