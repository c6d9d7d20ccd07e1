//! CLIP ViT-B/32 text tower via ONNX Runtime.
//!
//! Only the text model is used. It emits projected `text_embeds` directly,
//! so no pooling happens here and the vectors are left unnormalized.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::Session;
use ort::value::{Tensor, Value};

use super::onnx::{self, TextTokenizer};
use super::{EmbedderKind, TextEmbedder};
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// ONNX text model filename inside the model directory.
pub const TEXT_MODEL_FILENAME: &str = "text_model.onnx";

/// Tokenizer filename inside the model directory.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

/// CLIP text encoder.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct ClipTextEncoder {
    session: Mutex<Session>,
    tokenizer: TextTokenizer,
    name: String,
    batch_size: usize,
    uses_attention_mask: bool,
}

impl ClipTextEncoder {
    /// Load from `{model_dir}/{clip_model}/`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let name = config.clip_model.clone();
        let dir = model_dir.join(&name);

        tracing::info!("Loading CLIP text model {} from {:?}", name, dir);
        let session = onnx::load_session(&name, &dir.join(TEXT_MODEL_FILENAME))?;
        let tokenizer =
            TextTokenizer::load(&name, &dir.join(TOKENIZER_FILENAME), config.clip_max_length)?;
        let uses_attention_mask = onnx::input_names(&session)
            .iter()
            .any(|n| n == "attention_mask");
        tracing::info!("CLIP text model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            name,
            batch_size: config.batch_size,
            uses_attention_mask,
        })
    }

    /// Check whether the model files exist.
    pub fn model_exists(config: &EmbeddingConfig, model_dir: &Path) -> bool {
        let dir = model_dir.join(&config.clip_model);
        dir.join(TEXT_MODEL_FILENAME).exists() && dir.join(TOKENIZER_FILENAME).exists()
    }

    /// Directory the model files are expected in.
    pub fn model_path(config: &EmbeddingConfig, model_dir: &Path) -> PathBuf {
        model_dir.join(&config.clip_model)
    }

    /// Encode one batch into projected text features.
    pub fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let tokens = self.tokenizer.encode_batch(&self.name, texts)?;
        let batch_size = tokens.batch_size;
        let shape = tokens.shape();

        let input_ids = self.tensor(shape.clone(), tokens.input_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| self.err(format!("Session lock poisoned: {e}")))?;

        let outputs = if self.uses_attention_mask {
            let attention_mask = self.tensor(shape, tokens.attention_mask)?;
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids])
        }
        .map_err(|e| self.err(format!("ONNX inference failed: {e}")))?;

        let embeds = outputs
            .iter()
            .find(|(name, _)| *name == "text_embeds")
            .ok_or_else(|| self.err("Model did not produce text_embeds".to_string()))?;

        let (embeds_shape, data) = embeds
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| self.err(format!("Failed to extract text_embeds: {e}")))?;

        if embeds_shape.len() != 2
            || embeds_shape[0] as usize != batch_size
            || embeds_shape[1] <= 0
        {
            return Err(self.err(format!(
                "Unexpected text_embeds shape: {:?}",
                embeds_shape
            )));
        }
        let dim = embeds_shape[1] as usize;

        Ok(data.chunks(dim).map(|row| row.to_vec()).collect())
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

impl TextEmbedder for ClipTextEncoder {
    fn kind(&self) -> EmbedderKind {
        EmbedderKind::Clip
    }

    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, EmbeddingError> {
        super::embed_in_batches(&self.name, texts, self.batch_size, |batch| {
            self.encode_batch(batch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_uses_configured_name() {
        let config = EmbeddingConfig::default();
        let path = ClipTextEncoder::model_path(&config, Path::new("/models"));
        assert_eq!(path, PathBuf::from("/models/clip-vit-base-patch32"));
        assert!(!ClipTextEncoder::model_exists(&config, Path::new("/models")));
    }
}
