//! Shared ONNX Runtime session and tokenizer plumbing for the dense encoders.

use std::path::Path;

use ort::session::Session;
use tokenizers::{Tokenizer, TruncationParams};

use crate::error::EmbeddingError;

/// Load an ONNX model into a session.
pub(crate) fn load_session(model: &str, path: &Path) -> Result<Session, EmbeddingError> {
    if !path.exists() {
        return Err(EmbeddingError::ModelLoad {
            model: model.to_string(),
            path: path.to_path_buf(),
            message: "Model not found. Run `embedprobe models download` first.".to_string(),
        });
    }

    let session = Session::builder()
        .map_err(|e| EmbeddingError::ModelLoad {
            model: model.to_string(),
            path: path.to_path_buf(),
            message: format!("Failed to create ONNX session builder: {e}"),
        })?
        .commit_from_file(path)
        .map_err(|e| EmbeddingError::ModelLoad {
            model: model.to_string(),
            path: path.to_path_buf(),
            message: format!("Failed to load ONNX model: {e}"),
        })?;

    tracing::debug!(
        "Loaded {model} from {:?} (inputs: {:?}, outputs: {:?})",
        path,
        input_names(&session),
        session
            .outputs()
            .iter()
            .map(|o| o.name())
            .collect::<Vec<_>>()
    );

    Ok(session)
}

/// Names of the model's declared inputs.
pub(crate) fn input_names(session: &Session) -> Vec<String> {
    session
        .inputs()
        .iter()
        .map(|i| i.name().to_string())
        .collect()
}

/// A tokenizer that truncates to the model's limit, plus its padding id.
pub(crate) struct TextTokenizer {
    tokenizer: Tokenizer,
    pad_id: u32,
}

impl TextTokenizer {
    /// Load `tokenizer.json`, truncating encodings to `max_length` tokens.
    ///
    /// Padding is done by [`TokenBatch`] so batches pad to their own longest
    /// sequence; the file's padding id is kept for that.
    pub(crate) fn load(model: &str, path: &Path, max_length: usize) -> Result<Self, EmbeddingError> {
        let load_err = |message: String| EmbeddingError::ModelLoad {
            model: model.to_string(),
            path: path.to_path_buf(),
            message,
        };

        if !path.exists() {
            return Err(load_err(
                "Tokenizer not found. Run `embedprobe models download` first.".to_string(),
            ));
        }

        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| load_err(format!("Failed to load tokenizer: {e}")))?;
        let pad_id = tokenizer.get_padding().map(|p| p.pad_id).unwrap_or(0);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| load_err(format!("Failed to configure truncation: {e}")))?;
        tokenizer.with_padding(None);

        Ok(Self { tokenizer, pad_id })
    }

    /// Tokenize a batch, padded to its longest sequence.
    pub(crate) fn encode_batch(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<TokenBatch, EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Inference {
                model: model.to_string(),
                message: format!("Tokenization failed: {e}"),
            })?;

        let batch_size = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut input_ids = vec![self.pad_id as i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, ((&id, &mask), &type_id)) in encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids())
                .enumerate()
            {
                input_ids[offset + j] = id as i64;
                attention_mask[offset + j] = mask as i64;
                token_type_ids[offset + j] = type_id as i64;
            }
        }

        Ok(TokenBatch {
            batch_size,
            seq_len,
            input_ids,
            attention_mask,
            token_type_ids,
        })
    }
}

/// Row-major `[batch_size, seq_len]` token tensors.
#[derive(Debug, Clone)]
pub(crate) struct TokenBatch {
    pub batch_size: usize,
    pub seq_len: usize,
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl TokenBatch {
    /// Tensor shape for ort.
    pub fn shape(&self) -> Vec<i64> {
        vec![self.batch_size as i64, self.seq_len as i64]
    }
}

/// Attention-masked mean over the token axis of a `[batch, seq, hidden]` tensor.
pub(crate) fn masked_mean_pool(
    hidden: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch_size)
        .map(|b| {
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;
            for t in 0..seq_len {
                if attention_mask[b * seq_len + t] == 0 {
                    continue;
                }
                count += 1.0;
                let start = (b * seq_len + t) * hidden_dim;
                for (p, &h) in pooled.iter_mut().zip(&hidden[start..start + hidden_dim]) {
                    *p += h;
                }
            }
            // Clamped so an all-masked row stays zero instead of NaN.
            let denom = count.max(1e-9);
            for p in &mut pooled {
                *p /= denom;
            }
            pooled
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_mean_pool_ignores_padding() {
        // batch 2, seq 3, hidden 2
        let hidden = vec![
            1.0, 2.0, 3.0, 4.0, 100.0, 100.0, // row 0: last token is padding
            5.0, 5.0, 7.0, 9.0, 9.0, 13.0, // row 1: all real tokens
        ];
        let mask = vec![1, 1, 0, 1, 1, 1];
        let pooled = masked_mean_pool(&hidden, &mask, 2, 3, 2);
        assert_eq!(pooled[0], vec![2.0, 3.0]);
        assert_eq!(pooled[1], vec![7.0, 9.0]);
    }

    #[test]
    fn test_masked_mean_pool_all_masked_is_zero() {
        let pooled = masked_mean_pool(&[1.0, 1.0], &[0], 1, 1, 2);
        assert_eq!(pooled[0], vec![0.0, 0.0]);
    }

    #[test]
    fn test_missing_model_file() {
        let err = load_session("all-MiniLM-L6-v2", Path::new("/nonexistent/model.onnx"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("embedprobe models download"));
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let err = TextTokenizer::load("clip", Path::new("/nonexistent/tokenizer.json"), 77)
            .err()
            .unwrap();
        assert!(matches!(err, EmbeddingError::ModelLoad { .. }));
    }
}
