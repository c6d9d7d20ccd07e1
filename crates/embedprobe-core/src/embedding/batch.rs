//! Fixed-size batching for the dense encoders.

use ndarray::Array2;

use crate::error::EmbeddingError;

/// Run `encode` over `texts` in chunks of `batch_size` and stack the results.
///
/// Every chunk must return one vector per input and all vectors must share a
/// dimension. Empty input yields a 0×0 matrix without calling `encode`.
pub fn embed_in_batches<F>(
    model: &str,
    texts: &[String],
    batch_size: usize,
    mut encode: F,
) -> Result<Array2<f32>, EmbeddingError>
where
    F: FnMut(&[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>,
{
    let batch_size = batch_size.max(1);
    let mut flat: Vec<f32> = Vec::new();
    let mut dim: Option<usize> = None;

    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        tracing::debug!(
            "{model}: batch {} ({} of {} texts)",
            batch_index,
            batch_index * batch_size + batch.len(),
            texts.len()
        );

        let vectors = encode(batch)?;
        if vectors.len() != batch.len() {
            return Err(EmbeddingError::Inference {
                model: model.to_string(),
                message: format!(
                    "expected {} embeddings for batch {batch_index}, got {}",
                    batch.len(),
                    vectors.len()
                ),
            });
        }

        for v in vectors {
            let expected = *dim.get_or_insert(v.len());
            if v.len() != expected {
                return Err(EmbeddingError::Inference {
                    model: model.to_string(),
                    message: format!(
                        "embedding dimension changed from {expected} to {} in batch {batch_index}",
                        v.len()
                    ),
                });
            }
            if flat.capacity() == 0 {
                flat.reserve(texts.len() * expected);
            }
            flat.extend(v);
        }
    }

    let (rows, dim) = match dim {
        Some(d) => (texts.len(), d),
        None => (0, 0),
    };
    Array2::from_shape_vec((rows, dim), flat).map_err(|e| EmbeddingError::Inference {
        model: model.to_string(),
        message: format!("failed to assemble embedding matrix: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIM: usize = 4;

    /// Deterministic stand-in for a model: encodes the input's index number.
    fn fake_encode(batch: &[String], calls: &mut Vec<usize>) -> Vec<Vec<f32>> {
        calls.push(batch.len());
        batch
            .iter()
            .map(|t| {
                let id: f32 = t.trim_start_matches("doc-").parse().unwrap();
                vec![id; DIM]
            })
            .collect()
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc-{i}")).collect()
    }

    #[test]
    fn test_shapes_and_order_across_batch_boundaries() {
        for n in [1, 255, 256, 257] {
            let input = texts(n);
            let mut calls = Vec::new();
            let matrix =
                embed_in_batches("fake", &input, 256, |b| Ok(fake_encode(b, &mut calls))).unwrap();

            assert_eq!(matrix.dim(), (n, DIM), "n = {n}");
            for (i, row) in matrix.outer_iter().enumerate() {
                assert!(row.iter().all(|&v| v == i as f32), "row {i} out of order");
            }
            let expected_calls = n.div_ceil(256);
            assert_eq!(calls.len(), expected_calls);
            assert!(calls.iter().all(|&c| c <= 256));
        }
    }

    #[test]
    fn test_empty_input_skips_encoder() {
        let matrix = embed_in_batches("fake", &[], 256, |_| {
            panic!("encoder must not run for empty input")
        })
        .unwrap();
        assert_eq!(matrix.dim(), (0, 0));
    }

    #[test]
    fn test_short_batch_is_an_error() {
        let err = embed_in_batches("fake", &texts(3), 2, |b| Ok(vec![vec![0.0; DIM]; b.len() - 1]))
            .unwrap_err();
        assert!(err.to_string().contains("expected 2 embeddings"));
    }

    #[test]
    fn test_dimension_change_is_an_error() {
        let mut first = true;
        let err = embed_in_batches("fake", &texts(3), 2, |b| {
            let dim = if first { 4 } else { 5 };
            first = false;
            Ok(vec![vec![0.0; dim]; b.len()])
        })
        .unwrap_err();
        assert!(err.to_string().contains("dimension changed"));
    }
}
