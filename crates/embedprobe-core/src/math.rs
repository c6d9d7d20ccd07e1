//! Shared math utilities.

use ndarray::{ArrayView1, ArrayView2};

/// L2-normalize a vector in place so its magnitude is 1.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// L2-normalize a slice, returning a new vector with unit magnitude.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    l2_normalize_in_place(&mut result);
    result
}

/// Euclidean distance between two rows, accumulated in f64.
pub fn euclidean(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Column means of the given rows of `x`, in f64.
pub fn centroid(x: ArrayView2<'_, f32>, rows: &[usize]) -> Vec<f64> {
    let mut sum = vec![0.0f64; x.ncols()];
    for &r in rows {
        for (s, &v) in sum.iter_mut().zip(x.row(r).iter()) {
            *s += v as f64;
        }
    }
    if !rows.is_empty() {
        let n = rows.len() as f64;
        for s in &mut sum {
            *s /= n;
        }
    }
    sum
}

/// Euclidean distance between a row and an f64 point.
pub fn distance_to_point(row: ArrayView1<'_, f32>, point: &[f64]) -> f64 {
    row.iter()
        .zip(point)
        .map(|(&x, &c)| {
            let d = x as f64 - c;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Euclidean distance between two f64 points.
pub fn point_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_l2_normalize() {
        let v = l2_normalize(&[3.0, 4.0]);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let v = l2_normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_euclidean() {
        let x = array![[0.0f32, 0.0], [3.0, 4.0]];
        assert!((euclidean(x.row(0), x.row(1)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_and_distances() {
        let x = array![[0.0f32, 0.0], [2.0, 0.0], [10.0, 10.0]];
        let c = centroid(x.view(), &[0, 1]);
        assert_eq!(c, vec![1.0, 0.0]);
        assert!((distance_to_point(x.row(1), &c) - 1.0).abs() < 1e-12);
        assert!((point_distance(&c, &[1.0, 3.0]) - 3.0).abs() < 1e-12);
    }
}
