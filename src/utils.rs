//! Utility functions and traits.

use rand::prelude::*;

/// Element type every kernel in the suite computes on.
pub type Real = f64;

/// Utility trait that generalizes the floating-point element type of the
/// suite's buffers and provides a generic way of generating deterministic
/// pseudo-random data for them.
pub trait SuiteFloat: num::Float + Send + Sync {
    /// Produces a vector of length `n` filled with values in the range
    /// [0.0, 100.0), deterministic for a given `seed`.
    fn rand_vector(n: usize, seed: u64) -> Vec<Self>;
}

impl SuiteFloat for f32 {
    fn rand_vector(n: usize, seed: u64) -> Vec<Self> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let between = rand::distributions::Uniform::new(0.0_f32, 100.0_f32);
        (0..n).map(|_| between.sample(&mut rng)).collect()
    }
}

impl SuiteFloat for f64 {
    fn rand_vector(n: usize, seed: u64) -> Vec<Self> {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let between = rand::distributions::Uniform::new(0.0_f64, 100.0_f64);
        (0..n).map(|_| between.sample(&mut rng)).collect()
    }
}

/// Deterministic position-weighted reduction of a buffer, used to detect
/// numerical divergence between kernel variants.
pub fn calc_checksum<T: SuiteFloat>(data: &[T]) -> T {
    let len = T::from(data.len().max(1)).expect("buffer length not representable");
    data.iter().enumerate().fold(T::zero(), |acc, (i, x)| {
        let weight = T::from(i + 1).expect("buffer index not representable") / len;
        acc + *x * weight
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rand_vector_is_deterministic_per_seed() {
        let a = f64::rand_vector(128, 42);
        let b = f64::rand_vector(128, 42);
        let c = f64::rand_vector(128, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|x| (0.0..100.0).contains(x)));
    }

    #[test]
    fn checksum_weights_by_position() {
        // 1 * (1/2) + 2 * (2/2)
        assert_eq!(calc_checksum(&[1.0_f64, 2.0]), 2.5);
        // Same values in a different order must not collide.
        assert_ne!(calc_checksum(&[2.0_f64, 1.0]), calc_checksum(&[1.0_f64, 2.0]));
    }

    #[test]
    fn checksum_of_empty_buffer_is_zero() {
        assert_eq!(calc_checksum::<f64>(&[]), 0.0);
    }
}
