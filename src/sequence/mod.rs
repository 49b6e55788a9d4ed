//! Sequence generation
//!
//! Produces the values the chart displays: independent uniform samples in [0, 1).

use rand::Rng;

/// Generate `count` uniform random values in [0, 1)
pub fn generate<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.gen::<f64>()).collect()
}

/// True when every value is no greater than its right neighbour
pub fn is_sorted(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_count_and_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let values = generate(&mut rng, 50);
        assert_eq!(values.len(), 50);
        assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn test_generate_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&mut rng, 0).is_empty());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = generate(&mut StdRng::seed_from_u64(42), 10);
        let b = generate(&mut StdRng::seed_from_u64(42), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_sorted() {
        assert!(is_sorted(&[]));
        assert!(is_sorted(&[0.5]));
        assert!(is_sorted(&[0.1, 0.1, 0.2]));
        assert!(!is_sorted(&[0.3, 0.1, 0.2]));
    }
}
