//! Uniform random selection over a pool

use rand::{Rng, RngCore};

use crate::error::{DrawError, DrawResult};

/// Source of uniform indices.
///
/// Every `rand` generator qualifies; tests can plug in scripted sources.
pub trait RandomSource {
    /// Uniform integer in `[0, n)`. `n` is always positive.
    fn uniform_index(&mut self, n: usize) -> usize;
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn uniform_index(&mut self, n: usize) -> usize {
        self.random_range(0..n)
    }
}

/// Pick an index into a pool of `len` elements with probability `1/len` each
pub fn pick_index<R: RandomSource + ?Sized>(len: usize, rng: &mut R) -> DrawResult<usize> {
    if len == 0 {
        return Err(DrawError::EmptyPoolSelection);
    }
    let index = rng.uniform_index(len);
    // Guard against sources that ignore the bound
    Ok(index.min(len - 1))
}

/// Pick one element of `pool` uniformly
pub fn pick<'a, T, R: RandomSource + ?Sized>(pool: &'a [T], rng: &mut R) -> DrawResult<&'a T> {
    let index = pick_index(pool.len(), rng)?;
    Ok(&pool[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_pick_empty_pool_fails() {
        let mut rng = StdRng::seed_from_u64(1);
        let pool: [i64; 0] = [];
        assert!(matches!(
            pick(&pool, &mut rng),
            Err(DrawError::EmptyPoolSelection)
        ));
    }

    #[test]
    fn test_pick_single_element() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = [42i64];
        for _ in 0..10 {
            assert_eq!(*pick(&pool, &mut rng).unwrap(), 42);
        }
    }

    #[test]
    fn test_pick_covers_whole_pool() {
        let mut rng = StdRng::seed_from_u64(2024);
        let pool = [1i64, 2, 3, 4];
        let mut seen = [0u32; 4];

        for _ in 0..4000 {
            let value = *pick(&pool, &mut rng).unwrap();
            seen[(value - 1) as usize] += 1;
        }

        // Roughly uniform: each bucket near 1000
        for count in seen {
            assert!((800..1200).contains(&count), "bucket count {count}");
        }
    }

    #[test]
    fn test_out_of_bound_source_is_clamped() {
        struct Stubborn;
        impl RandomSource for Stubborn {
            fn uniform_index(&mut self, _n: usize) -> usize {
                usize::MAX
            }
        }

        assert_eq!(pick_index(3, &mut Stubborn).unwrap(), 2);
    }
}
