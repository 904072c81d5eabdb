use rand::{distributions::Uniform, prelude::*, rngs::SmallRng};

/// Seeds a `SmallRng` from four words, so the same spec always produces the same dungeon.
pub fn small_rng(seed: [u32; 4]) -> SmallRng {
    let mut bytes = <SmallRng as SeedableRng>::Seed::default();
    let words = seed.iter().cycle().flat_map(|w| w.to_le_bytes().to_vec());
    for (b, w) in bytes.as_mut().iter_mut().zip(words) {
        *b = w;
    }

    SmallRng::from_seed(bytes)
}

/// Uniform sample from `[min, max]`. Returns `min` when the range is empty.
pub fn sample_inclusive<R: Rng>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }

    rng.sample(Uniform::new_inclusive(min, max))
}

/// Uniform sample from `[min, max)`. Returns `min` when the range is empty.
pub fn sample_exclusive<R: Rng>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }

    rng.sample(Uniform::new(min, max))
}
