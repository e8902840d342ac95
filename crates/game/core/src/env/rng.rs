//! RNG oracle for deterministic random number generation.
//!
//! Dice rolls and pile shuffles draw from this oracle with seeds derived from
//! the game seed and the id of the record being applied. The outcome is then
//! captured on the record, so replaying a log never consults the oracle.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// - **Deterministic**: Same seed always produces same output
/// - **Fast**: Single multiply + xorshift + rotate
///
/// Reference: <https://www.pcg-random.org/>
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Compute a deterministic seed for one random event.
///
/// * `game_seed` - base seed fixed in the lobby
/// * `record` - id of the record capturing the outcome
/// * `subject` - team or battle group the roll belongs to
/// * `context` - index of the roll within the record (die number, pile slot)
pub fn compute_seed(game_seed: u64, record: u64, subject: u32, context: u32) -> u64 {
    // SplitMix64 / FxHash style combiners
    let mut hash = game_seed;
    hash ^= record.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (subject as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

/// Fisher-Yates shuffle driven by the oracle.
pub fn shuffle<R, T>(rng: &R, game_seed: u64, record: u64, subject: u32, items: &mut [T])
where
    R: RngOracle + ?Sized,
{
    for i in (1..items.len()).rev() {
        let seed = compute_seed(game_seed, record, subject, i as u32);
        let j = rng.range(seed, 0, i as u32) as usize;
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_deterministic_permutation() {
        let rng = PcgRng;
        let mut a: Vec<u32> = (0..20).collect();
        let mut b = a.clone();
        shuffle(&rng, 42, 7, 1, &mut a);
        shuffle(&rng, 42, 7, 1, &mut b);
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn dice_stay_in_range() {
        let rng = PcgRng;
        for i in 0..200 {
            let face = rng.roll_die(compute_seed(1, i, 2, 3), 6);
            assert!((1..=6).contains(&face));
        }
    }
}
