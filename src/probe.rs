//! Probe strategies: where attempt `i` for a key lands in a table of `2^r` slots.
//!
//! Both strategies compute one base value per key and walk linearly from it, so
//! attempts `0..2^r` visit every slot exactly once whatever the base is.

use crate::chain::{ChainHash, ShiftChain, exponent_for_width};
use crate::table::{TableConfig, TableError};
use crate::util::{next_prime, power2, random_in_range};
use rand::Rng;

/// Highest capacity exponent a table may grow to. The multiplicative probe
/// pairs exponent `r` with word width `2r`, which must stay within 62 bits.
pub const MAX_EXPONENT: u32 = 31;

/// Widest supported word width.
pub const MAX_WORD_WIDTH: u32 = 62;

/// Maps `(key, attempt)` to a slot for the table's current capacity exponent.
///
/// Parameters are fixed for the lifetime of one capacity. On growth the table
/// asks for a brand new strategy via [`ProbeStrategy::regrow`] and drops the old one.
pub trait ProbeStrategy: Sized {
    /// Fresh parameters for a table with the given starting exponent.
    fn init<R: Rng>(config: &TableConfig, exponent: u32, rng: &mut R) -> Result<Self, TableError>;

    /// Parameters for the table after it grows to `exponent`.
    fn regrow<R: Rng>(&self, exponent: u32, rng: &mut R) -> Result<Self, TableError>;

    /// Where the probe sequence for `key` starts. Need not be reduced.
    fn base(&self, key: u64, exponent: u32) -> u64;

    /// `(base(key) + attempt) mod 2^exponent`
    #[inline]
    fn probe(&self, key: u64, attempt: usize, exponent: u32) -> usize {
        let m = power2(exponent);
        ((self.base(key, exponent) % m + attempt as u64 % m) % m) as usize
    }
}

/// Linear probing on top of a multiplicative chain hash.
#[derive(Clone, Debug)]
pub struct MultiplicativeProbe<C = ShiftChain> {
    chain: C,
    word_width: u32,
    multiplier: u64,
    seed: Option<u64>,
}

impl<C: ChainHash> MultiplicativeProbe<C> {
    /// Fixed parameters, no random draw.
    pub fn with_parts(chain: C, word_width: u32, multiplier: u64, seed: Option<u64>) -> Self {
        Self {
            chain,
            word_width,
            multiplier,
            seed,
        }
    }

    pub fn word_width(&self) -> u32 {
        self.word_width
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    /// Multiplier drawn from `(2^(w-1), 2^w)`, both ends exclusive.
    fn draw_multiplier<R: Rng>(w: u32, rng: &mut R) -> Result<u64, TableError> {
        let lo = power2(w - 1) as i64;
        let hi = power2(w) as i64;
        Ok(random_in_range(lo, hi, rng)? as u64)
    }
}

impl<C: ChainHash + Clone + Default> ProbeStrategy for MultiplicativeProbe<C> {
    fn init<R: Rng>(config: &TableConfig, _exponent: u32, rng: &mut R) -> Result<Self, TableError> {
        let w = config.word_width;
        if w == 0 || w > MAX_WORD_WIDTH {
            return Err(TableError::InvalidWordWidth { width: w });
        }
        let multiplier = match config.multiplier {
            Some(a) => a,
            None => Self::draw_multiplier(w, rng)?,
        };
        Ok(Self::with_parts(C::default(), w, multiplier, config.seed))
    }

    fn regrow<R: Rng>(&self, exponent: u32, rng: &mut R) -> Result<Self, TableError> {
        // width follows the exponent on growth: w = 2r
        let w = 2 * exponent;
        if w > MAX_WORD_WIDTH {
            return Err(TableError::CapacityExhausted { exponent });
        }
        let multiplier = Self::draw_multiplier(w, rng)?;
        Ok(Self::with_parts(self.chain.clone(), w, multiplier, self.seed))
    }

    #[inline]
    fn base(&self, key: u64, _exponent: u32) -> u64 {
        self.chain
            .chain(key, self.word_width, self.multiplier, self.seed)
    }
}

/// Linear probing on top of `((a * k + b) mod p) mod m`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniversalProbe {
    p: u64,
    a: u64,
    b: u64,
}

impl UniversalProbe {
    /// Fixed prime and coefficients, bypassing the random draw.
    ///
    /// # Panics
    /// If `p < 2`.
    pub fn with_parts(p: u64, a: u64, b: u64) -> Self {
        assert!(p > 1, "modulus must be at least 2");
        Self { p, a, b }
    }

    /// Smallest prime above `2^exponent`, then `a` from `(0, p)` and `b` from `(-1, p)`.
    pub fn draw<R: Rng>(exponent: u32, rng: &mut R) -> Result<Self, TableError> {
        if exponent > MAX_EXPONENT {
            return Err(TableError::CapacityExhausted { exponent });
        }
        let p = next_prime(power2(exponent));
        let a = random_in_range(0, p as i64, rng)? as u64;
        let b = random_in_range(-1, p as i64, rng)? as u64;
        Ok(Self { p, a, b })
    }

    pub fn prime(&self) -> u64 {
        self.p
    }

    pub fn coefficients(&self) -> (u64, u64) {
        (self.a, self.b)
    }
}

impl ProbeStrategy for UniversalProbe {
    fn init<R: Rng>(_config: &TableConfig, exponent: u32, rng: &mut R) -> Result<Self, TableError> {
        Self::draw(exponent, rng)
    }

    fn regrow<R: Rng>(&self, exponent: u32, rng: &mut R) -> Result<Self, TableError> {
        Self::draw(exponent, rng)
    }

    #[inline]
    fn base(&self, key: u64, exponent: u32) -> u64 {
        let h = (self.a as u128 * key as u128 + self.b as u128) % self.p as u128;
        (h % power2(exponent) as u128) as u64
    }
}

/// Starting exponent for a configured word width.
pub(crate) fn initial_exponent(config: &TableConfig) -> Result<u32, TableError> {
    let w = config.word_width;
    if w == 0 || w > MAX_WORD_WIDTH {
        return Err(TableError::InvalidWordWidth { width: w });
    }
    Ok(exponent_for_width(w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Xxh3Chain;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_permutation<S: ProbeStrategy>(s: &S, key: u64, exponent: u32) {
        let m = power2(exponent) as usize;
        let mut seen = vec![false; m];
        for i in 0..m {
            let slot = s.probe(key, i, exponent);
            assert!(slot < m);
            assert!(!seen[slot], "slot {slot} visited twice for key {key}");
            seen[slot] = true;
        }
    }

    #[test]
    fn linear_walk_wraps_around() {
        let s = UniversalProbe::with_parts(5, 3, 2);
        // key 0: ((0 + 2) mod 5) mod 4 = 2
        let seq: Vec<usize> = (0..4).map(|i| s.probe(0, i, 2)).collect();
        assert_eq!(seq, vec![2, 3, 0, 1]);
    }

    #[test]
    #[should_panic(expected = "modulus must be at least 2")]
    fn zero_modulus_is_refused() {
        UniversalProbe::with_parts(0, 3, 2);
    }

    #[test]
    fn universal_base_values() {
        let s = UniversalProbe::with_parts(5, 3, 2);
        let bases: Vec<u64> = [0, 1, 2, 5].iter().map(|&k| s.base(k, 2)).collect();
        assert_eq!(bases, vec![2, 0, 3, 2]);
    }

    #[test]
    fn every_probe_sequence_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(21);
        let cfg = TableConfig::default().with_word_width(8);
        let exponent = initial_exponent(&cfg).unwrap();
        let mult = MultiplicativeProbe::<ShiftChain>::init(&cfg, exponent, &mut rng).unwrap();
        let xxh = MultiplicativeProbe::<Xxh3Chain>::init(&cfg, exponent, &mut rng).unwrap();
        let uni = UniversalProbe::init(&cfg, exponent, &mut rng).unwrap();
        for key in [0u64, 1, 17, 255, 1 << 40, u64::MAX] {
            assert_permutation(&mult, key, exponent);
            assert_permutation(&xxh, key, exponent);
            assert_permutation(&uni, key, exponent);
        }
    }

    #[test]
    fn multiplier_drawn_from_open_interval() {
        let cfg = TableConfig::default().with_word_width(6);
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let s = MultiplicativeProbe::<ShiftChain>::init(&cfg, 3, &mut rng).unwrap();
            assert!(s.multiplier() > 32 && s.multiplier() < 64);
        }
    }

    #[test]
    fn fixed_multiplier_is_kept() {
        let cfg = TableConfig::default().with_word_width(6).with_multiplier(45);
        let mut rng = StdRng::seed_from_u64(0);
        let s = MultiplicativeProbe::<ShiftChain>::init(&cfg, 3, &mut rng).unwrap();
        assert_eq!(s.multiplier(), 45);
    }

    #[test]
    fn multiplicative_regrow_doubles_width() {
        let cfg = TableConfig::default().with_word_width(10);
        let mut rng = StdRng::seed_from_u64(4);
        let s = MultiplicativeProbe::<ShiftChain>::init(&cfg, 5, &mut rng).unwrap();
        let grown = s.regrow(6, &mut rng).unwrap();
        assert_eq!(grown.word_width(), 12);
        assert!(grown.multiplier() > 1 << 11 && grown.multiplier() < 1 << 12);
        assert!(matches!(
            grown.regrow(MAX_EXPONENT + 1, &mut rng),
            Err(TableError::CapacityExhausted { .. })
        ));
    }

    #[test]
    fn universal_draw_picks_next_prime() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = UniversalProbe::draw(4, &mut rng).unwrap();
        assert_eq!(s.prime(), 17);
        let (a, b) = s.coefficients();
        assert!((1..17).contains(&a));
        assert!(b < 17);
        assert_eq!(s.regrow(5, &mut rng).unwrap().prime(), 37);
    }

    #[test]
    fn word_width_is_validated() {
        let mut rng = StdRng::seed_from_u64(0);
        for width in [0, MAX_WORD_WIDTH + 1] {
            let cfg = TableConfig::default().with_word_width(width);
            assert!(matches!(
                MultiplicativeProbe::<ShiftChain>::init(&cfg, 1, &mut rng),
                Err(TableError::InvalidWordWidth { .. })
            ));
            assert!(initial_exponent(&cfg).is_err());
        }
        // (1, 2) is empty, so no multiplier exists for w = 1
        let cfg = TableConfig::default().with_word_width(1);
        assert!(matches!(
            MultiplicativeProbe::<ShiftChain>::init(&cfg, 1, &mut rng),
            Err(TableError::EmptyRange { min: 1, max: 2 })
        ));
    }
}
