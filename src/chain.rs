use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Capacity exponent paired with a word width: `r = (w - 1) / 2 + 1`.
///
/// With `w = 2r` (the width chosen on growth) this gives back `r`.
#[inline]
pub fn exponent_for_width(w: u32) -> u32 {
    (w.max(1) - 1) / 2 + 1
}

/// Base hash consumed by the multiplicative probe.
///
/// Must be a pure function of `(key, w, multiplier, seed)` and return a value in
/// `[0, 2^r)` where `r = exponent_for_width(w)`.
pub trait ChainHash {
    fn chain(&self, key: u64, w: u32, multiplier: u64, seed: Option<u64>) -> u64;
}

/// Multiply-shift: keep the low `w` bits of `A * k`, then take their top `r` bits.
///
/// h(k) = ((A * k) mod 2^w) >> (w - r)
#[derive(Clone, Copy, Debug, Default)]
pub struct ShiftChain;

impl ChainHash for ShiftChain {
    #[inline]
    fn chain(&self, key: u64, w: u32, multiplier: u64, _seed: Option<u64>) -> u64 {
        let r = exponent_for_width(w);
        let mask = (1u128 << w) - 1;
        let low = (multiplier as u128 * key as u128) & mask;
        (low >> (w - r)) as u64
    }
}

/// Seeded XXH3 over the key bytes, folded into `[0, 2^r)`.
///
/// The multiplier is mixed into the seed, so a fresh multiplier on growth also
/// reshuffles keys.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Chain;

impl ChainHash for Xxh3Chain {
    #[inline]
    fn chain(&self, key: u64, w: u32, multiplier: u64, seed: Option<u64>) -> u64 {
        let r = exponent_for_width(w);
        let s = seed.unwrap_or(0) ^ multiplier.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        xxh3_64_with_seed(&key.to_le_bytes(), s) & ((1u64 << r) - 1)
    }
}
