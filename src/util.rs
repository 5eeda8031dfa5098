use crate::table::TableError;
use rand::Rng;

/// `2^exp` as a `u64`. `exp` must be below 64.
#[inline]
pub fn power2(exp: u32) -> u64 {
    1u64 << exp
}

/// Uniform integer strictly between `min` and `max`, i.e. in `[min + 1, max - 1]`.
///
/// Both bounds are exclusive. An empty open interval is an error rather than a panic.
pub fn random_in_range<R: Rng>(min: i64, max: i64, rng: &mut R) -> Result<i64, TableError> {
    if max.saturating_sub(min) <= 1 {
        return Err(TableError::EmptyRange { min, max });
    }
    Ok(rng.gen_range(min + 1..max))
}

/// Trial division by every `i` with `i * i <= n`.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    let mut i = 2u64;
    while i.saturating_mul(i) <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Smallest prime strictly greater than `n`.
pub fn next_prime(n: u64) -> u64 {
    let mut candidate = n + 1;
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

/// `n` keys of the form `k + i * 2^w`.
///
/// Under the multiplicative chain hash, `A * key mod 2^w` is identical for all of
/// them, so they share a base slot and pile up in one probe run.
///
/// # Panics
/// If `w >= 64`.
pub fn colliding_keys(k: u64, n: usize, w: u32) -> Vec<u64> {
    assert!(w < 64, "word width must be below 64");
    let step = power2(w);
    (0..n as u64)
        .map(|i| k.wrapping_add(i.wrapping_mul(step)))
        .collect()
}
