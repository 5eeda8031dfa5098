use crate::chain::{ChainHash, ShiftChain};
use crate::probe::{MAX_EXPONENT, MultiplicativeProbe, ProbeStrategy, UniversalProbe, initial_exponent};
use crate::util::power2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

/// Default load factor above which a resize-aware insert doubles the table.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

/// Table over the multiplicative chain hash.
pub type MultiplicativeTable = HashTable<MultiplicativeProbe<ShiftChain>>;

/// Table over modular universal hashing.
pub type UniversalTable = HashTable<UniversalProbe>;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("word width {width} is outside 1..=62")]
    InvalidWordWidth { width: u32 },
    #[error("no integer lies strictly between {min} and {max}")]
    EmptyRange { min: i64, max: i64 },
    #[error("cannot grow the table to 2^{exponent} slots")]
    CapacityExhausted { exponent: u32 },
    #[error("maximum load factor {max} is outside (0, 1]")]
    InvalidLoadFactor { max: f64 },
}

/// How `(size + 1) / m` is compared against the maximum load factor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadFactorPolicy {
    /// Floating-point ratio. Grows as soon as the ratio passes the threshold.
    #[default]
    Fractional,
    /// Integer (truncating) division. The ratio stays 0 until `size + 1 >= m`,
    /// so the table only grows once it is about to fill.
    Truncating,
}

impl LoadFactorPolicy {
    #[inline]
    pub fn exceeds(self, occupied: usize, capacity: usize, max_load: f64) -> bool {
        let ratio = match self {
            LoadFactorPolicy::Fractional => occupied as f64 / capacity as f64,
            LoadFactorPolicy::Truncating => (occupied / capacity) as f64,
        };
        ratio > max_load
    }
}

/// When an unsuccessful search gives up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchTermination {
    /// Walk all `m` attempts. Never misses a stored key.
    #[default]
    Exhaustive,
    /// Stop at the first empty slot, as classic linear probing does.
    ///
    /// Removal leaves no tombstone, so a key stored past a slot that was later
    /// emptied becomes unreachable in this mode.
    StopAtEmpty,
}

/// Table parameters.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Word width `w`. The starting capacity is `2^r` with `r = (w - 1) / 2 + 1`.
    pub word_width: u32,
    /// Fixed seed for reproducible parameters; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Fixed multiplier for the multiplicative probe; `None` draws one.
    pub multiplier: Option<u64>,
    pub max_load_factor: f64,
    pub load_policy: LoadFactorPolicy,
    pub search_termination: SearchTermination,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            word_width: 10,
            seed: None,
            multiplier: None,
            max_load_factor: MAX_LOAD_FACTOR,
            load_policy: LoadFactorPolicy::Fractional,
            search_termination: SearchTermination::Exhaustive,
        }
    }
}

impl TableConfig {
    pub fn with_word_width(mut self, w: u32) -> Self {
        self.word_width = w;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Non-negative seeds are fixed, negative ones request entropy.
    pub fn with_signed_seed(mut self, seed: i64) -> Self {
        self.seed = u64::try_from(seed).ok();
        self
    }

    pub fn with_multiplier(mut self, a: u64) -> Self {
        self.multiplier = Some(a);
        self
    }

    pub fn with_max_load_factor(mut self, max: f64) -> Self {
        self.max_load_factor = max;
        self
    }

    pub fn with_load_policy(mut self, policy: LoadFactorPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    pub fn with_search_termination(mut self, t: SearchTermination) -> Self {
        self.search_termination = t;
        self
    }

    fn validate(&self) -> Result<(), TableError> {
        let max = self.max_load_factor;
        // NaN fails both comparisons
        if !(max > 0.0 && max <= 1.0) {
            return Err(TableError::InvalidLoadFactor { max });
        }
        Ok(())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Slot {
    #[default]
    Empty,
    Occupied(u64),
}

impl Slot {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub fn key(&self) -> Option<u64> {
        match *self {
            Slot::Occupied(k) => Some(k),
            Slot::Empty => None,
        }
    }
}

/// Result of a lookup: where the key sits (if anywhere) and how many
/// probe attempts preceded the answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub slot: Option<usize>,
    pub collisions: usize,
}

impl SearchOutcome {
    #[inline]
    pub fn is_found(&self) -> bool {
        self.slot.is_some()
    }
}

/// Open-addressing table of integer keys over a pluggable probe strategy.
///
/// Capacity is always `2^r`. Duplicate keys are not detected; each insert takes
/// a slot of its own.
#[derive(Debug)]
pub struct HashTable<S> {
    slots: Vec<Slot>,
    size: usize,
    exponent: u32,
    config: TableConfig,
    strategy: S,
    rng: StdRng,
}

impl<S: ProbeStrategy> HashTable<S> {
    /// Empty table with strategy parameters drawn from the configured seed.
    pub fn new(config: TableConfig) -> Result<Self, TableError> {
        let rng = config.rng();
        Self::with_rng(config, rng)
    }

    /// Like [`HashTable::new`], drawing from an injected generator.
    pub fn with_rng(config: TableConfig, mut rng: StdRng) -> Result<Self, TableError> {
        config.validate()?;
        let exponent = initial_exponent(&config)?;
        let strategy = S::init(&config, exponent, &mut rng)?;
        Ok(Self::assemble(config, exponent, strategy, rng))
    }

    /// Empty table around a ready-made strategy. Growth still draws from the
    /// configured seed.
    pub fn with_strategy(config: TableConfig, strategy: S) -> Result<Self, TableError> {
        config.validate()?;
        let exponent = initial_exponent(&config)?;
        let rng = config.rng();
        Ok(Self::assemble(config, exponent, strategy, rng))
    }

    fn assemble(config: TableConfig, exponent: u32, strategy: S, rng: StdRng) -> Self {
        Self {
            slots: vec![Slot::Empty; power2(exponent) as usize],
            size: 0,
            exponent,
            config,
            strategy,
            rng,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of slots, `m = 2^r`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Capacity exponent `r`.
    #[inline]
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.capacity() as f64
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Stored keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.slots.iter().filter_map(Slot::key)
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Slot visited by attempt `i` for `key` under the current parameters.
    #[inline]
    pub fn probe(&self, key: u64, i: usize) -> usize {
        self.strategy.probe(key, i, self.exponent)
    }

    /// Place `key` in the first empty slot of its probe sequence.
    ///
    /// Returns the number of occupied slots passed over. If every slot is taken
    /// nothing is stored and the capacity `m` comes back instead.
    pub fn insert(&mut self, key: u64) -> usize {
        let m = self.capacity();
        for i in 0..m {
            let idx = self.probe(key, i);
            if self.slots[idx].is_empty() {
                self.slots[idx] = Slot::Occupied(key);
                self.size += 1;
                return i;
            }
        }
        log::debug!("table full: key {key} not stored in {m} slots");
        m
    }

    /// Insert in order without growing; total collisions.
    pub fn insert_all<I: IntoIterator<Item = u64>>(&mut self, keys: I) -> usize {
        keys.into_iter().map(|k| self.insert(k)).sum()
    }

    /// Walk the probe sequence of `key` until it turns up or attempt `m - 1` is spent.
    pub fn search(&self, key: u64) -> SearchOutcome {
        let last = self.capacity() - 1;
        let stop_at_empty = self.config.search_termination == SearchTermination::StopAtEmpty;
        let mut i = 0;
        loop {
            let idx = self.probe(key, i);
            match self.slots[idx] {
                Slot::Occupied(k) if k == key => {
                    return SearchOutcome { slot: Some(idx), collisions: i };
                }
                Slot::Empty if stop_at_empty => break,
                _ => {}
            }
            if i == last {
                break;
            }
            i += 1;
        }
        SearchOutcome { slot: None, collisions: i }
    }

    /// Clear the slot holding `key`, leaving no tombstone.
    ///
    /// Returns the collisions spent locating it, or those of the failed search
    /// when the key is absent.
    pub fn remove(&mut self, key: u64) -> usize {
        let found = self.search(key);
        if let Some(idx) = found.slot {
            self.slots[idx] = Slot::Empty;
            self.size -= 1;
        }
        found.collisions
    }

    /// Insert after doubling the table if `(size + 1) / m` would pass the load limit.
    ///
    /// The count covers the new key only, not the rehash of existing keys.
    pub fn insert_resize(&mut self, key: u64) -> Result<usize, TableError> {
        let cfg = &self.config;
        if cfg
            .load_policy
            .exceeds(self.size + 1, self.capacity(), cfg.max_load_factor)
        {
            self.grow()?;
        }
        Ok(self.insert(key))
    }

    /// Resize-aware insert in order; total collisions.
    pub fn insert_all_resize<I: IntoIterator<Item = u64>>(&mut self, keys: I) -> Result<usize, TableError> {
        let mut total = 0;
        for key in keys {
            total += self.insert_resize(key)?;
        }
        Ok(total)
    }

    /// Double the capacity, take new strategy parameters and rehash every key.
    ///
    /// On error the table is untouched.
    pub fn grow(&mut self) -> Result<(), TableError> {
        let exponent = self.exponent + 1;
        if exponent > MAX_EXPONENT {
            return Err(TableError::CapacityExhausted { exponent });
        }
        let strategy = self.strategy.regrow(exponent, &mut self.rng)?;
        log::debug!(
            "growing table: {} -> {} slots, {} keys to rehash",
            self.capacity(),
            power2(exponent),
            self.size
        );

        self.strategy = strategy;
        self.exponent = exponent;
        let old = std::mem::replace(&mut self.slots, vec![Slot::Empty; power2(exponent) as usize]);
        self.size = 0;
        for key in old.iter().filter_map(Slot::key) {
            self.insert(key);
        }
        Ok(())
    }

    /// Search, and if an earlier slot of the key's probe sequence has since
    /// emptied, remove and reinsert the key so it lands closer to its start.
    /// At most one relocation per call.
    ///
    /// `collisions` is the cost of the lookup that found the key; `slot` is
    /// where the key sits afterwards.
    pub fn search_optimized(&mut self, key: u64) -> Result<SearchOutcome, TableError> {
        let found = self.search(key);
        if !found.is_found() {
            return Ok(found);
        }
        let hole = (0..found.collisions).any(|j| self.slots[self.probe(key, j)].is_empty());
        if !hole {
            return Ok(found);
        }

        self.remove(key);
        let i = match self.insert_resize(key) {
            Ok(i) => i,
            Err(e) => {
                // the freed slot is still there, so this cannot come back full
                self.insert(key);
                return Err(e);
            }
        };
        let slot = (i < self.capacity()).then(|| self.probe(key, i));
        log::trace!("relocated key {key}: {:?} -> {:?}", found.slot, slot);
        Ok(SearchOutcome {
            slot,
            collisions: found.collisions,
        })
    }
}

impl<C: ChainHash> HashTable<MultiplicativeProbe<C>> {
    /// Current word width `w` of the multiplicative probe.
    pub fn word_width(&self) -> u32 {
        self.strategy.word_width()
    }
}
