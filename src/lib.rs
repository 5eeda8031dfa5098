//! probe_table — open-addressing hash tables for comparing probe strategies.
//!
//! - Integer keys, capacity always `2^r`, linear probing from a per-key base slot.
//! - Two bases: multiplicative chain hashing and modular universal hashing.
//! - Every operation reports its collision count; a resize-aware insert doubles
//!   the table once the load factor would pass 0.75.
//! - Removal leaves no tombstone (see [`SearchTermination`]).

mod chain;
mod probe;
mod table;
mod util;

pub use chain::{ChainHash, ShiftChain, Xxh3Chain, exponent_for_width};
pub use probe::{MAX_EXPONENT, MAX_WORD_WIDTH, MultiplicativeProbe, ProbeStrategy, UniversalProbe};
pub use table::{
    HashTable, LoadFactorPolicy, MAX_LOAD_FACTOR, MultiplicativeTable, SearchOutcome, SearchTermination, Slot,
    TableConfig, TableError, UniversalTable,
};
pub use util::{colliding_keys, is_prime, next_prime, power2, random_in_range};
