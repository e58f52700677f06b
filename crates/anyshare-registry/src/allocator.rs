//! Short random identifier generation.
//!
//! Ids are four characters drawn from a 32-symbol alphabet: lowercase
//! letters without `i`, `l`, `o`, `v` (easily confused with `1`, `0`, `u`
//! when read aloud or typed from a short URL) plus the ten digits. That
//! gives 32^4 = 1,048,576 ids, far more than the number of live records a
//! single instance holds, so collisions are rare and retried.
//!
//! There is no retry cap. If the id space were ever close to
//! exhausted, `allocate` would spin; at realistic occupancy the expected
//! number of attempts stays near one.

use std::sync::{Mutex, PoisonError};

use anyshare_types::ShareId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Symbols an allocated id may contain.
pub const ID_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuwxyz0123456789";

/// Length of allocated ids.
pub const ID_LEN: usize = 4;

/// Generates ids from one process-wide generator seeded once.
pub struct IdAllocator {
    rng: Mutex<StdRng>,
}

impl IdAllocator {
    /// Allocator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Allocator with a fixed seed, for reproducible tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw one candidate id without checking it against anything.
    pub fn candidate(&self) -> ShareId {
        // A panic mid-draw cannot leave the generator in a state worth
        // refusing to use.
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let id: String = (0..ID_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        ShareId::new(id).expect("alphabet is lowercase alphanumeric")
    }

    /// Draw candidates until one is not taken.
    ///
    /// Callers must hold the index lock across this call and the following
    /// insert or reservation, otherwise two callers can be handed the same
    /// id.
    pub fn allocate(&self, is_taken: impl Fn(&ShareId) -> bool) -> ShareId {
        loop {
            let id = self.candidate();
            if !is_taken(&id) {
                return id;
            }
            debug!(id = %id, "id collision, drawing again");
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdAllocator").finish_non_exhaustive()
    }
}
