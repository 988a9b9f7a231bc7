//! Seed-derived random streams, one per decision domain.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by domain so that extra
/// draws in one domain never shift the others.
#[derive(Debug, Clone)]
pub struct RngBundle {
    decision: RefCell<CountingRng<ChaCha20Rng>>,
    negotiation: RefCell<CountingRng<ChaCha20Rng>>,
    inspection: RefCell<CountingRng<ChaCha20Rng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            decision: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"decision"))),
            negotiation: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"negotiation"))),
            inspection: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"inspection"))),
        }
    }

    /// Strategy choice, bag building and bribe pricing.
    #[must_use]
    pub fn decision(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.decision.borrow_mut()
    }

    #[must_use]
    pub fn negotiation(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.negotiation.borrow_mut()
    }

    /// Bluff contest dice.
    #[must_use]
    pub fn inspection(&self) -> RefMut<'_, CountingRng<ChaCha20Rng>> {
        self.inspection.borrow_mut()
    }

    /// Draw counts per stream as `(decision, negotiation, inspection)`.
    #[must_use]
    pub fn draw_counts(&self) -> (u64, u64, u64) {
        (
            self.decision.borrow().draws(),
            self.negotiation.borrow().draws(),
            self.inspection.borrow().draws(),
        )
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// HMAC-SHA256 of the domain tag keyed by the user seed; first eight bytes.
fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut seed_bytes = [0_u8; 8];
    // HMAC accepts keys of any length, so construction cannot fail.
    if let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) {
        mac.update(domain_tag);
        let digest = mac.finalize().into_bytes();
        seed_bytes.copy_from_slice(&digest[..8]);
    }
    u64::from_le_bytes(seed_bytes)
}
