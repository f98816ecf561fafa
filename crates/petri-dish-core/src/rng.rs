use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Derive a sub-RNG for the `epoch`-th population of a dish, ensuring independent streams.
pub fn derive_epoch_rng(base_seed: u64, epoch: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(
        base_seed.wrapping_add(epoch.wrapping_mul(crate::constants::RNG_DERIVATION_PRIME)),
    )
}
