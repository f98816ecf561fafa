/// Default depth of the generation fingerprint history used for cycle detection.
/// Periods longer than this are never reported.
pub const MAX_GENERATIONS_CHECKED: usize = 4096;

/// Largest accepted dish dimension (cells per side). Bounds the two cell buffers.
pub const MAX_DISH_DIMENSION: usize = 4096;

/// Upper bound on device activations per generation; keeps `advance()` bounded.
pub const MAX_DEVICE_FREQUENCY: f32 = 64.0;

/// Prime multiplier used to derive independent RNG streams from a base seed.
/// Chosen so streams for consecutive re-populations have minimal overlap.
pub const RNG_DERIVATION_PRIME: u64 = 7919;
