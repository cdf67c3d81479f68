use blake2::{Blake2b512, Digest};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Make a random number generator from a global seed
/// and a string id.
///
/// The global seed controls all the randomness in a synthetic
/// data run. Each block of generated data (the prescriptions, the
/// medical records) passes its own id, so that changing how one
/// block is generated does not change the data in another block
/// made from the same global seed.
///
/// The id is concatenated with the global seed and the result is
/// hashed. The first 32 bytes of the hash seed the generator.
///
pub fn make_rng(global_seed: u64, id: &str) -> ChaCha8Rng {
    let digest = Blake2b512::new()
        .chain_update(format!("{id}{global_seed}"))
        .finalize();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest[..32]);
    ChaCha8Rng::from_seed(seed)
}
