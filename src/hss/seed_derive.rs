use core::fmt;

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{
    constants::{
        prng_len, LmsTreeIdentifier, MasterSeed, D_TOPSEED, ILEN, MAX_SEED_LEN, PRNG_FF, PRNG_I,
        PRNG_J, PRNG_MAX_LEN, PRNG_Q, PRNG_SEED, SEED_CHILD_I, SEED_CHILD_SEED, SEED_LEN,
        TOPSEED_D, TOPSEED_I, TOPSEED_LEN, TOPSEED_Q, TOPSEED_SEED, TOPSEED_WHICH,
    },
    error::HssError,
    hasher::{HashOutput, HashReason, HashScope, InternalHasher},
    hss::parameter::HssParameter,
    util::ustr::{u16str, u32str},
};

/// Seed of one LMS tree. Its length is the hash size of the tree's level.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    data: [u8; MAX_SEED_LEN],
    len: usize,
}

impl Seed {
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.is_empty() || data.len() > MAX_SEED_LEN {
            return None;
        }

        let mut result = Seed::default();
        result.data[..data.len()].copy_from_slice(data);
        result.len = data.len();
        Some(result)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed {
            data: [0u8; MAX_SEED_LEN],
            len: SEED_LEN,
        }
    }
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice().ct_eq(other.as_slice()).into()
    }
}

impl Eq for Seed {}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed").field("len", &self.len).finish_non_exhaustive()
    }
}

/// The private state of one LMS tree: its seed and its identifier `I`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SeedAndLmsTreeIdentifier {
    pub seed: Seed,
    pub lms_tree_identifier: LmsTreeIdentifier,
}

impl SeedAndLmsTreeIdentifier {
    pub fn new(seed: &[u8], lms_tree_identifier: &[u8]) -> Option<Self> {
        if lms_tree_identifier.len() != ILEN {
            return None;
        }

        let mut result = SeedAndLmsTreeIdentifier::default();
        result.seed = Seed::from_slice(seed)?;
        result
            .lms_tree_identifier
            .copy_from_slice(lms_tree_identifier);
        Some(result)
    }
}

/**
 * Derivation context for the values of one tree.
 *
 * Each call to [`SeedDerive::seed_derive`] hashes
 * `I || q || j || 0xff || seed`; `j` selects what is derived and may be
 * advanced after each output, so consecutive outputs of one context never
 * collide.
 * */
pub struct SeedDerive<'a> {
    seed: &'a Seed,
    lms_tree_identifier: &'a LmsTreeIdentifier,
    lms_leaf_identifier: u32,
    child_seed: u16,
    scope: HashScope,
}

impl<'a> SeedDerive<'a> {
    pub fn new(seed: &'a Seed, i: &'a LmsTreeIdentifier, scope: HashScope) -> Self {
        SeedDerive {
            seed,
            lms_tree_identifier: i,
            lms_leaf_identifier: 0,
            child_seed: 0,
            scope,
        }
    }

    pub fn set_lms_leaf_identifier(&mut self, identifier: u32) {
        self.lms_leaf_identifier = identifier;
    }

    pub fn set_child_seed(&mut self, seed: u16) {
        self.child_seed = seed;
    }

    pub fn seed_derive(&mut self, increment_j: bool) -> HashOutput {
        let mut buffer = Zeroizing::new([0u8; PRNG_MAX_LEN]);
        let len = prng_len(self.seed.len());

        buffer[PRNG_I..PRNG_I + ILEN].copy_from_slice(self.lms_tree_identifier);
        buffer[PRNG_Q..PRNG_Q + 4].copy_from_slice(&u32str(self.lms_leaf_identifier));
        buffer[PRNG_J..PRNG_J + 2].copy_from_slice(&u16str(self.child_seed));
        buffer[PRNG_FF] = 0xff;
        buffer[PRNG_SEED..len].copy_from_slice(self.seed.as_slice());

        if increment_j {
            self.child_seed = self.child_seed.wrapping_add(1);
        }

        InternalHasher::new(self.scope)
            .chain(&buffer[..len])
            .finalize()
    }
}

impl Drop for SeedDerive<'_> {
    fn drop(&mut self) {
        self.lms_leaf_identifier.zeroize();
        self.child_seed.zeroize();
    }
}

/**
 * Derives the seed and identifier of the top level tree from the master seed.
 *
 * The master seed is hashed once into an intermediate seed, which then takes
 * its place in the preimage. Root seed and identifier are both hashed from
 * the intermediate seed, so no output is a direct hash of the master seed.
 * */
pub fn derive_root(master_seed: &MasterSeed) -> SeedAndLmsTreeIdentifier {
    let mut hash_preimage = Zeroizing::new([0u8; TOPSEED_LEN]);
    let mut hasher = InternalHasher::new(HashScope::new(0, HashReason::RootSeed));

    // The top tree has no parent: I and q stay zero
    hash_preimage[TOPSEED_I..TOPSEED_I + ILEN].fill(0);
    hash_preimage[TOPSEED_Q..TOPSEED_Q + 4].copy_from_slice(&u32str(0));
    hash_preimage[TOPSEED_D..TOPSEED_D + 2].copy_from_slice(&u16str(D_TOPSEED));
    hash_preimage[TOPSEED_SEED..TOPSEED_SEED + SEED_LEN].copy_from_slice(master_seed);

    hasher.update(&hash_preimage[..]);
    let intermediate = hasher.finalize_reset();
    hash_preimage[TOPSEED_SEED..TOPSEED_SEED + SEED_LEN].copy_from_slice(&intermediate[..SEED_LEN]);

    hash_preimage[TOPSEED_WHICH] = 0x01;
    hasher.update(&hash_preimage[..]);
    let seed = hasher.finalize_reset();

    hash_preimage[TOPSEED_WHICH] = 0x02;
    hasher.update(&hash_preimage[..]);
    let lms_tree_identifier = hasher.finalize_reset();

    let mut result = SeedAndLmsTreeIdentifier::default();
    result.seed.data[..SEED_LEN].copy_from_slice(&seed[..SEED_LEN]);
    result.seed.len = SEED_LEN;
    result
        .lms_tree_identifier
        .copy_from_slice(&lms_tree_identifier[..ILEN]);
    result
}

/**
 * Derives the seed and identifier of a tree on `level` from its parent's.
 *
 * `tree_index` is the leaf of the parent tree the child hangs off. The child
 * seed is cut to the hash size of `parameters[level]`.
 * */
pub fn derive_child(
    parent_seed: &Seed,
    parent_identifier: &LmsTreeIdentifier,
    tree_index: u32,
    level: usize,
    parameters: &[HssParameter],
) -> Result<SeedAndLmsTreeIdentifier, HssError> {
    let seed_len = parameters
        .get(level)
        .ok_or(HssError::BadParamSet)?
        .get_hash_output_size();

    let mut derive = SeedDerive::new(
        parent_seed,
        parent_identifier,
        HashScope::new(level, HashReason::ChildSeed),
    );

    derive.set_lms_leaf_identifier(tree_index);
    derive.set_child_seed(SEED_CHILD_SEED);

    let seed = derive.seed_derive(false);
    derive.set_child_seed(SEED_CHILD_I);
    let lms_tree_identifier = derive.seed_derive(false);

    let mut result = SeedAndLmsTreeIdentifier::default();
    result.seed.data[..seed_len].copy_from_slice(&seed[..seed_len]);
    result.seed.len = seed_len;
    result
        .lms_tree_identifier
        .copy_from_slice(&lms_tree_identifier[..ILEN]);
    Ok(result)
}
