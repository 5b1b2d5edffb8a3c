use alloc::vec::Vec;

use tinyvec::ArrayVec;
use zeroize::{Zeroize, Zeroizing};

use crate::{
    constants::{MasterSeed, MAX_HSS_LEVELS, MAX_SUBTREE, MIN_SUBTREE, SEED_LEN},
    error::HssError,
    hss::{
        aux::{expand_aux_data, ExpandedAuxData},
        extra_info::{resolve_thread_count, ExtraInfo},
        param_set::{CompressedParameterSet, ParameterSet},
        parameter::HssParameter,
        private_key::PrivateKeyBlob,
        seed_derive::{derive_child, derive_root, SeedAndLmsTreeIdentifier},
        storage::PrivateKeyStorage,
    },
    util::trace_event,
};

/// Node values of the bottom subtree of one LMS tree.
///
/// Only sized and wiped here; the signer computing the Merkle nodes fills it.
pub(crate) struct SubtreeCache {
    height: u8,
    nodes: Zeroizing<Vec<u8>>,
}

impl SubtreeCache {
    fn allocate(height: u8, hash_size: usize) -> Result<Self, HssError> {
        let len = subtree_bytes(height, hash_size);

        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(len)
            .map_err(|_| HssError::OutOfMemory)?;
        nodes.resize(len, 0u8);

        Ok(SubtreeCache {
            height,
            nodes: Zeroizing::new(nodes),
        })
    }

    fn clear(&mut self) {
        self.nodes.iter_mut().for_each(|b| *b = 0);
    }
}

fn subtree_bytes(height: u8, hash_size: usize) -> usize {
    hash_size * ((2usize << height) - 1)
}

/// The top tree never moves on; lower levels keep a second cache for the tree after the current.
fn subtree_slots(level: usize) -> usize {
    if level == 0 {
        1
    } else {
        2
    }
}

/**
 * Picks the subtree height cached on each level.
 *
 * Every level gets at least [`MIN_SUBTREE`] (or its full height if lower).
 * What is left of `memory_target` goes to the bottom level first, since it
 * moves on with every signature, and then upwards.
 * */
pub fn plan_subtree_heights(
    parameters: &[HssParameter],
    memory_target: usize,
) -> ArrayVec<[u8; MAX_HSS_LEVELS]> {
    let mut heights: ArrayVec<[u8; MAX_HSS_LEVELS]> = parameters
        .iter()
        .map(|parameter| MIN_SUBTREE.min(parameter.get_tree_height()))
        .collect();

    let mut total: usize = parameters
        .iter()
        .zip(heights.iter())
        .enumerate()
        .map(|(level, (parameter, &height))| {
            subtree_slots(level) * subtree_bytes(height, parameter.get_hash_output_size())
        })
        .sum();

    for level in (0..parameters.len()).rev() {
        let parameter = &parameters[level];
        let hash_size = parameter.get_hash_output_size();
        let cap = MAX_SUBTREE.min(parameter.get_tree_height());

        while heights[level] < cap {
            let extra = subtree_slots(level) * hash_size * (2usize << heights[level]);
            if total + extra > memory_target {
                break;
            }
            total += extra;
            heights[level] += 1;
        }
    }

    heights
}

/// Leaf index inside each level's current tree for the overall signature `count`.
pub fn split_count(count: u64, parameters: &[HssParameter]) -> ArrayVec<[u32; MAX_HSS_LEVELS]> {
    let mut leaf_indices = ArrayVec::new();
    leaf_indices.resize(parameters.len(), 0u32);

    let mut remaining = count;
    for (level, parameter) in parameters.iter().enumerate().rev() {
        let height = parameter.get_tree_height() as u32;
        leaf_indices[level] = (remaining & ((1u64 << height) - 1)) as u32;
        remaining = remaining.checked_shr(height).unwrap_or(0);
    }

    leaf_indices
}

/**
 * A private key loaded for signing.
 *
 * Holds the persisted key it was loaded from together with everything that
 * follows from it: the seed and identifier of every active tree, the leaf
 * each of them is at, and the subtree caches. The counter that has been
 * persisted is the reservation; one-time keys below it may be handed out
 * without touching storage again.
 *
 * All seed material is zeroized when the key is dropped.
 * */
pub struct WorkingKey<S> {
    pub(crate) storage: S,
    pub(crate) private_key: PrivateKeyBlob,
    pub(crate) parameters: ArrayVec<[HssParameter; MAX_HSS_LEVELS]>,
    pub(crate) trees: ArrayVec<[SeedAndLmsTreeIdentifier; MAX_HSS_LEVELS]>,
    pub(crate) leaf_indices: ArrayVec<[u32; MAX_HSS_LEVELS]>,
    pub(crate) subtrees: Vec<Vec<SubtreeCache>>,
    pub(crate) aux: Option<ExpandedAuxData>,
    pub(crate) current_count: u64,
    pub(crate) reserve_count: u64,
    pub(crate) max_count: u64,
    pub(crate) num_threads: usize,
}

/**
 * Allocates a working key for `parameter_set` within `memory_target` bytes
 * of subtree cache.
 *
 * Nothing is derived yet; see [`WorkingKey::generate_working_key`].
 * */
pub fn allocate_working_key<S: PrivateKeyStorage>(
    storage: S,
    parameter_set: &ParameterSet,
    memory_target: usize,
) -> Result<WorkingKey<S>, HssError> {
    let parameters = parameter_set.parameters.clone();
    let heights = plan_subtree_heights(&parameters, memory_target);

    let mut subtrees = Vec::new();
    subtrees
        .try_reserve_exact(parameters.len())
        .map_err(|_| HssError::OutOfMemory)?;

    for (level, (parameter, &height)) in parameters.iter().zip(heights.iter()).enumerate() {
        let mut level_caches = Vec::new();
        level_caches
            .try_reserve_exact(subtree_slots(level))
            .map_err(|_| HssError::OutOfMemory)?;

        for _ in 0..subtree_slots(level) {
            level_caches.push(SubtreeCache::allocate(
                height,
                parameter.get_hash_output_size(),
            )?);
        }
        subtrees.push(level_caches);
    }

    trace_event!(levels = parameters.len(), memory_target, "working key allocated");

    let mut trees = ArrayVec::new();
    trees.resize_with(parameters.len(), SeedAndLmsTreeIdentifier::default);

    Ok(WorkingKey {
        storage,
        private_key: PrivateKeyBlob::default(),
        parameters,
        trees,
        leaf_indices: ArrayVec::new(),
        subtrees,
        aux: None,
        current_count: 0,
        reserve_count: 0,
        max_count: parameter_set.max_count,
        num_threads: resolve_thread_count(0),
    })
}

impl<S: PrivateKeyStorage> WorkingKey<S> {
    /**
     * Fills an allocated working key from its persisted private key.
     *
     * The key is read and checked again, as storage may have moved on since
     * the parameter set was determined. Aux data that does not verify is
     * ignored.
     * */
    pub fn generate_working_key(
        &mut self,
        aux_data: Option<&[u8]>,
        info: Option<&ExtraInfo>,
    ) -> Result<(), HssError> {
        self.private_key.read_from(&mut self.storage)?;

        let compressed =
            CompressedParameterSet::from_slice(self.private_key.get_compressed_parameter())?;
        if compressed.to()?.as_slice() != self.parameters.as_slice() {
            trace_event!("private key changed its parameter set while loading");
            return Err(HssError::BadPrivateKey);
        }

        let count = self.private_key.get_count();
        if count > self.max_count {
            return Err(HssError::PrivateKeyExpired);
        }

        self.current_count = count;
        self.reserve_count = count;
        self.leaf_indices = split_count(count, &self.parameters);
        self.derive_trees(0)?;

        let master_seed = self.master_seed();
        let top = self.parameters[0];
        self.aux = expand_aux_data(
            aux_data,
            top.get_hash_output_size(),
            top.get_tree_height(),
            &master_seed,
        );

        self.num_threads = resolve_thread_count(info.map_or(0, |info| info.num_threads));

        trace_event!(
            count,
            aux = self.aux.is_some(),
            num_threads = self.num_threads,
            "working key generated"
        );

        Ok(())
    }

    fn master_seed(&self) -> Zeroizing<MasterSeed> {
        let mut master_seed = Zeroizing::new([0u8; SEED_LEN]);
        master_seed.copy_from_slice(self.private_key.get_master_seed());
        master_seed
    }

    /// Derives the seed and identifier of every tree from `first_level` down.
    pub(crate) fn derive_trees(&mut self, first_level: usize) -> Result<(), HssError> {
        for level in first_level..self.parameters.len() {
            let tree = if level == 0 {
                derive_root(&self.master_seed())
            } else {
                let parent = &self.trees[level - 1];
                derive_child(
                    &parent.seed,
                    &parent.lms_tree_identifier,
                    self.leaf_indices[level - 1],
                    level,
                    &self.parameters,
                )?
            };
            self.trees[level] = tree;

            self.subtrees[level]
                .iter_mut()
                .for_each(SubtreeCache::clear);
        }

        Ok(())
    }
}

impl<S> WorkingKey<S> {
    pub fn levels(&self) -> usize {
        self.parameters.len()
    }

    pub fn get_parameters(&self) -> &[HssParameter] {
        &self.parameters
    }

    /// Index of the next one-time key to use.
    pub fn current_count(&self) -> u64 {
        self.current_count
    }

    /// Counter value persisted in storage.
    pub fn reserve_count(&self) -> u64 {
        self.reserve_count
    }

    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    pub fn remaining_signatures(&self) -> u64 {
        if self.current_count > self.max_count {
            0
        } else {
            self.max_count - self.current_count + 1
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Seed and identifier of the active tree on `level`.
    pub fn seed_and_lms_tree_identifier(&self, level: usize) -> Option<&SeedAndLmsTreeIdentifier> {
        self.trees.get(level)
    }

    pub fn leaf_index(&self, level: usize) -> Option<u32> {
        self.leaf_indices.get(level).copied()
    }

    pub fn subtree_height(&self, level: usize) -> Option<u8> {
        self.subtrees
            .get(level)
            .and_then(|caches| caches.first())
            .map(|cache| cache.height)
    }

    /// Bytes held by all subtree caches.
    pub fn cache_bytes(&self) -> usize {
        self.subtrees
            .iter()
            .flat_map(|caches| caches.iter())
            .map(|cache| cache.nodes.len())
            .sum()
    }

    /// Top tree nodes taken over from verified aux data.
    pub fn aux_data(&self) -> Option<&ExpandedAuxData> {
        self.aux.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

impl<S> Zeroize for WorkingKey<S> {
    fn zeroize(&mut self) {
        self.private_key.zeroize();
        self.trees.iter_mut().for_each(Zeroize::zeroize);
        self.leaf_indices.iter_mut().for_each(Zeroize::zeroize);
        self.subtrees
            .iter_mut()
            .flat_map(|caches| caches.iter_mut())
            .for_each(|cache| cache.nodes.zeroize());
        self.aux = None;
        self.current_count.zeroize();
        self.reserve_count.zeroize();
    }
}

impl<S> Drop for WorkingKey<S> {
    fn drop(&mut self) {
        self.zeroize();
    }
}
