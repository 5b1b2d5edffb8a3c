use alloc::vec::Vec;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{
    constants::{
        MasterSeed, DAUX_D, DAUX_PREFIX_LEN, D_DAUX, MAX_AUX_LEVEL, MAX_HASH_SIZE, MIN_SUBTREE,
    },
    hasher::{HashOutput, HashReason, HashScope, InternalHasher},
    lms::parameters::LmsAlgorithm,
    util::{
        trace_event,
        ustr::{str32u, u16str, u32str},
    },
};

/**
 * Aux data caches node values of the top level tree so loading a working key
 * does not have to recompute them.
 *
 * Layout: a four byte level mask with the top bit set (or a single `0x00`
 * when no aux data is kept), the nodes of every level in the mask starting
 * with the level closest to the root, then a MAC over all of the above.
 */
pub type AuxLevel = u32;

const AUX_DATA_MARKER: usize = 0;
const NO_AUX_DATA: u8 = 0x00;
const AUX_DATA_HASHES: usize = 4;
const AUX_LEVEL_PRESENT: AuxLevel = 0x8000_0000;

type HmacSha256 = Hmac<Sha256>;

/// Node levels recovered from verified aux data, indexed by distance from the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandedAuxData {
    hash_size: usize,
    levels: [Option<Vec<u8>>; MAX_AUX_LEVEL + 1],
}

impl ExpandedAuxData {
    pub fn hash_size(&self) -> usize {
        self.hash_size
    }

    pub fn has_level(&self, level: usize) -> bool {
        self.levels.get(level).map_or(false, Option::is_some)
    }

    pub fn level_count(&self) -> usize {
        self.levels.iter().filter(|level| level.is_some()).count()
    }

    /// The cached value of node `node_index` (the root is node 1), if any.
    pub fn extract(&self, node_index: usize) -> Option<&[u8]> {
        let (level, offset) = split_node_index(node_index)?;
        let src = self.levels.get(level)?.as_ref()?;

        let start = offset * self.hash_size;
        let value = src.get(start..start + self.hash_size)?;

        // An all zero node was never filled in
        if value.iter().all(|&b| b == 0) {
            return None;
        }

        Some(value)
    }
}

fn split_node_index(node_index: usize) -> Option<(usize, usize)> {
    if node_index == 0 {
        return None;
    }

    let level = (usize::BITS - 1 - node_index.leading_zeros()) as usize;
    Some((level, node_index - (1 << level)))
}

/// Smallest height of a cached subtree.
fn smallest_subtree_size() -> u32 {
    MIN_SUBTREE as u32
}

/**
 * Picks which levels of the top tree fit into `max_length` bytes of aux data.
 *
 * Returns the level mask and the number of bytes actually needed.
 */
pub fn optimal_aux_level(max_length: usize, lms_parameter: &LmsAlgorithm) -> (AuxLevel, usize) {
    let h0 = lms_parameter.get_tree_height() as u32;
    let size_hash = lms_parameter.get_hash_output_size();

    if max_length < AUX_DATA_HASHES + size_hash {
        return (0, 1);
    }

    let mut remaining = max_length - (AUX_DATA_HASHES + size_hash);
    let mut aux_level: AuxLevel = 0;

    let subtree_size = smallest_subtree_size();
    let mut start = h0 % subtree_size;
    if start == 0 {
        start = subtree_size;
    }

    for level in (start..h0.min(MAX_AUX_LEVEL as u32 + 1)).step_by(subtree_size as usize) {
        let len_this_level = size_hash << level;
        if remaining < len_this_level {
            break;
        }
        remaining -= len_this_level;
        aux_level |= AUX_LEVEL_PRESENT | (1 << level);
    }

    if aux_level == 0 {
        return (0, 1);
    }

    (aux_level, max_length - remaining)
}

/// Bytes of aux data worth allocating for a top tree when at most `max_length` are available.
pub fn get_aux_data_len(max_length: usize, lms_parameter: &LmsAlgorithm) -> usize {
    optimal_aux_level(max_length, lms_parameter).1
}

/// Marks `aux_data` as laid out for `aux_level`, or as unused when the buffer is too short for it.
pub fn store_aux_marker(aux_data: &mut [u8], aux_level: AuxLevel) {
    if aux_level != 0 && aux_data.len() >= AUX_DATA_HASHES {
        aux_data[..AUX_DATA_HASHES].copy_from_slice(&u32str(aux_level));
    } else if let Some(marker) = aux_data.get_mut(AUX_DATA_MARKER) {
        *marker = NO_AUX_DATA;
    }
}

pub fn is_aux_data_used(aux_data: &[u8]) -> bool {
    aux_data
        .get(AUX_DATA_MARKER)
        .map_or(false, |&marker| marker != NO_AUX_DATA)
}

/// Offset of every present level's nodes and the offset of the MAC behind them.
fn level_offsets(
    aux_level: AuxLevel,
    size_hash: usize,
) -> ([Option<usize>; MAX_AUX_LEVEL + 1], usize) {
    let mut offsets = [None; MAX_AUX_LEVEL + 1];
    let mut index = AUX_DATA_HASHES;

    for (level, offset) in offsets.iter_mut().enumerate() {
        if (aux_level >> level) & 1 != 0 {
            *offset = Some(index);
            index += size_hash << level;
        }
    }

    (offsets, index)
}

/**
 * Writes the value of node `node_index` into a buffer laid out for `aux_level`.
 *
 * Nodes of levels that are not kept, and buffers holding no aux data, are
 * left alone.
 */
pub fn save_aux_node(aux_data: &mut [u8], size_hash: usize, node_index: usize, value: &[u8]) {
    if !is_aux_data_used(aux_data) || aux_data.len() < AUX_DATA_HASHES {
        return;
    }

    let aux_level = str32u(&aux_data[..AUX_DATA_HASHES]);
    let (offsets, _) = level_offsets(aux_level, size_hash);

    let (level, offset) = match split_node_index(node_index) {
        Some(split) => split,
        None => return,
    };

    if let Some(Some(start)) = offsets.get(level) {
        let start = start + offset * size_hash;
        if let (Some(dest), Some(value)) = (
            aux_data.get_mut(start..start + size_hash),
            value.get(..size_hash),
        ) {
            dest.copy_from_slice(value);
        }
    }
}

fn compute_aux_key(master_seed: &MasterSeed) -> HashOutput {
    let mut prefix = [0u8; DAUX_PREFIX_LEN];
    prefix[DAUX_D..DAUX_D + 2].copy_from_slice(&u16str(D_DAUX));

    InternalHasher::new(HashScope::new(0, HashReason::AuxKey))
        .chain(&prefix)
        .chain(master_seed)
        .finalize()
}

fn compute_mac(master_seed: &MasterSeed, size_hash: usize, data: &[u8]) -> Option<HmacSha256> {
    let key = compute_aux_key(master_seed);
    let mut mac = HmacSha256::new_from_slice(&key[..size_hash]).ok()?;
    mac.update(data);
    Some(mac)
}

/**
 * Seals aux data after all of its nodes have been saved by appending the MAC.
 *
 * Does nothing for a buffer marked as holding no aux data.
 */
pub fn finalize_aux_data(aux_data: &mut [u8], size_hash: usize, master_seed: &MasterSeed) {
    if !is_aux_data_used(aux_data) || aux_data.len() < AUX_DATA_HASHES {
        return;
    }

    let aux_level = str32u(&aux_data[..AUX_DATA_HASHES]);
    let (_, mac_offset) = level_offsets(aux_level, size_hash);
    if aux_data.len() < mac_offset + size_hash {
        return;
    }

    if let Some(mac) = compute_mac(master_seed, size_hash, &aux_data[..mac_offset]) {
        let mut tag = Zeroizing::new([0u8; MAX_HASH_SIZE]);
        tag.copy_from_slice(&mac.finalize().into_bytes());
        aux_data[mac_offset..mac_offset + size_hash].copy_from_slice(&tag[..size_hash]);
    }
}

/**
 * Verifies aux data for a top tree of `top_tree_height` and splits it into
 * node levels.
 *
 * Aux data only ever saves work, so anything malformed or failing the MAC
 * is reported as `None` and loading goes on without it.
 */
pub fn expand_aux_data(
    aux_data: Option<&[u8]>,
    size_hash: usize,
    top_tree_height: u8,
    master_seed: &MasterSeed,
) -> Option<ExpandedAuxData> {
    let aux_data = aux_data?;

    if !is_aux_data_used(aux_data) || aux_data.len() < AUX_DATA_HASHES + size_hash {
        return None;
    }

    let aux_level = str32u(&aux_data[..AUX_DATA_HASHES]);
    if aux_level & AUX_LEVEL_PRESENT == 0 {
        trace_event!("aux data without level marker ignored");
        return None;
    }

    let aux_level = aux_level & !AUX_LEVEL_PRESENT;
    if aux_level >> top_tree_height.min(MAX_AUX_LEVEL as u8 + 1) != 0 {
        trace_event!(aux_level, "aux data for levels beyond the top tree ignored");
        return None;
    }

    let (offsets, mac_offset) = level_offsets(aux_level, size_hash);
    if aux_data.len() < mac_offset + size_hash {
        trace_event!("truncated aux data ignored");
        return None;
    }

    let mac = compute_mac(master_seed, size_hash, &aux_data[..mac_offset])?;
    if mac
        .verify_truncated_left(&aux_data[mac_offset..mac_offset + size_hash])
        .is_err()
    {
        trace_event!("aux data with bad MAC ignored");
        return None;
    }

    let mut expanded = ExpandedAuxData {
        hash_size: size_hash,
        ..Default::default()
    };

    for (level, offset) in offsets.iter().enumerate() {
        if let Some(start) = offset {
            let len = size_hash << level;
            expanded.levels[level] = Some(aux_data[*start..*start + len].to_vec());
        }
    }

    Some(expanded)
}
