use core::mem::size_of;

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub const ILEN: usize = 16;
pub const SEED_LEN: usize = 32;
pub const MAX_SEED_LEN: usize = 32;
pub const MAX_HASH_SIZE: usize = 32;

pub type LmsTreeIdentifier = [u8; ILEN];
pub type MasterSeed = [u8; SEED_LEN];

pub const MIN_HSS_LEVELS: usize = 1;
pub const MAX_HSS_LEVELS: usize = 8;

pub const MAX_THREAD_COUNT: usize = 16;

// Private key layout, see `hss::private_key`
pub const PRIVATE_KEY_INDEX: usize = 0;
pub const PRIVATE_KEY_INDEX_LEN: usize = size_of::<u64>();
pub const PRIVATE_KEY_CHECKSUM: usize = PRIVATE_KEY_INDEX + PRIVATE_KEY_INDEX_LEN;
pub const PRIVATE_KEY_CHECKSUM_LEN: usize = 8;
pub const PRIVATE_KEY_FORMAT: usize = PRIVATE_KEY_CHECKSUM + PRIVATE_KEY_CHECKSUM_LEN;
pub const PRIVATE_KEY_FORMAT_LEN: usize = 4;
pub const PRIVATE_KEY_PARAM_SET: usize = PRIVATE_KEY_FORMAT + PRIVATE_KEY_FORMAT_LEN;
pub const PARAM_SET_COMPRESS_LEN: usize = 2;
pub const PRIVATE_KEY_PARAM_SET_LEN: usize = PARAM_SET_COMPRESS_LEN * MAX_HSS_LEVELS;
pub const PRIVATE_KEY_SEED: usize = PRIVATE_KEY_PARAM_SET + PRIVATE_KEY_PARAM_SET_LEN;
pub const PRIVATE_KEY_SEED_LEN: usize = SEED_LEN;
pub const PRIVATE_KEY_LEN: usize = PRIVATE_KEY_SEED + PRIVATE_KEY_SEED_LEN;

/// Only the counter and the checksum change after key generation.
pub const PRIVATE_KEY_UPDATE_LEN: usize = PRIVATE_KEY_CHECKSUM + PRIVATE_KEY_CHECKSUM_LEN;

pub const PRIVATE_KEY_FORMAT_VERSION: u8 = 0x01;
pub const SECRET_METHOD_SIMPLE: u8 = 0xff;

pub const PARAM_SET_END: u8 = 0xff;

/// Counter value of a key whose signatures are used up.
pub const PRIVATE_KEY_EXHAUSTED: u64 = u64::MAX;

pub const TOPSEED_I: usize = 0;
pub const TOPSEED_Q: usize = 16;
pub const TOPSEED_D: usize = 20;
pub const TOPSEED_WHICH: usize = 22;
pub const TOPSEED_SEED: usize = 23;
pub const TOPSEED_LEN: usize = TOPSEED_SEED + SEED_LEN;
pub const D_TOPSEED: u16 = 0xfefe;

pub const PRNG_I: usize = 0;
pub const PRNG_Q: usize = 16;
pub const PRNG_J: usize = 20;
pub const PRNG_FF: usize = 22;
pub const PRNG_SEED: usize = 23;

pub const SEED_CHILD_SEED: u16 = !1;
pub const SEED_CHILD_I: u16 = SEED_CHILD_SEED + 1;

pub const fn prng_len(seed_len: usize) -> usize {
    PRNG_SEED + seed_len
}

pub const PRNG_MAX_LEN: usize = prng_len(MAX_SEED_LEN);

pub const MIN_SUBTREE: u8 = 2; /* All cached subtrees have at least 2 levels */
pub const MAX_SUBTREE: u8 = 12;

pub const MAX_AUX_LEVEL: usize = 25;
pub const DAUX_D: usize = 20;
pub const DAUX_PREFIX_LEN: usize = 22; /* Not counting the seed value */
pub const D_DAUX: u16 = 0xfdfd;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_layout() {
        assert_eq!(PRIVATE_KEY_CHECKSUM, 8);
        assert_eq!(PRIVATE_KEY_FORMAT, 16);
        assert_eq!(PRIVATE_KEY_PARAM_SET, 20);
        assert_eq!(PRIVATE_KEY_SEED, 36);
        assert_eq!(PRIVATE_KEY_LEN, 68);
        assert_eq!(PRIVATE_KEY_UPDATE_LEN, 16);
    }

    #[test]
    fn test_child_derivation_tags() {
        assert_eq!(SEED_CHILD_SEED, 0xfffe);
        assert_eq!(SEED_CHILD_I, 0xffff);
        assert_eq!(TOPSEED_LEN, 55);
        assert_eq!(PRNG_MAX_LEN, 55);
    }
}
