use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    constants::{
        MasterSeed, FAULT_HARDENING, PRIVATE_KEY_CHECKSUM, PRIVATE_KEY_CHECKSUM_LEN,
        PRIVATE_KEY_FORMAT, PRIVATE_KEY_FORMAT_LEN, PRIVATE_KEY_FORMAT_VERSION,
        PRIVATE_KEY_INDEX, PRIVATE_KEY_INDEX_LEN, PRIVATE_KEY_LEN, PRIVATE_KEY_PARAM_SET,
        PRIVATE_KEY_PARAM_SET_LEN, PRIVATE_KEY_SEED, PRIVATE_KEY_SEED_LEN,
        SECRET_METHOD_SIMPLE,
    },
    error::HssError,
    hasher::{HashReason, HashScope, InternalHasher},
    hss::storage::PrivateKeyStorage,
    util::{
        trace_event,
        ustr::{str64u, u64str},
    },
};

const EXPECTED_FORMAT: [u8; PRIVATE_KEY_FORMAT_LEN] = [
    PRIVATE_KEY_FORMAT_VERSION,
    SECRET_METHOD_SIMPLE,
    0, /* Reserved for future use */
    0,
];

/// Whether a write is allowed to skip the read back verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// First write during key generation. There is no earlier state a
    /// faulty write could regress to, so provisioning writes are unverified.
    Provisioning,
    /// Every later write of the counter.
    Update,
}

/**
 * The persisted private key.
 *
 * | offset | length | content                                        |
 * |--------|--------|------------------------------------------------|
 * | 0      | 8      | counter (next one-time key to use)             |
 * | 8      | 8      | checksum                                       |
 * | 16     | 4      | format: version, secret method, two reserved   |
 * | 20     | 16     | compressed parameter set                       |
 * | 36     | 32     | master seed                                    |
 *
 * The checksum is the first 8 bytes of an unkeyed SHA-256 over every other
 * byte. It catches corrupted writes that could send the counter backwards,
 * not an attacker who can rewrite the key.
 * */
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyBlob {
    data: [u8; PRIVATE_KEY_LEN],
}

impl Default for PrivateKeyBlob {
    fn default() -> Self {
        PrivateKeyBlob {
            data: [0u8; PRIVATE_KEY_LEN],
        }
    }
}

impl PrivateKeyBlob {
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() != PRIVATE_KEY_LEN {
            return None;
        }

        let mut result = PrivateKeyBlob::default();
        result.data.copy_from_slice(data);
        Some(result)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn set_format(&mut self) {
        self.data[PRIVATE_KEY_FORMAT..PRIVATE_KEY_FORMAT + PRIVATE_KEY_FORMAT_LEN]
            .copy_from_slice(&EXPECTED_FORMAT);
    }

    pub fn get_count(&self) -> u64 {
        str64u(&self.data[PRIVATE_KEY_INDEX..PRIVATE_KEY_INDEX + PRIVATE_KEY_INDEX_LEN])
    }

    pub fn set_count(&mut self, count: u64) {
        self.data[PRIVATE_KEY_INDEX..PRIVATE_KEY_INDEX + PRIVATE_KEY_INDEX_LEN]
            .copy_from_slice(&u64str(count));
    }

    pub fn get_compressed_parameter(&self) -> &[u8] {
        &self.data[PRIVATE_KEY_PARAM_SET..PRIVATE_KEY_PARAM_SET + PRIVATE_KEY_PARAM_SET_LEN]
    }

    pub fn set_compressed_parameter(&mut self, compressed: &[u8; PRIVATE_KEY_PARAM_SET_LEN]) {
        self.data[PRIVATE_KEY_PARAM_SET..PRIVATE_KEY_PARAM_SET + PRIVATE_KEY_PARAM_SET_LEN]
            .copy_from_slice(compressed);
    }

    pub fn get_master_seed(&self) -> &[u8] {
        &self.data[PRIVATE_KEY_SEED..PRIVATE_KEY_SEED + PRIVATE_KEY_SEED_LEN]
    }

    pub fn set_master_seed(&mut self, seed: &MasterSeed) {
        self.data[PRIVATE_KEY_SEED..PRIVATE_KEY_SEED + PRIVATE_KEY_SEED_LEN].copy_from_slice(seed);
    }

    fn compute_checksum(&self) -> [u8; PRIVATE_KEY_CHECKSUM_LEN] {
        let scope = HashScope::new(0, HashReason::PrivateKeyChecksum);

        // Hash everything except the checksum
        let hash = InternalHasher::new(scope)
            .chain(&self.data[..PRIVATE_KEY_CHECKSUM])
            .chain(&self.data[PRIVATE_KEY_CHECKSUM + PRIVATE_KEY_CHECKSUM_LEN..])
            .finalize();

        let mut checksum = [0u8; PRIVATE_KEY_CHECKSUM_LEN];
        checksum.copy_from_slice(&hash[..PRIVATE_KEY_CHECKSUM_LEN]);
        checksum
    }

    pub fn update_checksum(&mut self) {
        let checksum = self.compute_checksum();
        self.data[PRIVATE_KEY_CHECKSUM..PRIVATE_KEY_CHECKSUM + PRIVATE_KEY_CHECKSUM_LEN]
            .copy_from_slice(&checksum);
    }

    /// Format tag and checksum both as expected; the sole gate for trusting persisted bytes.
    pub fn check_format_and_checksum(&self) -> bool {
        let format = &self.data[PRIVATE_KEY_FORMAT..PRIVATE_KEY_FORMAT + PRIVATE_KEY_FORMAT_LEN];
        if format != &EXPECTED_FORMAT[..] {
            return false;
        }

        let mut checksum = self.compute_checksum();
        let stored =
            &self.data[PRIVATE_KEY_CHECKSUM..PRIVATE_KEY_CHECKSUM + PRIVATE_KEY_CHECKSUM_LEN];
        let success: bool = checksum[..].ct_eq(stored).into();
        checksum.zeroize();
        success
    }

    /// Reads the key from `storage` and rejects it unless format and checksum hold.
    pub fn read<S: PrivateKeyStorage + ?Sized>(storage: &mut S) -> Result<Self, HssError> {
        let mut private_key = PrivateKeyBlob::default();
        private_key.read_from(storage)?;
        Ok(private_key)
    }

    /// Like [`PrivateKeyBlob::read`], into an existing buffer. The buffer is zeroized on failure.
    pub fn read_from<S: PrivateKeyStorage + ?Sized>(
        &mut self,
        storage: &mut S,
    ) -> Result<(), HssError> {
        if storage.read_private_key(&mut self.data).is_err() {
            self.zeroize();
            trace_event!("private key read failed");
            return Err(HssError::PrivateKeyReadFailed);
        }

        if !self.check_format_and_checksum() {
            self.zeroize();
            trace_event!("private key format or checksum mismatch");
            return Err(HssError::BadPrivateKey);
        }

        Ok(())
    }

    /// Recomputes the checksum and persists the first `len` bytes.
    pub fn write<S: PrivateKeyStorage + ?Sized>(
        &mut self,
        len: usize,
        storage: &mut S,
        mode: WriteMode,
    ) -> Result<(), HssError> {
        self.write_with_hardening(len, storage, mode, FAULT_HARDENING)
    }

    pub(crate) fn write_with_hardening<S: PrivateKeyStorage + ?Sized>(
        &mut self,
        len: usize,
        storage: &mut S,
        mode: WriteMode,
        fault_hardening: bool,
    ) -> Result<(), HssError> {
        if len > PRIVATE_KEY_LEN {
            return Err(HssError::BufferOverflow);
        }

        self.update_checksum();

        if storage.update_private_key(&self.data[..len]).is_err() {
            trace_event!(len, "private key write failed");
            return Err(HssError::PrivateKeyWriteFailed);
        }

        if fault_hardening && mode == WriteMode::Update && storage.verifies_writes() {
            // Double check that the write went through
            let mut private_key_check = PrivateKeyBlob::default();

            if storage
                .read_private_key(&mut private_key_check.data)
                .is_err()
            {
                trace_event!("private key read back failed");
                return Err(HssError::PrivateKeyReadFailed);
            }

            let matches: bool = self.data[..].ct_eq(&private_key_check.data[..]).into();
            if !matches {
                trace_event!("private key read back differs from write");
                return Err(HssError::BadPrivateKey);
            }
        }

        Ok(())
    }
}

pub fn is_fault_hardening_on() -> bool {
    FAULT_HARDENING
}
