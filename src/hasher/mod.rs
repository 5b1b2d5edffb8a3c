use digest::Digest;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::{constants::MAX_HASH_SIZE, util::trace_event};

/// Output of the internal hash function.
pub type HashOutput = Zeroizing<[u8; MAX_HASH_SIZE]>;

/// Why a hash is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashReason {
    PrivateKeyChecksum,
    RootSeed,
    ChildSeed,
    AuxKey,
    Other,
}

/**
 * Which HSS level a hash belongs to and why it is computed.
 *
 * The scope travels with each hasher instead of living in shared state, so
 * interleaved derivations can never observe each other's level.
 * */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashScope {
    pub level: usize,
    pub reason: HashReason,
}

impl HashScope {
    pub fn new(level: usize, reason: HashReason) -> Self {
        HashScope { level, reason }
    }
}

/**
 * The fixed SHA-256 used for all internal derivations.
 *
 * Seed expansion and the private key checksum are no interoperability
 * concern, so they never follow the hash function of the parameter set.
 * */
#[derive(Clone)]
pub struct InternalHasher {
    hasher: Sha256,
    scope: HashScope,
}

impl InternalHasher {
    pub const OUTPUT_SIZE: usize = 32;

    pub fn new(scope: HashScope) -> Self {
        InternalHasher {
            hasher: Sha256::new(),
            scope,
        }
    }

    pub fn scope(&self) -> HashScope {
        self.scope
    }

    pub fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    pub fn chain(self, data: &[u8]) -> Self {
        InternalHasher {
            hasher: Digest::chain_update(self.hasher, data),
            scope: self.scope,
        }
    }

    pub fn finalize(self) -> HashOutput {
        trace_event!(hss_level = self.scope.level, reason = ?self.scope.reason, "internal hash");
        let mut output = Zeroizing::new([0u8; MAX_HASH_SIZE]);
        output.copy_from_slice(&self.hasher.finalize());
        output
    }

    pub fn finalize_reset(&mut self) -> HashOutput {
        trace_event!(hss_level = self.scope.level, reason = ?self.scope.reason, "internal hash");
        let mut output = Zeroizing::new([0u8; MAX_HASH_SIZE]);
        output.copy_from_slice(&self.hasher.finalize_reset());
        output
    }
}

#[cfg(test)]
mod tests {
    use super::{HashReason, HashScope, InternalHasher};

    #[test]
    fn test_sha256_of_abc() {
        let scope = HashScope::new(0, HashReason::Other);
        let digest = InternalHasher::new(scope).chain(b"abc").finalize();

        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(&digest[..], expected.as_slice());
    }

    #[test]
    fn test_finalize_reset_starts_over() {
        let mut hasher = InternalHasher::new(HashScope::new(3, HashReason::ChildSeed));
        hasher.update(b"first");
        let first = hasher.finalize_reset();
        hasher.update(b"first");
        let second = hasher.finalize_reset();

        assert_eq!(*first, *second);
        assert_eq!(hasher.scope().level, 3);
    }
}
