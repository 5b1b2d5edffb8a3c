use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::PRIVATE_KEY_LEN;

/**
 * Where the private key lives between signing operations.
 *
 * `read_private_key` fills the whole buffer with the persisted key.
 * `update_private_key` persists the given prefix of the key; after key
 * generation only the counter and checksum prefix are written.
 *
 * All working keys sharing one persisted key must be serialized by the
 * implementation: at most one update may be in flight at a time.
 * */
pub trait PrivateKeyStorage {
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()>;

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()>;

    /// Whether a write can be checked by reading the key back.
    fn verifies_writes(&self) -> bool {
        true
    }
}

impl<S: PrivateKeyStorage + ?Sized> PrivateKeyStorage for &mut S {
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()> {
        (**self).read_private_key(private_key)
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        (**self).update_private_key(private_key)
    }

    fn verifies_writes(&self) -> bool {
        (**self).verifies_writes()
    }
}

/// Storage delegated to caller supplied read and update functions.
pub struct DelegatedStorage<R, U>
where
    R: FnMut(&mut [u8]) -> Result<(), ()>,
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    read: R,
    update: U,
}

impl<R, U> DelegatedStorage<R, U>
where
    R: FnMut(&mut [u8]) -> Result<(), ()>,
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    pub fn new(read: R, update: U) -> Self {
        DelegatedStorage { read, update }
    }
}

impl<R, U> PrivateKeyStorage for DelegatedStorage<R, U>
where
    R: FnMut(&mut [u8]) -> Result<(), ()>,
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()> {
        (self.read)(private_key)
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        (self.update)(private_key)
    }
}

/**
 * The whole private key kept resident in memory.
 *
 * Reads and updates are plain copies which cannot fail, so there is nothing
 * to verify after a write.
 * */
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ResidentKey {
    private_key: [u8; PRIVATE_KEY_LEN],
}

impl ResidentKey {
    pub fn from_bytes(private_key: &[u8]) -> Option<Self> {
        if private_key.len() != PRIVATE_KEY_LEN {
            return None;
        }

        let mut result = ResidentKey {
            private_key: [0u8; PRIVATE_KEY_LEN],
        };
        result.private_key.copy_from_slice(private_key);
        Some(result)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.private_key
    }
}

impl PrivateKeyStorage for ResidentKey {
    fn read_private_key(&mut self, private_key: &mut [u8]) -> Result<(), ()> {
        let len = private_key.len().min(PRIVATE_KEY_LEN);
        private_key[..len].copy_from_slice(&self.private_key[..len]);
        Ok(())
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        let len = private_key.len().min(PRIVATE_KEY_LEN);
        self.private_key[..len].copy_from_slice(&private_key[..len]);
        Ok(())
    }

    fn verifies_writes(&self) -> bool {
        false
    }
}

/// Target of the very first write during key generation; there is nothing to read yet.
pub(crate) struct ProvisioningStorage<U>(pub U)
where
    U: FnMut(&[u8]) -> Result<(), ()>;

impl<U> PrivateKeyStorage for ProvisioningStorage<U>
where
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    fn read_private_key(&mut self, _private_key: &mut [u8]) -> Result<(), ()> {
        Err(())
    }

    fn update_private_key(&mut self, private_key: &[u8]) -> Result<(), ()> {
        (self.0)(private_key)
    }

    fn verifies_writes(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};

    #[test]
    fn test_resident_key_partial_update() {
        let mut resident = ResidentKey::from_bytes(&[7u8; PRIVATE_KEY_LEN]).unwrap();

        resident.update_private_key(&[1u8; 16]).unwrap();

        let mut read_back = [0u8; PRIVATE_KEY_LEN];
        resident.read_private_key(&mut read_back).unwrap();
        assert_eq!(&read_back[..16], &[1u8; 16]);
        assert_eq!(&read_back[16..], &[7u8; PRIVATE_KEY_LEN - 16][..]);
        assert!(!resident.verifies_writes());
    }

    #[test]
    fn test_resident_key_wrong_length() {
        assert!(ResidentKey::from_bytes(&[0u8; PRIVATE_KEY_LEN - 1]).is_none());
    }

    #[test]
    fn test_delegated_storage_forwards() {
        let persisted = RefCell::new([3u8; PRIVATE_KEY_LEN]);
        let writes = Cell::new(0);

        let mut storage = DelegatedStorage::new(
            |buffer: &mut [u8]| {
                buffer.copy_from_slice(&persisted.borrow()[..buffer.len()]);
                Ok(())
            },
            |data: &[u8]| {
                writes.set(writes.get() + 1);
                persisted.borrow_mut()[..data.len()].copy_from_slice(data);
                Ok(())
            },
        );

        storage.update_private_key(&[9u8; 8]).unwrap();
        let mut buffer = [0u8; PRIVATE_KEY_LEN];
        storage.read_private_key(&mut buffer).unwrap();

        assert_eq!(&buffer[..8], &[9u8; 8]);
        assert_eq!(&buffer[8..], &[3u8; PRIVATE_KEY_LEN - 8][..]);
        assert!(storage.verifies_writes());
        assert_eq!(writes.get(), 1);
    }
}
