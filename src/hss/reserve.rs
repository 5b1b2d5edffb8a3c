use zeroize::Zeroize;

use crate::{
    constants::{PRIVATE_KEY_EXHAUSTED, PRIVATE_KEY_UPDATE_LEN},
    error::HssError,
    hss::{
        extra_info::{record_result, ExtraInfo},
        private_key::WriteMode,
        storage::PrivateKeyStorage,
        working_key::{split_count, WorkingKey},
    },
    util::trace_event,
};

impl<S: PrivateKeyStorage> WorkingKey<S> {
    /// Persists `count` as the new reservation, keeping the old one if storage refuses.
    fn persist_count(&mut self, count: u64) -> Result<(), HssError> {
        self.private_key.set_count(count);

        if let Err(error) =
            self.private_key
                .write(PRIVATE_KEY_UPDATE_LEN, &mut self.storage, WriteMode::Update)
        {
            self.private_key.set_count(self.reserve_count);
            self.private_key.update_checksum();
            return Err(error);
        }

        trace_event!(count, "reservation persisted");
        self.reserve_count = count;
        Ok(())
    }

    /**
     * Makes sure the next `sigs_to_reserve` signatures need no further write.
     *
     * Reserves as many as are left if fewer remain. Nothing is written if
     * that many are reserved already.
     * */
    pub fn reserve_signatures(
        &mut self,
        sigs_to_reserve: u64,
        info: Option<&mut ExtraInfo>,
    ) -> Result<(), HssError> {
        let result = self.reserve(sigs_to_reserve);
        record_result(info, &result);
        result
    }

    fn reserve(&mut self, sigs_to_reserve: u64) -> Result<(), HssError> {
        if sigs_to_reserve > self.max_count {
            return Err(HssError::NotThatManySigsLeft);
        }

        if self.current_count > self.max_count {
            return Err(HssError::PrivateKeyExpired);
        }

        let new_reserve_count = if self.current_count > self.max_count - sigs_to_reserve {
            self.max_count
        } else {
            self.current_count + sigs_to_reserve
        };

        if new_reserve_count <= self.reserve_count {
            return Ok(());
        }

        self.persist_count(new_reserve_count)
    }

    /// Moves the reservation up to `new_count` if it is not there yet.
    pub fn advance_count(&mut self, new_count: u64) -> Result<(), HssError> {
        if new_count > self.reserve_count {
            self.persist_count(new_count)?;
        }

        Ok(())
    }

    /**
     * Hands out the index of the next one-time key.
     *
     * The index is only returned once storage holds a counter past it, so a
     * crash afterwards can never lead to it being used twice. After the last
     * index the key is marked exhausted and `last_signature` is set in
     * `info`.
     * */
    pub fn next_signature_index(&mut self, info: Option<&mut ExtraInfo>) -> Result<u64, HssError> {
        let mut info = info;
        let result = self.advance_to_next();

        if let Some(info) = info.as_deref_mut() {
            info.last_signature = matches!(result, Ok(index) if index == self.max_count);
        }
        record_result(info, &result);

        result
    }

    fn advance_to_next(&mut self) -> Result<u64, HssError> {
        let index = self.current_count;
        if index > self.max_count {
            return Err(HssError::PrivateKeyExpired);
        }

        if index == self.max_count {
            self.persist_count(PRIVATE_KEY_EXHAUSTED)?;
            self.current_count = PRIVATE_KEY_EXHAUSTED;

            // Nothing is left to sign with
            self.trees.iter_mut().for_each(Zeroize::zeroize);
            trace_event!(index, "last signature handed out");
            return Ok(index);
        }

        let new_count = index + 1;
        self.advance_count(new_count)?;
        self.current_count = new_count;

        let leaf_indices = split_count(new_count, &self.parameters);
        let first_changed = self
            .leaf_indices
            .iter()
            .zip(leaf_indices.iter())
            .position(|(old, new)| old != new);
        self.leaf_indices = leaf_indices;

        // A tree changes when the leaf of its parent does
        if let Some(level) = first_changed {
            self.derive_trees(level + 1)?;
        }

        Ok(index)
    }
}
