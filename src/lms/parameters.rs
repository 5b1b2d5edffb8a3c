/// Specifies the Merkle tree height and hash family of one LMS tree.
///
/// The discriminants are the type ids registered for LMS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LmsAlgorithm {
    LmsSha256N32H5 = 0x05,
    LmsSha256N32H10 = 0x06,
    LmsSha256N32H15 = 0x07,
    LmsSha256N32H20 = 0x08,
    LmsSha256N32H25 = 0x09,
    LmsSha256N24H5 = 0x0a,
    LmsSha256N24H10 = 0x0b,
    LmsSha256N24H15 = 0x0c,
    LmsSha256N24H20 = 0x0d,
    LmsSha256N24H25 = 0x0e,
    LmsShakeN32H5 = 0x0f,
    LmsShakeN32H10 = 0x10,
    LmsShakeN32H15 = 0x11,
    LmsShakeN32H20 = 0x12,
    LmsShakeN32H25 = 0x13,
    LmsShakeN24H5 = 0x14,
    LmsShakeN24H10 = 0x15,
    LmsShakeN24H15 = 0x16,
    LmsShakeN24H20 = 0x17,
    LmsShakeN24H25 = 0x18,
}

impl Default for LmsAlgorithm {
    fn default() -> Self {
        LmsAlgorithm::LmsSha256N32H5
    }
}

/// Order of the compressed private key encoding; the index is what gets stored.
pub(crate) const COMPRESSED_LMS_TYPES: [LmsAlgorithm; 20] = [
    LmsAlgorithm::LmsSha256N32H5,
    LmsAlgorithm::LmsSha256N32H10,
    LmsAlgorithm::LmsSha256N32H15,
    LmsAlgorithm::LmsSha256N32H20,
    LmsAlgorithm::LmsSha256N32H25,
    LmsAlgorithm::LmsSha256N24H5,
    LmsAlgorithm::LmsSha256N24H10,
    LmsAlgorithm::LmsSha256N24H15,
    LmsAlgorithm::LmsSha256N24H20,
    LmsAlgorithm::LmsSha256N24H25,
    LmsAlgorithm::LmsShakeN32H5,
    LmsAlgorithm::LmsShakeN32H10,
    LmsAlgorithm::LmsShakeN32H15,
    LmsAlgorithm::LmsShakeN32H20,
    LmsAlgorithm::LmsShakeN32H25,
    LmsAlgorithm::LmsShakeN24H5,
    LmsAlgorithm::LmsShakeN24H10,
    LmsAlgorithm::LmsShakeN24H15,
    LmsAlgorithm::LmsShakeN24H20,
    LmsAlgorithm::LmsShakeN24H25,
];

impl LmsAlgorithm {
    pub fn from_type_id(type_id: u32) -> Option<Self> {
        COMPRESSED_LMS_TYPES
            .iter()
            .copied()
            .find(|lms| lms.get_type_id() == type_id)
    }

    pub fn get_type_id(&self) -> u32 {
        *self as u32
    }

    pub fn get_tree_height(&self) -> u8 {
        5 * (1 + (self.compressed_index() % 5))
    }

    pub fn get_hash_output_size(&self) -> usize {
        if self.compressed_index() / 5 % 2 == 0 {
            32
        } else {
            24
        }
    }

    pub fn is_shake(&self) -> bool {
        self.get_type_id() >= LmsAlgorithm::LmsShakeN32H5.get_type_id()
    }

    pub fn number_of_lm_ots_keys(&self) -> u64 {
        1u64 << self.get_tree_height()
    }

    pub(crate) fn compressed_index(&self) -> u8 {
        (self.get_type_id() - LmsAlgorithm::LmsSha256N32H5.get_type_id()) as u8
    }

    pub(crate) fn from_compressed_index(index: u8) -> Option<Self> {
        COMPRESSED_LMS_TYPES.get(index as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::LmsAlgorithm;

    #[test]
    fn test_tree_heights() {
        assert_eq!(LmsAlgorithm::LmsSha256N32H5.get_tree_height(), 5);
        assert_eq!(LmsAlgorithm::LmsSha256N32H25.get_tree_height(), 25);
        assert_eq!(LmsAlgorithm::LmsSha256N24H10.get_tree_height(), 10);
        assert_eq!(LmsAlgorithm::LmsShakeN24H20.get_tree_height(), 20);
        assert_eq!(LmsAlgorithm::LmsSha256N32H10.number_of_lm_ots_keys(), 1024);
    }

    #[test]
    fn test_hash_output_size() {
        assert_eq!(LmsAlgorithm::LmsSha256N32H15.get_hash_output_size(), 32);
        assert_eq!(LmsAlgorithm::LmsSha256N24H15.get_hash_output_size(), 24);
        assert_eq!(LmsAlgorithm::LmsShakeN32H5.get_hash_output_size(), 32);
        assert_eq!(LmsAlgorithm::LmsShakeN24H5.get_hash_output_size(), 24);
        assert!(LmsAlgorithm::LmsShakeN24H5.is_shake());
        assert!(!LmsAlgorithm::LmsSha256N24H25.is_shake());
    }

    #[test]
    fn test_compressed_index() {
        for (i, lms) in super::COMPRESSED_LMS_TYPES.iter().enumerate() {
            assert_eq!(lms.compressed_index() as usize, i);
            assert_eq!(LmsAlgorithm::from_compressed_index(i as u8), Some(*lms));
        }
        assert_eq!(LmsAlgorithm::from_compressed_index(20), None);
        assert_eq!(
            LmsAlgorithm::from_type_id(0x06),
            Some(LmsAlgorithm::LmsSha256N32H10)
        );
        assert_eq!(LmsAlgorithm::from_type_id(0x04), None);
    }
}
