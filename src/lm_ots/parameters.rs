/// Specifies the Winternitz parameter and hash family of a one-time signature.
///
/// The discriminants are the type ids registered for LM-OTS.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LmotsAlgorithm {
    LmotsSha256N32W1 = 0x01,
    LmotsSha256N32W2 = 0x02,
    LmotsSha256N32W4 = 0x03,
    LmotsSha256N32W8 = 0x04,
    LmotsSha256N24W1 = 0x05,
    LmotsSha256N24W2 = 0x06,
    LmotsSha256N24W4 = 0x07,
    LmotsSha256N24W8 = 0x08,
    LmotsShakeN32W1 = 0x09,
    LmotsShakeN32W2 = 0x0a,
    LmotsShakeN32W4 = 0x0b,
    LmotsShakeN32W8 = 0x0c,
    LmotsShakeN24W1 = 0x0d,
    LmotsShakeN24W2 = 0x0e,
    LmotsShakeN24W4 = 0x0f,
    LmotsShakeN24W8 = 0x10,
}

impl Default for LmotsAlgorithm {
    fn default() -> Self {
        LmotsAlgorithm::LmotsSha256N32W1
    }
}

/// Order of the compressed private key encoding; the index is what gets stored.
pub(crate) const COMPRESSED_LMOTS_TYPES: [LmotsAlgorithm; 16] = [
    LmotsAlgorithm::LmotsSha256N32W1,
    LmotsAlgorithm::LmotsSha256N32W2,
    LmotsAlgorithm::LmotsSha256N32W4,
    LmotsAlgorithm::LmotsSha256N32W8,
    LmotsAlgorithm::LmotsSha256N24W1,
    LmotsAlgorithm::LmotsSha256N24W2,
    LmotsAlgorithm::LmotsSha256N24W4,
    LmotsAlgorithm::LmotsSha256N24W8,
    LmotsAlgorithm::LmotsShakeN32W1,
    LmotsAlgorithm::LmotsShakeN32W2,
    LmotsAlgorithm::LmotsShakeN32W4,
    LmotsAlgorithm::LmotsShakeN32W8,
    LmotsAlgorithm::LmotsShakeN24W1,
    LmotsAlgorithm::LmotsShakeN24W2,
    LmotsAlgorithm::LmotsShakeN24W4,
    LmotsAlgorithm::LmotsShakeN24W8,
];

impl LmotsAlgorithm {
    pub fn from_type_id(type_id: u32) -> Option<Self> {
        COMPRESSED_LMOTS_TYPES
            .iter()
            .copied()
            .find(|lmots| lmots.get_type_id() == type_id)
    }

    pub fn get_type_id(&self) -> u32 {
        *self as u32
    }

    pub fn get_winternitz(&self) -> u8 {
        match (self.get_type_id() - 1) % 4 {
            0 => 1,
            1 => 2,
            2 => 4,
            _ => 8,
        }
    }

    pub fn get_hash_output_size(&self) -> usize {
        if (self.get_type_id() - 1) / 4 % 2 == 0 {
            32
        } else {
            24
        }
    }

    pub fn is_shake(&self) -> bool {
        self.get_type_id() >= LmotsAlgorithm::LmotsShakeN32W1.get_type_id()
    }

    pub(crate) fn compressed_index(&self) -> u8 {
        (self.get_type_id() - 1) as u8
    }

    pub(crate) fn from_compressed_index(index: u8) -> Option<Self> {
        COMPRESSED_LMOTS_TYPES.get(index as usize).copied()
    }
}
