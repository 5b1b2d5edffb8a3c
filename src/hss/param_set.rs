use tinyvec::ArrayVec;

use crate::{
    constants::{
        MAX_HSS_LEVELS, MIN_HSS_LEVELS, PARAM_SET_COMPRESS_LEN, PARAM_SET_END,
        PRIVATE_KEY_PARAM_SET_LEN,
    },
    error::HssError,
    hss::{parameter::HssParameter, private_key::PrivateKeyBlob, storage::PrivateKeyStorage},
    util::trace_event,
    LmotsAlgorithm, LmsAlgorithm,
};

/**
 * The parameter sets of all levels as stored in the private key.
 *
 * Each level takes two bytes, the index of its LMS type and the index of its
 * LM-OTS type in the compression tables. Unused levels are `0xff`.
 * */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressedParameterSet([u8; PRIVATE_KEY_PARAM_SET_LEN]);

impl Default for CompressedParameterSet {
    fn default() -> Self {
        Self([PARAM_SET_END; PRIVATE_KEY_PARAM_SET_LEN])
    }
}

impl CompressedParameterSet {
    pub fn from_slice(data: &[u8]) -> Result<Self, HssError> {
        if data.len() != PRIVATE_KEY_PARAM_SET_LEN {
            return Err(HssError::BufferOverflow);
        }

        let mut result = CompressedParameterSet::default();
        result.0.copy_from_slice(data);

        Ok(result)
    }

    pub fn as_array(&self) -> &[u8; PRIVATE_KEY_PARAM_SET_LEN] {
        &self.0
    }

    pub fn from(parameters: &[HssParameter]) -> Result<Self, HssError> {
        let mut result = CompressedParameterSet::default();
        compress_param_set(&mut result.0, parameters)?;
        Ok(result)
    }

    pub fn to(&self) -> Result<ArrayVec<[HssParameter; MAX_HSS_LEVELS]>, HssError> {
        let mut result = ArrayVec::new();

        for level in 0..MAX_HSS_LEVELS {
            let lms_index = self.0[PARAM_SET_COMPRESS_LEN * level];
            if lms_index == PARAM_SET_END {
                // Every following level has to be unused as well
                if self.0[PARAM_SET_COMPRESS_LEN * level..]
                    .iter()
                    .any(|&b| b != PARAM_SET_END)
                {
                    return Err(HssError::BadPrivateKey);
                }
                break;
            }
            let lmots_index = self.0[PARAM_SET_COMPRESS_LEN * level + 1];

            let lms = LmsAlgorithm::from_compressed_index(lms_index)
                .ok_or(HssError::BadPrivateKey)?;
            let lmots = LmotsAlgorithm::from_compressed_index(lmots_index)
                .ok_or(HssError::BadPrivateKey)?;

            result.push(HssParameter::new(lmots, lms));
        }

        if result.len() < MIN_HSS_LEVELS {
            return Err(HssError::BadPrivateKey);
        }

        Ok(result)
    }
}

/// Writes the compressed form of `parameters` into `compressed`, padding the rest with `0xff`.
pub fn compress_param_set(
    compressed: &mut [u8],
    parameters: &[HssParameter],
) -> Result<(), HssError> {
    if parameters.len() < MIN_HSS_LEVELS || parameters.len() > MAX_HSS_LEVELS {
        return Err(HssError::BadParamSet);
    }

    let mut index = 0;
    for parameter in parameters {
        if compressed.len() < index + PARAM_SET_COMPRESS_LEN {
            return Err(HssError::BufferOverflow);
        }

        if parameter.is_shake() && !cfg!(feature = "shake") {
            return Err(HssError::ShakeNotEnabled);
        }

        compressed[index] = parameter.get_lms_parameter().compressed_index();
        compressed[index + 1] = parameter.get_lmots_parameter().compressed_index();
        index += PARAM_SET_COMPRESS_LEN;
    }

    compressed[index..]
        .iter_mut()
        .for_each(|b| *b = PARAM_SET_END);

    Ok(())
}

/// What a private key says about itself, recovered without building a working key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterSet {
    pub parameters: ArrayVec<[HssParameter; MAX_HSS_LEVELS]>,
    pub current_count: u64,
    pub max_count: u64,
}

impl ParameterSet {
    pub fn levels(&self) -> usize {
        self.parameters.len()
    }

    pub fn total_tree_height(&self) -> u32 {
        self.parameters
            .iter()
            .map(|parameter| parameter.get_tree_height() as u32)
            .sum()
    }
}

/// Highest counter value a key of this total height may still sign with.
pub fn max_count_for_height(total_height: u32) -> u64 {
    // u64::MAX marks an exhausted key, so a 2^64 key loses its last signature
    if total_height >= 64 {
        u64::MAX - 1
    } else {
        (1u64 << total_height) - 1
    }
}

impl ParameterSet {
    pub fn from_private_key(private_key: &PrivateKeyBlob) -> Result<Self, HssError> {
        let compressed = CompressedParameterSet::from_slice(private_key.get_compressed_parameter())?;
        let parameters = compressed.to()?;

        if parameters.iter().any(|p| p.is_shake()) && !cfg!(feature = "shake") {
            return Err(HssError::ShakeNotEnabled);
        }

        let total_height = parameters
            .iter()
            .map(|parameter| parameter.get_tree_height() as u32)
            .sum();
        let max_count = max_count_for_height(total_height);

        let current_count = private_key.get_count();
        if current_count > max_count {
            trace_event!(current_count, max_count, "private key expired");
            return Err(HssError::PrivateKeyExpired);
        }

        Ok(ParameterSet {
            parameters,
            current_count,
            max_count,
        })
    }
}

/**
 * Recovers the parameter set of a persisted private key.
 *
 * A working key has to be sized for the parameter set of its private key
 * before the key can be loaded; this reads and validates the key once to
 * find out.
 * */
pub fn get_parameter_set<S: PrivateKeyStorage + ?Sized>(
    storage: &mut S,
) -> Result<ParameterSet, HssError> {
    let private_key = PrivateKeyBlob::read(storage)?;
    ParameterSet::from_private_key(&private_key)
}

/// Hash length of the top level LMS tree, 0 if the key names no valid top level.
pub fn get_level0_lm_hash_len(private_key: &PrivateKeyBlob) -> usize {
    let lms_index = private_key.get_compressed_parameter()[0];
    LmsAlgorithm::from_compressed_index(lms_index)
        .map(|lms| lms.get_hash_output_size())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hss::storage::ResidentKey;

    fn private_key_with(parameters: &[HssParameter], count: u64) -> PrivateKeyBlob {
        let mut private_key = PrivateKeyBlob::default();
        private_key.set_count(count);
        private_key.set_compressed_parameter(
            CompressedParameterSet::from(parameters).unwrap().as_array(),
        );
        private_key.set_master_seed(&[1u8; 32]);
        private_key.set_format();
        private_key.update_checksum();
        private_key
    }

    #[test]
    fn test_binary_representation_compressed_parameter() {
        let parameter = [
            HssParameter::new(LmotsAlgorithm::LmotsSha256N32W4, LmsAlgorithm::LmsSha256N32H5),
            HssParameter::new(LmotsAlgorithm::LmotsSha256N24W8, LmsAlgorithm::LmsSha256N24H10),
        ];

        let compressed = CompressedParameterSet::from(&parameter).unwrap();
        assert_eq!(&compressed.as_array()[..4], &[0x00, 0x02, 0x06, 0x07]);
        assert!(compressed.as_array()[4..].iter().all(|&b| b == 0xff));

        let arr = compressed.to().unwrap();
        assert_eq!(arr.as_slice(), &parameter[..]);

        assert!(compressed == CompressedParameterSet::from_slice(compressed.as_array()).unwrap());
    }

    #[test]
    fn test_compress_rejects_level_counts() {
        let mut compressed = [0u8; PRIVATE_KEY_PARAM_SET_LEN];
        assert_eq!(
            compress_param_set(&mut compressed, &[]),
            Err(HssError::BadParamSet)
        );
        assert_eq!(
            compress_param_set(&mut compressed, &[HssParameter::default(); 9]),
            Err(HssError::BadParamSet)
        );

        let mut short = [0u8; 3];
        assert_eq!(
            compress_param_set(&mut short, &[HssParameter::default(); 2]),
            Err(HssError::BufferOverflow)
        );
    }

    #[cfg(not(feature = "shake"))]
    #[test]
    fn test_shake_needs_feature() {
        let parameter = [HssParameter::new(
            LmotsAlgorithm::LmotsShakeN32W2,
            LmsAlgorithm::LmsShakeN32H5,
        )];
        assert_eq!(
            CompressedParameterSet::from(&parameter),
            Err(HssError::ShakeNotEnabled)
        );
    }

    #[test]
    fn test_gap_in_levels_is_rejected() {
        let mut data = [PARAM_SET_END; PRIVATE_KEY_PARAM_SET_LEN];
        data[0] = 0;
        data[1] = 0;
        data[4] = 0;
        data[5] = 0;

        let compressed = CompressedParameterSet::from_slice(&data).unwrap();
        assert_eq!(compressed.to(), Err(HssError::BadPrivateKey));
    }

    #[test]
    fn test_unknown_index_is_rejected() {
        let mut data = [PARAM_SET_END; PRIVATE_KEY_PARAM_SET_LEN];
        data[0] = 0x30;
        data[1] = 0;

        let compressed = CompressedParameterSet::from_slice(&data).unwrap();
        assert_eq!(compressed.to(), Err(HssError::BadPrivateKey));
        assert_eq!(
            CompressedParameterSet::default().to(),
            Err(HssError::BadPrivateKey)
        );
    }

    #[test]
    fn test_max_count() {
        assert_eq!(max_count_for_height(5), 31);
        assert_eq!(max_count_for_height(20), (1 << 20) - 1);
        assert_eq!(max_count_for_height(63), (1 << 63) - 1);
        assert_eq!(max_count_for_height(64), u64::MAX - 1);
        assert_eq!(max_count_for_height(200), u64::MAX - 1);
    }

    #[test]
    fn test_get_parameter_set() {
        let parameters = [
            HssParameter::new(LmotsAlgorithm::LmotsSha256N32W2, LmsAlgorithm::LmsSha256N32H10),
            HssParameter::new(LmotsAlgorithm::LmotsSha256N32W4, LmsAlgorithm::LmsSha256N32H5),
        ];
        let private_key = private_key_with(&parameters, 17);
        let mut resident = ResidentKey::from_bytes(private_key.as_slice()).unwrap();

        let parameter_set = get_parameter_set(&mut resident).unwrap();
        assert_eq!(parameter_set.levels(), 2);
        assert_eq!(parameter_set.parameters.as_slice(), &parameters[..]);
        assert_eq!(parameter_set.total_tree_height(), 15);
        assert_eq!(parameter_set.max_count, (1 << 15) - 1);
        assert_eq!(parameter_set.current_count, 17);
    }

    #[test]
    fn test_expired_key_is_rejected() {
        let parameters = [HssParameter::default()];

        let last = private_key_with(&parameters, 31);
        assert!(ParameterSet::from_private_key(&last).is_ok());

        let exhausted = private_key_with(&parameters, u64::MAX);
        assert_eq!(
            ParameterSet::from_private_key(&exhausted),
            Err(HssError::PrivateKeyExpired)
        );
    }

    #[test]
    fn test_level0_lm_hash_len() {
        let parameters = [
            HssParameter::new(LmotsAlgorithm::LmotsSha256N24W4, LmsAlgorithm::LmsSha256N24H5),
            HssParameter::default(),
        ];
        assert_eq!(get_level0_lm_hash_len(&private_key_with(&parameters, 0)), 24);
        assert_eq!(get_level0_lm_hash_len(&PrivateKeyBlob::default()), 32);

        let mut unknown = PrivateKeyBlob::default();
        unknown.set_compressed_parameter(&[PARAM_SET_END; PRIVATE_KEY_PARAM_SET_LEN]);
        assert_eq!(get_level0_lm_hash_len(&unknown), 0);
    }
}
