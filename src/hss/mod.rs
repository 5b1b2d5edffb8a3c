pub mod aux;
pub mod extra_info;
pub mod param_set;
pub mod parameter;
pub mod private_key;
mod reserve;
pub mod seed_derive;
pub mod storage;
pub mod working_key;

use crate::{
    constants::{MasterSeed, PRIVATE_KEY_LEN},
    error::HssError,
    util::trace_event,
};

use extra_info::{record_result, ExtraInfo};
use param_set::{get_parameter_set, CompressedParameterSet};
use parameter::HssParameter;
use private_key::{PrivateKeyBlob, WriteMode};
use storage::{PrivateKeyStorage, ProvisioningStorage, ResidentKey};
use working_key::{allocate_working_key, WorkingKey};

/**
 * Loads a private key from `storage` for signing.
 *
 * 1. The parameter set is read from the persisted key; nothing is allocated
 *    if that fails.
 * 2. A working key is allocated for it, with subtree caches sized to
 *    `memory_target` bytes.
 * 3. The working key is filled from the persisted key, taking over `aux_data`
 *    if it verifies. A partially filled key is dropped, and thereby zeroized,
 *    on failure.
 *
 * The outcome is mirrored into `info`, which also provides the thread count hint.
 * */
pub fn load_working_key<S: PrivateKeyStorage>(
    storage: S,
    memory_target: usize,
    aux_data: Option<&[u8]>,
    info: Option<&mut ExtraInfo>,
) -> Result<WorkingKey<S>, HssError> {
    let result = load(storage, memory_target, aux_data, info.as_deref());
    record_result(info, &result);
    result
}

fn load<S: PrivateKeyStorage>(
    mut storage: S,
    memory_target: usize,
    aux_data: Option<&[u8]>,
    info: Option<&ExtraInfo>,
) -> Result<WorkingKey<S>, HssError> {
    let parameter_set = get_parameter_set(&mut storage)?;

    let mut working_key = allocate_working_key(storage, &parameter_set, memory_target)?;
    working_key.generate_working_key(aux_data, info)?;

    trace_event!(
        levels = working_key.levels(),
        count = working_key.current_count(),
        "working key loaded"
    );

    Ok(working_key)
}

fn compose_private_key(
    parameters: &[HssParameter],
    master_seed: &MasterSeed,
) -> Result<PrivateKeyBlob, HssError> {
    let compressed = CompressedParameterSet::from(parameters)?;

    let mut private_key = PrivateKeyBlob::default();
    private_key.set_count(0);
    private_key.set_format();
    private_key.set_compressed_parameter(compressed.as_array());
    private_key.set_master_seed(master_seed);

    Ok(private_key)
}

/**
 * Creates a fresh private key for `parameters` from `master_seed` and hands
 * all of it to `update_private_key`.
 *
 * There is no earlier state to protect, so this first write is not read back.
 * */
pub fn generate_private_key<U>(
    parameters: &[HssParameter],
    master_seed: &MasterSeed,
    update_private_key: U,
) -> Result<(), HssError>
where
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    let mut private_key = compose_private_key(parameters, master_seed)?;
    let mut storage = ProvisioningStorage(update_private_key);

    private_key.write(PRIVATE_KEY_LEN, &mut storage, WriteMode::Provisioning)?;
    trace_event!(levels = parameters.len(), "private key generated");

    Ok(())
}

/// Like [`generate_private_key`], with a master seed drawn from the operating system.
#[cfg(feature = "rand")]
pub fn generate_private_key_random<U>(
    parameters: &[HssParameter],
    update_private_key: U,
) -> Result<(), HssError>
where
    U: FnMut(&[u8]) -> Result<(), ()>,
{
    let mut master_seed = zeroize::Zeroizing::new(MasterSeed::default());
    crate::util::random::get_random(&mut master_seed[..]);

    generate_private_key(parameters, &master_seed, update_private_key)
}

impl ResidentKey {
    /// Generates a private key that stays in memory.
    pub fn generate(
        parameters: &[HssParameter],
        master_seed: &MasterSeed,
    ) -> Result<Self, HssError> {
        let mut private_key = compose_private_key(parameters, master_seed)?;
        private_key.update_checksum();

        ResidentKey::from_bytes(private_key.as_slice()).ok_or(HssError::BufferOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hss::{
            extra_info::{extra_info_test_error_code, init_extra_info},
            seed_derive::derive_root,
            storage::DelegatedStorage,
        },
        util::helper::test_helper::gen_random_seed,
        LmotsAlgorithm, LmsAlgorithm,
    };
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn parameters() -> [HssParameter; 2] {
        [
            HssParameter::new(LmotsAlgorithm::LmotsSha256N32W4, LmsAlgorithm::LmsSha256N32H10),
            HssParameter::new(LmotsAlgorithm::LmotsSha256N32W4, LmsAlgorithm::LmsSha256N32H5),
        ]
    }

    #[test]
    fn test_generate_private_key() {
        let master_seed = gen_random_seed();
        let mut written = Vec::new();

        generate_private_key(&parameters(), &master_seed, |data: &[u8]| {
            written.extend_from_slice(data);
            Ok(())
        })
        .unwrap();

        let private_key = PrivateKeyBlob::from_slice(&written).unwrap();
        assert!(private_key.check_format_and_checksum());
        assert_eq!(private_key.get_count(), 0);
        assert_eq!(private_key.get_master_seed(), &master_seed[..]);
        assert_eq!(
            private_key.get_compressed_parameter(),
            &CompressedParameterSet::from(&parameters()).unwrap().as_array()[..]
        );
    }

    #[test]
    fn test_generate_private_key_errors() {
        let master_seed = gen_random_seed();

        assert_eq!(
            generate_private_key(&[], &master_seed, |_: &[u8]| Ok(())),
            Err(HssError::BadParamSet)
        );
        assert_eq!(
            generate_private_key(&parameters(), &master_seed, |_: &[u8]| Err(())),
            Err(HssError::PrivateKeyWriteFailed)
        );
    }

    #[test]
    fn test_resident_key_generate_matches() {
        let master_seed = gen_random_seed();
        let mut written = Vec::new();
        generate_private_key(&parameters(), &master_seed, |data: &[u8]| {
            written.extend_from_slice(data);
            Ok(())
        })
        .unwrap();

        let resident = ResidentKey::generate(&parameters(), &master_seed).unwrap();
        assert_eq!(resident.as_slice(), written.as_slice());
    }

    #[test]
    fn test_load_working_key() {
        let master_seed = gen_random_seed();
        let resident = ResidentKey::generate(&parameters(), &master_seed).unwrap();

        let mut info = ExtraInfo::new();
        let working_key = load_working_key(resident, 0, None, Some(&mut info)).unwrap();

        assert_eq!(extra_info_test_error_code(Some(&info)), None);
        assert_eq!(working_key.get_parameters(), &parameters()[..]);
        assert_eq!(working_key.current_count(), 0);
        assert_eq!(
            working_key.seed_and_lms_tree_identifier(0),
            Some(&derive_root(&master_seed))
        );
    }

    #[test]
    fn test_load_through_delegated_storage() {
        let master_seed = gen_random_seed();
        let persisted = RefCell::new([0u8; PRIVATE_KEY_LEN]);
        generate_private_key(&parameters(), &master_seed, |data: &[u8]| {
            persisted.borrow_mut().copy_from_slice(data);
            Ok(())
        })
        .unwrap();

        let storage = DelegatedStorage::new(
            |buffer: &mut [u8]| {
                buffer.copy_from_slice(&persisted.borrow()[..buffer.len()]);
                Ok(())
            },
            |data: &[u8]| {
                persisted.borrow_mut()[..data.len()].copy_from_slice(data);
                Ok(())
            },
        );

        let mut working_key = load_working_key(storage, 100_000, None, None).unwrap();
        assert_eq!(working_key.next_signature_index(None), Ok(0));
        drop(working_key);

        let private_key = PrivateKeyBlob::from_slice(&persisted.borrow()[..]).unwrap();
        assert_eq!(private_key.get_count(), 1);
    }

    #[test]
    fn test_load_bad_format() {
        let master_seed = gen_random_seed();
        let mut private_key = compose_private_key(&parameters(), &master_seed).unwrap();
        private_key.as_mut_slice()[16] = 0x02;
        private_key.update_checksum();
        let resident = ResidentKey::from_bytes(private_key.as_slice()).unwrap();

        let mut info = ExtraInfo::new();
        init_extra_info(Some(&mut info));
        assert!(load_working_key(resident, 0, None, Some(&mut info)).is_err());
        assert_eq!(
            extra_info_test_error_code(Some(&info)),
            Some(HssError::BadPrivateKey)
        );
    }

    #[test]
    fn test_load_read_failure() {
        let storage = DelegatedStorage::new(|_: &mut [u8]| Err(()), |_: &[u8]| Ok(()));

        assert_eq!(
            load_working_key(storage, 0, None, None).err(),
            Some(HssError::PrivateKeyReadFailed)
        );
    }
}
