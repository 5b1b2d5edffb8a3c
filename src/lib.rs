//! Private key custody for the Hierarchical Signature System (HSS, RFC 8554).
//!
//! A HSS private key is stateful: every one-time key may sign exactly once,
//! so the counter of the next unused key has to reach storage before a
//! signature leaves the signer. This crate owns that part of a HSS signer:
//!
//! - the persisted private key ([`PrivateKeyBlob`]), its checksum and the
//!   read and update protocol against a [`PrivateKeyStorage`], with optional
//!   read back of every update (feature `fault_hardening`);
//! - deterministic derivation of the seed and identifier of every tree in the
//!   hierarchy from the master seed ([`derive_root`], [`derive_child`]);
//! - loading a [`WorkingKey`] and handing out one-time key indices from it.
//!
//! The Merkle tree and one-time signature computations are left to the signer.
//!
//! ```
//! use hbs_lms_state::*;
//!
//! let parameters = [HssParameter::new(
//!     LmotsAlgorithm::LmotsSha256N32W2,
//!     LmsAlgorithm::LmsSha256N32H5,
//! )];
//! let master_seed = [0x42u8; 32];
//!
//! let resident = ResidentKey::generate(&parameters, &master_seed).unwrap();
//! let mut working_key = load_working_key(resident, 0, None, None).unwrap();
//!
//! assert_eq!(working_key.next_signature_index(None), Ok(0));
//! assert_eq!(working_key.next_signature_index(None), Ok(1));
//! ```
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod constants;
mod error;
pub mod hasher;
mod hss;
mod lm_ots;
mod lms;
mod util;

pub use crate::constants::{LmsTreeIdentifier, MasterSeed, PRIVATE_KEY_LEN};
pub use crate::error::HssError;

pub use crate::hss::parameter::HssParameter;
pub use crate::lm_ots::parameters::*;
pub use crate::lms::parameters::*;

pub use crate::hss::aux::{
    expand_aux_data, finalize_aux_data, get_aux_data_len, save_aux_node, store_aux_marker,
    ExpandedAuxData,
};
pub use crate::hss::extra_info::{
    extra_info_set_threads, extra_info_test_error_code, extra_info_test_last_signature,
    init_extra_info, ExtraInfo,
};
pub use crate::hss::param_set::{
    compress_param_set, get_level0_lm_hash_len, get_parameter_set, CompressedParameterSet,
    ParameterSet,
};
pub use crate::hss::private_key::{is_fault_hardening_on, PrivateKeyBlob, WriteMode};
pub use crate::hss::seed_derive::{derive_child, derive_root, Seed, SeedAndLmsTreeIdentifier};
pub use crate::hss::storage::{DelegatedStorage, PrivateKeyStorage, ResidentKey};
pub use crate::hss::working_key::{allocate_working_key, WorkingKey};

#[cfg(feature = "rand")]
pub use crate::hss::generate_private_key_random;
pub use crate::hss::{generate_private_key, load_working_key};
