use crate::{LmotsAlgorithm, LmsAlgorithm};

/**
 * Specify `Winternitz Parameter` ([`LmotsAlgorithm`]) and `Tree Height` ([`LmsAlgorithm`]) for one HSS Level.
 * An array is passed to [`crate::generate_private_key`] describing each HSS Level respectively.
 * */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HssParameter {
    lmots_parameter: LmotsAlgorithm,
    lms_parameter: LmsAlgorithm,
}

impl HssParameter {
    pub fn new(lmots_parameter: LmotsAlgorithm, lms_parameter: LmsAlgorithm) -> Self {
        HssParameter {
            lmots_parameter,
            lms_parameter,
        }
    }

    pub fn get_lmots_parameter(&self) -> &LmotsAlgorithm {
        &self.lmots_parameter
    }

    pub fn get_lms_parameter(&self) -> &LmsAlgorithm {
        &self.lms_parameter
    }

    pub fn get_tree_height(&self) -> u8 {
        self.lms_parameter.get_tree_height()
    }

    /// Length of the seed and node values on this level.
    pub fn get_hash_output_size(&self) -> usize {
        self.lms_parameter.get_hash_output_size()
    }

    pub fn is_shake(&self) -> bool {
        self.lms_parameter.is_shake() || self.lmots_parameter.is_shake()
    }
}

impl HssParameter {
    pub fn construct_default_parameters() -> Self {
        let lmots_parameter = LmotsAlgorithm::LmotsSha256N32W1;
        let lms_parameter = LmsAlgorithm::LmsSha256N32H5;

        HssParameter::new(lmots_parameter, lms_parameter)
    }
}

impl Default for HssParameter {
    fn default() -> Self {
        HssParameter::construct_default_parameters()
    }
}
