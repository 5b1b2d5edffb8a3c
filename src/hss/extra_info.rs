use crate::{
    constants::{DEFAULT_THREAD_COUNT, MAX_THREAD_COUNT},
    error::HssError,
};

/**
 * Optional side channel between the caller and key operations.
 *
 * The caller may hint how many threads signing should use; operations report
 * whether the last signature of the key was handed out and which error ended
 * the operation. Nothing in here influences correctness.
 * */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtraInfo {
    /// Thread count hint, 0 picks the build default.
    pub num_threads: usize,
    pub last_signature: bool,
    pub error_code: Option<HssError>,
}

impl ExtraInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// The thread count signing should use for this hint.
    pub fn thread_count(&self) -> usize {
        resolve_thread_count(self.num_threads)
    }

    pub(crate) fn record<T>(&mut self, result: &Result<T, HssError>) {
        self.error_code = result.as_ref().err().copied();
    }
}

pub(crate) fn resolve_thread_count(num_threads: usize) -> usize {
    match num_threads {
        0 => DEFAULT_THREAD_COUNT.clamp(1, MAX_THREAD_COUNT),
        n => n.min(MAX_THREAD_COUNT),
    }
}

/// Mirrors the outcome of an operation into `info`, if there is one.
pub(crate) fn record_result<T>(info: Option<&mut ExtraInfo>, result: &Result<T, HssError>) {
    if let Some(info) = info {
        info.record(result);
    }
}

pub fn init_extra_info(info: Option<&mut ExtraInfo>) {
    if let Some(info) = info {
        *info = ExtraInfo::default();
    }
}

pub fn extra_info_set_threads(info: Option<&mut ExtraInfo>, num_threads: usize) {
    if let Some(info) = info {
        info.num_threads = num_threads;
    }
}

pub fn extra_info_test_last_signature(info: Option<&ExtraInfo>) -> bool {
    info.map_or(false, |info| info.last_signature)
}

/// The error recorded in `info`, `NullInfo` if there is no `info` to ask.
pub fn extra_info_test_error_code(info: Option<&ExtraInfo>) -> Option<HssError> {
    match info {
        Some(info) => info.error_code,
        None => Some(HssError::NullInfo),
    }
}
