pub mod helper;
#[cfg(feature = "rand")]
pub mod random;
pub mod ustr;

/// Emits a `tracing` event when the `verbose` feature is on, nothing otherwise.
macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "verbose")]
        tracing::debug!($($arg)*);
    };
}

pub(crate) use trace_event;
