use crate::raw;
use thiserror::Error;

pub use raw::ParamType;

/// Errors that can occur during parameter operations. Marked as non-exhaustive to allow for
/// future additions without breaking the API. A caller would usually only need to handle
/// NotFound and StorageFull as the other errors are static.
#[derive(Error, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The storage region has to start within the capacity of the device
    #[error("invalid storage offset")]
    InvalidStorageOffset,

    /// The storage region has to fit into the device and hold at least the format header and
    /// the sentinel
    #[error("invalid storage size")]
    InvalidStorageSize,

    /// The internal error value is returned from the provided `impl Storage`
    #[error("internal storage error")]
    StorageError,

    /// Appending the record would run past the end of the storage region. Nothing was written.
    #[error("storage full")]
    StorageFull,

    /// The name, token or record doesn't resolve. Either the parameter isn't reachable right
    /// now (e.g. an unallocated sub-object) or no value has been written yet.
    #[error("parameter not found")]
    NotFound,

    /// The encountered parameter type is reported
    #[error("parameter type mismatch: {0}")]
    TypeMismatch(ParamType),

    /// The registry failed the consistency check. The top level key of the offending entry is
    /// reported.
    #[error("invalid registry entry with key {0}")]
    InvalidRegistry(u16),
}
