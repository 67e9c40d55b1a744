use thiserror::Error;

use petid_core::AnimalId;

/// Errors raised by the record log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// No stream exists for the animal.
    #[error("no record stream for animal {0}")]
    UnknownAnimal(AnimalId),

    /// A stream was opened twice for the same animal.
    #[error("record stream for animal {0} already open")]
    AlreadyOpen(AnimalId),

    /// The birth date is write-once.
    #[error("birth date for animal {0} is already set")]
    BirthDateAlreadySet(AnimalId),

    /// Appending would overflow the per-animal sequence counter.
    #[error("record sequence exhausted for animal {0}")]
    SequenceExhausted(AnimalId),
}
