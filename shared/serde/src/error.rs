use thiserror::Error;

/// Errors that can occur while decoding a byte stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran out of bytes before the value was complete
    #[error("ran out of bytes while reading (wanted {wanted}, had {remaining})")]
    UnexpectedEnd { wanted: usize, remaining: usize },

    /// A decoded discriminant or flag had no valid interpretation
    #[error("invalid value {value} while reading {type_name}")]
    InvalidValue {
        type_name: &'static str,
        value: u64,
    },
}
