use std::fmt::{Debug, Display};

#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Null, zero-sized or malformed image, or a parameter out of range
    InvalidArgument,
    /// The result buffer could not be allocated
    AllocationFailure,
}

pub struct SharpenError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SharpenError {
    pub fn new(kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for SharpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Debug for SharpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharpenError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for SharpenError {}

#[macro_export]
macro_rules! sharpen_err {
    ($kind:expr, $($arg:tt)+) => {
        $crate::error::SharpenError::new(
            $kind,
            format!(
                "sharpen: {} @ {}:{}:{}",
                format_args!($($arg)+),
                file!(),
                line!(),
                column!()
            ),
        )
    };
}

/// Like `?`, but converts the foreign error into a [SharpenError] of the given kind
/// and records where it happened.
#[macro_export]
macro_rules! sharpen_try {
    ($kind:expr, $expr:expr $(,)?) => {
        match $expr {
            std::result::Result::Ok(val) => val,
            std::result::Result::Err(err) => {
                return std::result::Result::Err($crate::sharpen_err!($kind, "{}", err));
            }
        }
    };
}
