//! Common error model.

use std::{
    ffi::CStr,
    fmt::{self, Debug, Display, Formatter},
    io,
};

use crate::{motor::DriveError, scoreboard::SourceError};

/// Represents a runtime error.
pub enum Error {
    /// Represents an error which comes from the operating system. It wraps an
    /// `errno` value (i.e., system error code).
    System(i32),
    /// An I/O error on the console or a file.
    Io(io::Error),
    /// The actuator rejected or failed a command.
    Drive(DriveError),
    /// The score source could not produce a scoreboard.
    Source(SourceError),
    /// Represents a runtime error which comes from within Rust. It wraps an
    /// error string.
    Custom(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Custom(format!("{}", err))
    }
}

impl<T> From<Error> for Result<T, Error> {
    #[inline]
    fn from(err: Error) -> Self {
        Err(err)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::System(n) => write!(f, "System({}) [{}]", n, strerror(*n)),
            Error::Io(err) => write!(f, "Io({:?})", err),
            Error::Drive(err) => write!(f, "Drive({:?})", err),
            Error::Source(err) => write!(f, "Source({:?})", err),
            Error::Custom(s) => write!(f, "Custom({:?})", s),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::System(n) => Display::fmt(&strerror(*n), f),
            Error::Io(err) => Display::fmt(err, f),
            Error::Drive(err) => Display::fmt(err, f),
            Error::Source(err) => Display::fmt(err, f),
            Error::Custom(s) => Display::fmt(s, f),
        }
    }
}

impl std::error::Error for Error {}

fn strerror(errno: i32) -> String {
    // SAFETY: strerror returns a pointer to a NUL-terminated static (or
    // thread-local) buffer which stays valid until the next call.
    unsafe {
        let ptr = libc::strerror(errno);
        if ptr.is_null() {
            format!("errno {}", errno)
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    }
}

/// Represents a C return code which signals failure through a sentinel value.
///
/// Implemented for `i32`, where `-1` means "see `errno`" and the `pthread_*`
/// family returns the error number directly.
pub trait SentinelError: Sized {
    /// Checks if the value is a success value, giving an appropriate error
    /// otherwise.
    fn check(self) -> Result<Self, Error>;
}

impl SentinelError for i32 {
    fn check(self) -> Result<Self, Error> {
        match self {
            -1 => Err(from_errno()),
            0 => Ok(self),
            n if n > 0 => Err(Error::System(n)),
            _ => Ok(self),
        }
    }
}

/// Gets the value of `errno` for the current thread.
#[inline]
pub fn get_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Generates an [`Error`] object from the value of `errno` for the current
/// thread.
#[inline]
pub fn from_errno() -> Error {
    Error::System(get_errno())
}
