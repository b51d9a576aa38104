use std::io;
use std::net;

/// Result type for every fallible operation on the wire path.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Every fallible operation on the wire path returns either success, a
/// request to retry once more data is available (`Wait`), or a `Fatal`
/// outcome classified by `ErrorKind`. There is no third "abort the
/// process" case: every caller handles `Fatal` by dropping a payload or
/// closing a connection, never by unwinding.
#[derive(Debug, Eq, PartialEq)]
pub enum NetworkError {
    Wait,
    Fatal(ErrorKind),
}

/// Error taxonomy by kind, not by exception type, matching the policy
/// table of malformed input / protocol violation / capacity exhaustion /
/// bad argument / auth failure / io failure / version mismatch.
#[derive(Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// CRC failure, truncated frame, impossible declared length.
    Malformed,
    /// Well-formed but out-of-protocol: duplicate handshake, unknown RPC id.
    ProtocolViolation,
    /// A pool or queue is full.
    CapacityExhausted,
    /// Out-of-range index or otherwise invalid caller-supplied argument.
    BadArgument,
    /// Wrong password, bad serial key, or a ban-list hit.
    AuthFailure,
    VersionMismatch,
    ProtocolMismatch,
    SequenceMismatch,
    PayloadTooLarge,
    EmptyPayload,
    Duplicate,
    AlreadyConnected,
    Expired,
    AddrParse,
    Io(io::ErrorKind),
}

impl From<io::Error> for NetworkError {
    #[inline]
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::WouldBlock => NetworkError::Wait,
            kind => NetworkError::Fatal(ErrorKind::Io(kind)),
        }
    }
}

impl From<net::AddrParseError> for NetworkError {
    #[inline]
    fn from(_: net::AddrParseError) -> Self {
        NetworkError::Fatal(ErrorKind::AddrParse)
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for NetworkError {}

pub trait ErrorUtils {
    /// True for any outcome other than success or a retryable `Wait`.
    fn has_failed(&self) -> bool;
}

impl<T> ErrorUtils for NetworkResult<T> {
    fn has_failed(&self) -> bool {
        !matches!(self, Ok(_) | Err(NetworkError::Wait))
    }
}
