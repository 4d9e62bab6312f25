use thiserror::Error;

/// Errors that abort the current request outright: retrying would not help.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("device returned exception response for function code {fc:#04x}, exception code {code:#04x}")]
    Exception { fc: u8, code: u8 },

    #[error("transport rejected oversized frame ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("write confirmation mismatch: expected {expected:x?}, got {got:x?}")]
    WriteMismatch { expected: Vec<u8>, got: Vec<u8> },

    #[error("underlying transport failed irrecoverably: {0}")]
    Transport(String),
}

/// Errors that are worth retrying: the next attempt may simply succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransientError {
    #[error("no response within the response timeout")]
    Timeout,

    #[error("response frame too short ({0} bytes)")]
    ShortFrame(usize),

    #[error("CRC check failed")]
    BadCrc,

    #[error("response slave address {got} does not match request address {expected}")]
    WrongAddress { expected: u8, got: u8 },

    #[error("response carries an unexpected function code {0:#04x}")]
    UnexpectedFunctionCode(u8),

    #[error("response size {got} does not match the expected size {expected}")]
    WrongSize { expected: usize, got: usize },
}

/// Top level error returned by the request/response engine and register API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModbusError {
    #[error(transparent)]
    Fatal(#[from] FatalError),

    #[error("exhausted retries, last error: {0}")]
    RetriesExhausted(TransientError),
}

pub type ModbusResult<T> = Result<T, ModbusError>;
