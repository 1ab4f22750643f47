use std::fmt;

/// Failure raised by the compute backend while servicing a submission.
#[derive(Debug)]
pub enum BackendError {
    UnknownBuffer(usize),
    UnknownHandle(u64),
    TransferSizeMismatch {
        buffer: usize,
        expected: usize,
        actual: usize,
    },
    InvalidWorkSize {
        stage: &'static str,
    },
    BufferAllocationFailed {
        byte_count: usize,
    },
    DeviceLost,
    Other(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::UnknownBuffer(id) => write!(f, "Unknown device buffer id {}", id),
            BackendError::UnknownHandle(id) => write!(f, "Unknown completion handle {}", id),
            BackendError::TransferSizeMismatch {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "Transfer size mismatch for buffer {}: buffer holds {} B, source is {} B",
                buffer, expected, actual
            ),
            BackendError::InvalidWorkSize { stage } => {
                write!(f, "Invalid global/local work size for stage {}", stage)
            }
            BackendError::BufferAllocationFailed { byte_count } => {
                write!(f, "Failed to allocate {} B device buffer", byte_count)
            }
            BackendError::DeviceLost => write!(f, "Compute device lost"),
            BackendError::Other(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[derive(Debug)]
pub enum HarnessError {
    /// Rejected before any backend resource is touched.
    Config(String),
    /// Host or device buffer could not be allocated or pinned.
    Allocation {
        what: &'static str,
        slot: usize,
        detail: String,
    },
    /// A backend submission or completion failed; fatal for the run.
    Backend(BackendError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Config(msg) => write!(f, "Configuration error: {}", msg),
            HarnessError::Allocation { what, slot, detail } => {
                write!(f, "Failed to allocate {} for slot {}: {}", what, slot, detail)
            }
            HarnessError::Backend(err) => write!(f, "Fatal backend error: {}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for HarnessError {
    fn from(value: BackendError) -> Self {
        HarnessError::Backend(value)
    }
}
