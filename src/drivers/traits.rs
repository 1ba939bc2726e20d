// Device I/O hooks
// The transfer protocol lives outside this crate; a device only fills or drains a byte range

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Device not connected")]
    NotConnected,

    #[error("Device did not respond")]
    NoResponse,

    #[error("Short transfer: expected {expected} bytes, got {actual}")]
    ShortTransfer { expected: usize, actual: usize },

    #[error("Transfer aborted: {0}")]
    Aborted(String),

    #[error("Device error: {0}")]
    Device(String),
}

pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Progress callback for transfers: `(done, total, message)`
pub type ProgressCallback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Physical radio flash as seen by the codeplug
pub trait DeviceIo: Send {
    /// Fill `buf` from the device
    fn read_into(&mut self, buf: &mut [u8], progress: Option<&ProgressCallback>) -> DeviceResult<()>;

    /// Drain `buf` to the device
    fn write_from(&mut self, buf: &[u8], progress: Option<&ProgressCallback>) -> DeviceResult<()>;
}

/// Status information for progress reporting
#[derive(Debug, Clone)]
pub struct Status {
    pub current: usize,
    pub max: usize,
    pub message: String,
}

impl Status {
    pub fn new(current: usize, max: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            max,
            message: message.into(),
        }
    }

    pub fn percent(&self) -> f32 {
        if self.max == 0 {
            return 100.0;
        }
        (self.current as f32 / self.max as f32) * 100.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}  - {:.1}%)",
            self.message,
            self.current,
            self.max,
            self.percent()
        )
    }
}

/// Progress callback that reports through `tracing`
pub fn logging_progress() -> ProgressCallback {
    Box::new(|current, max, message| {
        tracing::debug!("{}", Status::new(current, max, message));
    })
}
