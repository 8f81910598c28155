//! Line framing on the controller's stdio pipe
//!
//! Every outbound line is one JSON object with exactly one of the keys
//! `reply`, `error` or `notify`.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use vpurse_bridge::{ControllerChannel, Result, VpurseError};

/// One outbound line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    /// Response to the request on the matching inbound line
    Reply(Value),
    /// The request failed
    Error { code: String, message: String },
    /// Unsolicited message such as a balance broadcast
    Notify(Value),
}

impl Frame {
    pub fn reply(payload: &str) -> Self {
        Frame::Reply(embed(payload))
    }

    pub fn error(err: &VpurseError) -> Self {
        Frame::Error {
            code: err.error_code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn notify(payload: &str) -> Self {
        Frame::Notify(embed(payload))
    }

    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(VpurseError::encoding)
    }
}

// Payloads are JSON already; anything else travels as a string.
fn embed(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_string()))
}

/// Serialized frame writer shared by replies and controller broadcasts
///
/// Stdout in the binary; tests capture into a buffer.
#[derive(Clone)]
pub struct FrameSink {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl FrameSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Write one frame as one line and flush it
    pub fn send(&self, frame: &Frame) -> Result<()> {
        let line = frame.to_line()?;
        let mut out = self.out.lock();
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| VpurseError::controller(format!("output write failed: {}", e)))
    }
}

impl ControllerChannel for FrameSink {
    /// Broadcasts are one-way; the controller's answer is not awaited.
    fn call(&self, payload: &str) -> Result<String> {
        self.send(&Frame::notify(payload))?;
        Ok(String::new())
    }
}

/// In-memory writer for inspecting emitted frames
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuf {
    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
impl Write for SharedBuf {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
