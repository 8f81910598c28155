//! Controller channel
//!
//! The transport to the VM controller is a synchronous call/return boundary:
//! send a textual payload, get a textual payload or an error back. Latency
//! bounds belong to the channel implementation, not to the bridge.

use vpurse_types::Result;

/// Outbound path to the controller
pub trait ControllerChannel: Send + Sync {
    /// Deliver `payload` and wait for the controller's reply
    fn call(&self, payload: &str) -> Result<String>;
}

/// Channel that accepts everything and replies with an empty string
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopController;

impl ControllerChannel for NoopController {
    fn call(&self, _payload: &str) -> Result<String> {
        Ok(String::new())
    }
}

impl<F> ControllerChannel for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn call(&self, payload: &str) -> Result<String> {
        self(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpurse_types::VpurseError;

    #[test]
    fn test_noop_controller() {
        assert_eq!(NoopController.call("anything").unwrap(), "");
    }

    #[test]
    fn test_closure_controller() {
        let echo = |payload: &str| -> Result<String> { Ok(payload.to_uppercase()) };
        assert_eq!(ControllerChannel::call(&echo, "ack").unwrap(), "ACK");

        let refuse = |_: &str| -> Result<String> { Err(VpurseError::controller("closed")) };
        assert_eq!(
            ControllerChannel::call(&refuse, "x")
                .unwrap_err()
                .error_code(),
            "CONTROLLER_CALL_FAILED"
        );
    }
}
