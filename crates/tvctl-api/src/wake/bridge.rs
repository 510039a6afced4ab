// Debug-bridge wake for Android TV style companion boxes.
//
// Drives the platform `adb` binary: connect to the device over TCP, then
// inject KEYCODE_WAKEUP. Network debugging must be enabled on the device.

use std::ffi::OsString;
use std::process::Output;

use tokio::process::Command;
use tracing::debug;

use crate::error::Error;

/// Port `adb` listens on when network debugging is enabled.
pub const DEFAULT_BRIDGE_PORT: u16 = 5555;

const WAKE_KEYCODE: &str = "KEYCODE_WAKEUP";

/// `adb connect` exits 0 even when it could not reach the device; these
/// markers in its stdout identify that case.
const CONNECT_FAILURE_MARKERS: &[&str] = &["failed to connect", "cannot connect", "unable to connect"];

/// Wrapper around the `adb` executable.
#[derive(Debug, Clone)]
pub struct DebugBridge {
    program: OsString,
}

impl Default for DebugBridge {
    fn default() -> Self {
        Self::new("adb")
    }
}

impl DebugBridge {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Connect to `ip:port` and send the wake key event.
    pub async fn wake(&self, ip: &str, port: u16) -> Result<(), Error> {
        let target = format!("{ip}:{port}");

        let output = self.run(&["connect", &target]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if let Some(marker) = CONNECT_FAILURE_MARKERS.iter().find(|m| stdout.contains(**m)) {
            return Err(Error::Bridge {
                message: format!("adb connect {target}: {marker}"),
            });
        }

        self.run(&["-s", &target, "shell", "input", "keyevent", WAKE_KEYCODE])
            .await?;

        debug!(%target, "debug bridge wake sent");
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<Output, Error> {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::Bridge {
                message: format!(
                    "could not run {}: {e} (install Android platform tools)",
                    self.program.to_string_lossy()
                ),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Bridge {
                message: format!(
                    "{} {} failed: {}",
                    self.program.to_string_lossy(),
                    args.first().copied().unwrap_or_default(),
                    stderr.trim()
                ),
            });
        }

        Ok(output)
    }
}
