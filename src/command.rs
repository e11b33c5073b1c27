use std::process::Stdio;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Runs an external OS command and hands back its stdout as text.
///
/// Every probe in this crate goes through this seam, so parsing can be
/// exercised against canned output instead of the live system.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run `program` with `args`. A spawn failure or non-zero exit is an error.
    async fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// Spawns real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let command = command_line(program, args);
        tracing::debug!(%command, "running");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                command,
                reason: format!("exited with {}", output.status),
            });
        }

        Ok(decode_output(&output.stdout))
    }
}

/// Decode command output, falling back to GBK when it is not UTF-8.
///
/// A Chinese Windows console writes `ipconfig` in its OEM code page (936),
/// which GBK covers.
pub fn decode_output(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
            if had_errors {
                tracing::debug!("output is neither UTF-8 nor GBK, kept replacement characters");
            }
            text.into_owned()
        }
    }
}

/// Render a command the way a user would type it.
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(any(test, feature = "test-util"))]
pub mod fake {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::{CommandRunner, command_line};
    use crate::error::{Error, Result};

    /// Replays canned stdout keyed by the full command line.
    /// Unknown commands fail as if the binary were missing.
    #[derive(Default)]
    pub struct FakeRunner {
        outputs: HashMap<String, String>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, command: &str, stdout: &str) -> Self {
            self.outputs.insert(command.to_string(), stdout.to_string());
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[&str]) -> Result<String> {
            let command = command_line(program, args);
            self.calls.borrow_mut().push(command.clone());
            self.outputs
                .get(&command)
                .cloned()
                .ok_or_else(|| Error::CommandFailed {
                    command,
                    reason: "not found".to_string(),
                })
        }
    }
}
