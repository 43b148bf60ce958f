use async_trait::async_trait;
use log::Level::Debug;
use log::{debug, log_enabled, trace, warn};

use crate::model::ProbeResult;

use super::command::ProbeCommand;
use super::parser;

/// Something that can send a single echo probe and tell us how it went.
#[async_trait]
pub trait Prober: Send {
    /// Resolves once the probe is fully done, including reaping any child process.
    /// There is no error path, failures are [ProbeResult] variants too.
    async fn probe(&mut self) -> ProbeResult;
}

/// Runs the system ping binary once per probe.
///
/// There is no wall-clock limit here; the time bound is whatever was passed to
/// ping via its own timeout flag. The exit code is ignored, interpretation is
/// driven by stdout only.
#[derive(Debug)]
pub struct Caller {
    command: ProbeCommand,
    target: String,
}

impl Caller {
    pub fn new(command: ProbeCommand, target: String) -> Self {
        Caller { command, target }
    }

    fn log_call(&self) {
        if log_enabled!(Debug) {
            debug!(
                "Calling {} with arguments: {}",
                self.command.program,
                self.command.args.join(" ")
            );
        }
    }
}

#[async_trait]
impl Prober for Caller {
    async fn probe(&mut self) -> ProbeResult {
        self.log_call();
        let output = match self.command.to_command().output().await {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to run {}: {}", self.command.program, e);
                return ProbeResult::SpawnError {
                    message: e.to_string(),
                };
            }
        };
        trace!("{} exited with {}", self.command.program, output.status);
        if !output.stderr.is_empty() {
            trace!("ping stderr: {}", String::from_utf8_lossy(&output.stderr));
        }
        parser::parse(&String::from_utf8_lossy(&output.stdout), &self.target)
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;

    use super::*;

    fn caller(program: &str, args: &[&str]) -> Caller {
        let command = ProbeCommand {
            program: program.to_string(),
            args: args.iter().map(|it| it.to_string()).collect(),
        };
        Caller::new(command, "10.0.0.1".to_string())
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        // given
        let mut caller = caller("/nonexistent/ping-crab-no-such-ping", &["-c", "1", "10.0.0.1"]);

        // when
        let result = caller.probe().await;

        // then
        match result {
            ProbeResult::SpawnError { message } => assert_that!(message.is_empty()).is_false(),
            other => panic!("expected spawn error, got {:?}", other),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn stdout_is_parsed() {
        // given
        let mut caller = caller(
            "echo",
            &["64 bytes from 10.0.0.1: icmp_seq=1 ttl=64 time=0.5 ms"],
        );

        // when
        let result = caller.probe().await;

        // then
        assert_that!(result).is_equal_to(ProbeResult::Success {
            ip: "10.0.0.1".to_string(),
            bytes_returned: 64,
            round_trip_ms: 1,
            ttl: 64,
            sequence: Some(1),
        });
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn exit_code_is_ignored() {
        // given
        let mut caller = caller("sh", &["-c", "echo 'Request timed out.'; echo oops >&2; exit 1"]);

        // when, then
        assert_that!(caller.probe().await).is_equal_to(ProbeResult::Timeout);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn silent_child_is_unknown() {
        // given
        let mut caller = caller("true", &[]);

        // when, then
        assert_that!(caller.probe().await).is_equal_to(ProbeResult::Unknown {
            raw_output: String::new(),
        });
    }
}
