use std::process::Stdio;

use tokio::process::Command;

/// Families of ping utilities we know how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `ping -n <count> -w <timeout in ms> <target>`
    Windows,
    /// `ping -c <count> -W <timeout in secs> <target>`, also used for anything we don't know
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Program and argv for a single ping invocation. Building one never touches the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProbeCommand {
    /// A single echo request to `target`. The per-attempt time bound is left entirely
    /// to the ping utility itself, encoded in whatever unit its wait flag takes.
    pub fn single_echo(
        platform: Platform,
        bin_path: &str,
        target: &str,
        timeout_secs: Option<u64>,
    ) -> Self {
        let mut args = vec![];
        match platform {
            Platform::Windows => {
                args.push("-n".to_string());
                args.push("1".to_string());
                if let Some(secs) = timeout_secs {
                    args.push("-w".to_string());
                    args.push(secs.saturating_mul(1000).to_string());
                }
            }
            Platform::Unix => {
                args.push("-c".to_string());
                args.push("1".to_string());
                if let Some(secs) = timeout_secs {
                    args.push("-W".to_string());
                    args.push(secs.to_string());
                }
            }
        }
        args.push(target.to_string());
        ProbeCommand {
            program: bin_path.to_string(),
            args,
        }
    }

    /// Output is captured, the child gets killed if the returned handle is dropped early.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use assertor::*;

    use super::*;

    #[test]
    fn unix_uses_seconds() {
        // given, when
        let cmd = ProbeCommand::single_echo(Platform::Unix, "ping", "example.com", Some(5));

        // then
        assert_eq!(cmd.program, "ping");
        assert_that!(cmd.args).is_equal_to(strings(&["-c", "1", "-W", "5", "example.com"]));
    }

    #[test]
    fn windows_uses_millis() {
        // given, when
        let cmd = ProbeCommand::single_echo(Platform::Windows, "ping.exe", "10.0.0.1", Some(3));

        // then
        assert_eq!(cmd.program, "ping.exe");
        assert_that!(cmd.args).is_equal_to(strings(&["-n", "1", "-w", "3000", "10.0.0.1"]));
    }

    #[test]
    fn no_timeout_no_wait_flag() {
        // given, when
        let unix = ProbeCommand::single_echo(Platform::Unix, "ping", "::1", None);
        let windows = ProbeCommand::single_echo(Platform::Windows, "ping", "::1", None);

        // then
        assert_that!(unix.args).is_equal_to(strings(&["-c", "1", "::1"]));
        assert_that!(windows.args).is_equal_to(strings(&["-n", "1", "::1"]));
    }

    #[test]
    fn target_is_last() {
        // given, when
        let cmd = ProbeCommand::single_echo(Platform::current(), "ping", "host.test", Some(1));

        // then
        assert_that!(cmd.args).has_length(5);
        assert_eq!(cmd.args.last().map(String::as_str), Some("host.test"));
    }

    fn strings(input: &[&str]) -> Vec<String> {
        input.iter().map(|it| it.to_string()).collect()
    }
}
