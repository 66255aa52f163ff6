// Shell task adapter (§4.4). The command string is parsed with POSIX
// shell-quoting rules and exec'd directly — never handed to `sh -c`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tokio::process::Command;

pub struct ShellOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

const BACKGROUND_STDOUT: &str = "Process launched in background.";

pub async fn run_shell(
    command: &str,
    cwd: &Path,
    env: &HashMap<String, String>,
    background: bool,
    timeout: Option<Duration>,
) -> ShellOutcome {
    let argv = match shell_words::split(command) {
        Ok(argv) if !argv.is_empty() => argv,
        Ok(_) => {
            return ShellOutcome {
                exit_code: 127,
                stdout: String::new(),
                stderr: "empty command".to_string(),
            }
        }
        Err(e) => {
            return ShellOutcome {
                exit_code: 127,
                stdout: String::new(),
                stderr: format!("could not parse command: {e}"),
            }
        }
    };

    let mut cmd = Command::new(&argv[0]);
    cmd.args(&argv[1..]);
    cmd.current_dir(cwd);
    cmd.envs(env);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ShellOutcome {
                exit_code: 127,
                stdout: String::new(),
                stderr: format!("command not found: {e}"),
            }
        }
        Err(e) => {
            return ShellOutcome {
                exit_code: 1,
                stdout: String::new(),
                stderr: e.to_string(),
            }
        }
    };

    if background {
        return ShellOutcome {
            exit_code: 0,
            stdout: BACKGROUND_STDOUT.to_string(),
            stderr: String::new(),
        };
    }

    let pid = child.id();
    let wait = child.wait_with_output();

    let output = match timeout {
        Some(duration) => match tokio::time::timeout(duration, wait).await {
            Ok(result) => result,
            Err(_) => {
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                return ShellOutcome {
                    exit_code: 124,
                    stdout: String::new(),
                    stderr: format!("timed out after {duration:?}"),
                };
            }
        },
        None => wait.await,
    };

    match output {
        Ok(output) => ShellOutcome {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(e) => ShellOutcome {
            exit_code: 1,
            stdout: String::new(),
            stderr: e.to_string(),
        },
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    // The child was spawned in its own process group (process_group(0)), so
    // killing -pid reaches it and anything it forked.
    unsafe {
        libc::kill(-(pid as i32), libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_a_simple_command() {
        let outcome = run_shell("echo hello", Path::new("."), &HashMap::new(), false, None).await;
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn missing_command_yields_exit_127() {
        let outcome = run_shell(
            "this-binary-does-not-exist-anywhere",
            Path::new("."),
            &HashMap::new(),
            false,
            None,
        )
        .await;
        assert_eq!(outcome.exit_code, 127);
    }

    #[tokio::test]
    async fn background_mode_returns_immediately() {
        let outcome = run_shell("sleep 5", Path::new("."), &HashMap::new(), true, None).await;
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, BACKGROUND_STDOUT);
    }

    #[tokio::test]
    async fn env_vars_are_passed_through() {
        let mut env = HashMap::new();
        env.insert("GREETING".to_string(), "hi".to_string());
        let outcome = run_shell("sh -c \"echo $GREETING\"", Path::new("."), &env, false, None).await;
        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout.trim(), "hi");
    }
}
