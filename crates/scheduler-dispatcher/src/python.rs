// Python task adapter (§4.4): the source's dynamic "module.submod:func"
// resolution becomes, per the design notes, a call into a small wrapper
// binary that resolves a registered function by name and invokes it with a
// JSON payload. Running as a subprocess isolates the engine from user-code
// faults and resource exhaustion, same as the source's embedded-function
// execution model.

use std::collections::HashMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;

use crate::shell::ShellOutcome;

#[derive(Serialize)]
struct PythonPayload<'a> {
    module: &'a str,
    function: &'a str,
    args: &'a [Value],
    kwargs: &'a HashMap<String, Value>,
}

pub async fn run_python(
    wrapper_path: &Path,
    module: &str,
    function: &str,
    args: &[Value],
    kwargs: &HashMap<String, Value>,
) -> ShellOutcome {
    let payload = PythonPayload {
        module,
        function,
        args,
        kwargs,
    };

    let json = match serde_json::to_vec(&payload) {
        Ok(json) => json,
        Err(e) => {
            return ShellOutcome {
                exit_code: 1,
                stdout: String::new(),
                stderr: format!("task arguments are not JSON-serializable: {e}"),
            }
        }
    };
    let encoded = BASE64.encode(json);

    let output = Command::new(wrapper_path).arg(&encoded).output().await;

    match output {
        Ok(output) => ShellOutcome {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ShellOutcome {
            exit_code: 127,
            stdout: String::new(),
            stderr: format!("python wrapper not found at {}: {e}", wrapper_path.display()),
        },
        Err(e) => ShellOutcome {
            exit_code: 1,
            stdout: String::new(),
            stderr: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_as_json() {
        let args = vec![Value::from(1), Value::from("two")];
        let mut kwargs = HashMap::new();
        kwargs.insert("flag".to_string(), Value::from(true));
        let payload = PythonPayload {
            module: "mod",
            function: "func",
            args: &args,
            kwargs: &kwargs,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["module"], "mod");
        assert_eq!(back["function"], "func");
    }
}
