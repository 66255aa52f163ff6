// Dispatcher configuration: sandbox root and the email adapter's SMTP
// settings. Read from the process configuration file at startup; the SMTP
// password is the one exception, read from the environment (fatal if a
// email task is configured but the password is absent).

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub sender_account: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Read from the environment at startup, never from the config file.
    pub smtp_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sandbox root all shell/workflow cwds resolve under.
    pub work_dir: PathBuf,
    /// Path to the helper binary that runs a registered python task by name.
    pub python_wrapper_path: PathBuf,
    pub email: EmailConfig,
}
