use crate::error::{Error, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Render a command line for error messages and logs.
pub fn describe(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run a tool in the C locale and collect its output, whatever the exit status.
pub fn capture(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args).env("LC_ALL", "C");
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    log::debug!("running {}", describe(program, args));

    cmd.output().map_err(|e| Error::Fetch {
        command: describe(program, args),
        detail: e.to_string(),
    })
}

/// Run a tool and return its stdout, failing with its stderr on a non-zero exit.
pub fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<Vec<u8>> {
    let output = capture(program, args, cwd)?;
    if !output.status.success() {
        return Err(failure(program, args, &output));
    }
    Ok(output.stdout)
}

/// The error for a command that ran but exited unsuccessfully.
pub fn failure(program: &str, args: &[&str], output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = match (stderr.trim(), output.status.code()) {
        ("", Some(code)) => format!("exit status {code}"),
        ("", None) => "terminated by signal".to_string(),
        (msg, _) => msg.to_string(),
    };
    Error::Fetch {
        command: describe(program, args),
        detail,
    }
}
