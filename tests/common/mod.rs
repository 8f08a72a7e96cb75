use anyhow::Result;
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Run the CLI with `args`, feeding `input` on stdin.
pub fn run_cli_on_str(args: &[&str], input: &str) -> Result<Output> {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kpl_syntax"));
    cmd.args(args)
        .arg("--no-color")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    child.stdin.as_mut().unwrap().write_all(input.as_bytes())?;
    Ok(child.wait_with_output()?)
}

/// Stdout of a run that must succeed.
pub fn stdout_of(args: &[&str], input: &str) -> Result<String> {
    let out = run_cli_on_str(args, input)?;
    anyhow::ensure!(
        out.status.success(),
        "kpl_syntax {args:?} exited with {}: {}",
        out.status,
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(String::from_utf8(out.stdout)?)
}
