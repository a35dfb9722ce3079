use anyhow::{anyhow, bail, Context, Result};
use glob::glob;
use std::result::Result as StdResult;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const INTERPRETER: &str = "../target/release/four";

/// Runs every tests/*.4 program through the interpreter. If tests/<name>.in exists it is
/// fed to stdin, and stdout has to match tests/<name>.out
fn main() -> Result<()> {
    compile_four().context("compiling interpreter")?;

    let scripts: Vec<_> = glob("tests/*.4")?.collect::<StdResult<_, _>>()?;
    let mut failed = 0;
    for script in &scripts {
        let stem = script
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("odd file name: {}", script.display()))?;
        let expected_output = format!("tests/{}.out", stem);
        let expected_output = fs::read(&expected_output)
            .context(format!("loading expected output: {}", &expected_output))?;
        let input = fs::read(format!("tests/{}.in", stem)).unwrap_or_default();

        let output = run_script(script, &input)
            .context(format!("running script {}", script.display()))?;
        if output == expected_output {
            println!("{}: passed", script.display());
        } else {
            failed += 1;
            println!(
                "{}: failed\nactual output:\n{}",
                script.display(),
                String::from_utf8_lossy(&output)
            );
        }
    }
    if failed > 0 {
        bail!("{} of {} scripts failed", failed, scripts.len());
    }
    Ok(())
}

fn run_script(script: &Path, input: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(INTERPRETER)
        .arg("--file")
        .arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;
    // dropping stdin closes it, so the program sees the end of its input
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        bail!("interpreter exited with {}", output.status);
    }
    Ok(output.stdout)
}

fn compile_four() -> Result<()> {
    let st = Command::new("cargo")
        .args(["build", "--release"])
        .current_dir("../interpreter")
        .status()?;
    if st.success() {
        Ok(())
    } else {
        Err(anyhow!("compiling the interpreter failed"))
    }
}
