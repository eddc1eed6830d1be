use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use assert_cmd::Command;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SAMPLE: &str = r#"{"id":"__USER_ID__","path":"__WS_PATH__"}"#;

struct Fixture {
    dir: TempDir,
    template: PathBuf,
    output: PathBuf,
    bin: PathBuf,
}

impl Fixture {
    fn new(template: Option<&[u8]>) -> anyhow::Result<Self> {
        let dir = TempDir::new().context("failed to create temp dir")?;
        let template_path = dir.path().join("config.json.tpl");
        if let Some(contents) = template {
            fs::write(&template_path, contents).context("failed to write template")?;
        }
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).context("failed to create bin dir")?;
        Ok(Self {
            output: dir.path().join("etc").join("xray").join("config.json"),
            template: template_path,
            bin,
            dir,
        })
    }

    fn command(&self, path_var: &str) -> anyhow::Result<Command> {
        let mut cmd = Command::cargo_bin("xray-launcher")?;
        cmd.env_clear()
            .env("PATH", path_var)
            .env("LAUNCHER_TEMPLATE_PATH", &self.template)
            .env("LAUNCHER_CONFIG_PATH", &self.output)
            .current_dir(self.dir.path());
        Ok(cmd)
    }
}

#[cfg(unix)]
fn install_fake_xray(bin: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let script = bin.join("xray");
    fs::write(
        &script,
        "#!/bin/sh\necho \"args: $*\"\ncat \"$3\"\nexit \"${FAKE_XRAY_EXIT:-0}\"\n",
    )
    .context("failed to write fake xray")?;
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
        .context("failed to chmod fake xray")?;
    Ok(())
}

#[test]
fn missing_template_fails_before_writing() -> anyhow::Result<()> {
    let fx = Fixture::new(None)?;
    let path_var = fx.bin.display().to_string();

    let output = fx.command(&path_var)?.output()?;

    assert_eq!(output.status.code(), Some(66));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read template"), "stderr: {stderr}");
    assert!(stderr.contains("read_template"), "stderr: {stderr}");
    assert!(!fx.output.exists());
    Ok(())
}

#[test]
fn missing_binary_fails_after_writing_config() -> anyhow::Result<()> {
    let fx = Fixture::new(Some(SAMPLE.as_bytes()))?;
    let path_var = fx.bin.display().to_string();

    let output = fx.command(&path_var)?.env("USER_ID", "abc-123").output()?;

    assert_eq!(output.status.code(), Some(127));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xray binary not found in PATH"), "stderr: {stderr}");
    assert_eq!(
        fs::read_to_string(&fx.output)?,
        r#"{"id":"abc-123","path":"/ws"}"#
    );
    Ok(())
}

#[test]
fn same_template_and_output_is_a_config_error() -> anyhow::Result<()> {
    let fx = Fixture::new(Some(SAMPLE.as_bytes()))?;
    let path_var = fx.bin.display().to_string();

    let output = fx
        .command(&path_var)?
        .env("LAUNCHER_CONFIG_PATH", &fx.template)
        .output()?;

    assert_eq!(output.status.code(), Some(78));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration invalid"), "stderr: {stderr}");

    assert_eq!(fs::read_to_string(&fx.template)?, SAMPLE);
    Ok(())
}

#[cfg(unix)]
#[test]
fn hands_off_to_xray_with_rendered_config() -> anyhow::Result<()> {
    let fx = Fixture::new(Some(SAMPLE.as_bytes()))?;
    install_fake_xray(&fx.bin)?;
    let path_var = format!("{}:/usr/bin:/bin", fx.bin.display());

    let output = fx.command(&path_var)?.env("UUID", "legacy-id").output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        format!(
            "args: run -config {}\n{{\"id\":\"legacy-id\",\"path\":\"/ws\"}}",
            fx.output.display()
        )
    );

    // The exit status is xray's, whether it was exec'd or supervised.
    let output = fx.command(&path_var)?.env("FAKE_XRAY_EXIT", "7").output()?;
    assert_eq!(output.status.code(), Some(7));
    Ok(())
}

#[cfg(unix)]
#[test]
fn non_utf8_environment_does_not_abort() -> anyhow::Result<()> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fx = Fixture::new(Some(SAMPLE.as_bytes()))?;
    let path_var = fx.bin.display().to_string();

    let output = fx
        .command(&path_var)?
        .env("LANG_JUNK", OsStr::from_bytes(b"caf\xe9"))
        .env("USER_ID", "abc-123")
        .output()?;

    // Rendering succeeds; the run then stops at the missing binary.
    assert_eq!(output.status.code(), Some(127));
    assert_eq!(
        fs::read_to_string(&fx.output)?,
        r#"{"id":"abc-123","path":"/ws"}"#
    );
    Ok(())
}

#[test]
fn latin1_template_is_rendered_byte_for_byte() -> anyhow::Result<()> {
    let fx = Fixture::new(Some(&b"{\"id\":\"__USER_ID__\"} # caf\xe9\n"[..]))?;
    let path_var = fx.bin.display().to_string();

    let output = fx.command(&path_var)?.output()?;

    assert_eq!(output.status.code(), Some(127));
    assert_eq!(fs::read(&fx.output)?, b"{\"id\":\"changeme\"} # caf\xe9\n".to_vec());
    Ok(())
}
