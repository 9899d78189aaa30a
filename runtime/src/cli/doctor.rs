//! Environment readiness check: browser discovery, launch test and config.

use crate::cli::output::{self, Styled};
use crate::config::ScrapeConfig;
use crate::renderer::chromium::find_chromium;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Run the doctor checks. Returns the process exit code.
pub fn run(config_path: Option<&Path>) -> Result<i32> {
    let resolved = ScrapeConfig::resolve_path(config_path);
    let config = ScrapeConfig::load(resolved.as_deref());
    let chromium = match &config {
        Ok(c) => c.browser.chromium_path.clone().or_else(find_chromium),
        Err(_) => find_chromium(),
    };
    let version = chromium.as_deref().and_then(chromium_version);
    let no_sandbox = config.as_ref().map(|c| c.browser.no_sandbox).unwrap_or(false);
    let launch = chromium
        .as_deref()
        .map(|p| headless_launch(p, no_sandbox));

    let ready = config.is_ok() && matches!(launch, Some(Ok(_)));

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "ready": ready,
            "chromium": chromium.as_ref().map(|p| p.display().to_string()),
            "chromium_version": version,
            "launch_ms": launch.as_ref().and_then(|r| r.as_ref().ok()),
            "launch_error": launch.as_ref().and_then(|r| r.as_ref().err()).map(|e| e.to_string()),
            "config_path": resolved.as_ref().map(|p| p.display().to_string()),
            "config_error": config.as_ref().err().map(|e| format!("{e:#}")),
        }));
        return Ok(if ready { 0 } else { 1 });
    }

    let s = Styled::new();
    eprintln!();
    eprintln!("  {}", s.bold("hound-harvest doctor"));
    eprintln!();

    match &chromium {
        Some(path) => {
            let ver = version.as_deref().unwrap_or("unknown version");
            output::print_check(
                s.ok_sym(),
                "Chromium:",
                &format!("{ver} at {}", path.display()),
            );
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install Chrome or Chromium, or set HOUND_CHROMIUM_PATH");
        }
    }

    match &launch {
        Some(Ok(ms)) => output::print_check(
            s.ok_sym(),
            "Headless test:",
            &format!("launched and closed in {ms}ms"),
        ),
        Some(Err(e)) => {
            output::print_check(s.fail_sym(), "Headless test:", &format!("FAILED: {e}"));
            if !no_sandbox {
                output::print_detail("In a container? Try HOUND_NO_SANDBOX=1");
            }
        }
        None => {}
    }

    let config_label = resolved
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in defaults".to_string());
    match &config {
        Ok(_) => output::print_check(s.ok_sym(), "Config:", &config_label),
        Err(e) => {
            output::print_check(s.fail_sym(), "Config:", &config_label);
            output::print_detail(&format!("{e:#}"));
        }
    }
    if let Some(default) = ScrapeConfig::default_path() {
        if resolved.is_none() {
            output::print_detail(&s.dim(&format!("optional: {}", default.display())));
        }
    }

    eprintln!();
    if ready {
        eprintln!("  {} Ready to scrape", s.ok_sym());
    } else {
        eprintln!("  {} Not ready", s.fail_sym());
    }
    Ok(if ready { 0 } else { 1 })
}

fn chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
    } else {
        None
    }
}

fn headless_launch(path: &Path, no_sandbox: bool) -> Result<u64> {
    let start = Instant::now();
    let mut cmd = Command::new(PathBuf::from(path));
    cmd.args(["--headless", "--disable-gpu", "--dump-dom", "about:blank"]);
    if no_sandbox {
        cmd.arg("--no-sandbox");
    }
    let output = cmd
        .output()
        .map_err(|e| anyhow::anyhow!("failed to launch: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let first = stderr.lines().next().unwrap_or("unknown error");
        anyhow::bail!("{first}");
    }
    Ok(start.elapsed().as_millis() as u64)
}
