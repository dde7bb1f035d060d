//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{IndexStore, INDEX_FILE};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&Path>) -> anyhow::Result<()> {
    Output::header("tubeqa Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_check = check_ytdlp(&settings.captions.ytdlp_path);
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("API Configuration").bold());
    for env in settings.required_key_envs() {
        let key_check = check_api_key(env);
        key_check.print();
        checks.push(key_check);
    }
    Output::kv("Embedding model", &settings.embedding.model);
    Output::kv("Answer model", &settings.llm.model);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    let chunking_check = match settings.chunking_config() {
        Ok(c) => CheckResult::ok(
            "Chunking",
            &format!("size {}, overlap {}", c.chunk_size, c.chunk_overlap),
        ),
        Err(e) => CheckResult::error(
            "Chunking",
            &e.to_string(),
            "chunk_overlap must be smaller than chunk_size",
        ),
    };
    chunking_check.print();
    checks.push(chunking_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using tubeqa.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! tubeqa is ready to use.");
    }

    Ok(())
}

/// Check that yt-dlp runs.
fn check_ytdlp(program: &str) -> CheckResult {
    match Command::new(program).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok("yt-dlp", &version)
        }
        Ok(_) => CheckResult::error("yt-dlp", "installed but not working", install_hint_ytdlp()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error("yt-dlp", &format!("{} not found", program), install_hint_ytdlp())
        }
        Err(e) => CheckResult::error("yt-dlp", &format!("error: {}", e), install_hint_ytdlp()),
    }
}

/// Check that an API key variable is set, showing only its edges.
fn check_api_key(env: &str) -> CheckResult {
    let hint = format!("Set with: export {}='...'", env);
    match std::env::var(env) {
        Ok(key) if key.is_empty() => CheckResult::error(env, "empty", &hint),
        Ok(key) if key.chars().count() > 12 => {
            let head: String = key.chars().take(4).collect();
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            CheckResult::ok(env, &format!("configured ({}...{})", head, tail))
        }
        Ok(_) => CheckResult::warning(env, "set but unusually short", "Check the key value"),
        Err(_) => CheckResult::error(env, "not set", &hint),
    }
}

/// Check data and index directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let index_dir = settings.index_dir();
    if !index_dir.exists() {
        results.push(CheckResult::warning(
            "Index directory",
            &format!("{} (not created yet)", index_dir.display()),
            "Indexes are created on the first question about a video",
        ));
        return results;
    }

    match IndexStore::new(&index_dir).and_then(|store| store.list()) {
        Ok(videos) => {
            let bytes: u64 = videos
                .iter()
                .filter_map(|v| std::fs::metadata(index_dir.join(v.video_id.as_str()).join(INDEX_FILE)).ok())
                .map(|m| m.len())
                .sum();
            results.push(CheckResult::ok(
                "Index directory",
                &format!(
                    "{} ({} videos, {})",
                    index_dir.display(),
                    videos.len(),
                    format_size(bytes)
                ),
            ));
        }
        Err(e) => results.push(CheckResult::error(
            "Index directory",
            &format!("{}: {}", index_dir.display(), e),
            "Check permissions on the index directory",
        )),
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&Path>) -> CheckResult {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Settings::default_config_path);
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: tubeqa config init",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_unset_key_is_error() {
        let result = check_api_key("TUBEQA_DOCTOR_TEST_UNSET");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.message, "not set");
    }

    #[test]
    fn test_missing_index_dir_is_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().into_owned();
        settings.index.dir = dir.path().join("missing").to_string_lossy().into_owned();

        let results = check_directories(&settings);
        assert_eq!(results[0].status, CheckStatus::Ok);
        assert_eq!(results[1].status, CheckStatus::Warning);
    }
}
