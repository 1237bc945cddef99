//! Compose-stack operations via the `docker compose` CLI.
//!
//! Compose has no stable daemon API, so these operations shell out to the
//! compose binary and capture its output. Non-zero exits surface as
//! [`EngineError::Compose`] carrying the captured stderr.

use crate::error::{EngineError, Result};
use serde::Serialize;
use tokio::process::Command;

/// Captured output of one compose invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ComposeOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runner for `docker compose` subcommands.
#[derive(Debug, Clone)]
pub struct ComposeRunner {
    program: String,
    base_args: Vec<String>,
}

impl Default for ComposeRunner {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            base_args: vec!["compose".to_string()],
        }
    }
}

impl ComposeRunner {
    /// Runner for the `docker compose` plugin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a runner from a whitespace-separated command, e.g.
    /// `docker compose` or a standalone `docker-compose`.
    pub fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_else(|| "docker".to_string());
        let base_args: Vec<String> = parts.collect();
        if base_args.is_empty() && program == "docker" {
            return Self::default();
        }
        Self { program, base_args }
    }

    /// Bring a stack up detached: `compose -f <file> up -d`.
    pub async fn up(&self, file: &str) -> Result<ComposeOutput> {
        self.run(&Self::file_args(file, &["up", "-d"])).await
    }

    /// Tear a stack down: `compose -f <file> down`.
    pub async fn down(&self, file: &str) -> Result<ComposeOutput> {
        self.run(&Self::file_args(file, &["down"])).await
    }

    /// List stack services: `compose -f <file> ps`.
    pub async fn ps(&self, file: &str) -> Result<ComposeOutput> {
        self.run(&Self::file_args(file, &["ps"])).await
    }

    /// Assemble `-f <file> <subcommand...>`.
    fn file_args(file: &str, subcommand: &[&str]) -> Vec<String> {
        let mut args = vec!["-f".to_string(), file.to_string()];
        args.extend(subcommand.iter().map(|s| s.to_string()));
        args
    }

    async fn run(&self, args: &[String]) -> Result<ComposeOutput> {
        tracing::info!(
            program = %self.program,
            args = ?args,
            "Running compose command"
        );
        let output = Command::new(&self.program)
            .args(&self.base_args)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let status = output.status.code().unwrap_or(-1);
            tracing::error!(status, stderr = %stderr.trim(), "Compose command failed");
            return Err(EngineError::Compose {
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        tracing::debug!(stdout_len = stdout.len(), "Compose command succeeded");
        Ok(ComposeOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runner_uses_plugin_form() {
        let runner = ComposeRunner::new();
        assert_eq!(runner.program, "docker");
        assert_eq!(runner.base_args, vec!["compose".to_string()]);
    }

    #[test]
    fn test_from_command_standalone_binary() {
        let runner = ComposeRunner::from_command("docker-compose");
        assert_eq!(runner.program, "docker-compose");
        assert!(runner.base_args.is_empty());
    }

    #[test]
    fn test_from_command_plugin_form() {
        let runner = ComposeRunner::from_command("docker compose");
        assert_eq!(runner.program, "docker");
        assert_eq!(runner.base_args, vec!["compose".to_string()]);
    }

    #[test]
    fn test_from_command_bare_docker_falls_back_to_plugin() {
        let runner = ComposeRunner::from_command("docker");
        assert_eq!(runner.base_args, vec!["compose".to_string()]);
    }

    #[test]
    fn test_file_args_assembly() {
        let args = ComposeRunner::file_args("stack.yml", &["up", "-d"]);
        assert_eq!(args, vec!["-f", "stack.yml", "up", "-d"]);
    }

    #[tokio::test]
    #[ignore = "requires Docker with the compose plugin"]
    async fn test_ps_on_missing_file_fails() {
        let runner = ComposeRunner::new();
        let err = runner.ps("/nonexistent/compose.yml").await.unwrap_err();
        match err {
            EngineError::Compose { status, .. } => assert_ne!(status, 0),
            other => panic!("expected Compose error, got {other}"),
        }
    }
}
