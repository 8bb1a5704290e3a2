//! `JobSource` backed by the DNAnexus `dx` command-line tool.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use super::{JobQuery, JobSource};
use crate::error::SourceError;

/// Runs `dx` (or a compatible program) as a child process per call.
#[derive(Debug, Clone)]
pub struct DxCli {
    program: String,
}

impl DxCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn list_args(query: &JobQuery) -> Vec<String> {
        let mut args = vec![
            "find".to_string(),
            "jobs".to_string(),
            "-n".to_string(),
            query.limit.to_string(),
            "--show-outputs".to_string(),
        ];
        if let Some(owner) = query.owner.as_deref().filter(|o| !o.is_empty()) {
            args.push("--user".to_string());
            args.push(owner.to_string());
        }
        args
    }

    fn watch_args(job_id: &str, attempt: Option<u32>) -> Vec<String> {
        let mut args = vec!["watch".to_string(), job_id.to_string()];
        if let Some(n) = attempt {
            args.push("--try".to_string());
            args.push(n.to_string());
        }
        args
    }

    fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<Output, SourceError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!(program = %self.program, ?args, "running job source");
        cmd.output().map_err(|source| SourceError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    /// Stdout as text. Exit status is only logged: `dx` signals "nothing here"
    /// with empty output, which callers interpret.
    fn stdout_text(&self, args: &[String], output: Output) -> String {
        if !output.status.success() {
            tracing::debug!(
                program = %self.program,
                ?args,
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "job source exited unsuccessfully"
            );
        }
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

impl Default for DxCli {
    fn default() -> Self {
        Self::new("dx")
    }
}

impl JobSource for DxCli {
    fn list_jobs(&self, query: &JobQuery) -> Result<String, SourceError> {
        let args = Self::list_args(query);
        let output = self.run(&args, None)?;
        Ok(self.stdout_text(&args, output))
    }

    fn watch(&self, job_id: &str, attempt: Option<u32>) -> Result<String, SourceError> {
        let args = Self::watch_args(job_id, attempt);
        let output = self.run(&args, None)?;
        Ok(self.stdout_text(&args, output))
    }

    fn download(&self, reference: &str, dest_dir: &Path) -> Result<(), SourceError> {
        let args = vec![
            "download".to_string(),
            reference.to_string(),
            "--overwrite".to_string(),
        ];
        let output = self.run(&args, Some(dest_dir))?;
        if output.status.success() {
            return Ok(());
        }
        Err(SourceError::Failed {
            command: format!("{} {}", self.program, args.join(" ")),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_args_without_owner() {
        let q = JobQuery {
            limit: 100,
            owner: None,
        };
        assert_eq!(
            DxCli::list_args(&q),
            ["find", "jobs", "-n", "100", "--show-outputs"]
        );
    }

    #[test]
    fn list_args_with_owner() {
        let q = JobQuery {
            limit: 20,
            owner: Some("alice".to_string()),
        };
        assert_eq!(
            DxCli::list_args(&q),
            ["find", "jobs", "-n", "20", "--show-outputs", "--user", "alice"]
        );
    }

    #[test]
    fn list_args_ignore_empty_owner() {
        let q = JobQuery {
            limit: 5,
            owner: Some(String::new()),
        };
        assert!(!DxCli::list_args(&q).contains(&"--user".to_string()));
    }

    #[test]
    fn watch_args_with_and_without_attempt() {
        assert_eq!(DxCli::watch_args("job-1", None), ["watch", "job-1"]);
        assert_eq!(
            DxCli::watch_args("job-1", Some(2)),
            ["watch", "job-1", "--try", "2"]
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dx = DxCli::new("joblog-test-no-such-program");
        let q = JobQuery {
            limit: 1,
            owner: None,
        };
        match dx.list_jobs(&q) {
            Err(SourceError::Spawn { program, .. }) => {
                assert_eq!(program, "joblog-test-no-such-program")
            }
            other => panic!("expected Spawn error, got {other:?}"),
        }
    }
}
