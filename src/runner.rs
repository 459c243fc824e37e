//! Host pipeline runner primitives.
//!
//! Everything dredge does to its surroundings goes through the
//! [`Runner`] trait: reading step inputs, registering log masks,
//! setting step outputs, and exporting environment variables. The
//! concrete [`GithubRunner`] speaks the GitHub Actions conventions
//! (INPUT_* variables, `::add-mask::` workflow commands, and the
//! GITHUB_OUTPUT / GITHUB_ENV command files).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{ConfigError, Result};

/// Side-effecting primitives of the hosting CI runner.
///
/// The pipeline never touches the process environment or stdout
/// directly, so tests can substitute a recording fake.
pub trait Runner {
    /// Read a declared step input, if set.
    fn input(&self, name: &str) -> Option<String>;

    /// The repository this run belongs to, if the runner exposes one.
    fn repository(&self) -> Option<String>;

    /// Register a literal so the runner redacts it from all future log
    /// output.
    fn mask(&mut self, literal: &str) -> Result<()>;

    /// Set a named step output visible to downstream steps.
    fn set_output(&mut self, name: &str, value: &str) -> Result<()>;

    /// Export an environment variable to downstream steps.
    fn export_env(&mut self, name: &str, value: &str) -> Result<()>;
}

/// GitHub Actions runner bindings.
///
/// Workflow commands are written to an injected stream (stdout in
/// production) and outputs/env exports are appended to the command
/// files the runner provides.
pub struct GithubRunner {
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    commands: Box<dyn Write + Send>,
}

impl GithubRunner {
    /// Build a runner from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
            std::env::var_os("GITHUB_ENV").map(PathBuf::from),
            Box::new(std::io::stdout()),
        )
    }

    /// Build a runner with explicit command files and command stream.
    pub fn new(
        output_file: Option<PathBuf>,
        env_file: Option<PathBuf>,
        commands: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            output_file,
            env_file,
            commands,
        }
    }
}

impl Runner for GithubRunner {
    fn input(&self, name: &str) -> Option<String> {
        let var = format!("INPUT_{}", name.to_uppercase().replace(' ', "_"));
        std::env::var(var).ok().filter(|v| !v.is_empty())
    }

    fn repository(&self) -> Option<String> {
        std::env::var("GITHUB_REPOSITORY").ok().filter(|v| !v.is_empty())
    }

    fn mask(&mut self, literal: &str) -> Result<()> {
        writeln!(self.commands, "::add-mask::{}", escape_data(literal))?;
        self.commands.flush()?;
        trace!(len = literal.len(), "registered mask");
        Ok(())
    }

    fn set_output(&mut self, name: &str, value: &str) -> Result<()> {
        let path = self
            .output_file
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvironment("GITHUB_OUTPUT".to_string()))?;
        append_command_file(path, name, value)?;
        trace!(output = name, "set step output");
        Ok(())
    }

    fn export_env(&mut self, name: &str, value: &str) -> Result<()> {
        let path = self
            .env_file
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvironment("GITHUB_ENV".to_string()))?;
        append_command_file(path, name, value)?;
        trace!(var = name, "exported environment variable");
        Ok(())
    }
}

/// Escape workflow-command data the way the runner expects.
fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Append `name=value` to a GitHub command file.
///
/// Multi-line values use the heredoc form with a delimiter that
/// provably does not occur in the value.
fn append_command_file(path: &Path, name: &str, value: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    if value.contains('\n') || value.contains('\r') {
        let delimiter = heredoc_delimiter(value);
        writeln!(file, "{}<<{}", name, delimiter)?;
        writeln!(file, "{}", value)?;
        writeln!(file, "{}", delimiter)?;
    } else {
        writeln!(file, "{}={}", name, value)?;
    }

    Ok(())
}

fn heredoc_delimiter(value: &str) -> String {
    let mut delimiter = String::from("DREDGE_EOF");
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    delimiter
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    /// A Write sink whose contents remain inspectable after the runner
    /// takes ownership of the boxed writer.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mask_emits_workflow_command() {
        let sink = SharedBuf::default();
        let mut runner = GithubRunner::new(None, None, Box::new(sink.clone()));

        runner.mask("hunter2").unwrap();
        runner.mask("multi\nline").unwrap();

        assert_eq!(
            sink.contents(),
            "::add-mask::hunter2\n::add-mask::multi%0Aline\n"
        );
    }

    #[test]
    fn test_escape_data_covers_command_metacharacters() {
        assert_eq!(escape_data("a%b"), "a%25b");
        assert_eq!(escape_data("a\nb"), "a%0Ab");
        assert_eq!(escape_data("a\rb"), "a%0Db");
    }

    #[test]
    fn test_set_output_single_line() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");
        let mut runner =
            GithubRunner::new(Some(out.clone()), None, Box::new(Vec::new()));

        runner.set_output("TOKEN", "abc123").unwrap();
        assert_eq!(read(&out), "TOKEN=abc123\n");
    }

    #[test]
    fn test_set_output_multiline_uses_heredoc() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");
        let mut runner =
            GithubRunner::new(Some(out.clone()), None, Box::new(Vec::new()));

        runner.set_output("PEM", "line1\nline2").unwrap();
        let contents = read(&out);
        assert_eq!(contents, "PEM<<DREDGE_EOF\nline1\nline2\nDREDGE_EOF\n");
    }

    #[test]
    fn test_heredoc_delimiter_avoids_collision() {
        let d = heredoc_delimiter("xx DREDGE_EOF xx");
        assert_eq!(d, "DREDGE_EOF_");
        let d2 = heredoc_delimiter("DREDGE_EOF and DREDGE_EOF_");
        assert_eq!(d2, "DREDGE_EOF__");
    }

    #[test]
    fn test_outputs_append_in_order() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("output");
        let mut runner =
            GithubRunner::new(Some(out.clone()), None, Box::new(Vec::new()));

        runner.set_output("A", "1").unwrap();
        runner.set_output("B", "2").unwrap();
        assert_eq!(read(&out), "A=1\nB=2\n");
    }

    #[test]
    fn test_set_output_without_command_file_fails() {
        let mut runner = GithubRunner::new(None, None, Box::new(Vec::new()));
        let err = runner.set_output("A", "1").unwrap_err();
        assert!(err.to_string().contains("GITHUB_OUTPUT"));
    }

    #[test]
    fn test_export_env_writes_env_file() {
        let dir = tempdir().unwrap();
        let env = dir.path().join("env");
        let mut runner =
            GithubRunner::new(None, Some(env.clone()), Box::new(Vec::new()));

        runner.export_env("API_KEY", "s3cr3t").unwrap();
        assert_eq!(read(&env), "API_KEY=s3cr3t\n");
    }
}
