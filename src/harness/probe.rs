//! Evaluation of declarative probes against the local system.

use std::fs;
use std::io::ErrorKind;
use std::process::{Command, Stdio};

use super::types::ProbeSpec;
use crate::poll::ProbeError;

impl ProbeSpec {
    /// Evaluate the probe once.
    ///
    /// A command that cannot be found is fatal; other spawn failures and
    /// unreadable files are transient.
    pub fn evaluate(&self) -> Result<bool, ProbeError> {
        match self {
            ProbeSpec::Command { program, args } => run_command(program, args),
            ProbeSpec::FileExists { path } => Ok(path.exists()),
            ProbeSpec::FileContains { path, needle } => match fs::read_to_string(path) {
                Ok(content) => Ok(content.contains(needle.as_str())),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
                Err(err) => Err(ProbeError::transient(format!(
                    "failed to read {}: {}",
                    path.display(),
                    err
                ))),
            },
        }
    }

    /// Short human-readable label
    pub fn label(&self) -> String {
        match self {
            ProbeSpec::Command { program, args } if args.is_empty() => format!("`{}` succeeds", program),
            ProbeSpec::Command { program, args } => format!("`{} {}` succeeds", program, args.join(" ")),
            ProbeSpec::FileExists { path } => format!("{} exists", path.display()),
            ProbeSpec::FileContains { path, needle } => {
                format!("{} contains {:?}", path.display(), needle)
            }
        }
    }
}

fn run_command(program: &str, args: &[String]) -> Result<bool, ProbeError> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) => Ok(status.success()),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(ProbeError::fatal(format!("command not found: {}", program)))
        }
        Err(err) => Err(ProbeError::transient(format!("failed to run {}: {}", program, err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_probes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.log");

        let exists = ProbeSpec::FileExists { path: path.clone() };
        let contains = ProbeSpec::FileContains {
            path: path.clone(),
            needle: "ready".to_string(),
        };
        assert_eq!(exists.evaluate(), Ok(false));
        assert_eq!(contains.evaluate(), Ok(false));

        fs::write(&path, "starting\n").unwrap();
        assert_eq!(exists.evaluate(), Ok(true));
        assert_eq!(contains.evaluate(), Ok(false));

        fs::write(&path, "starting\nready\n").unwrap();
        assert_eq!(contains.evaluate(), Ok(true));
    }

    #[test]
    fn test_missing_command_is_fatal() {
        let probe = ProbeSpec::Command {
            program: "flowpoint-definitely-missing-binary".to_string(),
            args: vec![],
        };
        assert!(matches!(probe.evaluate(), Err(ProbeError::Fatal(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exit_status() {
        let ok = ProbeSpec::Command {
            program: "true".to_string(),
            args: vec![],
        };
        let fail = ProbeSpec::Command {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "exit 3".to_string()],
        };
        assert_eq!(ok.evaluate(), Ok(true));
        assert_eq!(fail.evaluate(), Ok(false));
    }

    #[test]
    fn test_labels() {
        let probe = ProbeSpec::Command {
            program: "curl".to_string(),
            args: vec!["-sf".to_string(), "localhost".to_string()],
        };
        assert_eq!(probe.label(), "`curl -sf localhost` succeeds");
    }
}
