use std::path::Path;
use std::process::Command;

use crate::core::error::SyncError;

pub const DEFAULT_UTILITY: &str = "canvassyncer";

/// The sync utility's command line, minus the `-p <config>` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for UtilityCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_UTILITY.to_string(),
            args: Vec::new(),
        }
    }
}

impl UtilityCommand {
    /// Parses a shell-style command line such as `python3 -m canvassyncer`.
    pub fn parse(line: &str) -> Result<Self, SyncError> {
        let mut tokens = shell_words::split(line)
            .map_err(|err| SyncError::InvalidUtility {
                command: line.to_string(),
                message: err.to_string(),
            })?
            .into_iter();

        let program = tokens.next().ok_or_else(|| SyncError::InvalidUtility {
            command: line.to_string(),
            message: "empty command".to_string(),
        })?;

        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn to_args(&self, config_path: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("-p".to_string());
        args.push(config_path.display().to_string());
        args
    }

    pub fn build(&self, config_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.to_args(config_path));
        cmd
    }

    /// The full command line, for log output.
    pub fn display(&self, config_path: &Path) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.to_args(config_path));
        shell_words::join(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_module_invocation() {
        let cmd = UtilityCommand::parse("python3 -m canvassyncer").unwrap();
        assert_eq!(cmd.program, "python3");
        assert_eq!(
            cmd.to_args(Path::new("/tmp/a.json")),
            vec!["-m", "canvassyncer", "-p", "/tmp/a.json"]
        );
    }

    #[test]
    fn quoted_paths_survive() {
        let cmd = UtilityCommand::parse(r#""/opt/my tools/canvassyncer""#).unwrap();
        assert_eq!(cmd.program, "/opt/my tools/canvassyncer");
        assert!(cmd.args.is_empty());
        assert_eq!(
            cmd.display(Path::new("c.json")),
            "'/opt/my tools/canvassyncer' -p c.json"
        );
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            UtilityCommand::parse("   "),
            Err(SyncError::InvalidUtility { .. })
        ));
        assert!(UtilityCommand::parse("python3 'unterminated").is_err());
    }

    #[test]
    fn default_is_plain_utility() {
        assert_eq!(
            UtilityCommand::default().to_args(Path::new("x.json")),
            vec!["-p", "x.json"]
        );
    }
}
