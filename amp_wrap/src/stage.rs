use amp_types::StopFlags;
use itertools::Itertools;
use shell_escape::escape;
use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

/// A point between two stages where the operator may ask the run to stop
/// so the intermediate reports can be reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    AfterQc,
    AfterDenoise,
}

impl Checkpoint {
    /// Whether `stop` asks the run to halt here.
    pub fn is_requested(self, stop: StopFlags) -> bool {
        match self {
            Checkpoint::AfterQc => stop.after_qc,
            Checkpoint::AfterDenoise => stop.after_denoise,
        }
    }
}

impl Display for Checkpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Checkpoint::AfterQc => "stopped after quality control",
            Checkpoint::AfterDenoise => "stopped after denoising",
        })
    }
}

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub program: String,
    pub args: Vec<OsString>,
    /// Files or directories the tool is expected to produce.
    pub outputs: Vec<PathBuf>,
    pub checkpoint: Option<Checkpoint>,
}

impl Stage {
    pub fn new(name: &'static str, program: impl Into<String>) -> Self {
        Stage {
            name,
            program: program.into(),
            args: Vec::new(),
            outputs: Vec::new(),
            checkpoint: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append `flag value`.
    pub fn opt(self, flag: &str, value: impl AsRef<OsStr>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Append `flag path` and declare `path` as an output.
    pub fn output(mut self, flag: &str, path: impl AsRef<Path>) -> Self {
        self.outputs.push(path.as_ref().to_path_buf());
        self.opt(flag, path.as_ref())
    }

    /// Declare an output the tool derives on its own.
    pub fn produces(mut self, path: impl AsRef<Path>) -> Self {
        self.outputs.push(path.as_ref().to_path_buf());
        self
    }

    pub fn checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// The invocation as a shell-quoted line, for logs and dry runs.
    pub fn command_line(&self) -> String {
        std::iter::once(escape(self.program.as_str().into()).into_owned())
            .chain(
                self.args
                    .iter()
                    .map(|a| escape(a.to_string_lossy()).into_owned()),
            )
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quotes_arguments() {
        let stage = Stage::new("import", "qiime")
            .args(["tools", "import"])
            .opt("--type", "SampleData[PairedEndSequencesWithQuality]")
            .output("--output-path", "/run 1/demux.qza");
        assert_eq!(
            stage.command_line(),
            "qiime tools import --type 'SampleData[PairedEndSequencesWithQuality]' \
             --output-path '/run 1/demux.qza'"
        );
        assert_eq!(stage.outputs, vec![PathBuf::from("/run 1/demux.qza")]);
    }

    #[test]
    fn test_checkpoint_flags() {
        let stop = StopFlags {
            after_qc: false,
            after_denoise: true,
        };
        assert!(!Checkpoint::AfterQc.is_requested(stop));
        assert!(Checkpoint::AfterDenoise.is_requested(stop));
    }
}
