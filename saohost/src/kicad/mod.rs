//! KiCad CLI integration
//!
//! Everything this crate asks of KiCad goes through `kicad-cli`. This module
//! finds the binary, builds one [`Invocation`] per command and hands it to a
//! [`CommandRunner`](runner::CommandRunner). The board files themselves are
//! never parsed here.

pub mod commands;
pub mod runner;

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::SaoHostError;

pub use commands::{KicadCli, PcbPdfOptions, RenderOptions};
pub use runner::{CommandRunner, ProcessRunner};

/// Environment variable that overrides `kicad-cli` discovery.
pub const KICAD_CLI_ENV: &str = "KICAD_CLI";

/// Exit code `kicad-cli` uses for ERC/DRC violations with `--exit-code-violations`.
pub const EXIT_CODE_VIOLATIONS: i32 = 5;

const MACOS_CANDIDATES: &[&str] = &[
    "/Applications/KiCad_9.0/KiCad.app/Contents/MacOS/kicad-cli",
    "/Applications/KiCad/KiCad.app/Contents/MacOS/kicad-cli",
];

/// Resolve the `kicad-cli` executable.
///
/// An explicit path wins. On macOS the application bundle is searched, newest
/// install first; elsewhere the binary is expected on `PATH`.
pub fn locate_kicad_cli(explicit: Option<&Path>) -> Result<PathBuf, SaoHostError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if cfg!(target_os = "macos") {
        return first_existing(MACOS_CANDIDATES).ok_or(SaoHostError::KicadNotFound);
    }
    Ok(PathBuf::from("kicad-cli"))
}

fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|p| PathBuf::from(*p))
        .find(|p| p.exists())
}

/// The kind of work a single `kicad-cli` call performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Version,
    Erc,
    Drc,
    SchematicPdf,
    SchematicSvg,
    SchematicBom,
    PcbGerbers,
    PcbOdb,
    PcbPdf,
    PcbDrill,
    PcbIpcd356,
    PcbPosition,
    PcbRender,
}

impl Step {
    /// Progress line logged before the command runs.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Version => "Checking KiCad version...",
            Step::Erc => "Running ERC on the schematic...",
            Step::Drc => "Running DRC on the PCB...",
            Step::SchematicPdf => "Exporting Schematic PDF...",
            Step::SchematicSvg => "Exporting Schematic SVG...",
            Step::SchematicBom => "Exporting assembly BOM...",
            Step::PcbGerbers => "Exporting Gerbers from the PCB...",
            Step::PcbOdb => "Exporting ODB++ from the PCB...",
            Step::PcbPdf => "Exporting PDF from the PCB...",
            Step::PcbDrill => "Exporting drill file from the PCB...",
            Step::PcbIpcd356 => "Exporting IPC-D-356 netlist from the PCB...",
            Step::PcbPosition => "Exporting position file from the PCB...",
            Step::PcbRender => "Generating render from the PCB...",
        }
    }

    /// Subject of the "failed with an unexpected exit code" message.
    pub fn subject(&self) -> &'static str {
        match self {
            Step::Version => "KiCad version check",
            Step::Erc => "ERC",
            Step::Drc => "DRC",
            Step::SchematicPdf => "PDF export from the schematic",
            Step::SchematicSvg => "SVG export from the schematic",
            Step::SchematicBom => "BOM export from the schematic",
            Step::PcbGerbers => "Gerber export from the PCB",
            Step::PcbOdb => "ODB++ export from the PCB",
            Step::PcbPdf => "PDF export from the PCB",
            Step::PcbDrill => "Drill file export from the PCB",
            Step::PcbIpcd356 => "IPC-D-356 netlist export from the PCB",
            Step::PcbPosition => "Position file export from the PCB",
            Step::PcbRender => "Render from the PCB",
        }
    }

    /// Rule checks report violations through a dedicated exit code.
    pub fn reports_violations(&self) -> bool {
        matches!(self, Step::Erc | Step::Drc)
    }

    /// What the violations were found in, for rule-check steps.
    pub fn checked_design(&self) -> &'static str {
        match self {
            Step::Erc => "the schematic",
            Step::Drc => "the PCB",
            _ => "the design",
        }
    }
}

/// One `kicad-cli` command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub step: Step,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub output: Option<OutputTarget>,
}

/// Where a command writes its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Dir(PathBuf),
}

impl OutputTarget {
    /// Directory that must exist before the command runs.
    pub fn required_dir(&self) -> Option<&Path> {
        match self {
            OutputTarget::File(path) => path.parent().filter(|p| !p.as_os_str().is_empty()),
            OutputTarget::Dir(path) => Some(path.as_path()),
        }
    }
}

impl Invocation {
    pub fn new(step: Step, program: &Path) -> Self {
        Self {
            step,
            program: program.to_path_buf(),
            args: Vec::new(),
            output: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `--<name>=<value>` as a single argv entry.
    pub fn opt(self, name: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        let mut arg = OsString::from(format!("--{}=", name));
        arg.push(value.as_ref());
        self.arg(arg)
    }

    pub fn flag_if(self, enabled: bool, flag: &str) -> Self {
        if enabled {
            self.arg(flag)
        } else {
            self
        }
    }

    pub fn writes_file(mut self, path: &Path) -> Self {
        self.output = Some(OutputTarget::File(path.to_path_buf()));
        self
    }

    pub fn writes_dir(mut self, path: &Path) -> Self {
        self.output = Some(OutputTarget::Dir(path.to_path_buf()));
        self
    }

    /// Arguments as UTF-8 (lossy), mostly for assertions and logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=,:+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}
