//! saohost - KiCad check and release tasks for the Raspberry Pi Pico SAO Host
//!
//! The board is described by KiCad project files; this crate drives
//! `kicad-cli` over them to run electrical and design rule checks and to
//! export the manufacturing package for a revision.
//!
//! # Quick Start
//!
//! ```no_run
//! use saohost::{Project, ProcessRunner, Task, TaskEngine};
//! use std::path::Path;
//!
//! let project = Project::open(Path::new("."), None).unwrap();
//! let mut engine = TaskEngine::new(project, ProcessRunner::default());
//! engine.run_all(&[Task::Release]).unwrap();
//! ```
//!
//! # Tasks
//!
//! - **env**: project metadata and KiCad version
//! - **check**: ERC on the schematic, DRC (with schematic parity) on the PCB
//! - **release**: schematic PDF/SVG/PNG, BOM, Gerbers, drill, IPC-D-356,
//!   PCB PDFs and position files; runs `env` and `check` first
//! - **clean**: remove generated output and, optionally, KiCad working files

pub mod config;
pub mod core;
pub mod fsutil;
pub mod kicad;
pub mod layout;
pub mod render;

// Re-export main types
pub use config::{PartNumber, ProjectConfig, CONFIG_FILE_NAME};
pub use crate::core::{kicad_override, plan, CleanOptions, Project, SaoHostError, Task, TaskEngine, TASKS};
pub use kicad::{CommandRunner, Invocation, KicadCli, OutputTarget, ProcessRunner, Step};
pub use layout::OutputLayout;
pub use render::{svg_to_png, PngSizing};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CleanOptions, CommandRunner, Invocation, Project, ProjectConfig, SaoHostError, Step, Task,
        TaskEngine,
    };
}
