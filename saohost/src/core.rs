//! Task engine shared by the CLI and tests.
//! Processes are only spawned through the [`CommandRunner`] it is given.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::fsutil::{ensure_dir, remove_path, RemoveOptions};
use crate::kicad::{
    locate_kicad_cli, CommandRunner, Invocation, KicadCli, OutputTarget, PcbPdfOptions,
    RenderOptions, Step, EXIT_CODE_VIOLATIONS, KICAD_CLI_ENV,
};
use crate::layout::OutputLayout;
use crate::render::{svg_to_png, PngSizing};

#[derive(Debug, thiserror::Error)]
pub enum SaoHostError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("kicad-cli not found")]
    KicadNotFound,
    #[error("Failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{} violations found in {}. Check {} for details.",
        .step.subject(),
        .step.checked_design(),
        .report.display()
    )]
    Violations { step: Step, report: PathBuf },
    #[error("{} failed with an unexpected exit code ({})", .step.subject(), .code)]
    UnexpectedExit { step: Step, code: i32 },
    #[error("Cannot remove directory '{}' without recursive", .0.display())]
    IsDirectory(PathBuf),
    #[error("No such file or directory: '{}'", .0.display())]
    NotFound(PathBuf),
    #[error("Invalid glob pattern: {0}")]
    Glob(String),
    #[error("Render error: {0}")]
    Render(String),
}

impl SaoHostError {
    /// Process exit code for this failure. KiCad's own code is passed through.
    pub fn exit_code(&self) -> i32 {
        match self {
            SaoHostError::Violations { .. } => EXIT_CODE_VIOLATIONS,
            SaoHostError::UnexpectedExit { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// What `clean` removes besides the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    pub kicad_backups: bool,
    pub kicad_cache_files: bool,
    pub all: bool,
}

impl CleanOptions {
    pub fn targets(&self, layout: &OutputLayout) -> Vec<PathBuf> {
        let mut paths = vec![layout.output.clone()];
        if self.kicad_backups || self.all {
            paths.push(layout.kicad_backups.clone());
        }
        if self.kicad_cache_files || self.all {
            paths.push(layout.fp_info_cache.clone());
        }
        paths
    }
}

/// A named task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Env,
    Check,
    Release,
    Clean(CleanOptions),
}

/// Name and one-line description of every task, in listing order.
pub const TASKS: &[(&str, &str)] = &[
    ("check", "Run KiCad checks."),
    ("clean", "Remove generated files."),
    ("env", "Print project environment info."),
    ("release", "Generate release files."),
];

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Env => "env",
            Task::Check => "check",
            Task::Release => "release",
            Task::Clean(_) => "clean",
        }
    }

    /// Tasks that must run first.
    pub fn pre(&self) -> &'static [Task] {
        match self {
            Task::Release => &[Task::Env, Task::Check],
            _ => &[],
        }
    }
}

/// Expand prerequisites depth-first; each task appears once.
pub fn plan(tasks: &[Task]) -> Vec<Task> {
    fn visit(task: Task, out: &mut Vec<Task>) {
        if out.contains(&task) {
            return;
        }
        for pre in task.pre() {
            visit(*pre, out);
        }
        out.push(task);
    }

    let mut out = Vec::new();
    for task in tasks {
        visit(*task, &mut out);
    }
    out
}

/// Pick the explicit `kicad-cli` path: the environment wins over the config.
///
/// A relative config path with a directory part is taken relative to the
/// project root; a bare name is left for `PATH` lookup.
pub fn kicad_override(
    env: Option<OsString>,
    config: Option<&Path>,
    root: &Path,
) -> Option<PathBuf> {
    if let Some(value) = env.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(value));
    }
    let path = config?;
    if path.is_relative() && path.components().count() > 1 {
        Some(root.join(path))
    } else {
        Some(path.to_path_buf())
    }
}

/// A project directory with its configuration and derived paths.
#[derive(Debug, Clone)]
pub struct Project {
    pub config: ProjectConfig,
    pub layout: OutputLayout,
}

impl Project {
    pub fn new(root: &Path, config: ProjectConfig) -> Self {
        let layout = OutputLayout::new(root, &config);
        Self { config, layout }
    }

    /// Load `config_path`, or `saohost.toml` from `root` when not given.
    pub fn open(root: &Path, config_path: Option<&Path>) -> Result<Self, SaoHostError> {
        let config = match config_path {
            Some(path) => ProjectConfig::from_path(path)?,
            None => ProjectConfig::load(root)?,
        };
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.layout.root
    }
}

/// Runs tasks for one project through a [`CommandRunner`].
pub struct TaskEngine<R: CommandRunner> {
    project: Project,
    runner: R,
    kicad: Option<KicadCli>,
}

impl<R: CommandRunner> TaskEngine<R> {
    /// `kicad-cli` is resolved on first use from `KICAD_CLI`, the config,
    /// then the platform default.
    pub fn new(project: Project, runner: R) -> Self {
        Self {
            project,
            runner,
            kicad: None,
        }
    }

    pub fn with_kicad(project: Project, runner: R, kicad: KicadCli) -> Self {
        Self {
            project,
            runner,
            kicad: Some(kicad),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run tasks with their prerequisites.
    pub fn run_all(&mut self, tasks: &[Task]) -> Result<(), SaoHostError> {
        for task in plan(tasks) {
            self.run(task)?;
        }
        Ok(())
    }

    /// Run a single task without its prerequisites.
    pub fn run(&mut self, task: Task) -> Result<(), SaoHostError> {
        tracing::debug!("Running task {}", task.name());
        match task {
            Task::Env => self.env(),
            Task::Check => self.check(),
            Task::Release => self.release(),
            Task::Clean(options) => self.clean(options).map(|_| ()),
        }
    }

    fn kicad(&mut self) -> Result<KicadCli, SaoHostError> {
        if let Some(kicad) = &self.kicad {
            return Ok(kicad.clone());
        }
        let explicit = kicad_override(
            std::env::var_os(KICAD_CLI_ENV),
            self.project.config.kicad.cli.as_deref(),
            self.project.root(),
        );
        let kicad = KicadCli::new(locate_kicad_cli(explicit.as_deref())?);
        tracing::debug!("Using {}", kicad.program().display());
        self.kicad = Some(kicad.clone());
        Ok(kicad)
    }

    fn invoke(&mut self, invocation: Invocation) -> Result<(), SaoHostError> {
        tracing::info!("{}", invocation.step.label());
        if let Some(dir) = invocation.output.as_ref().and_then(|o| o.required_dir()) {
            ensure_dir(dir)?;
        }
        let code = self.runner.run(&invocation)?;
        match code {
            0 => Ok(()),
            EXIT_CODE_VIOLATIONS if invocation.step.reports_violations() => {
                let report = match invocation.output {
                    Some(OutputTarget::File(path)) => path,
                    _ => self.project.layout.output.clone(),
                };
                Err(SaoHostError::Violations {
                    step: invocation.step,
                    report,
                })
            }
            code => Err(SaoHostError::UnexpectedExit {
                step: invocation.step,
                code,
            }),
        }
    }

    /// Log project metadata and the KiCad version.
    pub fn env(&mut self) -> Result<(), SaoHostError> {
        let config = &self.project.config;
        tracing::info!(
            "{} ({} v{})",
            config.project.description,
            config.project.name,
            config.project.version_major
        );
        tracing::info!(
            "{} <{}>, {}",
            config.project.organization,
            config.project.organization_url,
            config.project.license
        );
        let parts = &config.parts;
        tracing::info!(
            "PCB {} Rev {}, schematic {} Rev {}, PCA {} Rev {}",
            parts.pcb.number,
            parts.pcb.rev,
            parts.sch.number,
            parts.sch.rev,
            parts.pca.number,
            parts.pca.rev
        );
        let kicad = self.kicad()?;
        self.invoke(kicad.version())
    }

    /// ERC on the schematic, then DRC on the PCB.
    pub fn check(&mut self) -> Result<(), SaoHostError> {
        let kicad = self.kicad()?;
        let layout = self.project.layout.clone();
        self.invoke(kicad.schematic_erc(&layout.schematic, &layout.erc_report))?;
        self.invoke(kicad.pcb_drc(&layout.pcb, &layout.drc_report))
    }

    /// Export every manufacturing artifact. Does not run `env` or `check`.
    pub fn release(&mut self) -> Result<(), SaoHostError> {
        let kicad = self.kicad()?;
        let layout = self.project.layout.clone();
        let config = self.project.config.clone();
        let release = &config.release;

        self.invoke(kicad.schematic_export_pdf(&layout.schematic, &layout.schematic_pdf))?;
        self.invoke(kicad.schematic_export_svg(&layout.schematic, &layout.schematic_svg_dir))?;
        svg_to_png(
            &layout.schematic_svg,
            &layout.schematic_png,
            PngSizing::Dpi(release.schematic_png_dpi),
            false,
        )?;
        svg_to_png(
            &layout.schematic_svg,
            &layout.schematic_thumbnail,
            PngSizing::MaxDimension(release.schematic_thumbnail_px),
            false,
        )?;
        self.invoke(kicad.schematic_export_bom(
            &layout.schematic,
            &layout.bom,
            &config.kicad.bom_preset,
            &config.kicad.bom_format_preset,
        ))?;

        self.invoke(kicad.pcb_export_gerbers(&layout.pcb, &layout.gerbers, &release.gerber_layers))?;
        if release.odb {
            self.invoke(kicad.pcb_export_odb(&layout.pcb, &layout.odb))?;
        } else {
            tracing::debug!("Skipping ODB++ export");
        }
        self.invoke(kicad.pcb_export_drill(&layout.pcb, &layout.drill_files))?;
        self.invoke(kicad.pcb_export_ipcd356(&layout.pcb, &layout.ipcd356))?;
        self.invoke(kicad.pcb_export_pdf(
            &layout.pcb,
            &layout.pcb_pdf,
            &release.pdf_front_layers,
            &PcbPdfOptions::default(),
        ))?;
        self.invoke(kicad.pcb_export_pdf(
            &layout.pcb,
            &layout.pcb_pdf,
            &release.pdf_back_layers,
            &PcbPdfOptions {
                mirror: true,
                ..PcbPdfOptions::default()
            },
        ))?;
        self.invoke(kicad.pcb_export_pos(&layout.pcb, &layout.position))?;

        if release.renders {
            for (side, perspective) in [("top", true), ("bottom", true), ("top", false), ("bottom", false)] {
                let options = RenderOptions {
                    width: 1000,
                    height: 800,
                    side: side.to_string(),
                    perspective,
                    ..RenderOptions::default()
                };
                let png = layout.pca_render(&config, side, perspective);
                self.invoke(kicad.pcb_render(&layout.pcb, &png, &options))?;
            }
        } else {
            tracing::debug!("Skipping PCB renders");
        }

        tracing::info!("Release files written to {}", layout.output.display());
        Ok(())
    }

    /// Remove generated files. Missing paths are not an error.
    pub fn clean(&mut self, options: CleanOptions) -> Result<Vec<PathBuf>, SaoHostError> {
        let mut removed = Vec::new();
        for path in options.targets(&self.project.layout) {
            removed.extend(remove_path(&path, RemoveOptions::recursive_force())?);
        }
        for path in &removed {
            tracing::info!("Removed {}", path.display());
        }
        Ok(removed)
    }
}
