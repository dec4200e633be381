//! Project metadata loaded from `saohost.toml`.
//!
//! Every table and key is optional; anything left out falls back to the
//! values for the current board revision.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::SaoHostError;

/// File name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "saohost.toml";

pub const DEFAULT_GERBER_LAYERS: &[&str] = &[
    "F.Cu",
    "B.Cu",
    "F.Paste",
    "B.Paste",
    "F.Silkscreen",
    "B.Silkscreen",
    "F.Mask",
    "B.Mask",
    "User.Drawings",
    "User.Comments",
    "Edge.Cuts",
    "F.Fab",
    "B.Fab",
    "User.1",
    "User.2",
];

pub const DEFAULT_PDF_FRONT_LAYERS: &[&str] = &[
    "F.Cu",
    "F.Paste",
    "F.Silkscreen",
    "F.Mask",
    "User.Drawings",
    "User.Comments",
    "Edge.Cuts",
    "F.Fab",
    "User.1",
];

pub const DEFAULT_PDF_BACK_LAYERS: &[&str] =
    &["B.Cu", "B.Paste", "B.Silkscreen", "B.Mask", "B.Fab", "User.2"];

fn to_strings(layers: &[&str]) -> Vec<String> {
    layers.iter().map(|s| s.to_string()).collect()
}

/// Full project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub project: ProjectInfo,
    pub parts: Parts,
    pub kicad: KicadSettings,
    pub release: ReleaseSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectInfo {
    /// Base name of the `.kicad_sch` / `.kicad_pcb` files.
    pub name: String,
    pub description: String,
    pub version_major: String,
    pub organization: String,
    pub organization_url: String,
    pub license: String,
}

impl Default for ProjectInfo {
    fn default() -> Self {
        Self {
            name: "RPi_Pico_SAO_Host".to_string(),
            description: "Raspberry Pi Pico SAO Host".to_string(),
            version_major: "2".to_string(),
            organization: "Common Ground Electronics".to_string(),
            organization_url: "https://cgnd.dev".to_string(),
            license: "CERN-OHL-P-2.0".to_string(),
        }
    }
}

/// A part number with its revision letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartNumber {
    pub number: String,
    pub rev: String,
}

impl PartNumber {
    pub fn new(number: &str, rev: &str) -> Self {
        Self {
            number: number.to_string(),
            rev: rev.to_string(),
        }
    }
}

/// Part numbers of the board, schematic and assembly.
///
/// Each `[parts.*]` table may set only `number` or only `rev`; the other key
/// keeps that part's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParts")]
pub struct Parts {
    pub pcb: PartNumber,
    pub sch: PartNumber,
    pub pca: PartNumber,
}

impl Default for Parts {
    fn default() -> Self {
        Self {
            pcb: PartNumber::new("100092", "A"),
            sch: PartNumber::new("100093", "A"),
            pca: PartNumber::new("100094", "A"),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPart {
    number: Option<String>,
    rev: Option<String>,
}

impl RawPart {
    fn over(self, default: PartNumber) -> PartNumber {
        PartNumber {
            number: self.number.unwrap_or(default.number),
            rev: self.rev.unwrap_or(default.rev),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawParts {
    pcb: RawPart,
    sch: RawPart,
    pca: RawPart,
}

impl From<RawParts> for Parts {
    fn from(raw: RawParts) -> Self {
        let defaults = Parts::default();
        Self {
            pcb: raw.pcb.over(defaults.pcb),
            sch: raw.sch.over(defaults.sch),
            pca: raw.pca.over(defaults.pca),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KicadSettings {
    /// Explicit `kicad-cli` path; skips platform discovery. Relative paths
    /// with a directory part resolve against the project directory.
    pub cli: Option<PathBuf>,
    pub bom_preset: String,
    pub bom_format_preset: String,
}

impl Default for KicadSettings {
    fn default() -> Self {
        Self {
            cli: None,
            bom_preset: "Common Ground Electronics BOM".to_string(),
            bom_format_preset: "CSV".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseSettings {
    pub gerber_layers: Vec<String>,
    pub pdf_front_layers: Vec<String>,
    pub pdf_back_layers: Vec<String>,
    pub schematic_png_dpi: f32,
    pub schematic_thumbnail_px: u32,
    /// ODB++ export. Off while kicad-cli produces broken compressed archives.
    pub odb: bool,
    /// 3D renders. Off until kicad-cli supports layer selection and presets.
    pub renders: bool,
}

impl Default for ReleaseSettings {
    fn default() -> Self {
        Self {
            gerber_layers: to_strings(DEFAULT_GERBER_LAYERS),
            pdf_front_layers: to_strings(DEFAULT_PDF_FRONT_LAYERS),
            pdf_back_layers: to_strings(DEFAULT_PDF_BACK_LAYERS),
            schematic_png_dpi: 300.0,
            schematic_thumbnail_px: 500,
            odb: false,
            renders: false,
        }
    }
}

impl ProjectConfig {
    /// Load `saohost.toml` from `dir`, or defaults if there is none.
    pub fn load(dir: &Path) -> Result<Self, SaoHostError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            let config = Self::default();
            config.validate(&path)?;
            return Ok(config);
        }
        Self::from_path(&path)
    }

    /// Load an explicit config file. The file must exist.
    pub fn from_path(path: &Path) -> Result<Self, SaoHostError> {
        let content = std::fs::read_to_string(path).map_err(|e| SaoHostError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content, path)?;
        tracing::debug!("Loaded project config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text; `origin` is only used in error messages.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, SaoHostError> {
        let config: ProjectConfig = toml::from_str(content).map_err(|e| SaoHostError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    fn validate(&self, origin: &Path) -> Result<(), SaoHostError> {
        let fail = |message: &str| SaoHostError::Config {
            path: origin.to_path_buf(),
            message: message.to_string(),
        };
        if self.project.name.trim().is_empty() {
            return Err(fail("project.name must not be empty"));
        }
        if self.project.version_major.trim().is_empty() {
            return Err(fail("project.version_major must not be empty"));
        }
        if self.release.gerber_layers.is_empty() {
            return Err(fail("release.gerber_layers must list at least one layer"));
        }
        if !(self.release.schematic_png_dpi > 0.0) {
            return Err(fail("release.schematic_png_dpi must be positive"));
        }
        if self.release.schematic_thumbnail_px == 0 {
            return Err(fail("release.schematic_thumbnail_px must be positive"));
        }
        Ok(())
    }

    /// `<name>_v<major>`, the prefix shared by every output artifact.
    pub fn versioned_name(&self) -> String {
        format!("{}_v{}", self.project.name, self.project.version_major)
    }
}
