//! Input and output paths for a project revision.

use std::path::{Path, PathBuf};

use crate::config::{PartNumber, ProjectConfig};

/// Every path the tasks read or write, resolved against the project directory.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub schematic: PathBuf,
    pub pcb: PathBuf,

    pub output: PathBuf,
    pub erc_report: PathBuf,
    pub drc_report: PathBuf,

    pub pca_dir: PathBuf,
    pub schematic_pdf: PathBuf,
    pub schematic_svg_dir: PathBuf,
    /// File KiCad writes inside `schematic_svg_dir`.
    pub schematic_svg: PathBuf,
    pub schematic_png: PathBuf,
    pub schematic_thumbnail: PathBuf,
    pub bom: PathBuf,
    pub pca_renders: PathBuf,

    pub pcb_dir: PathBuf,
    pub gerbers: PathBuf,
    pub odb: PathBuf,
    pub pcb_pdf: PathBuf,
    pub drill_files: PathBuf,
    pub ipcd356: PathBuf,
    pub position: PathBuf,

    pub kicad_backups: PathBuf,
    pub fp_info_cache: PathBuf,
}

fn part_suffix(part: &PartNumber) -> String {
    format!("{}_Rev_{}", part.number, part.rev)
}

impl OutputLayout {
    pub fn new(root: &Path, config: &ProjectConfig) -> Self {
        let name = &config.project.name;
        let versioned = config.versioned_name();
        let parts = &config.parts;

        let output = root.join("output").join(&versioned);
        let reports = output.join("Reports");

        let pca_dir = output.join(format!("{}_PCA_{}", versioned, part_suffix(&parts.pca)));
        let schematic_dir = pca_dir.join("Schematic");
        let sch_base = format!("{}_Schematic_{}", versioned, part_suffix(&parts.sch));
        let schematic_svg_dir = schematic_dir.join(format!("{}_SVG", sch_base));

        let pcb_dir = output.join(format!("{}_PCB_{}", versioned, part_suffix(&parts.pcb)));

        Self {
            root: root.to_path_buf(),
            schematic: root.join(format!("{}.kicad_sch", name)),
            pcb: root.join(format!("{}.kicad_pcb", name)),

            erc_report: reports.join(format!("{}_ERC_report.txt", versioned)),
            drc_report: reports.join(format!("{}_DRC_report.txt", versioned)),

            schematic_pdf: schematic_dir.join(format!("{}.pdf", sch_base)),
            schematic_svg: schematic_svg_dir.join(format!("{}.svg", name)),
            schematic_svg_dir,
            schematic_png: schematic_dir.join(format!("{}.png", sch_base)),
            schematic_thumbnail: schematic_dir.join(format!("{}_thumbnail.png", sch_base)),
            bom: pca_dir.join("BOM").join(format!(
                "{}_ECAD_BOM_{}.csv",
                versioned,
                part_suffix(&parts.pca)
            )),
            pca_renders: pca_dir.join("Renders"),

            gerbers: pcb_dir.join("Gerbers"),
            odb: pcb_dir.join("ODB++").join(format!("{}.zip", name)),
            pcb_pdf: pcb_dir.join("PDF"),
            drill_files: pcb_dir.join("Drill_Files"),
            ipcd356: pcb_dir.join("Netlist").join(format!("{}.d356", name)),
            position: pcb_dir.join("Position").join(format!("{}.pos", name)),

            kicad_backups: root.join(format!("{}-backups", name)),
            fp_info_cache: root.join("fp-info-cache"),

            pca_dir,
            pcb_dir,
            output,
        }
    }

    /// Render file name for one board side and projection.
    pub fn pca_render(&self, config: &ProjectConfig, side: &str, perspective: bool) -> PathBuf {
        let projection = if perspective { "_ortho" } else { "" };
        self.pca_renders.join(format!(
            "{}_PCA_{}_{}{}.png",
            config.versioned_name(),
            part_suffix(&config.parts.pca),
            side,
            projection
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> OutputLayout {
        OutputLayout::new(Path::new("/work"), &ProjectConfig::default())
    }

    #[test]
    fn test_input_paths() {
        let layout = layout();
        assert_eq!(layout.schematic, PathBuf::from("/work/RPi_Pico_SAO_Host.kicad_sch"));
        assert_eq!(layout.pcb, PathBuf::from("/work/RPi_Pico_SAO_Host.kicad_pcb"));
    }

    #[test]
    fn test_report_paths() {
        let layout = layout();
        assert_eq!(
            layout.erc_report,
            PathBuf::from(
                "/work/output/RPi_Pico_SAO_Host_v2/Reports/RPi_Pico_SAO_Host_v2_ERC_report.txt"
            )
        );
        assert_eq!(
            layout.drc_report.file_name().unwrap(),
            "RPi_Pico_SAO_Host_v2_DRC_report.txt"
        );
    }

    #[test]
    fn test_pca_paths() {
        let layout = layout();
        let pca = PathBuf::from("/work/output/RPi_Pico_SAO_Host_v2/RPi_Pico_SAO_Host_v2_PCA_100094_Rev_A");
        assert_eq!(layout.pca_dir, pca);
        assert_eq!(
            layout.schematic_pdf,
            pca.join("Schematic")
                .join("RPi_Pico_SAO_Host_v2_Schematic_100093_Rev_A.pdf")
        );
        assert_eq!(
            layout.schematic_svg,
            pca.join("Schematic")
                .join("RPi_Pico_SAO_Host_v2_Schematic_100093_Rev_A_SVG")
                .join("RPi_Pico_SAO_Host.svg")
        );
        assert_eq!(
            layout.schematic_thumbnail.file_name().unwrap(),
            "RPi_Pico_SAO_Host_v2_Schematic_100093_Rev_A_thumbnail.png"
        );
        assert_eq!(
            layout.bom,
            pca.join("BOM").join("RPi_Pico_SAO_Host_v2_ECAD_BOM_100094_Rev_A.csv")
        );
    }

    #[test]
    fn test_pcb_paths() {
        let layout = layout();
        let pcb = PathBuf::from("/work/output/RPi_Pico_SAO_Host_v2/RPi_Pico_SAO_Host_v2_PCB_100092_Rev_A");
        assert_eq!(layout.gerbers, pcb.join("Gerbers"));
        assert_eq!(layout.odb, pcb.join("ODB++").join("RPi_Pico_SAO_Host.zip"));
        assert_eq!(layout.ipcd356, pcb.join("Netlist").join("RPi_Pico_SAO_Host.d356"));
        assert_eq!(layout.position, pcb.join("Position").join("RPi_Pico_SAO_Host.pos"));
    }

    #[test]
    fn test_render_names() {
        let config = ProjectConfig::default();
        let layout = OutputLayout::new(Path::new("/work"), &config);
        assert_eq!(
            layout.pca_render(&config, "top", true).file_name().unwrap(),
            "RPi_Pico_SAO_Host_v2_PCA_100094_Rev_A_top_ortho.png"
        );
        assert_eq!(
            layout.pca_render(&config, "bottom", false).file_name().unwrap(),
            "RPi_Pico_SAO_Host_v2_PCA_100094_Rev_A_bottom.png"
        );
    }

    #[test]
    fn test_kicad_working_files() {
        let layout = layout();
        assert_eq!(layout.kicad_backups, PathBuf::from("/work/RPi_Pico_SAO_Host-backups"));
        assert_eq!(layout.fp_info_cache, PathBuf::from("/work/fp-info-cache"));
    }
}
