//! `kicad-cli` command builders.
//!
//! Each builder returns an [`Invocation`] with one argv entry per flag, so
//! paths containing spaces never need shell quoting.

use std::path::{Path, PathBuf};

use super::{Invocation, Step};

/// Options for `pcb export pdf`.
#[derive(Debug, Clone, PartialEq)]
pub struct PcbPdfOptions {
    pub mirror: bool,
    /// KiCad currently mishandles multipage output, so separate files are the default.
    pub multipage: bool,
    pub black_and_white: bool,
}

impl Default for PcbPdfOptions {
    fn default() -> Self {
        Self {
            mirror: false,
            multipage: false,
            black_and_white: true,
        }
    }
}

/// Options for `pcb render`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub side: String,
    pub background: String,
    pub perspective: bool,
    pub zoom: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            side: "top".to_string(),
            background: "default".to_string(),
            perspective: false,
            zoom: 1.0,
        }
    }
}

/// Builds invocations against one `kicad-cli` binary.
#[derive(Debug, Clone)]
pub struct KicadCli {
    program: PathBuf,
}

impl KicadCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn base(&self, step: Step) -> Invocation {
        Invocation::new(step, &self.program)
    }

    pub fn version(&self) -> Invocation {
        self.base(Step::Version).arg("version").arg("--format=about")
    }

    pub fn schematic_erc(&self, schematic: &Path, report: &Path) -> Invocation {
        self.base(Step::Erc)
            .arg("sch")
            .arg("erc")
            .opt("output", report)
            .arg("--severity-warning")
            .arg("--severity-error")
            .arg("--exit-code-violations")
            .arg(schematic)
            .writes_file(report)
    }

    pub fn schematic_export_pdf(&self, schematic: &Path, pdf: &Path) -> Invocation {
        self.schematic_plot(Step::SchematicPdf, "pdf", schematic, pdf)
            .writes_file(pdf)
    }

    /// KiCad writes one `<sheet>.svg` per sheet into `svg_dir`.
    pub fn schematic_export_svg(&self, schematic: &Path, svg_dir: &Path) -> Invocation {
        self.schematic_plot(Step::SchematicSvg, "svg", schematic, svg_dir)
            .writes_dir(svg_dir)
    }

    fn schematic_plot(&self, step: Step, format: &str, schematic: &Path, output: &Path) -> Invocation {
        self.base(step)
            .arg("sch")
            .arg("export")
            .arg(format)
            .opt("output", output)
            .arg("--black-and-white")
            .arg("--no-background-color")
            .arg(schematic)
    }

    pub fn schematic_export_bom(
        &self,
        schematic: &Path,
        bom: &Path,
        preset: &str,
        format_preset: &str,
    ) -> Invocation {
        self.base(Step::SchematicBom)
            .arg("sch")
            .arg("export")
            .arg("bom")
            .opt("output", bom)
            .opt("preset", preset)
            .opt("format-preset", format_preset)
            .arg(schematic)
            .writes_file(bom)
    }

    pub fn pcb_drc(&self, pcb: &Path, report: &Path) -> Invocation {
        self.base(Step::Drc)
            .arg("pcb")
            .arg("drc")
            .opt("output", report)
            .arg("--schematic-parity")
            .arg("--severity-warning")
            .arg("--severity-error")
            .arg("--exit-code-violations")
            .arg(pcb)
            .writes_file(report)
    }

    pub fn pcb_export_gerbers(&self, pcb: &Path, gerbers: &Path, layers: &[String]) -> Invocation {
        self.base(Step::PcbGerbers)
            .arg("pcb")
            .arg("export")
            .arg("gerbers")
            .opt("output", gerbers)
            .opt("layers", layers.join(","))
            .arg("--exclude-value")
            .arg("--use-drill-file-origin")
            .arg("--no-protel-ext")
            .arg(pcb)
            .writes_dir(gerbers)
    }

    pub fn pcb_export_odb(&self, pcb: &Path, odb: &Path) -> Invocation {
        self.base(Step::PcbOdb)
            .arg("pcb")
            .arg("export")
            .arg("odb")
            .opt("output", odb)
            .arg(pcb)
            .writes_file(odb)
    }

    pub fn pcb_export_pdf(
        &self,
        pcb: &Path,
        pdf_dir: &Path,
        layers: &[String],
        options: &PcbPdfOptions,
    ) -> Invocation {
        let mode = if options.multipage {
            "--mode-multipage"
        } else {
            "--mode-separate"
        };
        self.base(Step::PcbPdf)
            .arg("pcb")
            .arg("export")
            .arg("pdf")
            .opt("output", pdf_dir)
            .opt("layers", layers.join(","))
            .arg("--exclude-value")
            .arg("--include-border-title")
            .arg("--common-layers=Edge.Cuts")
            .arg("--drill-shape-opt=0")
            .arg(pcb)
            .flag_if(options.mirror, "--mirror")
            .arg(mode)
            .flag_if(options.black_and_white, "--black-and-white")
            .writes_dir(pdf_dir)
    }

    pub fn pcb_export_drill(&self, pcb: &Path, drill_dir: &Path) -> Invocation {
        self.base(Step::PcbDrill)
            .arg("pcb")
            .arg("export")
            .arg("drill")
            .opt("output", drill_dir)
            .arg("--drill-origin=plot")
            .arg("--generate-map")
            .arg(pcb)
            .writes_dir(drill_dir)
    }

    pub fn pcb_export_ipcd356(&self, pcb: &Path, netlist: &Path) -> Invocation {
        self.base(Step::PcbIpcd356)
            .arg("pcb")
            .arg("export")
            .arg("ipcd356")
            .opt("output", netlist)
            .arg(pcb)
            .writes_file(netlist)
    }

    pub fn pcb_export_pos(&self, pcb: &Path, position: &Path) -> Invocation {
        self.base(Step::PcbPosition)
            .arg("pcb")
            .arg("export")
            .arg("pos")
            .opt("output", position)
            .arg("--use-drill-file-origin")
            .arg(pcb)
            .writes_file(position)
    }

    pub fn pcb_render(&self, pcb: &Path, png: &Path, options: &RenderOptions) -> Invocation {
        self.base(Step::PcbRender)
            .arg("pcb")
            .arg("render")
            .opt("output", png)
            .opt("width", options.width.to_string())
            .opt("height", options.height.to_string())
            .opt("side", &options.side)
            .opt("background", &options.background)
            .opt("zoom", options.zoom.to_string())
            .arg(pcb)
            .flag_if(options.perspective, "--perspective")
            .writes_file(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kicad::OutputTarget;

    fn cli() -> KicadCli {
        KicadCli::new("kicad-cli")
    }

    fn layers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_version_args() {
        let inv = cli().version();
        assert_eq!(inv.step, Step::Version);
        assert_eq!(inv.args_lossy(), vec!["version", "--format=about"]);
        assert_eq!(inv.output, None);
    }

    #[test]
    fn test_erc_args() {
        let inv = cli().schematic_erc(Path::new("board.kicad_sch"), Path::new("out/erc.txt"));
        assert_eq!(
            inv.args_lossy(),
            vec![
                "sch",
                "erc",
                "--output=out/erc.txt",
                "--severity-warning",
                "--severity-error",
                "--exit-code-violations",
                "board.kicad_sch",
            ]
        );
        assert_eq!(inv.output, Some(OutputTarget::File(PathBuf::from("out/erc.txt"))));
    }

    #[test]
    fn test_drc_checks_schematic_parity() {
        let inv = cli().pcb_drc(Path::new("board.kicad_pcb"), Path::new("drc.txt"));
        let args = inv.args_lossy();
        assert_eq!(&args[..3], &["pcb", "drc", "--output=drc.txt"]);
        assert!(args.contains(&"--schematic-parity".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("board.kicad_pcb"));
    }

    #[test]
    fn test_bom_presets_are_single_args() {
        let inv = cli().schematic_export_bom(
            Path::new("board.kicad_sch"),
            Path::new("bom.csv"),
            "Common Ground Electronics BOM",
            "CSV",
        );
        assert_eq!(
            inv.args_lossy(),
            vec![
                "sch",
                "export",
                "bom",
                "--output=bom.csv",
                "--preset=Common Ground Electronics BOM",
                "--format-preset=CSV",
                "board.kicad_sch",
            ]
        );
    }

    #[test]
    fn test_schematic_svg_writes_directory() {
        let inv = cli().schematic_export_svg(Path::new("board.kicad_sch"), Path::new("svg"));
        assert_eq!(
            inv.args_lossy(),
            vec![
                "sch",
                "export",
                "svg",
                "--output=svg",
                "--black-and-white",
                "--no-background-color",
                "board.kicad_sch",
            ]
        );
        assert_eq!(inv.output, Some(OutputTarget::Dir(PathBuf::from("svg"))));
    }

    #[test]
    fn test_gerber_layers_joined() {
        let inv = cli().pcb_export_gerbers(
            Path::new("board.kicad_pcb"),
            Path::new("Gerbers"),
            &layers(&["F.Cu", "B.Cu", "Edge.Cuts"]),
        );
        assert_eq!(
            inv.args_lossy(),
            vec![
                "pcb",
                "export",
                "gerbers",
                "--output=Gerbers",
                "--layers=F.Cu,B.Cu,Edge.Cuts",
                "--exclude-value",
                "--use-drill-file-origin",
                "--no-protel-ext",
                "board.kicad_pcb",
            ]
        );
    }

    #[test]
    fn test_pcb_pdf_default_flags() {
        let inv = cli().pcb_export_pdf(
            Path::new("board.kicad_pcb"),
            Path::new("PDF"),
            &layers(&["F.Cu"]),
            &PcbPdfOptions::default(),
        );
        let args = inv.args_lossy();
        assert_eq!(
            &args[args.len() - 3..],
            &["board.kicad_pcb", "--mode-separate", "--black-and-white"]
        );
        assert!(!args.contains(&"--mirror".to_string()));
    }

    #[test]
    fn test_pcb_pdf_mirrored_multipage_color() {
        let options = PcbPdfOptions {
            mirror: true,
            multipage: true,
            black_and_white: false,
        };
        let inv = cli().pcb_export_pdf(
            Path::new("board.kicad_pcb"),
            Path::new("PDF"),
            &layers(&["B.Cu"]),
            &options,
        );
        let args = inv.args_lossy();
        assert_eq!(
            &args[args.len() - 3..],
            &["board.kicad_pcb", "--mirror", "--mode-multipage"]
        );
    }

    #[test]
    fn test_drill_and_position() {
        let drill = cli().pcb_export_drill(Path::new("b.kicad_pcb"), Path::new("Drill_Files"));
        assert_eq!(
            drill.args_lossy(),
            vec![
                "pcb",
                "export",
                "drill",
                "--output=Drill_Files",
                "--drill-origin=plot",
                "--generate-map",
                "b.kicad_pcb",
            ]
        );
        let pos = cli().pcb_export_pos(Path::new("b.kicad_pcb"), Path::new("b.pos"));
        assert_eq!(
            pos.args_lossy(),
            vec![
                "pcb",
                "export",
                "pos",
                "--output=b.pos",
                "--use-drill-file-origin",
                "b.kicad_pcb",
            ]
        );
    }

    #[test]
    fn test_render_defaults() {
        let inv = cli().pcb_render(
            Path::new("b.kicad_pcb"),
            Path::new("top.png"),
            &RenderOptions::default(),
        );
        assert_eq!(
            inv.args_lossy(),
            vec![
                "pcb",
                "render",
                "--output=top.png",
                "--width=1600",
                "--height=900",
                "--side=top",
                "--background=default",
                "--zoom=1",
                "b.kicad_pcb",
            ]
        );
    }

    #[test]
    fn test_render_perspective_appended() {
        let options = RenderOptions {
            perspective: true,
            ..RenderOptions::default()
        };
        let inv = cli().pcb_render(Path::new("b.kicad_pcb"), Path::new("p.png"), &options);
        assert_eq!(inv.args_lossy().last().map(String::as_str), Some("--perspective"));
    }
}
