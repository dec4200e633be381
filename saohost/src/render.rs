//! Schematic SVG to PNG rasterization.

use std::path::Path;

use resvg::{tiny_skia, usvg};

use crate::core::SaoHostError;
use crate::fsutil::ensure_parent_dir;

/// CSS reference resolution that usvg reports sizes in.
const CSS_DPI: f32 = 96.0;

/// Output size of a rasterized SVG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PngSizing {
    /// Render at this physical resolution.
    Dpi(f32),
    /// Scale so the larger side is this many pixels, keeping the aspect ratio.
    MaxDimension(u32),
    /// One pixel per SVG user unit.
    Native,
}

impl PngSizing {
    fn scale_for(&self, width: f32, height: f32) -> f32 {
        match *self {
            PngSizing::Dpi(dpi) => dpi / CSS_DPI,
            PngSizing::MaxDimension(px) => px as f32 / width.max(height),
            PngSizing::Native => 1.0,
        }
    }
}

/// Rasterize `svg_path` into `png_path`.
///
/// Without `alpha` the drawing is composited onto opaque white.
pub fn svg_to_png(
    svg_path: &Path,
    png_path: &Path,
    sizing: PngSizing,
    alpha: bool,
) -> Result<(), SaoHostError> {
    tracing::info!(
        "Generating {} from {}...",
        png_path.display(),
        svg_path.display()
    );

    let data = std::fs::read(svg_path).map_err(|e| {
        SaoHostError::Render(format!("cannot read {}: {}", svg_path.display(), e))
    })?;

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(&data, &options).map_err(|e| {
        SaoHostError::Render(format!("failed to parse {}: {}", svg_path.display(), e))
    })?;

    let size = tree.size();
    let scale = sizing.scale_for(size.width(), size.height());
    let width = (size.width() * scale).round() as u32;
    let height = (size.height() * scale).round() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        SaoHostError::Render(format!(
            "{} renders to an empty {}x{} image",
            svg_path.display(),
            width,
            height
        ))
    })?;
    if !alpha {
        pixmap.fill(tiny_skia::Color::WHITE);
    }

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    ensure_parent_dir(png_path)?;
    pixmap
        .save_png(png_path)
        .map_err(|e| SaoHostError::Render(format!("failed to write {}: {}", png_path.display(), e)))?;
    tracing::debug!("Wrote {}x{} PNG", width, height);
    Ok(())
}
