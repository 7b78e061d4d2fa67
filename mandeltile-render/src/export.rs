//! PNG export of the display surface with embedded view metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use mandeltile_core::View;

use crate::colorize::ColorMapping;
use crate::error::RenderError;
use crate::surface::Surface;

/// Metadata to embed in an exported PNG as tEXt chunks.
pub struct ExportMetadata {
    pub view: View,
    pub color_mapping: ColorMapping,
    pub escape_modulus_sq: f64,
}

/// Write the surface as an RGBA PNG with the view it shows embedded as text.
pub fn export_png(surface: &Surface, path: &Path, metadata: &ExportMetadata) -> crate::Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| RenderError::Export(format!("failed to create {}: {e}", path.display())))?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, surface.width, surface.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder
        .add_text_chunk("Software".to_string(), "MandelTile".to_string())
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    encoder
        .add_text_chunk("Description".to_string(), build_description(metadata))
        .map_err(|e| RenderError::Export(format!("failed to add text chunk: {e}")))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder
            .add_text_chunk(key.clone(), value)
            .map_err(|e| RenderError::Export(format!("failed to add text chunk '{key}': {e}")))?;
    }

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| RenderError::Export(format!("failed to write PNG header: {e}")))?;
    png_writer
        .write_image_data(&surface.pixels)
        .map_err(|e| RenderError::Export(format!("failed to write PNG image data: {e}")))?;

    debug!(
        width = surface.width,
        height = surface.height,
        path = %path.display(),
        "Exported PNG"
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    let v = &meta.view;
    format!(
        "Mandelbrot - Center: {} {}i, Range: {}x{}, Iterations: {}",
        v.x_center, v.y_center, v.x_range, v.y_range, v.max_iterations,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    let v = &meta.view;
    vec![
        ("MandelTile.CenterRe".into(), v.x_center.to_string()),
        ("MandelTile.CenterIm".into(), v.y_center.to_string()),
        ("MandelTile.RangeRe".into(), v.x_range.to_string()),
        ("MandelTile.RangeIm".into(), v.y_range.to_string()),
        ("MandelTile.MaxIterations".into(), v.max_iterations.to_string()),
        ("MandelTile.EscapeModulusSq".into(), meta.escape_modulus_sq.to_string()),
        ("MandelTile.ColorMapping".into(), meta.color_mapping.label().into()),
        ("MandelTile.Resolution".into(), format!("{}x{}", v.width, v.height)),
    ]
}
