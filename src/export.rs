use std::path::Path;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{Error, Result};

/// Output encodings, chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::Export("output file has no extension".to_string()))?
            .to_ascii_lowercase();

        match ext.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(Error::Export(format!(
                "unsupported output format: .{} (use .svg, .png or .pdf)",
                ext
            ))),
        }
    }
}

pub fn encode(svg: &str, format: OutputFormat, png_scale: f32) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => Ok(svg.as_bytes().to_vec()),
        OutputFormat::Png => svg_to_png(svg, png_scale),
        OutputFormat::Pdf => svg_to_pdf(svg),
    }
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Export(format!("invalid PNG scale: {}", scale)));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        if let Some((sans, mono)) = pick_families(fontdb.faces().flat_map(|f| &f.families)) {
            fontdb.set_sans_serif_family(&sans);
            fontdb.set_serif_family(&sans);
            fontdb.set_monospace_family(&mono);
        }
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Export(format!("cannot allocate {}x{} pixmap", width, height)))?;

    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| Error::Export(format!("failed to encode PNG: {}", e)))
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();
    if let Some((sans, mono)) = pick_families(fontdb.faces().flat_map(|f| &f.families)) {
        fontdb.set_sans_serif_family(&sans);
        fontdb.set_serif_family(&sans);
        fontdb.set_monospace_family(&mono);
    }

    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..Default::default()
    };
    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    // Text as paths: PDFs stay readable when font embedding fails.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };

    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| Error::Export(format!("failed to convert SVG to PDF: {}", e)))
}

/// Choose `(sans, mono)` fallback families from the installed faces.
///
/// resvg and svg2pdf pin different usvg versions, so this works on the family
/// names alone.
fn pick_families<'a, I, L>(families: I) -> Option<(String, String)>
where
    I: IntoIterator<Item = &'a (String, L)>,
    L: 'a,
{
    let mut sans: Option<&str> = None;
    let mut mono: Option<&str> = None;
    let mut first: Option<&str> = None;

    for (family, _) in families {
        let lower = family.to_ascii_lowercase();
        first.get_or_insert(family.as_str());
        if sans.is_none() && lower.contains("sans") {
            sans = Some(family.as_str());
        }
        if mono.is_none() && (lower.contains("mono") || lower.contains("code")) {
            mono = Some(family.as_str());
        }
    }

    let sans = sans.or(first)?;
    Some((sans.to_string(), mono.unwrap_or(sans).to_string()))
}
