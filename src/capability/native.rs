//! resvg-backed rasterization shared by the native capabilities

use log::{debug, log_enabled, Level};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;

use crate::capability::{RenderedSvg, RendererOptions, SvgRenderer};
use crate::error::{Error, Result};

/// Parse `svg` and rasterize it at its intrinsic size.
pub(crate) fn rasterize(svg: &[u8], load_system_fonts: bool) -> Result<Pixmap> {
    let mut opt = usvg::Options::default();
    if load_system_fonts {
        opt.fontdb_mut().load_system_fonts();
    }

    let tree = usvg::Tree::from_data(svg, &opt)?;
    let size = tree.size().to_int_size();

    let mut pixmap = Pixmap::new(size.width(), size.height()).ok_or_else(|| {
        Error::RenderError(format!(
            "cannot allocate a {}x{} pixmap",
            size.width(),
            size.height()
        ))
    })?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    Ok(pixmap)
}

/// The low-level SVG renderer capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRenderer;

impl ResvgRenderer {
    pub fn new() -> Self {
        ResvgRenderer
    }
}

impl SvgRenderer for ResvgRenderer {
    fn render(&self, svg: &[u8], options: &RendererOptions) -> Result<RenderedSvg> {
        let pixmap = rasterize(svg, options.load_system_fonts)?;

        if Level::Debug <= options.log_level && log_enabled!(Level::Debug) {
            debug!(
                "resvg rendered {} bytes of svg into {}x{} pixels",
                svg.len(),
                pixmap.width(),
                pixmap.height()
            );
        }

        Ok(RenderedSvg::new(pixmap))
    }
}
