//! Plugin-extensible drawing surface.
//!
//! A [`DrawingSurface`] owns a `tiny-skia` pixmap sized at construction.
//! Zero dimensions leave it without a canvas for good; exports then return
//! `Ok(None)` instead of failing.

pub mod loader;
pub mod plugin;

use std::any::Any;
use std::fmt;

use log::{debug, warn};
use tiny_skia::{Pixmap, PixmapMut};

use crate::encoded::ImageResult;
use crate::error::Result;

pub use loader::{load_image, DecodedImage, ImageSource};
pub use plugin::{Plugin, PluginContext, PluginManager, SurfaceInfo};

const PNG_MIME: &str = "image/png";

/// Construction options for a [`DrawingSurface`]
#[derive(Default)]
pub struct SurfaceConfig {
    /// Applied once each, in order, during construction
    pub plugins: Vec<Box<dyn Plugin>>,
}

impl SurfaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }
}

impl fmt::Debug for SurfaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("SurfaceConfig").field("plugins", &names).finish()
    }
}

/// A fixed-size canvas plus the context contributed by its plugins
pub struct DrawingSurface {
    width: u32,
    height: u32,
    canvas: Option<Pixmap>,
    manager: PluginManager,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(width, height, SurfaceConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: SurfaceConfig) -> Self {
        let canvas = Self::create_canvas(width, height);
        let mut manager = PluginManager::new(SurfaceInfo {
            width,
            height,
            ready: canvas.is_some(),
        });

        for plugin in &config.plugins {
            debug!("applying plugin {}", plugin.name());
            manager.update(|context| plugin.apply(context));
        }

        Self {
            width,
            height,
            canvas,
            manager,
        }
    }

    fn create_canvas(width: u32, height: u32) -> Option<Pixmap> {
        if width == 0 || height == 0 {
            return None;
        }
        let pixmap = Pixmap::new(width, height);
        if pixmap.is_none() {
            warn!("cannot allocate a {}x{} canvas; surface stays empty", width, height);
        }
        pixmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether a canvas was created
    pub fn is_ready(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&Pixmap> {
        self.canvas.as_ref()
    }

    /// Drawing handle onto the canvas
    pub fn context(&mut self) -> Option<PixmapMut<'_>> {
        self.canvas.as_mut().map(|c| c.as_mut())
    }

    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PluginManager {
        &mut self.manager
    }

    /// Capability bundle contributed by a plugin
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.manager.context().get::<T>()
    }

    /// Run `f` with a plugin bundle and the drawing handle together.
    ///
    /// Returns `None` when no plugin contributed a `T`. The handle is `None`
    /// when the surface has no canvas.
    pub fn with_extension<T, R>(
        &mut self,
        f: impl FnOnce(&T, Option<PixmapMut<'_>>) -> R,
    ) -> Option<R>
    where
        T: Any + Send + Sync,
    {
        let bundle = self.manager.context().get::<T>()?;
        let canvas = self.canvas.as_mut().map(|c| c.as_mut());
        Some(f(bundle, canvas))
    }

    pub async fn load_image(&self, source: impl Into<ImageSource>) -> Result<DecodedImage> {
        load_image(source).await
    }

    /// PNG export of the canvas, `None` if the surface has no canvas
    pub fn build(&self) -> Result<Option<Vec<u8>>> {
        match &self.canvas {
            Some(canvas) => Ok(Some(canvas.encode_png()?)),
            None => Ok(None),
        }
    }

    pub fn build_image(&self) -> Result<Option<ImageResult>> {
        Ok(self.build()?.map(|png| ImageResult::new(png, PNG_MIME)))
    }

    /// PNG data URL of the canvas, `None` if the surface has no canvas
    pub fn build_base64(&self) -> Result<Option<String>> {
        Ok(self.build_image()?.map(|img| img.to_data_url()))
    }
}

impl fmt::Debug for DrawingSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawingSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("ready", &self.is_ready())
            .field("context", self.manager.context())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimensions_degrade_silently() {
        let mut s = DrawingSurface::new(0, 10);
        assert!(!s.is_ready());
        assert!(s.canvas().is_none());
        assert!(s.context().is_none());
        assert!(s.build().unwrap().is_none());
        assert!(s.build_base64().unwrap().is_none());
        assert!(!s.manager().context().surface().ready);
    }

    #[test]
    fn ready_surface_exports_png() {
        let mut s = DrawingSurface::new(3, 2);
        let mut paint = tiny_skia::Paint::default();
        paint.set_color_rgba8(10, 20, 30, 255);
        s.context().unwrap().fill_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 3.0, 2.0).unwrap(),
            &paint,
            tiny_skia::Transform::identity(),
            None,
        );

        let png = s.build().unwrap().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        let url = s.build_base64().unwrap().unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
