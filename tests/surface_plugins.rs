//! Drawing surface lifecycle and plugin composition

use std::sync::{Arc, Mutex};

use canvasmith::tiny_skia::{Color, Paint, PixmapMut, Rect, Transform};
use canvasmith::{DrawingSurface, Plugin, PluginContext, SurfaceConfig};

/// Capability bundle: paints a border onto a context
struct Border {
    rgba: (u8, u8, u8, u8),
}

impl Border {
    fn draw(&self, mut ctx: PixmapMut<'_>) {
        let (w, h) = (ctx.width() as f32, ctx.height() as f32);
        let mut paint = Paint::default();
        let (r, g, b, a) = self.rgba;
        paint.set_color_rgba8(r, g, b, a);
        for rect in [
            Rect::from_xywh(0.0, 0.0, w, 1.0),
            Rect::from_xywh(0.0, h - 1.0, w, 1.0),
        ]
        .into_iter()
        .flatten()
        {
            ctx.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }
}

struct BorderPlugin;

impl Plugin for BorderPlugin {
    fn name(&self) -> &str {
        "border"
    }

    fn apply(&self, context: PluginContext) -> PluginContext {
        context.provide(Border {
            rgba: (0, 0, 255, 255),
        })
    }
}

#[derive(Debug, PartialEq)]
struct Trail(Vec<&'static str>);

fn trail_step(label: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> impl Plugin {
    move |ctx: PluginContext| {
        log.lock().unwrap().push(label);
        let mut seen = ctx.get::<Trail>().map(|t| t.0.clone()).unwrap_or_default();
        seen.push(label);
        ctx.provide(Trail(seen))
    }
}

#[test]
fn zero_size_surface_has_nothing_to_export() {
    for (w, h) in [(0, 0), (0, 5), (5, 0)] {
        let mut surface = DrawingSurface::new(w, h);
        assert!(surface.canvas().is_none());
        assert!(surface.context().is_none());
        assert_eq!(surface.build().unwrap(), None);
        assert_eq!(surface.build_base64().unwrap(), None);
    }
}

#[test]
fn sized_surface_is_ready() {
    let mut surface = DrawingSurface::new(16, 9);
    assert_eq!(surface.canvas().unwrap().width(), 16);
    assert!(surface.context().is_some());

    let bytes = surface.build().unwrap().unwrap();
    assert!(!bytes.is_empty());

    let image = surface.build_image().unwrap().unwrap();
    assert_eq!(image.mime(), "image/png");
    assert_eq!(surface.build_base64().unwrap().unwrap(), image.to_data_url());
}

#[test]
fn plugins_run_once_in_order_and_see_earlier_contributions() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let config = SurfaceConfig::new()
        .plugin(trail_step("a", log.clone()))
        .plugin(trail_step("b", log.clone()))
        .plugin(trail_step("c", log.clone()));

    let surface = DrawingSurface::with_config(4, 4, config);

    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(surface.extension::<Trail>(), Some(&Trail(vec!["a", "b", "c"])));
}

#[test]
fn plugins_run_even_without_canvas() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let surface = DrawingSurface::with_config(
        0,
        0,
        SurfaceConfig::new().plugin(trail_step("only", log.clone())),
    );
    assert_eq!(log.lock().unwrap().len(), 1);
    assert!(!surface.manager().context().surface().ready);
}

#[test]
fn plugin_bundle_draws_on_the_surface() {
    let mut surface =
        DrawingSurface::with_config(8, 8, SurfaceConfig::new().plugin(BorderPlugin));

    let mut white = Paint::default();
    white.set_color(Color::WHITE);
    surface.context().unwrap().fill_rect(
        Rect::from_xywh(0.0, 0.0, 8.0, 8.0).unwrap(),
        &white,
        Transform::identity(),
        None,
    );

    let drawn = surface.with_extension(|border: &Border, ctx| {
        border.draw(ctx.expect("sized surface has a canvas"));
    });
    assert!(drawn.is_some());
    assert!(surface.extension::<Border>().is_some());

    let canvas = surface.canvas().unwrap();
    let top_left = canvas.pixel(0, 0).unwrap();
    assert_eq!((top_left.blue(), top_left.red()), (255, 0));
    let middle = canvas.pixel(4, 4).unwrap();
    assert_eq!(middle.red(), 255);
}

#[test]
fn with_extension_without_bundle_or_canvas() {
    let mut surface = DrawingSurface::new(8, 8);
    assert!(surface.with_extension(|_: &Border, _| ()).is_none());

    let mut empty = DrawingSurface::with_config(0, 0, SurfaceConfig::new().plugin(BorderPlugin));
    let saw_canvas = empty.with_extension(|_: &Border, ctx| ctx.is_some());
    assert_eq!(saw_canvas, Some(false));
}

#[test]
fn surface_info_is_visible_to_plugins() {
    let surface = DrawingSurface::with_config(
        12,
        7,
        SurfaceConfig::new().plugin(|ctx: PluginContext| {
            let info = ctx.surface();
            ctx.provide(format!("{}x{}", info.width, info.height))
        }),
    );
    assert_eq!(surface.extension::<String>().map(String::as_str), Some("12x7"));
}
