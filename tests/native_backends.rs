//! End-to-end rendering through the compiled-in resvg capabilities
#![cfg(feature = "renderer")]

use std::sync::Arc;

use canvasmith::capability::native::ResvgRenderer;
use canvasmith::{
    Capabilities, CapabilityKind, CapabilityLoader, EncodingFormat, Error, RasterConfig,
    RenderOptions, SvgRasterizer,
};

const CIRCLE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10">
    <rect width="20" height="10" fill="rgb(0,128,255)"/>
</svg>"#;

fn renderer_rasterizer() -> SvgRasterizer {
    let caps = Capabilities::none().with_svg_renderer(Arc::new(ResvgRenderer::new()));
    SvgRasterizer::new(&caps, &RasterConfig::default())
}

#[tokio::test]
async fn renderer_raw_matches_svg_size() {
    let raw = renderer_rasterizer()
        .render(CIRCLE, EncodingFormat::Raw, None, None)
        .await
        .unwrap();
    assert_eq!(raw.len(), 20 * 10 * 4);
    assert_eq!(&raw[0..4], &[0, 128, 255, 255]);
}

#[tokio::test]
async fn renderer_png_decodes_back() {
    let png = renderer_rasterizer()
        .render(CIRCLE, EncodingFormat::Png, None, None)
        .await
        .unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (20, 10));
    assert_eq!(img.get_pixel(10, 5).0, [0, 128, 255, 255]);
}

#[tokio::test]
async fn renderer_quality_changes_jpeg_output() {
    let r = renderer_rasterizer();
    let low = r
        .render(
            CIRCLE,
            EncodingFormat::Jpeg,
            Some(RenderOptions::Jpeg { quality: 5 }),
            None,
        )
        .await
        .unwrap();
    let high = r
        .render(
            CIRCLE,
            EncodingFormat::Jpeg,
            Some(RenderOptions::Jpeg { quality: 100 }),
            None,
        )
        .await
        .unwrap();
    assert_ne!(low, high);
}

#[tokio::test]
async fn renderer_quality_changes_webp_output() {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64">
        <defs><linearGradient id="g"><stop offset="0" stop-color="#f00"/><stop offset="1" stop-color="#00f"/></linearGradient></defs>
        <rect width="64" height="64" fill="url(#g)"/>
        <circle cx="32" cy="32" r="20" fill="#ff0" stroke="#000" stroke-width="3"/>
    </svg>"##;
    let r = renderer_rasterizer();
    let mut outputs = Vec::new();
    for quality in [5, 100] {
        let out = r
            .render(
                svg,
                EncodingFormat::Webp,
                Some(RenderOptions::Webp { quality }),
                None,
            )
            .await
            .unwrap();
        assert_eq!(&out[8..12], b"WEBP");
        outputs.push(out);
    }
    assert_ne!(outputs[0], outputs[1]);
}

#[tokio::test]
async fn malformed_svg_surfaces_renderer_error() {
    let err = renderer_rasterizer()
        .render("<svg", EncodingFormat::Png, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Svg(_)), "got {err:?}");
}

#[tokio::test]
async fn no_capabilities_means_missing_dependency() {
    let r = SvgRasterizer::new(&Capabilities::none(), &RasterConfig::default());
    let err = r
        .render(CIRCLE, EncodingFormat::Png, None, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing dependency: resvg is required to render SVG"
    );
}

#[test]
fn disabled_capabilities_are_absent() {
    let loader = CapabilityLoader::new(canvasmith::capability::NativeProvider::new(vec![
        CapabilityKind::Encoder,
    ]));
    assert!(!loader.probe(CapabilityKind::Encoder));
    assert!(loader.probe(CapabilityKind::Renderer));
    assert_eq!(
        SvgRasterizer::new(&loader.capabilities(), &RasterConfig::default()).backend_names(),
        vec!["renderer"]
    );
}

#[cfg(feature = "encoder")]
mod toolkit {
    use super::*;
    use canvasmith::capability::toolkit::ImageToolkit;

    #[tokio::test]
    async fn toolkit_takes_priority_and_encodes_gif() {
        let caps = Capabilities::none()
            .with_raster_encoder(Arc::new(ImageToolkit::new()))
            .with_svg_renderer(Arc::new(ResvgRenderer::new()));
        let r = SvgRasterizer::new(&caps, &RasterConfig::default());
        assert_eq!(r.backend_names(), vec!["encoder", "renderer"]);

        let gif = r
            .render(CIRCLE, EncodingFormat::from("GIF"), None, None)
            .await
            .unwrap();
        assert_eq!(&gif[0..3], b"GIF");

        let webp = r
            .render(CIRCLE, EncodingFormat::Webp, None, None)
            .await
            .unwrap();
        assert_eq!(&webp[8..12], b"WEBP");
    }

    #[tokio::test]
    async fn toolkit_ignores_cancellation() {
        let caps = Capabilities::none().with_raster_encoder(Arc::new(ImageToolkit::new()));
        let r = SvgRasterizer::new(&caps, &RasterConfig::default());
        let token = canvasmith::CancellationToken::new();
        token.cancel();
        let out = r
            .render(CIRCLE, EncodingFormat::Jpeg, None, Some(token))
            .await;
        assert!(out.is_ok());
    }
}
