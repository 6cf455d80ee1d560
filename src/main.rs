use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use canvasmith::{
    svg_data_url, CancellationToken, CapabilityKind, CapabilityLoader, EncodingFormat,
    RenderOptions, SvgRasterizer,
};

#[derive(Parser)]
#[command(name = "canvasmith", version, about = "Rasterize SVG with the available backends")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rasterize an SVG file
    Render {
        input: PathBuf,
        /// raw, png, jpeg, webp, avif (or any format the encoder knows)
        #[arg(short, long, default_value = "png")]
        format: String,
        /// Encode options as JSON, e.g. '{"jpeg":{"quality":80}}'
        #[arg(long)]
        options: Option<String>,
        /// Cancel the encode after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Output file; prints a data URL when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print an SVG file as a data URL without rasterizing
    DataUrl { input: PathBuf },
    /// Report which capabilities are available
    Capabilities,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            input,
            format,
            options,
            timeout_ms,
            output,
        } => {
            let svg = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let options = options
                .map(|json| serde_json::from_str::<RenderOptions>(&json))
                .transpose()
                .context("parsing --options")?;

            let signal = timeout_ms.map(|ms| {
                let token = CancellationToken::new();
                let child = token.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    child.cancel();
                });
                token
            });

            let rasterizer = SvgRasterizer::detect();
            info!("backends: {:?}", rasterizer.backend_names());

            let image = rasterizer
                .render_image(&svg, EncodingFormat::from(format), options, signal)
                .await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, image.data())
                        .await
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!("wrote {} bytes of {} to {}", image.data().len(), image.mime(), path.display());
                }
                None => println!("{}", image.to_data_url()),
            }
        }
        Command::DataUrl { input } => {
            let svg = tokio::fs::read(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            println!("{}", svg_data_url(svg));
        }
        Command::Capabilities => {
            let loader = CapabilityLoader::global();
            for kind in [CapabilityKind::Encoder, CapabilityKind::Renderer] {
                let state = if loader.probe(kind) { "available" } else { "absent" };
                println!("{:<14} {}", kind.name(), state);
            }
        }
    }

    Ok(())
}
