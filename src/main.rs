use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tachyon_rewrite::attachment::AttachmentIndex;
use tachyon_rewrite::downsize::SizeRequest;
use tachyon_rewrite::engine::Engine;
use tachyon_rewrite::srcset::{format_srcset, parse_srcset};
use tachyon_rewrite::{batch, config, output};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tachyon-rewrite")]
#[command(about = "Rewrite uploaded-image references to image CDN URLs")]
#[command(long_about = "\
Rewrite uploaded-image references to image CDN URLs

Images under the upload base are pointed at the CDN with resize, fit, w or
h arguments inferred from the tag's attributes, its class names, the
filename's -WxH suffix and the attachment's recorded sizes.

Inputs:

  tachyon.toml        Host config: upload base, CDN base, content width,
                      registered sizes (see 'tachyon-rewrite gen-config')
  attachments.json    Attachment records:
                      [{\"id\": 42, \"file\": \"2020/01/photo.jpg\",
                        \"width\": 1280, \"height\": 719,
                        \"sizes\": {\"medium\": {\"file\": \"photo-300x169.jpg\",
                                               \"width\": 300, \"height\": 169}}}]

Set RUST_LOG=debug to see per-image decisions on stderr.")]
#[command(version)]
struct Cli {
    /// Host config file (stock defaults when missing)
    #[arg(long, default_value = "tachyon.toml", global = true)]
    config: PathBuf,

    /// Attachment records (JSON)
    #[arg(long, global = true)]
    attachments: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite an HTML file to stdout, or every HTML file in a directory in place
    Rewrite {
        /// HTML file or directory
        path: PathBuf,
    },
    /// Rewrite a srcset attribute value
    Srcset {
        /// The srcset value, e.g. "a-300x169.jpg 300w, a.jpg 1280w"
        srcset: String,
        /// Attachment the candidates belong to
        #[arg(long)]
        attachment: Option<u64>,
        /// The image's main src
        #[arg(long, default_value = "")]
        image_src: String,
    },
    /// Resolve an attachment at a registered size name or a WxH box
    Downsize {
        /// Attachment ID
        id: u64,
        /// Size name (thumbnail, large, ...) or WIDTHxHEIGHT
        size: SizeRequest,
    },
    /// List the registered size catalog
    Sizes,
    /// Print a stock tachyon.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let engine = || build_engine(&cli.config, cli.attachments.as_deref());

    match cli.command {
        Command::Rewrite { path } => {
            let engine = engine()?;
            if path.is_dir() {
                let report = batch::rewrite_dir(&engine, &path)?;
                output::print_batch_report(&report, &path);
            } else {
                let html = std::fs::read_to_string(&path)?;
                print!("{}", engine.rewrite_content(&html));
            }
        }
        Command::Srcset {
            srcset,
            attachment,
            image_src,
        } => {
            let engine = engine()?;
            let candidates = parse_srcset(&srcset);
            let rewritten = engine.rewrite_srcset(&candidates, &image_src, attachment);
            println!("{}", format_srcset(&rewritten));
        }
        Command::Downsize { id, size } => {
            let engine = engine()?;
            let result = engine.downsize(id, &size);
            output::print_downsize(id, &size, result.as_ref());
        }
        Command::Sizes => output::print_sizes(engine()?.catalog()),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

/// Log to stderr so rewritten output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(
    config_path: &Path,
    attachments: Option<&Path>,
) -> Result<Engine, Box<dyn std::error::Error>> {
    let host = config::load_config(config_path)?;
    let engine = Engine::new(host);
    Ok(match attachments {
        Some(path) => engine.with_attachments(AttachmentIndex::load(path)?),
        None => engine,
    })
}
