use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use propkit::assets::FileAssets;
use propkit::compositor::FileTemplates;
use propkit::export::{CanvasRasterizer, FileSink, SummaryPacker};
use propkit::sync::Pipeline;
use propkit::{datefmt, FormSnapshot, StudioConfig, TemplateVariant};

#[derive(Parser)]
#[command(
    name = "propkit",
    version,
    about = "Populate listing templates and export marketing assets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate a template variant and export its image
    Render {
        /// Form snapshot as JSON
        #[arg(long)]
        form: PathBuf,
        /// social, newsletter, flyer, or all
        #[arg(long, default_value = "social")]
        variant: String,
        /// Directory containing the templates/ tree
        #[arg(long, default_value = ".")]
        templates: PathBuf,
        /// Directory containing the assets/ tree
        #[arg(long, default_value = ".")]
        assets: PathBuf,
        /// Output directory for exported files
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Property photo to composite
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Export the labeled property summary document
    Summary {
        /// Form snapshot as JSON
        #[arg(long)]
        form: PathBuf,
        /// Output directory for exported files
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
}

fn load_snapshot(form: &PathBuf, photo: Option<&PathBuf>) -> anyhow::Result<FormSnapshot> {
    let text = std::fs::read_to_string(form)
        .with_context(|| format!("reading form {}", form.display()))?;
    let mut snapshot: FormSnapshot =
        serde_json::from_str(&text).with_context(|| format!("parsing form {}", form.display()))?;
    if snapshot.date.is_empty() {
        snapshot.date = datefmt::today_ymd();
    }
    if let Some(path) = photo {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading photo {}", path.display()))?;
        snapshot.photo = Some(bytes);
    }
    Ok(snapshot)
}

fn pipeline(templates: PathBuf, assets: PathBuf, out: PathBuf) -> Pipeline {
    Pipeline::new(
        StudioConfig::default(),
        Box::new(FileTemplates::new(templates)),
        Box::new(FileAssets::new(assets)),
        Box::new(CanvasRasterizer),
        Box::new(FileSink::new(out)),
        Box::new(SummaryPacker),
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            form,
            variant,
            templates,
            assets,
            out,
            photo,
        } => {
            let snapshot = load_snapshot(&form, photo.as_ref())?;
            let mut pipeline = pipeline(templates, assets, out);

            let variants: Vec<TemplateVariant> = if variant == "all" {
                TemplateVariant::ALL.to_vec()
            } else {
                vec![TemplateVariant::parse(&variant)
                    .with_context(|| format!("unknown variant '{}'", variant))?]
            };

            for v in variants {
                let receipt = pipeline
                    .export(v, &snapshot)
                    .with_context(|| format!("exporting {}", v.name()))?;
                println!("{} ({} bytes)", receipt.filename, receipt.bytes);
            }
        }
        Commands::Summary { form, out } => {
            let snapshot = load_snapshot(&form, None)?;
            let mut pipeline = pipeline(PathBuf::from("."), PathBuf::from("."), out);
            let receipt = pipeline
                .export_summary(&snapshot)
                .context("exporting summary")?;
            println!("{} ({} bytes)", receipt.filename, receipt.bytes);
        }
    }
    Ok(())
}
