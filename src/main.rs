use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use simplelog::{Config, LevelFilter, WriteLogger};

use pagemark::export::FormExporter;
use pagemark::form::{FieldKey, FormValues};
use pagemark::raster::PageRasterizer;
use pagemark::segment::Segment;
use pagemark::settings::Settings;
use pagemark::viewer::DocumentViewer;

#[derive(Parser)]
#[command(
    name = "pagemark",
    version,
    about = "Document page rendering and annotation overlay engine"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print document metadata and per-page native sizes
    Info { doc: PathBuf },

    /// Rasterize every page to PNG files
    Render {
        doc: PathBuf,
        /// Zoom factor to render at
        #[arg(long, default_value_t = 1.5)]
        scale: f32,
        /// Output directory for page images
        #[arg(long, default_value = "pages")]
        out: PathBuf,
    },

    /// Write form values into the document and save the filled copy
    Fill {
        doc: PathBuf,
        /// Segment list JSON from the analysis service
        #[arg(long)]
        segments: PathBuf,
        /// JSON object mapping field labels to entered values
        #[arg(long)]
        values: PathBuf,
        /// Path for the filled document
        #[arg(long)]
        out: PathBuf,
    },

    /// Emit the flat field-values JSON record
    Values {
        #[arg(long)]
        segments: PathBuf,
        #[arg(long)]
        values: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load();

    WriteLogger::init(
        LevelFilter::Info,
        Config::default(),
        fs::File::create(&settings.log_file)
            .with_context(|| format!("Failed to create log file {}", settings.log_file.display()))?,
    )?;

    match cli.command {
        CliCommand::Info { doc } => info_command(&doc),
        CliCommand::Render { doc, scale, out } => render_command(&doc, scale, &out),
        CliCommand::Fill {
            doc,
            segments,
            values,
            out,
        } => fill_command(&doc, &segments, &values, &out, &settings),
        CliCommand::Values { segments, values } => values_command(&segments, &values),
    }
}

fn info_command(doc: &Path) -> Result<()> {
    let bytes = fs::read(doc).with_context(|| format!("Failed to read {}", doc.display()))?;
    let rasterizer = PageRasterizer::from_bytes(&bytes).context("Failed to load document")?;

    println!("pages: {}", rasterizer.page_count());
    if let Some(title) = rasterizer.title() {
        println!("title: {title}");
    }
    for page in 0..rasterizer.page_count() {
        let size = rasterizer.native_size(page)?;
        println!("page {:>3}: {:.1} x {:.1}", page + 1, size.width, size.height);
    }
    Ok(())
}

fn render_command(doc: &Path, scale: f32, out: &Path) -> Result<()> {
    let bytes = fs::read(doc).with_context(|| format!("Failed to read {}", doc.display()))?;
    let rasterizer = PageRasterizer::from_bytes(&bytes).context("Failed to load document")?;

    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    for surface in rasterizer.rasterize_all(scale)? {
        let image = surface
            .image
            .to_rgb_image()
            .context("Surface dimensions do not match its pixel buffer")?;
        let path = out.join(format!("page-{:03}.png", surface.page + 1));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "wrote {} ({}x{} px)",
            path.display(),
            surface.image.width_px,
            surface.image.height_px
        );
    }
    Ok(())
}

fn load_segments(path: &Path) -> Result<Vec<Segment>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read segments file {}", path.display()))?;
    serde_json::from_str(&json).context("Failed to parse segments JSON")
}

/// Values files map field labels to entered strings; labels resolve to
/// field keys through the segment list.
fn load_values(path: &Path, segments: &[Segment]) -> Result<FormValues> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read values file {}", path.display()))?;
    let by_label: std::collections::BTreeMap<String, String> =
        serde_json::from_str(&json).context("Failed to parse values JSON")?;

    let mut values = FormValues::new();
    for (label, value) in by_label {
        let Some(segment) = segments.iter().find(|s| s.label() == label) else {
            bail!("no segment labelled '{label}' in the segment list");
        };
        values.set(FieldKey::for_segment(segment), value);
    }
    Ok(values)
}

fn fill_command(
    doc: &Path,
    segments_path: &Path,
    values_path: &Path,
    out: &Path,
    settings: &Settings,
) -> Result<()> {
    let bytes = fs::read(doc).with_context(|| format!("Failed to read {}", doc.display()))?;
    let segments = load_segments(segments_path)?;
    let values = load_values(values_path, &segments)?;

    let mut viewer = DocumentViewer::with_settings(settings);
    viewer.load_document(bytes).context("Failed to load document")?;
    viewer.set_segments(segments)?;
    for (key, value) in values.iter() {
        viewer.set_field_value(*key, value);
    }

    let filled = viewer.export_filled().context("Export failed")?;
    fs::write(out, filled).with_context(|| format!("Failed to write {}", out.display()))?;
    info!("wrote filled document to {}", out.display());
    println!("{}", out.display());
    Ok(())
}

fn values_command(segments_path: &Path, values_path: &Path) -> Result<()> {
    let segments = load_segments(segments_path)?;
    let values = load_values(values_path, &segments)?;
    let record = FormExporter::export_values(&values, &segments)?;
    println!("{record}");
    Ok(())
}
