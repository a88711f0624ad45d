use std::{
    collections::BTreeMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tessera", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a frame document into a PNG.
    Render(RenderArgs),
    /// Print a JSON summary of a frame document.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input frame document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Renderer settings JSON; environment overrides apply on top.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input frame document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_settings(path: Option<&Path>) -> anyhow::Result<tessera::RendererSettings> {
    let settings = match path {
        Some(path) => {
            let f = File::open(path)
                .with_context(|| format!("open settings '{}'", path.display()))?;
            serde_json::from_reader(BufReader::new(f)).with_context(|| "parse settings JSON")?
        }
        None => tessera::RendererSettings::default(),
    };
    Ok(settings.with_env_overrides())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let settings = read_settings(args.settings.as_deref())?;
    let doc = tessera::FrameDocument::from_path(&args.in_path)?;
    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));

    let mut table = tessera::ResourceTable::new();
    let (metadata, passes) = doc.into_frame(&mut table, base_dir)?;
    let viewport = passes
        .root()
        .map(|p| p.output_rect().size())
        .context("frame document has no passes")?;

    // Delegated handoff first, so the document's resources go through a full
    // export/ack cycle, then rasterize the acked passes locally.
    let mut assembler = tessera::FrameAssembler::new(tessera::InMemoryOutputSurface::new());
    assembler.assemble_frame(passes, &mut table)?;
    assembler.swap(metadata.clone(), &mut table)?;
    let ack = assembler.surface().ack_last();
    assembler.on_swap_ack(&ack, &mut table);
    let mut passes = match assembler.into_surface().frames.pop().map(|f| f.payload) {
        Some(tessera::FramePayload::Delegated(d)) => d.render_pass_list,
        _ => anyhow::bail!("assembled frame was not delegated (bug)"),
    };

    let mut renderer = tessera::SoftwareRenderer::new(settings);
    renderer.begin_frame(viewport, tessera::IntRect::from_size(viewport))?;
    let stats = renderer.draw_frame(&mut passes, &table)?;
    renderer.finish_frame()?;
    let mut surface = tessera::InMemoryOutputSurface::new();
    renderer.swap_buffers(metadata, &mut surface)?;
    renderer.receive_swap_buffers_ack(&surface.ack_last());

    let frame = surface
        .last()
        .and_then(|f| f.software())
        .context("software frame missing after swap (bug)")?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.pixels.to_straight_rgba8(),
        frame.pixels.width(),
        frame.pixels.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} quads drawn, {} skipped)",
        args.out.display(),
        stats.quads_drawn,
        stats.quads_skipped
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct PassSummary {
    id: String,
    output_rect: String,
    shared_quad_states: usize,
    quads: BTreeMap<&'static str, usize>,
}

#[derive(serde::Serialize)]
struct DocumentSummary {
    passes: Vec<PassSummary>,
    resources: Vec<tessera::TransferableResource>,
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let doc = tessera::FrameDocument::from_path(&args.in_path)?;
    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let mut table = tessera::ResourceTable::new();
    let (_, passes) = doc.into_frame(&mut table, base_dir)?;

    let summary = DocumentSummary {
        passes: passes
            .passes()
            .iter()
            .map(|p| {
                let mut quads = BTreeMap::new();
                for q in p.quads() {
                    *quads.entry(q.material().kind().as_str()).or_insert(0) += 1;
                }
                PassSummary {
                    id: p.id().to_string(),
                    output_rect: p.output_rect().to_string(),
                    shared_quad_states: p.shared_quad_states().len(),
                    quads,
                }
            })
            .collect(),
        resources: table.prepare_send_to_parent(passes.resource_ids())?,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).with_context(|| "serialize summary")?
    );
    Ok(())
}
