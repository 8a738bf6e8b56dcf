mod cache;
mod document;

use anyhow::{Context, Result, bail};
use cache::DocumentCache;
use clap::{Parser, Subcommand};
use depan_core::{EdgeMatcher, RelationRegistry};
use depan_view::{GraphView, LayoutKind, RecordingSurface, RenderLoop, ViewConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless host for the DepAn graph view", long_about = None)]
struct Args {
    /// View configuration file (JSON). Defaults apply when absent.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Viewport width in pixels
    #[arg(long, global = true, default_value_t = 1024)]
    width: u32,

    /// Viewport height in pixels
    #[arg(long, global = true, default_value_t = 768)]
    height: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out every node and print the positions as JSON
    Layout {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long, default_value = "force")]
        layout: LayoutKind,

        /// Relations that form the layout hierarchy; all relations when omitted
        #[arg(short, long = "relation")]
        relations: Vec<String>,

        /// Write positions here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Drive frames against a recording surface and report draw statistics
    Render {
        #[arg(short, long)]
        graph: PathBuf,

        #[arg(short, long, default_value_t = 60)]
        frames: usize,

        /// Apply this layout before the first frame
        #[arg(short, long)]
        layout: Option<LayoutKind>,
    },
    /// Print degree and rank statistics
    Stats {
        #[arg(short, long)]
        graph: PathBuf,

        /// Number of top ranked nodes to list
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewConfig::from_path(path)
            .with_context(|| format!("Failed to load view configuration {}", path.display()))?,
        None => ViewConfig::default(),
    };
    let mut documents = DocumentCache::new();

    match &args.command {
        Command::Layout {
            graph,
            layout,
            relations,
            out,
        } => {
            let mut view = open_view(&mut documents, graph, config, &args)?;
            let matcher = matcher_for(view.relations(), relations)?;
            let moves = view.apply_layout(*layout, None, &matcher);
            let json = document::positions_json(&moves)?;
            match out {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Wrote {} positions to {}", moves.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Render {
            graph,
            frames,
            layout,
        } => {
            let interval = Duration::from_millis(config.frame_interval_ms);
            let mut view = open_view(&mut documents, graph, config, &args)?;
            if let Some(kind) = layout {
                view.apply_layout(*kind, None, &EdgeMatcher::all());
            }
            render(&mut view, *frames, interval)?;
        }
        Command::Stats { graph, top } => {
            let view = open_view(&mut documents, graph, config, &args)?;
            let model = view.model();
            let stats = view.statistics();
            println!("Nodes: {}", model.node_count());
            println!("Edges: {}", model.edge_count());
            println!("Max degree: {}", stats.max_degree);
            println!("Top ranked:");
            for index in stats.top_ranked(*top) {
                let Some(node) = model.node(index) else {
                    continue;
                };
                println!(
                    "  {:>6} {:<32} degree {:>4} rank {:.4}",
                    node.node.0,
                    node.name,
                    stats.degree.get(index.0).copied().unwrap_or(0),
                    stats.rank.get(index.0).copied().unwrap_or(0.0)
                );
            }
        }
    }
    Ok(())
}

fn open_view(
    documents: &mut DocumentCache,
    path: &Path,
    config: ViewConfig,
    args: &Args,
) -> Result<GraphView> {
    let document = documents.load(path)?;
    Ok(GraphView::open(
        document.graph(),
        document.relations(),
        &document.repository(),
        config,
        args.width,
        args.height,
    ))
}

fn matcher_for(registry: &RelationRegistry, names: &[String]) -> Result<EdgeMatcher> {
    if names.is_empty() {
        return Ok(EdgeMatcher::all());
    }
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(registry.by_name(name)?.id);
    }
    Ok(EdgeMatcher::forward(ids))
}

const STALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Let the render loop pace `frames` frames through the view's host queue.
fn render(view: &mut GraphView, frames: usize, interval: Duration) -> Result<()> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let mut ticker = RenderLoop::spawn(interval, tx).context("Failed to start render loop")?;
    let mut surface = RecordingSurface::new();
    let started = Instant::now();

    let mut drawn = 0;
    let mut last_frame = Instant::now();
    while drawn < frames {
        let pumped = view.pump(&rx, &mut surface)?;
        if pumped > 0 {
            drawn += pumped;
            last_frame = Instant::now();
        } else if last_frame.elapsed() > STALL_TIMEOUT {
            ticker.dispose();
            bail!("Render loop stalled after {drawn} frames");
        }
        std::thread::sleep(interval / 2);
    }
    ticker.dispose();

    let stats = surface.stats();
    println!("Frames: {drawn} in {:.1?}", started.elapsed());
    println!("Primitives: {}", stats.primitives);
    println!("Vertices: {}", stats.vertices);
    println!("Label textures: {} created, {} drawn", stats.textures_created, stats.textures_drawn);
    println!("Still animating: {}", view.is_animating());
    view.dispose(&mut surface);
    Ok(())
}
