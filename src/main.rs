mod app;

use std::path::PathBuf;

use clap::Parser;
use relgraph::{EngineConfig, ForceConfig};
use tracing_subscriber::EnvFilter;

use app::LaunchOptions;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with `entities` and `relations` arrays.
    data_path: PathBuf,

    /// Entity to focus on first (id, name or fuzzy query).
    #[arg(long)]
    focus: Option<String>,

    /// Only show relations of this type.
    #[arg(long)]
    relation_type: Option<String>,

    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    #[arg(long, default_value_t = 820.0)]
    height: f32,

    /// Many-body strength; negative values repel.
    #[arg(long, default_value_t = -120.0, allow_hyphen_values = true)]
    charge: f32,

    #[arg(long, default_value_t = 80.0)]
    link_distance: f32,

    /// Disable the collision force.
    #[arg(long)]
    no_collide: bool,

    /// Log filter, e.g. `debug` or `relgraph=trace`. Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let mut forces = ForceConfig::default();
        forces.many_body.strength = self.charge;
        forces.link.distance = self.link_distance.max(1.0);
        if self.no_collide {
            forces.collide = None;
        }
        EngineConfig {
            forces,
            ..EngineConfig::default()
        }
    }
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relgraph=info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width.max(320.0), args.height.max(240.0)]),
        ..Default::default()
    };
    let launch = LaunchOptions {
        config: args.engine_config(),
        data_path: args.data_path,
        focus: args.focus,
        relation_type: args.relation_type,
    };

    eframe::run_native(
        "relgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::RelGraphApp::new(cc, launch)))),
    )
}
