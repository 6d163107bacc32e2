mod app;
mod atlas;
mod layout;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file with cluster definitions; falls back to the bundled dataset.
    #[arg(long)]
    data: Option<String>,

    /// Subject slug to open directly instead of the overview.
    #[arg(long)]
    subject: Option<String>,

    /// Seed for the procedural layout so runs are reproducible.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Layout canvas width in world units.
    #[arg(long, default_value_t = 1920.0)]
    canvas_width: f32,

    /// Layout canvas height in world units.
    #[arg(long, default_value_t = 1080.0)]
    canvas_height: f32,
}

fn main() -> eframe::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let source = atlas::AtlasSource {
        data_path: args.data,
        subject: args.subject,
        seed: args.seed,
        canvas_width: args.canvas_width,
        canvas_height: args.canvas_height,
    };

    eframe::run_native(
        "atlas-canvas",
        options,
        Box::new(move |cc| Ok(Box::new(app::AtlasApp::new(cc, source)))),
    )
}
