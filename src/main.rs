use anyhow::Context;
use clap::Parser;
use grblpreview::{
    init_logging, install_panic_hook, CrashReport, EventBus, GcodeToolpath, MachinePreviewPanel,
    Position, PreviewEvent, SettingsStore, SimulatedController,
};
use grblpreview_settings::COLOR_SCHEME_KEY;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tiny_skia::Pixmap;
use tracing::{debug, error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "grblpreview", version)]
#[command(about = "Render a machine preview of a G-code file to a PNG image")]
struct Args {
    /// G-code file to preview
    input: PathBuf,

    /// PNG file to write
    output: PathBuf,

    /// Panel width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Panel height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Settings file (defaults to the per-user settings)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Colour scheme name ("dark" or "light")
    #[arg(long)]
    scheme: Option<String>,

    /// Machine position shown by the overlay, as X,Y,Z
    #[arg(long, value_parser = parse_position, default_value = "0,0,0")]
    position: Position,

    /// Work offset, as X,Y,Z
    #[arg(long, value_parser = parse_position, default_value = "0,0,0")]
    offset: Position,
}

fn parse_position(s: &str) -> Result<Position, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x, y] => Ok(Position::new(*x, *y, 0.0)),
        [x, y, z] => Ok(Position::new(*x, *y, *z)),
        _ => Err(format!("expected X,Y or X,Y,Z, got '{}'", s)),
    }
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    install_panic_hook();

    let args = Args::parse();
    let controller = Arc::new(SimulatedController::new());

    if let Err(e) = run(&args, controller.clone()) {
        let report = CrashReport::from_anyhow(&e).with_controller(controller.description());
        error!(component = "Crash Report", "Preview failed\n{}", report);
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args, controller: Arc<SimulatedController>) -> anyhow::Result<()> {
    let gcode = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let settings = match &args.settings {
        Some(path) => SettingsStore::load(path),
        None => SettingsStore::load_default().unwrap_or_else(|e| {
            warn!("Using in-memory settings: {}", e);
            SettingsStore::new()
        }),
    };
    if let Some(scheme) = &args.scheme {
        settings.set(COLOR_SCHEME_KEY, scheme.clone());
    }

    let bus = Arc::new(EventBus::new());
    let panel = MachinePreviewPanel::new(
        controller.clone(),
        Arc::new(settings),
        bus.clone(),
        Arc::new(|| debug!("Repaint requested")),
    );
    panel.resize(args.width, args.height);

    let filename = args.input.display().to_string();
    let started = Instant::now();
    bus.publish(PreviewEvent::FileLoading {
        elapsed_ms: 0,
        filename: filename.clone(),
    })?;

    let toolpath = GcodeToolpath::parse(&gcode);
    if toolpath.is_empty() {
        warn!("{} contains no XY motion", filename);
    }
    controller.load_file(Arc::new(toolpath));
    bus.publish(PreviewEvent::FileLoaded {
        elapsed_ms: started.elapsed().as_millis() as u64,
        filename,
    })?;

    controller.set_working_offset(args.offset);
    controller.set_machine_position(args.position);
    panel.timer_update();
    panel.wait_for_render();

    let mut frame = Pixmap::new(args.width, args.height)
        .with_context(|| format!("invalid output size {}x{}", args.width, args.height))?;
    let status = panel.paint(&mut frame);
    frame
        .save_png(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!("Wrote preview to {}", args.output.display());
    println!("{}", status);
    Ok(())
}
