use structopt::StructOpt;
use vcm_rust::core::geometry::point::Point2i;
use vcm_rust::core::integrator::{Integrator, RenderControl, create_integrator};
use vcm_rust::core::parallel::ParallelScheduler;
use vcm_rust::core::params::RenderParams;
use vcm_rust::core::pbrt::get_progress_bar;
use vcm_rust::core::stats::{print_stats, report_stats};
use vcm_rust::init_stats;
use vcm_rust::scenes::create_scene;
use std::path::PathBuf;
use std::time::Instant;
use anyhow::{Context, Result};
use fern::colors::{ColoredLevelConfig, Color};
use fern::Output;
use log::info;
use std::io::Write;

#[derive(StructOpt, Debug)]
#[structopt(name = "vcm")]
struct Args {
    /// set LOG verbosity
    #[structopt(short, long)]
    verbose: bool,

    /// Specify the file log messages should be written to.
    /// Default: vcm.log in the working directory.
    #[structopt(short, long)]
    logdir: Option<PathBuf>,

    /// Print all logging messages to stderr
    #[structopt(short = "e", long)]
    logtostderr: bool,

    /// Use specified number of threads for rendering
    #[structopt(short, long)]
    nthreads: Option<usize>,

    #[structopt(short, long, parse(from_os_str))]
    /// Write the final image to the given filename
    outfile: Option<PathBuf>,

    /// Built-in scene: cornell_box, emitter_floor, mirror_sphere, foggy_box, point_floor or sky_floor
    #[structopt(short, long, default_value = "cornell_box")]
    scene: String,

    /// Image width and height
    #[structopt(short, long, number_of_values = 2, value_names = &["width", "height"])]
    resolution: Option<Vec<i32>>,

    /// Override a render parameter, e.g. --param sampleCount=32
    #[structopt(short, long = "param")]
    param: Vec<String>,

    /// Integrator: ppm, vcm or photonmap
    #[structopt(default_value = "ppm")]
    integrator: String
}

fn setup_logging(verbose: bool, logdir: PathBuf, stderr: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow);
    let clevel = colors.clone().info(Color::Green);

    let mut base_config = fern::Dispatch::new();

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    base_config = base_config.level(level);

    let file_config = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {}",
                record.level(),
                message
            ))
        })
        .chain(fern::log_file(logdir)?);

    let stderr_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{color_line}[{level}] {message}\x1B[0m",
                color_line = format_args!("\x1B[{}m", colors.get_color(&record.level()).to_fg_str()),
                level = clevel.color(record.level()),
                message = message,
            ));
        })
        .level(level)
        .chain(
            Output::call(|record| {
                if let Some(pb) = get_progress_bar() {
                    pb.println(record.args().to_string());
                } else {
                    writeln!(std::io::stderr(), "{}", record.args()).ok();
                }
            })

        );

    base_config = base_config.chain(file_config);
    if stderr { base_config = base_config.chain(stderr_config); }
    base_config.apply()?;

    Ok(())

}

fn main() -> Result<()> {
    let args: Args = Args::from_args();

    let logdir = args.logdir.unwrap_or_else(|| PathBuf::from("vcm.log"));
    setup_logging(args.verbose, logdir, args.logtostderr)?;
    // Initialize statistics counter
    init_stats();

    let mut params = RenderParams::default();
    params.set_all(&args.param)?;
    if let Some(n) = args.nthreads { params.nthreads = n; }
    if let Some(f) = args.outfile { params.outfile = f; }
    params.validate()?;

    let resolution = match args.resolution {
        Some(r) => Point2i::new(r[0], r[1]),
        None    => Point2i::new(512, 512)
    };
    let scene_name = args.scene;
    let (scene, camera) = create_scene(&scene_name, resolution, &params.outfile)
        .with_context(|| format!("Failed to build scene \"{}\"", scene_name))?;

    let scheduler = ParallelScheduler::new(params.nthreads)?;
    let mut integrator = create_integrator(&args.integrator, camera, &params)?;

    let start = Instant::now();
    let iterations = integrator.render(&scene, &scheduler, &RenderControl::new())?;
    info!(
        "Rendered {} iterations in {:.2}s to \"{}\"",
        iterations, start.elapsed().as_secs_f32(), params.outfile.display());

    report_stats();
    print_stats();

    Ok(())
}
