use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;

use raymarch::{
    animation::{Animation, Orbiters, Still},
    app::App,
    camera::Viewport,
    canvas::Canvas,
    input::InputEvent,
    pipeline::PipelineContext,
    script,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SceneKind {
    /// Spheres circling the origin.
    Orbiters,

    /// A unit sphere at the origin.
    Single,

    /// A sphere, a box and a torus.
    Shapes,
}

/// Render sphere-traced distance fields around an orbit camera.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 200)]
    height: u32,

    /// Worker threads, defaults to the number of cores.
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Directory holding the pipeline sources.
    #[arg(long, default_value = "shaders")]
    shaders: PathBuf,

    /// Name of the pipeline to build, without its extension.
    #[arg(long, default_value = "raymarch")]
    pipeline: String,

    #[arg(long, value_enum, default_value_t = SceneKind::Orbiters)]
    scene: SceneKind,

    /// How many spheres the orbiters scene has.
    #[arg(long, default_value_t = 5)]
    orbiters: usize,

    /// Time of the single frame rendered when no script is given.
    #[arg(long, default_value_t = 0.)]
    time: f32,

    /// Replay recorded input from this file, writing one image per frame.
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Print frames to stdout as ascii art instead of writing images.
    #[arg(long)]
    ascii: bool,
}

/// Where frame `index` is written when a script produces several of them.
fn numbered(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| String::from("frame"), |s| s.to_string_lossy().into_owned());
    let ext = output
        .extension()
        .map_or_else(|| String::from("png"), |s| s.to_string_lossy().into_owned());
    output.with_file_name(format!("{}-{:04}.{}", stem, index, ext))
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();

    let pipeline = PipelineContext::load(&args.shaders, &args.pipeline)
        .context("Failed to build the initial pipeline")?;

    let animation: Box<dyn Animation> = match args.scene {
        SceneKind::Orbiters => Box::new(Orbiters::new(args.orbiters, 1.5)),
        SceneKind::Single => Box::new(Still::single()),
        SceneKind::Shapes => Box::new(Still::shapes()),
    };

    let threads = args.threads.unwrap_or_else(num_cpus::get);
    let mut app = App::new(
        pipeline,
        animation,
        Viewport::new(args.width, args.height),
        threads,
    );

    let (events, numbered_output) = match &args.script {
        Some(path) => (script::load(path)?, true),
        None => (vec![InputEvent::Frame { time: args.time }], false),
    };

    let mut index = 0;
    let frames = app.run(events, |time, canvas: &Canvas| {
        if args.ascii {
            println!("{}", canvas.to_ascii());
        } else {
            let path = if numbered_output {
                numbered(&args.output, index)
            } else {
                args.output.clone()
            };
            canvas.save(&path)?;
            info!("wrote frame at t={} to `{}`", time, path.display());
        }
        index += 1;
        Ok(())
    })?;

    info!("rendered {} frame(s) on {} thread(s)", frames, threads);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered() {
        assert_eq!(
            PathBuf::from("out/frame-0003.png"),
            numbered(Path::new("out/frame.png"), 3)
        );
        assert_eq!(PathBuf::from("shot-0012.png"), numbered(Path::new("shot"), 12));
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["raymarch", "--scene", "shapes", "-j", "3", "--ascii"]);
        assert_eq!(SceneKind::Shapes, args.scene);
        assert_eq!(Some(3), args.threads);
        assert!(args.ascii);
        assert_eq!("raymarch", args.pipeline);
    }
}
