use std::path::PathBuf;

use anyhow::ensure;
use clap::Parser;
use log::{info, warn};
use pcd_simp::prelude::{DrawMode, GridSampler, Params, PointCloud, RenderSession, SimpParams};

#[derive(Parser)]
#[clap(author, version, about)]
struct Args {
    /// left bound of the x range
    #[clap(long, default_value_t = 0.)]
    x_left: f64,

    /// right bound of the x range
    #[clap(long)]
    x_right: f64,

    /// left bound of the y range
    #[clap(long, default_value_t = 0.)]
    y_left: f64,

    /// right bound of the y range
    #[clap(long)]
    y_right: f64,

    /// lattice spacing
    #[clap(long, default_value_t = 1.)]
    quant: f64,

    /// triangulate the lattice
    #[clap(long)]
    indices: bool,

    /// json file of algorithm parameters (e.g. {"cores": {"usize": 4}})
    #[clap(long)]
    params: Option<PathBuf>,
}

fn handler() -> anyhow::Result<()> {
    let args: Args = Args::parse();

    let params = match &args.params {
        Some(path) => {
            ensure!(
                path.exists(),
                "parameter file {:?} is not existed!",
                path.to_string_lossy()
            );
            Params::from_json_str(&std::fs::read_to_string(path)?)?
        }
        None => Params::new(),
    };
    let simp = SimpParams::<f64>::from_params(&params)?;
    info!("using {} cores", simp.cores());

    let sampler = GridSampler::new(
        (args.x_left, args.x_right),
        (args.y_left, args.y_right),
        args.quant,
    )
    .with_indices(args.indices);
    let (nx, ny) = sampler.dims()?;

    let mut cloud = PointCloud::default();
    simp.thread_pool()?.install(|| sampler.sample(&mut cloud))?;

    let mode = if args.indices {
        DrawMode::Triangles
    } else {
        DrawMode::Points
    };
    let session = RenderSession::new();
    let primitives = match session.draw_batch(&cloud, mode) {
        Ok(batch) => batch.primitive_count(),
        Err(e) => {
            warn!("nothing to draw: {}", e);
            0
        }
    };

    let summary = serde_json::json!({
        "nx": nx,
        "ny": ny,
        "points": cloud.len(),
        "triangles": cloud.triangles().rows(),
        "attributes": cloud.attributes().declared_bits(),
        "mode": mode,
        "primitives": primitives,
        "bounds": cloud.bounds(),
        "eps": simp.eps(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn main() {
    env_logger::init();
    match handler() {
        Ok(_) => {}
        Err(e) => {
            eprintln!("error: {:?}", e);
            std::process::exit(1);
        }
    }
}
