mod args;
mod forms;

use clap::Parser;
use log::{info, warn};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let res = if args.once {
        forms::run_once(&args)
    } else {
        forms::run_watch(&args).map(|stats| {
            info!(
                "{} refresh(es), {} with output, {} failed fetch(es), {} failed update(s), last response {}",
                stats.iterations,
                stats.deliveries,
                stats.fetch_failures,
                stats.consume_failures,
                stats.watermark
            );
        })
    };

    if let Err(e) = res {
        warn!("Error occurred {:?}", e);
        eprintln!("An error occurred: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
