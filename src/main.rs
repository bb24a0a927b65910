use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ringlog::*;

mod client;
mod config;
mod dashboard;
mod poller;
mod server;
mod store;
mod workbench;

use config::Config;

#[derive(Parser)]
#[command(name = "pulseboard", version, about = "Operations metrics viewer")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address from the config
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::Info,
        1 => Level::Debug,
        _ => Level::Trace,
    };

    let log = LogBuilder::new()
        .output(Box::new(Stderr::new()))
        .log_queue_depth(4096)
        .single_message_size(4096)
        .build()
        .expect("failed to initialize log");

    let mut log = MultiLogBuilder::new()
        .level_filter(level.to_level_filter())
        .default(log)
        .build()
        .start();

    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_millis(100));
        let _ = log.flush();
    });

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    if let Some(listen) = args.listen {
        config.general.listen = listen;
    }

    ctrlc::set_handler(move || {
        info!("shutting down");
        std::process::exit(0);
    })
    .expect("failed to set signal handler");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to initialize runtime");

    if let Err(e) = runtime.block_on(server::run(config)) {
        error!("{e:#}");
        std::process::exit(1);
    }
}
