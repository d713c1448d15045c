use clap::Parser;
use postboard::{Cli, Config, run};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (mut config, config_source) = match &cli.config {
        Some(path) => (Config::load_from_path(path)?, Some(path.clone())),
        None => Config::load()?,
    };
    config.apply_env_overrides()?;

    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config, config_source))
}
