use std::process::ExitCode;

use clap::Parser;
use membridge::ui::{make_sim, read_config, BridgeArgs};

fn run(argv: &BridgeArgs) -> anyhow::Result<()> {
    let config = read_config(&argv.config_path)?;
    let mut sim = make_sim(&config, Some(argv))?;
    let summary = sim.simulate()?;
    print!("{summary}");
    if let Some(path) = &sim.config().results_json {
        summary.write_json(path)?;
        log::info!("results written to {}", path.display());
    }
    Ok(())
}

pub fn main() -> ExitCode {
    env_logger::init();

    let argv = BridgeArgs::parse();
    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            eprintln!("membridge: {err:#}");
            ExitCode::FAILURE
        }
    }
}
