use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use toml::Table;

use crate::sim::config::{Config, MemConfig, SimConfig};
use crate::sim::top::Sim;
use crate::traffic::TrafficConfig;

#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct BridgeArgs {
    #[arg(help = "Path to config.toml")]
    pub config_path: PathBuf,
    #[arg(long, help = "Override simulation timeout in PE cycles")]
    pub timeout: Option<u64>,
    #[arg(long, help = "Enable log at level (0:none, 1:info, 2:debug)")]
    pub log: Option<u64>,
    #[arg(long, help = "Override oracle cycles per PE cycle")]
    pub clock_ratio: Option<u32>,
    #[arg(long, help = "Write the run summary as JSON to this path")]
    pub results_json: Option<PathBuf>,
}

pub fn read_config(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))
}

/// Make a Sim object from the TOML configuration.
/// If `cli_args` is given, override TOML options with CLI arguments.
pub fn make_sim(toml_string: &str, cli_args: Option<&BridgeArgs>) -> anyhow::Result<Sim> {
    let config_table: Table = toml::from_str(toml_string).context("cannot parse config toml")?;
    let mut sim_config = SimConfig::from_section(config_table.get("sim")).context("[sim]")?;
    let mut mem_config = MemConfig::from_section(config_table.get("mem")).context("[mem]")?;
    let traffic_config =
        TrafficConfig::from_section(config_table.get("traffic")).context("[traffic]")?;

    // override toml configs with CLI args
    if let Some(args) = cli_args {
        sim_config.timeout = args.timeout.unwrap_or(sim_config.timeout);
        sim_config.log_level = args.log.unwrap_or(sim_config.log_level);
        mem_config.clock_ratio = args.clock_ratio.unwrap_or(mem_config.clock_ratio);
        if args.results_json.is_some() {
            sim_config.results_json = args.results_json.clone();
        }
    }

    Sim::new(sim_config, mem_config, traffic_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
        [sim]
        timeout = 2000
        [mem]
        clock_ratio = 2
        [traffic]
        num_origins = 4
        requests_per_origin = 16
        pattern = "strided"
        stride = 4096
    "#;

    #[test]
    fn toml_sections_reach_the_sim() {
        let sim = make_sim(CONFIG, None).unwrap();
        assert_eq!(sim.config().timeout, 2000);
        assert_eq!(sim.origins().len(), 4);
        assert_eq!(sim.bridge().oracle().clock_ratio(), 2);
        assert_eq!(sim.bridge().origins().len(), 4);
    }

    #[test]
    fn cli_overrides_toml() {
        let args = BridgeArgs {
            timeout: Some(10),
            clock_ratio: Some(3),
            results_json: Some(PathBuf::from("out.json")),
            ..BridgeArgs::default()
        };
        let sim = make_sim(CONFIG, Some(&args)).unwrap();
        assert_eq!(sim.config().timeout, 10);
        assert_eq!(sim.bridge().oracle().clock_ratio(), 3);
        assert_eq!(sim.config().results_json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn bad_profile_is_a_setup_error() {
        let err = make_sim("[mem]\ntiming_profile = \"nope\"\n", None).err().unwrap();
        assert!(format!("{err:#}").contains("nope"));
    }

    #[test]
    fn unknown_pattern_is_rejected() {
        assert!(make_sim("[traffic]\npattern = \"zigzag\"\n", None).is_err());
    }

    #[test]
    fn args_parse() {
        let args = BridgeArgs::parse_from(["membridge", "cfg.toml", "--timeout", "7", "--log", "1"]);
        assert_eq!(args.config_path, PathBuf::from("cfg.toml"));
        assert_eq!(args.timeout, Some(7));
        assert_eq!(args.log, Some(1));
        assert_eq!(args.clock_ratio, None);
    }
}
