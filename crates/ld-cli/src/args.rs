//! Command line arguments and their merge into a [`DrawConfig`]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use ld_engine::{DrawConfig, RoundSpec, TimingProfile};

#[derive(Parser, Debug)]
#[command(name = "luckydraw", about = "Draw unique winning numbers across prize rounds")]
pub struct Args {
    /// Draw config file (.json, .yaml or .yml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lowest number in the pool
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<i64>,

    /// Highest number in the pool
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<i64>,

    /// Round as NAME=COUNT, repeatable; replaces the configured rounds
    #[arg(short, long = "round", value_name = "NAME=COUNT")]
    pub rounds: Vec<String>,

    /// Fixed RNG seed for a reproducible draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Spin timing
    #[arg(short, long, value_enum)]
    pub timing: Option<TimingArg>,

    /// Spin until every round is complete
    #[arg(long)]
    pub auto: bool,

    /// Write the winner history as JSON when the draw ends
    #[arg(short, long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimingArg {
    Normal,
    Turbo,
    Studio,
}

impl From<TimingArg> for TimingProfile {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Normal => TimingProfile::Normal,
            TimingArg::Turbo => TimingProfile::Turbo,
            TimingArg::Studio => TimingProfile::Studio,
        }
    }
}

impl Args {
    /// Config file (or defaults) with command line overrides applied
    pub fn to_config(&self) -> Result<DrawConfig> {
        let mut config = match &self.config {
            Some(path) => DrawConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => DrawConfig::default(),
        };

        if let Some(min) = self.min {
            config.range.min = min;
        }
        if let Some(max) = self.max {
            config.range.max = max;
        }
        if !self.rounds.is_empty() {
            config.rounds = self
                .rounds
                .iter()
                .map(|r| RoundSpec::parse(r))
                .collect::<Result<Vec<_>, _>>()
                .context("Invalid --round")?;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(timing) = self.timing {
            config.timing = timing.into();
        }

        config.validate().context("Draw cannot be played")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("luckydraw").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).to_config().unwrap();
        assert_eq!(config, DrawConfig::default());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--min", "-5", "--max", "5", "-r", "Gold=2", "-r", "Silver = 3", "--seed", "9", "-t",
            "studio",
        ]);
        let config = args.to_config().unwrap();

        assert_eq!(config.range.min, -5);
        assert_eq!(config.range.max, 5);
        assert_eq!(
            config.rounds,
            vec![RoundSpec::new("Gold", 2), RoundSpec::new("Silver", 3)]
        );
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.timing, TimingProfile::Studio);
    }

    #[test]
    fn test_rejects_bad_round() {
        let err = parse(&["-r", "Gold"]).to_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ld_engine::DrawError>(),
            Some(ld_engine::DrawError::InvalidRoundSpec(_))
        ));
        assert!(parse(&["-r", "Gold=many"]).to_config().is_err());
    }

    #[test]
    fn test_rejects_unplayable_draw() {
        // Six default winners from a pool of three
        assert!(parse(&["--min", "1", "--max", "3"]).to_config().is_err());
        assert!(parse(&["-r", "Empty=0"]).to_config().is_err());
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "range: {{ min: 10, max: 20 }}\nrounds:\n  - {{ name: Grand, required_count: 1 }}\ntiming: turbo"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = parse(&["-c", &path, "--max", "30"]).to_config().unwrap();
        assert_eq!(config.range.min, 10);
        assert_eq!(config.range.max, 30);
        assert_eq!(config.rounds, vec![RoundSpec::new("Grand", 1)]);
        assert_eq!(config.timing, TimingProfile::Turbo);
    }

    #[test]
    fn test_auto_and_export_flags() {
        let args = parse(&["--auto", "-e", "winners.json", "--print-config"]);
        assert!(args.auto);
        assert!(args.print_config);
        assert_eq!(args.export, Some(PathBuf::from("winners.json")));
    }
}
