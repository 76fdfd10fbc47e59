use acomm::{Position, Preset};
use clap::{Args, Parser, Subcommand};

/// Probe a simulated underwater acoustic link.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Physics preset (default, shallow_water, deep_water, high_noise,
    /// low_power, harsh, realistic_testing).
    #[arg(short, long, default_value_t = Preset::Default)]
    pub preset: Preset,

    /// Override the preset's carrier frequency (Hz).
    #[arg(short, long)]
    pub frequency: Option<f64>,

    /// Sea state, clamped to 0..=12.
    #[arg(long, allow_hyphen_values = true)]
    pub sea_state: Option<i32>,

    /// Surface water temperature (°C).
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<f64>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the configuration, with derived linear values, as JSON.
    Config,

    /// Simulate transmissions and print each record as a JSON line.
    Simulate(Simulate),

    /// Print an advisory channel quality snapshot as JSON.
    Quality {
        /// Range (meters).
        #[arg(short, long)]
        range: f64,

        /// Receiver depth (meters).
        #[arg(short, long, default_value_t = 50.0)]
        depth: f64,
    },

    /// Print loss probability over a range sweep as CSV.
    Sweep(Sweep),

    /// Plot loss probability over a range sweep to the terminal.
    Plot(Sweep),
}

#[derive(Debug, Clone, Args)]
pub struct Simulate {
    /// Sender "x,y,depth" in meters.
    #[arg(long, allow_hyphen_values = true)]
    pub from: Position,

    /// Receiver "x,y,depth" in meters.
    #[arg(long, allow_hyphen_values = true)]
    pub to: Position,

    /// Number of transmissions.
    #[arg(short, long, default_value_t = 10)]
    pub count: u32,

    /// Payload size (bytes).
    #[arg(long, default_value_t = 50)]
    pub payload: u32,

    #[arg(long, default_value = "ship")]
    pub sender: String,

    #[arg(long, default_value = "uuv")]
    pub receiver: String,

    #[arg(long, default_value = "command")]
    pub packet_type: String,

    /// Seed the channel's random source for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct Sweep {
    /// First range (meters).
    #[arg(long, default_value_t = 1.0)]
    pub start: f64,

    /// Last range (meters).
    #[arg(long, default_value_t = 5_000.0)]
    pub end: f64,

    /// Range increment (meters), strictly positive.
    #[arg(long, default_value_t = 50.0, value_parser = parse_step)]
    pub step: f64,

    /// Sender depth (meters).
    #[arg(long, default_value_t = 0.0)]
    pub sender_depth: f64,

    /// Receiver depth (meters).
    #[arg(long, default_value_t = 50.0)]
    pub receiver_depth: f64,

    /// Payload size (bytes).
    #[arg(long, default_value_t = 50)]
    pub payload: u32,
}

impl Sweep {
    /// Ranges from `start` to `end` inclusive.
    #[allow(clippy::cast_precision_loss)]
    pub fn ranges(&self) -> impl Iterator<Item = f64> + '_ {
        (0_u64..)
            .map(move |n| self.start + n as f64 * self.step)
            .take_while(move |range| *range <= self.end)
    }
}

fn parse_step(s: &str) -> Result<f64, String> {
    let step: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if step.is_finite() && step > 0.0 {
        Ok(step)
    } else {
        Err(format!("step must be a positive number of meters, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command, Sweep};
    use acomm::{Position, Preset};
    use clap::Parser;

    #[test]
    fn test_sweep_ranges_inclusive() {
        let sweep = Sweep {
            start: 0.0,
            end: 100.0,
            step: 25.0,
            sender_depth: 0.0,
            receiver_depth: 0.0,
            payload: 50,
        };
        let ranges: Vec<f64> = sweep.ranges().collect();
        assert_eq!(ranges, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "linkprobe",
            "--preset",
            "harsh",
            "--sea-state",
            "4",
            "simulate",
            "--from",
            "-10,0,0",
            "--to",
            "400,300,60",
            "--seed",
            "9",
        ])
        .unwrap();
        assert_eq!(cli.preset, Preset::Harsh);
        assert_eq!(cli.sea_state, Some(4));
        let Command::Simulate(sim) = cli.cmd else {
            panic!("expected simulate");
        };
        assert_eq!(sim.from, Position::new(-10.0, 0.0, 0.0));
        assert_eq!(sim.to, Position::new(400.0, 300.0, 60.0));
        assert_eq!(sim.count, 10);
        assert_eq!(sim.seed, Some(9));
    }

    #[test]
    fn test_sweep_step_must_be_positive() {
        for step in ["0", "-5", "nan", "inf"] {
            let parsed = Cli::try_parse_from(["linkprobe", "sweep", "--step", step]);
            assert!(parsed.is_err(), "accepted step {step}");
        }
        let cli = Cli::try_parse_from(["linkprobe", "plot", "--step", "12.5"]).unwrap();
        let Command::Plot(sweep) = cli.cmd else {
            panic!("expected plot");
        };
        assert_eq!(sweep.step, 12.5);
        assert_eq!(sweep.ranges().count(), 400);
    }

    #[test]
    fn test_rejects_unknown_preset() {
        assert!(Cli::try_parse_from(["linkprobe", "--preset", "arctic", "config"]).is_err());
    }
}
