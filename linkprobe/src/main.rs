mod options;

use acomm::{CommunicationModel, TransmissionRequest};
use anyhow::Error as AnyError;
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd, Simulate, Sweep};
use serde::Serialize;
use std::io::Write;
use textplots::{Chart, Plot, Shape};

fn main() -> Result<(), AnyError> {
    let Cli {
        preset,
        frequency,
        sea_state,
        temperature,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mut config = preset.config();
    if let Some(frequency) = frequency {
        config.frequency_hz = frequency;
    }
    info!("preset {preset}, {} Hz", config.frequency_hz);

    let seed = match &cmd {
        CliCmd::Simulate(sim) => sim.seed,
        _ => None,
    };
    let mut model = match seed {
        Some(seed) => CommunicationModel::seeded(config, seed),
        None => CommunicationModel::new(config),
    };
    model.update_environment(sea_state, temperature);

    match cmd {
        CliCmd::Config => print_json(&model.configuration().summary())?,
        CliCmd::Simulate(sim) => simulate(&mut model, &sim)?,
        CliCmd::Quality { range, depth } => {
            print_json(&model.communication_quality(range, depth))?;
        }
        CliCmd::Sweep(sweep) => print_csv(&model, &sweep)?,
        CliCmd::Plot(sweep) => plot_ascii(&model, &sweep),
    };

    Ok(())
}

fn simulate(model: &mut CommunicationModel, sim: &Simulate) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    let mut delivered = 0_u32;
    let mut delay_sum = 0.0;
    for _ in 0..sim.count {
        let request = TransmissionRequest::builder()
            .sender(sim.sender.as_str())
            .receiver(sim.receiver.as_str())
            .packet_type(sim.packet_type.as_str())
            .payload_size(sim.payload)
            .from(sim.from)
            .to(sim.to)
            .build()?;
        let tx = model.simulate_transmission(&request);
        if tx.is_received() {
            delivered += 1;
            delay_sum += tx.total_delay();
        }
        serde_json::to_writer(&mut stdout, &tx)?;
        writeln!(stdout)?;
    }

    let rate = if sim.count == 0 {
        0.0
    } else {
        f64::from(delivered) / f64::from(sim.count) * 100.0
    };
    eprintln!("delivered: {delivered}/{} ({rate:.1}%)", sim.count);
    if delivered > 0 {
        eprintln!("mean delay: {:.4} s", delay_sum / f64::from(delivered));
    }
    Ok(())
}

/// # Example with gnuplot
///
/// ```sh
/// cargo run -p linkprobe -- --preset=realistic_testing sweep | tr ',' ' ' > ~/.tmp/plot && gnuplot -p -e "plot '~/.tmp/plot' using 1:2 with lines"
/// ```
fn print_csv(model: &CommunicationModel, sweep: &Sweep) -> Result<(), AnyError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(
        stdout,
        "Range,LossProbability,Reason,PropagationDelay,MultipathDelay,AdvisoryLoss"
    )?;
    for range in sweep.ranges() {
        let assessment =
            model.loss_probability(range, sweep.sender_depth, sweep.receiver_depth, sweep.payload);
        let probability = assessment.probability;
        let reason = assessment.reason;
        let delay = model.propagation_delay(range, sweep.sender_depth, sweep.receiver_depth);
        let multipath =
            model.multipath_delay(range, (sweep.sender_depth - sweep.receiver_depth).abs());
        let loss = model.advisory_propagation_loss(range, sweep.receiver_depth);
        writeln!(
            stdout,
            "{range},{probability},{reason},{delay},{multipath},{loss}"
        )?;
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot_ascii(model: &CommunicationModel, sweep: &Sweep) {
    let plot_data: Vec<(f32, f32)> = sweep
        .ranges()
        .map(|range| {
            let p = model
                .loss_probability(range, sweep.sender_depth, sweep.receiver_depth, sweep.payload)
                .probability;
            (range as f32, p as f32)
        })
        .collect();
    Chart::new(300, 150, sweep.start as f32, sweep.end as f32)
        .lineplot(&Shape::Lines(&plot_data))
        .display();
}

fn print_json<T: Serialize>(val: &T) -> Result<(), AnyError> {
    let json = serde_json::to_string_pretty(val)?;
    println!("{json}");
    Ok(())
}
