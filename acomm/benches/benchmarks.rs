use acomm::{physics, CommunicationModel, Position, Preset, TransmissionRequest};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn loss_probability(c: &mut Criterion) {
    let mut group = c.benchmark_group("Loss Probability");

    group.bench_function("rayleigh", |b| {
        b.iter(|| {
            physics::rayleigh_loss_probability(
                black_box(750.0_f64),
                1e17,
                1e5,
                12.0,
                10.0,
                1.5,
                0.0,
            )
        })
    });

    let model = CommunicationModel::seeded(Preset::Default.config(), 0);
    group.bench_function("model", |b| {
        b.iter(|| model.loss_probability(black_box(750.0), 0.0, 40.0, 50))
    });
}

fn simulate_transmission(c: &mut Criterion) {
    let mut group = c.benchmark_group("Transmission");

    let req = TransmissionRequest::builder()
        .sender("ship")
        .receiver("uuv")
        .packet_type("command")
        .payload_size(64)
        .from(Position::new(0.0, 0.0, 0.0))
        .to(Position::new(600.0, 250.0, 45.0))
        .sent_at(0.0)
        .build()
        .unwrap();
    let mut model = CommunicationModel::seeded(Preset::Harsh.config(), 0);

    group.bench_function("harsh", |b| {
        b.iter(|| model.simulate_transmission(black_box(&req)))
    });
}

criterion_group!(benches, loss_probability, simulate_transmission);
criterion_main!(benches);
