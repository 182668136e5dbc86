use std::time::{Duration, Instant};

use cgmath::{EuclideanSpace, Vector3, Zero};
use gravsim::{
    SimParameters, Simulation, SimulationHandle, Snapshot,
    presets::{DiskParams, disk},
};
use rand::{SeedableRng, rngs::StdRng};

const NUM_OBJECTS: usize = 20_000;
const RUN_FOR: Duration = Duration::from_secs(10);
const SAMPLE_EVERY: Duration = Duration::from_millis(500);
/// Bodies handed to the (absent) renderer per frame.
const SNAPSHOT_CAP: usize = 16_384;

fn summarize(snapshot: &Snapshot) {
    let mass: f64 = snapshot.bodies.iter().map(|b| b.mass).sum();
    let center = snapshot
        .bodies
        .iter()
        .fold(Vector3::zero(), |acc, b| acc + b.pos.to_vec() * b.mass)
        / mass.max(f64::MIN_POSITIVE);
    log::info!(
        "tick {:>7} t = {:>8.4}: {} bodies, mass {:.3e}, barycenter ({:.3}, {:.3}, {:.3})",
        snapshot.tick,
        snapshot.time,
        snapshot.len(),
        mass,
        center.x,
        center.y,
        center.z
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let objects = disk(
        &mut StdRng::seed_from_u64(0x5eed),
        &DiskParams {
            count: NUM_OBJECTS,
            ..Default::default()
        },
    );
    let sim = Simulation::new(
        objects,
        SimParameters {
            snapshot_cap: Some(SNAPSHOT_CAP),
            ..Default::default()
        },
    )?;

    let handle = SimulationHandle::start(sim)?;
    let exchange = handle.exchange();
    let started = Instant::now();
    let mut seen = 0;
    while started.elapsed() < RUN_FOR && handle.is_running() {
        std::thread::sleep(SAMPLE_EVERY);
        let generation = exchange.generation();
        if generation != seen {
            seen = generation;
            summarize(&exchange.latest());
        }
    }

    log::info!("Wait for task completion");
    let sim = handle.stop()?;
    log::info!(
        "Task completed: {} ticks in {:.1?}",
        sim.tick(),
        started.elapsed()
    );
    Ok(())
}
