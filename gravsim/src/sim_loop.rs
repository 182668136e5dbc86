use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Instant,
};

use crate::{
    constants::CHECK_INTERVAL,
    error::SimError,
    sim::Simulation,
    snapshot::{Snapshot, SnapshotExchange},
};

/// Step `sim` until `token` is raised or the tick budget runs out.
///
/// The token is sampled once per tick, never in the middle of one. Every
/// completed tick is published to `exchange`. The simulation is handed back
/// so its final state can be inspected.
pub fn run_sim_loop(
    mut sim: Simulation,
    exchange: Arc<SnapshotExchange>,
    token: Arc<AtomicBool>,
) -> Result<Simulation, SimError> {
    exchange.store(&sim);
    let mut last_report = (Instant::now(), sim.tick());

    loop {
        if token.load(Ordering::Relaxed) {
            break;
        }
        if sim.params().max_ticks.is_some_and(|max| sim.tick() >= max) {
            break;
        }

        if let Err(e) = sim.exec_iter_with_delta(exchange.delta()) {
            log::error!("Simulation stopped at tick {}: {e}", sim.tick());
            return Err(e);
        }
        exchange.store(&sim);

        if sim.tick() % CHECK_INTERVAL == 0 {
            let (since, ticks) = last_report;
            let rate = (sim.tick() - ticks) as f64 / since.elapsed().as_secs_f64();
            log::debug!("Tick {} (t = {:.4}), {rate:.1} ticks/s", sim.tick(), sim.time());
            last_report = (Instant::now(), sim.tick());
        }
    }
    log::info!("Simulation loop terminated after {} ticks", sim.tick());
    Ok(sim)
}

/// Owns the background thread running [`run_sim_loop`].
pub struct SimulationHandle {
    exchange: Arc<SnapshotExchange>,
    token: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<Simulation, SimError>>>,
}

impl SimulationHandle {
    /// Move `sim` onto a new thread and start stepping it.
    pub fn start(sim: Simulation) -> Result<Self, SimError> {
        let exchange = Arc::new(SnapshotExchange::new(sim.params().delta));
        let token = Arc::new(AtomicBool::new(false));

        let exchange_clone = exchange.clone();
        let token_clone = token.clone();
        let thread = std::thread::Builder::new()
            .name("gravsim-loop".to_owned())
            .spawn(move || run_sim_loop(sim, exchange_clone, token_clone))
            .map_err(SimError::ThreadSpawn)?;
        log::info!("Simulation loop started");

        Ok(Self {
            exchange,
            token,
            thread: Some(thread),
        })
    }

    pub fn exchange(&self) -> Arc<SnapshotExchange> {
        self.exchange.clone()
    }

    pub fn latest(&self) -> Arc<Snapshot> {
        self.exchange.latest()
    }

    /// Whether the loop thread is still stepping.
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Ask the loop to finish its current tick and exit, then wait for it.
    pub fn stop(mut self) -> Result<Simulation, SimError> {
        self.token.store(true, Ordering::Relaxed);
        self.wait()
    }

    /// Wait for the loop to end on its own, e.g. after `max_ticks`.
    pub fn join(mut self) -> Result<Simulation, SimError> {
        self.wait()
    }

    fn wait(&mut self) -> Result<Simulation, SimError> {
        let thread = self.thread.take().ok_or(SimError::ThreadPanicked)?;
        thread.join().map_err(|_| SimError::ThreadPanicked)?
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.token.store(true, Ordering::Relaxed);
            if thread.join().is_err() {
                log::error!("Simulation thread panicked");
            }
        }
    }
}
