// orchestrator.rs

use rand::{SeedableRng, rngs::StdRng};

use crate::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Booting,
    AwaitingConnectivity,
    /// Local control is always on; `degraded` means no backend sync.
    Running { degraded: bool },
}

/// Fan actuator plus the last level it accepted.
struct Relay<F> {
    fan: F,
    level: Option<bool>,
}

impl<F: FanActuator> Relay<F> {
    fn apply(&mut self, on: bool) {
        if self.level == Some(on) {
            return;
        }
        match self.fan.set_fan(on) {
            Ok(()) => {
                info!("Fan {}", if on { "ON" } else { "OFF" });
                self.level = Some(on);
            }
            Err(e) => {
                // retried on the next tick since `level` is unchanged
                error!("Fan relay failed: {e:#}");
            }
        }
    }

    async fn follow(&mut self, state: &MyState) {
        let on = state.device.read().await.fan_on;
        self.apply(on);
    }
}

/// The periodic driver: read, decide, actuate, render, sync.
pub struct Orchestrator<R, F, D, T> {
    state: Arc<MyState>,
    source: R,
    relay: Relay<F>,
    display: D,
    sync: BackendSync<T>,
    rng: StdRng,
    phase: Phase,
    started: Instant,
}

impl<R, F, D, T> Orchestrator<R, F, D, T>
where
    R: ReadingSource,
    F: FanActuator,
    D: StatusDisplay,
    T: BackendTransport,
{
    pub fn new(state: Arc<MyState>, source: R, fan: F, display: D, sync: BackendSync<T>) -> Self {
        Orchestrator {
            state,
            source,
            relay: Relay { fan, level: None },
            display,
            sync,
            rng: StdRng::from_os_rng(),
            phase: Phase::Booting,
            started: Instant::now(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn sync(&self) -> &BackendSync<T> {
        &self.sync
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    pub fn fan(&self) -> &F {
        &self.relay.fan
    }

    /// Relay off, then wait a bounded time for the network.
    pub async fn boot(&mut self) {
        info!("Booting, fan off.");
        self.phase = Phase::Booting;
        self.relay.apply(false);

        self.phase = Phase::AwaitingConnectivity;
        let deadline = Instant::now() + Duration::from_secs(self.state.config.connect_wait);
        while !self.state.link_up().await && Instant::now() < deadline {
            sleep(Duration::from_secs(1)).await;
        }

        let degraded = !self.state.link_up().await;
        if degraded {
            warn!("No network, running locally.");
        }
        self.phase = Phase::Running { degraded };
    }

    pub async fn tick(&mut self) {
        let reading = match self.source.read() {
            Ok(c) => Some(c),
            Err(e) => {
                error!("Sensor read failed: {e:#}");
                None
            }
        };

        let view = {
            let mut d = self.state.device.write().await;
            if let Some(c) = reading {
                d.concentration = c;
                d.last_update = Some(Local::now());
                d.fan_on = decide(c, d.mode, d.threshold).resolve(d.fan_on);
            }
            StatusView {
                ip: None,
                concentration: d.concentration,
                fan_on: d.fan_on,
                mode: d.mode,
            }
        };
        self.relay.apply(view.fan_on);

        let link_up = self.state.link_up().await;
        let degraded = !link_up;
        if self.phase != (Phase::Running { degraded }) {
            info!("Network {}.", if link_up { "up, sync enabled" } else { "down, sync disabled" });
            self.phase = Phase::Running { degraded };
        }

        let ip = if link_up {
            Some(*self.state.ip_addr.read().await)
        } else {
            None
        };
        if let Err(e) = self.display.render(&StatusView { ip, ..view }) {
            warn!("Display update failed: {e:#}");
        }

        // manual fan commands keep reaching the relay while sync is in flight
        let state = self.state.clone();
        let relay = &mut self.relay;
        let sync = self.sync.run_due(&state, &mut self.rng);
        tokio::pin!(sync);
        loop {
            tokio::select! {
                _ = &mut sync => break,
                _ = state.fan_changed.notified() => relay.follow(&state).await,
            }
        }

        let uptime = u32::try_from(self.started.elapsed().as_secs()).unwrap_or(u32::MAX);
        *self.state.uptime.write().await = uptime;
    }

    /// Push the current relay command from state to the actuator.
    pub async fn follow_state(&mut self) {
        self.relay.follow(&self.state).await;
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        self.boot().await;
        let state = self.state.clone();
        let delay = state.config.tick_delay();

        loop {
            self.tick().await;
            let next = Instant::now() + delay;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep_until(next) => break,
                    _ = state.fan_changed.notified() => self.follow_state().await,
                }
            }
        }
    }
}

// EOF
