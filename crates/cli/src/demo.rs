//! `derbyctl demo`: one simulated heat on a virtual clock.
//!
//! Finish times come from a seeded RNG, so the same seed always prints the
//! same transcript. A car may stall on the track, in which case the race
//! timeout ends the heat.

use std::time::Duration;

use anyhow::{Context, Result};
use derby_controller::{RaceController, RaceState};
use derby_timing::RaceConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::host::HostPlatform;

/// Fastest simulated run, in microseconds.
const FASTEST_US: u64 = 2_400_000;
/// Slowest simulated run, in microseconds.
const SLOWEST_US: u64 = 4_200_000;
/// Chance that a car never reaches the finish.
const STALL_CHANCE: f64 = 0.1;
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// What a demo heat produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heat {
    /// Serial output, in order.
    pub transcript: Vec<String>,
    /// Lane displays during the times phase.
    pub times: Vec<String>,
    /// Lane displays during the positions phase.
    pub positions: Vec<String>,
}

/// Draw each lane's run time; `None` for a car that stalls.
pub fn draw_finishes(lanes: usize, seed: u64) -> Vec<Option<u64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..lanes)
        .map(|_| {
            if rng.random_bool(STALL_CHANCE) {
                None
            } else {
                Some(rng.random_range(FASTEST_US..=SLOWEST_US))
            }
        })
        .collect()
}

/// Run one heat to its result on a paused tokio clock.
pub fn execute(config: RaceConfig, seed: u64) -> Result<Heat> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .context("building demo runtime")?;
    Ok(runtime.block_on(run_heat(config, seed)))
}

async fn run_heat(config: RaceConfig, seed: u64) -> Heat {
    let finishes = draw_finishes(config.lanes(), seed);
    info!(seed, ?finishes, "demo heat");

    let lanes = config.lanes();
    let (platform, track) = HostPlatform::new();
    let mut controller = RaceController::new(platform, config);
    track.connect(controller.sensor_sink(), controller.timer_sink());
    controller.boot();

    track.ready();
    let mut crossed = vec![false; lanes];
    while !controller.state().is_reporting() {
        controller.poll();
        if controller.state() == RaceState::Racing {
            let now_us = track.now_us();
            for (lane, finish) in finishes.iter().enumerate() {
                let Some(run_us) = finish else { continue };
                let at_us = controller.start_us().saturating_add(*run_us);
                let Some(done) = crossed.get_mut(lane) else { continue };
                if !*done && at_us <= now_us {
                    *done = track.finish_at(lane, at_us);
                    debug!(lane, at_us, "car crossed");
                }
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }

    let times = board(&controller, lanes);
    controller.advance_display();
    let positions = board(&controller, lanes);
    Heat {
        transcript: controller.platform_mut().take_output(),
        times,
        positions,
    }
}

fn board(controller: &RaceController<HostPlatform>, lanes: usize) -> Vec<String> {
    controller
        .platform()
        .displays()
        .iter()
        .take(lanes)
        .cloned()
        .collect()
}
