//! `derbyctl run`: the serial protocol on stdin/stdout.
//!
//! Lines starting with `!` drive the simulated track (`!ready`, `!reopen`,
//! `!lane N`, `!level N 0|1`); every other line is a serial command. The
//! control loop is polled on a fixed interval and replies are written CR LF
//! terminated.

use std::time::Duration;

use anyhow::{Context, Result};
use derby_controller::RaceController;
use derby_timing::RaceConfig;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::host::{HostPlatform, Track, TrackCommand};

pub async fn execute(config: RaceConfig, poll_interval: Duration) -> Result<()> {
    let (platform, track) = HostPlatform::new();
    let mut controller = RaceController::new(platform, config);
    track.connect(controller.sensor_sink(), controller.timer_sink());
    controller.boot();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        flush(&mut controller, &mut stdout)
            .await
            .context("writing stdout")?;
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                handle_input(&mut controller, &track, line.trim_end_matches('\r'));
            }
            _ = ticker.tick() => controller.poll(),
        }
    }

    controller.poll();
    flush(&mut controller, &mut stdout)
        .await
        .context("writing stdout")?;
    info!(dropped = controller.dropped_events(), "input closed");
    Ok(())
}

fn handle_input(controller: &mut RaceController<HostPlatform>, track: &Track, line: &str) {
    match line.strip_prefix('!') {
        Some(command) => match command.parse::<TrackCommand>() {
            Ok(command) => track.apply(command),
            Err(err) => warn!(error = %err, "track command ignored"),
        },
        None => {
            controller.receive(line.as_bytes());
            controller.receive(b"\r");
        }
    }
}

/// Write pending serial output, CR LF terminated.
pub async fn flush<W>(
    controller: &mut RaceController<HostPlatform>,
    out: &mut W,
) -> derby_errors::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let lines = controller.platform_mut().take_output();
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\r\n").await?;
    }
    out.flush().await?;
    Ok(())
}
