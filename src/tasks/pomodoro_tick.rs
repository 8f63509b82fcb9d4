//! Tick source driving the timer engine

use std::{sync::Weak, time::Duration};
use tokio::{task::JoinHandle, time::{interval_at, Instant}};
use tracing::debug;

use crate::engine::TimerEngine;

/// Spawn a recurring tick for `engine`, first firing one `period` from now.
///
/// The task holds only a weak reference and exits once the engine is gone.
/// Cancellation is done by aborting the returned handle.
pub fn spawn_tick_source(engine: Weak<TimerEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("Tick source started ({:?})", period);
        let mut interval = interval_at(Instant::now() + period, period);

        loop {
            interval.tick().await;
            let Some(engine) = engine.upgrade() else {
                debug!("Timer engine dropped, tick source exiting");
                break;
            };
            engine.tick().await;
        }
    })
}
