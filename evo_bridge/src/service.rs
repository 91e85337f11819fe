//! Bridge service runtime.
//!
//! Wires a [`Bridge`] to its surroundings:
//!
//! - the poll loop, a tokio task ticking at the configured interval and
//!   running each poll on the blocking pool;
//! - the input pump and the command pump, each on its own OS thread since
//!   both block on pipes;
//! - the observer server.
//!
//! The first fatal error from any of them ends [`run_bridge`]. End of the
//! control process output and the poll loop stopping in `ERROR` are not
//! fatal; observers keep being served.

use crate::bridge::{Bridge, PollOutcome};
use crate::command::{CommandPump, CommandQueue};
use crate::error::{BridgeError, BridgeResult};
use crate::event::BridgeStatus;
use crate::input::InputPump;
use crate::server::ObserverServer;
use std::future::Future;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Pipes connecting the bridge to the control process.
pub struct ProcessIo<R, W> {
    /// Control process stdout.
    pub output: R,
    /// Write end of the command pipe.
    pub command_pipe: W,
    /// Commands submitted through the bridge.
    pub commands: CommandQueue,
}

/// Poll `bridge` every `period` until it enters `ERROR`.
///
/// Ticks missed while a poll runs long are skipped, not bunched up.
pub async fn poll_loop(bridge: Arc<Bridge>, period: Duration) -> BridgeResult<()> {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period_ms = period.as_millis() as u64, "Poll loop started");

    loop {
        ticker.tick().await;
        let poller = Arc::clone(&bridge);
        let outcome = tokio::task::spawn_blocking(move || poller.poll())
            .await
            .map_err(|e| BridgeError::Worker {
                name: "poll",
                reason: e.to_string(),
            })??;

        if outcome == PollOutcome::NotReady && bridge.status() == BridgeStatus::Error {
            info!("Bridge in ERROR, poll loop stopped");
            return Ok(());
        }
    }
}

/// Run `f` on a named OS thread and deliver its result asynchronously.
fn spawn_worker<T, F>(
    name: &'static str,
    f: F,
) -> BridgeResult<oneshot::Receiver<BridgeResult<T>>>
where
    T: Send + 'static,
    F: FnOnce() -> BridgeResult<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name(format!("evo-{name}"))
        .spawn(move || {
            let _ = tx.send(f());
        })?;
    Ok(rx)
}

fn worker_result<T>(
    name: &'static str,
    received: Result<BridgeResult<T>, oneshot::error::RecvError>,
) -> BridgeResult<T> {
    received.map_err(|_| BridgeError::Worker {
        name,
        reason: "thread exited without a result".to_string(),
    })?
}

/// Run the bridge until `shutdown` resolves or a fatal error occurs.
///
/// The pump threads are detached on return; they end with the process.
pub async fn run_bridge<R, W, S>(
    bridge: Arc<Bridge>,
    io: ProcessIo<R, W>,
    server: ObserverServer,
    poll_interval: Duration,
    shutdown: S,
) -> BridgeResult<()>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
    S: Future<Output = ()>,
{
    let ProcessIo {
        output,
        command_pipe,
        commands,
    } = io;

    let input_bridge = Arc::clone(&bridge);
    let mut input = spawn_worker("input", move || InputPump::new(output).run(&input_bridge))?;
    let mut pump = spawn_worker("commands", move || CommandPump::new(command_pipe).run(commands))?;
    let mut poller = tokio::spawn(poll_loop(Arc::clone(&bridge), poll_interval));
    let mut observers = tokio::spawn(server.run());

    tokio::pin!(shutdown);
    let mut input_open = true;
    let mut polling = true;

    let result = loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break Ok(());
            }
            received = &mut input, if input_open => {
                input_open = false;
                match worker_result("input", received) {
                    Ok(bytes) => debug!(bytes, "Input pump finished"),
                    Err(e) => break Err(e),
                }
            }
            received = &mut pump => {
                break worker_result("commands", received).map(|_| ());
            }
            joined = &mut poller, if polling => {
                polling = false;
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => break Err(e),
                    Err(e) => break Err(BridgeError::Worker { name: "poll", reason: e.to_string() }),
                }
            }
            joined = &mut observers => {
                break match joined {
                    Ok(result) => result,
                    Err(e) => Err(BridgeError::Worker { name: "server", reason: e.to_string() }),
                };
            }
        }
    };

    poller.abort();
    observers.abort();
    result
}
