//! Bridge state machine.
//!
//! [`Bridge`] owns everything observers can see: the status, the layout,
//! the last snapshot and its decoded state, the replay log and the
//! subscriber registry. All of it sits behind one lock, and every event is
//! broadcast while that lock is held, so an observer registering
//! concurrently sees either the old world plus the event or the new world
//! without it, never a mix.
//!
//! The memory port sits behind a second lock that [`Bridge::poll`] only
//! ever `try_lock`s. Region I/O happens under the port lock alone; the
//! state lock is taken afterwards for the comparison and the broadcast.
//!
//! ```text
//!   control stdout ──► handle_input ──┐
//!                                     ├──► BridgeCore ──► subscribers
//!   state region  ──► poll ───────────┘
//!   observers ──► submit_command ──► CommandChannel ──► control process
//! ```

use crate::command::CommandChannel;
use crate::decode::{StateTree, decode};
use crate::error::BridgeResult;
use crate::event::{BridgeEvent, BridgeStatus};
use crate::layout::Layout;
use crate::log_buffer::LogBuffer;
use crate::mapping::{MappingOutcome, MappingParser, validate_layout};
use crate::registry::{SubscriberId, SubscriberRegistry, Subscription};
use evo::bridge::config::BridgeSection;
use evo::bridge::consts::{LOG_CAPACITY, SUBSCRIBER_QUEUE, SUBSCRIBER_QUEUE_MIN};
use evo::shm::consts::STATE_REGION_SIZE;
use evo_shared_memory::{MemoryPort, ShmError, ShmResult};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runtime parameters of a [`Bridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Snapshot size; layouts are validated against it.
    pub region_capacity: usize,
    /// Characters of process output kept for replay.
    pub log_capacity: usize,
    /// Per-observer event queue depth.
    pub subscriber_queue: usize,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            region_capacity: STATE_REGION_SIZE,
            log_capacity: LOG_CAPACITY,
            subscriber_queue: SUBSCRIBER_QUEUE,
        }
    }
}

impl From<&BridgeSection> for BridgeSettings {
    fn from(section: &BridgeSection) -> Self {
        Self {
            region_capacity: section.region_size,
            log_capacity: section.log_capacity,
            subscriber_queue: section.subscriber_queue,
        }
    }
}

/// Result of one [`Bridge::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not initialized (or no region attached); nothing was read.
    NotReady,
    /// Another poll is still running; this one was skipped.
    Busy,
    /// Snapshot identical to the previous one; no event.
    Unchanged,
    /// New snapshot decoded and broadcast.
    Changed,
}

/// State shared between input, polling and observers.
struct BridgeCore {
    status: BridgeStatus,
    parser: MappingParser,
    layout: Option<Arc<Layout>>,
    snapshot: Vec<u8>,
    state: Arc<StateTree>,
    log: LogBuffer,
    registry: SubscriberRegistry,
}

impl BridgeCore {
    fn transition(&mut self, next: BridgeStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(from = %self.status, to = %next, "Ignoring invalid status transition");
            return false;
        }
        info!(from = %self.status, to = %next, "Bridge status changed");
        self.status = next;
        self.registry.broadcast(BridgeEvent::Status(next));
        true
    }

    /// Enter `ERROR`. Buffered output is dropped.
    fn fail(&mut self) {
        if self.transition(BridgeStatus::Error) {
            self.log.clear();
        }
    }

    fn feed_mapping(&mut self, chunk: &str) {
        let outcome = match self.parser.feed(chunk) {
            Ok(Some(outcome)) => outcome,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, "Mapping rejected");
                self.fail();
                return;
            }
        };

        let MappingOutcome { layout, remainder } = outcome;
        if let Err(e) = validate_layout(&layout, self.snapshot.len()) {
            error!(error = %e, "Mapping rejected");
            self.fail();
            return;
        }

        debug!("Layout:\n{layout}");
        info!(
            fields = layout.len(),
            recognized = layout.recognized_count(),
            "Mapping complete"
        );
        self.state = Arc::new(decode(&self.snapshot, &layout));
        self.layout = Some(Arc::new(layout));
        self.transition(BridgeStatus::Initialized);

        if !remainder.is_empty() {
            self.append_output(&remainder);
        }
    }

    fn append_output(&mut self, chunk: &str) {
        debug!(target: "evo_bridge::output", "{}", chunk.trim_end());
        self.log.push(chunk);
        self.registry.broadcast(BridgeEvent::Input(chunk.to_string()));
    }
}

/// Memory port plus the buffer the next snapshot is read into.
struct PortSlot {
    port: Option<Box<dyn MemoryPort>>,
    scratch: Vec<u8>,
}

/// Bridge between the control process and its observers.
pub struct Bridge {
    settings: BridgeSettings,
    core: Mutex<BridgeCore>,
    port: Mutex<PortSlot>,
    commands: CommandChannel,
}

impl Bridge {
    /// New bridge in `INITIALIZING`, with no region attached yet.
    ///
    /// A subscriber queue smaller than the replay prefix is raised to fit.
    pub fn new(settings: BridgeSettings, commands: CommandChannel) -> Self {
        let queue = settings.subscriber_queue.max(SUBSCRIBER_QUEUE_MIN);
        Self {
            core: Mutex::new(BridgeCore {
                status: BridgeStatus::Initializing,
                parser: MappingParser::new(),
                layout: None,
                snapshot: vec![0; settings.region_capacity],
                state: Arc::new(StateTree::new()),
                log: LogBuffer::new(settings.log_capacity),
                registry: SubscriberRegistry::new(queue),
            }),
            port: Mutex::new(PortSlot {
                port: None,
                scratch: vec![0; settings.region_capacity],
            }),
            settings,
            commands,
        }
    }

    /// Settings the bridge was built with.
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Install the result of opening the state region.
    ///
    /// An absent region puts the bridge into `ERROR` and is not an error
    /// for the caller. Any other failure, or a port whose capacity differs
    /// from the configured one, is returned.
    pub fn attach_region<P>(&self, opened: ShmResult<P>) -> BridgeResult<()>
    where
        P: MemoryPort + 'static,
    {
        let port = match opened {
            Ok(port) => port,
            Err(e) if e.is_resource_absent() => {
                error!(error = %e, "State region unavailable");
                self.core.lock().fail();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if port.capacity() != self.settings.region_capacity {
            return Err(ShmError::BufferMismatch {
                expected: self.settings.region_capacity,
                actual: port.capacity(),
            }
            .into());
        }

        self.port.lock().port = Some(Box::new(port));
        info!(capacity = self.settings.region_capacity, "State region attached");
        Ok(())
    }

    /// Process a chunk of control process output.
    ///
    /// While initializing, text feeds the mapping parser; once
    /// initialized it is logged and broadcast; in `ERROR` it is dropped.
    pub fn handle_input(&self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let mut core = self.core.lock();
        match core.status {
            BridgeStatus::Initializing => core.feed_mapping(chunk),
            BridgeStatus::Initialized => core.append_output(chunk),
            BridgeStatus::Error => {
                core.log.clear();
                debug!(bytes = chunk.len(), "Discarding output in ERROR");
            }
        }
    }

    /// Read the region once and broadcast the state if it changed.
    ///
    /// Returns an error only for unrecoverable region failures.
    pub fn poll(&self) -> BridgeResult<PollOutcome> {
        if self.core.lock().status != BridgeStatus::Initialized {
            return Ok(PollOutcome::NotReady);
        }
        let Some(mut slot) = self.port.try_lock() else {
            debug!("Poll already running, skipping");
            return Ok(PollOutcome::Busy);
        };
        let PortSlot { port, scratch } = &mut *slot;
        let Some(reader) = port.as_mut() else {
            return Ok(PollOutcome::NotReady);
        };

        match reader.read_snapshot(scratch) {
            Ok(()) => {}
            Err(e) if e.is_resource_absent() => {
                error!(error = %e, "State region disappeared");
                *port = None;
                self.core.lock().fail();
                return Ok(PollOutcome::NotReady);
            }
            Err(e) => return Err(e.into()),
        }

        let mut core = self.core.lock();
        if core.status != BridgeStatus::Initialized {
            return Ok(PollOutcome::NotReady);
        }
        if core.snapshot == *scratch {
            return Ok(PollOutcome::Unchanged);
        }
        let Some(layout) = core.layout.clone() else {
            return Ok(PollOutcome::NotReady);
        };

        std::mem::swap(&mut core.snapshot, scratch);
        let state = Arc::new(decode(&core.snapshot, &layout));
        core.state = Arc::clone(&state);
        let delivered = core.registry.broadcast(BridgeEvent::State(state));
        debug!(delivered, "State changed");
        Ok(PollOutcome::Changed)
    }

    /// Register an observer.
    ///
    /// The returned queue starts with the current status and, when
    /// initialized, the current state and the buffered output, followed by
    /// every later event in broadcast order.
    pub fn subscribe(&self) -> Subscription {
        let mut core = self.core.lock();
        let mut replay = vec![BridgeEvent::Status(core.status)];
        if core.status == BridgeStatus::Initialized {
            replay.push(BridgeEvent::State(Arc::clone(&core.state)));
            replay.push(BridgeEvent::Input(core.log.as_str().to_string()));
        }
        core.registry.register(replay)
    }

    /// Remove an observer; no effect if it is already gone.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.core.lock().registry.remove(id);
    }

    /// Forward `text` to the control process as one line.
    ///
    /// Dropped unless the bridge is initialized. Returns whether the
    /// command was queued.
    pub fn submit_command(&self, text: &str) -> bool {
        let core = self.core.lock();
        if core.status != BridgeStatus::Initialized {
            debug!(status = %core.status, command = text, "Command dropped");
            return false;
        }
        let queued = self.commands.send(format!("{text}\n"));
        if !queued {
            warn!(command = text, "Command pump stopped, command dropped");
        }
        queued
    }

    /// Current status.
    pub fn status(&self) -> BridgeStatus {
        self.core.lock().status
    }

    /// Last decoded state.
    pub fn state(&self) -> Arc<StateTree> {
        Arc::clone(&self.core.lock().state)
    }

    /// Layout, once the mapping is complete.
    pub fn layout(&self) -> Option<Arc<Layout>> {
        self.core.lock().layout.clone()
    }

    /// Buffered process output.
    pub fn log_contents(&self) -> String {
        self.core.lock().log.as_str().to_string()
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.core.lock().registry.len()
    }
}
