//! Shared fixtures for bridge integration tests.

#![allow(dead_code)]

use evo_bridge::{Bridge, BridgeEvent, BridgeSettings, CommandChannel, CommandQueue, Subscription};
use evo_shared_memory::{MemoryPort, ShmError, ShmResult};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// In-memory region that can be edited or removed while the bridge reads it.
#[derive(Clone)]
pub struct FakeRegion {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
    capacity: usize,
}

impl FakeRegion {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(Some(vec![0; capacity]))),
            capacity,
        }
    }

    /// Overwrite `data.len()` bytes at `offset`.
    pub fn write(&self, offset: usize, data: &[u8]) {
        let mut guard = self.bytes.lock();
        let bytes = guard.as_mut().expect("region removed");
        bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Simulate the region being unlinked.
    pub fn remove(&self) {
        *self.bytes.lock() = None;
    }
}

impl MemoryPort for FakeRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_snapshot(&mut self, buf: &mut [u8]) -> ShmResult<()> {
        match &*self.bytes.lock() {
            Some(bytes) => {
                buf.copy_from_slice(bytes);
                Ok(())
            }
            None => Err(ShmError::NotFound {
                path: PathBuf::from("/dev/shm/state"),
            }),
        }
    }
}

pub const MAPPING: &str = "\
state.state:0:uint8_t
state.sensor_state:2:sensor_state_t
state.sensor_state.raw_data:2:uint16_t[16]
state.drive_state.speed:40:float
state.drive_state.position:48:double
state.drive_state.enabled:56:bool
--------
";

/// Bridge over a 4096 byte fake region.
pub fn bridge_with_region() -> (Bridge, FakeRegion, CommandQueue) {
    let (channel, queue) = CommandChannel::new();
    let bridge = Bridge::new(BridgeSettings::default(), channel);
    let region = FakeRegion::new(4096);
    bridge
        .attach_region(Ok(region.clone()))
        .expect("attach fake region");
    (bridge, region, queue)
}

/// Everything currently queued for `sub`, unwrapped.
pub fn drain(sub: &mut Subscription) -> Vec<BridgeEvent> {
    sub.drain().into_iter().map(|e| (*e).clone()).collect()
}
