//! evdev-backed event source
//!
//! Every `event*` node in the device directory gets a blocking reader thread
//! that forwards decoded events into one channel. A watcher thread rescans
//! the directory so hot-plugged devices start reporting without a restart.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use evdev::Device;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{EventSource, InputError, RawEvent};

/// State shared by the watcher and reader threads
struct DeviceWatcher {
    device_dir: PathBuf,
    known: Mutex<HashSet<PathBuf>>,
    tx: Sender<RawEvent>,
    running: AtomicBool,
}

impl DeviceWatcher {
    /// Open any device node not already being read. Returns how many were
    /// opened.
    fn scan(self: &Arc<Self>) -> usize {
        let entries = match fs::read_dir(&self.device_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", self.device_dir, e);
                return 0;
            }
        };

        let mut opened = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_event_node(&path) || self.known.lock().contains(&path) {
                continue;
            }

            let device = match Device::open(&path) {
                Ok(device) => device,
                Err(e) => {
                    tracing::debug!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            let name = device.name().unwrap_or("unknown").to_string();
            self.known.lock().insert(path.clone());

            let watcher = Arc::clone(self);
            let reader_path = path.clone();
            let spawned = thread::Builder::new()
                .name(format!("input-reader-{}", name))
                .spawn(move || watcher.read_device(reader_path, device));

            match spawned {
                Ok(_) => {
                    tracing::info!("Opened input device {} at {:?}", name, path);
                    opened += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to start reader for {:?}: {}", path, e);
                    self.known.lock().remove(&path);
                }
            }
        }
        opened
    }

    /// Reader thread body: forward events until the device or the consumer
    /// goes away.
    fn read_device(&self, path: PathBuf, mut device: Device) {
        while self.running.load(Ordering::SeqCst) {
            let events = match device.fetch_events() {
                Ok(events) => events,
                Err(e) => {
                    tracing::error!("Reading {:?} failed: {}", path, e);
                    break;
                }
            };

            for event in events {
                let raw = RawEvent::new(event.event_type().0, event.code(), event.value());
                if self.tx.send(raw).is_err() {
                    self.known.lock().remove(&path);
                    return;
                }
            }
        }

        // Forget the node so a re-plugged device is opened again
        self.known.lock().remove(&path);
    }

    fn watch(self: Arc<Self>, interval: Duration) {
        while self.running.load(Ordering::SeqCst) {
            thread::sleep(interval);
            let opened = self.scan();
            if opened > 0 {
                tracing::info!("Hot-plug rescan opened {} device(s)", opened);
            }
        }
        tracing::debug!("Hot-plug watcher stopped");
    }
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("event"))
}

/// Reads every evdev node under a directory
pub struct EvdevSource {
    rx: Receiver<RawEvent>,
    pending: Option<RawEvent>,
    watcher: Arc<DeviceWatcher>,
}

impl EvdevSource {
    /// Open all devices in `device_dir` and start hot-plug rescans every
    /// `rescan_interval`.
    pub fn open(
        device_dir: impl Into<PathBuf>,
        rescan_interval: Duration,
    ) -> Result<Self, InputError> {
        let device_dir = device_dir.into();
        let (tx, rx) = unbounded();
        let watcher = Arc::new(DeviceWatcher {
            device_dir: device_dir.clone(),
            known: Mutex::new(HashSet::new()),
            tx,
            running: AtomicBool::new(true),
        });

        if watcher.scan() == 0 {
            watcher.running.store(false, Ordering::SeqCst);
            return Err(InputError::NoDevices(device_dir));
        }

        let background = Arc::clone(&watcher);
        thread::Builder::new()
            .name("input-hotplug".to_string())
            .spawn(move || background.watch(rescan_interval))
            .map_err(InputError::Spawn)?;

        Ok(Self {
            rx,
            pending: None,
            watcher,
        })
    }

    /// Number of device nodes currently being read
    pub fn device_count(&self) -> usize {
        self.watcher.known.lock().len()
    }
}

impl EventSource for EvdevSource {
    fn wait_for_event(&mut self, timeout: Option<Duration>) -> Result<bool, InputError> {
        if self.pending.is_some() || !self.rx.is_empty() {
            return Ok(true);
        }

        let received = match timeout {
            Some(timeout) => self.rx.recv_timeout(timeout),
            None => self.rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(event) => {
                self.pending = Some(event);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(InputError::Disconnected),
        }
    }

    fn next_event(&mut self) -> Option<RawEvent> {
        self.pending.take().or_else(|| self.rx.try_recv().ok())
    }
}

impl Drop for EvdevSource {
    fn drop(&mut self) {
        self.watcher.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_event_node_names() {
        assert!(is_event_node(Path::new("/dev/input/event0")));
        assert!(is_event_node(Path::new("/dev/input/event12")));
        assert!(!is_event_node(Path::new("/dev/input/mice")));
        assert!(!is_event_node(Path::new("/dev/input/by-id")));
    }

    #[test]
    fn test_empty_directory_has_no_devices() {
        let dir = TempDir::new().unwrap();
        let result = EvdevSource::open(dir.path(), Duration::from_secs(1));
        assert!(matches!(result, Err(InputError::NoDevices(path)) if path == dir.path()));
    }

    #[test]
    fn test_non_device_nodes_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("event0"), b"not a device").unwrap();
        let result = EvdevSource::open(dir.path(), Duration::from_secs(1));
        assert!(matches!(result, Err(InputError::NoDevices(_))));
    }
}
