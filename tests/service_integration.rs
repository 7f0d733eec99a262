//! Input service integration tests.
//!
//! Drives the public service API with fake collaborators: long-press timing,
//! queue overflow, the consumer calls and the cable-attached wait.

use recovery_input_lib::codes::{KEY_POWER, KEY_VOLUMEDOWN, KEY_VOLUMEUP};
use recovery_input_lib::keys::RegisteredKey;
use recovery_input_lib::platform::{ConnectivityCheck, SystemActions};
use recovery_input_lib::{Config, KeyAction, KeyPolicy, KeySnapshot, OverflowPolicy, RecoveryInput};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// Fakes
// =============================================================================

/// Connectivity usb whose answer the test controls
#[derive(Default)]
struct Cable(AtomicBool);

impl ConnectivityCheck for Cable {
    fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct RecordingSystem {
    reboots: AtomicUsize,
    mounts: AtomicUsize,
}

impl SystemActions for RecordingSystem {
    fn reboot(&self) -> anyhow::Result<()> {
        self.reboots.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn mount_system(&self) -> anyhow::Result<()> {
        self.mounts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every registered key and queues nothing
#[derive(Clone, Default)]
struct RecordingPolicy(Arc<Mutex<Vec<RegisteredKey>>>);

impl KeyPolicy for RecordingPolicy {
    fn classify(&mut self, _keys: &KeySnapshot<'_>, key: RegisteredKey) -> KeyAction {
        self.0.lock().unwrap().push(key);
        KeyAction::Ignore
    }
}

fn config() -> Config {
    let mut config = Config::default();
    config.input.long_press_ms = 50;
    config
}

fn build(config: Config) -> (RecoveryInput, Arc<Cable>, Arc<RecordingSystem>) {
    let cable = Arc::new(Cable::default());
    let system = Arc::new(RecordingSystem::default());
    let input = RecoveryInput::builder(config)
        .connectivity(cable.clone())
        .system(system.clone())
        .build()
        .unwrap();
    (input, cable, system)
}

fn tap(input: &RecoveryInput, code: u16) {
    input.process_key(code, true);
    input.process_key(code, false);
}

fn drain(input: &RecoveryInput) -> Vec<i32> {
    std::iter::from_fn(|| input.wait_key_timeout(Duration::from_millis(5))).collect()
}

// =============================================================================
// Long press
// =============================================================================

#[test]
fn test_long_press_flag_follows_hold_time() {
    let policy = RecordingPolicy::default();
    let input = RecoveryInput::builder(config())
        .policy(Box::new(policy.clone()))
        .connectivity(Arc::new(Cable::default()))
        .build()
        .unwrap();

    input.process_key(28, true);
    thread::sleep(Duration::from_millis(200));
    input.process_key(28, false);

    tap(&input, 28);

    let keys = policy.0.lock().unwrap().clone();
    assert_eq!(
        keys,
        vec![
            RegisteredKey {
                code: 28,
                long_press: true
            },
            RegisteredKey {
                code: 28,
                long_press: false
            },
        ]
    );
}

#[test]
fn test_stale_timer_does_not_mark_new_press() {
    let mut config = config();
    config.input.long_press_ms = 100;
    let policy = RecordingPolicy::default();
    let input = RecoveryInput::builder(config)
        .policy(Box::new(policy.clone()))
        .connectivity(Arc::new(Cable::default()))
        .build()
        .unwrap();

    // The first press's timer fires while the second press is held. Both
    // presses are released before their own timers, so neither is long.
    input.process_key(28, true);
    thread::sleep(Duration::from_millis(60));
    input.process_key(28, false);
    input.process_key(28, true);
    thread::sleep(Duration::from_millis(60));
    input.process_key(28, false);

    let keys = policy.0.lock().unwrap().clone();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|key| !key.long_press));
}

#[test]
fn test_only_latest_press_registers() {
    let policy = RecordingPolicy::default();
    let input = RecoveryInput::builder(config())
        .policy(Box::new(policy.clone()))
        .connectivity(Arc::new(Cable::default()))
        .build()
        .unwrap();

    input.process_key(28, true);
    input.process_key(KEY_VOLUMEUP, true);
    input.process_key(KEY_VOLUMEUP, false);
    input.process_key(28, false);

    // Releasing a superseded key registers nothing and clears the timed press
    input.process_key(30, true);
    input.process_key(31, true);
    input.process_key(30, false);
    input.process_key(31, false);

    let keys = policy.0.lock().unwrap().clone();
    assert_eq!(
        keys,
        vec![RegisteredKey {
            code: KEY_VOLUMEUP,
            long_press: false
        }]
    );
}

// =============================================================================
// Queue and consumer API
// =============================================================================

#[test]
fn test_actions_are_fifo_then_timeout() {
    let (input, _, _) = build(config());
    for code in [30, 31, 32] {
        tap(&input, code);
    }

    assert_eq!(drain(&input), vec![30, 31, 32]);
    assert_eq!(input.wait_key_timeout(Duration::from_millis(10)), None);
}

#[test]
fn test_overflow_drops_newest_by_default() {
    let mut config = config();
    config.input.queue_capacity = 4;
    let (input, _, _) = build(config);

    for code in 30..35 {
        tap(&input, code);
    }
    assert_eq!(input.queue_len(), 4);
    assert_eq!(drain(&input), vec![30, 31, 32, 33]);
}

#[test]
fn test_overflow_can_drop_oldest() {
    let mut config = config();
    config.input.queue_capacity = 4;
    config.input.overflow = OverflowPolicy::DropOldest;
    let (input, _, _) = build(config);

    for code in 30..35 {
        tap(&input, code);
    }
    assert_eq!(drain(&input), vec![31, 32, 33, 34]);
}

#[test]
fn test_flush_keeps_pressed_state() {
    let (input, _, _) = build(config());
    tap(&input, 30);
    input.process_key(31, true);

    input.flush_keys();
    assert_eq!(input.queue_len(), 0);
    assert!(input.is_key_pressed(31));
    assert!(!input.is_key_pressed(30));

    input.process_key(31, false);
    assert!(!input.is_key_pressed(31));
    assert_eq!(drain(&input), vec![31]);
}

#[test]
fn test_wait_key_wakes_on_enqueue() {
    let (input, _, _) = build(config());
    let producer = input.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        producer.enqueue_key(42);
    });

    let started = Instant::now();
    assert_eq!(input.wait_key_timeout(Duration::from_secs(5)), Some(42));
    assert!(started.elapsed() < Duration::from_secs(5));
    handle.join().unwrap();
}

#[test]
fn test_wait_key_does_not_time_out_while_cable_attached() {
    let (input, cable, _) = build(config());
    cable.0.store(true, Ordering::SeqCst);

    let producer = input.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        producer.enqueue_key(7);
    });

    // Several 20ms timeouts elapse before the key arrives
    assert_eq!(input.wait_key_timeout(Duration::from_millis(20)), Some(7));
    handle.join().unwrap();
}

// =============================================================================
// Hotkeys
// =============================================================================

#[test]
fn test_reboot_gate_is_respected() {
    let (input, _, system) = build(config());

    input.set_enable_reboot(false);
    for _ in 0..7 {
        tap(&input, KEY_POWER);
    }
    assert_eq!(system.reboots.load(Ordering::SeqCst), 0);

    input.set_enable_reboot(true);
    for _ in 0..7 {
        tap(&input, KEY_POWER);
    }
    assert_eq!(system.reboots.load(Ordering::SeqCst), 1);
}

#[test]
fn test_alternating_volume_mounts_system() {
    let (input, _, system) = build(config());
    for i in 0..7 {
        tap(&input, if i % 2 == 0 { KEY_VOLUMEUP } else { KEY_VOLUMEDOWN });
    }
    assert_eq!(system.mounts.load(Ordering::SeqCst), 1);

    // The first six presses reached the menu
    assert_eq!(input.queue_len(), 6);
}

#[test]
fn test_mount_disabled_by_config() {
    let mut config = config();
    config.system.allow_system_mount = false;
    let (input, _, system) = build(config);

    for i in 0..7 {
        tap(&input, if i % 2 == 0 { KEY_VOLUMEUP } else { KEY_VOLUMEDOWN });
    }
    assert_eq!(system.mounts.load(Ordering::SeqCst), 0);
}
