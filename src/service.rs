//! Recovery input service
//!
//! Owns the state shared between the dispatch thread, the long-press timer
//! thread and the foreground consumer: live key state, the key policy with
//! its streak counters, the reboot gate and the action queue. All of it sits
//! behind one mutex so classification and enqueue happen as one step, and a
//! condition variable wakes `wait_key` when the queue becomes non-empty.
//!
//! Side effects that leave the input core (toggling the log overlay,
//! rebooting, mounting) run after the lock is released.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codes::ActionCode;
use crate::config::Config;
use crate::hotkeys::{DefaultKeyPolicy, KeyAction, KeyPolicy, KeySnapshot};
use crate::keys::{KeyTracker, LongPressTimer};
use crate::platform::{
    CommandSystem, ConnectivityCheck, LogUi, RecoveryUi, SysfsUsbState, SystemActions,
};
use crate::queue::ActionQueue;
use crate::source::InputError;

/// Everything guarded by the input lock
struct InputState {
    keys: KeyTracker,
    queue: ActionQueue,
    policy: Box<dyn KeyPolicy>,
    reboot_enabled: bool,
    touch_selection: Option<i32>,
}

/// Work deferred until the input lock is released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    ToggleVisibility,
    Reboot,
    MountSystem,
}

struct Inner {
    state: Mutex<InputState>,
    key_available: Condvar,
    timer: LongPressTimer,
    ui: Arc<dyn RecoveryUi>,
    system: Arc<dyn SystemActions>,
    connectivity: Arc<dyn ConnectivityCheck>,
    wait_timeout: Duration,
    allow_system_mount: bool,
}

/// Handle to the input service.
///
/// Cheap to clone; every clone refers to the same state. The dispatch thread
/// feeds it key events while the foreground thread pulls actions with
/// [`RecoveryInput::wait_key`].
#[derive(Clone)]
pub struct RecoveryInput {
    inner: Arc<Inner>,
}

/// Builder for [`RecoveryInput`] with injectable collaborators
pub struct RecoveryInputBuilder {
    config: Config,
    policy: Option<Box<dyn KeyPolicy>>,
    ui: Option<Arc<dyn RecoveryUi>>,
    system: Option<Arc<dyn SystemActions>>,
    connectivity: Option<Arc<dyn ConnectivityCheck>>,
}

impl RecoveryInputBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            policy: None,
            ui: None,
            system: None,
            connectivity: None,
        }
    }

    /// Replace the default key policy
    pub fn policy(mut self, policy: Box<dyn KeyPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn ui(mut self, ui: Arc<dyn RecoveryUi>) -> Self {
        self.ui = Some(ui);
        self
    }

    pub fn system(mut self, system: Arc<dyn SystemActions>) -> Self {
        self.system = Some(system);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityCheck>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Build the service and start its long-press timer thread
    pub fn build(self) -> Result<RecoveryInput, InputError> {
        let config = self.config;

        let policy = self.policy.unwrap_or_else(|| {
            Box::new(DefaultKeyPolicy::new(config.hotkeys.clone())) as Box<dyn KeyPolicy>
        });
        let ui = self.ui.unwrap_or_else(|| {
            Arc::new(LogUi::new(config.touch.layout)) as Arc<dyn RecoveryUi>
        });
        let system = self.system.unwrap_or_else(|| {
            Arc::new(CommandSystem::from_config(&config.system)) as Arc<dyn SystemActions>
        });
        let connectivity = self.connectivity.unwrap_or_else(|| {
            Arc::new(SysfsUsbState::new(&config.system.usb_state_path))
                as Arc<dyn ConnectivityCheck>
        });

        let (timer, worker) = LongPressTimer::new(config.input.long_press());

        let inner = Arc::new(Inner {
            state: Mutex::new(InputState {
                keys: KeyTracker::new(),
                queue: ActionQueue::new(config.input.queue_capacity, config.input.overflow),
                policy,
                reboot_enabled: config.system.enable_reboot,
                touch_selection: None,
            }),
            key_available: Condvar::new(),
            timer,
            ui,
            system,
            connectivity,
            wait_timeout: config.input.wait_key_timeout(),
            allow_system_mount: config.system.allow_system_mount,
        });

        let weak = Arc::downgrade(&inner);
        worker
            .spawn(move |code, generation| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_long_press_expired(code, generation);
                }
            })
            .map_err(InputError::Spawn)?;

        tracing::info!(
            "Recovery input ready: queue_capacity={}, long_press={}ms",
            config.input.queue_capacity,
            config.input.long_press_ms
        );

        Ok(RecoveryInput { inner })
    }
}

impl RecoveryInput {
    pub fn builder(config: Config) -> RecoveryInputBuilder {
        RecoveryInputBuilder::new(config)
    }

    /// Process a key-down (`down == true`) or key-up event.
    ///
    /// A key-down starts a long-press timer for that press. A key-up of the
    /// press being timed registers the key and runs it through the policy.
    pub fn process_key(&self, code: u16, down: bool) {
        let effect = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;

            if down {
                if let Some(generation) = state.keys.press(code) {
                    self.inner.timer.schedule(code, generation);
                }
                None
            } else {
                match state.keys.release(code) {
                    Some(registered) => {
                        let snapshot = KeySnapshot::new(&state.keys, state.reboot_enabled);
                        let action = state.policy.classify(&snapshot, registered);
                        self.inner.apply_locked(state, action)
                    }
                    None => None,
                }
            }
        };

        if let Some(effect) = effect {
            self.inner.run_effect(effect);
        }
    }

    /// Wait for the next queued action, giving up after the configured
    /// timeout. Returns `None` on timeout.
    pub fn wait_key(&self) -> Option<ActionCode> {
        self.wait_key_timeout(self.inner.wait_timeout)
    }

    /// Wait for the next queued action with an explicit timeout.
    ///
    /// While the connectivity usb reports a cable the timeout keeps
    /// restarting, so a tethered session never times out.
    pub fn wait_key_timeout(&self, timeout: Duration) -> Option<ActionCode> {
        let mut state = self.inner.state.lock();

        loop {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => {
                    while state.queue.is_empty() {
                        if self
                            .inner
                            .key_available
                            .wait_until(&mut state, deadline)
                            .timed_out()
                        {
                            break;
                        }
                    }
                }
                // Timeout too large to represent: wait without one
                None => {
                    while state.queue.is_empty() {
                        self.inner.key_available.wait(&mut state);
                    }
                }
            }

            if !state.queue.is_empty() || !self.inner.connectivity.is_connected() {
                break;
            }
            tracing::debug!("wait_key timed out with a cable attached, waiting again");
        }

        state.queue.pop()
    }

    /// Whether `code` is held down right now
    pub fn is_key_pressed(&self, code: u16) -> bool {
        self.inner.state.lock().keys.is_pressed(code)
    }

    /// Discard all queued actions and any pending tap selection. Live key
    /// state is untouched.
    pub fn flush_keys(&self) {
        let mut state = self.inner.state.lock();
        state.queue.clear();
        state.touch_selection = None;
    }

    /// Allow or forbid the reboot combo
    pub fn set_enable_reboot(&self, enabled: bool) {
        let mut state = self.inner.state.lock();
        if state.reboot_enabled != enabled {
            tracing::info!("Reboot combo {}", if enabled { "enabled" } else { "disabled" });
        }
        state.reboot_enabled = enabled;
    }

    pub fn reboot_enabled(&self) -> bool {
        self.inner.state.lock().reboot_enabled
    }

    /// Queue an action code directly, bypassing classification
    pub fn enqueue_key(&self, code: ActionCode) {
        let mut state = self.inner.state.lock();
        self.inner.push_locked(&mut state, code);
    }

    /// Number of queued actions
    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Menu index chosen by the most recent tap, if any
    pub fn touch_selection(&self) -> Option<i32> {
        self.inner.state.lock().touch_selection
    }

    /// Current menu geometry from the UI collaborator
    pub(crate) fn screen_layout(&self) -> crate::platform::ScreenLayout {
        self.inner.ui.screen_layout()
    }

    /// Queue a touch-synthesized action, recording the tapped menu index
    /// in the same critical section. The index is only recorded when the
    /// action was actually queued.
    pub(crate) fn push_touch_action(&self, code: ActionCode, selection: Option<i32>) {
        let mut state = self.inner.state.lock();
        if self.inner.push_locked(&mut state, code) && selection.is_some() {
            state.touch_selection = selection;
        }
    }
}

impl Inner {
    /// Returns whether `code` was queued
    fn push_locked(&self, state: &mut InputState, code: ActionCode) -> bool {
        let queued = state.queue.push(code);
        if !queued {
            tracing::debug!("Action queue full, dropping {}", code);
        }
        self.key_available.notify_one();
        queued
    }

    /// Apply a policy decision while the lock is held. Queue pushes happen
    /// here; anything that leaves the input core is returned for later.
    fn apply_locked(&self, state: &mut InputState, action: KeyAction) -> Option<Effect> {
        match action {
            KeyAction::Ignore => None,
            KeyAction::ToggleVisibility => Some(Effect::ToggleVisibility),
            KeyAction::Reboot => {
                if state.reboot_enabled {
                    Some(Effect::Reboot)
                } else {
                    tracing::debug!("Reboot requested while disabled, ignoring");
                    None
                }
            }
            KeyAction::Enqueue(code) => {
                self.push_locked(state, code);
                None
            }
            KeyAction::PrivilegedMount => {
                if self.allow_system_mount {
                    Some(Effect::MountSystem)
                } else {
                    tracing::debug!("System mount requested but not allowed, ignoring");
                    None
                }
            }
        }
    }

    fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::ToggleVisibility => {
                let visible = self.ui.is_text_visible();
                self.ui.show_text(!visible);
            }
            Effect::Reboot => {
                tracing::info!("Rebooting from hotkey combo");
                if let Err(e) = self.system.reboot() {
                    tracing::warn!("Reboot failed: {:#}", e);
                    self.ui.print(&format!("Reboot failed: {}", e));
                }
            }
            Effect::MountSystem => match self.system.mount_system() {
                Ok(()) => self.ui.print("Mounted /system."),
                Err(e) => {
                    tracing::warn!("Mounting /system failed: {:#}", e);
                    self.ui.print(&format!("Failed to mount /system: {}", e));
                }
            },
        }
    }

    /// Timer thread callback: mark the press long if it is still current
    fn on_long_press_expired(&self, code: u16, generation: u64) {
        let effect = {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            if !state.keys.mark_long(code, generation) {
                return;
            }
            tracing::debug!("Key {} held past long-press threshold", code);

            let snapshot = KeySnapshot::new(&state.keys, state.reboot_enabled);
            let action = state.policy.on_long_press(&snapshot, code);
            self.apply_locked(state, action)
        };

        if let Some(effect) = effect {
            self.run_effect(effect);
        }
    }
}
