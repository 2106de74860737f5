use crate::actions::{self, Action};
use crate::backend::{Backend, Viewport};
use crate::effects::{self, Effect};
use crate::settings::AUTO_UPDATE_INTERVAL;
use crate::store::GraphStore;
use std::time::{Duration, Instant};

/// Follow-up rounds allowed per `process` call. Effects answer with
/// actions, which may schedule more effects; this caps the chain.
const MAX_ROUNDS: usize = 8;

pub struct State<B: Backend> {
    pub store: GraphStore,
    backend: B,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
    next_rescan: Option<Instant>,
    rescan_interval: Duration,
}

impl<B: Backend> State<B> {
    pub fn new(store: GraphStore, backend: B) -> Self {
        Self {
            store,
            backend,
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
            next_rescan: None,
            rescan_interval: AUTO_UPDATE_INTERVAL,
        }
    }

    pub fn with_rescan_interval(mut self, interval: Duration) -> Self {
        self.rescan_interval = interval;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            let mut effects = actions::update(&mut self.store, action);
            self.effect_queue.append(&mut effects);
        }
    }

    pub fn flush_effects(&mut self, viewport: &mut dyn Viewport) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            let mut follow_up =
                effects::run(&self.store, &mut self.backend, viewport, effect);
            self.action_queue.append(&mut follow_up);
        }
    }

    /// Flush both queues until they settle.
    pub fn process(&mut self, viewport: &mut dyn Viewport) {
        for _ in 0..MAX_ROUNDS {
            if self.action_queue.is_empty() && self.effect_queue.is_empty() {
                return;
            }
            self.flush_actions();
            self.flush_effects(viewport);
        }
        if !self.action_queue.is_empty() || !self.effect_queue.is_empty() {
            log::warn!(
                "queues still busy after {MAX_ROUNDS} rounds: {} actions, {} effects",
                self.action_queue.len(),
                self.effect_queue.len()
            );
        }
    }

    /// Drive the gesture deadline and the periodic rescan.
    pub fn tick(&mut self, now: Instant) {
        self.dispatch(Action::Tick { now });

        if !self.store.auto_update {
            self.next_rescan = None;
            return;
        }
        match self.next_rescan {
            None => self.next_rescan = Some(now + self.rescan_interval),
            Some(due) if now >= due => {
                log::debug!("auto-update: rescanning");
                self.dispatch(Action::Rescan);
                self.next_rescan = Some(now + self.rescan_interval);
            }
            Some(_) => {}
        }
    }

    /// Earliest instant something is scheduled to happen.
    pub fn next_wakeup(&self) -> Option<Instant> {
        let gesture = self.store.gesture.deadline();
        match (gesture, self.next_rescan) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn rescan_due(&self) -> Option<Instant> {
        self.next_rescan
    }
}
