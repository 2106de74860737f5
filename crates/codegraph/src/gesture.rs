use crate::settings::GESTURE_WINDOW;
use std::time::{Duration, Instant};

/// What a completed click sequence resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// One click: show the signature.
    Single,
    /// Two clicks: open the source.
    Double,
    /// Three or more: highlight the connected component.
    Triple,
}

impl Gesture {
    fn from_count(count: u32) -> Self {
        match count {
            0 | 1 => Gesture::Single,
            2 => Gesture::Double,
            _ => Gesture::Triple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredGesture {
    pub node_id: String,
    pub gesture: Gesture,
}

/// Click counter with one cancellable deadline.
///
/// Every click restarts the deadline and rebinds the sequence to the
/// clicked node. When the deadline passes, `poll` reports the gesture once
/// and the machine returns to `Idle`. A click that arrives after an unpolled
/// deadline reports the finished sequence before starting a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClickGesture {
    #[default]
    Idle,
    Counting {
        count: u32,
        node_id: String,
        deadline: Instant,
    },
}

impl ClickGesture {
    #[must_use]
    pub fn click(&mut self, node_id: &str, now: Instant) -> Option<FiredGesture> {
        self.click_with_window(node_id, now, GESTURE_WINDOW)
    }

    #[must_use]
    pub fn click_with_window(
        &mut self,
        node_id: &str,
        now: Instant,
        window: Duration,
    ) -> Option<FiredGesture> {
        let expired = self.poll(now);
        let count = match self {
            ClickGesture::Counting {
                count, deadline, ..
            } if now < *deadline => *count + 1,
            _ => 1,
        };
        *self = ClickGesture::Counting {
            count,
            node_id: node_id.to_string(),
            deadline: now + window,
        };
        expired
    }

    pub fn poll(&mut self, now: Instant) -> Option<FiredGesture> {
        match self {
            ClickGesture::Counting {
                count,
                node_id,
                deadline,
            } if now >= *deadline => {
                let fired = FiredGesture {
                    node_id: std::mem::take(node_id),
                    gesture: Gesture::from_count(*count),
                };
                *self = ClickGesture::Idle;
                Some(fired)
            }
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self {
            ClickGesture::Idle => None,
            ClickGesture::Counting { deadline, .. } => Some(*deadline),
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            ClickGesture::Idle => 0,
            ClickGesture::Counting { count, .. } => *count,
        }
    }
}
