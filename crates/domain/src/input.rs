//! Raw user-input events consumed by the fallback measurer.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Low-level input event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Mouse button pressed.
    MouseDown,
    /// Key pressed.
    KeyDown,
    /// Touch started.
    TouchStart,
    /// Pointer pressed.
    PointerDown,
    /// Pointer released.
    PointerUp,
    /// Pointer interaction cancelled (scroll, pan, pinch).
    PointerCancel,
}

impl InputKind {
    /// Kinds that can start a first interaction.
    pub const FIRST_INPUT_KINDS: [Self; 4] = [
        Self::MouseDown,
        Self::KeyDown,
        Self::TouchStart,
        Self::PointerDown,
    ];

    /// Event type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::KeyDown => "keydown",
            Self::TouchStart => "touchstart",
            Self::PointerDown => "pointerdown",
            Self::PointerUp => "pointerup",
            Self::PointerCancel => "pointercancel",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A dispatched input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    /// Event kind.
    pub kind: InputKind,
    /// Time the event was created (before it was queued for dispatch).
    pub time_stamp: Timestamp,
    /// Whether the event is cancelable.
    #[serde(default = "default_cancelable")]
    pub cancelable: bool,
    /// Optional target description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Box<str>>,
}

const fn default_cancelable() -> bool {
    true
}

impl InputEvent {
    /// Cancelable input event of `kind` created at `time_stamp`.
    #[must_use]
    pub const fn new(kind: InputKind, time_stamp: Timestamp) -> Self {
        Self {
            kind,
            time_stamp,
            cancelable: true,
            target: None,
        }
    }

    /// Attach a target description.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<Box<str>>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Mark the event as non-cancelable.
    #[must_use]
    pub fn non_cancelable(mut self) -> Self {
        self.cancelable = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_event_defaults_to_cancelable() -> Result<(), serde_json::Error> {
        let event: InputEvent = serde_json::from_str(r#"{"kind":"keydown","timeStamp":12.5}"#)?;
        assert_eq!(event.kind, InputKind::KeyDown);
        assert!(event.cancelable);
        assert_eq!(event.target, None);
        Ok(())
    }

    #[test]
    fn first_input_kinds_exclude_pointer_release() {
        assert!(!InputKind::FIRST_INPUT_KINDS.contains(&InputKind::PointerUp));
        assert!(!InputKind::FIRST_INPUT_KINDS.contains(&InputKind::PointerCancel));
    }
}
