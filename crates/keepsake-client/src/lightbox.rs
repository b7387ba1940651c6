// SPDX-License-Identifier: Apache-2.0

//! Full-size viewer over a snapshot of the gallery cards.
//!
//! While open, keyboard focus cycles through the viewer's own controls and
//! is handed back to whatever held it before opening once the viewer closes.

use crate::error::{ClientError, ClientErrorCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxItem {
    pub src: String,
    pub alt: String,
    pub caption_text: String,
}

/// Focusable controls inside the viewer, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxControl {
    Close,
    Prev,
    Next,
}

pub const CONTROLS: [LightboxControl; 3] = [
    LightboxControl::Close,
    LightboxControl::Prev,
    LightboxControl::Next,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Tab { shift: bool },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightboxState {
    Closed,
    Open {
        index: usize,
        items: Vec<LightboxItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Showing(usize),
    FocusMoved(LightboxControl),
    /// Viewer closed; focus goes back to the element that opened it.
    Closed { restore_focus: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Lightbox {
    state: LightboxState,
    focus: usize,
    return_focus: Option<String>,
}

impl Default for Lightbox {
    fn default() -> Self {
        Self {
            state: LightboxState::Closed,
            focus: 0,
            return_focus: None,
        }
    }
}

impl Lightbox {
    #[must_use]
    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, LightboxState::Open { .. })
    }

    #[must_use]
    pub fn current(&self) -> Option<&LightboxItem> {
        match &self.state {
            LightboxState::Open { index, items } => items.get(*index),
            LightboxState::Closed => None,
        }
    }

    #[must_use]
    pub fn focused(&self) -> Option<LightboxControl> {
        self.is_open().then(|| CONTROLS[self.focus])
    }

    /// Opens at `index`, remembering `return_focus` for when the viewer closes.
    pub fn open(
        &mut self,
        index: usize,
        items: Vec<LightboxItem>,
        return_focus: Option<String>,
    ) -> Result<(), ClientError> {
        if items.is_empty() {
            return Err(ClientError::new(
                ClientErrorCode::Invalid,
                "cannot open the lightbox on an empty collection",
            ));
        }
        if index >= items.len() {
            return Err(ClientError::new(
                ClientErrorCode::Invalid,
                format!("index {index} is outside a collection of {}", items.len()),
            ));
        }
        self.state = LightboxState::Open { index, items };
        self.focus = 0;
        self.return_focus = return_focus;
        Ok(())
    }

    pub fn close(&mut self) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        self.state = LightboxState::Closed;
        self.focus = 0;
        KeyOutcome::Closed {
            restore_focus: self.return_focus.take(),
        }
    }

    fn step(&mut self, forward: bool) -> KeyOutcome {
        let LightboxState::Open { index, items } = &mut self.state else {
            return KeyOutcome::Ignored;
        };
        let len = items.len();
        *index = if forward {
            (*index + 1) % len
        } else {
            (*index + len - 1) % len
        };
        KeyOutcome::Showing(*index)
    }

    pub fn next(&mut self) -> KeyOutcome {
        self.step(true)
    }

    pub fn prev(&mut self) -> KeyOutcome {
        self.step(false)
    }

    fn cycle_focus(&mut self, backward: bool) -> KeyOutcome {
        let len = CONTROLS.len();
        self.focus = if backward {
            (self.focus + len - 1) % len
        } else {
            (self.focus + 1) % len
        };
        KeyOutcome::FocusMoved(CONTROLS[self.focus])
    }

    pub fn activate(&mut self, control: LightboxControl) -> KeyOutcome {
        match control {
            LightboxControl::Close => self.close(),
            LightboxControl::Prev => self.prev(),
            LightboxControl::Next => self.next(),
        }
    }

    pub fn handle_key(&mut self, key: &Key) -> KeyOutcome {
        if !self.is_open() {
            return KeyOutcome::Ignored;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowRight => self.next(),
            Key::ArrowLeft => self.prev(),
            Key::Tab { shift } => self.cycle_focus(*shift),
            Key::Other(_) => KeyOutcome::Ignored,
        }
    }
}
