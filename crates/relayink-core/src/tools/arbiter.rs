//! Pointer arbitration: which pointer may draw, erase, pan or fill.
//!
//! Every pointer-down is classified into exactly one intent based on the
//! device kind, its pressed buttons and the selected tool. Only one pointer may
//! own a draw/erase stroke at a time; a different pointer may pan
//! concurrently. Move and up events are routed to the owning session only.

use super::Tool;
use crate::input::{Buttons, DeviceKind, InputEvent, PointerId};
use kurbo::{Point, Vec2};
use std::collections::HashSet;

/// What an owned pointer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeAction {
    Draw,
    Erase,
    Pan,
}

/// Live state of one in-progress interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSession {
    /// Pointer that owns this session.
    pub owner: PointerId,
    pub action: StrokeAction,
    /// Last position in logical coordinates.
    pub last_point: Point,
    /// Last raw screen position (pan deltas are measured in screen space).
    pub last_screen: Point,
    /// Path length covered since the stroke started.
    pub progress: f64,
    pub erase: bool,
}

impl StrokeSession {
    fn new(owner: PointerId, action: StrokeAction, point: Point, screen: Point) -> Self {
        Self {
            owner,
            action,
            last_point: point,
            last_screen: screen,
            progress: 0.0,
            erase: action == StrokeAction::Erase,
        }
    }
}

/// Result of a pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownOutcome {
    Ignored,
    /// A draw or erase stroke started at a logical point.
    Stroke { action: StrokeAction, point: Point },
    Pan,
    /// One immediate flood fill at a logical point; no session is opened.
    Fill { point: Point },
}

/// Result of a pointer-move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    Ignored,
    /// Scroll by a raw screen delta.
    Pan { delta: Vec2 },
    /// Render a segment; `progress` is the stroke length before this segment.
    Segment {
        from: Point,
        to: Point,
        progress: f64,
        erase: bool,
    },
}

/// Result of a pointer-up or pointer-leave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpOutcome {
    Ignored,
    /// Capture released, but the pointer owned no session.
    Released,
    /// The pointer's session ended.
    Ended(StrokeAction),
}

/// Intent of a pointer-down before ownership rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Draw,
    Erase,
    Pan,
    Fill,
}

/// Arbitrates ownership of the drawing surface between pointers.
#[derive(Debug, Clone, Default)]
pub struct PointerArbiter {
    /// The single draw/erase owner.
    draw: Option<StrokeSession>,
    /// The pan owner, always a different pointer than the draw owner.
    pan: Option<StrokeSession>,
    /// Pointers whose move/up events are pinned to the surface.
    captured: HashSet<PointerId>,
}

impl PointerArbiter {
    /// Create an arbiter with no owners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a pointer-down at `logical` (already mapped through the viewport).
    pub fn pointer_down(&mut self, event: &InputEvent, logical: Point, tool: Tool) -> DownOutcome {
        if let Some(owner) = &self.draw {
            log::trace!(
                "Ignoring pointer {} down: pointer {} owns the stroke",
                event.pointer_id,
                owner.owner
            );
            return DownOutcome::Ignored;
        }

        let Some(intent) = classify(event, tool) else {
            return DownOutcome::Ignored;
        };

        match intent {
            Intent::Fill => DownOutcome::Fill { point: logical },
            Intent::Pan => {
                if let Some(pan) = &self.pan {
                    if pan.owner != event.pointer_id {
                        return DownOutcome::Ignored;
                    }
                }
                self.pan = Some(StrokeSession::new(
                    event.pointer_id,
                    StrokeAction::Pan,
                    logical,
                    event.screen,
                ));
                self.captured.insert(event.pointer_id);
                DownOutcome::Pan
            }
            Intent::Draw | Intent::Erase => {
                let action = if intent == Intent::Erase {
                    StrokeAction::Erase
                } else {
                    StrokeAction::Draw
                };
                // A pointer can't pan and draw at the same time
                if self.pan.as_ref().is_some_and(|pan| pan.owner == event.pointer_id) {
                    self.pan = None;
                }
                let session = StrokeSession::new(event.pointer_id, action, logical, event.screen);
                self.draw = Some(session);
                self.captured.insert(event.pointer_id);
                log::debug!("Pointer {} began {:?} stroke", event.pointer_id, action);
                DownOutcome::Stroke { action, point: logical }
            }
        }
    }

    /// Handle a pointer-move at `logical`.
    pub fn pointer_move(&mut self, event: &InputEvent, logical: Point) -> MoveOutcome {
        if let Some(session) = self.draw.as_mut().filter(|s| s.owner == event.pointer_id) {
            let from = session.last_point;
            let progress = session.progress;
            session.progress += (logical - from).hypot();
            session.last_point = logical;
            session.last_screen = event.screen;
            return MoveOutcome::Segment {
                from,
                to: logical,
                progress,
                erase: session.erase,
            };
        }

        if let Some(session) = self.pan.as_mut().filter(|s| s.owner == event.pointer_id) {
            let delta = event.screen - session.last_screen;
            session.last_screen = event.screen;
            session.last_point = logical;
            return MoveOutcome::Pan { delta };
        }

        MoveOutcome::Ignored
    }

    /// Handle a pointer-up or pointer-leave.
    pub fn pointer_up(&mut self, event: &InputEvent) -> UpOutcome {
        let was_captured = self.captured.remove(&event.pointer_id);

        if self.draw.as_ref().is_some_and(|s| s.owner == event.pointer_id) {
            let action = self.draw.take().map_or(StrokeAction::Draw, |s| s.action);
            log::debug!("Pointer {} ended {:?} stroke", event.pointer_id, action);
            return UpOutcome::Ended(action);
        }

        if self.pan.as_ref().is_some_and(|s| s.owner == event.pointer_id) {
            self.pan = None;
            return UpOutcome::Ended(StrokeAction::Pan);
        }

        if was_captured {
            UpOutcome::Released
        } else {
            UpOutcome::Ignored
        }
    }

    /// Drop every session and capture.
    pub fn cancel_all(&mut self) {
        self.draw = None;
        self.pan = None;
        self.captured.clear();
    }

    /// Check if a draw/erase stroke is in progress.
    pub fn is_drawing(&self) -> bool {
        self.draw.is_some()
    }

    /// Check if a pan is in progress.
    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// The active draw/erase session, if any.
    pub fn draw_session(&self) -> Option<&StrokeSession> {
        self.draw.as_ref()
    }

    /// The active pan session, if any.
    pub fn pan_session(&self) -> Option<&StrokeSession> {
        self.pan.as_ref()
    }

    /// Check if a pointer is captured by the surface.
    pub fn is_captured(&self, pointer_id: PointerId) -> bool {
        self.captured.contains(&pointer_id)
    }
}

/// Classify a pointer-down by device, buttons and tool.
fn classify(event: &InputEvent, tool: Tool) -> Option<Intent> {
    let buttons = event.buttons;
    match event.device {
        DeviceKind::Pen => {
            let tip = buttons.contains(Buttons::PRIMARY);
            if buttons.contains(Buttons::ERASER) || (tip && tool == Tool::Eraser) {
                Some(Intent::Erase)
            } else if tip {
                // Tip wins over a held barrel button
                Some(if tool == Tool::Fill { Intent::Fill } else { Intent::Draw })
            } else if buttons.contains(Buttons::SECONDARY) {
                Some(Intent::Pan)
            } else {
                None
            }
        }
        DeviceKind::Mouse => {
            if buttons.contains(Buttons::SECONDARY) {
                Some(Intent::Pan)
            } else if buttons.contains(Buttons::PRIMARY) {
                Some(match tool {
                    Tool::Brush => Intent::Draw,
                    Tool::Eraser => Intent::Erase,
                    Tool::Fill => Intent::Fill,
                })
            } else {
                None
            }
        }
        DeviceKind::Touch => Some(Intent::Pan),
    }
}
