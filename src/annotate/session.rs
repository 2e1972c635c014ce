//! Per-image drawing state machine.
//!
//! A session starts `Idle`. Pressing the button fixes the anchor and moves
//! to `Drawing`; moves update the far corner; releasing finalizes an
//! ordered box, appends it and returns to `Idle`.

use crate::ir::{BBoxXYXY, ClassId, Coord, NormalizedLabel, Pixel};

/// A pointer event in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Press(Coord<Pixel>),
    Move(Coord<Pixel>),
    Release(Coord<Pixel>),
}

impl PointerEvent {
    pub fn press(x: f64, y: f64) -> Self {
        PointerEvent::Press(Coord::new(x, y))
    }

    pub fn moved(x: f64, y: f64) -> Self {
        PointerEvent::Move(Coord::new(x, y))
    }

    pub fn release(x: f64, y: f64) -> Self {
        PointerEvent::Release(Coord::new(x, y))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DrawState {
    #[default]
    Idle,
    Drawing {
        anchor: Coord<Pixel>,
        cursor: Coord<Pixel>,
    },
}

/// The boxes drawn so far on one image, plus the in-progress drag.
#[derive(Clone, Debug)]
pub struct AnnotationSession {
    width: u32,
    height: u32,
    state: DrawState,
    boxes: Vec<BBoxXYXY<Pixel>>,
}

impl AnnotationSession {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: DrawState::Idle,
            boxes: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn boxes(&self) -> &[BBoxXYXY<Pixel>] {
        &self.boxes
    }

    /// Feeds one pointer event. Returns the box finalized by a release.
    ///
    /// A press while drawing re-anchors the drag; a release while idle is
    /// ignored.
    pub fn handle(&mut self, event: PointerEvent) -> Option<BBoxXYXY<Pixel>> {
        match (self.state, event) {
            (_, PointerEvent::Press(at)) => {
                let at = at.clamp_to(self.width, self.height);
                self.state = DrawState::Drawing {
                    anchor: at,
                    cursor: at,
                };
                None
            }
            (DrawState::Drawing { anchor, .. }, PointerEvent::Move(at)) => {
                self.state = DrawState::Drawing {
                    anchor,
                    cursor: at.clamp_to(self.width, self.height),
                };
                None
            }
            (DrawState::Drawing { anchor, .. }, PointerEvent::Release(at)) => {
                let bbox = BBoxXYXY::from_corners(anchor, at.clamp_to(self.width, self.height));
                self.boxes.push(bbox);
                self.state = DrawState::Idle;
                Some(bbox)
            }
            (DrawState::Idle, PointerEvent::Move(_) | PointerEvent::Release(_)) => None,
        }
    }

    /// The rectangle currently being dragged, if any.
    pub fn preview(&self) -> Option<BBoxXYXY<Pixel>> {
        match self.state {
            DrawState::Idle => None,
            DrawState::Drawing { anchor, cursor } => Some(BBoxXYXY::from_corners(anchor, cursor)),
        }
    }

    /// Drops the most recently finalized box.
    pub fn undo(&mut self) -> Option<BBoxXYXY<Pixel>> {
        self.boxes.pop()
    }

    /// Encodes every finalized box with the run's class id.
    pub fn labels(&self, class_id: ClassId) -> Vec<NormalizedLabel> {
        self.boxes
            .iter()
            .map(|bbox| NormalizedLabel::from_pixel_box(class_id, bbox, self.width, self.height))
            .collect()
    }
}
