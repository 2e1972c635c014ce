//! Geometry and label types shared by the annotator, the organizer and the
//! detector driver.
//!
//! Boxes are kept in XYXY form and tagged with their coordinate space, so a
//! pixel box has to go through [`NormalizedLabel::from_pixel_box`] before it
//! can be written to a label file.
//!
//! # Example
//!
//! ```
//! use arenalabel::ir::{BBoxXYXY, Coord, NormalizedLabel, Pixel};
//!
//! let drag = BBoxXYXY::<Pixel>::from_corners(Coord::new(300.0, 150.0), Coord::new(100.0, 50.0));
//! let label = NormalizedLabel::from_pixel_box(0, &drag, 400, 200);
//! assert_eq!(label.to_string(), "0 0.500000 0.500000 0.500000 0.500000");
//! ```

mod bbox;
mod coord;
pub mod io_label;
mod label;
mod space;

pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use label::{parse_label_line, ClassId, LabelRow, NormalizedLabel};
pub use space::{Normalized, Pixel};
