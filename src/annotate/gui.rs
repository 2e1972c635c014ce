//! OpenCV highgui frontend.
//!
//! Mouse callbacks run on the highgui side and are forwarded through a
//! channel; the drawing state stays in the caller's session. Keys: `s`
//! save, `n` skip, `u` undo, `q` or closing the window quits.

use std::sync::mpsc::{self, Receiver, Sender};

use opencv::core::{Mat, Rect, Scalar};
use opencv::prelude::*;
use opencv::{highgui, imgcodecs, imgproc};

use super::frontend::{Command, Event, Frontend};
use super::session::{AnnotationSession, PointerEvent};
use super::ImageEntry;
use crate::error::ArenaLabelError;
use crate::ir::{BBoxXYXY, Pixel};

const WINDOW_NAME: &str = "Annotate";
const POLL_MS: i32 = 15;

pub struct WindowFrontend {
    image: Mat,
    pointer_tx: Sender<PointerEvent>,
    pointer_rx: Receiver<PointerEvent>,
    window_open: bool,
}

impl WindowFrontend {
    pub fn new() -> Self {
        let (pointer_tx, pointer_rx) = mpsc::channel();
        Self {
            image: Mat::default(),
            pointer_tx,
            pointer_rx,
            window_open: false,
        }
    }

    fn render(&self, session: &AnnotationSession) -> Result<(), ArenaLabelError> {
        let mut display = self.image.try_clone()?;
        for bbox in session.boxes() {
            draw_box(&mut display, bbox, Scalar::new(0.0, 255.0, 0.0, 0.0))?;
        }
        if let Some(preview) = session.preview() {
            draw_box(&mut display, &preview, Scalar::new(0.0, 200.0, 255.0, 0.0))?;
        }
        highgui::imshow(WINDOW_NAME, &display)?;
        Ok(())
    }

    fn window_closed(&self) -> Result<bool, ArenaLabelError> {
        let visible = highgui::get_window_property(WINDOW_NAME, highgui::WND_PROP_VISIBLE)?;
        Ok(visible < 1.0)
    }
}

impl Default for WindowFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl Frontend for WindowFrontend {
    fn open(&mut self, image: &ImageEntry) -> Result<bool, ArenaLabelError> {
        let path = image.path.to_string_lossy();
        let mat = imgcodecs::imread(&path, imgcodecs::IMREAD_COLOR)?;
        if mat.empty() {
            return Ok(false);
        }
        self.image = mat;

        if !self.window_open {
            highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
            let tx = self.pointer_tx.clone();
            highgui::set_mouse_callback(
                WINDOW_NAME,
                Some(Box::new(move |event, x, y, _flags| {
                    let (x, y) = (x as f64, y as f64);
                    let pointer = match event {
                        highgui::EVENT_LBUTTONDOWN => PointerEvent::press(x, y),
                        highgui::EVENT_MOUSEMOVE => PointerEvent::moved(x, y),
                        highgui::EVENT_LBUTTONUP => PointerEvent::release(x, y),
                        _ => return,
                    };
                    let _ = tx.send(pointer);
                })),
            )?;
            self.window_open = true;
        }

        // Drop events that arrived while the previous image was on screen.
        while self.pointer_rx.try_recv().is_ok() {}
        Ok(true)
    }

    fn next_event(&mut self, session: &AnnotationSession) -> Result<Event, ArenaLabelError> {
        loop {
            if let Ok(pointer) = self.pointer_rx.try_recv() {
                return Ok(Event::Pointer(pointer));
            }

            self.render(session)?;
            let key = highgui::wait_key(POLL_MS)?;
            if key >= 0 {
                let command = match (key & 0xFF) as u8 {
                    b's' => Some(Command::Save),
                    b'n' => Some(Command::Skip),
                    b'u' => Some(Command::Undo),
                    b'q' => Some(Command::Quit),
                    _ => None,
                };
                if let Some(command) = command {
                    return Ok(Event::Command(command));
                }
            }

            if self.window_closed()? {
                return Ok(Event::Command(Command::Quit));
            }
        }
    }

    fn close(&mut self) -> Result<(), ArenaLabelError> {
        if self.window_open {
            highgui::destroy_all_windows()?;
            self.window_open = false;
        }
        Ok(())
    }
}

fn draw_box(mat: &mut Mat, bbox: &BBoxXYXY<Pixel>, color: Scalar) -> Result<(), ArenaLabelError> {
    let rect = Rect::new(
        bbox.xmin().round() as i32,
        bbox.ymin().round() as i32,
        bbox.width().round() as i32,
        bbox.height().round() as i32,
    );
    imgproc::rectangle(mat, rect, color, 2, imgproc::LINE_8, 0)?;
    Ok(())
}
