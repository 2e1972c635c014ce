//! Input sources for the annotator.
//!
//! A [`Frontend`] shows an image and turns device input into [`Event`]s.
//! The drawing logic itself lives in [`AnnotationSession`]; frontends only
//! translate and render.

use std::collections::VecDeque;
use std::io::BufRead;

use super::session::{AnnotationSession, PointerEvent};
use super::ImageEntry;
use crate::error::ArenaLabelError;

/// Per-image control commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Write the accumulated boxes and advance.
    Save,
    /// Discard the accumulated boxes and advance.
    Skip,
    /// Drop the last finalized box.
    Undo,
    /// Stop the whole run.
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Pointer(PointerEvent),
    Command(Command),
}

pub trait Frontend {
    /// Prepares `image` for display. Returns `Ok(false)` when the image
    /// cannot be decoded; the driver then skips it.
    fn open(&mut self, image: &ImageEntry) -> Result<bool, ArenaLabelError>;

    /// Blocks until the next user event. The session is passed so the
    /// frontend can redraw finalized boxes and the live preview.
    fn next_event(&mut self, session: &AnnotationSession) -> Result<Event, ArenaLabelError>;

    /// Called once when the run ends, whether finished or quit.
    fn close(&mut self) -> Result<(), ArenaLabelError> {
        Ok(())
    }
}

/// Reads events from a line-oriented script, one command per line:
///
/// ```text
/// down X Y | move X Y | up X Y | box X1 Y1 X2 Y2
/// save | s | skip | n | undo | u | quit | q
/// ```
///
/// Blank lines and `#` comments are ignored. End of input quits.
pub struct ScriptFrontend<R> {
    reader: R,
    line_num: usize,
    pending: VecDeque<Event>,
}

impl<R: BufRead> ScriptFrontend<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_num: 0,
            pending: VecDeque::new(),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, ArenaLabelError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        self.line_num += 1;
        Ok(Some(line))
    }
}

impl<R: BufRead> Frontend for ScriptFrontend<R> {
    fn open(&mut self, _image: &ImageEntry) -> Result<bool, ArenaLabelError> {
        Ok(true)
    }

    fn next_event(&mut self, _session: &AnnotationSession) -> Result<Event, ArenaLabelError> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }
            let Some(line) = self.read_line()? else {
                return Ok(Event::Command(Command::Quit));
            };
            self.pending
                .extend(parse_script_line(&line, self.line_num)?);
        }
    }
}

/// Parses one script line into zero or more events.
pub fn parse_script_line(line: &str, line_num: usize) -> Result<Vec<Event>, ArenaLabelError> {
    let content = line.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let mut tokens = content.split_whitespace();
    let keyword = tokens.next().unwrap_or_default();
    let args: Vec<&str> = tokens.collect();

    let numbers = |expected: usize| -> Result<Vec<f64>, ArenaLabelError> {
        if args.len() != expected {
            return Err(ArenaLabelError::ScriptParse {
                line: line_num,
                message: format!(
                    "'{keyword}' takes {expected} coordinate(s), found {}",
                    args.len()
                ),
            });
        }
        args.iter()
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| ArenaLabelError::ScriptParse {
                        line: line_num,
                        message: format!("invalid coordinate '{raw}'"),
                    })
            })
            .collect()
    };
    let command = |command: Command| -> Result<Vec<Event>, ArenaLabelError> {
        if !args.is_empty() {
            return Err(ArenaLabelError::ScriptParse {
                line: line_num,
                message: format!("'{keyword}' takes no arguments"),
            });
        }
        Ok(vec![Event::Command(command)])
    };

    match keyword.to_ascii_lowercase().as_str() {
        "down" => {
            let v = numbers(2)?;
            Ok(vec![Event::Pointer(PointerEvent::press(v[0], v[1]))])
        }
        "move" => {
            let v = numbers(2)?;
            Ok(vec![Event::Pointer(PointerEvent::moved(v[0], v[1]))])
        }
        "up" => {
            let v = numbers(2)?;
            Ok(vec![Event::Pointer(PointerEvent::release(v[0], v[1]))])
        }
        "box" => {
            let v = numbers(4)?;
            Ok(vec![
                Event::Pointer(PointerEvent::press(v[0], v[1])),
                Event::Pointer(PointerEvent::release(v[2], v[3])),
            ])
        }
        "save" | "s" => command(Command::Save),
        "skip" | "n" => command(Command::Skip),
        "undo" | "u" => command(Command::Undo),
        "quit" | "q" => command(Command::Quit),
        other => Err(ArenaLabelError::ScriptParse {
            line: line_num,
            message: format!("unknown command '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_pointer_and_key_commands() {
        assert_eq!(
            parse_script_line("down 10 20", 1).unwrap(),
            vec![Event::Pointer(PointerEvent::press(10.0, 20.0))]
        );
        assert_eq!(
            parse_script_line("  S  ", 2).unwrap(),
            vec![Event::Command(Command::Save)]
        );
        assert_eq!(
            parse_script_line("n # next frame", 3).unwrap(),
            vec![Event::Command(Command::Skip)]
        );
        assert!(parse_script_line("# only a comment", 4).unwrap().is_empty());
    }

    #[test]
    fn box_expands_to_press_and_release() {
        let events = parse_script_line("box 5 6 7 8", 1).unwrap();
        assert_eq!(
            events,
            vec![
                Event::Pointer(PointerEvent::press(5.0, 6.0)),
                Event::Pointer(PointerEvent::release(7.0, 8.0)),
            ]
        );
    }

    #[test]
    fn malformed_lines_report_their_line_number() {
        let err = parse_script_line("box 1 2 3", 7).unwrap_err();
        assert!(matches!(err, ArenaLabelError::ScriptParse { line: 7, .. }));

        let err = parse_script_line("down x 2", 8).unwrap_err();
        assert!(matches!(err, ArenaLabelError::ScriptParse { line: 8, .. }));

        let err = parse_script_line("save now", 9).unwrap_err();
        assert!(matches!(err, ArenaLabelError::ScriptParse { line: 9, .. }));

        let err = parse_script_line("jump", 10).unwrap_err();
        assert!(matches!(err, ArenaLabelError::ScriptParse { line: 10, .. }));
    }

    #[test]
    fn script_frontend_streams_events_then_quits_at_eof() {
        let script = "box 1 2 3 4\n\nsave\n";
        let mut frontend = ScriptFrontend::new(Cursor::new(script));
        let session = AnnotationSession::new(10, 10);

        let mut events = Vec::new();
        for _ in 0..4 {
            events.push(frontend.next_event(&session).unwrap());
        }

        assert_eq!(
            events,
            vec![
                Event::Pointer(PointerEvent::press(1.0, 2.0)),
                Event::Pointer(PointerEvent::release(3.0, 4.0)),
                Event::Command(Command::Save),
                Event::Command(Command::Quit),
            ]
        );
    }
}
