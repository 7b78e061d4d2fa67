//! Line-oriented stand-in for a pointer and keyboard: one user event per line.

use std::path::PathBuf;

use crate::error::AppError;

/// The abstract events a front end can produce. Coordinates are canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserEvent {
    ZoomIn { x: f64, y: f64 },
    ZoomOut { x: f64, y: f64 },
    Reset,
    Undo,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(UserEvent),
    /// Write the current surface to a PNG file.
    Save(PathBuf),
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
///
/// ```text
/// in 120 80      zoom in around pixel (120, 80)
/// out 10.5 3     zoom out around pixel (10.5, 3)
/// reset
/// undo
/// save frame.png
/// quit
/// ```
pub fn parse_command(line: &str) -> Result<Option<Command>, AppError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match (verb, args.as_slice()) {
        ("in", [x, y]) => {
            let (x, y) = parse_point(x, y, line)?;
            Command::Event(UserEvent::ZoomIn { x, y })
        }
        ("out", [x, y]) => {
            let (x, y) = parse_point(x, y, line)?;
            Command::Event(UserEvent::ZoomOut { x, y })
        }
        ("reset", []) => Command::Event(UserEvent::Reset),
        ("undo", []) => Command::Event(UserEvent::Undo),
        ("save", [path]) => Command::Save(PathBuf::from(path)),
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(AppError::Command(line.to_string())),
    };
    Ok(Some(command))
}

fn parse_point(x: &str, y: &str, line: &str) -> Result<(f64, f64), AppError> {
    match (x.parse::<f64>(), y.parse::<f64>()) {
        (Ok(x), Ok(y)) if x.is_finite() && y.is_finite() && x >= 0.0 && y >= 0.0 => Ok((x, y)),
        _ => Err(AppError::Command(line.to_string())),
    }
}
