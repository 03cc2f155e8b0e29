//! Classification of the tool's console output.

use std::io::{ErrorKind, Read};

use tracing::warn;

use super::SUPERVISOR_TARGET;

/// Spinner glyphs the tool prints while busy.
const SPINNER_GLYPHS: [&str; 4] = ["/", "-", "\\", "|"];

/// Upper bound of a progress percentage.
const MAX_PROGRESS: u64 = 100;

/// What one line of console output means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine<'a> {
    /// The line contains `%`; the value is the parsed percentage, if any.
    Progress(Option<u8>),
    /// A spinner glyph, discarded.
    Spinner,
    /// Anything else, trimmed. May be empty.
    Console(&'a str),
}

/// Classifies one line of console output.
///
/// ```
/// use saga_processing::supervisor::{OutputLine, classify_line};
///
/// assert_eq!(classify_line("Process: 45% complete"), OutputLine::Progress(Some(45)));
/// assert_eq!(classify_line("|"), OutputLine::Spinner);
/// assert_eq!(classify_line("  Loading grid  "), OutputLine::Console("Loading grid"));
/// ```
#[must_use]
pub fn classify_line(line: &str) -> OutputLine<'_> {
    if line.contains('%') {
        return OutputLine::Progress(parse_progress(line));
    }
    let trimmed = line.trim();
    if SPINNER_GLYPHS.contains(&trimmed) {
        OutputLine::Spinner
    } else {
        OutputLine::Console(trimmed)
    }
}

/// Concatenates every digit of `line` into a percentage, clamped to 100.
///
/// Returns `None` when the line holds no digits or too many to parse.
#[must_use]
pub fn parse_progress(line: &str) -> Option<u8> {
    let digits: String = line.chars().filter(char::is_ascii_digit).collect();
    let value = digits.parse::<u64>().ok()?;
    u8::try_from(value.min(MAX_PROGRESS)).ok()
}

/// Reads `reader` to the end, calling `on_line` for every line.
///
/// `\r`, `\n`, and `\r\n` all end a line, so carriage-return progress
/// updates arrive one by one. Bytes are decoded lossily. A read error ends
/// the stream with a warning instead of failing the job.
pub(super) fn for_each_line(mut reader: impl Read, mut on_line: impl FnMut(&str)) {
    let mut buffer = [0_u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(
                    target: SUPERVISOR_TARGET,
                    error = %err,
                    "console stream read failed; treating as end of output"
                );
                break;
            }
        };
        for &byte in buffer.iter().take(count) {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut pending, &mut on_line);
            } else {
                pending.push(byte);
            }
        }
    }
    flush_line(&mut pending, &mut on_line);
}

fn flush_line(pending: &mut Vec<u8>, on_line: &mut impl FnMut(&str)) {
    if pending.is_empty() {
        return;
    }
    on_line(&String::from_utf8_lossy(pending));
    pending.clear();
}
