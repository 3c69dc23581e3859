//! Detection events and their one-line text form
//!
//! Each event goes out on the output channel as:
//!
//! ```text
//! <seconds> sec, window <scale>: <block_sum>
//! ```
//!
//! followed by a newline. The `FromStr` impl accepts the same line (with or
//! without the trailing newline) so host-side receivers can decode the stream.

use core::fmt;
use core::str::FromStr;

use thiserror_no_std::Error;

/// A reported detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionEvent {
    /// Seconds clock at emission.
    pub seconds: u32,
    /// Window scale that triggered, also its label.
    pub scale: u32,
    /// Triggering block sum.
    pub block_sum: u32,
}

impl DetectionEvent {
    /// Mean deviation per sample over the triggering window.
    pub fn mean_deviation(&self) -> f32 {
        self.block_sum as f32 / self.scale as f32
    }
}

impl fmt::Display for DetectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sec, window {}: {}",
            self.seconds, self.scale, self.block_sum
        )
    }
}

/// Error types for event line decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseEventError {
    #[error("Missing ` sec, window ` separator")]
    MissingSeconds,

    #[error("Missing `: ` separator")]
    MissingValue,

    #[error("Invalid {field} field")]
    InvalidNumber { field: &'static str },
}

fn parse_field(text: &str, field: &'static str) -> Result<u32, ParseEventError> {
    // Reject signs and whitespace that `u32::from_str` would otherwise accept
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseEventError::InvalidNumber { field });
    }
    text.parse()
        .map_err(|_| ParseEventError::InvalidNumber { field })
}

impl FromStr for DetectionEvent {
    type Err = ParseEventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);

        let (seconds, rest) = line
            .split_once(" sec, window ")
            .ok_or(ParseEventError::MissingSeconds)?;
        let (scale, block_sum) = rest
            .split_once(": ")
            .ok_or(ParseEventError::MissingValue)?;

        Ok(Self {
            seconds: parse_field(seconds, "seconds")?,
            scale: parse_field(scale, "window")?,
            block_sum: parse_field(block_sum, "value")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn test_display_matches_line_format() {
        let event = DetectionEvent {
            seconds: 12,
            scale: 128,
            block_sum: 3104,
        };
        assert_eq!(event.to_string(), "12 sec, window 128: 3104");
    }

    #[test]
    fn test_parse_line_with_newline() {
        let event: DetectionEvent = "7 sec, window 2048: 43210\n".parse().unwrap();
        assert_eq!(
            event,
            DetectionEvent {
                seconds: 7,
                scale: 2048,
                block_sum: 43210
            }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert_eq!(
            "7 seconds, window 32: 5".parse::<DetectionEvent>(),
            Err(ParseEventError::MissingSeconds)
        );
        assert_eq!(
            "7 sec, window 32 5".parse::<DetectionEvent>(),
            Err(ParseEventError::MissingValue)
        );
        assert_eq!(
            "7 sec, window 32: +5".parse::<DetectionEvent>(),
            Err(ParseEventError::InvalidNumber { field: "value" })
        );
        assert_eq!(
            "x sec, window 32: 5".parse::<DetectionEvent>(),
            Err(ParseEventError::InvalidNumber { field: "seconds" })
        );
    }

    #[test]
    fn test_mean_deviation() {
        let event = DetectionEvent {
            seconds: 1,
            scale: 32,
            block_sum: 960,
        };
        assert_eq!(event.mean_deviation(), 30.0);
    }
}
