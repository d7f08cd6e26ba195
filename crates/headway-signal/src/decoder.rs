//! Sensor line/frame decoder.
//!
//! Turns one raw line or binary frame into a typed `SensorEvent`. Button
//! tokens are table-driven and case-sensitive because firmware revisions
//! remap them; movement fields accept fractional values and are truncated
//! toward zero after the deadzone filter.

use thiserror::Error;

use headway_core::error::HeadwayError;
use headway_core::types::{LinkProtocol, SensorEvent};

/// Error produced when a line or frame cannot be decoded.
///
/// Always non-fatal: callers drop the input and keep reading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed sensor input: {0}")]
    Malformed(String),
}

impl From<DecodeError> for HeadwayError {
    fn from(err: DecodeError) -> Self {
        HeadwayError::Decode(err.to_string())
    }
}

/// Immutable decoder configuration.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Axis deltas with absolute value below this clamp to 0.
    pub deadzone: i32,
    /// Which frame grammar `decode` expects.
    pub protocol: LinkProtocol,
    /// Exact-match tokens for a short button press.
    pub short_press_tokens: Vec<String>,
    /// Exact-match tokens for a long button press.
    pub long_press_tokens: Vec<String>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            deadzone: 2,
            protocol: LinkProtocol::Text,
            short_press_tokens: vec!["CLK".into(), "LC".into(), "C,L".into()],
            long_press_tokens: vec!["STT".into(), "RC".into()],
        }
    }
}

/// Stateless decoder for raw sensor input. No side effects.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Decode one raw line or frame according to the configured protocol.
    pub fn decode(&self, raw: &[u8]) -> Result<SensorEvent, DecodeError> {
        match self.config.protocol {
            LinkProtocol::Text => self.decode_line(raw),
            LinkProtocol::Binary => self.decode_frame(raw),
        }
    }

    /// Decode one delimited text line.
    ///
    /// Token recognition runs before movement parsing - some button tokens
    /// (e.g. `C,L`) contain the field separator.
    pub fn decode_line(&self, raw: &[u8]) -> Result<SensorEvent, DecodeError> {
        let line = std::str::from_utf8(raw)
            .map_err(|_| DecodeError::Malformed("not valid UTF-8".into()))?
            .trim();

        if line.is_empty() {
            return Err(DecodeError::Malformed("empty line".into()));
        }

        if self.config.short_press_tokens.iter().any(|t| t == line) {
            return Ok(SensorEvent::ButtonShort);
        }
        if self.config.long_press_tokens.iter().any(|t| t == line) {
            return Ok(SensorEvent::ButtonLong);
        }

        let fields: Vec<&str> = line.split(',').collect();
        let (dx_str, dy_str) = match fields.as_slice() {
            [dx, dy] => (*dx, *dy),
            [tag, dx, dy] if *tag == "M" => (*dx, *dy),
            [_single] => return Ok(SensorEvent::Unknown),
            _ => {
                return Err(DecodeError::Malformed(format!(
                    "unexpected field count: {}",
                    fields.len()
                )))
            }
        };

        let dx = parse_delta(dx_str)?;
        let dy = parse_delta(dy_str)?;

        Ok(SensorEvent::Move {
            dx: self.apply_deadzone(dx),
            dy: self.apply_deadzone(dy),
        })
    }

    /// Decode one fixed 5-byte binary frame: two little-endian i16 deltas
    /// followed by a signed byte reserved by the firmware.
    pub fn decode_frame(&self, raw: &[u8]) -> Result<SensorEvent, DecodeError> {
        if raw.len() < 5 {
            return Err(DecodeError::Malformed(format!(
                "binary frame too short: {} bytes",
                raw.len()
            )));
        }

        let dx = i16::from_le_bytes([raw[0], raw[1]]) as f64;
        let dy = i16::from_le_bytes([raw[2], raw[3]]) as f64;

        Ok(SensorEvent::Move {
            dx: self.apply_deadzone(dx),
            dy: self.apply_deadzone(dy),
        })
    }

    /// Clamp sub-deadzone jitter to 0, then truncate toward zero.
    /// Scale and sign transformation happen downstream in the pointer map.
    fn apply_deadzone(&self, delta: f64) -> i32 {
        if delta.abs() < self.config.deadzone as f64 {
            0
        } else {
            delta as i32
        }
    }
}

fn parse_delta(field: &str) -> Result<f64, DecodeError> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| DecodeError::Malformed(format!("unparsable delta field: {field:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> Decoder {
        Decoder::new(DecoderConfig::default())
    }

    #[test]
    fn test_decode_two_field_movement() {
        let event = decoder().decode_line(b"5,5").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 5, dy: 5 });
    }

    #[test]
    fn test_decode_tagged_movement() {
        let event = decoder().decode_line(b"M,4,-7").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 4, dy: -7 });
    }

    #[test]
    fn test_deadzone_clamps_small_deltas() {
        // deadzone=2: |1| < 2 clamps to 0, |5| passes untouched
        let event = decoder().decode_line(b"1,1").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 0, dy: 0 });

        let event = decoder().decode_line(b"5,5").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 5, dy: 5 });
    }

    #[test]
    fn test_deadzone_applies_per_axis() {
        let event = decoder().decode_line(b"1,9").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 0, dy: 9 });
    }

    #[test]
    fn test_fractional_deltas_truncate_toward_zero() {
        let event = decoder().decode_line(b"2.9,-3.4").unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 2, dy: -3 });
    }

    #[test]
    fn test_short_press_tokens() {
        for token in ["CLK", "LC", "C,L"] {
            let event = decoder().decode_line(token.as_bytes()).unwrap();
            assert_eq!(event, SensorEvent::ButtonShort, "token {token}");
        }
    }

    #[test]
    fn test_long_press_tokens() {
        for token in ["STT", "RC"] {
            let event = decoder().decode_line(token.as_bytes()).unwrap();
            assert_eq!(event, SensorEvent::ButtonLong, "token {token}");
        }
    }

    #[test]
    fn test_tokens_are_case_sensitive() {
        // Lowercase "clk" is not in the table and is a single field, so it
        // decodes as an unknown token, not a button.
        let event = decoder().decode_line(b"clk").unwrap();
        assert_eq!(event, SensorEvent::Unknown);
    }

    #[test]
    fn test_custom_token_table() {
        let config = DecoderConfig {
            short_press_tokens: vec!["B1".into()],
            long_press_tokens: vec!["B2".into()],
            ..DecoderConfig::default()
        };
        let decoder = Decoder::new(config);
        assert_eq!(decoder.decode_line(b"B1").unwrap(), SensorEvent::ButtonShort);
        assert_eq!(decoder.decode_line(b"B2").unwrap(), SensorEvent::ButtonLong);
        // Old default token no longer recognized.
        assert_eq!(decoder.decode_line(b"CLK").unwrap(), SensorEvent::Unknown);
    }

    #[test]
    fn test_four_fields_is_malformed() {
        let err = decoder().decode_line(b"X,Y,Z,W").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_three_fields_without_tag_is_malformed() {
        let err = decoder().decode_line(b"1,2,3").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_non_numeric_delta_is_malformed() {
        let err = decoder().decode_line(b"abc,5").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_empty_line_is_malformed() {
        assert!(decoder().decode_line(b"").is_err());
        assert!(decoder().decode_line(b"   ").is_err());
    }

    #[test]
    fn test_unknown_single_token() {
        let event = decoder().decode_line(b"PING").unwrap();
        assert_eq!(event, SensorEvent::Unknown);
    }

    #[test]
    fn test_decode_binary_frame() {
        // dx=300, dy=-40, reserved byte ignored
        let mut frame = Vec::new();
        frame.extend_from_slice(&300i16.to_le_bytes());
        frame.extend_from_slice(&(-40i16).to_le_bytes());
        frame.push(0x7f);

        let config = DecoderConfig {
            protocol: LinkProtocol::Binary,
            ..DecoderConfig::default()
        };
        let event = Decoder::new(config).decode(&frame).unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 300, dy: -40 });
    }

    #[test]
    fn test_binary_frame_deadzone() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&1i16.to_le_bytes());
        frame.extend_from_slice(&(-1i16).to_le_bytes());
        frame.push(0);

        let event = decoder().decode_frame(&frame).unwrap();
        assert_eq!(event, SensorEvent::Move { dx: 0, dy: 0 });
    }

    #[test]
    fn test_short_binary_frame_is_malformed() {
        let err = decoder().decode_frame(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
        assert!(err.to_string().contains("3 bytes"));
    }

    #[test]
    fn test_decode_respects_configured_protocol() {
        let text = Decoder::new(DecoderConfig::default());
        assert_eq!(
            text.decode(b"5,5").unwrap(),
            SensorEvent::Move { dx: 5, dy: 5 }
        );

        let binary = Decoder::new(DecoderConfig {
            protocol: LinkProtocol::Binary,
            ..DecoderConfig::default()
        });
        // A 3-byte text line is a short frame under the binary grammar.
        assert!(binary.decode(b"5,5").is_err());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = decoder().decode_line(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_decode_error_converts_to_headway_error() {
        let err: HeadwayError = DecodeError::Malformed("bad".into()).into();
        assert!(matches!(err, HeadwayError::Decode(_)));
        assert!(err.to_string().contains("bad"));
    }
}
