//! Hex color parsing for lighting commands.
//!
//! Colors are `#RRGGBB` strings (the `#` is optional) as produced by the web
//! UI color pickers.

/// Split a 6-digit hex color into its red, green, and blue channels.
///
/// Accepts `"#FF0000"`, `"FF0000"`, `"#ff0000"`. Callers are expected to pass
/// validated colors; anything else is reported as a [`Color`] error.
///
/// [`Color`]: crate::LiveGcodeError::Color
pub fn hex_to_channels(s: &str) -> crate::error::Result<(u8, u8, u8)> {
    let s = s.trim();
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::LiveGcodeError::Color(format!(
            "Invalid color: {s} (use #RRGGBB)"
        )));
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(crate::LiveGcodeError::Color(format!("Invalid hex color: {s}")));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| crate::LiveGcodeError::Color(format!("Invalid hex color: {s}")))
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Whether `s` is a color [`hex_to_channels`] accepts.
pub fn is_hex_color(s: &str) -> bool {
    hex_to_channels(s).is_ok()
}

/// Format channels as `#RRGGBB`.
pub fn format_channels((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_red_with_hash() {
        assert_eq!(hex_to_channels("#FF0000").unwrap(), (255, 0, 0));
    }

    #[test]
    fn parse_without_hash() {
        assert_eq!(hex_to_channels("00FF00").unwrap(), (0, 255, 0));
        assert_eq!(hex_to_channels("ABCDEF").unwrap(), (0xAB, 0xCD, 0xEF));
    }

    #[test]
    fn parse_lowercase_and_whitespace() {
        assert_eq!(hex_to_channels("  #ff8000 ").unwrap(), (255, 128, 0));
    }

    #[test]
    fn parse_invalid_short() {
        assert!(hex_to_channels("#FFF").is_err());
    }

    #[test]
    fn parse_invalid_long() {
        assert!(hex_to_channels("#FF000000").is_err());
    }

    #[test]
    fn parse_invalid_hex_chars() {
        assert!(hex_to_channels("#GGHHII").is_err());
        assert!(!is_hex_color("#GGHHII"));
    }

    #[test]
    fn parse_rejects_sign_prefix() {
        // from_str_radix would accept "+F" per channel
        assert!(hex_to_channels("+F+F+F").is_err());
    }

    #[test]
    fn parse_rejects_multibyte() {
        assert!(hex_to_channels("#ééé").is_err());
    }

    #[test]
    fn format_round_trip() {
        assert_eq!(format_channels((0xAB, 0x12, 0xCD)), "#AB12CD");
        assert_eq!(
            hex_to_channels(&format_channels((1, 2, 3))).unwrap(),
            (1, 2, 3)
        );
    }
}
