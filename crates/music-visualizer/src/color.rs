//! CSS-style color strings.
//!
//! Settings carry colors the way the editor shows them: `#RRGGBB`,
//! `#RRGGBBAA`, `#RGB` or `rgba(r, g, b, a)` with a 0..1 alpha.

use ecolor::Color32;

use crate::error::{Result, VisualizerError};

pub fn parse_color(input: &str) -> Result<Color32> {
    let s = input.trim();
    let bad = || VisualizerError::Color(input.to_string());

    if let Some(hex) = s.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(bad)?;
        let pair = |i: usize| digits[i] * 16 + digits[i + 1];
        return match digits.len() {
            3 => Ok(Color32::from_rgb(
                digits[0] * 17,
                digits[1] * 17,
                digits[2] * 17,
            )),
            6 => Ok(Color32::from_rgb(pair(0), pair(2), pair(4))),
            8 => Ok(Color32::from_rgba_unmultiplied(
                pair(0),
                pair(2),
                pair(4),
                pair(6),
            )),
            _ => Err(bad()),
        };
    }

    let (body, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
        (rest, true)
    } else if let Some(rest) = s.strip_prefix("rgb(") {
        (rest, false)
    } else {
        return Err(bad());
    };
    let body = body.strip_suffix(')').ok_or_else(bad)?;
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != if has_alpha { 4 } else { 3 } {
        return Err(bad());
    }
    let channel = |p: &str| -> Result<u8> {
        let v: f32 = p.parse().map_err(|_| bad())?;
        Ok(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = if has_alpha {
        let a: f32 = parts[3].parse().map_err(|_| bad())?;
        (a.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };
    Ok(Color32::from_rgba_unmultiplied(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

/// Opaque colors print as `#rrggbb`, translucent ones as `rgba(..)`.
pub fn format_color(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == 255 {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        let alpha = f32::from(a) / 255.0;
        format!("rgba({r}, {g}, {b}, {alpha:.2})")
    }
}

/// Same color with its alpha scaled by `factor` (0..1).
pub fn with_alpha(color: Color32, factor: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let alpha = (f32::from(a) * factor.clamp(0.0, 1.0)).round() as u8;
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
}

/// `#[serde(with = "crate::color::css")]` for `Color32` fields.
pub mod css {
    use ecolor::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_color(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_color(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_color("#E040FB").unwrap(), Color32::from_rgb(0xE0, 0x40, 0xFB));
        assert_eq!(parse_color("#fff").unwrap(), Color32::WHITE);
        let c = parse_color("#00F5D480").unwrap();
        assert_eq!(c.to_srgba_unmultiplied()[3], 0x80);
    }

    #[test]
    fn parses_rgba_function() {
        let c = parse_color("rgba(224, 64, 251, 0.4)").unwrap();
        assert_eq!(c.to_srgba_unmultiplied()[3], 102);
        assert_eq!(parse_color("rgb(1,2,3)").unwrap(), Color32::from_rgb(1, 2, 3));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_color("magenta").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("rgba(1,2,3)").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }

    #[test]
    fn formats_back_to_css() {
        assert_eq!(format_color(Color32::from_rgb(16, 16, 30)), "#10101e");
        let translucent = Color32::from_rgba_unmultiplied(0, 0, 0, 128);
        assert!(format_color(translucent).starts_with("rgba(0, 0, 0, 0.50"));
    }

    #[test]
    fn scales_alpha() {
        let half = with_alpha(Color32::WHITE, 0.5);
        assert_eq!(half.to_srgba_unmultiplied()[3], 128);
    }
}
