//! CSS component values: lengths, percentages and colours.
//!
//! [CSS Values and Units Level 3](https://www.w3.org/TR/css-values-3/)
//!
//! Absolute units use a reference resolution of 90 pixels per inch.

use std::fmt;

use serde::Serialize;

/// Pixels per inch used to convert absolute units.
pub const PX_PER_IN: f32 = 90.0;

/// Width of the `ex` unit relative to the font size.
pub const EX_RATIO: f32 = 0.6;

/// [§ 5 Distance Units](https://www.w3.org/TR/css-values-3/#lengths)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    /// "Equal to the computed value of the font-size property of the element
    /// on which it is used."
    Em,
    /// "Equal to the used x-height of the first available font."
    Ex,
    /// Pixels.
    Px,
    /// Inches.
    In,
    /// Centimetres.
    Cm,
    /// Millimetres.
    Mm,
    /// Points, 1/72 inch.
    Pt,
    /// Picas, 12 points.
    Pc,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let unit = match suffix.to_ascii_lowercase().as_str() {
            "em" => Self::Em,
            "ex" => Self::Ex,
            "px" => Self::Px,
            "in" => Self::In,
            "cm" => Self::Cm,
            "mm" => Self::Mm,
            "pt" => Self::Pt,
            "pc" => Self::Pc,
            _ => return None,
        };
        Some(unit)
    }
}

/// A dimension: a number with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Length {
    /// The numeric part.
    pub value: f32,
    /// The unit.
    pub unit: Unit,
}

impl Length {
    /// A length in pixels.
    #[must_use]
    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Px,
        }
    }

    /// A length in points.
    #[must_use]
    pub const fn pt(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Pt,
        }
    }

    /// Convert to pixels; `font_size` is the px size `em` and `ex` refer to.
    #[must_use]
    pub fn to_px(self, font_size: f32) -> f32 {
        let scale = match self.unit {
            Unit::Em => font_size,
            Unit::Ex => font_size * EX_RATIO,
            Unit::Px => 1.0,
            Unit::In => PX_PER_IN,
            Unit::Cm => PX_PER_IN / 2.54,
            Unit::Mm => PX_PER_IN / 25.4,
            Unit::Pt => PX_PER_IN / 72.0,
            Unit::Pc => PX_PER_IN / 6.0,
        };
        self.value * scale
    }

    /// Parse `12px`, `1.5em`, `0`.
    ///
    /// "After a zero length, the unit identifier is optional."
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (value, suffix) = split_number(text.trim())?;
        if suffix.is_empty() {
            return (value.abs() < f32::EPSILON).then_some(Self::px(0.0));
        }
        Some(Self {
            value,
            unit: Unit::from_suffix(suffix)?,
        })
    }
}

/// Parse `50%` into `50.0`.
#[must_use]
pub fn parse_percentage(text: &str) -> Option<f32> {
    let (value, suffix) = split_number(text.trim())?;
    (suffix == "%").then_some(value)
}

/// Parse a plain number.
#[must_use]
pub fn parse_number(text: &str) -> Option<f32> {
    let (value, suffix) = split_number(text.trim())?;
    suffix.is_empty().then_some(value)
}

/// Split a leading CSS number from the rest of a token.
fn split_number(text: &str) -> Option<(f32, &str)> {
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map_or(text.len(), |(i, _)| i);
    let value: f32 = text[..end].parse().ok()?;
    value.is_finite().then_some((value, &text[end..]))
}

/// [CSS Color Level 3](https://www.w3.org/TR/css-color-3/)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Colour {
    /// "Fully transparent."
    Transparent,
    /// An opaque sRGB colour.
    Rgb {
        /// Red channel.
        r: u8,
        /// Green channel.
        g: u8,
        /// Blue channel.
        b: u8,
    },
}

impl Colour {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// An opaque colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgb(r%, g%, b%)`,
    /// `transparent` or one of the sixteen basic colour keywords.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = text.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(args);
        }
        named_colour(&lower)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transparent => f.write_str("transparent"),
            Self::Rgb { r, g, b } => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// [§ 4.2.1 RGB color values](https://www.w3.org/TR/css-color-3/#rgb-color)
///
/// "The three-digit RGB notation (#rgb) is converted into six-digit form
/// (#rrggbb) by replicating digits, not by adding zeros."
fn parse_hex(hex: &str) -> Option<Colour> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let digits: Vec<u8> = hex
                .chars()
                .map(|c| channel(&c.to_string()).map(|v| v * 17))
                .collect::<Option<_>>()?;
            Some(Colour::rgb(digits[0], digits[1], digits[2]))
        }
        6 => Some(Colour::rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        _ => None,
    }
}

/// "The integer value 255 corresponds to 100%"; values outside the device
/// gamut are clipped.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_function(args: &str) -> Option<Colour> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip(&parts) {
        let value = if let Some(percent) = parse_percentage(part) {
            percent * 2.55
        } else {
            parse_number(part)?
        };
        *slot = value.round().clamp(0.0, 255.0) as u8;
    }
    Some(Colour::rgb(channels[0], channels[1], channels[2]))
}

/// [§ 4.1 Basic color keywords](https://www.w3.org/TR/css-color-3/#html4)
fn named_colour(name: &str) -> Option<Colour> {
    let colour = match name {
        "transparent" => Colour::Transparent,
        "black" => Colour::rgb(0x00, 0x00, 0x00),
        "silver" => Colour::rgb(0xc0, 0xc0, 0xc0),
        "gray" | "grey" => Colour::rgb(0x80, 0x80, 0x80),
        "white" => Colour::rgb(0xff, 0xff, 0xff),
        "maroon" => Colour::rgb(0x80, 0x00, 0x00),
        "red" => Colour::rgb(0xff, 0x00, 0x00),
        "purple" => Colour::rgb(0x80, 0x00, 0x80),
        "fuchsia" => Colour::rgb(0xff, 0x00, 0xff),
        "green" => Colour::rgb(0x00, 0x80, 0x00),
        "lime" => Colour::rgb(0x00, 0xff, 0x00),
        "olive" => Colour::rgb(0x80, 0x80, 0x00),
        "yellow" => Colour::rgb(0xff, 0xff, 0x00),
        "navy" => Colour::rgb(0x00, 0x00, 0x80),
        "blue" => Colour::rgb(0x00, 0x00, 0xff),
        "teal" => Colour::rgb(0x00, 0x80, 0x80),
        "aqua" => Colour::rgb(0x00, 0xff, 0xff),
        _ => return None,
    };
    Some(colour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_units_to_px() {
        assert!((Length::parse("2em").unwrap().to_px(10.0) - 20.0).abs() < f32::EPSILON);
        assert!((Length::parse("1ex").unwrap().to_px(10.0) - 6.0).abs() < 1e-4);
        assert!((Length::parse("1in").unwrap().to_px(16.0) - 90.0).abs() < f32::EPSILON);
        assert!((Length::parse("12pt").unwrap().to_px(16.0) - 15.0).abs() < 1e-4);
        assert!((Length::parse("1pc").unwrap().to_px(16.0) - 15.0).abs() < 1e-4);
        assert!((Length::parse("10mm").unwrap().to_px(16.0) - Length::parse("1cm").unwrap().to_px(16.0)).abs() < 1e-3);
    }

    #[test]
    fn test_length_rejects_unitless_nonzero() {
        assert_eq!(Length::parse("0"), Some(Length::px(0.0)));
        assert_eq!(Length::parse("12"), None);
        assert_eq!(Length::parse("12furlongs"), None);
        assert_eq!(Length::parse("px"), None);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(parse_percentage("50%"), Some(50.0));
        assert_eq!(parse_percentage("50px"), None);
    }

    #[test]
    fn test_colour_forms() {
        assert_eq!(Colour::parse("#f00"), Some(Colour::rgb(255, 0, 0)));
        assert_eq!(Colour::parse("#00FF7f"), Some(Colour::rgb(0, 255, 127)));
        assert_eq!(Colour::parse("rgb(1, 2, 3)"), Some(Colour::rgb(1, 2, 3)));
        assert_eq!(Colour::parse("RGB(100%, 0%, 50%)"), Some(Colour::rgb(255, 0, 128)));
        assert_eq!(Colour::parse("Navy"), Some(Colour::rgb(0, 0, 0x80)));
        assert_eq!(Colour::parse("transparent"), Some(Colour::Transparent));
        assert_eq!(Colour::parse("#12"), None);
        assert_eq!(Colour::parse("chartreuse-ish"), None);
    }

    #[test]
    fn test_colour_display() {
        assert_eq!(Colour::rgb(255, 0, 16).to_string(), "#ff0010");
    }
}
