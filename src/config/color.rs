use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::{Rgba8, unit_to_u8},
    error::{SleepGridError, SleepGridResult},
};

/// A color as written in configuration.
///
/// Accepts `"#RRGGBB"`, `"#RRGGBBAA"`, an `{r, g, b, a?}` object or an `[r, g, b, a?]` array of
/// `0..=1` floats. Serializes back to hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDef(pub Rgba8);

impl ColorDef {
    /// Parse a hex string.
    pub fn hex(s: &str) -> SleepGridResult<Self> {
        parse_hex(s).map(Self).map_err(SleepGridError::validation)
    }

    /// The straight-alpha color.
    pub fn rgba8(self) -> Rgba8 {
        self.0
    }
}

impl From<Rgba8> for ColorDef {
    fn from(c: Rgba8) -> Self {
        Self(c)
    }
}

impl Serialize for ColorDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let c = self.0;
        let s = if c.a == 255 {
            c.to_hex_rgb()
        } else {
            format!("{}{:02X}", c.to_hex_rgb(), c.a)
        };
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Obj {
                r: f32,
                g: f32,
                b: f32,
                #[serde(default = "one")]
                a: f32,
            },
            Arr(Vec<f32>),
        }

        fn one() -> f32 {
            1.0
        }

        let unit = |r: f32, g: f32, b: f32, a: f32| {
            Self(Rgba8::new(unit_to_u8(r), unit_to_u8(g), unit_to_u8(b), unit_to_u8(a)))
        };

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map(Self).map_err(serde::de::Error::custom),
            Repr::Obj { r, g, b, a } => Ok(unit(r, g, b, a)),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(unit(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(unit(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

/// Parse `#RRGGBB` / `#RRGGBBAA` (the `#` is optional, case-insensitive).
pub fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let digits = s.strip_prefix('#').unwrap_or(s);

    let byte = |i: usize| -> Result<u8, String> {
        let pair = digits
            .get(i..i + 2)
            .ok_or_else(|| format!("invalid hex color \"{s}\""))?;
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\" in \"{s}\""))
    };

    match digits.len() {
        6 => Ok(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Ok(Rgba8::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => Err(format!(
            "hex color must be #RRGGBB or #RRGGBBAA, got \"{s}\""
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/color.rs"]
mod tests;
