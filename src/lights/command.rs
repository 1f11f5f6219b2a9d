//! Device-level commands and their parameter validation.

use std::fmt;

use serde::Deserialize;

use crate::registry::Rgb;

pub const BRIGHTNESS_MIN: i64 = 0;
pub const BRIGHTNESS_MAX: i64 = 100;
pub const KELVIN_MIN: i64 = 2000;
pub const KELVIN_MAX: i64 = 9000;
const CHANNEL_MAX: i64 = 255;

/// Preset colours exposed as their own routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Red,
    Yellow,
    Orange,
    DarkRed,
}

impl NamedColor {
    pub const ALL: [NamedColor; 4] = [Self::Red, Self::Yellow, Self::Orange, Self::DarkRed];

    pub fn rgb(self) -> Rgb {
        match self {
            Self::Red => Rgb::new(255, 0, 0),
            Self::Yellow => Rgb::new(255, 255, 0),
            Self::Orange => Rgb::new(139, 64, 0),
            Self::DarkRed => Rgb::new(255, 11, 0),
        }
    }

    /// Name used in routes and confirmation messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::DarkRed => "dark-red",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// One logical operation to apply to every device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Power(bool),
    /// `label` is what the confirmation message reports ("red", "rgb", ...).
    Color { rgb: Rgb, label: &'static str },
    Brightness(u8),
    ColorTemperature(u16),
}

impl Command {
    pub fn named_color(color: NamedColor) -> Self {
        Self::Color {
            rgb: color.rgb(),
            label: color.name(),
        }
    }

    /// Operation name used in logs, metrics and aggregate error messages.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Power(true) => "turn_on",
            Self::Power(false) => "turn_off",
            Self::Color { .. } => "set_color",
            Self::Brightness(_) => "set_brightness",
            Self::ColorTemperature(_) => "set_color_temp",
        }
    }

    /// Confirmation returned to the caller when every device succeeded.
    pub fn success_message(&self) -> String {
        match self {
            Self::Power(true) => "lights turned on".to_string(),
            Self::Power(false) => "lights turned off".to_string(),
            Self::Color { label, .. } => format!("lights set to {label}"),
            Self::Brightness(_) => "brightness set".to_string(),
            Self::ColorTemperature(_) => "color temperature set".to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power(on) => write!(f, "power({})", if *on { "on" } else { "off" }),
            Self::Color { rgb, .. } => write!(f, "{rgb}"),
            Self::Brightness(b) => write!(f, "brightness({b})"),
            Self::ColorTemperature(k) => write!(f, "{k}K"),
        }
    }
}

/// A parameter that fell outside its documented range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameter {
    #[error("RGB values must be between 0 and 255")]
    Rgb,

    #[error("Brightness must be between 0 and 100")]
    Brightness,

    #[error("Color temperature must be between 2000K and 9000K")]
    ColorTemperature,
}

/// Body of `POST /lights/rgb`. Fields are wide so out-of-range values
/// parse and are rejected by validation rather than by the decoder.
/// Absent fields decode as zero.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RgbRequest {
    pub r: i64,
    pub g: i64,
    pub b: i64,
}

impl RgbRequest {
    pub fn validate(&self) -> Result<Command, InvalidParameter> {
        let channel = |v: i64| -> Result<u8, InvalidParameter> {
            if (0..=CHANNEL_MAX).contains(&v) {
                u8::try_from(v).map_err(|_| InvalidParameter::Rgb)
            } else {
                Err(InvalidParameter::Rgb)
            }
        };
        Ok(Command::Color {
            rgb: Rgb::new(channel(self.r)?, channel(self.g)?, channel(self.b)?),
            label: "rgb",
        })
    }
}

/// Body of `POST /lights/brightness`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrightnessRequest {
    pub brightness: i64,
}

impl BrightnessRequest {
    pub fn validate(&self) -> Result<Command, InvalidParameter> {
        if !(BRIGHTNESS_MIN..=BRIGHTNESS_MAX).contains(&self.brightness) {
            return Err(InvalidParameter::Brightness);
        }
        u8::try_from(self.brightness)
            .map(Command::Brightness)
            .map_err(|_| InvalidParameter::Brightness)
    }
}

/// Body of `POST /lights/colortemp`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorTemperatureRequest {
    pub temperature: i64,
}

impl ColorTemperatureRequest {
    pub fn validate(&self) -> Result<Command, InvalidParameter> {
        if !(KELVIN_MIN..=KELVIN_MAX).contains(&self.temperature) {
            return Err(InvalidParameter::ColorTemperature);
        }
        u16::try_from(self.temperature)
            .map(Command::ColorTemperature)
            .map_err(|_| InvalidParameter::ColorTemperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_bounds() {
        let ok = RgbRequest { r: 0, g: 128, b: 255 }.validate().unwrap();
        assert_eq!(
            ok,
            Command::Color {
                rgb: Rgb::new(0, 128, 255),
                label: "rgb"
            }
        );

        for (r, g, b) in [(256, 0, 0), (0, -1, 0), (0, 0, 1000)] {
            assert_eq!(
                RgbRequest { r, g, b }.validate(),
                Err(InvalidParameter::Rgb)
            );
        }
    }

    #[test]
    fn test_brightness_bounds() {
        assert_eq!(
            BrightnessRequest { brightness: 0 }.validate(),
            Ok(Command::Brightness(0))
        );
        assert_eq!(
            BrightnessRequest { brightness: 100 }.validate(),
            Ok(Command::Brightness(100))
        );
        assert!(BrightnessRequest { brightness: 101 }.validate().is_err());
        assert!(BrightnessRequest { brightness: -1 }.validate().is_err());
    }

    #[test]
    fn test_color_temperature_bounds() {
        assert!(ColorTemperatureRequest { temperature: 2000 }.validate().is_ok());
        assert!(ColorTemperatureRequest { temperature: 9000 }.validate().is_ok());
        assert_eq!(
            ColorTemperatureRequest { temperature: 1999 }.validate(),
            Err(InvalidParameter::ColorTemperature)
        );
        assert!(ColorTemperatureRequest { temperature: 9001 }.validate().is_err());
    }

    #[test]
    fn test_absent_fields_default_to_zero() {
        let rgb: RgbRequest = serde_json::from_str(r#"{"r":9}"#).unwrap();
        assert_eq!((rgb.r, rgb.g, rgb.b), (9, 0, 0));

        let brightness: BrightnessRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(brightness.validate(), Ok(Command::Brightness(0)));

        let temperature: ColorTemperatureRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(temperature.validate(), Err(InvalidParameter::ColorTemperature));
    }

    #[test]
    fn test_messages() {
        assert_eq!(Command::Power(true).success_message(), "lights turned on");
        assert_eq!(
            Command::named_color(NamedColor::DarkRed).success_message(),
            "lights set to dark-red"
        );
        assert_eq!(Command::Brightness(5).operation(), "set_brightness");
        assert_eq!(NamedColor::from_name("orange"), Some(NamedColor::Orange));
        assert_eq!(NamedColor::from_name("blue"), None);
    }
}
