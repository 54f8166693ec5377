use crate::core::data::colour::Colour;
use crate::core::fractals::mandelbrot::errors::MandelbrotError;
use std::str::FromStr;

/// How a normalised iteration count `t ∈ [0, 1]` becomes a colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourScheme {
    #[default]
    Grayscale,
    /// Grayscale of `sqrt(t)`; lifts detail near the escape boundary.
    GrayscaleSquared,
    /// Hue sweep `t · 360°` at full saturation and value.
    Rgb,
    /// Hue sweep of `sqrt(t)`.
    RgbSquared,
}

impl ColourScheme {
    pub const ALL: &'static [Self] = &[
        Self::Grayscale,
        Self::GrayscaleSquared,
        Self::Rgb,
        Self::RgbSquared,
    ];

    /// Wire code of the scheme in `start`/`request` messages.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Grayscale => 0,
            Self::GrayscaleSquared => 1,
            Self::Rgb => 2,
            Self::RgbSquared => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::GrayscaleSquared => "grayscale-squared",
            Self::Rgb => "rgb",
            Self::RgbSquared => "rgb-squared",
        }
    }

    #[must_use]
    pub fn colour(self, t: f64) -> Colour {
        match self {
            Self::Grayscale => grey(t),
            Self::GrayscaleSquared => grey(t.sqrt()),
            Self::Rgb => hsv_to_rgb(t * 360.0, 1.0, 1.0),
            Self::RgbSquared => hsv_to_rgb(t.sqrt() * 360.0, 1.0, 1.0),
        }
    }
}

impl TryFrom<i32> for ColourScheme {
    type Error = MandelbrotError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.code() == code)
            .ok_or_else(|| MandelbrotError::UnknownColourScheme(code.to_string()))
    }
}

impl FromStr for ColourScheme {
    type Err = MandelbrotError;

    /// Accepts either the scheme name or its numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i32>() {
            return Self::try_from(code);
        }

        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| MandelbrotError::UnknownColourScheme(s.to_string()))
    }
}

impl std::fmt::Display for ColourScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `n / current_iteration` clamped to `[0, 1]`. Nothing has run yet when
/// `current_iteration` is zero, which maps to `0`.
#[must_use]
pub fn normalised_iteration(iterations: u64, current_iteration: u64) -> f64 {
    if current_iteration == 0 {
        return 0.0;
    }

    (iterations as f64 / current_iteration as f64).clamp(0.0, 1.0)
}

fn channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn grey(t: f64) -> Colour {
    Colour::grey(channel(t))
}

/// Six-sector HSV → RGB. `hue` is in degrees and wraps at 360.
#[must_use]
pub fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Colour {
    let h = hue.rem_euclid(360.0) / 60.0;
    let sector = h.floor();
    let f = h - sector;

    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));

    let (r, g, b) = match sector as u8 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };

    Colour {
        r: channel(r),
        g: channel(g),
        b: channel(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_boundaries() {
        assert_eq!(ColourScheme::Grayscale.colour(0.0).to_rgba(), [0, 0, 0, 255]);
        assert_eq!(
            ColourScheme::Grayscale.colour(1.0).to_rgba(),
            [255, 255, 255, 255]
        );
    }

    #[test]
    fn test_grayscale_rounds_to_nearest() {
        // 0.5 * 255 = 127.5 rounds away from zero
        assert_eq!(ColourScheme::Grayscale.colour(0.5), Colour::grey(128));
        assert_eq!(ColourScheme::Grayscale.colour(0.1), Colour::grey(26));
    }

    #[test]
    fn test_grayscale_squared_brightens() {
        assert_eq!(ColourScheme::GrayscaleSquared.colour(0.25), Colour::grey(128));
        assert_eq!(ColourScheme::GrayscaleSquared.colour(0.0), Colour::BLACK);
        assert_eq!(ColourScheme::GrayscaleSquared.colour(1.0), Colour::WHITE);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0).to_rgba(), [255, 0, 0, 255]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0).to_rgba(), [0, 255, 0, 255]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0).to_rgba(), [0, 0, 255, 255]);
    }

    #[test]
    fn test_hsv_secondaries_and_wrap() {
        assert_eq!(hsv_to_rgb(60.0, 1.0, 1.0), Colour { r: 255, g: 255, b: 0 });
        assert_eq!(hsv_to_rgb(180.0, 1.0, 1.0), Colour { r: 0, g: 255, b: 255 });
        assert_eq!(hsv_to_rgb(300.0, 1.0, 1.0), Colour { r: 255, g: 0, b: 255 });
        assert_eq!(hsv_to_rgb(360.0, 1.0, 1.0), hsv_to_rgb(0.0, 1.0, 1.0));
    }

    #[test]
    fn test_hsv_zero_saturation_is_grey() {
        assert_eq!(hsv_to_rgb(200.0, 0.0, 0.5), Colour::grey(128));
    }

    #[test]
    fn test_rgb_scheme_hue_follows_t() {
        assert_eq!(ColourScheme::Rgb.colour(0.0).to_rgba(), [255, 0, 0, 255]);
        assert_eq!(ColourScheme::Rgb.colour(1.0 / 3.0).to_rgba(), [0, 255, 0, 255]);
        assert_eq!(ColourScheme::Rgb.colour(2.0 / 3.0).to_rgba(), [0, 0, 255, 255]);
        assert_eq!(ColourScheme::Rgb.colour(1.0).to_rgba(), [255, 0, 0, 255]);
    }

    #[test]
    fn test_rgb_squared_uses_sqrt_of_t() {
        assert_eq!(
            ColourScheme::RgbSquared.colour(0.25),
            ColourScheme::Rgb.colour(0.5)
        );
    }

    #[test]
    fn test_normalised_iteration() {
        assert_eq!(normalised_iteration(0, 0), 0.0);
        assert_eq!(normalised_iteration(5, 0), 0.0);
        assert_eq!(normalised_iteration(5, 10), 0.5);
        assert_eq!(normalised_iteration(10, 10), 1.0);
        assert_eq!(normalised_iteration(20, 10), 1.0);
    }

    #[test]
    fn test_codes_round_trip() {
        for &scheme in ColourScheme::ALL {
            assert_eq!(ColourScheme::try_from(scheme.code()), Ok(scheme));
        }
        assert_eq!(
            ColourScheme::try_from(4),
            Err(MandelbrotError::UnknownColourScheme("4".to_string()))
        );
    }

    #[test]
    fn test_from_str_accepts_names_and_codes() {
        assert_eq!("rgb-squared".parse::<ColourScheme>(), Ok(ColourScheme::RgbSquared));
        assert_eq!("Grayscale".parse::<ColourScheme>(), Ok(ColourScheme::Grayscale));
        assert_eq!("2".parse::<ColourScheme>(), Ok(ColourScheme::Rgb));
        assert!("sepia".parse::<ColourScheme>().is_err());
    }

    #[test]
    fn test_names_are_unique() {
        let names: Vec<&str> = ColourScheme::ALL.iter().map(|s| s.name()).collect();
        for (i, name) in names.iter().enumerate() {
            for (j, other) in names.iter().enumerate() {
                if i != j {
                    assert_ne!(name, other, "Duplicate scheme name: {}", name);
                }
            }
        }
    }
}
