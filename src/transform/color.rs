//! Color tooling: sampled-pixel formatting, WCAG contrast checking,
//! and HSL-based palette generation.

use std::fmt;

/// A sampled sRGB pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    pub fn css_rgba(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, alpha)
    }

    /// WCAG relative luminance.
    pub fn luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

/// The clipboard payload for a single picked color: hex, rgb(), and
/// rgba() on separate lines.
pub fn format_color(color: Rgb, alpha: f64) -> String {
    format!(
        "{}\n{}\n{}",
        color.hex(),
        color.css_rgb(),
        color.css_rgba(alpha)
    )
}

/// WCAG contrast verdicts at the four standard thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastResult {
    /// Ratio in [1, 21], rounded to two decimals.
    pub ratio: f64,
    pub aa: bool,
    pub aa_large: bool,
    pub aaa: bool,
    pub aaa_large: bool,
}

/// Contrast ratio between two colors. Symmetric in its arguments.
pub fn contrast(a: Rgb, b: Rgb) -> ContrastResult {
    let la = a.luminance();
    let lb = b.luminance();
    let ratio = (la.max(lb) + 0.05) / (la.min(lb) + 0.05);
    let ratio = (ratio * 100.0).round() / 100.0;
    ContrastResult {
        ratio,
        aa: ratio >= 4.5,
        aa_large: ratio >= 3.0,
        aaa: ratio >= 7.0,
        aaa_large: ratio >= 4.5,
    }
}

fn verdict(pass: bool) -> &'static str {
    if pass { "pass" } else { "fail" }
}

/// The clipboard payload for a foreground/background contrast check.
pub fn format_contrast(result: &ContrastResult, fg: Rgb, bg: Rgb) -> String {
    format!(
        "Contrast Ratio: {}:1\n\n\
         WCAG Compliance:\n\
         AA: {}\n\
         AA Large: {}\n\
         AAA: {}\n\
         AAA Large: {}\n\n\
         Colors:\n\
         Foreground: {}\n\
         Background: {}",
        result.ratio,
        verdict(result.aa),
        verdict(result.aa_large),
        verdict(result.aaa),
        verdict(result.aaa_large),
        fg.hex(),
        bg.hex()
    )
}

/// Hue/saturation/lightness, with h in degrees and s, l in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = rgb.r as f64 / 255.0;
        let g = rgb.g as f64 / 255.0;
        let b = rgb.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if (max - min).abs() < f64::EPSILON {
            return Hsl {
                h: 0.0,
                s: 0.0,
                l: l * 100.0,
            };
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if (max - r).abs() < f64::EPSILON {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl {
            h: h * 60.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }
}

impl From<Hsl> for Rgb {
    fn from(hsl: Hsl) -> Self {
        let h = (hsl.h.rem_euclid(360.0)) / 360.0;
        let s = (hsl.s / 100.0).clamp(0.0, 1.0);
        let l = (hsl.l / 100.0).clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;
        let (r, g, b) = match (h * 6.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Rgb {
            r: ((r + m) * 255.0).round() as u8,
            g: ((g + m) * 255.0).round() as u8,
            b: ((b + m) * 255.0).round() as u8,
        }
    }
}

/// Palette derived from one base color.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub base: Rgb,
    /// Four lighter steps (+10% lightness each).
    pub tints: Vec<Rgb>,
    /// Four darker steps (-10% lightness each).
    pub shades: Vec<Rgb>,
    /// Hue rotated by 180 degrees.
    pub complementary: Rgb,
    /// Hue rotated by +/-30 degrees.
    pub analogous: [Rgb; 2],
}

pub fn generate_palette(base: Rgb) -> Palette {
    let hsl = Hsl::from(base);
    let tints = (1..=4)
        .map(|i| {
            Rgb::from(Hsl {
                l: (hsl.l + i as f64 * 10.0).min(100.0),
                ..hsl
            })
        })
        .collect();
    let shades = (1..=4)
        .map(|i| {
            Rgb::from(Hsl {
                l: (hsl.l - i as f64 * 10.0).max(0.0),
                ..hsl
            })
        })
        .collect();
    Palette {
        base,
        tints,
        shades,
        complementary: Rgb::from(Hsl {
            h: (hsl.h + 180.0) % 360.0,
            ..hsl
        }),
        analogous: [
            Rgb::from(Hsl {
                h: (hsl.h + 30.0) % 360.0,
                ..hsl
            }),
            Rgb::from(Hsl {
                h: (hsl.h + 330.0) % 360.0,
                ..hsl
            }),
        ],
    }
}

/// The clipboard payload for a generated palette.
pub fn format_palette(palette: &Palette) -> String {
    let join = |colors: &[Rgb]| {
        colors
            .iter()
            .map(|c| c.hex())
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!(
        "Color Palette for {}:\n\n\
         Base: {}\n\n\
         Tints (Lighter):\n{}\n\n\
         Shades (Darker):\n{}\n\n\
         Complementary: {}\n\n\
         Analogous:\n{}",
        palette.base.hex(),
        palette.base.hex(),
        join(&palette.tints),
        join(&palette.shades),
        palette.complementary.hex(),
        join(&palette.analogous)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_and_format_round_trip() {
        let c = Rgb::from_hex("#2dd4bf").unwrap();
        assert_eq!(c, Rgb::new(0x2d, 0xd4, 0xbf));
        assert_eq!(c.hex(), "#2dd4bf");
        assert_eq!(Rgb::from_hex("2dd4bf").unwrap(), c);
        assert!(Rgb::from_hex("#xyz").is_none());
        assert!(Rgb::from_hex("#fff").is_none());
    }

    #[test]
    fn color_payload_has_three_notations() {
        let payload = format_color(Rgb::new(255, 0, 0), 1.0);
        assert_eq!(payload, "#ff0000\nrgb(255, 0, 0)\nrgba(255, 0, 0, 1.00)");
    }

    #[test]
    fn contrast_is_symmetric_and_bounded() {
        let pairs = [
            (Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)),
            (Rgb::new(45, 212, 191), Rgb::new(22, 24, 40)),
            (Rgb::new(128, 128, 128), Rgb::new(128, 128, 128)),
        ];
        for (a, b) in pairs {
            let forward = contrast(a, b);
            let backward = contrast(b, a);
            assert_eq!(forward.ratio, backward.ratio);
            assert!(forward.ratio >= 1.0 && forward.ratio <= 21.0);
        }
    }

    #[test]
    fn black_on_white_hits_maximum_ratio() {
        let result = contrast(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255));
        assert_eq!(result.ratio, 21.0);
        assert!(result.aa && result.aa_large && result.aaa && result.aaa_large);
    }

    #[test]
    fn pass_thresholds_imply_minimum_ratios() {
        let result = contrast(Rgb::new(118, 118, 118), Rgb::new(255, 255, 255));
        if result.aa {
            assert!(result.ratio >= 4.5);
        }
        if result.aaa {
            assert!(result.ratio >= 7.0);
        }
        let same = contrast(Rgb::new(10, 10, 10), Rgb::new(10, 10, 10));
        assert!(!same.aa_large);
        assert_eq!(same.ratio, 1.0);
    }

    #[test]
    fn hsl_round_trips_primaries() {
        for c in [
            Rgb::new(255, 0, 0),
            Rgb::new(0, 255, 0),
            Rgb::new(0, 0, 255),
            Rgb::new(255, 255, 255),
            Rgb::new(0, 0, 0),
        ] {
            assert_eq!(Rgb::from(Hsl::from(c)), c);
        }
    }

    #[test]
    fn palette_has_expected_structure() {
        let palette = generate_palette(Rgb::from_hex("#3366cc").unwrap());
        assert_eq!(palette.tints.len(), 4);
        assert_eq!(palette.shades.len(), 4);
        // Tints get lighter, shades darker.
        assert!(Hsl::from(palette.tints[0]).l > Hsl::from(palette.base).l);
        assert!(Hsl::from(palette.shades[0]).l < Hsl::from(palette.base).l);
        let base_h = Hsl::from(palette.base).h;
        let comp_h = Hsl::from(palette.complementary).h;
        assert!(((comp_h - base_h).rem_euclid(360.0) - 180.0).abs() < 2.0);
    }
}
