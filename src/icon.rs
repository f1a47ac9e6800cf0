use std::{fs, io::Cursor, path::Path, str::FromStr};

use anyhow::{Context, Result, bail};
use image::{ImageFormat, Rgb, RgbImage};
use log::debug;
use serde::Deserialize;

use crate::font::BitmapFont;
use crate::icon_data::{ICON_HEIGHT, ICON_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255]);
    // #3b82f6
    pub const BLUE: Color = Color([0x3b, 0x82, 0xf6]);
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(format!("invalid hex color: {s}"));
            }
            let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
            let rgb = match hex.len() {
                6 => hex.get(0..2).and_then(channel).zip(hex.get(2..4).and_then(channel)).zip(
                    hex.get(4..6).and_then(channel),
                ),
                // #rgb => #rrggbb
                3 => {
                    let short = |i: usize| {
                        hex.get(i..i + 1).and_then(channel).map(|v| v * 17)
                    };
                    short(0).zip(short(1)).zip(short(2))
                }
                _ => None,
            };
            return rgb
                .map(|((r, g), b)| Color([r, g, b]))
                .ok_or_else(|| format!("invalid hex color: {s}"));
        }

        let rgb = match value.as_str() {
            "white" => [255, 255, 255],
            "black" => [0, 0, 0],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "blue" => [0, 0, 255],
            "yellow" => [255, 255, 0],
            "gray" | "grey" => [128, 128, 128],
            _ => return Err(format!("unknown color: {s}")),
        };
        Ok(Color(rgb))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What the icon looks like. Every field can be overridden from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IconSpec {
    pub background: Color,
    pub square_color: Color,
    /// Distance from each edge to the square; the square covers `inset..=size - inset`.
    pub inset: u32,
    pub label: Option<String>,
    /// Top-left corner of the text line.
    pub label_origin: (i32, i32),
    /// Defaults to the background color.
    pub label_color: Option<Color>,
}

impl Default for IconSpec {
    fn default() -> Self {
        Self {
            background: Color::BLUE,
            square_color: Color::WHITE,
            inset: ICON_WIDTH / 4,
            label: Some("TD".to_string()),
            label_origin: (12, 12),
            label_color: None,
        }
    }
}

impl IconSpec {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read icon spec {}", path.display()))?;
        let spec: IconSpec = serde_json::from_str(&content)
            .with_context(|| format!("Invalid icon spec {}", path.display()))?;

        if spec.inset.saturating_mul(2) > ICON_WIDTH.min(ICON_HEIGHT) {
            bail!("inset {} leaves no room for the square", spec.inset);
        }
        Ok(spec)
    }
}

/// Draws the icon. Without a font the text falls back to the built-in 5x7 glyphs.
pub fn render(spec: &IconSpec, font: Option<&BitmapFont>) -> RgbImage {
    let mut img = RgbImage::from_pixel(ICON_WIDTH, ICON_HEIGHT, Rgb(spec.background.0));

    // 居中的方块, 两端都包含
    let x_end = ICON_WIDTH.saturating_sub(spec.inset).min(ICON_WIDTH - 1);
    let y_end = ICON_HEIGHT.saturating_sub(spec.inset).min(ICON_HEIGHT - 1);
    for y in spec.inset..=y_end {
        for x in spec.inset..=x_end {
            img.put_pixel(x, y, Rgb(spec.square_color.0));
        }
    }

    if let Some(label) = spec.label.as_deref() {
        let color = spec.label_color.unwrap_or(spec.background);
        match font {
            Some(font) => draw_text(&mut img, font, spec.label_origin, label, color),
            None => draw_text(&mut img, &BitmapFont::builtin(), spec.label_origin, label, color),
        }
    }

    img
}

pub fn draw_text(img: &mut RgbImage, font: &BitmapFont, origin: (i32, i32), text: &str, color: Color) {
    // i64 避免超大 label_origin 溢出
    let (width, height) = (i64::from(img.width()), i64::from(img.height()));
    let mut pen_x = i64::from(origin.0);
    let top = i64::from(origin.1);

    for ch in text.chars() {
        let Some(glyph) = font.glyph(ch) else {
            debug!("No glyph for {ch:?}, skipping");
            pen_x += i64::from(font.default_advance);
            continue;
        };

        let glyph_top =
            top + i64::from(font.ascent) - (i64::from(glyph.y_offset) + i64::from(glyph.height));
        for row in 0..glyph.height {
            for col in 0..glyph.width {
                if !glyph.is_set(col, row) {
                    continue;
                }
                let x = pen_x + i64::from(glyph.x_offset) + i64::from(col);
                let y = glyph_top + i64::from(row);
                // 超出画布的像素直接裁掉
                if (0..width).contains(&x) && (0..height).contains(&y) {
                    img.put_pixel(x as u32, y as u32, Rgb(color.0));
                }
            }
        }
        pen_x += i64::from(glyph.advance);
    }
}

pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).context("Failed to encode icon as PNG")?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb<u8> = Rgb([0x3b, 0x82, 0xf6]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn parses_colors() {
        assert_eq!("#3b82f6".parse::<Color>().unwrap(), Color::BLUE);
        assert_eq!("#3B82F6".parse::<Color>().unwrap(), Color::BLUE);
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(" White ".parse::<Color>().unwrap(), Color::WHITE);
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gggggg".parse::<Color>().is_err());
        assert!("#+f+f+f".parse::<Color>().is_err());
        assert!("#+ff".parse::<Color>().is_err());
        assert!("mauve".parse::<Color>().is_err());
    }

    #[test]
    fn default_icon_layout() {
        let img = render(&IconSpec::default(), None);
        assert_eq!(img.dimensions(), (ICON_WIDTH, ICON_HEIGHT));

        assert_eq!(*img.get_pixel(0, 0), BLUE);
        assert_eq!(*img.get_pixel(7, 16), BLUE);
        assert_eq!(*img.get_pixel(8, 8), WHITE);
        assert_eq!(*img.get_pixel(24, 24), WHITE);
        assert_eq!(*img.get_pixel(25, 25), BLUE);
        assert_eq!(*img.get_pixel(31, 31), BLUE);

        // "T": full top bar at y = 12, stem in column 14
        assert!((12..=16).all(|x| *img.get_pixel(x, 12) == BLUE));
        assert_eq!(*img.get_pixel(14, 18), BLUE);
        assert_eq!(*img.get_pixel(12, 18), WHITE);
        // "D" starts at x = 18
        assert_eq!(*img.get_pixel(18, 12), BLUE);
        assert_eq!(*img.get_pixel(21, 12), WHITE);
        assert_eq!(*img.get_pixel(22, 15), BLUE);
    }

    #[test]
    fn label_can_be_disabled() {
        let spec: IconSpec = serde_json::from_str(r#"{ "label": null }"#).unwrap();
        let img = render(&spec, None);
        assert!((8..=24).all(|y| (8..=24).all(|x| *img.get_pixel(x, y) == WHITE)));
    }

    #[test]
    fn partial_spec_keeps_defaults() {
        let spec: IconSpec =
            serde_json::from_str(r##"{ "background": "#000", "label_color": "red" }"##).unwrap();
        assert_eq!(spec.background, Color([0, 0, 0]));
        assert_eq!(spec.label_color, Some(Color([255, 0, 0])));
        assert_eq!(spec.square_color, Color::WHITE);
        assert_eq!(spec.inset, 8);
        assert_eq!(spec.label.as_deref(), Some("TD"));
        assert!(serde_json::from_str::<IconSpec>(r#"{ "background": "nope" }"#).is_err());
    }

    #[test]
    fn text_is_clipped_at_the_edge() {
        let spec = IconSpec { label_origin: (29, 28), ..IconSpec::default() };
        let img = render(&spec, None);
        assert_eq!(*img.get_pixel(31, 28), BLUE);
    }

    #[test]
    fn extreme_label_origin_draws_nothing() {
        let square = render(&IconSpec { label: None, ..IconSpec::default() }, None);
        for origin in [(0, i32::MAX), (i32::MAX, 0), (i32::MIN, i32::MIN), (i32::MAX, i32::MAX)] {
            let spec = IconSpec { label_origin: origin, ..IconSpec::default() };
            assert_eq!(render(&spec, None), square, "origin {origin:?}");
        }

        let spec: IconSpec =
            serde_json::from_str(r#"{ "label_origin": [0, 2147483647] }"#).unwrap();
        assert_eq!(render(&spec, None), square);
    }

    #[test]
    fn encodes_png() {
        let bytes = encode_png(&render(&IconSpec::default(), None)).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }
}
