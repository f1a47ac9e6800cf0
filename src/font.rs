use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

#[derive(Debug)]
pub enum FontError {
    NotFound(String),
    ReadError(std::io::Error),
    Malformed { line: usize, reason: String },
}

impl std::fmt::Display for FontError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontError::NotFound(path) => write!(f, "Font file not found: {path}"),
            FontError::ReadError(err) => write!(f, "Failed to read font file: {err}"),
            FontError::Malformed { line, reason } => {
                write!(f, "Malformed BDF font at line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for FontError {}

fn malformed(line: usize, reason: impl Into<String>) -> FontError {
    FontError::Malformed { line, reason: reason.into() }
}

/// A single bitmap glyph. Rows are packed MSB-first, like BDF `BITMAP` data.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    pub x_offset: i32,
    /// Offset of the bottom row above the baseline.
    pub y_offset: i32,
    pub advance: i32,
    rows: Vec<Vec<u8>>,
}

impl Glyph {
    pub fn is_set(&self, col: u32, row: u32) -> bool {
        if col >= self.width {
            return false;
        }
        self.rows
            .get(row as usize)
            .and_then(|bytes| bytes.get((col / 8) as usize))
            .is_some_and(|byte| byte & (0x80 >> (col % 8)) != 0)
    }
}

#[derive(Debug, Clone)]
pub struct BitmapFont {
    pub ascent: i32,
    /// Advance used for characters the font has no glyph for.
    pub default_advance: i32,
    glyphs: HashMap<char, Glyph>,
}

impl BitmapFont {
    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch).or_else(|| self.glyphs.get(&ch.to_ascii_uppercase()))
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// 内置 5x7 点阵字体, 没有可用字体文件时使用
    pub fn builtin() -> Self {
        let glyphs = BUILTIN_5X7
            .iter()
            .map(|(ch, rows)| {
                let glyph = Glyph {
                    width: 5,
                    height: 7,
                    x_offset: 0,
                    y_offset: 0,
                    advance: 6,
                    rows: rows.iter().map(|row| vec![row << 3]).collect(),
                };
                (*ch, glyph)
            })
            .collect();

        Self { ascent: 7, default_advance: 6, glyphs }
    }

    /// Parses the subset of BDF 2.1 needed to draw text.
    pub fn parse_bdf(source: &str) -> Result<Self, FontError> {
        let mut ascent = None;
        let mut bounding_box: Option<[i32; 4]> = None;
        let mut glyphs = HashMap::new();
        let mut current: Option<PendingGlyph> = None;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            // BITMAP 数据区
            if current.as_ref().is_some_and(|p| p.in_bitmap) {
                if line == "ENDCHAR" {
                    if let Some(pending) = current.take() {
                        pending.finish(line_no, &mut glyphs)?;
                    }
                } else if let Some(pending) = current.as_mut() {
                    pending.rows.push(parse_hex_row(line, line_no)?);
                }
                continue;
            }

            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else { continue };

            match keyword {
                "FONTBOUNDINGBOX" => bounding_box = Some(numbers(&mut parts, line_no, keyword)?),
                "FONT_ASCENT" => ascent = Some(numbers::<1>(&mut parts, line_no, keyword)?[0]),
                "STARTCHAR" => {
                    if current.is_some() {
                        return Err(malformed(line_no, "STARTCHAR before ENDCHAR"));
                    }
                    current = Some(PendingGlyph::default());
                }
                "ENCODING" => {
                    let [code] = numbers(&mut parts, line_no, keyword)?;
                    in_glyph(&mut current, line_no, keyword)?.encoding = Some(code);
                }
                "DWIDTH" => {
                    let [dx, _dy] = numbers(&mut parts, line_no, keyword)?;
                    in_glyph(&mut current, line_no, keyword)?.advance = Some(dx);
                }
                "BBX" => {
                    let bbx: [i32; 4] = numbers(&mut parts, line_no, keyword)?;
                    if bbx[0] < 0 || bbx[1] < 0 {
                        return Err(malformed(line_no, "negative BBX size"));
                    }
                    in_glyph(&mut current, line_no, keyword)?.bbx = Some(bbx);
                }
                "BITMAP" => in_glyph(&mut current, line_no, keyword)?.in_bitmap = true,
                "ENDCHAR" => {
                    let pending = current
                        .take()
                        .ok_or_else(|| malformed(line_no, "ENDCHAR outside STARTCHAR"))?;
                    pending.finish(line_no, &mut glyphs)?;
                }
                _ => {}
            }
        }

        if current.is_some() {
            return Err(malformed(source.lines().count(), "unterminated glyph"));
        }

        let ascent = ascent
            .or_else(|| bounding_box.map(|[_, h, _, yoff]| h.saturating_add(yoff)))
            .ok_or_else(|| malformed(0, "missing FONT_ASCENT and FONTBOUNDINGBOX"))?;
        if glyphs.is_empty() {
            return Err(malformed(0, "font has no glyphs"));
        }
        let default_advance = bounding_box
            .map(|[w, ..]| w)
            .or_else(|| glyphs.values().map(|g: &Glyph| g.advance).max())
            .unwrap_or(0);

        Ok(Self { ascent, default_advance, glyphs })
    }
}

#[derive(Debug, Default)]
struct PendingGlyph {
    encoding: Option<i32>,
    advance: Option<i32>,
    bbx: Option<[i32; 4]>,
    in_bitmap: bool,
    rows: Vec<Vec<u8>>,
}

impl PendingGlyph {
    fn finish(self, line_no: usize, glyphs: &mut HashMap<char, Glyph>) -> Result<(), FontError> {
        let encoding = self.encoding.ok_or_else(|| malformed(line_no, "glyph without ENCODING"))?;
        let [width, height, x_offset, y_offset] =
            self.bbx.ok_or_else(|| malformed(line_no, "glyph without BBX"))?;

        if self.rows.len() != height as usize {
            return Err(malformed(
                line_no,
                format!("expected {height} bitmap rows, found {}", self.rows.len()),
            ));
        }

        // -1 表示没有标准编码的字形
        let Some(ch) = u32::try_from(encoding).ok().and_then(char::from_u32) else {
            return Ok(());
        };

        glyphs.insert(
            ch,
            Glyph {
                width: width as u32,
                height: height as u32,
                x_offset,
                y_offset,
                advance: self.advance.unwrap_or(width),
                rows: self.rows,
            },
        );
        Ok(())
    }
}

fn in_glyph<'a>(
    current: &'a mut Option<PendingGlyph>, line_no: usize, keyword: &str,
) -> Result<&'a mut PendingGlyph, FontError> {
    current.as_mut().ok_or_else(|| malformed(line_no, format!("{keyword} outside STARTCHAR")))
}

fn numbers<const N: usize>(
    parts: &mut std::str::SplitWhitespace<'_>, line_no: usize, keyword: &str,
) -> Result<[i32; N], FontError> {
    let mut out = [0; N];
    for slot in out.iter_mut() {
        let token = parts
            .next()
            .ok_or_else(|| malformed(line_no, format!("{keyword} expects {N} numbers")))?;
        *slot = token
            .parse()
            .map_err(|_| malformed(line_no, format!("invalid number in {keyword}: {token}")))?;
    }
    Ok(out)
}

fn parse_hex_row(line: &str, line_no: usize) -> Result<Vec<u8>, FontError> {
    if line.len() % 2 != 0 {
        return Err(malformed(line_no, "odd number of hex digits in bitmap row"));
    }
    // from_str_radix 会接受 "+F"
    if !line.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed(line_no, format!("invalid bitmap row: {line}")));
    }
    (0..line.len())
        .step_by(2)
        .map(|i| {
            line.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| malformed(line_no, format!("invalid bitmap row: {line}")))
        })
        .collect()
}

const BDF_NAMES: [&str; 4] = ["5x7.bdf", "6x10.bdf", "6x13.bdf", "ter-u12n.bdf"];

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = dirs::font_dir() {
        paths.extend(BDF_NAMES.iter().map(|name| dir.join(name)));
    }

    #[cfg(target_os = "linux")]
    {
        for dir in ["/usr/share/fonts/X11/misc", "/usr/share/fonts/misc", "/usr/share/fonts/terminus"]
        {
            paths.extend(BDF_NAMES.iter().map(|name| Path::new(dir).join(name)));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.extend(BDF_NAMES.iter().map(|name| Path::new("/opt/X11/share/fonts/misc").join(name)));
    }

    paths
}

#[inline]
pub fn load_font(font_path: &Path) -> Result<BitmapFont, FontError> {
    if !font_path.exists() {
        return Err(FontError::NotFound(font_path.display().to_string()));
    }
    let source = std::fs::read_to_string(font_path).map_err(FontError::ReadError)?;
    BitmapFont::parse_bdf(&source)
}

/// Loads the font configured by the user, or the first BDF font found on the system.
pub fn load_default_font(configured: Option<&Path>) -> Result<BitmapFont, FontError> {
    if let Some(path) = configured {
        return load_font(path);
    }

    for font_path in candidate_paths() {
        match load_font(&font_path) {
            Ok(font) => {
                debug!("Loaded font {}", font_path.display());
                return Ok(font);
            }
            Err(e) => debug!("Skipping font candidate: {e}"),
        }
    }

    Err(FontError::NotFound("No BDF font found".to_string()))
}

#[rustfmt::skip]
const BUILTIN_5X7: [(char, [u8; 7]); 41] = [
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('?', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    ('A', [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F]),
    ('H', [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('I', [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
];
