use std::{fmt, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::icon_data::decode_fallback;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Drawn with the image library.
    Rendered(PathBuf),
    /// Embedded PNG written verbatim.
    Fallback(PathBuf),
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Rendered(path) | Outcome::Fallback(path) => path,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Rendered(path) => write!(f, "✅ Icon created: {}", path.display()),
            Outcome::Fallback(path) => write!(f, "✅ Minimal icon created: {}", path.display()),
        }
    }
}

#[cfg(feature = "render")]
pub fn generate(config: &Config) -> Result<Outcome> {
    use crate::{font, icon};
    use log::warn;

    let spec = match &config.spec_path {
        Some(path) => icon::IconSpec::load(path)?,
        None => icon::IconSpec::default(),
    };

    // 字体加载失败时不指定字体
    let font = match font::load_default_font(config.font_path.as_deref()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("{e}, drawing label with the built-in glyphs");
            None
        }
    };

    let img = icon::render(&spec, font.as_ref());
    let bytes = icon::encode_png(&img)?;
    write_icon(&config.output, &bytes)?;

    info!("Rendered {}x{} icon", img.width(), img.height());
    Ok(Outcome::Rendered(config.output.clone()))
}

#[cfg(not(feature = "render"))]
pub fn generate(config: &Config) -> Result<Outcome> {
    log::warn!("Built without the `render` feature, writing the embedded icon");
    write_fallback(&config.output)?;
    Ok(Outcome::Fallback(config.output.clone()))
}

pub fn write_fallback(path: &Path) -> Result<()> {
    let bytes = decode_fallback().context("Embedded fallback icon is not valid base64")?;
    write_icon(path, &bytes)
}

/// Creates or truncates `path`. Missing parent directories are an error.
pub fn write_icon(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("Failed to write icon to {}", path.display()))?;
    info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
