use base64::{Engine as _, engine::general_purpose};

pub const ICON_WIDTH: u32 = 32;
pub const ICON_HEIGHT: u32 = 32;

// 32x32 PNG: 蓝色背景 + 白色方块, 没有文字
pub const FALLBACK_PNG_BASE64: &str = "
iVBORw0KGgoAAAANSUhEUgAAACAAAAAgCAIAAAD8GO2jAAAAMUlEQVR42mOwbvpGU8QwasGoBUPYgv+k
g1ELRi0YtWDUglELRi0g3YLROnnUgsFjAQBfGEEDe2DZ7wAAAABJRU5ErkJggg==
";

/// Decodes the embedded fallback icon into raw PNG bytes.
pub fn decode_fallback() -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = FALLBACK_PNG_BASE64
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    general_purpose::STANDARD.decode(compact)
}
