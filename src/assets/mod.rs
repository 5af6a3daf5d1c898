//! Sprite resources with explicit load state
//!
//! Sprites are plain PPM images (P3 or P6). Pure magenta marks transparent
//! pixels. A sprite that is missing or malformed leaves its handle in
//! [`LoadState::Failed`] and the renderer falls back to flat shapes.

use std::path::Path;

use tracing::{info, warn};

use crate::game::render::Color;

/// Key color treated as transparent
pub const TRANSPARENT: Color = Color(255, 0, 255);

/// Largest accepted width or height, in pixels
pub const MAX_DIMENSION: u32 = 4096;

/// Load state of an injected resource handle
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState<T> {
    #[default]
    NotLoaded,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    /// The resource, only if it finished loading
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// A decoded RGB image
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    width: u32,
    height: u32,
    /// Row-major, None for transparent pixels
    pixels: Vec<Option<Color>>,
}

impl Sprite {
    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Nearest-neighbour sample at normalized coordinates in [0, 1)
    pub fn sample(&self, u: f32, v: f32) -> Option<Color> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }
        let width = self.width as usize;
        let x = ((u * self.width as f32) as usize).min(width.saturating_sub(1));
        let y = ((v * self.height as f32) as usize).min((self.height as usize).saturating_sub(1));
        self.pixels.get(y * width + x).copied().flatten()
    }

    /// Decode a PPM image (ASCII P3 or binary P6, maxval up to 255)
    pub fn parse_ppm(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut cursor = HeaderCursor { bytes, pos: 0 };

        let magic = cursor.token()?;
        let binary = match magic.as_str() {
            "P3" => false,
            "P6" => true,
            other => return Err(AssetError::Format(format!("unsupported magic {}", other))),
        };

        let width = cursor.number()?;
        let height = cursor.number()?;
        let max = cursor.number()?;
        if width == 0 || height == 0 {
            return Err(AssetError::Format("empty image".to_string()));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(AssetError::Format(format!(
                "{}x{} exceeds {}x{}",
                width, height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }
        if max == 0 || max > 255 {
            return Err(AssetError::Format(format!("unsupported maxval {}", max)));
        }

        let samples = (width as usize)
            .checked_mul(height as usize)
            .and_then(|count| count.checked_mul(3))
            .ok_or_else(|| AssetError::Format("image too large".to_string()))?;
        let channels: Vec<u32> = if binary {
            // Exactly one whitespace byte separates the header from raster data
            let start = cursor.pos + 1;
            let raster = start
                .checked_add(samples)
                .and_then(|end| bytes.get(start..end))
                .ok_or_else(|| AssetError::Format("truncated raster".to_string()))?;
            raster.iter().map(|&b| b as u32).collect()
        } else {
            // Every ASCII sample takes at least two bytes
            let mut channels = Vec::with_capacity(samples.min(bytes.len() / 2));
            for _ in 0..samples {
                channels.push(cursor.number()?);
            }
            channels
        };

        let scale = |c: u32| ((c.min(max) * 255) / max) as u8;
        let pixels = channels
            .chunks_exact(3)
            .map(|rgb| {
                let color = Color(scale(rgb[0]), scale(rgb[1]), scale(rgb[2]));
                (color != TRANSPARENT).then_some(color)
            })
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderCursor<'_> {
    fn token(&mut self) -> Result<String, AssetError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b'#') => {
                    while !matches!(self.bytes.get(self.pos), Some(b'\n') | None) {
                        self.pos += 1;
                    }
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(_) => break,
                None => return Err(AssetError::Format("unexpected end of header".to_string())),
            }
        }

        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b) if !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn number(&mut self) -> Result<u32, AssetError> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| AssetError::Format(format!("expected a number, got '{}'", token)))
    }
}

/// Every sprite the renderer may draw
#[derive(Debug, Clone, Default)]
pub struct Assets {
    pub actor: LoadState<Sprite>,
    pub background: LoadState<Sprite>,
}

impl Assets {
    /// Load all sprites from a directory. Never fails as a whole.
    pub async fn load(dir: &Path) -> Self {
        Self {
            actor: load_sprite(&dir.join("actor.ppm")).await,
            background: load_sprite(&dir.join("background.ppm")).await,
        }
    }
}

async fn load_sprite(path: &Path) -> LoadState<Sprite> {
    let result = match tokio::fs::read(path).await {
        Ok(bytes) => Sprite::parse_ppm(&bytes),
        Err(e) => Err(AssetError::Io(e)),
    };

    match result {
        Ok(sprite) => {
            info!(path = %path.display(), width = sprite.width, height = sprite.height, "Sprite loaded");
            LoadState::Loaded(sprite)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sprite unavailable, using fallback shape");
            LoadState::Failed(e.to_string())
        }
    }
}

/// Asset errors
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to read asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed image: {0}")]
    Format(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ascii_ppm_with_comments_and_transparency() {
        let src = b"P3\n# tiny\n2 1\n255\n255 0 255  10 20 30\n";
        let sprite = Sprite::parse_ppm(src).unwrap();
        assert_eq!((sprite.width, sprite.height), (2, 1));
        assert_eq!(sprite.sample(0.1, 0.5), None);
        assert_eq!(sprite.sample(0.9, 0.5), Some(Color(10, 20, 30)));
    }

    #[test]
    fn parses_binary_ppm() {
        let mut src = b"P6 1 2 255\n".to_vec();
        src.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let sprite = Sprite::parse_ppm(&src).unwrap();
        assert_eq!(sprite.sample(0.0, 0.0), Some(Color(1, 2, 3)));
        assert_eq!(sprite.sample(0.0, 0.99), Some(Color(4, 5, 6)));
    }

    #[test]
    fn rescales_small_maxval() {
        let sprite = Sprite::parse_ppm(b"P3 1 1 15 15 0 0").unwrap();
        assert_eq!(sprite.sample(0.5, 0.5), Some(Color(255, 0, 0)));
    }

    #[test]
    fn rejects_truncated_and_foreign_images() {
        assert!(Sprite::parse_ppm(b"P6 2 2 255\n\x00\x00").is_err());
        assert!(Sprite::parse_ppm(b"GIF89a").is_err());
        assert!(Sprite::parse_ppm(b"P3 1 1 255 1 2").is_err());
    }

    #[test]
    fn oversized_headers_are_rejected_before_allocating() {
        for header in [&b"P6 70000 70000 255\n"[..], b"P3 4097 1 255", b"P6 4294967295 2 255\n"] {
            assert!(matches!(Sprite::parse_ppm(header), Err(AssetError::Format(_))));
        }
        // At the cap the header is fine and only the raster is missing
        let err = Sprite::parse_ppm(b"P6 4096 4096 255\n").unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn samples_outside_are_transparent() {
        let sprite = Sprite::parse_ppm(b"P3 1 1 255 9 9 9").unwrap();
        assert_eq!(sprite.sample(1.0, 0.5), None);
        assert_eq!(sprite.sample(-0.1, 0.5), None);
    }

    #[tokio::test]
    async fn missing_directory_marks_handles_failed() {
        let dir = std::env::temp_dir().join(format!("flappy-assets-{}", uuid::Uuid::new_v4()));
        let assets = Assets::load(&dir).await;
        assert!(matches!(assets.actor, LoadState::Failed(_)));
        assert!(matches!(assets.background, LoadState::Failed(_)));
        assert!(assets.actor.ready().is_none());
    }
}
