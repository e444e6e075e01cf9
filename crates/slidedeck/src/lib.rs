use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("failed to parse deck: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read deck file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid deck: {0}")]
    Invalid(String),
}

/// One color/depth image pair. The color image supplies per-point RGB,
/// the depth image is read as a single-channel [0,1] displacement field
/// (white = near, black = far).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Slide {
    pub color: PathBuf,
    pub depth: PathBuf,
}

/// Optional parameter overrides carried by the deck file. Anything left
/// `None` keeps the renderer's built-in default; out-of-range values
/// are rejected by `validate` rather than silently clamped so a typo in
/// a deck file is visible.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeckParams {
    #[serde(default)]
    pub resolution: Option<u32>,
    #[serde(default)]
    pub point_size: Option<f32>,
    #[serde(default)]
    pub depth_scale: Option<f32>,
    #[serde(default)]
    pub noise_amount: Option<f32>,
    #[serde(default)]
    pub noise_speed: Option<f32>,
    #[serde(default)]
    pub noise_scale: Option<f32>,
    #[serde(default)]
    pub rotate_strength: Option<f32>,
    #[serde(default)]
    pub bloom_intensity: Option<f32>,
    #[serde(default)]
    pub bloom_threshold: Option<f32>,
    #[serde(default)]
    pub bloom_smoothing: Option<f32>,
}

/// An ordered deck of image pairs plus optional parameter overrides.
///
/// Slide 0 is the landing entry; the others are addressable by a
/// 1-based route token (`/2` is slide index 1, and so on).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Deck {
    pub version: u32,
    #[serde(default)]
    pub params: DeckParams,
    #[serde(default, rename = "slides")]
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn from_toml_str(input: &str) -> Result<Self, DeckError> {
        let deck: Deck = toml::from_str(input)?;
        deck.validate()?;
        Ok(deck)
    }

    /// Loads a deck file and resolves relative slide paths against the
    /// deck file's directory.
    pub fn load(path: &Path) -> Result<Self, DeckError> {
        let raw = std::fs::read_to_string(path)?;
        let mut deck = Self::from_toml_str(&raw)?;
        if let Some(base) = path.parent() {
            for slide in &mut deck.slides {
                if slide.color.is_relative() {
                    slide.color = base.join(&slide.color);
                }
                if slide.depth.is_relative() {
                    slide.depth = base.join(&slide.depth);
                }
            }
        }
        Ok(deck)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Index of the slide after `index`, wrapping past the end.
    ///
    /// `next_index`/`prev_index`/`route_for` are the deck's navigation
    /// surface for embedders that drive slides by route token; the
    /// windowed renderer tracks indices in its own event loop and only
    /// consumes [`Deck::parse_route`] for the start slide.
    pub fn next_index(&self, index: usize) -> usize {
        if self.slides.is_empty() {
            return 0;
        }
        (index + 1) % self.slides.len()
    }

    /// Index of the slide before `index`, wrapping past the start.
    pub fn prev_index(&self, index: usize) -> usize {
        if self.slides.is_empty() {
            return 0;
        }
        (index + self.slides.len() - 1) % self.slides.len()
    }

    /// Route token for a slide: the landing slide is `/`, every other
    /// slide is addressed as `/{index + 1}`.
    pub fn route_for(&self, index: usize) -> Option<String> {
        if index >= self.slides.len() {
            return None;
        }
        if index == 0 {
            Some("/".to_string())
        } else {
            Some(format!("/{}", index + 1))
        }
    }

    /// Resolves a route token back to a slide index. Tokens outside
    /// `[0, len)` are an addressing error and yield `None`.
    pub fn parse_route(&self, token: &str) -> Option<usize> {
        let trimmed = token.trim_start_matches('/');
        if trimmed.is_empty() {
            return if self.slides.is_empty() { None } else { Some(0) };
        }
        let ordinal: usize = trimmed.parse().ok()?;
        let index = ordinal.checked_sub(1)?;
        if index < self.slides.len() {
            Some(index)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        if self.version != 1 {
            return Err(DeckError::Invalid(format!(
                "unsupported deck version {}; expected 1",
                self.version
            )));
        }

        if self.slides.is_empty() {
            return Err(DeckError::Invalid(
                "deck must contain at least one slide".into(),
            ));
        }

        for (index, slide) in self.slides.iter().enumerate() {
            if slide.color.as_os_str().is_empty() {
                return Err(DeckError::Invalid(format!(
                    "slide {index} has an empty color path"
                )));
            }
            if slide.depth.as_os_str().is_empty() {
                return Err(DeckError::Invalid(format!(
                    "slide {index} has an empty depth path"
                )));
            }
        }

        if let Some(resolution) = self.params.resolution {
            if resolution < 2 {
                return Err(DeckError::Invalid(format!(
                    "params.resolution must be at least 2, got {resolution}"
                )));
            }
        }
        for (name, value) in [
            ("point_size", self.params.point_size),
            ("depth_scale", self.params.depth_scale),
            ("noise_amount", self.params.noise_amount),
            ("noise_speed", self.params.noise_speed),
            ("noise_scale", self.params.noise_scale),
            ("rotate_strength", self.params.rotate_strength),
            ("bloom_intensity", self.params.bloom_intensity),
            ("bloom_threshold", self.params.bloom_threshold),
            ("bloom_smoothing", self.params.bloom_smoothing),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(DeckError::Invalid(format!(
                        "params.{name} must be a non-negative number, got {value}"
                    )));
                }
            }
        }

        Ok(())
    }
}
