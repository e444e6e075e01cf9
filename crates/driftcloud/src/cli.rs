use std::path::PathBuf;

use clap::Parser;
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "driftcloud",
    author,
    version,
    about = "Animated 3D point cloud slideshows from color+depth image decks"
)]
pub struct Args {
    /// Deck manifest (TOML) listing the color/depth image pairs.
    #[arg(value_name = "DECK")]
    pub deck: PathBuf,

    /// Slide to show first, as a 1-based index or a route like `/2`.
    #[arg(long, value_name = "SLIDE")]
    pub slide: Option<String>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap (0 = uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Grid resolution override (points per side).
    #[arg(long, value_name = "POINTS")]
    pub resolution: Option<u32>,

    /// Point sprite base diameter in pixels.
    #[arg(long, value_name = "PIXELS")]
    pub point_size: Option<f32>,

    /// Depth displacement scale.
    #[arg(long, value_name = "SCALE")]
    pub depth_scale: Option<f32>,

    /// Ambient noise displacement amount.
    #[arg(long, value_name = "AMOUNT")]
    pub noise_amount: Option<f32>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "off"
    )]
    pub antialias: Antialiasing,
}

pub fn parse() -> Args {
    Args::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antialias_accepts_names_and_sample_counts() {
        assert_eq!(parse_antialias("auto"), Ok(Antialiasing::Auto));
        assert_eq!(parse_antialias("off"), Ok(Antialiasing::Off));
        assert_eq!(parse_antialias("1"), Ok(Antialiasing::Off));
        assert_eq!(parse_antialias("4"), Ok(Antialiasing::Samples(4)));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
    }
}
