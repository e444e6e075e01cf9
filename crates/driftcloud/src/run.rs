use anyhow::{bail, Context, Result};
use renderer::params::Parameters;
use renderer::{PairSource, Renderer, RendererConfig};
use slidedeck::Deck;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

pub fn run(args: Args) -> Result<()> {
    initialise_tracing();

    let deck = Deck::load(&args.deck)
        .with_context(|| format!("failed to load deck at {}", args.deck.display()))?;
    deck.validate()
        .with_context(|| format!("invalid deck at {}", args.deck.display()))?;
    tracing::info!(
        deck = %args.deck.display(),
        slides = deck.len(),
        "loaded slide deck"
    );

    let initial_slide = resolve_initial_slide(&args, &deck)?;
    let params = build_parameters(&args, &deck);
    let surface_size = match args.size.as_deref() {
        Some(spec) => parse_surface_size(spec)?,
        None => (1280, 720),
    };

    let pairs = deck
        .slides
        .iter()
        .map(|slide| PairSource {
            color: slide.color.clone(),
            depth: slide.depth.clone(),
        })
        .collect();

    let config = RendererConfig {
        surface_size,
        pairs,
        initial_slide,
        target_fps: args.fps.filter(|fps| *fps > 0.0),
        antialiasing: args.antialias,
        params,
    };

    Renderer::new(config).run()
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Resolves `--slide`, accepting a 1-based index (`2`) or a route
/// token (`/2`). Defaults to the first slide.
fn resolve_initial_slide(args: &Args, deck: &Deck) -> Result<usize> {
    let Some(spec) = args.slide.as_deref() else {
        return Ok(0);
    };
    let trimmed = spec.trim();
    // Route parsing covers bare ordinals too: `2` and `/2` are the
    // same address.
    if let Some(index) = deck.parse_route(trimmed) {
        return Ok(index);
    }
    bail!(
        "slide '{trimmed}' not found; deck has {} slides (use 1-{} or a route like /2)",
        deck.len(),
        deck.len()
    );
}

/// Deck parameters override the defaults; CLI flags override the deck.
fn build_parameters(args: &Args, deck: &Deck) -> Parameters {
    let mut params = Parameters::default();
    let deck_params = &deck.params;

    if let Some(resolution) = args.resolution.or(deck_params.resolution) {
        let _ = params.set_resolution(resolution);
    }
    if let Some(value) = args.point_size.or(deck_params.point_size) {
        params.set_point_size(value);
    }
    if let Some(value) = args.depth_scale.or(deck_params.depth_scale) {
        params.set_depth_scale(value);
    }
    if let Some(value) = args.noise_amount.or(deck_params.noise_amount) {
        params.set_noise_amount(value);
    }
    if let Some(value) = deck_params.noise_speed {
        params.set_noise_speed(value);
    }
    if let Some(value) = deck_params.noise_scale {
        params.set_noise_scale(value);
    }
    if let Some(value) = deck_params.rotate_strength {
        params.set_rotate_strength(value);
    }
    if let Some(value) = deck_params.bloom_intensity {
        params.set_bloom_intensity(value);
    }
    if let Some(value) = deck_params.bloom_threshold {
        params.set_bloom_threshold(value);
    }
    if let Some(value) = deck_params.bloom_smoothing {
        params.set_bloom_smoothing(value);
    }

    params
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        bail!("window dimensions must be greater than zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["driftcloud", "deck.toml"];
        argv.extend(extra);
        Args::parse_from(argv)
    }

    fn deck() -> Deck {
        Deck::from_toml_str(
            r#"
            version = 1

            [params]
            resolution = 256
            point_size = 6.0

            [[slides]]
            color = "a_color.png"
            depth = "a_depth.png"

            [[slides]]
            color = "b_color.png"
            depth = "b_depth.png"
            "#,
        )
        .expect("deck fixture parses")
    }

    #[test]
    fn surface_size_parses_and_rejects_garbage() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 640X480 ").unwrap(), (640, 480));
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x720").is_err());
    }

    #[test]
    fn cli_flags_override_deck_parameters() {
        let deck = deck();
        let defaults = build_parameters(&args(&[]), &deck);
        assert_eq!(defaults.resolution(), 256);
        assert_eq!(defaults.point_size, 6.0);

        let overridden = build_parameters(&args(&["--resolution", "64", "--point-size", "2"]), &deck);
        assert_eq!(overridden.resolution(), 64);
        assert_eq!(overridden.point_size, 2.0);
    }

    #[test]
    fn initial_slide_accepts_indices_and_routes() {
        let deck = deck();
        assert_eq!(resolve_initial_slide(&args(&[]), &deck).unwrap(), 0);
        assert_eq!(
            resolve_initial_slide(&args(&["--slide", "2"]), &deck).unwrap(),
            1
        );
        assert_eq!(
            resolve_initial_slide(&args(&["--slide", "/2"]), &deck).unwrap(),
            1
        );
        assert!(resolve_initial_slide(&args(&["--slide", "9"]), &deck).is_err());
    }
}
