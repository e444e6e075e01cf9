//! Background decoding of slide texture pairs. Decoding happens on a
//! worker thread so navigation never stalls the frame loop; results
//! come back over a channel and are polled once per frame. A generation
//! counter stands in for cancellation: bumping it orphans every
//! in-flight decode, whose results are then discarded on arrival.

use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use tracing::warn;

use crate::types::PairSource;

/// One decoded RGBA8 image ready for texture upload.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

/// A fully decoded pair for one slide.
#[derive(Debug, Clone)]
pub struct LoadedPair {
    pub slide: usize,
    pub color: LoadedImage,
    pub depth: LoadedImage,
}

/// What the frame loop learns from one completed decode.
#[derive(Debug)]
pub enum PairOutcome {
    Loaded(LoadedPair),
    /// The decode failed; the caller should bind the neutral fallback
    /// for this slide and carry on.
    Failed { slide: usize },
}

struct WorkerMessage {
    generation: u64,
    slide: usize,
    result: Result<(LoadedImage, LoadedImage)>,
}

/// Owns the decode worker channel and the cancellation generation.
pub struct PairLoader {
    sender: Sender<WorkerMessage>,
    receiver: Receiver<WorkerMessage>,
    generation: u64,
}

impl PairLoader {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            generation: 0,
        }
    }

    /// Starts decoding `source` for `slide`, cancelling any decode
    /// still in flight.
    pub fn request(&mut self, slide: usize, source: PairSource) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let sender = self.sender.clone();
        thread::spawn(move || {
            let result = decode_pair(&source);
            let _ = sender.send(WorkerMessage {
                generation,
                slide,
                result,
            });
        });
    }

    /// Orphans any in-flight decode without requesting a new one.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drains completed decodes, returning the outcome of the current
    /// generation if it has arrived. Stale generations are dropped
    /// silently; decode failures are logged here, once, and degraded to
    /// [`PairOutcome::Failed`].
    pub fn poll(&mut self) -> Option<PairOutcome> {
        loop {
            let message = match self.receiver.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return None,
            };
            if message.generation != self.generation {
                continue;
            }
            match message.result {
                Ok((color, depth)) => {
                    return Some(PairOutcome::Loaded(LoadedPair {
                        slide: message.slide,
                        color,
                        depth,
                    }));
                }
                Err(err) => {
                    warn!(
                        slide = message.slide,
                        error = %format!("{err:#}"),
                        "pair decode failed, falling back to neutral textures"
                    );
                    return Some(PairOutcome::Failed {
                        slide: message.slide,
                    });
                }
            }
        }
    }
}

impl Default for PairLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_image(path: &std::path::Path) -> Result<LoadedImage> {
    let mut image = image::open(path)
        .with_context(|| format!("failed to decode image at {}", path.display()))?
        .to_rgba8();
    // The first row handed to the GPU lands at v=0, and the vertex
    // stage samples with a 1-y flip that expects the image bottom row
    // there. Upload bottom-first so the image top ends up at the top
    // of the screen.
    image::imageops::flip_vertical_in_place(&mut image);
    let (width, height) = image.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: image.into_raw(),
    })
}

fn decode_pair(source: &PairSource) -> Result<(LoadedImage, LoadedImage)> {
    let color = decode_image(&source.color)?;
    let depth = decode_image(&source.depth)?;
    Ok((color, depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn missing_pair() -> PairSource {
        PairSource {
            color: PathBuf::from("/nonexistent/color.png"),
            depth: PathBuf::from("/nonexistent/depth.png"),
        }
    }

    fn poll_until(loader: &mut PairLoader) -> Option<PairOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(outcome) = loader.poll() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn failed_decode_degrades_to_fallback_outcome() {
        let mut loader = PairLoader::new();
        loader.request(3, missing_pair());
        match poll_until(&mut loader) {
            Some(PairOutcome::Failed { slide }) => assert_eq!(slide, 3),
            other => panic!("expected failure outcome, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_requests_never_surface() {
        let mut loader = PairLoader::new();
        loader.request(0, missing_pair());
        loader.cancel();
        // The orphaned result may or may not have arrived yet; give it
        // time, then confirm it is swallowed either way.
        thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn decoded_rows_are_flipped_for_upload() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("strip.png");
        let mut strip = image::RgbaImage::new(1, 2);
        strip.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        strip.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        strip.save(&path).expect("write fixture");

        let decoded = decode_image(&path).expect("decode fixture");
        assert_eq!((decoded.width, decoded.height), (1, 2));
        // The image bottom row comes first so it lands at v=0, which
        // the shader's 1-y lookup maps back to the screen bottom.
        assert_eq!(&decoded.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&decoded.pixels[4..8], &[255, 0, 0, 255]);
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut loader = PairLoader::new();
        loader.request(0, missing_pair());
        loader.request(1, missing_pair());
        match poll_until(&mut loader) {
            Some(PairOutcome::Failed { slide }) => assert_eq!(slide, 1),
            other => panic!("expected outcome for slide 1, got {other:?}"),
        }
        // Nothing further: the superseded result was discarded.
        thread::sleep(Duration::from_millis(100));
        assert!(loader.poll().is_none());
    }
}
