// Luminance sampling: image -> coarse grid of intensities, one per cell.
// Decoding happens on a worker thread; the frame loop only ever polls.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use image::imageops::FilterType;
use image::DynamicImage;
use log::{debug, warn};

use crate::error::Error;
use crate::types::LuminanceGrid;

// Tone curve baked into the downscale: contrast first, then brightness.
const CONTRAST: f32 = 1.15;
const BRIGHTNESS: f32 = 0.95;

/// Where the portrait comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
    Decoded(Arc<DynamicImage>),
}

impl ImageSource {
    fn decode(&self) -> Result<Arc<DynamicImage>, Error> {
        match self {
            ImageSource::Path(p) => image::open(p)
                .map(Arc::new)
                .map_err(|e| Error::ImageDecode(format!("{}: {e}", p.display()))),
            ImageSource::Bytes(b) => Ok(Arc::new(image::load_from_memory(b)?)),
            ImageSource::Decoded(img) => Ok(Arc::clone(img)),
        }
    }
}

/// Grid size for a surface, or `None` if it would be empty.
pub fn grid_dimensions(cell_size: u32, width_px: usize, height_px: usize) -> Option<(usize, usize)> {
    if cell_size == 0 {
        return None;
    }
    let cols = width_px / cell_size as usize;
    let rows = height_px / cell_size as usize;
    if cols < 1 || rows < 1 {
        return None;
    }
    Some((cols, rows))
}

#[inline]
fn tone(c: u8) -> f32 {
    let v = c as f32 / 255.0;
    let v = (v - 0.5) * CONTRAST + 0.5;
    (v * BRIGHTNESS).clamp(0.0, 1.0)
}

/// Downscale `img` to one pixel per cell and convert to perceptual luminance.
pub fn sample_image(
    img: &DynamicImage,
    cell_size: u32,
    width_px: usize,
    height_px: usize,
) -> Option<LuminanceGrid> {
    let (cols, rows) = grid_dimensions(cell_size, width_px, height_px)?;
    let small = img.resize_exact(cols as u32, rows as u32, FilterType::Triangle).to_rgb8();

    let mut values = Vec::with_capacity(cols * rows);
    for px in small.pixels() {
        let (r, g, b) = (tone(px[0]), tone(px[1]), tone(px[2]));
        values.push((0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 1.0));
    }
    LuminanceGrid::new(cols, rows, cell_size, values)
}

/// What happened when a build was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRequest {
    Started(u64),
    Degenerate,  // surface too small for a single cell; nothing was started
    SpawnFailed, // the worker thread could not be created
    Cancelled,   // the sampler was torn down
}

/// Result of the newest build, as seen by `poll`.
#[derive(Debug)]
pub enum BuildOutcome {
    Built(LuminanceGrid),
    Failed(Error),
}

struct Message {
    generation: u64,
    result: Result<Option<LuminanceGrid>, Error>,
}

fn outcome(result: Result<Option<LuminanceGrid>, Error>) -> BuildOutcome {
    match result {
        Ok(Some(grid)) => BuildOutcome::Built(grid),
        // Geometry is checked before spawning, so only a zero-pixel image lands here.
        Ok(None) => BuildOutcome::Failed(Error::ImageDecode("image has no pixels".into())),
        Err(e) => BuildOutcome::Failed(e),
    }
}

pub struct LuminanceSampler {
    alive: Arc<AtomicBool>,
    generation: u64,
    in_flight: bool,
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

impl Default for LuminanceSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl LuminanceSampler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { alive: Arc::new(AtomicBool::new(true)), generation: 0, in_flight: false, tx, rx }
    }

    /// Kick off an asynchronous decode + sample. Supersedes any build in flight.
    pub fn build(&mut self, source: &ImageSource, cell_size: u32, width_px: usize, height_px: usize) -> BuildRequest {
        if !self.alive.load(Ordering::Acquire) {
            return BuildRequest::Cancelled;
        }
        if grid_dimensions(cell_size, width_px, height_px).is_none() {
            debug!("skipping luminance build for {width_px}x{height_px} @ cell {cell_size}");
            return BuildRequest::Degenerate;
        }

        let generation = self.generation + 1;
        let alive = Arc::clone(&self.alive);
        let tx = self.tx.clone();
        let source = source.clone();

        let spawned = thread::Builder::new()
            .name(format!("luminance-build-{generation}"))
            .spawn(move || {
                let result = source
                    .decode()
                    .map(|img| sample_image(&img, cell_size, width_px, height_px));
                if !alive.load(Ordering::Acquire) {
                    return; // torn down while decoding
                }
                // Receiver gone means the sampler was dropped; nothing to do.
                let _ = tx.send(Message { generation, result });
            })
            .map(|_| ());

        let request = self.commit(generation, spawned);
        if request == BuildRequest::Started(generation) {
            debug!("luminance build #{generation} started ({width_px}x{height_px} @ cell {cell_size})");
        }
        request
    }

    // The generation only advances once a worker exists for it; on failure
    // the build already in flight stays current.
    fn commit(&mut self, generation: u64, spawned: io::Result<()>) -> BuildRequest {
        match spawned {
            Ok(()) => {
                self.generation = generation;
                self.in_flight = true;
                BuildRequest::Started(generation)
            }
            Err(e) => {
                warn!("could not spawn luminance worker: {e}");
                BuildRequest::SpawnFailed
            }
        }
    }

    /// Non-blocking check for the newest build's result.
    pub fn poll(&mut self) -> Option<BuildOutcome> {
        if !self.alive.load(Ordering::Acquire) {
            return None;
        }
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(msg) if msg.generation == self.generation => latest = Some(msg.result),
                Ok(msg) => debug!("dropping stale luminance build #{}", msg.generation),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        let result = latest?;
        self.in_flight = false;
        Some(outcome(result))
    }

    /// Block until the newest build reports back. Used by tests and tools
    /// that want a grid synchronously; the frame loop never calls this.
    pub fn wait(&mut self) -> Option<BuildOutcome> {
        if !self.in_flight {
            return None;
        }
        while let Ok(msg) = self.rx.recv() {
            if msg.generation == self.generation {
                self.in_flight = false;
                return Some(outcome(msg.result));
            }
        }
        None
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Tear down: any worker still decoding discards its result.
    pub fn cancel(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.in_flight = false;
    }
}
