// Frame driver for the halftone portrait.
//
// Owns the luminance grid, ripple field and opacity fade, polls the
// asynchronous sampler each frame, and hands the current grid to the
// compositor. Nothing here returns an error: decode failures and degenerate
// geometry are logged and the previous grid (if any) keeps being drawn.

use std::time::Duration;

use log::{debug, info, warn};

use crate::compositor::{Canvas, FrameStats, GlyphCompositor};
use crate::fade::OpacityFade;
use crate::ripple::{click_preset, move_preset, PointerThrottle, RippleField, Rng32, MAX_RIPPLES};
use crate::sampler::{BuildOutcome, BuildRequest, ImageSource, LuminanceSampler};
use crate::types::LuminanceGrid;

pub const DEFAULT_CELL_SIZE: u32 = 8;

#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub source: ImageSource,
    pub cell_size: u32,
    pub active: bool,
}

impl RenderOptions {
    pub fn new(source: ImageSource) -> Self {
        Self { source, cell_size: DEFAULT_CELL_SIZE, active: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Building,   // no grid yet; waiting for the first build (or a usable size)
    Ready,      // grid present, drawing every frame
    Rebuilding, // grid present and drawn while a replacement is decoded
    Unmounted,  // torn down; terminal
}

pub struct HalftoneRenderer {
    source: ImageSource,
    state: Lifecycle,
    width: usize,
    height: usize,
    sampler: LuminanceSampler,
    grid: Option<LuminanceGrid>,
    ripples: RippleField,
    throttle: PointerThrottle,
    rng: Rng32,
    fade: OpacityFade,
    // Current frame handler; replaced whenever the cell size changes.
    compositor: GlyphCompositor,
}

impl HalftoneRenderer {
    pub fn new(options: RenderOptions, width: usize, height: usize) -> Self {
        let cell_size = options.cell_size.max(1);
        let initial = if options.active { 1.0 } else { 0.0 };
        let mut ripples = RippleField::new(MAX_RIPPLES);
        ripples.set_geometry(width, height, cell_size);

        let fade = OpacityFade::new(initial);

        let mut renderer = Self {
            source: options.source,
            state: Lifecycle::Building,
            width,
            height,
            sampler: LuminanceSampler::new(),
            grid: None,
            ripples,
            throttle: PointerThrottle::default(),
            rng: Rng32::from_seed(0xC0FFEE),
            fade,
            compositor: GlyphCompositor::new(cell_size),
        };
        renderer.request_build();
        renderer
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state
    }

    pub fn grid(&self) -> Option<&LuminanceGrid> {
        self.grid.as_ref()
    }

    pub fn cell_size(&self) -> u32 {
        self.compositor.cell_size()
    }

    pub fn ripple_count(&self) -> usize {
        self.ripples.len()
    }

    pub fn ripples(&self) -> &RippleField {
        &self.ripples
    }

    pub fn opacity(&self, now: Duration) -> f32 {
        self.fade.value(now)
    }

    pub fn is_active(&self) -> bool {
        self.fade.target() > 0.5
    }

    fn request_build(&mut self) {
        if self.state == Lifecycle::Unmounted {
            return;
        }
        let cell_size = self.compositor.cell_size();
        match self.sampler.build(&self.source, cell_size, self.width, self.height) {
            BuildRequest::Started(_) => {
                self.state = if self.grid.is_some() { Lifecycle::Rebuilding } else { Lifecycle::Building };
            }
            BuildRequest::Degenerate => {
                debug!("surface {}x{} too small for cell {cell_size}; keeping current grid", self.width, self.height);
            }
            BuildRequest::SpawnFailed | BuildRequest::Cancelled => {}
        }
    }

    /// The drawable area changed size (device pixels).
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.state == Lifecycle::Unmounted || (width == self.width && height == self.height) {
            return;
        }
        debug!("resize {}x{} -> {width}x{height}", self.width, self.height);
        self.width = width;
        self.height = height;
        self.ripples.set_geometry(width, height, self.compositor.cell_size());
        self.request_build();
    }

    /// Swap the frame handler for a new grid granularity and rebuild.
    /// The old grid no longer matches the cell size, so frames stay blank
    /// until the rebuild lands.
    pub fn set_cell_size(&mut self, cell_size: u32) {
        let cell_size = cell_size.max(1);
        if self.state == Lifecycle::Unmounted || cell_size == self.compositor.cell_size() {
            return;
        }
        self.compositor = GlyphCompositor::new(cell_size);
        self.ripples.set_geometry(self.width, self.height, cell_size);
        self.request_build();
    }

    /// Rebuild from a different image. If it fails to decode, the current
    /// grid stays on screen.
    pub fn set_source(&mut self, source: ImageSource) {
        if self.state == Lifecycle::Unmounted {
            return;
        }
        self.source = source;
        self.request_build();
    }

    /// Fade toward fully visible (`true`) or hidden (`false`).
    pub fn set_active(&mut self, active: bool, now: Duration) {
        self.fade.retarget(if active { 1.0 } else { 0.0 }, now);
    }

    /// Pointer moved inside the surface; spawns a small ripple every ~20px.
    pub fn pointer_move(&mut self, x: f32, y: f32, now: Duration) {
        if self.state == Lifecycle::Unmounted || !self.throttle.admit(x, y) {
            return;
        }
        let (amplitude, speed) = move_preset(&mut self.rng);
        self.ripples.spawn(x, y, amplitude, speed, now);
    }

    /// Pointer clicked inside the surface; always spawns a strong ripple.
    pub fn pointer_click(&mut self, x: f32, y: f32, now: Duration) {
        if self.state == Lifecycle::Unmounted {
            return;
        }
        let (amplitude, speed) = click_preset();
        self.ripples.spawn(x, y, amplitude, speed, now);
    }

    fn apply_build(&mut self, outcome: BuildOutcome) {
        match outcome {
            BuildOutcome::Built(grid) => {
                debug!("luminance grid ready: {}x{} @ cell {}", grid.cols(), grid.rows(), grid.cell_size());
                self.grid = Some(grid);
                self.state = Lifecycle::Ready;
            }
            BuildOutcome::Failed(e) => {
                warn!("luminance build failed: {e}");
                if self.grid.is_some() {
                    self.state = Lifecycle::Ready;
                }
            }
        }
    }

    /// One display refresh: clear, then draw whatever grid is available.
    pub fn frame(&mut self, now: Duration, canvas: &mut dyn Canvas) -> FrameStats {
        if self.state == Lifecycle::Unmounted {
            return FrameStats::default();
        }
        if let Some(outcome) = self.sampler.poll() {
            self.apply_build(outcome);
        }
        canvas.clear();

        let Some(grid) = self.grid.as_ref() else {
            return FrameStats::default();
        };
        self.ripples.prune(now);
        let opacity = self.fade.value(now);
        self.compositor.render(grid, &self.ripples, now, opacity, canvas)
    }

    /// Tear down: cancel in-flight decodes; later calls are no-ops.
    pub fn unmount(&mut self) {
        if self.state == Lifecycle::Unmounted {
            return;
        }
        info!("halftone renderer unmounted");
        self.sampler.cancel();
        self.ripples.clear();
        self.state = Lifecycle::Unmounted;
    }

    /// Block until the pending build lands. For tools and tests only.
    pub fn wait_for_build(&mut self) {
        if let Some(outcome) = self.sampler.wait() {
            self.apply_build(outcome);
        }
    }
}

impl Drop for HalftoneRenderer {
    fn drop(&mut self) {
        self.sampler.cancel();
    }
}
