// What you SEE:
// • The image drawn as warm ASCII glyphs on a cream page.
// • Move the mouse: small ripples trail the cursor every ~20px.
// • Click: a strong ripple.
// • A toggles active (fade in/out). Resize the window to re-grid. ESC quits.

mod window;

use std::time::{Duration, Instant};

use clap::Parser;
use halftone_portrait::config::{Args, Config};
use halftone_portrait::draw::{draw_crosshair, draw_text_5x7, RasterSurface};
use halftone_portrait::error::Error;
use halftone_portrait::sampler::ImageSource;
use halftone_portrait::{HalftoneRenderer, Lifecycle, RenderOptions};
use log::{error, info};
use window::Drawer;

fn lifecycle_tag(state: Lifecycle) -> &'static str {
    match state {
        Lifecycle::Building => "BUILDING",
        Lifecycle::Ready => "READY",
        Lifecycle::Rebuilding => "REBUILDING",
        Lifecycle::Unmounted => "UNMOUNTED",
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();
    let cfg = Config::resolve(&args).inspect_err(|e| error!("{e}"))?;
    let Some(path) = cfg.source.clone() else {
        let e = Error::Config("no source image given (pass a path or set `source` in the config)".into());
        error!("{e}");
        return Err(e);
    };
    info!("rendering {} at cell size {}", path.display(), cfg.cell_size);

    /* --- Window + surface ---
       Visual: window opens on a blank page until the first grid lands. */
    let title = format!("Halftone - {}", path.display());
    let mut drawer = Drawer::new(&title, cfg.width, cfg.height, cfg.target_fps)?;
    let (w, h) = drawer.size();
    let mut surface = RasterSurface::new(w, h, cfg.background);
    surface.set_cell_size(cfg.cell_size);

    let options = RenderOptions { source: ImageSource::Path(path), cell_size: cfg.cell_size, active: cfg.active };
    let mut renderer = HalftoneRenderer::new(options, w, h);
    let mut active = cfg.active;

    /* --- HUD / FPS --- */
    let clock = Instant::now();
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now: Duration = clock.elapsed();

        /* 1) Size changes re-grid; the old grid keeps drawing meanwhile. */
        let (w, h) = drawer.size();
        surface.resize(w, h);
        renderer.resize(w, h);

        /* 2) Inputs */
        if drawer.a_pressed_once() {
            active = !active;
            renderer.set_active(active, now);
        }
        let pointer = drawer.mouse_pos();
        if let Some((mx, my)) = pointer {
            renderer.pointer_move(mx, my, now);
            if drawer.left_clicked() {
                renderer.pointer_click(mx, my, now);
            }
        }

        /* 3) Draw the halftone, then the overlays. */
        renderer.frame(now, &mut surface);

        let fb = surface.frame_mut();
        if let Some((mx, my)) = pointer {
            draw_crosshair(fb, mx as i32, my as i32, 8, 0x00_AD_4D_37);
        }
        let hud = format!(
            "{} | RIPPLES: {} | {}",
            lifecycle_tag(renderer.lifecycle()),
            renderer.ripple_count(),
            hud_fps_text
        );
        draw_text_5x7(fb, 8, 8, &hud, 0x00_FF_FF_FF);

        /* 4) Present */
        drawer.present(surface.frame())?;

        /* 5) FPS counter (log + HUD once per second) */
        frames_this_second += 1;
        let wall = Instant::now();
        if wall.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = wall.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            info!("FPS: {fps:.1}");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = wall;
        }
    }

    renderer.unmount();
    Ok(())
}
