mod scene;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use kelpo_engine::backend::software::SoftwareBackend;
use kelpo_engine::logging::{init_logging, LoggingConfig};
use kelpo_engine::text::{append_text, character_height, text_width, FontAtlas};
use kelpo_engine::time::FrameClock;
use kelpo_engine::transform::{
    clip_space_matrix, duplicate, project_to_screen, rotate, screen_space_matrix, translate,
};
use kelpo_engine::window::{Key, WindowMessage};
use kelpo_engine::{Batch, ErrorChannel, ErrorRecord, InitParams, Registry, TextureRegistry, Triangle};

/// Rotating cube on any kelpo backend.
#[derive(Parser, Debug)]
#[command(name = "kelpo-studio", version, about = "Rotating cube demo for the kelpo renderer interface")]
struct Args {
    /// Backend to render with ("software" or "wgpu")
    #[arg(short, long, default_value = "wgpu")]
    renderer: String,

    /// Render width in pixels
    #[arg(short, long, default_value_t = 640, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    /// Render height in pixels
    #[arg(short = 'H', long, default_value_t = 480, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Bits per pixel
    #[arg(short, long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    bpp: u32,

    /// 1 to request vsync, 0 to request it off
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    vsync: u8,

    /// Render device, counting from 1
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    device: u32,

    /// Font atlas: headerless square RGB888 image, 16x16 glyphs from ' '
    #[arg(long)]
    font: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Log filter in env_logger syntax (overrides RUST_LOG)
    #[arg(long)]
    log: Option<String>,
}

const INFO_SCALE: f32 = 1.3;
const MOUSE_SENSITIVITY: f32 = 300.0;
const ZOOM_STEP: f32 = 0.05;

/// Input-driven view state, shared with the message handler.
#[derive(Debug)]
struct Controls {
    rot_x: f32,
    rot_y: f32,
    zoom: f32,
    last_pointer: Option<(f32, f32)>,
    quit: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            rot_x: 0.0,
            rot_y: 0.0,
            zoom: 4.7,
            last_pointer: None,
            quit: false,
        }
    }
}

impl Controls {
    fn apply(&mut self, message: &WindowMessage) {
        match *message {
            WindowMessage::PointerMoved { x, y } => {
                if let Some((px, py)) = self.last_pointer {
                    self.rot_y -= (px - x) / MOUSE_SENSITIVITY;
                    self.rot_x += (py - y) / MOUSE_SENSITIVITY;
                }
                self.last_pointer = Some((x, y));
            }
            WindowMessage::KeyPressed(Key::ArrowUp) => self.zoom -= ZOOM_STEP,
            WindowMessage::KeyPressed(Key::ArrowDown) => self.zoom += ZOOM_STEP,
            WindowMessage::KeyPressed(Key::Escape) => self.quit = true,
            WindowMessage::Focused(false) => self.last_pointer = None,
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.clone().map(LoggingConfig::with_filter).unwrap_or_default());

    let registry = Registry::with_builtin_backends();
    let mut errors = ErrorChannel::new();

    let Some(mut interface) = registry.create_interface(&args.renderer, &mut errors) else {
        drain_errors(&mut errors);
        let available: Vec<&str> = registry.backend_names().collect();
        bail!("unknown renderer '{}' (available: {})", args.renderer, available.join(", "));
    };

    let params = InitParams {
        width: args.width,
        height: args.height,
        bits_per_pixel: args.bpp,
        vsync: args.vsync != 0,
        device_index: args.device - 1,
    };
    if !interface.initialize(&params, &mut errors) {
        let cause = drain_errors(&mut errors).pop();
        bail!(
            "could not initialize the '{}' renderer: {}",
            args.renderer,
            cause.map_or_else(|| "no error recorded".to_string(), |r| r.to_string())
        );
    }
    drain_errors(&mut errors);
    log::info!(
        "{} {} running at {}x{}x{}",
        interface.name(),
        interface.version(),
        params.width,
        params.height,
        params.bits_per_pixel
    );

    let controls = Rc::new(RefCell::new(Controls::default()));
    let handler_controls = Rc::clone(&controls);
    interface.set_message_handler(
        Box::new(move |message: &WindowMessage| handler_controls.borrow_mut().apply(message)),
        &mut errors,
    );

    let mut textures = TextureRegistry::new();
    let font = match &args.font {
        Some(path) => FontAtlas::load(path, &mut textures)
            .with_context(|| format!("failed to load font atlas {}", path.display()))?,
        None => FontAtlas::register(scene::block_font()?, &mut textures),
    };
    let checker = textures.insert(scene::checker_texture()?);

    for (id, texture) in textures.iter() {
        interface.upload_texture(id, texture, &mut errors);
    }
    // The backend holds its own copies now.
    for id in [font.texture(), checker] {
        if let Some(texture) = textures.get_mut(id) {
            texture.release_pixels();
        }
    }

    let source = scene::cube(checker)?;
    let mut world = Batch::with_capacity(source.len());
    let mut screen = Batch::with_capacity(source.len() + 128);

    let clip = clip_space_matrix(60f32.to_radians(), params.aspect_ratio(), 0.1, 100.0);
    let screen_matrix = screen_space_matrix(params.width as f32, params.height as f32);
    let mut clock = FrameClock::new();
    let mut frames = 0u64;

    while interface.is_open() {
        interface.process_events(&mut errors);
        if controls.borrow().quit {
            break;
        }
        let time = clock.tick();

        let (rot_x, rot_y, zoom) = {
            let c = controls.borrow();
            (c.rot_x, c.rot_y, c.zoom)
        };

        world.clear();
        screen.clear();
        duplicate(&source, &mut world)?;
        rotate(&mut world, rot_x, rot_y, 0.0);
        translate(&mut world, 0.0, 0.0, zoom);
        project_to_screen(&world, &mut screen, &clip, &screen_matrix)?;

        draw_overlay(&mut screen, &font, interface.name(), time.fps.min(999), &params)?;

        interface.clear_frame(&mut errors);
        interface.draw_triangles(screen.as_slice(), &mut errors);
        interface.flip_surface(&mut errors);
        drain_errors(&mut errors);

        frames += 1;
        if args.frames.is_some_and(|limit| frames >= limit) {
            break;
        }
    }

    if let Some(software) = interface.backend().as_any().downcast_ref::<SoftwareBackend>() {
        log::info!("software backend presented {} frames", software.frames_presented());
    }

    interface.release(&mut errors);
    drain_errors(&mut errors);
    log::info!("rendered {frames} frames");
    Ok(())
}

/// Renderer name, FPS and usage lines, in screen space.
fn draw_overlay(
    screen: &mut Batch<Triangle>,
    font: &FontAtlas,
    renderer: &str,
    fps: u32,
    params: &InitParams,
) -> Result<()> {
    append_text(screen, font, renderer, 25.0, 30.0, [255, 255, 255, 255], 1.0)?;
    append_text(screen, font, &format!("FPS: {fps}"), 25.0, 60.0, [200, 200, 200, 255], 1.0)?;

    let (width, height) = (params.width as f32, params.height as f32);
    let lines = [
        ("Mouse rotates", height - 100.0 - 10.0 - character_height()),
        ("Up/down arrows zoom", height - 100.0),
    ];
    for (line, y) in lines {
        let x = (width - text_width(line, INFO_SCALE)) / 2.0;
        append_text(screen, font, line, x, y, [255, 255, 0, 255], INFO_SCALE)?;
    }
    Ok(())
}

/// Empties the channel. Records were already logged when they were queued.
fn drain_errors(errors: &mut ErrorChannel) -> Vec<ErrorRecord> {
    let drained = errors.drain();
    if !drained.is_empty() {
        log::debug!("drained {} renderer errors", drained.len());
    }
    drained
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_motion_rotates_relative_to_last_position() {
        let mut c = Controls::default();
        c.apply(&WindowMessage::PointerMoved { x: 100.0, y: 100.0 });
        assert_eq!((c.rot_x, c.rot_y), (0.0, 0.0));

        c.apply(&WindowMessage::PointerMoved { x: 130.0, y: 70.0 });
        assert!((c.rot_y - 0.1).abs() < 1e-6);
        assert!((c.rot_x - 0.1).abs() < 1e-6);
    }

    #[test]
    fn arrows_zoom_and_escape_quits() {
        let mut c = Controls::default();
        c.apply(&WindowMessage::KeyPressed(Key::ArrowUp));
        c.apply(&WindowMessage::KeyPressed(Key::ArrowUp));
        c.apply(&WindowMessage::KeyPressed(Key::ArrowDown));
        assert!((c.zoom - 4.65).abs() < 1e-5);
        assert!(!c.quit);

        c.apply(&WindowMessage::KeyPressed(Key::Escape));
        assert!(c.quit);
    }

    #[test]
    fn args_map_device_and_size_flags() {
        let args = Args::parse_from(["kelpo-studio", "-r", "software", "-w", "320", "-H", "200", "-d", "2", "-v", "0"]);
        assert_eq!(args.renderer, "software");
        assert_eq!((args.width, args.height, args.device, args.vsync), (320, 200, 2, 0));
        assert!(Args::try_parse_from(["kelpo-studio", "-d", "0"]).is_err());
    }

    #[test]
    fn headless_run_draws_cube_and_overlay() {
        let registry = Registry::with_builtin_backends();
        let mut errors = ErrorChannel::new();
        let mut interface = registry.create_interface("software", &mut errors).unwrap();
        let params = InitParams {
            width: 320,
            height: 240,
            bits_per_pixel: 32,
            vsync: false,
            device_index: 0,
        };
        assert!(interface.initialize(&params, &mut errors));

        let mut textures = TextureRegistry::new();
        let font = FontAtlas::register(scene::block_font().unwrap(), &mut textures);
        let checker = textures.insert(scene::checker_texture().unwrap());
        for (id, texture) in textures.iter() {
            assert!(interface.upload_texture(id, texture, &mut errors));
        }

        let source = scene::cube(checker).unwrap();
        let (mut world, mut screen) = (Batch::new(), Batch::new());
        duplicate(&source, &mut world).unwrap();
        rotate(&mut world, 0.4, 0.6, 0.0);
        translate(&mut world, 0.0, 0.0, 4.7);
        let stats = project_to_screen(
            &world,
            &mut screen,
            &clip_space_matrix(60f32.to_radians(), params.aspect_ratio(), 0.1, 100.0),
            &screen_space_matrix(320.0, 240.0),
        )
        .unwrap();
        assert_eq!(stats.projected, 12);
        draw_overlay(&mut screen, &font, "software", 60, &params).unwrap();

        assert!(interface.clear_frame(&mut errors));
        assert!(interface.draw_triangles(screen.as_slice(), &mut errors));
        assert!(interface.flip_surface(&mut errors));
        assert!(errors.is_empty());

        let backend = interface.backend().as_any().downcast_ref::<SoftwareBackend>().unwrap();
        let frame = backend.front_buffer().unwrap();
        assert_ne!(frame.pixel(160, 120), Some([0, 0, 0, 255]));
    }
}
