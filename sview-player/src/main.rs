//! # sView
//!
//! Host executable: loads a renderer (stereo output) and a drawer
//! (application) plugin and drives them from one frame loop.
//!
//! ```text
//! renderer.callback() ──► AppContext::post_window_messages
//!                              │
//!            MessageList::drain ▼
//!   RootWidget::handle_messages + drawer.parse_callback
//!                              │
//!   RootWidget::update / draw, drawer.stgl_draw(Left, Right)
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sview_core::geometry::RectI;
use sview_core::plugin::{
    DrawView, Drawer, DrawerInterface, OpenInfo, PluginKind, PluginRegistry, Renderer, RendererInterface, Window,
};
use sview_core::queues::WindowMessage;
use sview_core::widgets::{PtsClock, RootWidget, SubtitlesView};
use sview_core::{AppContext, ViewerConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sview=debug";

#[derive(Debug, Default, PartialEq)]
struct Options {
    config: Option<PathBuf>,
    renderer: Option<PathBuf>,
    drawer: Option<PathBuf>,
    window: Option<PathBuf>,
    device: Option<i32>,
    list_plugins: Option<PathBuf>,
    file: Option<PathBuf>,
    ignored: Vec<String>,
}

impl Options {
    fn from_args(args: &[String]) -> Result<Self> {
        let mut options = Self::default();
        let mut i = 1;
        while i < args.len() {
            let next = args.get(i + 1);
            let path = |name: &str| {
                next.map(PathBuf::from)
                    .ok_or_else(|| anyhow::anyhow!("Missing value for {}", name))
            };
            match args[i].as_str() {
                "--config" | "-c" => options.config = Some(path("--config")?),
                "--renderer" | "-r" => options.renderer = Some(path("--renderer")?),
                "--drawer" | "-d" => options.drawer = Some(path("--drawer")?),
                "--window" | "-w" => options.window = Some(path("--window")?),
                "--list-plugins" => options.list_plugins = Some(path("--list-plugins")?),
                "--device" => {
                    let raw = next.ok_or_else(|| anyhow::anyhow!("Missing value for --device"))?;
                    options.device = Some(
                        raw.parse::<i32>()
                            .map_err(|e| anyhow::anyhow!("Invalid device {}: {}", raw, e))?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    options.ignored.push(other.to_string());
                    i += 1;
                    continue;
                }
                other => {
                    options.file = Some(PathBuf::from(other));
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }
        Ok(options)
    }
}

fn print_usage() {
    println!("Usage: sview [options] [FILE]");
    println!();
    println!("  -c, --config FILE       viewer configuration (JSON)");
    println!("  -r, --renderer PLUGIN   stereo output plugin (path or name)");
    println!("  -d, --drawer PLUGIN     application plugin (path or name)");
    println!("  -w, --window LIBRARY    window library, enables pointer input");
    println!("      --device N          output device, -1 picks automatically");
    println!("      --list-plugins DIR  list the plugins found in DIR and exit");
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let options = Options::from_args(&args)?;

    // read the config first so its filter applies, report failures once logging is up
    let config = ViewerConfig::load_or_default(options.config.as_deref());
    let filter = config
        .as_ref()
        .map(|c| c.log_filter.as_str())
        .unwrap_or(DEFAULT_LOG_FILTER);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("sView v{}", sview_core::VERSION);
    for option in &options.ignored {
        tracing::warn!("Ignoring unknown option {}", option);
    }

    if let Some(dir) = &options.list_plugins {
        list_plugins(dir);
        return Ok(());
    }

    let mut config = config.context("Failed to load configuration")?;
    if let Some(device) = options.device {
        config.device = device;
    }
    let module = config.settings_set.clone();
    let mut ctx = AppContext::new(config, &module);

    let renderer_path = plugin_path(&ctx, PluginKind::Renderer, options.renderer.as_deref(), "--renderer")?;
    let drawer_path = plugin_path(&ctx, PluginKind::Drawer, options.drawer.as_deref(), "--drawer")?;

    let mut renderer = Renderer::load(&renderer_path)
        .with_context(|| format!("Failed to load renderer {}", renderer_path.display()))?;
    if let Some(about) = renderer.about_info() {
        tracing::info!("Renderer: {}", about);
    }
    let mut drawer =
        Drawer::load(&drawer_path).with_context(|| format!("Failed to load drawer {}", drawer_path.display()))?;

    renderer.init(ctx.config().device, std::ptr::null_mut())?;
    drawer.init(renderer.window_instance())?;
    if let Some(file) = &options.file {
        drawer.open(&OpenInfo::from_path(file))?;
    }

    // pointer input needs the window library the renderer was built against
    let window = match &options.window {
        Some(path) => {
            let library = ctx.load_window_library(path)?;
            Some(unsafe { Window::borrowed(library, renderer.window_instance()) }?)
        }
        None => None,
    };

    run(&ctx, &mut renderer, &mut drawer, window.as_ref())
}

fn plugin_path(ctx: &AppContext, kind: PluginKind, arg: Option<&Path>, flag: &str) -> Result<PathBuf> {
    let configured = match kind {
        PluginKind::Renderer => ctx.config().renderer.as_deref(),
        _ => ctx.config().drawer.as_deref(),
    };
    let name = arg
        .or(configured)
        .ok_or_else(|| anyhow::anyhow!("No {:?} plugin, pass {} or set it in the config", kind, flag))?;
    ctx.resolve_plugin(kind, name)
        .ok_or_else(|| anyhow::anyhow!("{:?} plugin {} not found", kind, name.display()))
}

fn list_plugins(dir: &Path) {
    let registry = PluginRegistry::scan(dir);
    for plugin in registry.plugins() {
        println!("{}  {:?}", plugin.path.display(), plugin.kinds);
    }
    for (path, reason) in registry.broken() {
        println!("{}  unusable: {}", path.display(), reason);
    }
}

fn run(ctx: &AppContext, renderer: &mut Renderer, drawer: &mut Drawer, window: Option<&Window>) -> Result<()> {
    let started = Instant::now();
    let frame_time = Duration::from_secs_f64(1.0 / ctx.config().target_fps.max(1.0));
    let mut root = ctx.create_root();

    let clock_start = started;
    let clock: PtsClock = Arc::new(move || clock_start.elapsed().as_secs_f64());
    let root_id = root.id();
    SubtitlesView::create(root.tree_mut(), root_id, ctx.subtitles().clone(), clock)?;

    let mut frames: u64 = 0;
    loop {
        let frame_start = Instant::now();
        let now = started.elapsed().as_secs_f64();

        let events = renderer.callback(&[]);
        ctx.post_window_messages(&events, now);
        let messages = ctx.window_messages().drain(now);
        if messages.first() == Some(&WindowMessage::Exit) {
            tracing::info!("Exit requested after {} frames", frames);
            break;
        }
        if messages.contains(&WindowMessage::Resize) {
            if let Some(window) = window {
                let placement = window.placement();
                root.resize(RectI::from_xywh(0, 0, placement.width(), placement.height()));
            }
        }

        if let Some(window) = window {
            root.mouse_move(window.mouse_pos());
            transfer_clicks(window, &root, &messages);
        }
        root.handle_messages(&messages, now);
        drawer.parse_callback(&messages);

        root.show_messages(ctx.messages())?;
        root.update(now);

        let overlay = root.draw();
        tracing::trace!("Overlay: {} draw command(s)", overlay.len());
        for view in [DrawView::Left, DrawView::Right] {
            drawer.stgl_draw(view);
            renderer.stgl_draw(view);
        }

        if ctx.translations().take_reloaded() {
            tracing::debug!("Translations reloaded");
        }

        frames += 1;
        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    Ok(())
}

/// Move one click from the window per `MouseDownQueued` / `MouseUpQueued`
/// announcement, so the root replays them in the order they arrived.
fn transfer_clicks(window: &Window, root: &RootWidget, messages: &[WindowMessage]) {
    for message in messages {
        let (click, queue) = match message {
            WindowMessage::MouseDownQueued => (window.mouse_down(), root.mouse_down_queue()),
            WindowMessage::MouseUpQueued => (window.mouse_up(), root.mouse_up_queue()),
            _ => continue,
        };
        if let Some((point, button)) = click {
            if !queue.push(point, button.id()) {
                tracing::debug!("Click queue full, dropped {:?} click", button);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sview").chain(list.iter().copied()).map(String::from).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = Options::from_args(&args(&[
            "-r",
            "StOutAnaglyph",
            "--drawer",
            "/opt/sview/StImageViewer.so",
            "--device",
            "2",
            "photo.jps",
        ]))
        .unwrap();
        assert_eq!(options.renderer, Some(PathBuf::from("StOutAnaglyph")));
        assert_eq!(options.drawer, Some(PathBuf::from("/opt/sview/StImageViewer.so")));
        assert_eq!(options.device, Some(2));
        assert_eq!(options.file, Some(PathBuf::from("photo.jps")));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Options::from_args(&args(&["--renderer"])).is_err());
        assert!(Options::from_args(&args(&["--device", "left"])).is_err());
        assert_eq!(Options::from_args(&args(&[])).unwrap(), Options::default());
        let options = Options::from_args(&args(&["--fullscreen", "a.jps"])).unwrap();
        assert_eq!(options.ignored, vec!["--fullscreen".to_string()]);
        assert_eq!(options.file, Some(PathBuf::from("a.jps")));
    }
}
