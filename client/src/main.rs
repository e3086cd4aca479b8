use std::collections::BTreeSet;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};

use client::commands::{apply_packet, parse_packets};
use client::faces::FaceCache;
use client::listeners::{MapListener, MapScrollListener};
use client::map::{GameMap, MapPos};
use client::map_updater::MapUpdater;
use client::settings::{load_settings_from_disk, settings_path};
use client::tick::TickScheduler;
use wg_core::constants::LAYERS_PER_FLOOR;

#[derive(Default)]
struct ReplayStats {
    batches: AtomicUsize,
    squares: AtomicUsize,
}

impl MapListener for ReplayStats {
    fn map_changed(&self, _map: &GameMap, squares: &BTreeSet<MapPos>) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.squares.fetch_add(squares.len(), Ordering::Relaxed);
    }
}

impl MapScrollListener for ReplayStats {
    fn map_scrolled(&self, dx: i32, dy: i32) {
        log::debug!("view scrolled by ({dx}, {dy})");
    }
}

/// One line per row; each square shows the topmost ground floor face.
fn render_ground(map: &GameMap) -> String {
    let mut out = String::new();
    for y in 0..map.height() as i32 {
        for x in 0..map.width() as i32 {
            let face = (0..LAYERS_PER_FLOOR)
                .rev()
                .find_map(|layer| map.face(x, y, layer));
            match face {
                Some(face) => {
                    let _ = write!(out, "{:>6}", face.face_num);
                }
                None => out.push_str("     ."),
            }
        }
        out.push('\n');
    }
    out
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(script_path) = args.get(1) else {
        bail!("usage: wg-map-replay <script.json> [settings.json]");
    };

    let settings_file = settings_path(args.get(2).map(String::as_str));
    let settings = load_settings_from_disk(&settings_file);
    wg_core::initialize_logger(
        wg_core::parse_level_filter(&settings.log_level),
        settings.log_file.as_deref(),
    )?;

    log::info!(
        "replaying {script_path} (settings={}, logfile={})",
        settings_file.display(),
        settings.log_file.as_deref().unwrap_or("none")
    );

    let json = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read replay script {script_path}"))?;
    let packets =
        parse_packets(&json).with_context(|| format!("invalid replay script {script_path}"))?;

    let faces = Arc::new(FaceCache::new());
    let updater = Arc::new(MapUpdater::new(faces.clone()));
    faces.add_listener(&updater);

    let stats = Arc::new(ReplayStats::default());
    updater.add_map_listener(stats.clone());
    updater.add_map_scroll_listener(stats.clone());
    updater.new_map(settings.map_width, settings.map_height);

    let interval = Duration::from_millis(settings.tick_interval_ms.max(1));
    let mut ticks = TickScheduler::spawn(updater.clone(), interval)
        .context("failed to start the tick thread")?;

    for packet in &packets {
        log::trace!("applying {packet:?}");
        apply_packet(&updater, &faces, packet);
    }
    thread::sleep(interval * settings.ticks_after_replay);
    let tick_count = ticks.stop();

    log::info!(
        "replayed {} packets over {tick_count} ticks: {} map batches, {} squares changed, {} animations playing",
        packets.len(),
        stats.batches.load(Ordering::Relaxed),
        stats.squares.load(Ordering::Relaxed),
        updater.visible_animation_count()
    );

    print!("{}", updater.with_map(render_ground));
    Ok(())
}
