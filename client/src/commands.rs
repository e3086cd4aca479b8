//! Decoded map packets and how they are applied to a [`MapUpdater`].
//!
//! The wire decoding lives in the network layer; these types are what it
//! produces. They also serialize to JSON so recorded sessions can be replayed
//! without a server.

use serde::{Deserialize, Serialize};
use wg_core::types::{Face, Location};

use crate::faces::FaceCache;
use crate::gui_state::GuiState;
use crate::map_updater::{MapBatch, MapUpdater};

fn one() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapPacket {
    /// The server switched maps.
    NewMap { width: usize, height: usize },
    AddAnimation {
        animation_id: u16,
        #[serde(default)]
        flags: u16,
        faces: Vec<u32>,
    },
    /// A face finished loading into the face cache.
    Face {
        face_num: u32,
        #[serde(default = "one")]
        width: u8,
        #[serde(default = "one")]
        height: u8,
    },
    /// One game tick of the animation clock.
    Tick { tick_no: u32 },
    Gui { state: GuiState },
    /// A batch of map commands applied under one lock.
    Map {
        commands: Vec<MapCommand>,
        /// Notify map listeners even when nothing changed.
        #[serde(default)]
        always_process: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapCommand {
    /// Face 0 clears the layer.
    Face { x: i32, y: i32, layer: usize, face: u32 },
    Animation {
        x: i32,
        y: i32,
        layer: usize,
        animation_id: u16,
        /// 0 normal, 1 randomize, 2 synchronize.
        #[serde(default)]
        animation_type: u8,
    },
    AnimationSpeed { x: i32, y: i32, layer: usize, speed: u32 },
    Smooth { x: i32, y: i32, layer: usize, smooth: u8 },
    Darkness { x: i32, y: i32, floor: u8, darkness: u8 },
    Clear { x: i32, y: i32, floor: u8 },
    Scroll { dx: i32, dy: i32 },
    Carve { dx: i32, dy: i32, max_floor: u8 },
    EraseFloor { floor: u8 },
    MagicMap { x: i32, y: i32, rows: Vec<Vec<u8>> },
}

impl MapCommand {
    pub fn apply(&self, batch: &mut MapBatch<'_>) {
        match self {
            MapCommand::Face { x, y, layer, face } => {
                batch.map_face(Location::new(*x, *y, *layer), *face);
            }
            MapCommand::Animation {
                x,
                y,
                layer,
                animation_id,
                animation_type,
            } => {
                batch.map_animation(Location::new(*x, *y, *layer), *animation_id, *animation_type);
            }
            MapCommand::AnimationSpeed { x, y, layer, speed } => {
                batch.map_animation_speed(Location::new(*x, *y, *layer), *speed);
            }
            MapCommand::Smooth { x, y, layer, smooth } => {
                batch.map_smooth(Location::new(*x, *y, *layer), *smooth);
            }
            MapCommand::Darkness { x, y, floor, darkness } => {
                batch.map_darkness(*x, *y, *darkness, *floor);
            }
            MapCommand::Clear { x, y, floor } => batch.map_clear(*x, *y, *floor),
            MapCommand::Scroll { dx, dy } => batch.map_scroll(*dx, *dy),
            MapCommand::Carve { dx, dy, max_floor } => batch.carve_viewpoint(*dx, *dy, *max_floor),
            MapCommand::EraseFloor { floor } => batch.erase_floor(*floor),
            MapCommand::MagicMap { x, y, rows } => batch.magic_map(*x, *y, rows),
        }
    }
}

/// Applies one packet. Face packets go to `faces`, which forwards them to
/// its listeners.
pub fn apply_packet(updater: &MapUpdater, faces: &FaceCache, packet: &MapPacket) {
    match packet {
        MapPacket::NewMap { width, height } => updater.new_map(*width, *height),
        MapPacket::AddAnimation {
            animation_id,
            flags,
            faces: frames,
        } => updater.add_animation(*animation_id, *flags, frames),
        MapPacket::Face {
            face_num,
            width,
            height,
        } => faces.insert(Face::with_size(*face_num, *width, *height)),
        MapPacket::Tick { tick_no } => updater.tick(*tick_no),
        MapPacket::Gui { state } => updater.gui_state_changed(state),
        MapPacket::Map {
            commands,
            always_process,
        } => {
            let mut batch = updater.map_begin();
            for command in commands {
                command.apply(&mut batch);
            }
            batch.map_end(*always_process);
        }
    }
}

/// Parses a recorded session: a JSON array of packets.
pub fn parse_packets(json: &str) -> serde_json::Result<Vec<MapPacket>> {
    serde_json::from_str(json)
}
