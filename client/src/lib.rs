//! Client-side map state: the visible grid, its animations and the updater
//! that applies server map commands to them.

pub mod animations;
pub mod commands;
pub mod faces;
pub mod floor;
pub mod gui_state;
pub mod listeners;
pub mod map;
pub mod map_updater;
pub mod settings;
pub mod tick;
pub mod visible_animations;
