//! Protocol and map geometry constants shared by the client crates.

// =============================================================================
// Layers and floor bands
// =============================================================================

/// Face layers that make up one floor band.
pub const LAYERS_PER_FLOOR: usize = 3;

/// Floor bands: the ground floor (0) plus six additional bands.
pub const FLOOR_COUNT: usize = 7;

/// Additional floor bands on top of the ground floor.
pub const MAX_ADDITIONAL_FLOORS: usize = FLOOR_COUNT - 1;

/// Total face layers per map square: `3 + 3 * MAX_ADDITIONAL_FLOORS`.
pub const NUM_LAYERS: usize = LAYERS_PER_FLOOR + LAYERS_PER_FLOOR * MAX_ADDITIONAL_FLOORS;

/// The upper floor bands addressed by carve/erase commands are numbered 1..=3
/// and live in bands 4..=6.
pub const UPPER_FLOOR_BASE: usize = 3;
pub const MAX_UPPER_FLOOR: u8 = 3;

const _: () = {
    assert!(NUM_LAYERS == 21);
    assert!(UPPER_FLOOR_BASE + MAX_UPPER_FLOOR as usize == MAX_ADDITIONAL_FLOORS);
};

// =============================================================================
// Map square defaults
// =============================================================================

/// Darkness of a square that has never received a darkness update.
pub const DEFAULT_DARKNESS: u8 = 255;

/// Smoothing value meaning "no smoothing".
pub const DEFAULT_SMOOTH: u8 = 0;

/// Bits of a magic map byte that carry the colour index.
pub const FACE_COLOR_MASK: u8 = 0x0F;

/// Face numbers of top-part faces are shifted by this amount.
pub const TOP_PART_FACE_OFFSET: u32 = 10_000;

// =============================================================================
// Map view
// =============================================================================

pub const DEFAULT_MAP_WIDTH: usize = 17;
pub const DEFAULT_MAP_HEIGHT: usize = 13;
