//! Tiling of permutable bands.
//!
//! A tiled band becomes
//!
//! ```text
//! mark: "<identifier> - Tiles"
//!   band: floor(e/s) ...
//!     mark: "<identifier> - Points"
//!       band: e mod s ...
//! ```
//!
//! Boundary tiles are clipped by the iteration domain, so every instance is
//! still scheduled exactly once.

use schedule_tree::{AstOption, ScheduleNode};

use crate::config::{TilingLevel, tile_sizes};

/// Tile every member of a permutable band.
///
/// Member `d` uses `sizes[d]`, or `default_size` past the end of `sizes`.
/// Returns the cursor at the point band.
pub fn tile(node: ScheduleNode, identifier: &str, sizes: &[i64], default_size: i64) -> ScheduleNode {
    let Some(band) = node.band() else {
        panic!("tile applied to a {} node", node.kind())
    };
    assert!(
        band.is_permutable(),
        "tile applied to a band with non-permutable members"
    );
    let sizes = tile_sizes(band.n_member(), sizes, default_size);
    tracing::debug!(identifier, ?sizes, path = ?node.path(), "tiling band");

    node.band_tile(&sizes)
        .insert_mark(format!("{identifier} - Tiles"))
        .child(0)
        .child(0)
        .insert_mark(format!("{identifier} - Points"))
        .child(0)
}

/// Tile for registers and fully unroll the point loops.
pub fn apply_register_tiling(node: ScheduleNode, sizes: &[i64], default_size: i64) -> ScheduleNode {
    let identifier = TilingLevel::Register.to_string();
    tile(node, &identifier, sizes, default_size).band_set_ast_option(AstOption::Unroll)
}
