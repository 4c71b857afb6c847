//! Tile planning for the chunked resampler.
//!
//! The source raster is cut into tiles of at most `tile_size` cells per axis.
//! Every tile edge is projected onto the destination axis and rounded, which
//! gives each tile the destination rectangle it is responsible for. Tiles
//! whose projected rectangle would be empty are merged into a neighbour, so
//! the resulting source ranges still partition the source and the destination
//! ranges partition the destination.

use std::ops::Range;

use crate::interpolation::AxisMapping;

/// A rectangular partition of one resample operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub source_rows: Range<usize>,
    pub source_cols: Range<usize>,
    pub dest_rows: Range<usize>,
    pub dest_cols: Range<usize>,
}

impl Tile {
    /// Number of destination cells written by this tile
    pub fn dest_len(&self) -> usize {
        self.dest_rows.len() * self.dest_cols.len()
    }
}

/// One axis of a tile plan: matching source and destination ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisSegment {
    pub source: Range<usize>,
    pub dest: Range<usize>,
}

/// Split one axis into segments of at most `tile_size` source cells.
///
/// A segment grows beyond `tile_size` only when its nominal edge would
/// project onto an empty destination range.
pub fn plan_axis(mapping: &AxisMapping, dest_len: usize, tile_size: usize) -> Vec<AxisSegment> {
    let source_len = mapping.source_len;

    // (source edge, destination edge), strictly increasing in both
    let mut edges: Vec<(usize, usize)> = vec![(0, 0)];
    let mut edge = tile_size;
    while edge < source_len {
        let projected = mapping
            .dest_coordinate(edge)
            .round()
            .clamp(0.0, dest_len as f64) as usize;
        let last_dest = edges.last().map_or(0, |&(_, d)| d);
        if projected > last_dest && projected < dest_len {
            edges.push((edge, projected));
        }
        edge += tile_size;
    }
    edges.push((source_len, dest_len));

    edges
        .windows(2)
        .map(|pair| AxisSegment {
            source: pair[0].0..pair[1].0,
            dest: pair[0].1..pair[1].1,
        })
        .collect()
}

/// Plan the tiles of a resample operation, row-major
pub fn plan_tiles(
    rows: &AxisMapping,
    cols: &AxisMapping,
    dest_shape: (usize, usize),
    tile_size: usize,
) -> Vec<Tile> {
    let row_segments = plan_axis(rows, dest_shape.0, tile_size);
    let col_segments = plan_axis(cols, dest_shape.1, tile_size);

    row_segments
        .iter()
        .flat_map(|row| {
            col_segments.iter().map(move |col| Tile {
                source_rows: row.source.clone(),
                source_cols: col.source.clone(),
                dest_rows: row.dest.clone(),
                dest_cols: col.dest.clone(),
            })
        })
        .collect()
}
