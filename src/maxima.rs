use crate::{grid::Grid, swatch::Swatch};
use palette::IntoColor;

/// Offsets to every cell in the 3x3x3 block around a cell, the cell itself included.
const NEIGHBOUR_OFFSETS: [(isize, isize, isize); 27] = [
    (0, 0, 0),
    (0, 0, 1),
    (0, 0, -1),
    (0, 1, 0),
    (0, 1, 1),
    (0, 1, -1),
    (0, -1, 0),
    (0, -1, 1),
    (0, -1, -1),
    (1, 0, 0),
    (1, 0, 1),
    (1, 0, -1),
    (1, 1, 0),
    (1, 1, 1),
    (1, 1, -1),
    (1, -1, 0),
    (1, -1, 1),
    (1, -1, -1),
    (-1, 0, 0),
    (-1, 0, 1),
    (-1, 0, -1),
    (-1, 1, 0),
    (-1, 1, 1),
    (-1, 1, -1),
    (-1, -1, 0),
    (-1, -1, 1),
    (-1, -1, -1),
];

/// A cell of the color cube that no neighbouring cell has more hits than.
///
/// The color is the average of every pixel that landed in the cell, each channel within 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalMaximum {
    hit_count: u64,
    cell_index: usize,
    red: f64,
    green: f64,
    blue: f64,
    rgb: (u8, u8, u8),
}

impl LocalMaximum {
    pub fn hit_count(self) -> u64 {
        self.hit_count
    }

    /// Flat index of the cell in the color cube.
    pub fn cell_index(self) -> usize {
        self.cell_index
    }

    pub fn color(self) -> (f64, f64, f64) {
        (self.red, self.green, self.blue)
    }

    /// The HSV value of the average color.
    pub fn brightness(self) -> f32 {
        let rgb = palette::Srgb::new(self.red as f32, self.green as f32, self.blue as f32);
        let hsv: palette::Hsv = rgb.into_color();
        let (_, _, value) = hsv.into_components();

        value
    }

    /// Euclidean distance to another color in normalized RGB space.
    pub fn distance_to(self, (red, green, blue): (f64, f64, f64)) -> f64 {
        let red_delta = self.red - red;
        let green_delta = self.green - green;
        let blue_delta = self.blue - blue;

        (red_delta * red_delta + green_delta * green_delta + blue_delta * blue_delta).sqrt()
    }

    /// The average color scaled to 8 bits per channel. The channels are truncated, not rounded.
    pub fn rgb(self) -> (u8, u8, u8) {
        self.rgb
    }

    pub fn to_swatch(self) -> Swatch {
        Swatch::new(self.rgb, self.hit_count)
    }

    #[cfg(test)]
    pub(crate) fn new(hit_count: u64, (red, green, blue): (f64, f64, f64)) -> Self {
        let to_u8 = |channel: f64| (channel * 255.0) as u8;

        Self {
            hit_count,
            cell_index: 0,
            red,
            green,
            blue,
            rgb: (to_u8(red), to_u8(green), to_u8(blue)),
        }
    }
}

/// Find every local maximum in the grid, most hits first. Maxima with an equal hit count stay in grid traversal
/// order: ascending red, then green, then blue.
pub(crate) fn find_local_maxima(grid: &Grid) -> Vec<LocalMaximum> {
    #[cfg(feature = "threads")]
    let mut maxima = {
        use rayon::prelude::*;

        (0..grid.resolution())
            .into_par_iter()
            .flat_map_iter(|r| scan_slab(grid, r))
            .collect::<Vec<_>>()
    };

    #[cfg(not(feature = "threads"))]
    let mut maxima = (0..grid.resolution())
        .flat_map(|r| scan_slab(grid, r))
        .collect::<Vec<_>>();

    // stable, so ties keep the traversal order
    maxima.sort_by(|a, b| b.hit_count.cmp(&a.hit_count));
    maxima
}

/// Scan every cell with the given red coordinate.
fn scan_slab(grid: &Grid, r: usize) -> impl Iterator<Item = LocalMaximum> + '_ {
    let resolution = grid.resolution();

    (0..resolution)
        .flat_map(move |g| (0..resolution).map(move |b| (g, b)))
        .filter_map(move |(g, b)| {
            let cell_index = grid.index(r, g, b);
            let cell = grid.cells()[cell_index];

            // average() and rgb() are None for cells without hits, which are never maxima
            let (red, green, blue) = cell.average()?;
            let rgb = cell.rgb()?;

            is_local_maximum(grid, (r, g, b), cell.hit_count()).then(|| LocalMaximum {
                hit_count: cell.hit_count(),
                cell_index,
                red,
                green,
                blue,
                rgb,
            })
        })
}

fn is_local_maximum(grid: &Grid, (r, g, b): (usize, usize, usize), hit_count: u64) -> bool {
    NEIGHBOUR_OFFSETS.iter().all(|&(dr, dg, db)| {
        match (
            offset(r, dr, grid.resolution()),
            offset(g, dg, grid.resolution()),
            offset(b, db, grid.resolution()),
        ) {
            (Some(nr), Some(ng), Some(nb)) => grid.cells()[grid.index(nr, ng, nb)].hit_count() <= hit_count,
            // neighbours outside the cube don't exist
            _ => true,
        }
    })
}

fn offset(coordinate: usize, delta: isize, resolution: usize) -> Option<usize> {
    coordinate
        .checked_add_signed(delta)
        .filter(|&coordinate| coordinate < resolution)
}
