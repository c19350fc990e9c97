use crate::{
    channel::{Channel, Sample, OPAQUE, WEIGHT_SCALE},
    Config, Error,
};

/// Minimum number of pixels handed to a single worker when accumulating in parallel.
#[cfg(feature = "threads")]
const MIN_PARALLEL_CHUNK: usize = 4096;

/// One cell of the color cube: how many pixels landed in it and the sum of their alpha-weighted channels.
///
/// The sums are kept as integers in units of `1 / 255²`, so averages are exact and don't depend on the order pixels
/// were added in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Cell {
    hit_count: u64,
    red_sum: u128,
    green_sum: u128,
    blue_sum: u128,
}

/// The color cube: a flat `resolution³` array of cells indexed by quantized RGB coordinates.
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    resolution: usize,
    cells: Vec<Cell>,
}

impl Cell {
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// The mean color of the pixels in this cell with channels in 0.0..=1.0, or `None` if the cell is empty.
    pub fn average(&self) -> Option<(f64, f64, f64)> {
        if self.hit_count == 0 {
            return None;
        }

        let scale = self.hit_count as f64 * WEIGHT_SCALE;
        Some((
            self.red_sum as f64 / scale,
            self.green_sum as f64 / scale,
            self.blue_sum as f64 / scale,
        ))
    }

    /// The mean color scaled to 8 bits per channel and truncated, or `None` if the cell is empty.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        if self.hit_count == 0 {
            return None;
        }

        let divisor = u128::from(self.hit_count) * u128::from(OPAQUE);
        // every weighted channel is at most 255², so the quotient is at most 255
        let channel = |sum: u128| (sum / divisor) as u8;

        Some((channel(self.red_sum), channel(self.green_sum), channel(self.blue_sum)))
    }

    fn add(&mut self, (red, green, blue): (u32, u32, u32)) {
        self.hit_count += 1;
        self.red_sum += u128::from(red);
        self.green_sum += u128::from(green);
        self.blue_sum += u128::from(blue);
    }

    #[cfg(feature = "threads")]
    fn merge(&mut self, other: &Cell) {
        self.hit_count += other.hit_count;
        self.red_sum += other.red_sum;
        self.green_sum += other.green_sum;
        self.blue_sum += other.blue_sum;
    }
}

impl Grid {
    /// Create an empty grid. The resolution must already have been validated.
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            cells: vec![Cell::default(); resolution * resolution * resolution],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn index(&self, r: usize, g: usize, b: usize) -> usize {
        r + g * self.resolution + b * self.resolution * self.resolution
    }

    #[cfg(test)]
    pub fn coordinates(&self, index: usize) -> (usize, usize, usize) {
        (
            index % self.resolution,
            index / self.resolution % self.resolution,
            index / (self.resolution * self.resolution),
        )
    }

    /// Map a normalized channel value onto one of the `resolution` buckets.
    pub fn bucket(&self, channel: f64) -> usize {
        // truncation is the floor since channels are never negative
        (channel * (self.resolution - 1) as f64) as usize
    }

    fn weighted_bucket(&self, weighted: u32) -> usize {
        self.bucket(weighted as f64 / WEIGHT_SCALE)
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Add every pixel of the stream to its cell, skipping the ones the brightness thresholds reject. Returns the
    /// number of pixels that were added.
    ///
    /// Accumulation is additive: the grid has to be cleared before starting a new analysis.
    pub fn accumulate<I, P, C>(&mut self, pixels: I, config: &Config) -> Result<usize, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        self.accumulate_from(0, pixels, config)
    }

    /// Same as [`Grid::accumulate`], but splits the slice over the rayon thread pool. Each worker fills a private
    /// grid and the partial grids are summed in slice order.
    #[cfg(feature = "threads")]
    pub fn accumulate_par<P, C>(&mut self, pixels: &[P], config: &Config) -> Result<usize, Error>
    where
        P: AsRef<[C]> + Sync,
        C: Channel,
    {
        use rayon::prelude::*;

        let chunk_size = pixels
            .len()
            .div_ceil(rayon::current_num_threads())
            .max(MIN_PARALLEL_CHUNK);

        if pixels.len() <= chunk_size {
            return self.accumulate(pixels, config);
        }

        let resolution = self.resolution;
        let partials = pixels
            .par_chunks(chunk_size)
            .enumerate()
            .map(|(i, chunk)| {
                let mut partial = Grid::new(resolution);
                partial
                    .accumulate_from(i * chunk_size, chunk, config)
                    .map(|added| (partial, added))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut total = 0;
        for (partial, added) in partials {
            for (cell, other) in self.cells.iter_mut().zip(partial.cells.iter()) {
                cell.merge(other);
            }
            total += added;
        }

        Ok(total)
    }

    fn accumulate_from<I, P, C>(&mut self, first_pixel: usize, pixels: I, config: &Config) -> Result<usize, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        let mut added = 0;
        let mut rejected = 0;

        for (i, pixel) in pixels.into_iter().enumerate() {
            let sample = Sample::from_channels(first_pixel + i, pixel.as_ref())?;

            if sample.is_darker_than(config.bright_threshold())
                || config
                    .dark_threshold()
                    .map_or(false, |threshold| sample.is_brighter_than(threshold))
            {
                rejected += 1;
                continue;
            }

            let color = sample.weighted();
            let index = self.index(
                self.weighted_bucket(color.0),
                self.weighted_bucket(color.1),
                self.weighted_bucket(color.2),
            );
            self.cells[index].add(color);
            added += 1;
        }

        log::trace!("accumulated {} pixels, rejected {} by brightness", added, rejected);
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unfiltered() -> Config {
        Config {
            bright_threshold: 0.0,
            ..Config::default()
        }
    }

    #[test]
    fn index_is_a_bijection() {
        let grid = Grid::new(4);
        let mut seen = vec![false; 64];

        for b in 0..4 {
            for g in 0..4 {
                for r in 0..4 {
                    let index = grid.index(r, g, b);
                    assert!(!seen[index]);
                    seen[index] = true;
                    assert_eq!(grid.coordinates(index), (r, g, b));
                }
            }
        }

        assert!(seen.into_iter().all(|s| s));
    }

    #[test]
    fn full_intensity_lands_in_last_bucket() {
        let grid = Grid::new(2);
        assert_eq!(grid.bucket(0.0), 0);
        assert_eq!(grid.bucket(0.99), 0);
        assert_eq!(grid.bucket(1.0), 1);
        assert_eq!(grid.weighted_bucket(255 * 255), 1);
        assert_eq!(grid.weighted_bucket(254 * 255), 0);

        let grid = Grid::new(30);
        assert_eq!(grid.bucket(1.0), 29);
    }

    #[test]
    fn weighted_buckets_match_plain_channels() {
        let grid = Grid::new(30);

        for channel in 0..=255u32 {
            assert_eq!(
                grid.weighted_bucket(channel * OPAQUE),
                grid.bucket(channel as f64 / 255.0)
            );
        }
    }

    #[test]
    fn accumulates_hits_and_sums() {
        let mut grid = Grid::new(2);
        let config = Config::default();

        let added = grid
            .accumulate([[255u8, 255, 255], [255, 255, 255], [255, 0, 0]], &config)
            .unwrap();
        assert_eq!(added, 3);

        let white = grid.cells()[grid.index(1, 1, 1)];
        assert_eq!(white.hit_count(), 2);
        assert_eq!(white.average(), Some((1.0, 1.0, 1.0)));
        assert_eq!(white.rgb(), Some((255, 255, 255)));

        let red = grid.cells()[grid.index(1, 0, 0)];
        assert_eq!(red.hit_count(), 1);
        assert_eq!(red.average(), Some((1.0, 0.0, 0.0)));
    }

    #[test]
    fn identical_pixels_average_to_themselves_at_any_count() {
        let colors = [[200u8, 100, 50, 255], [255, 254, 1, 255], [37, 161, 233, 255], [10, 20, 30, 128]];

        for color in colors {
            let expected = if color[3] == 255 {
                (color[0], color[1], color[2])
            } else {
                // 10·128/255, 20·128/255 and 30·128/255, truncated
                (5, 10, 15)
            };

            let mut grid = Grid::new(30);
            grid.accumulate([color], &unfiltered()).unwrap();
            let index = grid
                .cells()
                .iter()
                .position(|cell| cell.hit_count() > 0)
                .unwrap();

            for count in 1..=2500u64 {
                let cell = grid.cells()[index];
                assert_eq!(cell.hit_count(), count);
                assert_eq!(cell.rgb(), Some(expected), "{:?} after {} pixels", color, count);

                grid.accumulate([color], &unfiltered()).unwrap();
            }
        }
    }

    #[test]
    fn mixed_cell_truncates_the_exact_mean() {
        let mut grid = Grid::new(2);
        // (204 + 153) / 2 = 178.5
        grid.accumulate([[255u8, 255, 204], [255, 255, 153]], &unfiltered()).unwrap();

        let cell = grid.cells()[grid.index(1, 1, 0)];
        assert_eq!(cell.rgb(), Some((255, 255, 178)));
    }

    #[test]
    fn hit_counts_are_not_limited_to_32_bits() {
        let mut cell = Cell {
            hit_count: u64::from(u32::MAX),
            red_sum: u128::from(u32::MAX) * 65025,
            green_sum: 0,
            blue_sum: 0,
        };

        cell.add((65025, 0, 0));
        assert_eq!(cell.hit_count(), u64::from(u32::MAX) + 1);
        assert_eq!(cell.rgb(), Some((255, 0, 0)));
    }

    #[test]
    fn dark_pixels_are_skipped() {
        let mut grid = Grid::new(10);
        let config = Config::default();

        let added = grid.accumulate([[0u8, 0, 0], [100, 100, 100]], &config).unwrap();
        assert_eq!(added, 0);
        assert!(grid.cells().iter().all(|cell| cell.hit_count() == 0));
    }

    #[test]
    fn bright_pixels_are_skipped_with_dark_threshold() {
        let mut grid = Grid::new(10);
        let config = Config {
            bright_threshold: 0.0,
            dark_threshold: Some(0.4),
            ..Config::default()
        };

        let added = grid
            .accumulate([[255u8, 255, 255], [255, 0, 0], [20, 20, 20]], &config)
            .unwrap();
        assert_eq!(added, 2);
    }

    #[test]
    fn alpha_weights_into_darker_cells() {
        let mut grid = Grid::new(3);

        grid.accumulate([[255u8, 255, 255, 0]], &unfiltered()).unwrap();
        assert_eq!(grid.cells()[0].hit_count(), 1);
        assert_eq!(grid.cells()[0].average(), Some((0.0, 0.0, 0.0)));
        assert_eq!(grid.cells()[0].rgb(), Some((0, 0, 0)));
    }

    #[test]
    fn clear_resets_every_cell() {
        let mut grid = Grid::new(5);
        grid.accumulate([[255u8, 200, 180]], &Config::default()).unwrap();
        assert!(grid.cells().iter().any(|cell| cell.hit_count() > 0));

        grid.clear();
        assert!(grid.cells().iter().all(|cell| *cell == Cell::default()));
    }

    #[test]
    fn malformed_pixel_reports_its_position() {
        let mut grid = Grid::new(5);
        let pixels: Vec<Vec<i32>> = vec![vec![255, 255, 255], vec![255, 255, 256]];

        assert_eq!(
            grid.accumulate(&pixels, &Config::default()),
            Err(Error::ChannelOutOfRange { pixel: 1, channel: 2 })
        );
    }

    #[test]
    fn empty_cells_have_no_average() {
        assert_eq!(Cell::default().average(), None);
        assert_eq!(Cell::default().rgb(), None);
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_accumulation_matches_sequential_cells() {
        let pixels = (0..MIN_PARALLEL_CHUNK * 5 + 123)
            .map(|i| {
                [
                    (i * 7 % 256) as u8,
                    (i * 13 % 256) as u8,
                    (i * 31 % 256) as u8,
                    (255 - i % 64) as u8,
                ]
            })
            .collect::<Vec<_>>();

        for resolution in [2, 16, 30] {
            let mut sequential = Grid::new(resolution);
            let mut parallel = Grid::new(resolution);

            let added = sequential.accumulate(&pixels, &unfiltered()).unwrap();
            assert_eq!(parallel.accumulate_par(&pixels, &unfiltered()).unwrap(), added);
            assert_eq!(sequential.cells(), parallel.cells());
        }
    }

    #[cfg(feature = "threads")]
    #[test]
    fn parallel_accumulation_is_independent_of_pool_size() {
        let pixels = (0..MIN_PARALLEL_CHUNK * 8)
            .map(|i| [(i * 11 % 256) as u8, (i / 256 % 256) as u8, (i * 3 % 256) as u8])
            .collect::<Vec<_>>();

        let grids = [1, 3, 8]
            .into_iter()
            .map(|threads| {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
                let mut grid = Grid::new(20);
                pool.install(|| grid.accumulate_par(&pixels, &unfiltered())).unwrap();
                grid
            })
            .collect::<Vec<_>>();

        assert_eq!(grids[0].cells(), grids[1].cells());
        assert_eq!(grids[1].cells(), grids[2].cells());
    }
}
