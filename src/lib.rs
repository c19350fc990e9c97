// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A library to extract dominant colors from an image.
//!
//! Every pixel is projected into a three dimensional RGB histogram, the color cube. The cells of the cube whose hit
//! count no neighbouring cell exceeds are the local maxima, and their average colors, ordered by hit count, are the
//! dominant colors of the image. The maxima are then pruned so no two returned colors are too similar, and optionally
//! so none of them is too close to a color to avoid, such as a background color.
//!
//! ```
//! let mut cube = colorcube::ColorCube::new();
//! let pixels = vec![[200u8, 100, 50]; 2500];
//!
//! assert_eq!(cube.get_colors(pixels).unwrap(), vec![(200, 100, 50)]);
//! ```

mod channel;
mod config;
mod error;
mod filter;
mod grid;
mod maxima;
mod swatch;

pub use crate::{
    channel::Channel,
    config::{
        Config, Order, DEFAULT_BRIGHT_THRESHOLD, DEFAULT_DARK_THRESHOLD, DEFAULT_DISTINCT_THRESHOLD, DEFAULT_RESOLUTION,
    },
    error::Error,
    maxima::LocalMaximum,
    swatch::Swatch,
};
pub use image;
pub use palette;

use grid::Grid;
use image::{ImageBuffer, Pixel};

/// Extracts dominant colors from pixel data.
///
/// A cube owns its histogram grid and reuses it for every analysis, clearing it first. Analyses take `&mut self`, so
/// one cube serves one caller at a time; create one cube per thread to analyze images concurrently.
#[derive(Debug, Clone)]
pub struct ColorCube {
    config: Config,
    grid: Grid,
}

/// Builds a [`ColorCube`] with a custom [`Config`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorCubeBuilder {
    config: Config,
}

impl ColorCube {
    /// Create a cube with the default config.
    pub fn new() -> Self {
        let config = Config::default();

        Self {
            grid: Grid::new(config.resolution()),
            config,
        }
    }

    pub fn builder() -> ColorCubeBuilder {
        ColorCubeBuilder::default()
    }

    /// Create a cube with the given config, after checking it is valid.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        let config = config.validate()?;

        Ok(Self {
            grid: Grid::new(config.resolution()),
            config,
        })
    }

    pub fn config(&self) -> Config {
        self.config
    }

    /// Build the histogram of the pixels and return its local maxima, most hits first.
    ///
    /// Each pixel is a slice of 3 (RGB) or 4 (RGBA) channels with values in 0..=255. The alpha channel, if present,
    /// weights the color of the pixel.
    pub fn find_local_maxima<I, P, C>(&mut self, pixels: I) -> Result<Vec<LocalMaximum>, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        self.grid.clear();
        let added = self.grid.accumulate(pixels, &self.config)?;

        Ok(self.detect(added))
    }

    /// Return the dominant colors of the pixels, ordered by the configured [`Order`]. The result may be empty if every
    /// pixel was filtered out by brightness.
    pub fn get_colors<I, P, C>(&mut self, pixels: I) -> Result<Vec<(u8, u8, u8)>, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        Ok(self.get_swatches(pixels)?.into_iter().map(Swatch::rgb).collect())
    }

    /// Same as [`ColorCube::get_colors`], but includes the hit count of every color.
    pub fn get_swatches<I, P, C>(&mut self, pixels: I) -> Result<Vec<Swatch>, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        let maxima = self.find_local_maxima(pixels)?;
        let maxima = self.avoid(maxima);
        let maxima = filter::filter_distinct(&maxima, self.config.distinct_threshold());

        Ok(self.finish(maxima))
    }

    /// Try to return `count` dominant colors. Instead of the configured distinctness threshold, the threshold is
    /// raised step by step while more than `count` distinct colors remain, so the returned colors are as different
    /// from each other as the image allows. May return fewer than `count` colors.
    pub fn get_colors_with_count<I, P, C>(&mut self, pixels: I, count: usize) -> Result<Vec<(u8, u8, u8)>, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[C]>,
        C: Channel,
    {
        let maxima = self.find_local_maxima(pixels)?;
        let maxima = self.avoid(maxima);
        let maxima = filter::filter_distinct_adaptive(maxima, count);

        Ok(self.finish(maxima).into_iter().map(Swatch::rgb).collect())
    }

    /// Return the dominant colors of an 8-bit RGB or RGBA image.
    pub fn get_image_colors<P>(&mut self, image: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<(u8, u8, u8)>, Error>
    where
        P: Pixel<Subpixel = u8>,
    {
        Ok(self.get_image_swatches(image)?.into_iter().map(Swatch::rgb).collect())
    }

    /// Same as [`ColorCube::get_image_colors`], but includes the hit count of every color.
    pub fn get_image_swatches<P>(&mut self, image: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<Swatch>, Error>
    where
        P: Pixel<Subpixel = u8>,
    {
        let pixels = image.pixels().map(|pixel| pixel.channels()).collect::<Vec<_>>();

        self.grid.clear();

        #[cfg(feature = "threads")]
        let added = self.grid.accumulate_par(&pixels, &self.config)?;
        #[cfg(not(feature = "threads"))]
        let added = self.grid.accumulate(&pixels, &self.config)?;

        let maxima = self.detect(added);
        let maxima = self.avoid(maxima);
        let maxima = filter::filter_distinct(&maxima, self.config.distinct_threshold());

        Ok(self.finish(maxima))
    }

    fn detect(&self, added: usize) -> Vec<LocalMaximum> {
        let maxima = maxima::find_local_maxima(&self.grid);
        log::debug!("found {} local maxima from {} pixels", maxima.len(), added);

        maxima
    }

    fn avoid(&self, maxima: Vec<LocalMaximum>) -> Vec<LocalMaximum> {
        match self.config.avoid_color() {
            Some(avoid_color) => filter::filter_avoid(maxima, avoid_color),
            None => maxima,
        }
    }

    fn finish(&self, mut maxima: Vec<LocalMaximum>) -> Vec<Swatch> {
        filter::sort_by_order(&mut maxima, self.config.order());
        log::debug!("{} colors remain after filtering", maxima.len());

        maxima.into_iter().map(LocalMaximum::to_swatch).collect()
    }
}

impl Default for ColorCube {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorCubeBuilder {
    /// Number of grid cells per color channel. Must be at least 2.
    pub fn resolution(mut self, resolution: usize) -> Self {
        self.config.resolution = resolution;
        self
    }

    pub fn distinct_threshold(mut self, distinct_threshold: f64) -> Self {
        self.config.distinct_threshold = distinct_threshold;
        self
    }

    pub fn avoid_color(mut self, avoid_color: (u8, u8, u8)) -> Self {
        self.config.avoid_color = Some(avoid_color);
        self
    }

    pub fn avoid_white(self) -> Self {
        self.avoid_color((255, 255, 255))
    }

    pub fn avoid_black(self) -> Self {
        self.avoid_color((0, 0, 0))
    }

    pub fn clear_avoid_color(mut self) -> Self {
        self.config.avoid_color = None;
        self
    }

    pub fn bright_threshold(mut self, bright_threshold: f64) -> Self {
        self.config.bright_threshold = bright_threshold;
        self
    }

    pub fn dark_threshold(mut self, dark_threshold: f64) -> Self {
        self.config.dark_threshold = Some(dark_threshold);
        self
    }

    /// Ignore pixels that are bright in every channel instead of the ones that are dark in every channel.
    pub fn only_dark_colors(self) -> Self {
        self.bright_threshold(0.0).dark_threshold(DEFAULT_DARK_THRESHOLD)
    }

    pub fn order(mut self, order: Order) -> Self {
        self.config.order = order;
        self
    }

    pub fn build(self) -> Result<ColorCube, Error> {
        ColorCube::with_config(self.config)
    }
}
