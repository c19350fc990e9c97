use thiserror::Error;

/// Errors returned when building a [`crate::ColorCube`] or when analyzing pixels with one.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// The grid needs at least two cells per channel for cells to have neighbours.
    #[error("resolution {0} is below the minimum of 2 cells per channel")]
    ResolutionTooSmall(usize),
    /// The total cell count `resolution³` does not fit in memory addressing.
    #[error("resolution {0} results in too many grid cells")]
    ResolutionTooLarge(usize),
    /// A threshold is NaN, negative, or outside the range its setting allows.
    #[error("{name} threshold {value} is out of range")]
    InvalidThreshold { name: &'static str, value: f64 },
    /// A pixel did not have exactly 3 (RGB) or 4 (RGBA) channels.
    #[error("pixel {pixel} has {channels} channels, expected 3 or 4")]
    ChannelCount { pixel: usize, channels: usize },
    /// A channel value was outside the range 0..=255.
    #[error("channel {channel} of pixel {pixel} is outside the range 0..=255")]
    ChannelOutOfRange { pixel: usize, channel: usize },
}
