use crate::Error;

pub const DEFAULT_RESOLUTION: usize = 30;
pub const DEFAULT_DISTINCT_THRESHOLD: f64 = 0.2;
pub const DEFAULT_BRIGHT_THRESHOLD: f64 = 0.6;
pub const DEFAULT_DARK_THRESHOLD: f64 = 0.4;

const MIN_RESOLUTION: usize = 2;

/// The order in which the extracted colors are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Order {
    /// Most frequent color first.
    #[default]
    Frequency,
    /// Brightest color first, by HSV value.
    Brightness,
    /// Darkest color first, by HSV value.
    Darkness,
}

/// Settings for a [`crate::ColorCube`].
///
/// A config is immutable once built. Use [`crate::ColorCube::builder`] to create a cube with a custom config,
/// or [`crate::ColorCube::with_config`] to use a config obtained elsewhere, which is validated then.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub(crate) resolution: usize,
    pub(crate) distinct_threshold: f64,
    pub(crate) avoid_color: Option<(u8, u8, u8)>,
    pub(crate) bright_threshold: f64,
    pub(crate) dark_threshold: Option<f64>,
    pub(crate) order: Order,
}

impl Config {
    /// Number of grid cells per color channel.
    pub fn resolution(self) -> usize {
        self.resolution
    }

    /// Minimum distance in normalized RGB space between any two returned colors.
    pub fn distinct_threshold(self) -> f64 {
        self.distinct_threshold
    }

    /// Color the returned colors are kept away from, if any.
    pub fn avoid_color(self) -> Option<(u8, u8, u8)> {
        self.avoid_color
    }

    /// Pixels with all three channels below this value are ignored.
    pub fn bright_threshold(self) -> f64 {
        self.bright_threshold
    }

    /// Pixels with all three channels above this value are ignored, if set.
    pub fn dark_threshold(self) -> Option<f64> {
        self.dark_threshold
    }

    pub fn order(self) -> Order {
        self.order
    }

    pub(crate) fn validate(self) -> Result<Self, Error> {
        if self.resolution < MIN_RESOLUTION {
            return Err(Error::ResolutionTooSmall(self.resolution));
        }

        if self
            .resolution
            .checked_pow(3)
            .and_then(|cells| cells.checked_mul(std::mem::size_of::<crate::grid::Cell>()))
            .map_or(true, |bytes| bytes > isize::MAX as usize)
        {
            return Err(Error::ResolutionTooLarge(self.resolution));
        }

        check_threshold("distinct", self.distinct_threshold, f64::INFINITY)?;
        check_threshold("bright", self.bright_threshold, 1.0)?;

        if let Some(dark_threshold) = self.dark_threshold {
            check_threshold("dark", dark_threshold, 1.0)?;
        }

        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            distinct_threshold: DEFAULT_DISTINCT_THRESHOLD,
            avoid_color: None,
            bright_threshold: DEFAULT_BRIGHT_THRESHOLD,
            dark_threshold: None,
            order: Order::default(),
        }
    }
}

fn check_threshold(name: &'static str, value: f64, max: f64) -> Result<(), Error> {
    // NaN fails the range check
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidThreshold { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default().validate().unwrap();

        assert_eq!(config.resolution(), 30);
        assert_eq!(config.distinct_threshold(), 0.2);
        assert_eq!(config.bright_threshold(), 0.6);
        assert_eq!(config.avoid_color(), None);
        assert_eq!(config.dark_threshold(), None);
        assert_eq!(config.order(), Order::Frequency);
    }

    #[test]
    fn resolution_must_allow_neighbours() {
        for resolution in [0, 1] {
            let config = Config {
                resolution,
                ..Config::default()
            };

            assert_eq!(config.validate(), Err(Error::ResolutionTooSmall(resolution)));
        }

        let config = Config {
            resolution: 2,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn huge_resolution_is_rejected() {
        let config = Config {
            resolution: usize::MAX / 2,
            ..Config::default()
        };

        assert_eq!(config.validate(), Err(Error::ResolutionTooLarge(usize::MAX / 2)));
    }

    #[test]
    fn thresholds_are_range_checked() {
        let nan = Config {
            distinct_threshold: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(Error::InvalidThreshold { name: "distinct", .. })
        ));

        let bright = Config {
            bright_threshold: 1.5,
            ..Config::default()
        };
        assert!(matches!(
            bright.validate(),
            Err(Error::InvalidThreshold { name: "bright", .. })
        ));

        let dark = Config {
            dark_threshold: Some(-0.1),
            ..Config::default()
        };
        assert!(matches!(
            dark.validate(),
            Err(Error::InvalidThreshold { name: "dark", .. })
        ));
    }
}
