use palette::IntoColor;

/// An extracted color along with the number of pixels in its cell of the color cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Swatch {
    red: u8,
    green: u8,
    blue: u8,
    population: u64,
}

impl Swatch {
    pub fn new((red, green, blue): (u8, u8, u8), population: u64) -> Swatch {
        Self {
            red,
            green,
            blue,
            population,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }

    /// The color as hue in degrees, saturation and value.
    pub fn hsv(self) -> (f32, f32, f32) {
        let raw = palette::Srgb::from_components(self.rgb());
        let raw_float: palette::Srgb<f32> = raw.into_format();
        let hsv: palette::Hsv = raw_float.into_color();
        let (h, s, v) = hsv.into_components();

        (h.to_positive_degrees(), s, v)
    }

    pub fn population(self) -> u64 {
        self.population
    }
}
