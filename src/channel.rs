use crate::Error;

const CHANNEL_MAX: f64 = 255.0;

/// Weight of an opaque pixel. Accumulated channels are stored as `channel * alpha`, so one unit is `1 / 255²`.
pub(crate) const OPAQUE: u32 = 255;
pub(crate) const WEIGHT_SCALE: f64 = (OPAQUE * OPAQUE) as f64;

/// An integer pixel channel value that is expected to lie within 0..=255.
///
/// Implemented for the common integer types so pixel data can be handed to a [`crate::ColorCube`] without
/// converting it first. Values outside the range are reported as errors instead of being clamped.
pub trait Channel: Copy {
    /// Return the value as a byte, or `None` if it is outside 0..=255.
    fn to_u8(self) -> Option<u8>;
}

impl Channel for u8 {
    fn to_u8(self) -> Option<u8> {
        Some(self)
    }
}

macro_rules! impl_channel {
    ($($ty:ty),*) => {
        $(
            impl Channel for $ty {
                fn to_u8(self) -> Option<u8> {
                    u8::try_from(self).ok()
                }
            }
        )*
    };
}

impl_channel!(u16, u32, u64, usize, i16, i32, i64);

/// A single validated pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sample {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: Option<u8>,
}

impl Sample {
    /// Validate the channels of the pixel at position `pixel` in the input stream.
    pub fn from_channels<C>(pixel: usize, channels: &[C]) -> Result<Self, Error>
    where
        C: Channel,
    {
        if channels.len() != 3 && channels.len() != 4 {
            return Err(Error::ChannelCount {
                pixel,
                channels: channels.len(),
            });
        }

        let mut bytes = [0; 4];
        for (channel, (value, out)) in channels.iter().zip(bytes.iter_mut()).enumerate() {
            *out = value.to_u8().ok_or(Error::ChannelOutOfRange { pixel, channel })?;
        }

        Ok(Self {
            red: bytes[0],
            green: bytes[1],
            blue: bytes[2],
            alpha: (channels.len() == 4).then(|| bytes[3]),
        })
    }

    /// True if every color channel, normalized to 0.0..=1.0, is below the threshold.
    pub fn is_darker_than(&self, threshold: f64) -> bool {
        unit(self.red) < threshold && unit(self.green) < threshold && unit(self.blue) < threshold
    }

    /// True if every color channel, normalized to 0.0..=1.0, is above the threshold.
    pub fn is_brighter_than(&self, threshold: f64) -> bool {
        unit(self.red) > threshold && unit(self.green) > threshold && unit(self.blue) > threshold
    }

    /// The color channels multiplied by alpha, or by [`OPAQUE`] if the pixel has no alpha. Divide by
    /// [`WEIGHT_SCALE`] to normalize.
    pub fn weighted(&self) -> (u32, u32, u32) {
        let alpha = self.alpha.map_or(OPAQUE, u32::from);

        (
            u32::from(self.red) * alpha,
            u32::from(self.green) * alpha,
            u32::from(self.blue) * alpha,
        )
    }
}

fn unit(channel: u8) -> f64 {
    channel as f64 / CHANNEL_MAX
}
