use crate::{
    assets::handle::ImageHandle,
    foundation::core::{Channel, PixelBuffer},
    foundation::error::RepackResult,
};

/// Per-channel unpack output settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UnpackChannel {
    /// Produce an output image for this channel.
    pub enabled: bool,
    /// File-name suffix appended to the output base name (`_R`, `_G`, ...).
    pub suffix: String,
}

/// Default unpack settings: R, G and B enabled, alpha disabled, `_R`/`_G`/`_B`/`_A` suffixes.
pub fn default_unpack_channels() -> [UnpackChannel; 4] {
    Channel::ALL.map(|c| UnpackChannel {
        enabled: c != Channel::A,
        suffix: format!("_{}", c.label()),
    })
}

/// Everything needed to split one source image into grayscale channel images.
#[derive(Clone, Debug)]
pub struct UnpackParameters {
    /// Image to split.
    pub source: ImageHandle,
    /// Output settings indexed by channel.
    pub channels: [UnpackChannel; 4],
}

impl UnpackParameters {
    /// Unpack `source` with [`default_unpack_channels`].
    pub fn new(source: ImageHandle) -> Self {
        Self {
            source,
            channels: default_unpack_channels(),
        }
    }

    /// Enabled flags indexed by channel.
    pub fn enabled(&self) -> [bool; 4] {
        [
            self.channels[0].enabled,
            self.channels[1].enabled,
            self.channels[2].enabled,
            self.channels[3].enabled,
        ]
    }
}

/// One grayscale image per enabled channel, indexed by channel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnpackedChannels {
    outputs: [Option<PixelBuffer>; 4],
}

impl UnpackedChannels {
    /// Output for `channel`, if it was enabled.
    pub fn get(&self, channel: Channel) -> Option<&PixelBuffer> {
        self.outputs[channel.index()].as_ref()
    }

    /// Enabled outputs in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &PixelBuffer)> {
        Channel::ALL
            .into_iter()
            .zip(self.outputs.iter())
            .filter_map(|(c, out)| out.as_ref().map(|b| (c, b)))
    }

    /// Number of produced images.
    pub fn len(&self) -> usize {
        self.outputs.iter().filter(|o| o.is_some()).count()
    }

    /// Return `true` when no channel was enabled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take ownership of the per-channel outputs.
    pub fn into_array(self) -> [Option<PixelBuffer>; 4] {
        self.outputs
    }
}

/// Split `source` into grayscale images at its native size.
///
/// Each enabled channel yields a buffer whose R, G and B all carry that channel's value and
/// whose alpha is 1. Disabled channels produce nothing.
#[tracing::instrument(skip(source), fields(width = source.width(), height = source.height()))]
pub fn unpack_channels(source: &PixelBuffer, enabled: [bool; 4]) -> RepackResult<UnpackedChannels> {
    let mut outputs: [Option<PixelBuffer>; 4] = Default::default();
    for channel in Channel::ALL {
        if !enabled[channel.index()] {
            continue;
        }
        let i = channel.index();
        let mut data = Vec::with_capacity(source.as_slice().len());
        for px in source.as_slice().chunks_exact(4) {
            let v = px[i];
            data.extend_from_slice(&[v, v, v, 1.0]);
        }
        outputs[i] = Some(PixelBuffer::from_rgba(
            source.width(),
            source.height(),
            data,
        )?);
    }
    Ok(UnpackedChannels { outputs })
}

#[cfg(test)]
#[path = "../../tests/unit/compose/unpack.rs"]
mod tests;
