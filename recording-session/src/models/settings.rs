use serde::{Deserialize, Serialize};

/// Container/codec requested from the capture capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    LinearPcm,
    #[default]
    Aac,
    Alac,
    Flac,
}

impl AudioFormat {
    pub fn is_lossless(&self) -> bool {
        !matches!(self, Self::Aac)
    }
}

/// Encoder quality hint, passed through to the capture capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderQuality {
    Min,
    Low,
    Medium,
    #[default]
    High,
    Max,
}

/// Format settings a capture handle is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub format: AudioFormat,

    /// Sample rate in Hz (default: 44100).
    pub sample_rate: f64,

    /// Number of channels (default: 1). Valid values: 1, 2.
    pub channels: u16,

    /// Bit depth (default: 16). Valid values: 16, 24, 32.
    pub bit_depth: u16,

    pub quality: EncoderQuality,
}

impl CaptureSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        if ![16, 24, 32].contains(&self.bit_depth) {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            format: AudioFormat::Aac,
            sample_rate: 44100.0,
            channels: 1,
            bit_depth: 16,
            quality: EncoderQuality::High,
        }
    }
}
