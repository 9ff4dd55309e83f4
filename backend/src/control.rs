use crate::camera::FisheyeDistortion;
use std::ops::RangeInclusive;

/// Range, resolution and mapping of the distortion slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderConfig {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub default: f32,
    /// Added to the slider value to form `k1`.
    pub offset: f32,
}

/// Maps one slider value onto the first fisheye coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct DistortionControl {
    config: SliderConfig,
    value: f32,
}

impl DistortionControl {
    pub fn new(config: SliderConfig) -> Self {
        let mut control = Self {
            config,
            value: 0.0,
        };
        control.set(config.default);
        control
    }

    pub fn range(&self) -> RangeInclusive<f32> {
        self.config.min..=self.config.max
    }

    pub fn step(&self) -> f32 {
        self.config.step
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Clamps `value` into range, snaps it to the slider resolution and
    /// returns what was stored.
    pub fn set(&mut self, value: f32) -> f32 {
        let SliderConfig { min, max, step, .. } = self.config;
        let mut value = value.clamp(min, max);
        if step > 0.0 {
            value = ((value / step).round() * step).clamp(min, max);
        }
        self.value = value;
        value
    }

    pub fn coefficients(&self) -> FisheyeDistortion {
        FisheyeDistortion::radial(self.value + self.config.offset)
    }
}
