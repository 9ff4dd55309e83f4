use nalgebra::Matrix3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Intrinsics {
    pub const fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Square pixels, focal length 960 and principal point (960, 540).
    pub const fn webcam() -> Self {
        Self::new(960.0, 960.0, 960.0, 540.0)
    }

    /// The 3x3 camera matrix `K`.
    pub fn matrix(&self) -> Matrix3<f32> {
        Matrix3::new(
            self.fx, 0.0, self.cx, //
            0.0, self.fy, self.cy, //
            0.0, 0.0, 1.0,
        )
    }
}

/// Distortion vector `D = [k1, k2, k3, k4]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FisheyeDistortion(pub [f32; 4]);

impl FisheyeDistortion {
    pub const NONE: Self = Self([0.0; 4]);

    /// Only `k1` set, the others held at zero.
    pub const fn radial(k1: f32) -> Self {
        Self([k1, 0.0, 0.0, 0.0])
    }

    pub fn k1(&self) -> f32 {
        self.0[0]
    }

    /// Distorted angle `theta_d` for an incidence angle `theta`.
    pub fn distort_angle(&self, theta: f64) -> f64 {
        let [k1, k2, k3, k4] = self.0.map(f64::from);
        let theta2 = theta * theta;
        let theta4 = theta2 * theta2;
        let theta6 = theta4 * theta2;
        let theta8 = theta4 * theta4;

        theta * (1.0 + k1 * theta2 + k2 * theta4 + k3 * theta6 + k4 * theta8)
    }
}
