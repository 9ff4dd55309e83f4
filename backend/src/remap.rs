use crate::camera::{FisheyeDistortion, Intrinsics};
use crate::error::Error;
use crate::frame::{Frame, Size};
use image::Rgb;
use imageproc::geometric_transformations::{warp_with, Interpolation};
use nalgebra::Matrix3;
use tracing::debug;

// any coordinate left of the image samples the border
const OUTSIDE: (f32, f32) = (-2.0, -2.0);

/// Per output pixel source coordinates. Non finite entries sample the border.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapTable {
    size: Size,
    map_x: Vec<f32>,
    map_y: Vec<f32>,
}

/// Builds the lookup that undistorts an image taken through a fisheye lens.
///
/// `k` and `d` describe the distorted source camera, `r` rotates the
/// rectified view and `p` is the camera matrix of the output image.
/// Every output pixel is back-projected through `(p * r)^-1`, its incidence
/// angle distorted with `d` and projected into the source through `k`.
pub fn init_undistort_rectify_map(
    k: &Matrix3<f32>,
    d: &FisheyeDistortion,
    r: &Matrix3<f32>,
    p: &Matrix3<f32>,
    size: Size,
) -> crate::Result<RemapTable> {
    let k = k.cast::<f64>();
    let (fx, fy) = (k[(0, 0)], k[(1, 1)]);
    let (cx, cy) = (k[(0, 2)], k[(1, 2)]);
    let skew = k[(0, 1)] / fx;

    let ir = (p.cast::<f64>() * r.cast::<f64>())
        .try_inverse()
        .ok_or(Error::SingularMatrix)?;

    let mut map_x = Vec::with_capacity(size.pixels());
    let mut map_y = Vec::with_capacity(size.pixels());

    for row in 0..size.height {
        let row = row as f64;
        let mut x = row * ir[(0, 1)] + ir[(0, 2)];
        let mut y = row * ir[(1, 1)] + ir[(1, 2)];
        let mut w = row * ir[(2, 1)] + ir[(2, 2)];

        for _ in 0..size.width {
            let (u, v) = if w <= 0.0 {
                let u = if x > 0.0 { f64::NEG_INFINITY } else { f64::INFINITY };
                let v = if y > 0.0 { f64::NEG_INFINITY } else { f64::INFINITY };
                (u, v)
            } else {
                let (px, py) = (x / w, y / w);
                let radius = px.hypot(py);
                let theta_d = d.distort_angle(radius.atan());
                let scale = if radius == 0.0 { 1.0 } else { theta_d / radius };
                let (dx, dy) = (px * scale, py * scale);

                (fx * (dx + skew * dy) + cx, fy * dy + cy)
            };

            map_x.push(u as f32);
            map_y.push(v as f32);

            x += ir[(0, 0)];
            y += ir[(1, 0)];
            w += ir[(2, 0)];
        }
    }

    Ok(RemapTable { size, map_x, map_y })
}

impl RemapTable {
    pub fn size(&self) -> Size {
        self.size
    }

    /// Source coordinate sampled for output pixel `(x, y)`.
    pub fn source(&self, x: u32, y: u32) -> (f32, f32) {
        let i = y as usize * self.size.width as usize + x as usize;
        (self.map_x[i], self.map_y[i])
    }

    /// Resamples `src` through the table with bilinear interpolation.
    /// Lookups that leave `src` come out black.
    ///
    /// `src` must have the table's size.
    pub fn remap(&self, src: &Frame) -> crate::Result<Frame> {
        if src.size() != self.size {
            return Err(Error::FrameSizeMismatch {
                expected: self.size,
                actual: src.size(),
            });
        }

        let width = self.size.width as usize;
        let out = warp_with(
            src.image(),
            |x, y| {
                let i = y as usize * width + x as usize;
                let (u, v) = (self.map_x[i], self.map_y[i]);
                if u.is_finite() && v.is_finite() {
                    (u, v)
                } else {
                    OUTSIDE
                }
            },
            Interpolation::Bilinear,
            Rgb([0; 3]),
        );

        Ok(Frame::from_image(out, src.order()))
    }
}

/// Turns a padded canvas into its undistorted counterpart.
pub trait Undistorter {
    fn undistort(&mut self, canvas: &Frame, distortion: FisheyeDistortion)
        -> crate::Result<Frame>;
}

/// [`Undistorter`] on top of [`RemapTable`]. The last table is kept until
/// the coefficients or the canvas size change.
pub struct TableUndistorter {
    camera: Matrix3<f32>,
    table: Option<(FisheyeDistortion, RemapTable)>,
}

impl TableUndistorter {
    pub fn new(intrinsics: &Intrinsics) -> Self {
        Self {
            camera: intrinsics.matrix(),
            table: None,
        }
    }
}

impl Undistorter for TableUndistorter {
    fn undistort(
        &mut self,
        canvas: &Frame,
        distortion: FisheyeDistortion,
    ) -> crate::Result<Frame> {
        let size = canvas.size();
        let table = match self.table.take() {
            Some((cached, table)) if cached == distortion && table.size() == size => table,
            _ => {
                debug!(k1 = distortion.k1(), %size, "rebuilding undistort map");
                init_undistort_rectify_map(
                    &self.camera,
                    &distortion,
                    &Matrix3::identity(),
                    &self.camera,
                    size,
                )?
            }
        };

        self.table.insert((distortion, table)).1.remap(canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Intrinsics;
    use crate::frame::ChannelOrder;
    use approx::assert_relative_eq;

    fn small_camera() -> Intrinsics {
        Intrinsics::new(32.0, 32.0, 32.0, 24.0)
    }

    fn table(k: &Intrinsics, d: FisheyeDistortion, size: Size) -> RemapTable {
        let k = k.matrix();
        init_undistort_rectify_map(&k, &d, &Matrix3::identity(), &k, size).unwrap()
    }

    fn texture(size: Size) -> Frame {
        Frame::from_fn(size, ChannelOrder::Bgr, |x, y| {
            [(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8]
        })
    }

    #[test]
    fn principal_point_is_fixed() {
        let t = table(&small_camera(), FisheyeDistortion::radial(-0.4), Size::new(64, 48));
        let (u, v) = t.source(32, 24);
        assert_relative_eq!(u, 32.0);
        assert_relative_eq!(v, 24.0);
    }

    #[test]
    fn webcam_principal_point_is_canvas_center() {
        let k = Intrinsics::webcam();
        let t = table(&k, FisheyeDistortion::radial(-0.3), Size::new(1920, 1080));
        assert_eq!(t.size(), Size::new(1920, 1080));
        assert_eq!(t.source(960, 540), (960.0, 540.0));
    }

    #[test]
    fn follows_equidistant_projection() {
        let k = small_camera();
        let d = FisheyeDistortion::radial(0.1);
        let t = table(&k, d, Size::new(64, 48));

        let (px, py) = ((50.0 - 32.0) / 32.0, (10.0 - 24.0) / 32.0);
        let r = f64::hypot(px, py);
        let scale = d.distort_angle(r.atan()) / r;
        let (u, v) = t.source(50, 10);

        assert_relative_eq!(u as f64, 32.0 * px * scale + 32.0, epsilon = 1e-4);
        assert_relative_eq!(v as f64, 32.0 * py * scale + 24.0, epsilon = 1e-4);
    }

    #[test]
    fn negative_k1_pulls_corners_inward() {
        let k = small_camera();
        let t = table(&k, FisheyeDistortion::radial(-0.5), Size::new(64, 48));
        let (u, v) = t.source(0, 0);
        assert!(u > 0.0 && v > 0.0);
    }

    #[test]
    fn singular_output_matrix_is_rejected() {
        let k = small_camera().matrix();
        let err = init_undistort_rectify_map(
            &k,
            &FisheyeDistortion::NONE,
            &Matrix3::identity(),
            &Matrix3::zeros(),
            Size::new(8, 8),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SingularMatrix));
    }

    #[test]
    fn remap_is_deterministic() {
        let size = Size::new(64, 48);
        let src = texture(size);
        let d = FisheyeDistortion::radial(-0.3);

        let a = table(&small_camera(), d, size).remap(&src).unwrap();
        let b = table(&small_camera(), d, size).remap(&src).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    fn lookup(size: Size, map: impl Fn(u32, u32) -> (f32, f32)) -> RemapTable {
        let (mut map_x, mut map_y) = (Vec::new(), Vec::new());
        for y in 0..size.height {
            for x in 0..size.width {
                let (u, v) = map(x, y);
                map_x.push(u);
                map_y.push(v);
            }
        }
        RemapTable { size, map_x, map_y }
    }

    #[test]
    fn integer_lookup_copies_pixels() {
        let size = Size::new(4, 4);
        let src = Frame::from_fn(size, ChannelOrder::Rgb, |x, y| [(x + 4 * y) as u8; 3]);
        let t = lookup(size, |x, _| ((2 - x % 3) as f32, 1.0));

        let out = t.remap(&src).unwrap();
        assert_eq!(out.pixel(0, 0), [6; 3]);
        assert_eq!(out.pixel(2, 3), [4; 3]);
        assert_eq!(out.order(), ChannelOrder::Rgb);
    }

    #[test]
    fn fractional_lookup_interpolates() {
        let size = Size::new(3, 2);
        let src = Frame::from_fn(size, ChannelOrder::Rgb, |x, _| match x {
            1 => [100, 200, 50],
            _ => [0; 3],
        });
        let t = lookup(size, |x, _| match x {
            0 => (0.5, 0.0),
            1 => (0.25, 0.0),
            _ => (1.0, 0.5),
        });

        let out = t.remap(&src).unwrap();
        assert_eq!(out.pixel(0, 0), [50, 100, 25]);
        assert_eq!(out.pixel(2, 1), [100, 200, 50]);
        for (got, want) in out.pixel(1, 0).into_iter().zip([25, 50, 12]) {
            assert!(got.abs_diff(want) <= 1, "{got} vs {want}");
        }
    }

    #[test]
    fn outside_lookups_are_black() {
        let size = Size::new(2, 2);
        let src = Frame::filled(size, ChannelOrder::Rgb, [200; 3]);
        let t = RemapTable {
            size,
            map_x: vec![-5.0, 10.0, f32::INFINITY, f32::NAN],
            map_y: vec![0.0; 4],
        };

        let out = t.remap(&src).unwrap();
        assert!(out.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn undistorter_reuses_table_until_coefficients_change() {
        let size = Size::new(64, 48);
        let src = texture(size);
        let mut undistorter = TableUndistorter::new(&small_camera());

        let a = undistorter.undistort(&src, FisheyeDistortion::radial(-0.4)).unwrap();
        let cached = undistorter.table.as_ref().map(|(d, _)| *d);
        let again = undistorter.undistort(&src, FisheyeDistortion::radial(-0.4)).unwrap();
        let b = undistorter.undistort(&src, FisheyeDistortion::radial(0.4)).unwrap();

        assert_eq!(cached, Some(FisheyeDistortion::radial(-0.4)));
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(
            undistorter.table.as_ref().map(|(d, t)| (*d, t.size())),
            Some((FisheyeDistortion::radial(0.4), size))
        );
    }

    #[test]
    fn undistorter_follows_canvas_size() {
        let mut undistorter = TableUndistorter::new(&small_camera());
        let d = FisheyeDistortion::radial(-0.2);

        let small = undistorter.undistort(&texture(Size::new(32, 24)), d).unwrap();
        let large = undistorter.undistort(&texture(Size::new(64, 48)), d).unwrap();
        assert_eq!(small.size(), Size::new(32, 24));
        assert_eq!(large.size(), Size::new(64, 48));
    }

    #[test]
    fn remap_requires_matching_size() {
        let t = table(&small_camera(), FisheyeDistortion::NONE, Size::new(64, 48));
        let err = t.remap(&texture(Size::new(32, 24))).unwrap_err();
        assert!(matches!(err, Error::FrameSizeMismatch { .. }));
    }

    #[test]
    fn zero_distortion_leaves_center_nearly_untouched() {
        let k = Intrinsics::webcam();
        let size = Size::new(1920, 1080);
        let src = Frame::from_fn(size, ChannelOrder::Bgr, |x, y| {
            [(x / 8 % 256) as u8, (y / 8 % 256) as u8, 128]
        });
        let out = table(&k, FisheyeDistortion::NONE, size).remap(&src).unwrap();

        for y in (500..580).step_by(7) {
            for x in (900..1020).step_by(11) {
                let (a, b) = (out.pixel(x, y), src.pixel(x, y));
                for c in 0..3 {
                    assert!(
                        (a[c] as i32 - b[c] as i32).abs() <= 1,
                        "({x}, {y}) differs: {a:?} vs {b:?}"
                    );
                }
            }
        }
    }
}
