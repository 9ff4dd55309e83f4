use super::{frame_to_mat, mat_to_frame};
use crate::camera::{FisheyeDistortion, Intrinsics};
use crate::frame::{Frame, Size};
use crate::remap::Undistorter;
use opencv::calib3d;
use opencv::core::{self, Scalar, CV_16SC2};
use opencv::imgproc;
use opencv::prelude::Mat;
use tracing::debug;

struct Maps {
    distortion: FisheyeDistortion,
    size: Size,
    map1: Mat,
    map2: Mat,
}

/// Fisheye undistortion through `cv::fisheye::initUndistortRectifyMap` and
/// `cv::remap`. Maps are rebuilt only when the coefficients or the canvas
/// size change.
pub struct CvUndistorter {
    camera: Mat,
    maps: Option<Maps>,
}

impl CvUndistorter {
    pub fn new(intrinsics: &Intrinsics) -> crate::Result<Self> {
        let k = intrinsics.matrix().cast::<f64>();
        let rows = [
            [k[(0, 0)], k[(0, 1)], k[(0, 2)]],
            [k[(1, 0)], k[(1, 1)], k[(1, 2)]],
            [k[(2, 0)], k[(2, 1)], k[(2, 2)]],
        ];

        Ok(Self {
            camera: Mat::from_slice_2d(&rows)?,
            maps: None,
        })
    }

    fn maps(&mut self, distortion: FisheyeDistortion, size: Size) -> crate::Result<&Maps> {
        let maps = match self.maps.take() {
            Some(maps) if maps.distortion == distortion && maps.size == size => maps,
            _ => {
                debug!(k1 = distortion.k1(), %size, "building fisheye maps");
                let coefficients = Mat::from_slice_2d(&[distortion.0.map(f64::from)])?;
                let mut map1 = Mat::default();
                let mut map2 = Mat::default();

                // empty R is the identity, P = K keeps the scale
                calib3d::fisheye_init_undistort_rectify_map(
                    &self.camera,
                    &coefficients,
                    &Mat::default(),
                    &self.camera,
                    core::Size::new(size.width as i32, size.height as i32),
                    CV_16SC2,
                    &mut map1,
                    &mut map2,
                )?;

                Maps {
                    distortion,
                    size,
                    map1,
                    map2,
                }
            }
        };

        Ok(self.maps.insert(maps))
    }
}

impl Undistorter for CvUndistorter {
    fn undistort(
        &mut self,
        canvas: &Frame,
        distortion: FisheyeDistortion,
    ) -> crate::Result<Frame> {
        let src = frame_to_mat(canvas)?;
        let maps = self.maps(distortion, canvas.size())?;

        let mut dst = Mat::default();
        imgproc::remap(
            &src,
            &mut dst,
            &maps.map1,
            &maps.map2,
            imgproc::INTER_LINEAR,
            core::BORDER_CONSTANT,
            Scalar::default(),
        )?;

        mat_to_frame(&dst, canvas.order())
    }
}
