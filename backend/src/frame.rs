use crate::error::Error;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size after adding `margins` on every side.
    pub const fn padded(self, margins: Margins) -> Self {
        Self {
            width: self.width + margins.left + margins.right,
            height: self.height + margins.top + margins.bottom,
        }
    }

    pub const fn pixels(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    pub const fn symmetric(vertical: u32, horizontal: u32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

/// Axis aligned sub-rectangle, in pixels, of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Keeps rows `top..bottom` across the full `width`.
    pub const fn rows(top: u32, bottom: u32, width: u32) -> Self {
        Self {
            x: 0,
            y: top,
            width,
            height: bottom.saturating_sub(top),
        }
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn fits(&self, canvas: Size) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= canvas.width as u64
            && self.y as u64 + self.height as u64 <= canvas.height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Capture order of most webcam backends.
    Bgr,
    Rgb,
}

/// A `height x width x 3` u8 pixel buffer tagged with its channel order.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    pub fn from_raw(size: Size, order: ChannelOrder, data: Vec<u8>) -> crate::Result<Self> {
        let len = data.len();
        let image = RgbImage::from_raw(size.width, size.height, data)
            .filter(|_| len == size.pixels() * 3)
            .ok_or(Error::InvalidBuffer { len, size })?;

        Ok(Self { image, order })
    }

    pub fn filled(size: Size, order: ChannelOrder, color: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(size.width, size.height, Rgb(color)),
            order,
        }
    }

    pub fn from_fn(
        size: Size,
        order: ChannelOrder,
        mut f: impl FnMut(u32, u32) -> [u8; 3],
    ) -> Self {
        Self {
            image: RgbImage::from_fn(size.width, size.height, |x, y| Rgb(f(x, y))),
            order,
        }
    }

    pub(crate) fn from_image(image: RgbImage, order: ChannelOrder) -> Self {
        Self { image, order }
    }

    pub fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Places the frame on a `color` canvas enlarged by `margins`.
    pub fn pad(&self, margins: Margins, color: [u8; 3]) -> Frame {
        let size = self.size().padded(margins);
        let mut canvas = RgbImage::from_pixel(size.width, size.height, Rgb(color));
        imageops::replace(
            &mut canvas,
            &self.image,
            margins.left as i64,
            margins.top as i64,
        );

        Frame::from_image(canvas, self.order)
    }

    /// Reorders the channels in place when `order` differs.
    pub fn to_order(mut self, order: ChannelOrder) -> Frame {
        if self.order != order {
            for px in self.image.pixels_mut() {
                px.0.swap(0, 2);
            }
            self.order = order;
        }
        self
    }

    pub fn crop(&self, rect: CropRect) -> crate::Result<Frame> {
        if !rect.fits(self.size()) {
            return Err(Error::CropOutOfBounds {
                crop: rect,
                canvas: self.size(),
            });
        }

        let cropped = imageops::crop_imm(&self.image, rect.x, rect.y, rect.width, rect.height);
        Ok(Frame::from_image(cropped.to_image(), self.order))
    }

    /// Linear resampling to `size`; returns a plain copy when already there.
    pub fn resize(&self, size: Size) -> Frame {
        if self.size() == size {
            return self.clone();
        }

        let resized = imageops::resize(&self.image, size.width, size.height, FilterType::Triangle);
        Frame::from_image(resized, self.order)
    }
}
