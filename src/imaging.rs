use std::collections::VecDeque;

use egui::{pos2, Rect};
use image::imageops::{self, FilterType};
use image::{Rgba as Pixel, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::style::Rgba;

const MAX_BLUR_KERNEL: u32 = 99;

/// Integer pixel region, always inside the image it was clamped against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn clamped(rect: Rect, image_width: u32, image_height: u32) -> Option<Self> {
        let left = rect.left().max(0.0).floor();
        let top = rect.top().max(0.0).floor();
        let right = rect.right().min(image_width as f32).ceil();
        let bottom = rect.bottom().min(image_height as f32).ceil();
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    pub fn to_rect(self) -> Rect {
        Rect::from_min_max(
            pos2(self.x as f32, self.y as f32),
            pos2(
                (self.x + self.width) as f32,
                (self.y + self.height) as f32,
            ),
        )
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlurMode {
    Blur,
    Pixelate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InpaintAlgorithm {
    /// Fast-marching fill from the region border inwards.
    Telea,
    /// Diffusion of border values until the interior settles.
    NavierStokes,
}

pub fn crop(source: &RgbaImage, region: PixelRect) -> RgbaImage {
    imageops::crop_imm(source, region.x, region.y, region.width, region.height).to_image()
}

pub fn fill_rect(source: &RgbaImage, region: PixelRect, color: Rgba) -> RgbaImage {
    let mut out = source.clone();
    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            out.put_pixel(x, y, Pixel(color.0));
        }
    }
    out
}

pub fn blur_kernel_size(intensity: u32) -> u32 {
    let mut kernel = (2 * intensity + 1).max(15);
    if kernel % 2 == 0 {
        kernel += 1;
    }
    kernel.min(MAX_BLUR_KERNEL)
}

fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Multi-pass Gaussian blur of `region`, returned as a patch of the region's size.
pub fn frosted_blur(source: &RgbaImage, region: PixelRect, intensity: u32) -> Result<RgbaImage> {
    if region.width < 2 || region.height < 2 {
        return Err(EditorError::RegionTooSmall {
            width: region.width,
            height: region.height,
        });
    }
    let kernel = blur_kernel_size(intensity);
    let sigma = sigma_for_kernel(kernel);
    let mut patch = crop(source, region);
    for _ in 0..2 {
        patch = gaussian_blur_f32(&patch, sigma);
    }
    if intensity >= 20 {
        let extra = (kernel / 2).max(11) | 1;
        patch = gaussian_blur_f32(&patch, sigma_for_kernel(extra));
    }
    Ok(patch)
}

/// Mosaic: shrink by `block`, then scale back up with nearest-neighbour.
pub fn pixelate(source: &RgbaImage, region: PixelRect, block: u32) -> RgbaImage {
    let block = block.max(1);
    let patch = crop(source, region);
    let small_w = (region.width / block).max(1);
    let small_h = (region.height / block).max(1);
    let small = imageops::resize(&patch, small_w, small_h, FilterType::Triangle);
    imageops::resize(&small, region.width, region.height, FilterType::Nearest)
}

/// Reconstructs `region` from the surrounding pixels. `None` when there is
/// nothing around the region to sample from.
pub fn inpaint(
    source: &RgbaImage,
    region: PixelRect,
    algorithm: InpaintAlgorithm,
    radius: u32,
) -> Option<RgbaImage> {
    let (width, height) = source.dimensions();
    if region.x == 0 && region.y == 0 && region.width >= width && region.height >= height {
        return None;
    }
    let mut field = Field::new(source, region);
    match algorithm {
        InpaintAlgorithm::Telea => field.march(radius.max(1)),
        InpaintAlgorithm::NavierStokes => {
            field.march(1);
            field.diffuse(region, (radius * 20).clamp(50, 400));
        }
    }
    Some(field.into_image(source))
}

struct Field {
    width: u32,
    height: u32,
    values: Vec<[f32; 4]>,
    known: Vec<bool>,
    region: PixelRect,
}

impl Field {
    fn new(source: &RgbaImage, region: PixelRect) -> Self {
        let (width, height) = source.dimensions();
        let mut values = Vec::with_capacity((width * height) as usize);
        let mut known = Vec::with_capacity((width * height) as usize);
        for (x, y, pixel) in source.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            values.push([r as f32, g as f32, b as f32, a as f32]);
            known.push(!region.contains(x, y));
        }
        Self {
            width,
            height,
            values,
            known,
            region,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn neighbours(&self, x: u32, y: u32) -> impl Iterator<Item = (u32, u32)> {
        let (w, h) = (self.width as i64, self.height as i64);
        [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)]
            .into_iter()
            .map(move |(dx, dy)| (x as i64 + dx, y as i64 + dy))
            .filter(move |(nx, ny)| *nx >= 0 && *ny >= 0 && *nx < w && *ny < h)
            .map(|(nx, ny)| (nx as u32, ny as u32))
    }

    /// Fills unknown pixels ring by ring from the border, each as the
    /// distance-weighted mean of known pixels within `radius`.
    fn march(&mut self, radius: u32) {
        let mut queued = vec![false; self.known.len()];
        let mut frontier = VecDeque::new();
        for y in self.region.y..self.region.y + self.region.height {
            for x in self.region.x..self.region.x + self.region.width {
                let idx = self.index(x, y);
                if self.known[idx] {
                    continue;
                }
                let touches_known = self
                    .neighbours(x, y)
                    .any(|(nx, ny)| self.known[self.index(nx, ny)]);
                if touches_known {
                    queued[idx] = true;
                    frontier.push_back((x, y));
                }
            }
        }

        let r = radius as i64;
        while let Some((x, y)) = frontier.pop_front() {
            let mut sum = [0.0f32; 4];
            let mut total = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    let d2 = (dx * dx + dy * dy) as f32;
                    if d2 == 0.0 || d2 > (r * r) as f32 {
                        continue;
                    }
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                        continue;
                    }
                    let nidx = self.index(nx as u32, ny as u32);
                    if !self.known[nidx] {
                        continue;
                    }
                    let weight = 1.0 / d2;
                    for (acc, value) in sum.iter_mut().zip(self.values[nidx]) {
                        *acc += value * weight;
                    }
                    total += weight;
                }
            }

            let idx = self.index(x, y);
            if total > 0.0 {
                self.values[idx] = sum.map(|value| value / total);
            }
            self.known[idx] = true;

            let next: Vec<(u32, u32)> = self.neighbours(x, y).collect();
            for (nx, ny) in next {
                let nidx = self.index(nx, ny);
                if !self.known[nidx] && !queued[nidx] {
                    queued[nidx] = true;
                    frontier.push_back((nx, ny));
                }
            }
        }
    }

    /// Jacobi relaxation of the region interior with the border held fixed.
    /// Jacobi iterations over two buffers; cells outside `region` are never written.
    fn diffuse(&mut self, region: PixelRect, iterations: u32) {
        let mut next = self.values.clone();
        for _ in 0..iterations {
            for y in region.y..region.y + region.height {
                for x in region.x..region.x + region.width {
                    let mut sum = [0.0f32; 4];
                    let mut count = 0.0f32;
                    for (nx, ny) in self.neighbours(x, y) {
                        let value = self.values[self.index(nx, ny)];
                        for (acc, channel) in sum.iter_mut().zip(value) {
                            *acc += channel;
                        }
                        count += 1.0;
                    }
                    if count > 0.0 {
                        next[self.index(x, y)] = sum.map(|value| value / count);
                    }
                }
            }
            std::mem::swap(&mut self.values, &mut next);
        }
    }

    fn into_image(self, source: &RgbaImage) -> RgbaImage {
        let mut out = source.clone();
        for y in self.region.y..self.region.y + self.region.height {
            for x in self.region.x..self.region.x + self.region.width {
                let value = self.values[self.index(x, y)];
                let pixel = value.map(|channel| channel.round().clamp(0.0, 255.0) as u8);
                out.put_pixel(x, y, Pixel(pixel));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use egui::{pos2, Rect};
    use image::{Rgba as Pixel, RgbaImage};

    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 {
                Pixel([0, 0, 0, 255])
            } else {
                Pixel([255, 255, 255, 255])
            }
        })
    }

    #[test]
    fn pixel_rect_clamps_to_image() {
        let rect = Rect::from_min_max(pos2(-5.0, 10.5), pos2(30.2, 200.0));
        let region = PixelRect::clamped(rect, 20, 50).expect("region");
        assert_eq!(
            region,
            PixelRect {
                x: 0,
                y: 10,
                width: 20,
                height: 40
            }
        );
        assert!(PixelRect::clamped(Rect::from_min_max(pos2(30.0, 0.0), pos2(40.0, 5.0)), 20, 50)
            .is_none());
    }

    #[test]
    fn kernel_is_odd_and_capped() {
        assert_eq!(blur_kernel_size(1), 15);
        assert_eq!(blur_kernel_size(25), 51);
        assert_eq!(blur_kernel_size(80), 99);
        assert_eq!(blur_kernel_size(35) % 2, 1);
    }

    #[test]
    fn blur_smooths_checkerboard() {
        let source = checker(40, 40);
        let region = PixelRect {
            x: 5,
            y: 5,
            width: 20,
            height: 20,
        };
        let patch = frosted_blur(&source, region, 25).expect("blur");
        assert_eq!(patch.dimensions(), (20, 20));
        let center = patch.get_pixel(10, 10).0[0];
        assert!(center > 60 && center < 195, "center value {center}");
    }

    #[test]
    fn blur_rejects_single_pixel_region() {
        let source = checker(10, 10);
        let region = PixelRect {
            x: 0,
            y: 0,
            width: 1,
            height: 5,
        };
        assert!(frosted_blur(&source, region, 10).is_err());
    }

    #[test]
    fn pixelate_makes_uniform_blocks() {
        let source = checker(32, 32);
        let region = PixelRect {
            x: 0,
            y: 0,
            width: 32,
            height: 32,
        };
        let patch = pixelate(&source, region, 8);
        assert_eq!(patch.get_pixel(0, 0), patch.get_pixel(7, 7));
    }

    #[test]
    fn inpaint_fills_from_uniform_surroundings() {
        let mut source = RgbaImage::from_pixel(30, 30, Pixel([40, 90, 200, 255]));
        for y in 10..20 {
            for x in 10..20 {
                source.put_pixel(x, y, Pixel([255, 0, 0, 255]));
            }
        }
        let region = PixelRect {
            x: 10,
            y: 10,
            width: 10,
            height: 10,
        };
        for algorithm in [InpaintAlgorithm::Telea, InpaintAlgorithm::NavierStokes] {
            let healed = inpaint(&source, region, algorithm, 5).expect("inpaint");
            assert_eq!(healed.get_pixel(15, 15).0, [40, 90, 200, 255], "{algorithm:?}");
            assert_eq!(healed.get_pixel(0, 0).0, [40, 90, 200, 255]);
        }
    }

    #[test]
    fn diffusion_blends_between_borders() {
        let source = RgbaImage::from_fn(20, 5, |x, _| {
            if x < 10 {
                Pixel([255, 255, 255, 255])
            } else {
                Pixel([0, 0, 0, 255])
            }
        });
        let region = PixelRect {
            x: 5,
            y: 0,
            width: 10,
            height: 5,
        };
        let healed = inpaint(&source, region, InpaintAlgorithm::NavierStokes, 5).expect("inpaint");
        let red = |x: u32| healed.get_pixel(x, 2).0[0];
        assert!(red(6) > red(13));
        assert!(red(9) > 0 && red(9) < 255);
        assert_eq!(healed.get_pixel(4, 2).0, [255, 255, 255, 255]);
        assert_eq!(healed.get_pixel(15, 2).0, [0, 0, 0, 255]);
    }

    #[test]
    fn inpaint_whole_image_is_unavailable() {
        let source = RgbaImage::from_pixel(8, 8, Pixel([1, 2, 3, 255]));
        let region = PixelRect {
            x: 0,
            y: 0,
            width: 8,
            height: 8,
        };
        assert!(inpaint(&source, region, InpaintAlgorithm::Telea, 5).is_none());
    }

    #[test]
    fn fill_rect_writes_color() {
        let source = RgbaImage::from_pixel(8, 8, Pixel([0, 0, 0, 255]));
        let region = PixelRect {
            x: 2,
            y: 2,
            width: 3,
            height: 3,
        };
        let out = fill_rect(&source, region, Rgba::WHITE);
        assert_eq!(out.get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(6, 6).0, [0, 0, 0, 255]);
    }
}
