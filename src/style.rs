use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    pub fn a(self) -> u8 {
        self.0[3]
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        Self([self.0[0], self.0[1], self.0[2], alpha])
    }

    /// Scales the alpha channel by `opacity` in [0, 1].
    pub fn faded(self, opacity: f32) -> Self {
        let alpha = (self.a() as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(alpha)
    }

    /// Perceived brightness in [0, 1].
    pub fn luminance(self) -> f32 {
        (0.299 * self.r() as f32 + 0.587 * self.g() as f32 + 0.114 * self.b() as f32) / 255.0
    }

    /// Black on light backgrounds, white on dark ones.
    pub fn contrasting_text(self) -> Self {
        if self.luminance() > 0.5 {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke_color: Rgba,
    pub stroke_width: f32,
    pub fill_color: Option<Rgba>,
    pub opacity: f32,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub arrowhead_size: f32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke_color: Rgba::rgb(255, 80, 80),
            stroke_width: 3.0,
            fill_color: None,
            opacity: 1.0,
            font_size: 18.0,
            font_weight: FontWeight::Normal,
            arrowhead_size: 12.0,
        }
    }
}

impl Style {
    pub const MIN_FONT_SIZE: f32 = 8.0;
    pub const MAX_FONT_SIZE: f32 = 72.0;

    pub fn with_stroke(mut self, color: Rgba, width: f32) -> Self {
        self.stroke_color = color;
        self.set_stroke_width(width);
        self
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width.max(1.0);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.font_size = size.clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn stroke(&self) -> Rgba {
        self.stroke_color.faded(self.opacity)
    }

    pub fn fill(&self) -> Option<Rgba> {
        self.fill_color.map(|color| color.faded(self.opacity))
    }
}
