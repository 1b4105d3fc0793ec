use egui::{pos2, vec2, Pos2, Rect, Vec2};

pub const HANDLE_SIZE: f32 = 8.0;

/// Resize handle slots, in the fixed order every annotation reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handle {
    TopLeft = 0,
    Top = 1,
    TopRight = 2,
    Left = 3,
    Right = 4,
    BottomLeft = 5,
    Bottom = 6,
    BottomRight = 7,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Left,
        Handle::Right,
        Handle::BottomLeft,
        Handle::Bottom,
        Handle::BottomRight,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn anchor(self, rect: Rect) -> Pos2 {
        let c = rect.center();
        match self {
            Handle::TopLeft => rect.left_top(),
            Handle::Top => pos2(c.x, rect.top()),
            Handle::TopRight => rect.right_top(),
            Handle::Left => pos2(rect.left(), c.y),
            Handle::Right => pos2(rect.right(), c.y),
            Handle::BottomLeft => rect.left_bottom(),
            Handle::Bottom => pos2(c.x, rect.bottom()),
            Handle::BottomRight => rect.right_bottom(),
        }
    }
}

pub fn normalized(a: Pos2, b: Pos2) -> Rect {
    Rect::from_two_pos(a, b)
}

pub fn normalize(rect: Rect) -> Rect {
    Rect::from_two_pos(rect.min, rect.max)
}

pub fn handle_rect(center: Pos2) -> Rect {
    Rect::from_center_size(center, Vec2::splat(HANDLE_SIZE))
}

/// All eight box handles.
pub fn box_handles(rect: Rect) -> Vec<Rect> {
    Handle::ALL
        .iter()
        .map(|handle| handle_rect(handle.anchor(rect)))
        .collect()
}

/// Moves the edge(s) owned by `handle` to `to` and re-normalizes.
pub fn resize_rect(rect: Rect, handle: Handle, to: Pos2) -> Rect {
    let mut r = rect;
    match handle {
        Handle::TopLeft => r.min = to,
        Handle::Top => r.min.y = to.y,
        Handle::TopRight => {
            r.min.y = to.y;
            r.max.x = to.x;
        }
        Handle::Left => r.min.x = to.x,
        Handle::Right => r.max.x = to.x,
        Handle::BottomLeft => {
            r.min.x = to.x;
            r.max.y = to.y;
        }
        Handle::Bottom => r.max.y = to.y,
        Handle::BottomRight => r.max = to,
    }
    normalize(r)
}

pub fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let ab_len_sq = ab.length_sq();
    if ab_len_sq <= f32::EPSILON {
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len_sq).clamp(0.0, 1.0);
    let projection = a + ab * t;
    (point - projection).length()
}

/// Square-constrained drag end: same sign per axis, side = larger extent.
pub fn constrain_square(start: Pos2, current: Pos2) -> Pos2 {
    let dx = current.x - start.x;
    let dy = current.y - start.y;
    let side = dx.abs().max(dy.abs());
    pos2(start.x + side * signum(dx), start.y + side * signum(dy))
}

/// Snaps the drag direction to the nearest 45 degree step.
pub fn snap_angle_45(start: Pos2, current: Pos2) -> Pos2 {
    let delta = current - start;
    let length = delta.length();
    if length <= f32::EPSILON {
        return current;
    }
    let step = std::f32::consts::FRAC_PI_4;
    let angle = (delta.y.atan2(delta.x) / step).round() * step;
    start + vec2(angle.cos(), angle.sin()) * length
}

fn signum(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Clamps `rect` to `bounds`, returning `None` when nothing is left.
pub fn clamp_rect(rect: Rect, bounds: Rect) -> Option<Rect> {
    let clipped = normalize(rect).intersect(bounds);
    if clipped.width() > 0.0 && clipped.height() > 0.0 {
        Some(clipped)
    } else {
        None
    }
}
