use serde::Serialize;

/// Screen-space point in pixels. `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// Pixel size of a sprite texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteBounds {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned rectangle, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_center_size(center: Vec2, width: f32, height: f32) -> Self {
        let half_w = width.abs() * 0.5;
        let half_h = height.abs() * 0.5;
        Self {
            min: Vec2::new(center.x - half_w, center.y - half_h),
            max: Vec2::new(center.x + half_w, center.y + half_h),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Moves `current` toward `target` by at most `speed * dt_seconds`.
///
/// Returns the new position and whether the mover is within
/// `arrival_threshold` of the target. A mover already inside the threshold
/// stays where it is.
pub fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    dt_seconds: f32,
    arrival_threshold: f32,
) -> (Vec2, bool) {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let distance_sq = dx * dx + dy * dy;
    let threshold_sq = arrival_threshold * arrival_threshold;
    if distance_sq <= threshold_sq {
        return (current, true);
    }

    let distance = distance_sq.sqrt();
    let max_step = speed.max(0.0) * dt_seconds.max(0.0);
    if max_step >= distance {
        return (target, true);
    }

    let inv_distance = distance.recip();
    let next = Vec2 {
        x: current.x + dx * inv_distance * max_step,
        y: current.y + dy * inv_distance * max_step,
    };
    let arrived = next.distance_squared(target) <= threshold_sq;
    (next, arrived)
}
