#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size of a measured area in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub width: u32,
    pub height: u32,
}

/// Normalized screen rectangle, `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ScreenRect {
    pub fn spanning(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    pub fn size(&self) -> Measurement {
        Measurement {
            width: self.x0.abs_diff(self.x1),
            height: self.y0.abs_diff(self.y1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GestureState {
    #[default]
    Idle,
    Dragging {
        origin: Point,
        current: Point,
    },
}

#[derive(Debug, Default)]
pub struct MeasurementOverlay {
    state: GestureState,
}

impl MeasurementOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a gesture; pressing again mid-drag restarts it at `point`.
    pub fn press(&mut self, point: Point) {
        self.state = GestureState::Dragging {
            origin: point,
            current: point,
        };
    }

    pub fn move_to(&mut self, point: Point) {
        if let GestureState::Dragging { current, .. } = &mut self.state {
            *current = point;
        }
    }

    pub fn release(&mut self) -> Option<Measurement> {
        let rect = self.active_rect()?;
        self.state = GestureState::Idle;
        Some(rect.size())
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn active_rect(&self) -> Option<ScreenRect> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Dragging { origin, current } => {
                Some(ScreenRect::spanning(origin, current))
            }
        }
    }
}
