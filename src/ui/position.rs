use std::str::FromStr;

/// Left inset used when the popup cannot fit on its preferred side.
const EDGE_INSET: i32 = 9;

/// Which way the popup extends horizontally from the bound element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Opens {
    Left,
    #[default]
    Right,
    Center,
}

impl FromStr for Opens {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "left" => Ok(Opens::Left),
            "right" => Ok(Opens::Right),
            "center" => Ok(Opens::Center),
            other => Err(other.to_string()),
        }
    }
}

/// Whether the popup opens below or above the bound element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Drops {
    Up,
    #[default]
    Down,
    /// Down unless that would run past the parent's scroll height.
    Auto,
}

impl FromStr for Drops {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "up" => Ok(Drops::Up),
            "down" => Ok(Drops::Down),
            "auto" => Ok(Drops::Auto),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Bounds {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// The element the popup is positioned inside. `is_root` frames sit at the
/// origin and span the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParentFrame {
    pub is_root: bool,
    pub bounds: Bounds,
    pub scroll_left: i32,
    pub scroll_top: i32,
    pub scroll_height: i32,
}

impl ParentFrame {
    pub fn root(width: i32, height: i32) -> Self {
        ParentFrame {
            is_root: true,
            bounds: Bounds::new(0, 0, width, height),
            scroll_left: 0,
            scroll_top: 0,
            scroll_height: height,
        }
    }
}

/// Horizontal anchor of the popup, relative to the parent frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Horizontal {
    /// Offset of the popup's left edge.
    Left(i32),
    /// Offset of the popup's right edge from the frame's right edge.
    Right(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub top: i32,
    pub horizontal: Horizontal,
    pub drop_up: bool,
}

impl Placement {
    /// Left edge of a `width`-wide popup inside a `frame_width`-wide frame.
    pub fn left_edge(&self, width: i32, frame_width: i32) -> i32 {
        match self.horizontal {
            Horizontal::Left(x) => x,
            Horizontal::Right(r) => frame_width - r - width,
        }
    }
}

/// Where the popup goes for a bound element at `element`.
///
/// Vertical: below the element, above it, or below unless the popup would
/// reach the parent's scroll height. Horizontal: aligned to the element's
/// left edge, right edge, or centre; when that overflows the viewport the
/// popup pins to the right edge, or to a small left inset when it would
/// start off-screen.
pub fn compute_placement(
    element: Bounds,
    container: (i32, i32),
    parent: &ParentFrame,
    viewport_width: i32,
    opens: Opens,
    drops: Drops,
) -> Placement {
    let (width, height) = container;
    let (parent_top, parent_left, parent_right_edge) = if parent.is_root {
        (0, 0, viewport_width)
    } else {
        (
            parent.bounds.y - parent.scroll_top,
            parent.bounds.x - parent.scroll_left,
            parent.bounds.x + parent.bounds.width,
        )
    };

    let below = element.y + element.height - parent_top;
    let above = element.y - height - parent_top;
    let (top, drop_up) = match drops {
        Drops::Down => (below, false),
        Drops::Up => (above, true),
        Drops::Auto if below + height >= parent.scroll_height => (above, true),
        Drops::Auto => (below, false),
    };

    let horizontal = match opens {
        Opens::Left => {
            let right = parent_right_edge - element.x - element.width;
            if width + right > viewport_width {
                Horizontal::Left(EDGE_INSET)
            } else {
                Horizontal::Right(right)
            }
        }
        Opens::Center => {
            let left = element.x - parent_left + element.width / 2 - width / 2;
            if left < 0 {
                Horizontal::Left(EDGE_INSET)
            } else if left + width > viewport_width {
                Horizontal::Right(0)
            } else {
                Horizontal::Left(left)
            }
        }
        Opens::Right => {
            let left = element.x - parent_left;
            if left + width > viewport_width {
                Horizontal::Right(0)
            } else {
                Horizontal::Left(left)
            }
        }
    };

    Placement {
        top,
        horizontal,
        drop_up,
    }
}
