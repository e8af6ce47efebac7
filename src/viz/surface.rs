//! The drawing surface: a flat list of axes and marks in pixel space.
//!
//! Backends (SVG export, the desktop painter) read the surface; only the
//! renderer writes it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const YELLOW: Rgb = Rgb(255, 255, 0);
pub const BLUE: Rgb = Rgb(0, 0, 255);
pub const ORANGE: Rgb = Rgb(255, 165, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrient {
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Distance along the axis from its origin.
    pub offset: f64,
    pub label: String,
}

/// Axis caption, positioned relative to the axis origin.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTitle {
    pub text: String,
    pub dx: f64,
    pub dy: f64,
    /// Rotated -90° (reads bottom to top).
    pub rotated: bool,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub orient: AxisOrient,
    /// Translation of the axis origin on the surface.
    pub origin: (f64, f64),
    /// Length of the domain line.
    pub length: f64,
    pub ticks: Vec<Tick>,
    pub title: AxisTitle,
}

impl Axis {
    pub const TICK_SIZE: f64 = 6.0;
    pub const TICK_PADDING: f64 = 3.0;
    pub const FONT_PX: f64 = 10.0;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Axis(Axis),
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Rgb,
    },
    Path {
        points: Vec<(f64, f64)>,
        stroke: Rgb,
        stroke_width: f64,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        fill: Rgb,
    },
}

impl Element {
    pub fn is_axis(&self) -> bool {
        matches!(self, Element::Axis(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    elements: Vec<Element>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn axis_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_axis()).count()
    }

    /// Rectangles, paths and circles.
    pub fn mark_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_axis()).count()
    }

    pub fn rects(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.elements.iter().filter_map(|e| match e {
            Element::Rect {
                x,
                y,
                width,
                height,
                ..
            } => Some((*x, *y, *width, *height)),
            _ => None,
        })
    }
}
