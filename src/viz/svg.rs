//! SVG output for a [`Surface`] through Plotters.
//!
//! Non-finite coordinates (from values that failed numeric coercion) cannot
//! be placed: such rectangles and circles are skipped and paths break around
//! them, so the rest of the chart still draws.

use super::surface::{Anchor, Axis, AxisOrient, BLACK, Element, Rgb, Surface};
use anyhow::{Result, anyhow};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use plotters_svg::SVGBackend;
use std::fs;
use std::path::Path;

/// Serialise the surface to an SVG document.
pub fn to_svg(surface: &Surface) -> Result<String> {
    let mut buf = String::new();
    {
        let root = SVGBackend::with_string(&mut buf, (surface.width(), surface.height()))
            .into_drawing_area();
        root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
        for element in surface.elements() {
            draw_element(&root, element)?;
        }
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(buf)
}

pub fn save_svg<P: AsRef<Path>>(surface: &Surface, path: P) -> Result<()> {
    let svg = to_svg(surface)?;
    fs::write(path, svg)?;
    Ok(())
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn px(v: f64) -> Option<i32> {
    v.is_finite().then(|| v.round() as i32)
}

fn pt(x: f64, y: f64) -> Option<(i32, i32)> {
    Some((px(x)?, px(y)?))
}

fn text_style(anchor: Anchor, v: VPos, rotated: bool) -> TextStyle<'static> {
    let h = match anchor {
        Anchor::Start => HPos::Left,
        Anchor::Middle => HPos::Center,
        Anchor::End => HPos::Right,
    };
    let font = ("sans-serif", Axis::FONT_PX).into_font();
    let font = if rotated {
        font.transform(FontTransform::Rotate270)
    } else {
        font
    };
    TextStyle::from(font).color(&BLACK_RGB).pos(Pos::new(h, v))
}

const BLACK_RGB: RGBColor = RGBColor(BLACK.0, BLACK.1, BLACK.2);

fn draw_element<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, el: &Element) -> Result<()> {
    match el {
        Element::Axis(axis) => draw_axis(root, axis),
        Element::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            let (Some(a), Some(b)) = (pt(*x, *y), pt(x + width, y + height)) else {
                return Ok(());
            };
            let corners = [(a.0.min(b.0), a.1.min(b.1)), (a.0.max(b.0), a.1.max(b.1))];
            root.draw(&Rectangle::new(corners, rgb(*fill).filled()))
                .map_err(|e| anyhow!("{:?}", e))
        }
        Element::Path {
            points,
            stroke,
            stroke_width,
        } => {
            let style = rgb(*stroke).stroke_width(stroke_width.round().max(1.0) as u32);
            let mut run: Vec<(i32, i32)> = Vec::new();
            for p in points.iter().map(|(x, y)| pt(*x, *y)).chain(std::iter::once(None)) {
                match p {
                    Some(p) => run.push(p),
                    None => {
                        if run.len() > 1 {
                            root.draw(&PathElement::new(std::mem::take(&mut run), style))
                                .map_err(|e| anyhow!("{:?}", e))?;
                        }
                        run.clear();
                    }
                }
            }
            Ok(())
        }
        Element::Circle { cx, cy, r, fill } => {
            let Some(c) = pt(*cx, *cy) else {
                return Ok(());
            };
            root.draw(&Circle::new(c, r.round() as i32, rgb(*fill).filled()))
                .map_err(|e| anyhow!("{:?}", e))
        }
    }
}

fn draw_axis<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, axis: &Axis) -> Result<()> {
    let (ox, oy) = axis.origin;
    let line = BLACK_RGB.stroke_width(1);
    let size = Axis::TICK_SIZE;
    let gap = Axis::TICK_SIZE + Axis::TICK_PADDING;

    // Domain line with outer ticks at both ends.
    let domain = match axis.orient {
        AxisOrient::Bottom => vec![
            (ox, oy + size),
            (ox, oy),
            (ox + axis.length, oy),
            (ox + axis.length, oy + size),
        ],
        AxisOrient::Left => vec![
            (ox - size, oy + axis.length),
            (ox, oy + axis.length),
            (ox, oy),
            (ox - size, oy),
        ],
    };
    let domain: Option<Vec<(i32, i32)>> = domain.into_iter().map(|(x, y)| pt(x, y)).collect();
    if let Some(domain) = domain {
        root.draw(&PathElement::new(domain, line))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    for tick in &axis.ticks {
        let (mark, label_at, style) = match axis.orient {
            AxisOrient::Bottom => {
                let x = ox + tick.offset;
                (
                    [(x, oy), (x, oy + size)],
                    (x, oy + gap),
                    text_style(Anchor::Middle, VPos::Top, false),
                )
            }
            AxisOrient::Left => {
                let y = oy + tick.offset;
                (
                    [(ox, y), (ox - size, y)],
                    (ox - gap, y),
                    text_style(Anchor::End, VPos::Center, false),
                )
            }
        };
        let (Some(a), Some(b), Some(at)) = (
            pt(mark[0].0, mark[0].1),
            pt(mark[1].0, mark[1].1),
            pt(label_at.0, label_at.1),
        ) else {
            continue;
        };
        root.draw(&PathElement::new(vec![a, b], line))
            .map_err(|e| anyhow!("{:?}", e))?;
        root.draw(&Text::new(tick.label.clone(), at, style))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    let t = &axis.title;
    if let Some(at) = pt(ox + t.dx, oy + t.dy) {
        let v = if t.rotated { VPos::Top } else { VPos::Bottom };
        root.draw(&Text::new(t.text.clone(), at, text_style(t.anchor, v, t.rotated)))
            .map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(())
}
