/*!
 * Desktop panel for dashviz
 *
 * - Pick a chart kind, enter its filters and press "Fetch Data"
 * - Requests are debounced per kind; only the newest reply is shown
 * - The drawing area is repainted only when the active kind or its data changes
 * - "Save SVG…" writes the current chart to disk
 *
 * Platform support: Windows, macOS, Linux
 */

use dashviz::viz::{Anchor, Axis, AxisOrient, Element, Rgb, Surface};
use dashviz::{ChartKind, Client, Config, Dashboard, FetchEvent, FilterField, viz};
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, vec2};
use log::{debug, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let config = Config::load(None).unwrap_or_else(|err| {
        warn!("falling back to default config: {err:#}");
        Config::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 560.0])
            .with_min_inner_size([560.0, 480.0])
            .with_title("dashviz"),
        ..Default::default()
    };

    eframe::run_native(
        "dashviz",
        options,
        Box::new(move |_cc| Ok(Box::new(DashApp::new(&config)))),
    )
}

struct DashApp {
    dash: Dashboard<Client>,
    selected: Option<ChartKind>,
    status_message: String,
    error_message: String,
}

impl DashApp {
    fn new(config: &Config) -> Self {
        Self {
            dash: Dashboard::new(Client::from_config(config), config),
            selected: None,
            status_message: String::new(),
            error_message: String::new(),
        }
    }

    fn fetch(&mut self, kind: ChartKind) {
        match self.dash.commit(kind, Instant::now()) {
            Ok(()) => {
                self.error_message.clear();
                self.status_message = format!("Waiting to fetch {kind} data...");
            }
            Err(err) => {
                self.error_message = err.to_string();
            }
        }
    }

    fn handle_events(&mut self, events: Vec<FetchEvent>) {
        for ev in events {
            match ev {
                FetchEvent::Issued { kind, query, .. } => {
                    self.status_message = format!("Fetching {kind}: {}", query.path_and_query());
                }
                FetchEvent::Applied { kind, rows, .. } => {
                    self.error_message.clear();
                    self.status_message = format!("Loaded {rows} {kind} records");
                }
                FetchEvent::Stale { kind, seq } => {
                    debug!("{kind}: dropped stale reply #{seq}");
                }
                FetchEvent::Failed { error, .. } => {
                    self.error_message = error.to_string();
                }
            }
        }
    }

    fn save_svg(&mut self) {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let name = match self.dash.active() {
            Some(kind) => format!("{kind}_chart.svg"),
            None => "chart.svg".to_string(),
        };
        let Some(path) = rfd::FileDialog::new()
            .set_directory(home)
            .set_file_name(name)
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        match viz::save_svg(self.dash.surface(), &path) {
            Ok(()) => self.status_message = format!("Saved {}", path.display()),
            Err(err) => self.error_message = format!("Failed to save SVG: {err}"),
        }
    }
}

impl eframe::App for DashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let events = self.dash.tick(Instant::now());
        self.handle_events(events);
        self.dash.repaint_if_dirty();

        // Replies arrive off-thread; keep polling while anything is outstanding.
        if !self.dash.fetcher().is_idle() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Data Visualization Dashboard");
            ui.add_space(10.0);

            let before = self.selected;
            egui::ComboBox::from_label("Chart")
                .selected_text(self.selected.map_or("Select", |k| k.title()))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.selected, None, "Select");
                    for kind in ChartKind::ALL {
                        ui.selectable_value(&mut self.selected, Some(kind), kind.title());
                    }
                });
            if self.selected != before {
                self.dash.select(self.selected);
                self.dash.repaint_if_dirty();
            }

            if let Some(kind) = self.selected {
                ui.add_space(5.0);
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        for field in FilterField::for_kind(kind) {
                            ui.label(format!("{}:", field.label()));
                            ui.add(
                                egui::TextEdit::singleline(
                                    self.dash.filters_mut().input_mut().get_mut(*field),
                                )
                                .desired_width(80.0),
                            );
                        }
                        if ui.button("Fetch Data").clicked() {
                            self.fetch(kind);
                        }
                    });
                });
            }

            ui.add_space(10.0);

            let surface = self.dash.surface();
            let size = vec2(surface.width() as f32, surface.height() as f32);
            let (response, painter) = ui.allocate_painter(size, Sense::hover());
            painter.rect_filled(response.rect, 0.0, Color32::WHITE);
            paint_surface(&painter, response.rect, surface);

            ui.add_space(10.0);

            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.dash.surface().is_empty(), egui::Button::new("Save SVG…"))
                    .clicked()
                {
                    self.save_svg();
                }
                if !self.dash.fetcher().is_idle() {
                    ui.spinner();
                }
            });

            if !self.status_message.is_empty() {
                ui.colored_label(Color32::DARK_GREEN, &self.status_message);
            }

            if !self.error_message.is_empty() {
                ui.colored_label(Color32::RED, &self.error_message);
            }
        });
    }
}

fn color(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

fn at(rect: Rect, x: f64, y: f64) -> Option<Pos2> {
    (x.is_finite() && y.is_finite()).then(|| rect.min + vec2(x as f32, y as f32))
}

fn paint_surface(painter: &egui::Painter, rect: Rect, surface: &Surface) {
    for element in surface.elements() {
        match element {
            Element::Axis(axis) => paint_axis(painter, rect, axis),
            Element::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                if let (Some(a), Some(b)) = (at(rect, *x, *y), at(rect, x + width, y + height)) {
                    painter.rect_filled(Rect::from_two_pos(a, b), 0.0, color(*fill));
                }
            }
            Element::Path {
                points,
                stroke,
                stroke_width,
            } => {
                let stroke = Stroke::new(*stroke_width as f32, color(*stroke));
                let mut run: Vec<Pos2> = Vec::new();
                for p in points.iter().map(|(x, y)| at(rect, *x, *y)).chain(std::iter::once(None)) {
                    match p {
                        Some(p) => run.push(p),
                        None => {
                            if run.len() > 1 {
                                painter.add(Shape::line(std::mem::take(&mut run), stroke));
                            }
                            run.clear();
                        }
                    }
                }
            }
            Element::Circle { cx, cy, r, fill } => {
                if let Some(c) = at(rect, *cx, *cy) {
                    painter.circle_filled(c, *r as f32, color(*fill));
                }
            }
        }
    }
}

fn paint_axis(painter: &egui::Painter, rect: Rect, axis: &Axis) {
    let stroke = Stroke::new(1.0, Color32::BLACK);
    let font = FontId::proportional(Axis::FONT_PX as f32);
    let (ox, oy) = axis.origin;
    let size = Axis::TICK_SIZE;
    let gap = Axis::TICK_SIZE + Axis::TICK_PADDING;

    let domain = match axis.orient {
        AxisOrient::Bottom => [
            (ox, oy + size),
            (ox, oy),
            (ox + axis.length, oy),
            (ox + axis.length, oy + size),
        ],
        AxisOrient::Left => [
            (ox - size, oy + axis.length),
            (ox, oy + axis.length),
            (ox, oy),
            (ox - size, oy),
        ],
    };
    let domain: Option<Vec<Pos2>> = domain.iter().map(|(x, y)| at(rect, *x, *y)).collect();
    if let Some(domain) = domain {
        painter.add(Shape::line(domain, stroke));
    }

    for tick in &axis.ticks {
        let (a, b, label_at, align) = match axis.orient {
            AxisOrient::Bottom => {
                let x = ox + tick.offset;
                ((x, oy), (x, oy + size), (x, oy + gap), Align2::CENTER_TOP)
            }
            AxisOrient::Left => {
                let y = oy + tick.offset;
                ((ox, y), (ox - size, y), (ox - gap, y), Align2::RIGHT_CENTER)
            }
        };
        let (Some(a), Some(b), Some(label_at)) = (
            at(rect, a.0, a.1),
            at(rect, b.0, b.1),
            at(rect, label_at.0, label_at.1),
        ) else {
            continue;
        };
        painter.line_segment([a, b], stroke);
        painter.text(label_at, align, &tick.label, font.clone(), Color32::BLACK);
    }

    let t = &axis.title;
    let Some(pos) = at(rect, ox + t.dx, oy + t.dy) else {
        return;
    };
    if t.rotated {
        let galley = painter.layout_no_wrap(t.text.clone(), font, Color32::BLACK);
        let w = galley.size().x;
        // Text runs upwards from its start.
        let start = match t.anchor {
            Anchor::Start => pos,
            Anchor::Middle => pos + vec2(0.0, w / 2.0),
            Anchor::End => pos + vec2(0.0, w),
        };
        let shape = egui::epaint::TextShape::new(start, galley, Color32::BLACK)
            .with_angle(-std::f32::consts::FRAC_PI_2);
        painter.add(shape);
    } else {
        let align = match t.anchor {
            Anchor::Start => Align2::LEFT_BOTTOM,
            Anchor::Middle => Align2::CENTER_BOTTOM,
            Anchor::End => Align2::RIGHT_BOTTOM,
        };
        painter.text(pos, align, &t.text, font, Color32::BLACK);
    }
}
