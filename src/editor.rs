use crate::Message;
use crate::curve::{self, CurveConfig, Marker};
use crate::editor::plot::Plot;
use iced::mouse;
use iced::widget::canvas::{self, Action, Geometry, Program};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

pub mod plot;
pub mod ticks;

/// Pixel radius of a marker dot.
const MARKER_RADIUS: f32 = 5.0;
/// Pointer distance within which a press grabs a marker.
const HIT_RADIUS: f32 = 10.0;
const TARGET_DELAY_TICKS: f64 = 5.0;
const SLOT_LABEL_MIN_PX: f32 = 28.0;

const PLOT_BACKGROUND: Color = Color::WHITE;
const CANVAS_BACKGROUND: Color = Color {
    r: 0.97,
    g: 0.97,
    b: 0.97,
    a: 1.0,
};
const GRID_COLOR: Color = Color {
    r: 0.88,
    g: 0.88,
    b: 0.88,
    a: 1.0,
};
const AXIS_LABEL_COLOR: Color = Color {
    r: 0.35,
    g: 0.35,
    b: 0.35,
    a: 1.0,
};
const CURVE_COLOR: Color = Color {
    r: 0.3,
    g: 0.5,
    b: 0.75,
    a: 1.0,
};
const MARKER_COLOR: Color = Color {
    r: 0.2,
    g: 0.4,
    b: 0.65,
    a: 1.0,
};
const ACTIVE_MARKER_COLOR: Color = Color {
    r: 0.85,
    g: 0.45,
    b: 0.15,
    a: 1.0,
};

pub struct CurveProgram<'a> {
    pub markers: &'a [Marker],
    pub config: &'a CurveConfig,
}

pub struct Drag {
    index: usize,
    y: f64,
}

#[derive(Default)]
pub struct EditorState {
    drag: Option<Drag>,
    hovered: Option<usize>,
}

impl<'a> CurveProgram<'a> {
    fn marker_at(&self, plot: &Plot, position: Point) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for marker in self.markers {
            let center = plot.marker_point(marker.x, marker.y);
            let distance = position.distance(center);
            if distance <= HIT_RADIUS && best.is_none_or(|(_, d)| distance < d) {
                best = Some((marker.index, distance));
            }
        }
        best.map(|(index, _)| index)
    }

    /// The marker's display delay, with the live drag candidate applied
    /// on top of the committed value.
    fn display_y(&self, marker: &Marker, state: &EditorState) -> f64 {
        match &state.drag {
            Some(drag) if drag.index == marker.index => drag.y,
            _ => marker.y,
        }
    }

    fn draw_grid(&self, frame: &mut canvas::Frame, plot: &Plot) {
        let inner = plot.inner();
        let max_delay = self.config.max_delay_secs;

        // Horizontal gridlines at nice delay intervals, labelled in the
        // left gutter.
        let step = ticks::nice_step(max_delay, TARGET_DELAY_TICKS);
        if step > 0.0 {
            let mut secs = 0.0;
            while secs <= max_delay + 1e-9 {
                let py = plot.y_to_px(curve::norm_from_secs(secs, max_delay));
                frame.stroke(
                    &canvas::Path::line(
                        Point::new(inner.x, py),
                        Point::new(inner.x + inner.width, py),
                    ),
                    canvas::Stroke::default().with_color(GRID_COLOR).with_width(1.0),
                );
                frame.fill_text(canvas::Text {
                    content: ticks::format_secs_label(secs, step),
                    position: Point::new(4.0, py - 6.0),
                    color: AXIS_LABEL_COLOR,
                    size: 10.0.into(),
                    ..Default::default()
                });
                secs += step;
            }
        }

        // Vertical gridlines at the canonical slots, labelled with the
        // item index below the plot.
        let count = self.markers.len();
        let stride = ticks::slot_stride(count, inner.width, SLOT_LABEL_MIN_PX);
        for index in (0..count).step_by(stride) {
            let px = plot.x_to_px(curve::slot_x(index, count));
            frame.stroke(
                &canvas::Path::line(
                    Point::new(px, inner.y),
                    Point::new(px, inner.y + inner.height),
                ),
                canvas::Stroke::default().with_color(GRID_COLOR).with_width(1.0),
            );
            frame.fill_text(canvas::Text {
                content: index.to_string(),
                position: Point::new(px - 3.0, inner.y + inner.height + 6.0),
                color: AXIS_LABEL_COLOR,
                size: 10.0.into(),
                ..Default::default()
            });
        }
    }

    fn draw_curve_line(&self, frame: &mut canvas::Frame, plot: &Plot, state: &EditorState) {
        if self.markers.len() < 2 {
            return;
        }

        // Sort a local copy for line drawing; stored order stays as
        // inserted so random curves keep their insertion order.
        let mut ordered: Vec<&Marker> = self.markers.iter().collect();
        ordered.sort_by(|a, b| a.x.total_cmp(&b.x));

        let points: Vec<Point> = ordered
            .iter()
            .map(|marker| plot.marker_point(marker.x, self.display_y(marker, state)))
            .collect();

        let path = canvas::Path::new(|builder| {
            builder.move_to(points[0]);
            if points.len() == 2 {
                builder.line_to(points[1]);
                return;
            }
            for i in 1..points.len() - 1 {
                let next = points[i + 1];
                if i + 1 == points.len() - 1 {
                    builder.quadratic_curve_to(points[i], next);
                } else {
                    let mid = Point::new(
                        (points[i].x + next.x) / 2.0,
                        (points[i].y + next.y) / 2.0,
                    );
                    builder.quadratic_curve_to(points[i], mid);
                }
            }
        });

        frame.stroke(
            &path,
            canvas::Stroke::default().with_color(CURVE_COLOR).with_width(1.5),
        );
    }

    fn draw_markers(&self, frame: &mut canvas::Frame, plot: &Plot, state: &EditorState) {
        for marker in self.markers {
            let y = self.display_y(marker, state);
            let center = plot.marker_point(marker.x, y);
            let dragging = state.drag.as_ref().is_some_and(|d| d.index == marker.index);
            let hovered = state.hovered == Some(marker.index);

            let (radius, color) = if dragging {
                (MARKER_RADIUS + 2.0, ACTIVE_MARKER_COLOR)
            } else if hovered {
                (MARKER_RADIUS + 1.5, MARKER_COLOR)
            } else {
                (MARKER_RADIUS, MARKER_COLOR)
            };

            frame.fill(&canvas::Path::circle(center, radius), color);
            if dragging || hovered {
                frame.stroke(
                    &canvas::Path::circle(center, radius + 2.0),
                    canvas::Stroke::default()
                        .with_color(Color::from_rgba(0.0, 0.0, 0.0, 0.25))
                        .with_width(1.0),
                );
            }

            if dragging {
                // Live readout next to the grabbed marker; nothing is
                // committed until the button is released.
                let secs = curve::delay_secs(y, self.config.max_delay_secs);
                frame.fill_text(canvas::Text {
                    content: format!("{secs:.2} s"),
                    position: Point::new(center.x + 10.0, center.y - 16.0),
                    color: ACTIVE_MARKER_COLOR,
                    size: 12.0.into(),
                    ..Default::default()
                });

                let inner = plot.inner();
                frame.stroke(
                    &canvas::Path::line(
                        Point::new(inner.x, center.y),
                        Point::new(inner.x + inner.width, center.y),
                    ),
                    canvas::Stroke::default()
                        .with_color(Color::from_rgba(0.85, 0.45, 0.15, 0.4))
                        .with_width(1.0),
                );
            }
        }
    }
}

impl<'a> Program<Message> for CurveProgram<'a> {
    type State = EditorState;

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let plot = Plot::new(bounds.size());
        let inner = plot.inner();

        frame.fill_rectangle(
            Point::new(0.0, 0.0),
            Size::new(bounds.width, bounds.height),
            CANVAS_BACKGROUND,
        );
        frame.fill_rectangle(inner.position(), inner.size(), PLOT_BACKGROUND);

        self.draw_grid(&mut frame, &plot);
        self.draw_curve_line(&mut frame, &plot, state);
        self.draw_markers(&mut frame, &plot, state);

        frame.stroke(
            &canvas::Path::rectangle(inner.position(), inner.size()),
            canvas::Stroke::default()
                .with_color(Color::from_rgb(0.75, 0.75, 0.75))
                .with_width(1.0),
        );

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Action<Message>> {
        match event {
            iced::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let Some(position) = cursor.position_in(bounds) {
                    let plot = Plot::new(bounds.size());
                    if let Some(index) = self.marker_at(&plot, position) {
                        let y = self
                            .markers
                            .iter()
                            .find(|m| m.index == index)
                            .map(|m| m.y)
                            .unwrap_or_default();
                        state.drag = Some(Drag { index, y });
                        return Some(Action::publish(Message::None).and_capture());
                    }
                }
            }
            iced::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if let Some(drag) = &mut state.drag {
                    // Only the vertical pointer position matters; the
                    // slot is immutable during a drag. Positions outside
                    // the plot clamp onto its edge.
                    let plot = Plot::new(bounds.size());
                    drag.y = plot.y_from_px(position.y - bounds.y);
                    return Some(Action::publish(Message::None).and_capture());
                }

                let plot = Plot::new(bounds.size());
                let hovered = cursor
                    .position_in(bounds)
                    .and_then(|p| self.marker_at(&plot, p));
                if hovered != state.hovered {
                    state.hovered = hovered;
                    return Some(Action::publish(Message::MarkerHovered(hovered)));
                }
            }
            iced::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if let Some(drag) = state.drag.take() {
                    return Some(Action::publish(Message::MarkerDragged {
                        index: drag.index,
                        y: drag.y,
                    }));
                }
            }
            _ => {}
        }
        None
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if state.drag.is_some() {
            return mouse::Interaction::Grabbing;
        }

        if let Some(position) = cursor.position_in(bounds) {
            let plot = Plot::new(bounds.size());
            if self.marker_at(&plot, position).is_some() {
                return mouse::Interaction::Grab;
            }
        }

        mouse::Interaction::default()
    }
}
