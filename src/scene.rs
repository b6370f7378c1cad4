// PlacentaFlow - Sequential Placental Circulation Animator
// Licensed under MIT License

//! Stateless scene painting.
//!
//! Draws the anatomical background, the per-frame particle list and the
//! conditional overlays onto an `egui::Painter`. All geometry is authored on
//! a logical 800x500 canvas and mapped to the screen with an
//! aspect-preserving transform, so the diagram scales with the window.

use egui::emath::RectTransform;
use egui::epaint::QuadraticBezierShape;
use egui::{pos2, vec2, Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke};

use crate::controller::AnimationState;
use crate::particles::{Particle, FETAL_BLUE, MATERNAL_RED, VILLOUS_CENTERS};

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 500.0;

const CANVAS_BACKGROUND: Color32 = Color32::from_rgb(248, 249, 250);
const DECIDUA_FILL: Color32 = Color32::from_rgb(230, 160, 188);
const INTERVILLOUS_FILL: Color32 = Color32::from_rgb(255, 192, 203);
const CHORIONIC_FILL: Color32 = Color32::from_rgb(216, 150, 184);
const OUTLINE_GRAY: Color32 = Color32::from_rgb(85, 85, 85);

/// Segments used when flattening quadratic edges into polylines.
const CURVE_STEPS: usize = 24;

/// One quadratic Bezier edge of a band or vessel.
#[derive(Clone, Copy)]
struct QuadEdge {
    from: Pos2,
    ctrl: Pos2,
    to: Pos2,
}

impl QuadEdge {
    const fn new(from: Pos2, ctrl: Pos2, to: Pos2) -> Self {
        Self { from, ctrl, to }
    }

    fn point(&self, t: f32) -> Pos2 {
        let u = 1.0 - t;
        pos2(
            u * u * self.from.x + 2.0 * u * t * self.ctrl.x + t * t * self.to.x,
            u * u * self.from.y + 2.0 * u * t * self.ctrl.y + t * t * self.to.y,
        )
    }

    fn flatten(&self, out: &mut Vec<Pos2>) {
        for step in 0..=CURVE_STEPS {
            out.push(self.point(step as f32 / CURVE_STEPS as f32));
        }
    }
}

/// Aspect-preserving transform from the logical canvas onto `screen`,
/// centered in both directions.
pub fn canvas_transform(screen: Rect) -> RectTransform {
    let scale = (screen.width() / CANVAS_WIDTH).min(screen.height() / CANVAS_HEIGHT);
    let fitted = Rect::from_center_size(
        screen.center(),
        vec2(CANVAS_WIDTH, CANVAS_HEIGHT) * scale.max(0.0),
    );
    RectTransform::from_to(
        Rect::from_min_size(Pos2::ZERO, vec2(CANVAS_WIDTH, CANVAS_HEIGHT)),
        fitted,
    )
}

pub fn paint_scene(
    painter: &Painter,
    to_screen: &RectTransform,
    state: &AnimationState,
    particles: &[Particle],
) {
    let s = to_screen.scale().x;
    painter.rect_filled(*to_screen.to(), 0.0, CANVAS_BACKGROUND);

    let thin = Stroke::new(1.0 * s, Color32::BLACK);

    // Maternal side (decidua basalis).
    fill_band(
        painter,
        to_screen,
        QuadEdge::new(pos2(150.0, 450.0), pos2(400.0, 500.0), pos2(650.0, 450.0)),
        QuadEdge::new(pos2(150.0, 380.0), pos2(400.0, 420.0), pos2(650.0, 380.0)),
        DECIDUA_FILL,
        thin,
    );

    // Placenta body (intervillous space).
    fill_band(
        painter,
        to_screen,
        QuadEdge::new(pos2(150.0, 380.0), pos2(400.0, 420.0), pos2(650.0, 380.0)),
        QuadEdge::new(pos2(150.0, 200.0), pos2(400.0, 160.0), pos2(650.0, 200.0)),
        INTERVILLOUS_FILL.gamma_multiply(0.7),
        thin,
    );

    // Fetal side (chorionic plate).
    fill_band(
        painter,
        to_screen,
        QuadEdge::new(pos2(150.0, 200.0), pos2(400.0, 160.0), pos2(650.0, 200.0)),
        QuadEdge::new(pos2(150.0, 150.0), pos2(400.0, 110.0), pos2(650.0, 150.0)),
        CHORIONIC_FILL,
        thin,
    );

    // Umbilical cord: blue sheath with a dashed red core for the arteries.
    let cord = [to_screen * pos2(400.0, 110.0), to_screen * pos2(400.0, 20.0)];
    painter.line_segment(cord, Stroke::new(15.0 * s, FETAL_BLUE));
    painter.extend(Shape::dashed_line(
        &cord,
        Stroke::new(7.0 * s, MATERNAL_RED),
        1.0 * s,
        8.0 * s,
    ));

    // Villous tree outlines: (entry x, basal apex x, exit x) per tree.
    for (left, apex, right) in [(280.0, 320.0, 360.0), (370.0, 400.0, 430.0), (440.0, 520.0, 600.0)] {
        let mut points = vec![pos2(left, 150.0), pos2(left, 200.0)];
        QuadEdge::new(pos2(left, 200.0), pos2(left, 350.0), pos2(apex, 350.0)).flatten(&mut points);
        QuadEdge::new(pos2(apex, 350.0), pos2(right, 350.0), pos2(right, 200.0))
            .flatten(&mut points);
        points.push(pos2(right, 150.0));
        let points: Vec<Pos2> = points.into_iter().map(|p| to_screen * p).collect();
        painter.extend(Shape::dashed_line(
            &points,
            Stroke::new(1.0 * s, OUTLINE_GRAY),
            2.0 * s,
            2.0 * s,
        ));
    }

    // Spiral arteries feeding the intervillous space from below.
    for x in [250.0, 400.0, 550.0] {
        stroke_quad(
            painter,
            to_screen,
            QuadEdge::new(pos2(x, 450.0), pos2(x - 20.0, 400.0), pos2(x, 350.0)),
            Stroke::new(3.0 * s, MATERNAL_RED),
        );
    }

    // Decidual veins draining it.
    for x in DECIDUAL_VEIN_XS {
        stroke_quad(
            painter,
            to_screen,
            QuadEdge::new(pos2(x, 350.0), pos2(x + 20.0, 400.0), pos2(x, 450.0)),
            Stroke::new(3.0 * s, FETAL_BLUE),
        );
    }

    if state.stage >= 5 {
        let opacity = if state.stage == 5 {
            state.progress / 100.0
        } else {
            1.0
        };
        paint_exchange_indicators(painter, to_screen, opacity);
    }

    for particle in particles {
        painter.circle_filled(
            to_screen * pos2(particle.x, particle.y),
            particle.size * s,
            particle.color.gamma_multiply(particle.opacity),
        );
    }

    if state.show_labels {
        paint_labels(painter, to_screen);
    }
}

const DECIDUAL_VEIN_XS: [f32; 3] = [300.0, 400.0, 500.0];

fn fill_band(
    painter: &Painter,
    to_screen: &RectTransform,
    near: QuadEdge,
    far: QuadEdge,
    fill: Color32,
    stroke: Stroke,
) {
    // Triangle strip between the two sampled edges. The bands are gently
    // concave, so a plain filled path would tessellate incorrectly.
    let mut mesh = Mesh::default();
    for step in 0..=CURVE_STEPS {
        let t = step as f32 / CURVE_STEPS as f32;
        mesh.colored_vertex(to_screen * near.point(t), fill);
        mesh.colored_vertex(to_screen * far.point(t), fill);
    }
    for i in 0..CURVE_STEPS as u32 {
        let a = i * 2;
        mesh.add_triangle(a, a + 1, a + 2);
        mesh.add_triangle(a + 1, a + 3, a + 2);
    }
    painter.add(Shape::mesh(mesh));

    let mut outline = Vec::with_capacity(2 * (CURVE_STEPS + 1));
    near.flatten(&mut outline);
    let mut back = Vec::with_capacity(CURVE_STEPS + 1);
    far.flatten(&mut back);
    outline.extend(back.into_iter().rev());
    let outline: Vec<Pos2> = outline.into_iter().map(|p| to_screen * p).collect();
    painter.add(Shape::closed_line(outline, stroke));
}

fn stroke_quad(painter: &Painter, to_screen: &RectTransform, edge: QuadEdge, stroke: Stroke) {
    painter.add(QuadraticBezierShape::from_points_stroke(
        [
            to_screen * edge.from,
            to_screen * edge.ctrl,
            to_screen * edge.to,
        ],
        false,
        Color32::TRANSPARENT,
        stroke,
    ));
}

/// Paired O2/CO2 diffusion glyphs at each villous tree. During stage 5 the
/// caller ramps `opacity` with progress; afterwards they stay fully visible.
fn paint_exchange_indicators(painter: &Painter, to_screen: &RectTransform, opacity: f32) {
    let s = to_screen.scale().x;
    let fill = Color32::WHITE.gamma_multiply(0.7 * opacity);
    let stroke = Stroke::new(1.0 * s, Color32::BLACK.gamma_multiply(opacity));
    let text = Color32::BLACK.gamma_multiply(opacity);
    let font = FontId::proportional(10.0 * s);

    for center in VILLOUS_CENTERS {
        // Oxygen moving into the tree from the left.
        let points = [
            pos2(center - 20.0, 300.0),
            pos2(center - 40.0, 280.0),
            pos2(center - 50.0, 300.0),
            pos2(center - 40.0, 320.0),
        ];
        painter.add(Shape::convex_polygon(
            points.iter().map(|p| to_screen * *p).collect(),
            fill,
            stroke,
        ));
        painter.text(
            to_screen * pos2(center - 45.0, 300.0),
            Align2::CENTER_CENTER,
            "O₂",
            font.clone(),
            text,
        );

        // Carbon dioxide leaving to the right.
        let points = [
            pos2(center + 20.0, 300.0),
            pos2(center + 40.0, 280.0),
            pos2(center + 50.0, 300.0),
            pos2(center + 40.0, 320.0),
        ];
        painter.add(Shape::convex_polygon(
            points.iter().map(|p| to_screen * *p).collect(),
            fill,
            stroke,
        ));
        painter.text(
            to_screen * pos2(center + 40.0, 300.0),
            Align2::CENTER_CENTER,
            "CO₂",
            font.clone(),
            text,
        );
    }
}

fn paint_labels(painter: &Painter, to_screen: &RectTransform) {
    let s = to_screen.scale().x;
    let title = FontId::proportional(14.0 * s);
    let small = FontId::proportional(10.0 * s);

    let centered = [
        (pos2(400.0, 470.0), "Decidua Basalis (Maternal Side)"),
        (pos2(400.0, 290.0), "Intervillous Space"),
        (pos2(400.0, 130.0), "Chorionic Plate (Fetal Side)"),
    ];
    for (pos, label) in centered {
        painter.text(
            to_screen * pos,
            Align2::CENTER_CENTER,
            label,
            title.clone(),
            Color32::BLACK,
        );
    }

    painter.text(
        to_screen * pos2(400.0, 40.0),
        Align2::CENTER_CENTER,
        "Umbilical Cord",
        FontId::proportional(12.0 * s),
        Color32::BLACK,
    );
    painter.text(
        to_screen * pos2(470.0, 40.0),
        Align2::LEFT_CENTER,
        "Umbilical Arteries (deoxygenated)",
        small.clone(),
        MATERNAL_RED,
    );
    painter.text(
        to_screen * pos2(470.0, 60.0),
        Align2::LEFT_CENTER,
        "Umbilical Vein (oxygenated)",
        small.clone(),
        FETAL_BLUE,
    );
    painter.text(
        to_screen * pos2(180.0, 370.0),
        Align2::LEFT_CENTER,
        "Spiral Arteries",
        small.clone(),
        MATERNAL_RED,
    );
    painter.text(
        to_screen * pos2(600.0, 370.0),
        Align2::RIGHT_CENTER,
        "Decidual Veins",
        small,
        FETAL_BLUE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_transform_preserves_aspect_ratio() {
        let screen = Rect::from_min_size(pos2(10.0, 10.0), vec2(1600.0, 500.0));
        let transform = canvas_transform(screen);
        let scale = transform.scale();
        assert!((scale.x - scale.y).abs() < 1e-4);
        assert!((scale.x - 1.0).abs() < 1e-4); // height-limited: 500 / 500

        // Logical center maps to the screen center.
        let center = transform * pos2(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0);
        assert!((center.x - screen.center().x).abs() < 1e-3);
        assert!((center.y - screen.center().y).abs() < 1e-3);
    }

    #[test]
    fn quad_edge_interpolates_endpoints() {
        let edge = QuadEdge::new(pos2(150.0, 450.0), pos2(400.0, 500.0), pos2(650.0, 450.0));
        assert_eq!(edge.point(0.0), pos2(150.0, 450.0));
        assert_eq!(edge.point(1.0), pos2(650.0, 450.0));
        // Apex of the symmetric curve sits midway, pulled toward the control.
        let mid = edge.point(0.5);
        assert!((mid.x - 400.0).abs() < 1e-3);
        assert!((mid.y - 475.0).abs() < 1e-3);
    }
}
