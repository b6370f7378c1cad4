// PlacentaFlow - Sequential Placental Circulation Animator
// Licensed under MIT License

//! Per-frame particle generation.
//!
//! Pure with respect to its inputs: the caller samples the wall clock once
//! per frame into a [`FrameJitter`] and passes it in, so a given
//! (stage, progress, jitter) triple always produces the same particle list.
//! Lists are rebuilt every frame and never mutated in place.

use std::f32::consts::PI;
use std::time::{SystemTime, UNIX_EPOCH};

use egui::Color32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Maternal blood and deoxygenated fetal blood.
pub const MATERNAL_RED: Color32 = Color32::from_rgb(178, 34, 34);
/// Oxygenated fetal blood and depleted maternal blood.
pub const FETAL_BLUE: Color32 = Color32::from_rgb(70, 130, 180);
/// Blend target inside the villous branches, slightly brighter than the vein color.
const OXYGENATED_VILLOUS: Color32 = Color32::from_rgb(70, 142, 186);

/// Villous tree centerlines, shared with the background drawing.
pub const VILLOUS_CENTERS: [f32; 3] = [280.0, 400.0, 520.0];
const DECIDUAL_VEINS: [f32; 3] = [300.0, 400.0, 500.0];

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub color: Color32,
    pub size: f32,
    pub opacity: f32,
}

/// Per-frame wall-clock sample. Taken once in the event loop and passed into
/// the generator so the generator itself stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameJitter {
    /// Slow sinusoidal drift applied to particle paths.
    pub phase: f32,
    /// Seed for the per-particle size/opacity variation.
    pub seed: u64,
}

impl FrameJitter {
    pub fn from_clock(now: SystemTime) -> Self {
        let millis = now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            phase: ((millis as f64) / 1000.0).sin() as f32,
            seed: millis,
        }
    }
}

/// Builds the particle list for one frame.
///
/// Each emitter switches on once `stage` reaches its threshold. The emitter
/// matching the current stage reveals its particles proportionally to
/// `progress`; emitters of completed stages run at their full count.
pub fn generate_particles(stage: usize, progress: f32, jitter: &FrameJitter) -> Vec<Particle> {
    let mut particles = Vec::new();
    let mut rng = StdRng::seed_from_u64(jitter.seed);

    if stage >= 1 {
        spiral_artery_inflow(&mut particles, stage == 1, progress, jitter.phase);
    }
    if stage >= 2 {
        intervillous_fill(&mut particles, stage, progress, jitter.phase, &mut rng);
    }
    if stage >= 3 {
        umbilical_artery_descent(&mut particles, stage == 3, progress);
    }
    if stage >= 4 {
        villous_tree_flow(&mut particles, stage, progress);
    }
    if stage >= 6 {
        umbilical_vein_return(&mut particles, stage == 6, progress);
    }
    if stage >= 7 {
        decidual_outflow(&mut particles, stage == 7, progress);
    }

    particles
}

/// Particles revealed by an emitter: a linear ramp while its stage is the
/// active one, the full set once the stage is completed.
fn reveal_count(active: bool, progress: f32, max: usize) -> usize {
    if active {
        (((progress / 100.0) * max as f32).ceil() as usize).min(max)
    } else {
        max
    }
}

/// Per-channel linear blend, truncating like the reference palette math.
fn blend(from: Color32, to: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let ch = |a: u8, b: u8| (a as f32 * (1.0 - t) + b as f32 * t).floor() as u8;
    Color32::from_rgb(
        ch(from.r(), to.r()),
        ch(from.g(), to.g()),
        ch(from.b(), to.b()),
    )
}

/// Stage 1: maternal blood rising out of the spiral arteries into the
/// intervillous space. Particles fade out (are culled) above y = 350.
fn spiral_artery_inflow(out: &mut Vec<Particle>, active: bool, progress: f32, phase: f32) {
    let count = reveal_count(active, progress, 15);
    for i in 0..count {
        let x = (i % 3) as f32 * 150.0 + 250.0 + ((i as f32) * 0.5 + phase).sin() * 10.0;
        let lane = (i * 7 % 100) as f32;
        let y = 450.0 - lane * 3.0 * (progress / 50.0).min(1.0);
        if y > 350.0 {
            out.push(Particle {
                x,
                y,
                color: MATERNAL_RED,
                size: 4.0,
                opacity: 0.8,
            });
        }
    }
}

/// Stage 2: maternal blood swirling freely through the intervillous space.
/// From stage 5 on, particles close to a villous tree pick up the exchange
/// blend toward the oxygen-depleted blue.
fn intervillous_fill(
    out: &mut Vec<Particle>,
    stage: usize,
    progress: f32,
    phase: f32,
    rng: &mut StdRng,
) {
    let count = reveal_count(stage == 2, progress, 30);
    for i in 0..count {
        let angle = i as f32 * 0.2 + phase;
        let radius = 80.0 + (i % 5) as f32 * 30.0;
        let x = 400.0 + angle.cos() * radius;
        let y = 300.0 + angle.sin() * radius * 0.5;
        if x > 180.0 && x < 620.0 && y > 180.0 && y < 380.0 {
            let mut color = MATERNAL_RED;
            if stage >= 5 {
                let dist = VILLOUS_CENTERS
                    .iter()
                    .map(|c| (x - c).abs())
                    .fold(f32::INFINITY, f32::min);
                if dist < 30.0 {
                    let exchange = if stage == 5 {
                        (progress / 100.0) * (1.0 - dist / 30.0)
                    } else {
                        1.0 - dist / 30.0
                    };
                    color = blend(MATERNAL_RED, FETAL_BLUE, exchange);
                }
            }
            out.push(Particle {
                x,
                y,
                color,
                size: 2.0 + rng.gen::<f32>() * 2.0,
                opacity: 0.6 + rng.gen::<f32>() * 0.4,
            });
        }
    }
}

/// Stage 3: paired deoxygenated streams descending the two umbilical
/// arteries, mirrored around the cord centerline.
fn umbilical_artery_descent(out: &mut Vec<Particle>, active: bool, progress: f32) {
    let count = reveal_count(active, progress, 10);
    for i in 0..count {
        let lane = (i * 10 % 100) as f32;
        let y = 20.0 + lane * 1.3;
        if y < 150.0 {
            let sway = (lane / 8.0).sin() * 10.0;
            for x in [390.0 - sway, 410.0 + sway] {
                out.push(Particle {
                    x,
                    y,
                    color: MATERNAL_RED,
                    size: 3.0,
                    opacity: 0.8,
                });
            }
        }
    }
}

/// Stage 4: fetal blood spreading along the chorionic plate and descending
/// the villous branches. Past the branch midpoint the stage >= 5 exchange
/// blend kicks in.
fn villous_tree_flow(out: &mut Vec<Particle>, stage: usize, progress: f32) {
    let count = reveal_count(stage == 4, progress, 15);

    // Horizontal runs along the chorionic arteries, fanning out both ways.
    for i in 0..count {
        let lane = (i * 6 % 60) as f32;
        let x = if i % 2 == 0 {
            400.0 - lane * 2.0
        } else {
            400.0 + lane * 2.0
        };
        out.push(Particle {
            x,
            y: 150.0 + (lane / 5.0).sin() * 5.0,
            color: MATERNAL_RED,
            size: 3.0,
            opacity: 0.8,
        });
    }

    // Serpentine descent through the three villous trees.
    for i in 0..count {
        let base_x = VILLOUS_CENTERS[i % 3];
        let lane = (i * 5 % 80) as f32;
        let descent = lane / 80.0;
        let x = base_x + (descent * PI * 3.0).sin() * 15.0;
        let y = 200.0 + descent * 100.0;

        let mut color = MATERNAL_RED;
        if stage >= 5 && descent > 0.5 {
            let transition = if stage == 5 {
                (progress / 100.0) * 0.5
            } else {
                0.5
            };
            let factor = ((descent - transition) * 2.0).clamp(0.0, 1.0);
            color = blend(MATERNAL_RED, OXYGENATED_VILLOUS, factor);
        }
        out.push(Particle {
            x,
            y,
            color,
            size: 2.0,
            opacity: 0.8,
        });
    }
}

/// Stage 6: oxygenated blood converging along the chorionic plate and
/// ascending the single umbilical vein.
fn umbilical_vein_return(out: &mut Vec<Particle>, active: bool, progress: f32) {
    let count = reveal_count(active, progress, 10);

    for i in 0..count {
        let lane = (i * 8 % 80) as f32;
        if lane < 60.0 {
            let x = if i % 2 == 0 {
                280.0 + lane * 2.0
            } else {
                520.0 - lane * 2.0
            };
            out.push(Particle {
                x,
                y: 180.0 - (lane / 5.0).sin() * 5.0,
                color: FETAL_BLUE,
                size: 3.0,
                opacity: 0.8,
            });
        }
    }

    for i in 0..count {
        let lane = (i * 10 % 100) as f32;
        let y = 140.0 - lane * 1.5;
        if y > 0.0 {
            out.push(Particle {
                x: 400.0 + (lane / 10.0).sin() * 5.0,
                y,
                color: FETAL_BLUE,
                size: 4.0,
                opacity: 0.9,
            });
        }
    }
}

/// Stage 7: depleted maternal blood draining back out through the decidual
/// veins.
fn decidual_outflow(out: &mut Vec<Particle>, active: bool, progress: f32) {
    let count = reveal_count(active, progress, 15);
    for i in 0..count {
        let base_x = DECIDUAL_VEINS[i % 3];
        let lane = (i * 6 % 80) as f32;
        let y = 320.0 + lane * 1.6;
        if y < 450.0 {
            out.push(Particle {
                x: base_x + (lane / 10.0).sin() * 10.0,
                y,
                color: FETAL_BLUE,
                size: 4.0,
                opacity: 0.8,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jitter() -> FrameJitter {
        FrameJitter {
            phase: 0.25,
            seed: 12345,
        }
    }

    #[test]
    fn initial_stage_emits_nothing() {
        assert!(generate_particles(0, 100.0, &jitter()).is_empty());
    }

    #[test]
    fn generator_is_deterministic_for_a_fixed_jitter() {
        for stage in 0..=8 {
            let a = generate_particles(stage, 62.5, &jitter());
            let b = generate_particles(stage, 62.5, &jitter());
            assert_eq!(a, b, "stage {stage}");
        }
    }

    #[test]
    fn reveal_count_ramps_monotonically_to_the_maximum() {
        let mut prev = 0;
        for step in 0..=200 {
            let progress = step as f32 * 0.5;
            let n = reveal_count(true, progress, 15);
            assert!(n >= prev, "count dropped at progress {progress}");
            assert!(n <= 15);
            prev = n;
        }
        assert_eq!(reveal_count(true, 0.0, 15), 0);
        assert_eq!(reveal_count(true, 100.0, 15), 15);
        assert_eq!(reveal_count(false, 0.0, 15), 15);
    }

    #[test]
    fn active_umbilical_descent_scales_with_progress() {
        let mut prev = 0;
        for step in 0..=10 {
            let progress = step as f32 * 10.0;
            let mut out = Vec::new();
            umbilical_artery_descent(&mut out, true, progress);
            assert!(out.len() >= prev);
            prev = out.len();
        }
        // Two mirrored streams, none culled along the cord.
        assert_eq!(prev, 20);
    }

    #[test]
    fn completed_umbilical_descent_ignores_progress() {
        for progress in [0.0, 37.0, 100.0] {
            let mut out = Vec::new();
            umbilical_artery_descent(&mut out, false, progress);
            assert_eq!(out.len(), 20);
        }
    }

    #[test]
    fn completed_decidual_outflow_emits_full_set() {
        let mut out = Vec::new();
        decidual_outflow(&mut out, false, 0.0);
        assert_eq!(out.len(), 15);
        assert!(out.iter().all(|p| p.color == FETAL_BLUE));
    }

    #[test]
    fn particles_stay_inside_the_canvas() {
        for stage in 0..=8 {
            for progress in [0.0, 25.0, 50.0, 75.0, 100.0] {
                for p in generate_particles(stage, progress, &jitter()) {
                    assert!(
                        (0.0..=800.0).contains(&p.x) && (0.0..=500.0).contains(&p.y),
                        "stage {stage} progress {progress}: ({}, {})",
                        p.x,
                        p.y
                    );
                    assert!((0.0..=1.0).contains(&p.opacity));
                }
            }
        }
    }

    #[test]
    fn exchange_blend_recolors_villous_descent_after_midpoint() {
        let mut before = Vec::new();
        villous_tree_flow(&mut before, 4, 100.0);
        let mut after = Vec::new();
        villous_tree_flow(&mut after, 8, 100.0);
        assert_eq!(before.len(), after.len());
        assert!(before.iter().all(|p| p.color == MATERNAL_RED));
        assert!(after.iter().any(|p| p.color != MATERNAL_RED));
    }

    #[test]
    fn blend_hits_both_endpoints() {
        assert_eq!(blend(MATERNAL_RED, FETAL_BLUE, 0.0), MATERNAL_RED);
        assert_eq!(blend(MATERNAL_RED, FETAL_BLUE, 1.0), FETAL_BLUE);
        assert_eq!(blend(MATERNAL_RED, FETAL_BLUE, -1.0), MATERNAL_RED);
    }
}
