use rand::Rng;

use crate::places::Place;

pub const SURFACE_SIZE: f64 = 220.0;
pub const GLOBE_RADIUS: f64 = SURFACE_SIZE * 0.4;
pub const SURFACE_CENTER: (f64, f64) = (SURFACE_SIZE / 2.0, SURFACE_SIZE / 2.0);

// Fraction of the radius the far side stays drawable past the equator,
// giving a soft horizon instead of a hard cutoff.
pub const HORIZON_MARGIN: f64 = 0.1;

pub const AUTO_SPIN: f64 = 0.003;
pub const DRAG_SENSITIVITY: f64 = 0.005;
pub const FRICTION: f64 = 0.95;

pub const PIN_RADIUS_BASE: f64 = 4.0;
pub const PIN_RADIUS_DEPTH: f64 = 3.0;
pub const HOVER_TOLERANCE: f64 = 5.0;

pub const STAR_COUNT: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub spin: f64,
    pub tilt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub visible: bool,
    pub depth: f64,
}

// A point is drawable while it sits no further than HORIZON_MARGIN behind
// the equator plane. The boundary itself counts as front-facing.
pub fn is_front_facing(z: f64) -> bool {
    z >= -GLOBE_RADIUS * HORIZON_MARGIN
}

/// Project a geographic coordinate onto the drawing surface under the given
/// rotation. Orthographic: x/y land on the surface, z only decides
/// visibility and depth weighting.
pub fn project(lat: f64, lon: f64, rotation: Rotation) -> Projected {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();

    let x = -GLOBE_RADIUS * phi.sin() * (theta - rotation.spin).cos();
    let y = -GLOBE_RADIUS * phi.cos();
    let z = GLOBE_RADIUS * phi.sin() * (theta - rotation.spin).sin();

    let (tilt_sin, tilt_cos) = rotation.tilt.sin_cos();
    let tilted_y = y * tilt_cos - z * tilt_sin;
    let tilted_z = y * tilt_sin + z * tilt_cos;

    let margin = GLOBE_RADIUS * HORIZON_MARGIN;
    let depth = ((tilted_z + margin) / (GLOBE_RADIUS + margin)).clamp(0.0, 1.0);

    Projected {
        x: SURFACE_CENTER.0 + x,
        y: SURFACE_CENTER.1 + tilted_y,
        z: tilted_z,
        visible: is_front_facing(tilted_z),
        depth,
    }
}

pub fn pin_radius(depth: f64) -> f64 {
    PIN_RADIUS_BASE + depth * PIN_RADIUS_DEPTH
}

/// Cut one boundary ring into its contiguous front-facing runs under the
/// given rotation. Each run is a surface-space polyline; runs shorter than
/// two points carry no stroke and are dropped. Runs are never merged, so no
/// segment crosses behind the sphere.
pub fn ring_runs(ring: &[(f64, f64)], rotation: Rotation) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for &(lon, lat) in ring {
        let p = project(lat, lon, rotation);
        if p.visible {
            current.push((p.x, p.y));
        } else if !current.is_empty() {
            if current.len() >= 2 {
                runs.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinHit {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub distance: f64,
}

/// Find the pin under the pointer: front-facing, within its depth-scaled
/// radius plus tolerance, nearest by surface distance when several overlap.
pub fn hover_pick(places: &[Place], rotation: Rotation, pointer: (f64, f64)) -> Option<PinHit> {
    let mut best: Option<PinHit> = None;

    for (index, place) in places.iter().enumerate() {
        let p = project(place.lat, place.lon, rotation);
        if !p.visible {
            continue;
        }
        let radius = pin_radius(p.depth);
        let dx = pointer.0 - p.x;
        let dy = pointer.1 - p.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < radius + HOVER_TOLERANCE && best.as_ref().is_none_or(|b| distance < b.distance)
        {
            best = Some(PinHit {
                index,
                x: p.x,
                y: p.y,
                radius,
                distance,
            });
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
pub struct Star {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub opacity: f64,
}

pub fn scatter_stars(count: usize, rng: &mut impl Rng) -> Vec<Star> {
    (0..count)
        .map(|_| Star {
            x: rng.gen_range(0.0..SURFACE_SIZE),
            y: rng.gen_range(0.0..SURFACE_SIZE),
            radius: rng.gen_range(0.0..1.5),
            opacity: rng.gen_range(0.3..0.8),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::Place;

    const EPS: f64 = 1e-9;

    fn place(name: &'static str, lat: f64, lon: f64) -> Place {
        Place {
            name,
            lat,
            lon,
            country: true,
        }
    }

    #[test]
    fn seam_projects_left_of_center_at_rest() {
        // The seam longitude (-180°) at the equator maps one radius left of
        // center, on the equator plane, at zero rotation.
        let p = project(0.0, -180.0, Rotation::default());
        assert!((p.x - (SURFACE_CENTER.0 - GLOBE_RADIUS)).abs() < EPS);
        assert!((p.y - SURFACE_CENTER.1).abs() < EPS);
        assert!(p.z.abs() < 1e-6);
        assert!(p.visible);
    }

    #[test]
    fn north_pole_projects_above_center() {
        let p = project(90.0, 0.0, Rotation::default());
        assert!((p.x - SURFACE_CENTER.0).abs() < 1e-6);
        assert!((p.y - (SURFACE_CENTER.1 - GLOBE_RADIUS)).abs() < EPS);
    }

    #[test]
    fn rotation_accumulates_associatively() {
        let total = 1.37;
        let steps = 1000;
        let mut accumulated = 0.0;
        for _ in 0..steps {
            accumulated += total / steps as f64;
        }

        let direct = project(37.5, 12.25, Rotation { spin: total, tilt: 0.0 });
        let stepped = project(37.5, 12.25, Rotation { spin: accumulated, tilt: 0.0 });
        assert!((direct.x - stepped.x).abs() < EPS);
        assert!((direct.y - stepped.y).abs() < EPS);
        assert!((direct.z - stepped.z).abs() < EPS);
    }

    #[test]
    fn horizon_threshold_is_inclusive() {
        let cutoff = -GLOBE_RADIUS * HORIZON_MARGIN;
        assert!(is_front_facing(cutoff));
        assert!(is_front_facing(cutoff + 1e-12));
        assert!(!is_front_facing(cutoff - 1e-9));
    }

    #[test]
    fn depth_peaks_facing_the_viewer() {
        // (0°N, -90°E) sits dead center of the front hemisphere at rest.
        let front = project(0.0, -90.0, Rotation::default());
        assert!(front.visible);
        assert!((front.depth - 1.0).abs() < EPS);
        assert!(pin_radius(front.depth) > pin_radius(0.0));
    }

    #[test]
    fn hover_picks_nearest_when_radii_overlap() {
        // Two pins a couple of surface units apart near the front of the
        // sphere; both hit-circles cover the pointer.
        let places = [place("near", 0.0, -90.0), place("far", 2.0, -90.0)];
        let rotation = Rotation::default();
        let near = project(places[0].lat, places[0].lon, rotation);

        let pointer = (near.x + 1.0, near.y + 1.0);
        let hit = hover_pick(&places, rotation, pointer).expect("pointer is over both pins");
        assert_eq!(hit.index, 0);

        // Order independence: reversing the list still picks the same pin.
        let reversed = [places[1], places[0]];
        let hit = hover_pick(&reversed, rotation, pointer).expect("pointer is over both pins");
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn hover_ignores_out_of_range_and_back_facing() {
        let places = [place("front", 0.0, -90.0), place("behind", 0.0, 90.0)];
        let rotation = Rotation::default();
        let front = project(places[0].lat, places[0].lon, rotation);

        let far_pointer = (
            front.x + pin_radius(front.depth) + HOVER_TOLERANCE + 1.0,
            front.y,
        );
        assert!(hover_pick(&places, rotation, far_pointer).is_none());

        // Directly over the back-facing pin's mirrored position: no pick.
        let behind = project(places[1].lat, places[1].lon, rotation);
        assert!(!behind.visible);
        assert!(hover_pick(&places[1..], rotation, (behind.x, behind.y)).is_none());
    }

    #[test]
    fn ring_runs_break_at_the_horizon() {
        // A full equatorial ring: about half the samples face the viewer,
        // so the runs cover part of the ring and none crosses the back.
        let ring: Vec<(f64, f64)> = (0..36).map(|i| (-180.0 + 10.0 * i as f64, 0.0)).collect();
        let runs = ring_runs(&ring, Rotation::default());

        assert!(!runs.is_empty());
        let total: usize = runs.iter().map(Vec::len).sum();
        assert!(total < ring.len());
        assert!(total >= ring.len() / 2);
        for run in &runs {
            assert!(run.len() >= 2);
        }
    }

    #[test]
    fn single_visible_point_yields_no_run() {
        // One front-facing point sandwiched between back-facing neighbors.
        let ring = vec![(90.0, 0.0), (-90.0, 0.0), (90.0, 10.0)];
        let runs = ring_runs(&ring, Rotation::default());
        assert!(runs.is_empty());
    }

    #[test]
    fn triangular_ring_is_drawable_after_load() {
        let ring = vec![(0.0, 0.0), (10.0, 0.0), (5.0, 10.0), (0.0, 0.0)];

        // Spun slightly west so the whole triangle faces the viewer:
        // geography and pins coexist on the front hemisphere.
        let rotation = Rotation { spin: 20f64.to_radians(), tilt: 0.0 };
        let runs = ring_runs(&ring, rotation);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 4);

        let pin = project(5.0, 5.0, rotation);
        assert!(pin.visible);
    }

    #[test]
    fn scatter_is_fixed_size_and_in_bounds() {
        let stars = scatter_stars(STAR_COUNT, &mut rand::thread_rng());
        assert_eq!(stars.len(), STAR_COUNT);
        for star in &stars {
            assert!((0.0..SURFACE_SIZE).contains(&star.x));
            assert!((0.0..SURFACE_SIZE).contains(&star.y));
            assert!((0.0..1.5).contains(&star.radius));
            assert!((0.3..0.8).contains(&star.opacity));
        }
    }
}
