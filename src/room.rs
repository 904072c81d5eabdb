use crate::{
    error::GenerateError,
    grid::{Connectivity, Grid, Point},
    region::Region,
    sampling::sample_inclusive,
    SpawnArea,
};

use rand::Rng;

const MIN_COLUMN_SPACING: i32 = 3;
const MAX_COLUMN_SPACING: i32 = 5;
const MIN_CIRCLE_RADIUS: i32 = 2;
const MAX_CIRCLE_RADIUS: i32 = 6;

/// Picks a room strictly inside `leaf`: the top-left corner moves in by up to a third of each
/// dimension, then the remaining size shrinks by up to another third.
///
/// The room always contains `leaf.center()`, which is where corridors attach.
pub fn inset_room(leaf: &Region, rng: &mut impl Rng) -> Region {
    let dx = sample_inclusive(rng, 0, leaf.width / 3);
    let dy = sample_inclusive(rng, 0, leaf.height / 3);
    let width = leaf.width - dx;
    let height = leaf.height - dy;
    let width = width - sample_inclusive(rng, 0, width / 3);
    let height = height - sample_inclusive(rng, 0, height / 3);

    let room = Region::new(leaf.x + dx, leaf.y + dy, width, height);
    debug_assert!(leaf.contains_region(&room));
    debug_assert!(room.contains(&leaf.center()));

    room
}

pub fn carve_room(room: &Region, grid: &mut Grid) -> Result<(), GenerateError> {
    for p in room.points() {
        grid.open(&p)?;
    }

    Ok(())
}

/// Obstacles placed inside a carved room for variety.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decoration {
    /// Single-cell pillars on a regular lattice, one cell in from the room edge.
    Columns { spacing: i32 },
    /// Hollow circle. Small radii come out diamond shaped.
    Circle { center: Point, radius: i32 },
}

impl Decoration {
    /// With probability `density`, picks columns or a circle with equal odds. Returns `None` when
    /// the room is too small for the chosen shape.
    pub fn choose(room: &Region, density: f32, rng: &mut impl Rng) -> Option<Self> {
        if !rng.gen_bool(f64::from(density.max(0.0).min(1.0))) {
            return None;
        }

        if rng.gen_bool(0.5) {
            let spacing = sample_inclusive(rng, MIN_COLUMN_SPACING, MAX_COLUMN_SPACING);

            Some(Decoration::Columns { spacing })
        } else {
            let max_radius = (room.width / 2)
                .min(room.height / 2)
                .min(MAX_CIRCLE_RADIUS);
            if max_radius < MIN_CIRCLE_RADIUS {
                return None;
            }
            let radius = sample_inclusive(rng, MIN_CIRCLE_RADIUS, max_radius);
            let c = room.center();
            let center = Point::new(
                c.x + sample_inclusive(rng, -1, 2),
                c.y + sample_inclusive(rng, -1, 2),
            );

            Some(Decoration::Circle { center, radius })
        }
    }

    /// Cells this decoration would block, clipped to `room`.
    pub fn points(&self, room: &Region) -> Vec<Point> {
        let mut points = match *self {
            Decoration::Columns { spacing } => {
                let sup = room.supremum();
                let step = spacing.max(1) as usize;
                let mut points = Vec::new();
                for x in (room.x + 1..sup.x - 1).step_by(step) {
                    for y in (room.y + 1..sup.y - 1).step_by(step) {
                        points.push(Point::new(x, y));
                    }
                }

                points
            }
            Decoration::Circle { center, radius } => circle_points(center, radius),
        };

        points.retain(|p| room.contains(p));
        points.sort();
        points.dedup();

        points
    }
}

/// Midpoint circle outline.
pub fn circle_points(center: Point, radius: i32) -> Vec<Point> {
    let (x0, y0) = (center.x, center.y);
    let mut points = Vec::new();
    let mut x = radius;
    let mut y = 0;
    let mut err = 0;

    while x >= y {
        for &(px, py) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ]
        .iter()
        {
            points.push(Point::new(x0 + px, y0 + py));
        }

        if err <= 0 {
            y += 1;
            err += 2 * y + 1;
        }
        if err > 0 {
            x -= 1;
            err -= 2 * x + 1;
        }
    }

    points
}

/// True iff every open cell of `room` can reach `room.center()` without leaving the room.
pub fn room_is_connected(room: &Region, grid: &Grid) -> bool {
    let reached = grid.flood_fill_within(&room.center(), Connectivity::Orthogonal, room);
    let open = room.points().filter(|p| grid.is_open(p)).count();

    !reached.is_empty() && reached.len() == open
}

/// Blocks the decoration's cells in an already carved room. If that would cut the room apart or
/// cover its center, the room is restored and `false` is returned.
pub fn decorate_room(
    room: &Region,
    decoration: &Decoration,
    grid: &mut Grid,
) -> Result<bool, GenerateError> {
    let center = room.center();
    let mut blocked = Vec::new();
    for p in decoration.points(room) {
        if p != center && grid.is_open(&p) {
            grid.block(&p)?;
            blocked.push(p);
        }
    }

    if room_is_connected(room, grid) {
        return Ok(true);
    }

    log::debug!("Reverting {:?} in {:?}; it seals off part of the room", decoration, room);
    for p in blocked.iter() {
        grid.open(p)?;
    }

    Ok(false)
}

/// Open cells inside the room walls, or the whole room if it is too thin to have an inside.
pub fn spawn_in_room(room: &Region, grid: &Grid) -> SpawnArea {
    let interior = if room.width >= 3 && room.height >= 3 {
        Region::new(room.x + 1, room.y + 1, room.width - 2, room.height - 2)
    } else {
        *room
    };

    SpawnArea {
        valid_spawn_points: interior.points().filter(|p| grid.is_open(p)).collect(),
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::small_rng;

    #[test]
    fn test_inset_room_stays_inside_leaf_and_covers_center() {
        let mut rng = small_rng([11, 0, 0, 0]);
        for w in 1..25 {
            for h in 1..25 {
                let leaf = Region::new(3, 5, w, h);
                for _ in 0..4 {
                    let room = inset_room(&leaf, &mut rng);
                    assert!(!room.is_empty());
                    assert!(leaf.contains_region(&room), "{:?} escapes {:?}", room, leaf);
                    assert!(room.contains(&leaf.center()));
                }
            }
        }
    }

    #[test]
    fn test_carve_room_opens_exactly_the_room() {
        let mut grid = Grid::new(10, 10);
        let room = Region::new(2, 3, 4, 5);
        carve_room(&room, &mut grid).unwrap();

        assert_eq!(grid.open_cell_count() as i64, room.area());
        assert!(room.points().all(|p| grid.is_open(&p)));
    }

    #[test]
    fn test_carve_room_out_of_bounds_is_reported() {
        let mut grid = Grid::new(4, 4);

        assert!(matches!(
            carve_room(&Region::new(2, 2, 3, 1), &mut grid),
            Err(GenerateError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_circle_points_are_symmetric() {
        let center = Point::new(10, 10);
        let points = circle_points(center, 3);

        for p in points.iter() {
            let mirrored = Point::new(2 * center.x - p.x, 2 * center.y - p.y);
            assert!(points.contains(&mirrored));
            assert!(p.manhattan_distance(&center) <= 6);
        }
        assert!(points.contains(&Point::new(13, 10)));
        assert!(points.contains(&Point::new(10, 7)));
    }

    #[test]
    fn test_columns_leave_a_border() {
        let room = Region::new(0, 0, 9, 9);
        let points = Decoration::Columns { spacing: 3 }.points(&room);

        assert_eq!(
            points,
            vec![
                Point::new(1, 1),
                Point::new(1, 4),
                Point::new(1, 7),
                Point::new(4, 1),
                Point::new(4, 4),
                Point::new(4, 7),
                Point::new(7, 1),
                Point::new(7, 4),
                Point::new(7, 7),
            ]
        );
    }

    #[test]
    fn test_decoration_never_disconnects_room() {
        for seed in 0..200 {
            let mut rng = small_rng([seed, 42, 0, 0]);
            let mut grid = Grid::new(24, 24);
            let room = inset_room(&Region::new(1, 1, 22, 22), &mut rng);
            carve_room(&room, &mut grid).unwrap();

            if let Some(decoration) = Decoration::choose(&room, 1.0, &mut rng) {
                decorate_room(&room, &decoration, &mut grid).unwrap();
            }

            assert!(grid.is_open(&room.center()));
            assert!(room_is_connected(&room, &grid));
        }
    }

    #[test]
    fn test_sealing_decoration_is_reverted() {
        let mut grid = Grid::new(12, 12);
        let room = Region::new(1, 1, 9, 9);
        carve_room(&room, &mut grid).unwrap();

        // The ring around the center leaves the center pocket cut off from the rest.
        let ring = Decoration::Circle {
            center: room.center(),
            radius: 2,
        };
        let applied = decorate_room(&room, &ring, &mut grid).unwrap();

        assert!(!applied);
        assert!(room.points().all(|p| grid.is_open(&p)));
    }

    #[test]
    fn test_zero_density_never_decorates() {
        let mut rng = small_rng([5, 5, 5, 5]);
        let room = Region::new(0, 0, 12, 12);

        for _ in 0..100 {
            assert_eq!(Decoration::choose(&room, 0.0, &mut rng), None);
        }
    }

    #[test]
    fn test_spawn_area_is_room_interior() {
        let mut grid = Grid::new(10, 10);
        let room = Region::new(1, 1, 5, 4);
        carve_room(&room, &mut grid).unwrap();

        let area = spawn_in_room(&room, &grid);
        assert_eq!(area.valid_spawn_points.len(), 3 * 2);
        assert!(area
            .valid_spawn_points
            .iter()
            .all(|p| grid.is_open(p) && p.x > 1 && p.y > 1));
    }
}
