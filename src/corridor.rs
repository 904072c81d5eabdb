use crate::{
    error::GenerateError,
    grid::{Grid, Point},
    partition::PartitionTree,
    symmetric_map::SymmetricMap,
};

/// A leaf's position in `PartitionTree::leaves` order and the point corridors attach to.
#[derive(Clone, Copy, Debug)]
struct Anchor {
    leaf: usize,
    center: Point,
}

/// Opens an L-shaped path from `from` to `to`, moving along x first and then along y. Both ends
/// are included.
pub fn carve_l_path(from: Point, to: Point, grid: &mut Grid) -> Result<Vec<Point>, GenerateError> {
    let mut path = Vec::with_capacity(from.manhattan_distance(&to) as usize + 1);
    let mut p = from;

    while p.x != to.x {
        grid.open(&p)?;
        path.push(p);
        p.x += (to.x - p.x).signum();
    }
    while p.y != to.y {
        grid.open(&p)?;
        path.push(p);
        p.y += (to.y - p.y).signum();
    }
    grid.open(&p)?;
    path.push(p);

    Ok(path)
}

/// Connects sibling subtrees bottom-up. For every split node, the closest pair of leaf centers
/// across the two subtrees is joined with an L-shaped corridor. Every leaf center lies in its
/// room, so once all rooms are carved this leaves them all connected.
///
/// Returns the corridor paths keyed by the pair of leaf indices they join.
pub fn carve_corridors(
    tree: &PartitionTree,
    grid: &mut Grid,
) -> Result<SymmetricMap<Vec<Point>>, GenerateError> {
    let mut corridors = SymmetricMap::new();
    let mut next_leaf = 0;
    connect_subtree(tree, grid, &mut next_leaf, &mut corridors)?;

    Ok(corridors)
}

fn connect_subtree(
    node: &PartitionTree,
    grid: &mut Grid,
    next_leaf: &mut usize,
    corridors: &mut SymmetricMap<Vec<Point>>,
) -> Result<Vec<Anchor>, GenerateError> {
    match node {
        PartitionTree::Leaf(region) => {
            let anchor = Anchor {
                leaf: *next_leaf,
                center: region.center(),
            };
            *next_leaf += 1;

            Ok(vec![anchor])
        }
        PartitionTree::Split { left, right, .. } => {
            let mut anchors = connect_subtree(left, grid, next_leaf, corridors)?;
            let right_anchors = connect_subtree(right, grid, next_leaf, corridors)?;

            let (a, b) = anchors
                .iter()
                .flat_map(|a| right_anchors.iter().map(move |b| (*a, *b)))
                .min_by_key(|(a, b)| a.center.manhattan_distance(&b.center))
                .expect("Every subtree has at least one leaf");

            let path = carve_l_path(a.center, b.center, grid)?;
            log::trace!(
                "Corridor of {} cells from leaf {} to leaf {}",
                path.len(),
                a.leaf,
                b.leaf
            );
            corridors.insert(a.leaf, b.leaf, path);

            anchors.extend(right_anchors);

            Ok(anchors)
        }
    }
}

/// Direction of the entrance/exit walk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Diagonal {
    /// Toward increasing x and y.
    Forward,
    /// Toward decreasing x and y.
    Backward,
}

impl Diagonal {
    fn step(self) -> i32 {
        match self {
            Diagonal::Forward => 1,
            Diagonal::Backward => -1,
        }
    }
}

/// Makes sure `from` is connected to the carved floor. If it is blocked, opens a staircase along
/// the diagonal (one x step, then one y step, repeated) until the next step would enter open
/// floor.
///
/// Returns the cells that were opened. Walking off the grid first is a
/// `DisconnectedTopology` error.
pub fn carve_entrance(
    grid: &mut Grid,
    from: Point,
    direction: Diagonal,
) -> Result<Vec<Point>, GenerateError> {
    let mut path = Vec::new();
    if grid.get(&from)?.is_open() {
        return Ok(path);
    }

    let step = direction.step();
    let mut p = from;
    grid.open(&p)?;
    path.push(p);

    loop {
        for &(dx, dy) in [(step, 0), (0, step)].iter() {
            let next = Point::new(p.x + dx, p.y + dy);
            if !grid.contains(&next) {
                return Err(GenerateError::DisconnectedTopology { point: from });
            }
            if grid.is_open(&next) {
                return Ok(path);
            }

            grid.open(&next)?;
            path.push(next);
            p = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        grid::Connectivity,
        partition::{Axis, SplitSpec},
        region::Region,
        room::{carve_room, inset_room},
        sampling::small_rng,
    };

    #[test]
    fn test_l_path_goes_along_x_then_y() {
        let mut grid = Grid::new(10, 10);
        let path = carve_l_path(Point::new(2, 5), Point::new(6, 2), &mut grid).unwrap();

        assert_eq!(path.len(), 8);
        assert_eq!(path[0], Point::new(2, 5));
        assert_eq!(path[4], Point::new(6, 5));
        assert_eq!(*path.last().unwrap(), Point::new(6, 2));
        assert!(path.iter().all(|p| grid.is_open(p)));
        assert_eq!(grid.open_cell_count(), 8);
    }

    #[test]
    fn test_l_path_to_itself_is_one_cell() {
        let mut grid = Grid::new(3, 3);
        let path = carve_l_path(Point::new(1, 1), Point::new(1, 1), &mut grid).unwrap();

        assert_eq!(path, vec![Point::new(1, 1)]);
    }

    #[test]
    fn test_single_split_gets_one_corridor() {
        let mut grid = Grid::new(10, 5);
        let tree = PartitionTree::Split {
            axis: Axis::Vertical,
            left: Box::new(PartitionTree::Leaf(Region::new(0, 0, 5, 5))),
            right: Box::new(PartitionTree::Leaf(Region::new(5, 0, 5, 5))),
        };

        let corridors = carve_corridors(&tree, &mut grid).unwrap();
        assert_eq!(corridors.len(), 1);
        let path = corridors.get(1, 0).unwrap();
        assert_eq!(path.first(), Some(&Point::new(2, 2)));
        assert_eq!(path.last(), Some(&Point::new(7, 2)));
    }

    #[test]
    fn test_lone_leaf_gets_no_corridor() {
        let mut grid = Grid::new(5, 5);
        let tree = PartitionTree::Leaf(Region::new(1, 1, 3, 3));

        assert!(carve_corridors(&tree, &mut grid).unwrap().is_empty());
        assert_eq!(grid.open_cell_count(), 0);
    }

    #[test]
    fn test_corridors_connect_every_room() {
        for seed in 0..30 {
            let mut rng = small_rng([seed, 17, 0, 0]);
            let mut grid = Grid::new(60, 40);
            let tree =
                PartitionTree::build(Region::new(1, 1, 58, 38), 3, &SplitSpec::default(), &mut rng)
                    .unwrap();
            let leaves = tree.leaves();
            for leaf in leaves.iter() {
                carve_room(&inset_room(leaf, &mut rng), &mut grid).unwrap();
            }

            let corridors = carve_corridors(&tree, &mut grid).unwrap();
            assert_eq!(corridors.len(), tree.internal_count());

            let reached = grid.flood_fill(&leaves[0].center(), Connectivity::Orthogonal);
            for leaf in leaves.iter() {
                assert!(reached.contains(&leaf.center()), "seed {}", seed);
            }
        }
    }

    fn grid_with_room() -> Grid {
        let mut grid = Grid::new(12, 12);
        carve_room(&Region::new(5, 5, 3, 3), &mut grid).unwrap();

        grid
    }

    #[test]
    fn test_entrance_reaches_open_floor() {
        let mut grid = grid_with_room();
        let path = carve_entrance(&mut grid, Point::new(0, 0), Diagonal::Forward).unwrap();

        assert_eq!(path[0], Point::new(0, 0));
        assert_eq!(path[1], Point::new(1, 0));
        let reached = grid.flood_fill(&Point::new(0, 0), Connectivity::Orthogonal);
        assert!(reached.contains(&Point::new(6, 6)));
    }

    #[test]
    fn test_exit_walks_backward() {
        let mut grid = grid_with_room();
        let path = carve_entrance(&mut grid, Point::new(11, 11), Diagonal::Backward).unwrap();

        assert_eq!(path[1], Point::new(10, 11));
        let reached = grid.flood_fill(&Point::new(11, 11), Connectivity::Orthogonal);
        assert!(reached.contains(&Point::new(6, 6)));
    }

    #[test]
    fn test_open_entrance_carves_nothing() {
        let mut grid = grid_with_room();
        let path = carve_entrance(&mut grid, Point::new(6, 6), Diagonal::Forward).unwrap();

        assert!(path.is_empty());
        assert_eq!(grid.open_cell_count(), 9);
    }

    #[test]
    fn test_entrance_outside_grid_is_out_of_bounds() {
        let mut grid = grid_with_room();

        assert!(matches!(
            carve_entrance(&mut grid, Point::new(12, 12), Diagonal::Backward),
            Err(GenerateError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_entrance_missing_the_floor_is_disconnected() {
        let mut grid = grid_with_room();

        // Walking forward from below the room never meets it.
        assert!(matches!(
            carve_entrance(&mut grid, Point::new(0, 9), Diagonal::Forward),
            Err(GenerateError::DisconnectedTopology { .. })
        ));
    }
}
