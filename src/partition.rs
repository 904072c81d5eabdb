use crate::{error::GenerateError, region::Region, sampling::sample_exclusive};

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_RATIO: f32 = 0.45;
pub const DEFAULT_MAX_SPLIT_TRIES: usize = 100;

/// Orientation of the cut line. A vertical cut divides the width, a horizontal cut the height.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    /// Extent of `region` across the cut line.
    pub fn length(self, region: &Region) -> i32 {
        match self {
            Axis::Vertical => region.width,
            Axis::Horizontal => region.height,
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::Vertical => Axis::Horizontal,
            Axis::Horizontal => Axis::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SplitPolicy {
    /// Flip a coin for every cut.
    Random,
    Vertical,
    Horizontal,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        SplitPolicy::Random
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SplitSpec {
    pub policy: SplitPolicy,
    /// Reject cuts that leave a child thinner than the ratios below.
    pub discard_by_ratio: bool,
    /// Minimum `width / height` of both children of a vertical cut.
    pub min_width_ratio: f32,
    /// Minimum `height / width` of both children of a horizontal cut.
    pub min_height_ratio: f32,
    /// Random cuts to try before falling back to a midpoint cut.
    pub max_tries: usize,
}

impl Default for SplitSpec {
    fn default() -> Self {
        SplitSpec {
            policy: SplitPolicy::Random,
            discard_by_ratio: true,
            min_width_ratio: DEFAULT_MIN_RATIO,
            min_height_ratio: DEFAULT_MIN_RATIO,
            max_tries: DEFAULT_MAX_SPLIT_TRIES,
        }
    }
}

impl SplitSpec {
    fn check_splittable(&self, region: &Region) -> Result<(), GenerateError> {
        let axis = match self.policy {
            SplitPolicy::Vertical => Axis::Vertical,
            SplitPolicy::Horizontal => Axis::Horizontal,
            SplitPolicy::Random => {
                if region.width >= 2 || region.height >= 2 {
                    return Ok(());
                }
                Axis::Vertical
            }
        };

        if axis.length(region) >= 2 {
            Ok(())
        } else {
            Err(GenerateError::RegionTooSmall {
                region: *region,
                axis,
            })
        }
    }

    /// Assumes `check_splittable` passed.
    fn choose_axis(&self, region: &Region, rng: &mut impl Rng) -> Axis {
        match self.policy {
            SplitPolicy::Vertical => Axis::Vertical,
            SplitPolicy::Horizontal => Axis::Horizontal,
            SplitPolicy::Random => {
                let axis = if rng.gen_bool(0.5) {
                    Axis::Vertical
                } else {
                    Axis::Horizontal
                };
                if axis.length(region) >= 2 {
                    axis
                } else {
                    axis.other()
                }
            }
        }
    }

    fn fallback_axis(&self, region: &Region) -> Axis {
        match self.policy {
            SplitPolicy::Vertical => Axis::Vertical,
            SplitPolicy::Horizontal => Axis::Horizontal,
            SplitPolicy::Random => {
                if region.width >= region.height {
                    Axis::Vertical
                } else {
                    Axis::Horizontal
                }
            }
        }
    }

    fn accepts(&self, axis: Axis, first: &Region, second: &Region) -> bool {
        if !self.discard_by_ratio {
            return true;
        }

        let ratio = |r: &Region| match axis {
            Axis::Vertical => r.width as f32 / r.height as f32,
            Axis::Horizontal => r.height as f32 / r.width as f32,
        };
        let min = match axis {
            Axis::Vertical => self.min_width_ratio,
            Axis::Horizontal => self.min_height_ratio,
        };

        ratio(first) >= min && ratio(second) >= min
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Split {
    /// Left or top child.
    pub first: Region,
    /// Right or bottom child.
    pub second: Region,
    pub axis: Axis,
    pub tries: usize,
    /// True if no random cut was accepted and the region was cut at its midpoint.
    pub fell_back: bool,
}

fn cut(region: &Region, axis: Axis, at: i32) -> (Region, Region) {
    let Region {
        x,
        y,
        width,
        height,
    } = *region;

    match axis {
        Axis::Vertical => (
            Region::new(x, y, at, height),
            Region::new(x + at, y, width - at, height),
        ),
        Axis::Horizontal => (
            Region::new(x, y, width, at),
            Region::new(x, y + at, width, height - at),
        ),
    }
}

/// Divides `region` into two non-overlapping children that exactly cover it.
///
/// Random cuts are resampled until one satisfies the aspect ratio limits in `spec`. Once
/// `spec.max_tries` cuts have been rejected, the region is cut at the midpoint instead, so this
/// always terminates. Fails only if the region is too thin to cut along any permitted axis.
pub fn split_region(
    region: &Region,
    spec: &SplitSpec,
    rng: &mut impl Rng,
) -> Result<Split, GenerateError> {
    spec.check_splittable(region)?;

    for tries in 1..=spec.max_tries {
        let axis = spec.choose_axis(region, rng);
        let at = sample_exclusive(rng, 1, axis.length(region));
        let (first, second) = cut(region, axis, at);

        if spec.accepts(axis, &first, &second) {
            return Ok(Split {
                first,
                second,
                axis,
                tries,
                fell_back: false,
            });
        }
    }

    let axis = spec.fallback_axis(region);
    log::warn!(
        "No acceptable cut of {:?} after {} tries; cutting {:?} at the midpoint",
        region,
        spec.max_tries,
        axis
    );
    let (first, second) = cut(region, axis, axis.length(region) / 2);

    Ok(Split {
        first,
        second,
        axis,
        tries: spec.max_tries,
        fell_back: true,
    })
}

/// Binary space partition of a region. Only leaves carry a region; a split node covers the union
/// of its children.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PartitionTree {
    Leaf(Region),
    Split {
        axis: Axis,
        left: Box<PartitionTree>,
        right: Box<PartitionTree>,
    },
}

impl PartitionTree {
    /// Recursively splits `root` `iterations` levels deep, yielding `2^iterations` leaves.
    pub fn build<R: Rng>(
        root: Region,
        iterations: u32,
        spec: &SplitSpec,
        rng: &mut R,
    ) -> Result<Self, GenerateError> {
        if iterations == 0 {
            return Ok(PartitionTree::Leaf(root));
        }

        let split = split_region(&root, spec, rng)?;
        log::trace!(
            "Split {:?} {:?} into {:?} and {:?} after {} tries",
            root,
            split.axis,
            split.first,
            split.second,
            split.tries
        );

        let left = Self::build(split.first, iterations - 1, spec, rng)?;
        let right = Self::build(split.second, iterations - 1, spec, rng)?;

        Ok(PartitionTree::Split {
            axis: split.axis,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PartitionTree::Leaf(_))
    }

    /// Leaf regions, left to right.
    pub fn leaves(&self) -> Vec<Region> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);

        leaves
    }

    fn collect_leaves(&self, leaves: &mut Vec<Region>) {
        match self {
            PartitionTree::Leaf(region) => leaves.push(*region),
            PartitionTree::Split { left, right, .. } => {
                left.collect_leaves(leaves);
                right.collect_leaves(leaves);
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PartitionTree::Leaf(_) => 1,
            PartitionTree::Split { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    pub fn internal_count(&self) -> usize {
        match self {
            PartitionTree::Leaf(_) => 0,
            PartitionTree::Split { left, right, .. } => {
                1 + left.internal_count() + right.internal_count()
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            PartitionTree::Leaf(_) => 0,
            PartitionTree::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn bounds(&self) -> Region {
        match self {
            PartitionTree::Leaf(region) => *region,
            PartitionTree::Split { left, right, .. } => left.bounds().union(&right.bounds()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::small_rng;

    fn assert_partitions(parent: &Region, split: &Split) {
        let (a, b) = (split.first, split.second);

        assert!(!a.is_empty() && !b.is_empty());
        assert_eq!(a.area() + b.area(), parent.area());
        assert!(parent.contains_region(&a));
        assert!(parent.contains_region(&b));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_split_children_partition_parent() {
        let regions = [
            Region::new(1, 1, 18, 18),
            Region::new(0, 0, 64, 20),
            Region::new(-5, 3, 7, 31),
            Region::new(2, 2, 2, 2),
        ];
        let policies = [
            SplitPolicy::Random,
            SplitPolicy::Vertical,
            SplitPolicy::Horizontal,
        ];

        for seed in 0..20 {
            let mut rng = small_rng([seed, 1, 2, 3]);
            for region in regions.iter() {
                for policy in policies.iter() {
                    let spec = SplitSpec {
                        policy: *policy,
                        ..Default::default()
                    };
                    let split = split_region(region, &spec, &mut rng).unwrap();
                    assert_partitions(region, &split);
                    if *policy == SplitPolicy::Vertical {
                        assert_eq!(split.axis, Axis::Vertical);
                    }
                }
            }
        }
    }

    #[test]
    fn test_accepted_split_respects_ratio() {
        let region = Region::new(1, 1, 38, 18);
        let spec = SplitSpec::default();

        for seed in 0..50 {
            let split = split_region(&region, &spec, &mut small_rng([seed, 0, 0, 0])).unwrap();
            assert_partitions(&region, &split);
            if !split.fell_back {
                assert!(spec.accepts(split.axis, &split.first, &split.second));
            }
        }
    }

    #[test]
    fn test_split_without_ratio_check_accepts_first_cut() {
        let spec = SplitSpec {
            discard_by_ratio: false,
            ..Default::default()
        };
        let region = Region::new(0, 0, 2, 40);

        let split = split_region(&region, &spec, &mut small_rng([3, 3, 3, 3])).unwrap();
        assert_eq!(split.tries, 1);
        assert!(!split.fell_back);
    }

    #[test]
    fn test_thin_region_vertical_only_terminates() {
        let region = Region::new(0, 0, 1, 10);
        let spec = SplitSpec {
            policy: SplitPolicy::Vertical,
            ..Default::default()
        };

        match split_region(&region, &spec, &mut small_rng([1, 1, 1, 1])) {
            Err(GenerateError::RegionTooSmall { axis, .. }) => assert_eq!(axis, Axis::Vertical),
            other => panic!("expected RegionTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_thin_region_random_policy_cuts_the_long_way() {
        let region = Region::new(0, 0, 1, 10);
        let mut rng = small_rng([1, 1, 1, 1]);
        let split = split_region(&region, &SplitSpec::default(), &mut rng).unwrap();

        assert_eq!(split.axis, Axis::Horizontal);
        assert_partitions(&region, &split);
    }

    #[test]
    fn test_unsatisfiable_ratio_falls_back_to_midpoint() {
        // Every vertical cut of a 2x40 region leaves a 1x40 sliver.
        let region = Region::new(0, 0, 2, 40);
        let spec = SplitSpec {
            policy: SplitPolicy::Vertical,
            max_tries: 8,
            ..Default::default()
        };

        let split = split_region(&region, &spec, &mut small_rng([9, 9, 9, 9])).unwrap();
        assert!(split.fell_back);
        assert_eq!(split.tries, 8);
        assert_eq!(split.first, Region::new(0, 0, 1, 40));
        assert_eq!(split.second, Region::new(1, 0, 1, 40));
    }

    #[test]
    fn test_unit_region_cannot_split() {
        let region = Region::new(4, 4, 1, 1);

        assert!(matches!(
            split_region(&region, &SplitSpec::default(), &mut small_rng([0, 0, 0, 1])),
            Err(GenerateError::RegionTooSmall { .. })
        ));
    }

    #[test]
    fn test_tree_node_counts() {
        let root = Region::new(1, 1, 62, 62);
        for depth in 0..=4u32 {
            let mut rng = small_rng([depth, 5, 5, 5]);
            let tree = PartitionTree::build(root, depth, &SplitSpec::default(), &mut rng).unwrap();

            assert_eq!(tree.leaf_count(), 1 << depth);
            assert_eq!(tree.internal_count(), (1 << depth) - 1);
            assert_eq!(tree.depth(), depth as usize);
            assert_eq!(tree.bounds(), root);
        }
    }

    #[test]
    fn test_leaves_tile_the_root() {
        let root = Region::new(1, 1, 48, 30);
        let mut rng = small_rng([2, 4, 6, 8]);
        let tree = PartitionTree::build(root, 3, &SplitSpec::default(), &mut rng).unwrap();
        let leaves = tree.leaves();

        assert_eq!(leaves.len(), 8);
        assert_eq!(leaves.iter().map(Region::area).sum::<i64>(), root.area());
        for (i, a) in leaves.iter().enumerate() {
            assert!(root.contains_region(a));
            for b in leaves[i + 1..].iter() {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_depth_zero_is_the_root_leaf() {
        let root = Region::new(1, 1, 10, 10);
        let mut rng = small_rng([0; 4]);
        let tree = PartitionTree::build(root, 0, &SplitSpec::default(), &mut rng).unwrap();

        assert!(tree.is_leaf());
        assert_eq!(tree.leaves(), vec![root]);
    }
}
