//! Overlap clustering of a page's drawings.
//!
//! Path fragments of one illustration are painted as many separate drawings.
//! They are regrouped here with a union-find over the page's drawing list:
//! two drawings join when their margin-expanded boxes intersect, unless one
//! of them is background-scale (see [`SizeClassifier`]).
//!
//! The union-find lives in plain parent/rank index arrays, so grouping never
//! touches the drawings themselves and depends only on their boxes and their
//! emission order.

use crate::geometry::BoundingBox;
use crate::pipeline::drawing::Drawing;
use tracing::debug;

/// Flags boxes large enough to be page backgrounds or frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeClassifier {
    /// Maximum width or height (points) of a drawing that may cluster.
    pub overlap_threshold: f64,
}

impl SizeClassifier {
    pub fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    pub fn is_background(&self, bbox: &BoundingBox) -> bool {
        bbox.width() > self.overlap_threshold || bbox.height() > self.overlap_threshold
    }

    /// Whether a pair is allowed to merge at all, regardless of geometry.
    pub fn may_overlap(&self, a: &BoundingBox, b: &BoundingBox) -> bool {
        !self.is_background(a) && !self.is_background(b)
    }
}

/// Clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterParams {
    pub overlap_threshold: f64,
    /// Padding (points) added to every side of each box before testing.
    pub margin_allowance: f64,
}

/// A group of drawings rendered as one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices into the page's drawing list, ascending (emission order).
    pub members: Vec<usize>,
    /// Union of the members' boxes (without margin).
    pub bbox: BoundingBox,
}

impl Cluster {
    pub fn drawings<'a>(&'a self, all: &'a [Drawing]) -> impl Iterator<Item = &'a Drawing> + 'a {
        self.members.iter().map(move |&i| &all[i])
    }
}

/// Disjoint-set forest addressed by index.
#[derive(Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            // path halving
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}

/// Group drawings into clusters.
///
/// Clusters come back ordered by their first member; members ascend. The
/// O(n²) pair scan is fine for the tens to low hundreds of drawings a page
/// carries.
pub fn cluster_drawings(drawings: &[Drawing], params: &ClusterParams) -> Vec<Cluster> {
    let boxes: Vec<BoundingBox> = drawings.iter().map(Drawing::bbox).collect();
    cluster_boxes(&boxes, params)
}

/// [`cluster_drawings`] over precomputed boxes.
pub fn cluster_boxes(boxes: &[BoundingBox], params: &ClusterParams) -> Vec<Cluster> {
    let n = boxes.len();
    let classifier = SizeClassifier::new(params.overlap_threshold);
    let expanded: Vec<BoundingBox> = boxes
        .iter()
        .map(|b| b.expand(params.margin_allowance))
        .collect();

    let mut sets = DisjointSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if classifier.may_overlap(&boxes[i], &boxes[j]) && expanded[i].intersects(&expanded[j]) {
                sets.union(i, j);
            }
        }
    }

    // Bucket by root, in order of first appearance.
    let mut bucket_of_root: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<Cluster> = Vec::new();
    for (i, bbox) in boxes.iter().enumerate() {
        let root = sets.find(i);
        match bucket_of_root[root] {
            Some(k) => {
                let cluster = &mut clusters[k];
                cluster.members.push(i);
                cluster.bbox = cluster.bbox.union(bbox);
            }
            None => {
                bucket_of_root[root] = Some(clusters.len());
                clusters.push(Cluster {
                    members: vec![i],
                    bbox: *bbox,
                });
            }
        }
    }

    debug!(
        "Clustered {} drawings into {} clusters ({} background-scale)",
        n,
        clusters.len(),
        boxes.iter().filter(|b| classifier.is_background(b)).count()
    );

    clusters
}
