use geo::{BoundingRect, MultiPolygon, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a MultiPolygon by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of corresponding MultiPolygon in the layer
    bbox: Rect<f64>,
}

impl BoundingBox {
    fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding MultiPolygon.
    pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// R-tree over the bounding boxes of a layer's geometries.
/// Empty geometries have no bounding box and are never returned as candidates.
#[derive(Debug)]
pub(crate) struct SpatialIndex {
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    pub(crate) fn new(geoms: &[MultiPolygon<f64>]) -> Self {
        Self {
            rtree: RTree::bulk_load(
                geoms.iter().enumerate()
                    .filter_map(|(i, mp)| mp.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
        }
    }

    /// Indices of geometries whose bounding box intersects that of `geom`, ascending.
    pub(crate) fn candidates(&self, geom: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = geom.bounding_rect() else { return Vec::new() };
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());
        let mut hits = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(BoundingBox::idx)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }
}
