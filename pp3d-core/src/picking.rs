/// Nearest-hit resolution of a picking ray against bounding volumes
use tracing::trace;

use crate::bounds::{BoundingVolume, Intersection};
use crate::ray::Ray;

/// Anything that can be hit by a picking ray
pub trait Pickable {
    fn bounding_volume(&self) -> &BoundingVolume;
}

impl Pickable for BoundingVolume {
    fn bounding_volume(&self) -> &BoundingVolume {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a, T> {
    pub target: &'a T,
    pub intersection: Intersection,
}

/// Every candidate the ray hits, nearest first. Equal `t` keeps candidate order.
pub fn hits<'a, T, I>(ray: &Ray, candidates: I) -> Vec<Hit<'a, T>>
where
    T: Pickable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut hits: Vec<Hit<'a, T>> = candidates
        .into_iter()
        .filter_map(|target| {
            target
                .bounding_volume()
                .intersect(ray)
                .map(|intersection| Hit { target, intersection })
        })
        .collect();

    hits.sort_by(|a, b| a.intersection.t.total_cmp(&b.intersection.t));
    trace!(count = hits.len(), "ray hits");
    hits
}

pub fn pick_nearest<'a, T, I>(ray: &Ray, candidates: I) -> Option<&'a T>
where
    T: Pickable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    hits(ray, candidates).first().map(|hit| hit.target)
}
