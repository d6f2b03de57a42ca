//! Nearest-centroid archetype assignment.

use crate::model::ClusterArchetype;

/// Find the archetype closest to `(travel, energy)`.
///
/// Distance is plain Euclidean on raw kg/day; the axes are not scaled.
/// The first archetype in catalog order wins exact ties. Returns `None`
/// only for an empty catalog.
#[must_use]
pub fn assign_cluster(travel: f64, energy: f64, catalog: &[ClusterArchetype]) -> Option<&ClusterArchetype> {
    let mut best: Option<(&ClusterArchetype, f64)> = None;

    for archetype in catalog {
        let distance = (travel - archetype.travel).hypot(energy - archetype.energy);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((archetype, distance)),
        }
    }

    best.map(|(archetype, _)| archetype)
}
