//! Section interpolation of node locations.
//!
//! Nodes traced on a broken or resampled section carry unreliable locations.
//! They are moved onto the straight line between their nearest reliable
//! neighbours, keeping the section coordinate itself.

use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::domain::arena::Arbor;
use crate::domain::distance::position_of;
use crate::domain::entities::{InterpolatableSections, NodeId, Position, Positions};
use crate::domain::error::DomainResult;

/// Largest distance (nm) between a coordinate and a section value that still
/// counts as lying on the section.
pub const SECTION_TOLERANCE: f64 = 1e-6;

/// First axis (X, Y, Z order) on which `position` lies on an interpolatable section.
fn matched_section(position: &Position, sections: &InterpolatableSections) -> Option<(usize, f64)> {
    (0..3).find_map(|axis| {
        sections
            .axis(axis)
            .iter()
            .find(|&&value| (position[axis] - value).abs() <= SECTION_TOLERANCE)
            .map(|&value| (axis, value))
    })
}

/// Move nodes on interpolatable sections between their reliable neighbours.
///
/// Returns the number of nodes whose position changed. Only `positions` is
/// modified, so pass a working copy if the original is cached elsewhere.
#[instrument(level = "debug", skip_all, fields(nodes = arbor.len()))]
pub fn interpolate_positions(
    arbor: &Arbor,
    positions: &mut Positions,
    sections: &InterpolatableSections,
) -> DomainResult<usize> {
    if sections.is_empty() {
        return Ok(0);
    }

    let snapshot = positions.clone();
    let mut broken = BTreeSet::new();
    for id in arbor.iter() {
        if matched_section(&position_of(&snapshot, id)?, sections).is_some() {
            broken.insert(id);
        }
    }

    let mut updates: Vec<(NodeId, Position)> = Vec::new();
    for &id in &broken {
        let current = position_of(&snapshot, id)?;
        let Some((axis, value)) = matched_section(&current, sections) else {
            continue;
        };

        let mut up_steps = 0usize;
        let mut ancestor = arbor.parent(id)?;
        while let Some(a) = ancestor {
            up_steps += 1;
            if !broken.contains(&a) {
                break;
            }
            ancestor = arbor.parent(a)?;
        }

        let mut down_steps = 0usize;
        let mut node = id;
        let descendant = loop {
            let children = arbor.children(node)?;
            if children.len() != 1 {
                break None;
            }
            node = children[0];
            down_steps += 1;
            if !broken.contains(&node) {
                break Some(node);
            }
        };

        let (Some(ancestor), Some(descendant)) = (ancestor, descendant) else {
            trace!("node {} has no reliable neighbours, keeping location", id);
            continue;
        };

        let from = position_of(&snapshot, ancestor)?;
        let to = position_of(&snapshot, descendant)?;
        let span = to[axis] - from[axis];
        let along_axis = (value - from[axis]) / span;
        let t = if span.abs() > SECTION_TOLERANCE && (0.0..=1.0).contains(&along_axis) {
            along_axis
        } else {
            up_steps as f64 / (up_steps + down_steps) as f64
        };

        let mut interpolated = from + (to - from) * t;
        interpolated[axis] = value;
        if interpolated != current {
            trace!("node {}: {:?} -> {:?}", id, current, interpolated);
            updates.push((id, interpolated));
        }
    }

    debug!(
        "{} of {} nodes on interpolatable sections moved",
        updates.len(),
        broken.len()
    );
    let moved = updates.len();
    positions.extend(updates);
    Ok(moved)
}
