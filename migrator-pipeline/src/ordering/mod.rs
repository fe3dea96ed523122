//! Task order computation
//!
//! This module contains the ordering machinery of the pipeline:
//! - `DependencyGraph`: directed graph over the ordinary migrated objects
//! - `compute_task_order`: full execution order with the identity/read-only
//!   floor partition in front of the topologically sorted ordinary objects
//! - `compute_query_order`: retrieval-priority order over the task order
//! - `master_detail_targets`: objects that act as a hard dependency parent

mod graph;

use std::collections::HashSet;

pub use graph::{DependencyGraph, EdgeKind};

use migrator_shared::types::ScriptObject;

use crate::errors::OrderingError;

/// Computes the execution order over the declared objects.
///
/// Identity/reference-type objects are unshifted to the front as they are
/// encountered, read-only objects follow them in declaration order, and the
/// remaining ordinary objects are topologically sorted with declaration
/// order as the tie-break. Returns indices into `objects`.
///
/// # Errors
///
/// `OrderingError::MasterDetailCycle` when the declared master-detail
/// relationships cannot be linearized.
pub fn compute_task_order(objects: &[ScriptObject]) -> Result<Vec<usize>, OrderingError> {
    let mut identity: Vec<usize> = Vec::new();
    let mut readonly: Vec<usize> = Vec::new();
    let mut ordinary: Vec<usize> = Vec::new();

    for (index, object) in objects.iter().enumerate() {
        if object.is_special_object {
            identity.insert(0, index);
        } else if object.is_readonly_object {
            readonly.push(index);
        } else {
            ordinary.push(index);
        }
    }

    let graph = DependencyGraph::from_objects(objects, &ordinary);
    let sorted = graph.sort()?;

    let mut order = identity;
    order.extend(readonly);
    order.extend(sorted.into_iter().map(|position| ordinary[position]));
    Ok(order)
}

/// Computes the retrieval-priority order over a task-ordered object slice.
///
/// Tasks with unrestricted ("fetch everything") or explicitly size-limited
/// queries come first, everything else follows; both partitions keep their
/// relative task order and no task appears twice. Returns indices into
/// `objects`.
pub fn compute_query_order(objects: &[&ScriptObject]) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        if object.all_records || object.is_limited_query {
            order.push(index);
        }
    }
    for index in 0..objects.len() {
        if !order.contains(&index) {
            order.push(index);
        }
    }
    order
}

/// Names of declared objects that another declared object lists among its
/// master-detail parents.
///
/// This derives, once and immutably, the property the ordering constraints
/// depend on; no per-task mutable flag is accumulated during a scan.
pub fn master_detail_targets(objects: &[ScriptObject]) -> HashSet<String> {
    let declared: HashSet<&str> = objects.iter().map(|object| object.name.as_str()).collect();
    let mut targets = HashSet::new();
    for object in objects {
        for parent in &object.master_detail_parents {
            if parent != &object.name && declared.contains(parent.as_str()) {
                targets.insert(parent.clone());
            }
        }
    }
    targets
}
