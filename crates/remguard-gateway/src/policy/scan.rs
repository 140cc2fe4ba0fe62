//! Structural scan of table arguments.
//!
//! The walk is iterative (explicit stack), so hostile nesting is bounded by
//! `MAX_SCAN_DEPTH` rather than by the native stack. Tables already seen in
//! the current pass are skipped, which makes cycles and shared subtables
//! terminate without being reported as violations.

use std::collections::HashMap;

use remguard_core::protocol::convert::MAX_CONTAINER_ENTRIES;
use remguard_core::{RejectReason, Table, TableId, Value};

use super::validate::{Check, ValueValidator};

/// Deepest table nesting accepted. The root table is depth 1.
pub const MAX_SCAN_DEPTH: usize = 32;
/// Most entries a single table may carry. Matches the decoder's limit, so
/// decoded tables never exceed it.
pub const MAX_TABLE_KEYS: usize = MAX_CONTAINER_ENTRIES;

/// State of one validation pass. Dropped when the pass ends.
#[derive(Default)]
pub struct ScanContext {
    // Holding the handle pins the allocation, so an id cannot be reused by
    // another table while the pass is running.
    visited: HashMap<TableId, Table>,
    depth: usize,
}

impl ScanContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, t: &Table) -> bool {
        self.visited.contains_key(&t.id())
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Depth of the table currently (or last) being scanned.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

pub struct StructuralScanner<'a> {
    validator: &'a ValueValidator<'a>,
}

impl<'a> StructuralScanner<'a> {
    pub fn new(validator: &'a ValueValidator<'a>) -> Self {
        Self { validator }
    }

    /// Validate every key and value reachable from `root`. Stops at the
    /// first failure.
    pub async fn scan(&self, root: &Table, ctx: &mut ScanContext) -> Check {
        let mut stack: Vec<(Table, usize)> = vec![(root.clone(), 1)];

        while let Some((table, depth)) = stack.pop() {
            if ctx.is_visited(&table) {
                continue;
            }
            if depth > MAX_SCAN_DEPTH {
                return Err(RejectReason::TooDeep);
            }
            ctx.depth = depth;

            let entries = table.entries();
            if entries.len() > MAX_TABLE_KEYS {
                return Err(RejectReason::TooManyKeys);
            }
            ctx.visited.insert(table.id(), table);

            for (k, v) in &entries {
                for item in [k, v] {
                    self.validator.validate_value(item).await?;
                    if let Value::Table(child) = item {
                        if !ctx.is_visited(child) {
                            stack.push((child.clone(), depth + 1));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
