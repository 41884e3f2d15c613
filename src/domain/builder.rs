//! Hierarchy builder: turns flat manager-referencing records into one tree.

use std::collections::{HashMap, HashSet, VecDeque};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::entities::FlatRecord;
use crate::domain::error::DomainError;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Outcome of a successful build.
///
/// A build succeeds as soon as a root exists. Everything that went wrong below
/// the root is collected in `issues`; records that never made it into the tree
/// are listed in `unattached`.
#[derive(Debug)]
pub struct Hierarchy {
    pub tree: TreeArena,
    pub issues: Vec<DomainError>,
    pub unattached: Vec<String>,
}

/// Reconstructs the reporting tree from a flat record list.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    visited: HashSet<String>,
    issues: Vec<DomainError>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree rooted at the first record without a manager.
    ///
    /// Direct reports are attached in input order. Later records repeating an
    /// identity are dropped (first occurrence wins). Records whose manager is
    /// never placed in the tree are silently left out, except for manager
    /// loops, which are reported as `CyclicReference`.
    ///
    /// # Errors
    ///
    /// `DomainError::MissingRoot` if no record lacks a manager.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn build_tree(&mut self, records: &[FlatRecord]) -> TreeResult<Hierarchy> {
        self.visited.clear();
        self.issues.clear();

        let records = self.dedup(records);

        let root = records
            .iter()
            .copied()
            .find(|r| r.is_root_candidate())
            .ok_or(DomainError::MissingRoot)?;
        debug!("root: {}", root.identity());

        let reports = index_by_manager(&records);
        let tree = self.assemble(root, &reports);
        self.report_cycles(&records);

        let unattached: Vec<String> = records
            .iter()
            .filter(|r| !self.visited.contains(r.identity()))
            .map(|r| r.identity().to_string())
            .collect();
        if !unattached.is_empty() {
            debug!("{} records not reachable from root", unattached.len());
        }

        Ok(Hierarchy {
            tree,
            issues: std::mem::take(&mut self.issues),
            unattached,
        })
    }

    /// Keep the first record of every identity, reporting the rest.
    fn dedup<'a>(&mut self, records: &'a [FlatRecord]) -> Vec<&'a FlatRecord> {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if seen.insert(record.identity()) {
                kept.push(record);
            } else {
                warn!("duplicate identity {} at {}", record.identity(), position);
                self.issues.push(DomainError::DuplicateIdentity {
                    identity: record.identity().to_string(),
                    position,
                });
            }
        }
        kept
    }

    /// Breadth-first attachment starting at `root`.
    fn assemble(
        &mut self,
        root: &FlatRecord,
        reports: &HashMap<&str, Vec<&FlatRecord>>,
    ) -> TreeArena {
        let mut tree = TreeArena::new();
        let root_idx = tree.insert_root(NodeData {
            identity: root.identity().to_string(),
        });
        self.visited.insert(root.identity().to_string());

        let mut queue: VecDeque<(Index, &str)> = VecDeque::new();
        queue.push_back((root_idx, root.identity()));

        while let Some((manager_idx, manager)) = queue.pop_front() {
            let Some(direct) = reports.get(manager) else {
                continue;
            };
            for report in direct {
                // After dedup every identity has one manager, so this only
                // trips on an index that repeats a record.
                if !self.visited.insert(report.identity().to_string()) {
                    warn!("cycle at {}", report.identity());
                    self.issues
                        .push(DomainError::CyclicReference(report.identity().to_string()));
                    continue;
                }
                let data = NodeData {
                    identity: report.identity().to_string(),
                };
                match tree.insert_child(data, manager_idx) {
                    Some(idx) => queue.push_back((idx, report.identity())),
                    None => {
                        warn!("cannot attach {} below {}", report.identity(), manager);
                        // The subtree stays unplaced and shows up as unattached.
                        self.visited.remove(report.identity());
                        self.issues.push(DomainError::Attachment {
                            identity: manager.to_string(),
                            reason: format!("manager node missing for {}", report.identity()),
                        });
                    }
                }
            }
        }
        tree
    }

    /// Report manager loops among records the root never reached.
    ///
    /// A loop has no path to the root, so `assemble` never walks it. Each loop
    /// is reported once, under the identity where the walk closes it.
    fn report_cycles(&mut self, records: &[&FlatRecord]) {
        let managers: HashMap<&str, &str> = records
            .iter()
            .filter_map(|r| r.parent_identity().map(|m| (r.identity(), m)))
            .collect();
        let mut settled: HashSet<&str> = HashSet::new();

        for record in records {
            let mut path: HashSet<&str> = HashSet::new();
            let mut current = Some(record.identity());
            while let Some(identity) = current {
                if settled.contains(identity) || self.visited.contains(identity) {
                    break;
                }
                if !path.insert(identity) {
                    warn!("cycle at {}", identity);
                    self.issues
                        .push(DomainError::CyclicReference(identity.to_string()));
                    break;
                }
                current = managers.get(identity).copied();
            }
            settled.extend(path);
        }
    }
}

/// Group records by manager identity, preserving input order.
fn index_by_manager<'a>(records: &[&'a FlatRecord]) -> HashMap<&'a str, Vec<&'a FlatRecord>> {
    let mut reports: HashMap<&str, Vec<&FlatRecord>> = HashMap::new();
    for record in records {
        if let Some(manager) = record.parent_identity() {
            reports.entry(manager).or_default().push(record);
        }
    }
    reports
}
