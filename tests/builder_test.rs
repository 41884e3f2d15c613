//! Tests for HierarchyBuilder

use std::collections::HashSet;

use rstest::rstest;

use orgtree::domain::{DomainError, FlatRecord, HierarchyBuilder, TreeArena};

fn identities(tree: &TreeArena) -> Vec<String> {
    tree.iter().map(|(_, n)| n.data.identity.clone()).collect()
}

fn reports_of(tree: &TreeArena, identity: &str) -> Vec<String> {
    let idx = tree.find(identity).expect("node present");
    tree.children_of(idx)
        .map(|(_, n)| n.data.identity.clone())
        .collect()
}

#[test]
fn given_reference_example_when_building_then_nests_reports() {
    // Arrange
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("B", "A"),
        FlatRecord::child("C", "A"),
        FlatRecord::child("D", "B"),
    ];

    // Act
    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    // Assert
    let tree = &hierarchy.tree;
    assert_eq!(tree.root_node().unwrap().data.identity, "A");
    assert_eq!(reports_of(tree, "A"), vec!["B", "C"]);
    assert_eq!(reports_of(tree, "B"), vec!["D"]);
    assert!(reports_of(tree, "C").is_empty());
    assert!(reports_of(tree, "D").is_empty());
    assert!(hierarchy.issues.is_empty());
    assert!(hierarchy.unattached.is_empty());
}

#[test]
fn given_no_root_when_building_then_missing_root() {
    let records = vec![FlatRecord::child("X", "Y")];

    let result = HierarchyBuilder::new().build_tree(&records);

    assert!(matches!(result, Err(DomainError::MissingRoot)));
}

#[test]
fn given_empty_list_when_building_then_missing_root() {
    let result = HierarchyBuilder::new().build_tree(&[]);

    assert!(matches!(result, Err(DomainError::MissingRoot)));
}

#[test]
fn given_two_roots_when_building_then_first_wins_and_second_is_excluded() {
    let records = vec![
        FlatRecord::child("B", "A"),
        FlatRecord::root("A"),
        FlatRecord::root("Z"),
        FlatRecord::child("Y", "Z"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(identities(&hierarchy.tree), vec!["A", "B"]);
    assert!(hierarchy.issues.is_empty());
    assert_eq!(hierarchy.unattached, vec!["Z", "Y"]);
}

#[test]
fn given_dangling_manager_when_building_then_record_is_left_out() {
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("B", "A"),
        FlatRecord::child("orphan", "nobody"),
        FlatRecord::child("orphan-report", "orphan"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(identities(&hierarchy.tree), vec!["A", "B"]);
    assert!(hierarchy.issues.is_empty(), "dangling is not an error");
    assert_eq!(hierarchy.unattached, vec!["orphan", "orphan-report"]);
}

#[test]
fn given_duplicate_identity_when_building_then_first_occurrence_wins() {
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("B", "A"),
        FlatRecord::root("A"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(identities(&hierarchy.tree), vec!["A", "B"]);
    assert_eq!(
        hierarchy.issues,
        vec![DomainError::DuplicateIdentity {
            identity: "A".to_string(),
            position: 2,
        }]
    );
}

#[test]
fn given_duplicate_with_other_manager_when_building_then_later_link_is_ignored() {
    // Without a first-wins rule, B would appear twice (under A and under C).
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("B", "A"),
        FlatRecord::child("C", "A"),
        FlatRecord::child("B", "C"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(hierarchy.tree.len(), 3);
    assert_eq!(reports_of(&hierarchy.tree, "A"), vec!["B", "C"]);
    assert!(reports_of(&hierarchy.tree, "C").is_empty());
    assert_eq!(hierarchy.issues.len(), 1);
}

#[test]
fn given_cycle_beside_root_when_building_then_reports_cycle_once() {
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("X", "Y"),
        FlatRecord::child("Y", "X"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(identities(&hierarchy.tree), vec!["A"]);
    assert_eq!(hierarchy.unattached, vec!["X", "Y"]);
    assert_eq!(
        hierarchy.issues,
        vec![DomainError::CyclicReference("X".to_string())]
    );
}

#[test]
fn given_self_managed_record_when_building_then_reports_cycle() {
    let records = vec![FlatRecord::root("A"), FlatRecord::child("Z", "Z")];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(hierarchy.unattached, vec!["Z"]);
    assert_eq!(
        hierarchy.issues,
        vec![DomainError::CyclicReference("Z".to_string())]
    );
}

#[test]
fn given_chain_hanging_from_loop_when_building_then_only_loop_is_reported() {
    let records = vec![
        FlatRecord::root("A"),
        FlatRecord::child("tail", "X"),
        FlatRecord::child("X", "Y"),
        FlatRecord::child("Y", "X"),
        FlatRecord::child("stray", "nobody"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(hierarchy.unattached, vec!["tail", "X", "Y", "stray"]);
    assert_eq!(
        hierarchy.issues,
        vec![DomainError::CyclicReference("X".to_string())]
    );
}

#[test]
fn given_reports_listed_before_manager_when_building_then_order_follows_input() {
    let records = vec![
        FlatRecord::child("c3", "m"),
        FlatRecord::child("c1", "m"),
        FlatRecord::child("m", "root"),
        FlatRecord::child("c2", "m"),
        FlatRecord::root("root"),
    ];

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(reports_of(&hierarchy.tree, "m"), vec!["c3", "c1", "c2"]);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(10)]
#[case(250)]
fn given_resolvable_records_when_building_then_every_record_appears_once(#[case] size: usize) {
    // Balanced-ish tree: record i reports to record (i - 1) / 3.
    let records: Vec<FlatRecord> = (0..size)
        .map(|i| {
            if i == 0 {
                FlatRecord::root("e0")
            } else {
                FlatRecord::child(format!("e{i}"), format!("e{}", (i - 1) / 3))
            }
        })
        .collect();

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    let seen = identities(&hierarchy.tree);
    assert_eq!(seen.len(), size);
    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), size);
    for (idx, node) in hierarchy.tree.iter() {
        if let Some(parent) = node.parent {
            let parent = hierarchy.tree.get_node(parent).unwrap();
            assert!(parent.children.contains(&idx));
        }
    }
}

#[test]
fn given_long_reporting_chain_when_building_then_does_not_overflow() {
    let depth = 50_000;
    let mut records = vec![FlatRecord::root("e0")];
    records.extend((1..depth).map(|i| FlatRecord::child(format!("e{i}"), format!("e{}", i - 1))));

    let hierarchy = HierarchyBuilder::new().build_tree(&records).unwrap();

    assert_eq!(hierarchy.tree.len(), depth);
    assert_eq!(hierarchy.tree.depth(), depth);
    assert_eq!(hierarchy.tree.leaf_nodes(), vec![format!("e{}", depth - 1)]);
}
