
use pretty_assertions::assert_eq;
use ruletree::{
    compile_node, EditError, Field, Filter, Group, Logic, Node, NodeId, Operator, RuleTree,
};

fn child_ids(tree: &RuleTree, group: &str) -> Vec<String> {
    tree.node(&group.into())
        .unwrap()
        .children()
        .iter()
        .map(|c| c.id().to_string())
        .collect()
}

fn abc() -> RuleTree {
    RuleTree::builder("Root")
        .id("root")
        .child(Filter::new(Field::Name, Operator::Equals, "a").with_id("A"))
        .child(Filter::new(Field::Name, Operator::Equals, "b").with_id("B"))
        .child(Filter::new(Field::Name, Operator::Equals, "c").with_id("C"))
        .build()
        .unwrap()
}

#[test]
fn filter_compiles_to_its_condition() {
    let filter = Node::from(Filter::new(Field::BirthDate, Operator::IsAfter, "2077-01-01"));
    assert_eq!(compile_node(&filter), "birth_date is after '2077-01-01'");
}

#[test]
fn or_group_wraps_its_children() {
    let tree = RuleTree::builder("Root")
        .logic(Logic::Or)
        .filter(Field::Channel, Operator::Equals, "email")
        .filter(Field::Name, Operator::Contains, "Roma")
        .build()
        .unwrap();
    assert_eq!(
        tree.expression(),
        "(channel equals 'email' OR name contains 'Roma')"
    );
}

#[test]
fn single_contributing_child_is_unwrapped() {
    let tree = RuleTree::builder("Root")
        .filter(Field::City, Operator::Equals, "Moskva")
        .child(Filter::new(Field::Name, Operator::Equals, "skip").disabled(true))
        .group("Empty", |g| g)
        .build()
        .unwrap();
    assert_eq!(tree.expression(), "city equals 'Moskva'");
}

#[test]
fn disabled_group_compiles_to_nothing() {
    let tree = RuleTree::builder("Root")
        .disabled(true)
        .filter(Field::Email, Operator::IsNotEmpty, "")
        .filter(Field::Country, Operator::StartsWith, "Ro")
        .build()
        .unwrap();
    assert_eq!(tree.expression(), "");
}

#[test]
fn remove_root_leaves_tree_unchanged() {
    init();
    let tree = abc();
    let err = tree.remove_at(&tree.root_path()).unwrap_err();
    assert_eq!(err, EditError::InvalidRootOperation);
    assert_eq!(child_ids(&tree, "root"), ["A", "B", "C"]);
}

// The destination index is a slot in the child list as it is before the
// move, shifted down by one when the source sits in front of it.

// Dragging onto the end of the own group yields the slot past the last
// child, index 3 here; index 2 is the slot between B and C.
#[test]
fn same_parent_move_to_end() {
    let moved = abc().move_node(&"A".into(), &"root".into(), 3).unwrap();
    assert_eq!(child_ids(&moved, "root"), ["B", "C", "A"]);
}

#[test]
fn same_parent_move_past_one_sibling() {
    let moved = abc().move_node(&"A".into(), &"root".into(), 2).unwrap();
    assert_eq!(child_ids(&moved, "root"), ["B", "A", "C"]);
}

#[test]
fn same_parent_move_onto_own_slot_is_noop() {
    let tree = abc();
    for index in [0, 1] {
        let moved = tree.move_node(&"A".into(), &"root".into(), index).unwrap();
        assert_eq!(moved, tree);
    }
}

#[test]
fn same_parent_move_backwards() {
    let moved = abc().move_node(&"C".into(), &"root".into(), 0).unwrap();
    assert_eq!(child_ids(&moved, "root"), ["C", "A", "B"]);
    let moved = abc().move_node(&"C".into(), &"root".into(), 1).unwrap();
    assert_eq!(child_ids(&moved, "root"), ["A", "C", "B"]);
}

#[test]
fn same_parent_index_past_end_appends() {
    let moved = abc().move_node(&"B".into(), &"root".into(), 99).unwrap();
    assert_eq!(child_ids(&moved, "root"), ["A", "C", "B"]);
}

#[test]
fn cross_parent_move_appears_exactly_once() {
    let tree = RuleTree::builder("Root")
        .id("root")
        .group("Left", |g| g.id("left").child(Filter::blank().with_id("f")))
        .group("Right", |g| g.id("right").child(Filter::blank().with_id("r0")))
        .build()
        .unwrap();
    let moved = tree.move_node(&"f".into(), &"right".into(), 0).unwrap();

    assert!(child_ids(&moved, "left").is_empty());
    assert_eq!(child_ids(&moved, "right"), ["f", "r0"]);
    let count = moved
        .root_node()
        .iter()
        .filter(|n| n.id().as_str() == "f")
        .count();
    assert_eq!(count, 1);
    assert_eq!(moved.len(), tree.len());
}

#[test]
fn move_into_self_or_descendant_leaves_tree_unchanged() {
    init();
    let tree = RuleTree::builder("Root")
        .id("root")
        .group("Outer", |g| g.id("outer").group("Inner", |g| g.id("inner")))
        .build()
        .unwrap();
    let before = tree.clone();

    for dest in ["outer", "inner"] {
        let err = tree.move_node(&"outer".into(), &dest.into(), 0).unwrap_err();
        assert_eq!(
            err,
            EditError::CycleRejected {
                group: "outer".into(),
                destination: dest.into(),
            }
        );
    }
    assert_eq!(tree, before);
}

#[test]
fn stale_path_resolves_against_new_version() {
    let v1 = abc();
    let stale = v1.find(&"C".into()).unwrap();
    let v2 = v1.move_node(&"C".into(), &"root".into(), 0).unwrap();

    let v3 = v2
        .update_at(&stale, |mut f: Filter| {
            f.value = "changed".to_owned();
            f
        })
        .unwrap();
    let node = v3.node(&"C".into()).unwrap().as_filter().unwrap();
    assert_eq!(node.value, "changed");
    assert_eq!(child_ids(&v3, "root"), ["C", "A", "B"]);
}

#[test]
fn removed_target_is_path_mismatch() {
    init();
    let v1 = abc();
    let stale = v1.find(&"B".into()).unwrap();
    let v2 = v1.remove_at(&stale).unwrap();
    let err = v2.remove_at(&stale).unwrap_err();
    assert_eq!(err, EditError::PathMismatch { id: "B".into() });
}

#[test]
fn insert_group_into_deep_nesting() {
    let mut builder = RuleTree::builder("Root").id("root");
    builder = builder.group("L0", |g| {
        g.id("l0")
            .group("L1", |g| g.id("l1").group("L2", |g| g.id("l2")))
    });
    let tree = builder.build().unwrap();

    let parent = tree.find(&"l2".into()).unwrap();
    let group = Group::new("L3")
        .with_id("l3")
        .with_child(Filter::new(Field::Email, Operator::EndsWith, "@mail.ru"));
    let tree = tree.insert_into(&parent, group, None).unwrap();

    let path = tree.find(&"l3".into()).unwrap();
    let ids: Vec<&NodeId> = path.ids().collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(tree.expression(), "email ends with '@mail.ru'");
}

#[test]
fn json_file_round_trip() {
    let tree = abc();
    let dir = std::env::temp_dir().join(format!("ruletree-{}", NodeId::generate()));
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("tree.json");

    tree.to_file(&file).unwrap();
    let back = RuleTree::from_file(&file).unwrap();
    assert_eq!(back, tree);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_io_error() {
    let err = RuleTree::from_file("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ruletree::RuleTreeError::Io(_)));
}

fn init() {
    testing::init_test_setup();
}
