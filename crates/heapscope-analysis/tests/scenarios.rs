use heapscope_analysis::{OrphanKind, analyze, overall_statistics};
use heapscope_graph::{GraphStore, NodeOrdinal};
use heapscope_schemas::{
    EdgeLabel, EdgeType, GC_ROOTS_NAME, NodeId, NodeRecord, NodeType,
    SnapshotBuilder, SnapshotRecord,
};

/// Adds `(GC roots)` under the builder root and a `Window` reachable both
/// through it and through a root shortcut.
fn add_window(builder: &mut SnapshotBuilder, window_size: u64) -> NodeId {
    let root = builder.root();
    let gc_roots = builder.add_node(GC_ROOTS_NAME, 0, NodeType::Synthetic);
    builder.link(root, gc_roots, EdgeType::Element, Some(EdgeLabel::Index(1)));
    let window = builder.add_object("Window", window_size);
    builder.link(root, window, EdgeType::Shortcut, None);
    builder.link(
        gc_roots,
        window,
        EdgeType::Element,
        Some(EdgeLabel::Index(1)),
    );
    window
}

fn ord(store: &GraphStore, id: NodeId) -> NodeOrdinal {
    store.ordinal_of(id).unwrap()
}

/// Verifies that a subgraph held only weakly still counts toward totals
/// and carries its own retained size.
#[test]
fn weakly_held_subgraph_is_attributed() {
    // Setup:
    // - Window -weak-> Orphan -> OrphanChild -> B
    // - Window -> A -> B
    // - Root shortcuts to Window, A, B, and Orphan.
    let mut builder = SnapshotBuilder::new();
    let root = builder.root();
    let window = add_window(&mut builder, 10);
    let orphan = builder.add_object("Orphan", 2000);
    builder.link(window, orphan, EdgeType::Weak, Some("weak_ref".into()));
    let orphan_child = builder.add_object("OrphanChild", 2000);
    builder.property(orphan, orphan_child, "child");
    let a = builder.add_object("A", 300);
    builder.property(window, a, "a");
    let b = builder.add_object("B", 300);
    builder.property(a, b, "b");
    builder.property(orphan_child, b, "b");
    builder.link(root, window, EdgeType::Shortcut, Some("w".into()));
    builder.link(root, a, EdgeType::Shortcut, Some("a".into()));
    builder.link(root, b, EdgeType::Shortcut, Some("b".into()));
    builder.link(root, orphan, EdgeType::Shortcut, Some("o".into()));

    let store = GraphStore::from_snapshot(builder.build()).unwrap();
    let analysis = analyze(&store).unwrap();

    let statistics = overall_statistics(&store);
    assert_eq!(statistics.total, 4610);
    assert_eq!(statistics.v8heap, 4610);

    for (label, shallow, retained) in [
        ("A", 300, 300),
        ("B", 300, 300),
        ("Orphan", 2000, 4000),
        ("OrphanChild", 2000, 2000),
    ] {
        let (_, aggregate) = analysis.classes.find_by_label(label).unwrap();
        assert_eq!(aggregate.count, 1, "{label} count");
        assert_eq!(aggregate.shallow_size, shallow, "{label} shallow");
        assert_eq!(aggregate.retained_size, retained, "{label} retained");
    }

    let orphan = ord(&store, orphan);
    assert_eq!(analysis.dominators.immediate_dominator(orphan), None);
    assert_eq!(
        analysis.dominators.orphan_kind(orphan),
        Some(OrphanKind::ShortcutOnly)
    );
    assert_eq!(
        analysis.retained_size(store.root().unwrap()),
        statistics.total
    );
}

/// Verifies that weak links between buffers do not merge their retainers.
#[test]
fn weak_links_do_not_affect_retained_size() {
    // Array holds three Uint8Arrays, each owning an ArrayBuffer. The
    // buffers are chained by weak links.
    let mut builder = SnapshotBuilder::new();
    let window = add_window(&mut builder, 20);
    let array = builder.add_object("Array", 10);
    builder.property(window, array, "root");
    let mut previous_buffer = None;
    for i in 0..3 {
        let typed = builder.add_object("Uint8Array", 100);
        builder.link(
            array,
            typed,
            EdgeType::Element,
            Some(EdgeLabel::Index(i)),
        );
        let buffer = builder.add_object("ArrayBuffer", 1000);
        builder.link(typed, buffer, EdgeType::Internal, None);
        if let Some(previous) = previous_buffer {
            builder.link(
                previous,
                buffer,
                EdgeType::Weak,
                Some("weak_next".into()),
            );
        }
        previous_buffer = Some(buffer);
    }

    let store = GraphStore::from_snapshot(builder.build()).unwrap();
    let analysis = analyze(&store).unwrap();

    let (_, array_class) = analysis.classes.find_by_label("Array").unwrap();
    assert_eq!(array_class.count, 1);
    assert_eq!(array_class.shallow_size, 10);
    assert_eq!(array_class.retained_size, 3310);
    assert_eq!(analysis.distance(ord(&store, array)), Some(2));

    let (_, typed_class) =
        analysis.classes.find_by_label("Uint8Array").unwrap();
    assert_eq!(typed_class.count, 3);
    for &instance in &typed_class.instances {
        assert_eq!(store.node_at(instance).self_size, 100);
        assert_eq!(analysis.retained_size(instance), 1100);
    }
}

/// Verifies that a snapshot with no root set fails analysis outright.
#[test]
fn snapshot_without_root_fails_analysis() {
    let snapshot = SnapshotRecord {
        root: None,
        nodes: vec![NodeRecord {
            id: NodeId(1),
            name: "Detached".to_owned(),
            node_type: NodeType::Object,
            self_size: 8,
        }],
        edges: Vec::new(),
    };
    let store = GraphStore::from_snapshot(snapshot).unwrap();

    let err = analyze(&store).unwrap_err();
    assert!(err.is_missing_root());
    // Statistics do not need a root.
    assert_eq!(overall_statistics(&store).total, 8);
}

/// Verifies that the `(GC roots)` node stands in when no root is named.
#[test]
fn gc_roots_node_is_the_fallback_root() {
    let mut builder = SnapshotBuilder::new();
    let window = add_window(&mut builder, 20);
    let mut snapshot = builder.build();
    snapshot.root = None;

    let store = GraphStore::from_snapshot(snapshot).unwrap();
    let analysis = analyze(&store).unwrap();
    let root = store.root().unwrap();

    assert_eq!(store.node_at(root).name, GC_ROOTS_NAME);
    assert_eq!(analysis.distance(ord(&store, window)), Some(1));
    // The builder's own root is unreachable from `(GC roots)`.
    assert_eq!(analysis.dominators.orphan_count(), 1);
}
