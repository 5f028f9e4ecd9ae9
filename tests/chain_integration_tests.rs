//! Integration Tests for Cache Chains
//!
//! Exercises full chains through the public API.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use config_chain::cache::{
    layer_names, shared, CacheLayer, ChainBuilder, Encoding, InMemoryLayer, JsonLayer, LayerRef,
    Linkable, PropertiesLayer, SinkLayer, Value,
};
use config_chain::{CacheError, ConfigSpace};

// == Helper Functions ==

/// [l1 -> l2 -> sink], returning typed handles to both memory layers.
fn two_memory_layers() -> (Rc<RefCell<InMemoryLayer>>, Rc<RefCell<InMemoryLayer>>) {
    let (builder, l2) = ChainBuilder::new().stack_shared(InMemoryLayer::new("l2"));
    let (_, l1) = builder.stack_shared(InMemoryLayer::new("l1"));
    (l1, l2)
}

fn warmed_properties(text: &str) -> PropertiesLayer {
    let mut layer = PropertiesLayer::new("props");
    layer
        .warm_from_reader(text.as_bytes(), Encoding::Utf8)
        .unwrap();
    layer
}

// == Read Path ==

#[test]
fn test_miss_then_fill() {
    let (l1, l2) = two_memory_layers();
    l2.borrow_mut().put("greeting", Value::from("hello"));

    assert_eq!(l1.borrow_mut().get_string("greeting", "d").unwrap(), "hello");
    assert_eq!(l1.borrow_mut().get_string("greeting", "d").unwrap(), "hello");

    assert!(l1.borrow().has_value("greeting"));
    assert_eq!(l2.borrow().stats().lookups(), 1);
}

#[test]
fn test_default_on_full_miss() {
    let (l1, l2) = two_memory_layers();

    assert!(!l1.borrow_mut().get_boolean("absent", false).unwrap());
    assert_eq!(l1.borrow_mut().get_double("absent", 2.5).unwrap(), 2.5);
    assert_eq!(l1.borrow_mut().get_int("absent", 42).unwrap(), 42);
    assert_eq!(l1.borrow_mut().get_string("absent", "d").unwrap(), "d");

    assert!(l1.borrow().is_empty());
    assert_eq!(l2.borrow().stats().misses, 4);
}

#[test]
fn test_head_shadows_lower_layers() {
    let (l1, l2) = two_memory_layers();
    l1.borrow_mut().put("k", Value::Int(1));
    l2.borrow_mut().put("k", Value::Int(2));

    assert_eq!(l1.borrow_mut().get_int("k", 0).unwrap(), 1);
    assert_eq!(l2.borrow().stats().lookups(), 0);
}

#[test]
fn test_type_mismatch_uses_default() {
    let (l1, l2) = two_memory_layers();
    l2.borrow_mut().put("port", Value::from("eighty"));

    assert_eq!(l1.borrow_mut().get_int("port", 80).unwrap(), 80);
    // the raw value is still cached by the read-fill
    assert_eq!(l1.borrow().peek("port"), Some(&Value::from("eighty")));
}

// == Invalidation ==

#[test]
fn test_invalidate_is_local_remove_propagates() {
    let (l1, l2) = two_memory_layers();
    l1.borrow_mut().put("k", Value::Int(1));
    l2.borrow_mut().put("k", Value::Int(2));

    assert_eq!(l1.borrow_mut().invalidate("k"), Some(Value::Int(1)));
    assert!(l2.borrow().has_value("k"));
    assert_eq!(l2.borrow().stats().removals, 0);

    l1.borrow_mut().put("k", Value::Int(1));
    assert_eq!(l1.borrow_mut().remove("k").unwrap(), Some(Value::Int(1)));
    assert_eq!(l2.borrow().stats().removals, 1);
    assert!(!l2.borrow().has_value("k"));
}

#[test]
fn test_clear_does_not_touch_next_layer() {
    let (l1, l2) = two_memory_layers();
    l1.borrow_mut().put("a", Value::Int(1));
    l2.borrow_mut().put("a", Value::Int(1));

    l1.borrow_mut().clear();
    assert!(l1.borrow().is_empty());
    assert!(l2.borrow().has_value("a"));
}

// == Flush ==

#[test]
fn test_flush_pushes_without_clearing() {
    let (l1, l2) = two_memory_layers();
    l1.borrow_mut().put_all(HashMap::from([
        ("a".to_string(), Value::Int(1)),
        ("b".to_string(), Value::Int(2)),
    ]));

    l1.borrow_mut().flush().unwrap();

    let pushed: HashMap<String, Value> = l2
        .borrow()
        .entries()
        .map(|entry| (entry.key, entry.value))
        .collect();
    assert_eq!(
        pushed,
        HashMap::from([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ])
    );
    assert!(l1.borrow().has_value("a"));
    assert_eq!(l1.borrow().stats().flushes, 1);
}

#[test]
fn test_flush_cascades_one_layer_at_a_time() {
    let (builder, l3) = ChainBuilder::new().stack_shared(InMemoryLayer::new("l3"));
    let (builder, l2) = builder.stack_shared(InMemoryLayer::new("l2"));
    let head = builder.stack(InMemoryLayer::new("l1")).build();

    head.borrow_mut().put("k", Value::Bool(true));
    head.borrow_mut().flush().unwrap();
    assert!(l2.borrow().has_value("k"));
    assert!(!l3.borrow().has_value("k"));

    l2.borrow_mut().flush().unwrap();
    assert!(l3.borrow().has_value("k"));
}

// == Uninitialized Layers ==

#[test]
fn test_uninitialized_layer_fails_fast() {
    let mut layer = InMemoryLayer::new("alone");

    for result in [
        layer.get_boolean("k", false).map(|_| ()),
        layer.get_double("k", 0.0).map(|_| ()),
        layer.get_int("k", 0).map(|_| ()),
        layer.get_string("k", "").map(|_| ()),
        layer.remove("k").map(|_| ()),
        layer.flush(),
    ] {
        match result {
            Err(CacheError::Initialization { layer, .. }) => assert_eq!(layer, "alone"),
            other => panic!("expected initialization error, got {:?}", other),
        }
    }
}

// == Sink ==

#[test]
fn test_sink_absorbs_everything() {
    let sink: LayerRef = shared(SinkLayer::new());
    let mut sink = sink.borrow_mut();

    sink.put("k", Value::Int(1));
    sink.put_all(HashMap::from([("a".to_string(), Value::Int(1))]));
    sink.flush().unwrap();
    sink.remove("k").unwrap();
    sink.invalidate("k");
    sink.clear();

    assert_eq!(sink.get_int("k", 9).unwrap(), 9);
    assert_eq!(sink.entries().count(), 0);
}

// == File-Backed Layers ==

#[test]
fn test_properties_scenario() {
    let head = ChainBuilder::new()
        .stack(warmed_properties("test.boolean=true\ntest.double=1.5\n"))
        .build();
    let mut layer = head.borrow_mut();

    assert!(layer.get_boolean("test.boolean", false).unwrap());
    assert_eq!(layer.get_double("test.double", 0.0).unwrap(), 1.5);
    assert_eq!(layer.get_string("missing", "dflt").unwrap(), "dflt");
}

#[test]
fn test_file_layer_restarts() {
    let layer = warmed_properties("a=1\n# comment\nb=2\nnot a pair\n");

    let first: Vec<_> = layer.entries().collect();
    let second: Vec<_> = layer.entries().collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_memory_over_file_fills_from_file() {
    let (builder, props) = ChainBuilder::new().stack_shared(warmed_properties("timeout=30\n"));
    let (builder, memory) = builder.stack_shared(InMemoryLayer::new("memory"));
    let head = builder.build();

    assert_eq!(layer_names(&head), vec!["memory", "props", "sink"]);
    assert_eq!(head.borrow_mut().get_int("timeout", 0).unwrap(), 30);
    assert_eq!(memory.borrow().peek("timeout"), Some(&Value::from("30")));

    // the file layer does not take writes from a flush
    memory.borrow_mut().put("extra", Value::Int(1));
    memory.borrow_mut().flush().unwrap();
    assert!(!props.borrow().has_value("extra"));
}

#[test]
fn test_warm_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# settings").unwrap();
    writeln!(file, "name=config-chain").unwrap();
    file.flush().unwrap();

    let mut layer = PropertiesLayer::new("props").with_write_through(shared(SinkLayer::new()));
    layer.warm_from_path(file.path(), Encoding::Utf8).unwrap();

    assert_eq!(layer.get_string("name", "").unwrap(), "config-chain");
}

#[test]
fn test_json_file_layer() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"retries": 3, "ratio": 0.25, "tags": ["a", "b"]}}"#).unwrap();
    file.flush().unwrap();

    let mut layer = JsonLayer::new("json").with_write_through(shared(SinkLayer::new()));
    layer.warm_from_path(file.path(), Encoding::Utf8).unwrap();

    assert_eq!(layer.get_int("retries", 0).unwrap(), 3);
    assert_eq!(layer.get_double("ratio", 0.0).unwrap(), 0.25);
    assert_eq!(
        layer.lookup("tags").unwrap(),
        Some(Value::Object(serde_json::json!(["a", "b"])))
    );
}

#[test]
fn test_warm_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut layer = PropertiesLayer::new("props");

    let err = layer
        .warm_from_path(dir.path().join("absent.properties"), Encoding::Utf8)
        .unwrap_err();
    assert!(matches!(err, CacheError::Warming { .. }));
}

// == Config Space ==

#[test]
fn test_config_space_over_chain() {
    let head = ChainBuilder::new()
        .stack(warmed_properties("workers=4\nmode=fast\n"))
        .stack(InMemoryLayer::new("memory"))
        .build();
    let space = ConfigSpace::new(head);

    assert_eq!(space.require::<u32>("workers").unwrap(), 4);
    assert_eq!(space.get_or("threads", 1u32).unwrap(), 1);
    assert!(matches!(
        space.require::<u32>("threads"),
        Err(CacheError::MissingRequired(_))
    ));

    space.set("mode", "slow").unwrap();
    assert_eq!(space.require::<String>("mode").unwrap(), "slow");
}
