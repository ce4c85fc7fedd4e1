// The sample programs under tests/samples, run end to end

mod common;

use common::{compiled, Event, Recorder};
use std::fs;
use std::path::Path;

fn sample(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/samples")
        .join(name);
    fs::read_to_string(path).expect("Failed to read sample file")
}

#[test]
fn test_quicksort_sorts_and_highlights() {
    let mut interpreter = compiled(&sample("quicksort.c"));
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));

    assert_eq!(interpreter.run().expect("Execution failed"), Some(1));

    let events = recorder.events();
    let base = events
        .iter()
        .find_map(|e| match e {
            Event::Array {
                address,
                length: 20,
                ..
            } => Some(*address),
            _ => None,
        })
        .expect("v was not registered");

    let highlights: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::Highlight(..)))
        .collect();
    let clears = events
        .iter()
        .filter(|e| matches!(e, Event::ClearHighlight(_)))
        .count();
    assert!(!highlights.is_empty());
    assert_eq!(highlights.len(), clears);

    // The first partition pivots on the last element of the whole array
    assert_eq!(
        highlights[0],
        &Event::Highlight(base, 19, Some("#87a832".to_string()))
    );
    assert!(events
        .iter()
        .all(|e| !matches!(e, Event::ClearHighlight(a) if *a != base)));

    assert_eq!(interpreter.memory().live_regions(), 0);
}

#[test]
fn test_binary_tree_leaks_every_node() {
    let mut interpreter = compiled(&sample("bin_tree.c"));
    let recorder = Recorder::default();
    interpreter.set_visualizer(Box::new(recorder.clone()));

    assert_eq!(interpreter.run().expect("Execution failed"), Some(49));

    let instances: Vec<_> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::StructInstance(name, address) => Some((name, address)),
            _ => None,
        })
        .collect();
    assert_eq!(instances.len(), 5);
    assert!(instances.iter().all(|(name, _)| name == "Node"));

    let mut leaked: Vec<_> = interpreter.heap_blocks().collect();
    leaked.sort_unstable();
    let mut allocated: Vec<_> = instances.iter().map(|(_, a)| *a).collect();
    allocated.sort_unstable();
    assert_eq!(leaked, allocated);

    for address in leaked {
        assert_eq!(interpreter.memory().region_size(address), Some(12));
    }
}

#[test]
fn test_list_delete_leaks_one_node() {
    let mut interpreter = compiled(&sample("list.c"));
    assert_eq!(interpreter.run().expect("Execution failed"), Some(13));

    // delete(2) unlinks the node without freeing it
    assert_eq!(interpreter.heap_blocks().count(), 3);
    assert_eq!(interpreter.memory().live_regions(), 3);

    interpreter.reset();
    assert_eq!(interpreter.memory().live_regions(), 0);
}
