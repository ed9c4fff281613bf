use crate::common::body_options;
use evermark_babel::{index_notes, ConvertedNote, Converter, Note, NoteGraph, NoteId, Traversal};
use std::collections::BTreeSet;

fn note(title: &str, links: &[&str]) -> Note {
    let anchors: String = links
        .iter()
        .map(|target| format!("<div><a href=\"{target}.html\">{target}</a></div>"))
        .collect();
    let html = format!("<html><body><h1>{title}</h1>{anchors}</body></html>");
    Note::parse(&format!("{title}.html"), &html).expect("Failed to parse note")
}

/// Convert from `start`, following resolved links the way a recursive export does.
fn convert_from(notes: &[Note], start: &str) -> Vec<ConvertedNote> {
    let index = index_notes(notes);
    let options = body_options();
    let converter = Converter::new(&options, &index);

    let mut converted = Vec::new();
    let mut traversal = Traversal::new(NoteId::from(start));
    while let Some(id) = traversal.next() {
        let note = notes.iter().find(|note| note.id == id).expect("known note");
        let result = converter.convert(note).expect("Failed to convert note");
        traversal.extend(result.linked_notes().into_iter().cloned());
        converted.push(result);
    }
    converted
}

fn ids(converted: &[ConvertedNote]) -> Vec<&str> {
    converted.iter().map(|note| note.id.as_str()).collect()
}

#[test]
fn test_recursive_conversion_terminates_on_cycles() {
    let notes = vec![
        note("A", &["B"]),
        note("B", &["C"]),
        note("C", &["A"]),
        note("D", &["A"]),
    ];
    let converted = convert_from(&notes, "A");
    assert_eq!(ids(&converted), vec!["A", "B", "C"]);
}

#[test]
fn test_recursive_conversion_is_breadth_first() {
    let notes = vec![
        note("Root", &["B", "A"]),
        note("A", &["Leaf"]),
        note("B", &["Leaf", "Missing"]),
        note("Leaf", &[]),
    ];
    let converted = convert_from(&notes, "Root");
    assert_eq!(ids(&converted), vec!["Root", "B", "A", "Leaf"]);
    assert_eq!(converted[2].unresolved_links().count(), 0);
    assert_eq!(converted[1].unresolved_links().count(), 1);
}

#[test]
fn test_traverse_shares_visited_set() {
    let mut graph = NoteGraph::new();
    for name in ["a", "b", "c", "d"] {
        graph.add_node(NoteId::from(name));
    }
    graph.add_edge(&NoteId::from("a"), &NoteId::from("b"));
    graph.add_edge(&NoteId::from("c"), &NoteId::from("b"));
    graph.add_edge(&NoteId::from("c"), &NoteId::from("d"));

    let mut visited = BTreeSet::new();
    let first = graph.traverse(&NoteId::from("a"), &mut visited);
    let second = graph.traverse(&NoteId::from("c"), &mut visited);
    assert_eq!(first, vec![NoteId::from("a"), NoteId::from("b")]);
    assert_eq!(second, vec![NoteId::from("c"), NoteId::from("d")]);
}
