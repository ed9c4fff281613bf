use crate::common::{body_options, convert_corpus};
use evermark_babel::{build_graph, NoteId};

fn note(title: &str, body: &str) -> String {
    format!("<html><body><h1>{title}</h1>{body}</body></html>")
}

fn ids(names: &[&str]) -> Vec<NoteId> {
    names.iter().map(|name| NoteId::from(*name)).collect()
}

#[test]
fn test_cycle_has_no_root() {
    let a = note("A", "<div><a href=\"B.html\">B</a></div>");
    let b = note("B", "<div><a href=\"C.html\">C</a></div>");
    let c = note("C", "<div><a href=\"A.html\">A</a></div>");
    let converted = convert_corpus(
        &[("A.html", &a), ("B.html", &b), ("C.html", &c)],
        &body_options(),
    );

    let clusters = build_graph(&converted).clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members, ids(&["A", "B", "C"]));
    assert!(clusters[0].roots.is_empty());
}

#[test]
fn test_chain_root_and_isolated_notes() {
    let e = note("E", "<div>Next: <a href=\"F.html\">F</a></div>");
    let f = note("F", "<div>Last one</div>");
    let lonely = note("Lonely", "<div>Links to <a href=\"Lonely.html\">itself</a></div>");
    let converted = convert_corpus(
        &[("E.html", &e), ("F.html", &f), ("Lonely.html", &lonely)],
        &body_options(),
    );

    let graph = build_graph(&converted);
    let clusters = graph.clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members, ids(&["E", "F"]));
    assert_eq!(clusters[0].roots, ids(&["E"]));
    assert_eq!(graph.in_degree(&NoteId::from("Lonely")), 0);
}

#[test]
fn test_unresolved_links_add_no_edges() {
    let a = note("A", "<div><a href=\"Missing.html\">gone</a></div>");
    let b = note("B", "<div>Nothing here</div>");
    let converted = convert_corpus(&[("A.html", &a), ("B.html", &b)], &body_options());

    let graph = build_graph(&converted);
    assert_eq!(graph.edge_count(), 0);
    assert!(graph.clusters().is_empty());
    assert_eq!(converted[0].unresolved_links().count(), 1);
}
