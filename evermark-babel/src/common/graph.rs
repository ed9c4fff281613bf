//! The note graph: notes as nodes, resolved internal links as edges.
//!
//! The graph is rebuilt on every run from the links each conversion reports. It answers
//! three questions for the front end:
//!
//! - which notes belong together (`clusters`, the weakly connected components, found with a
//!   union-find so large exports stay linear)
//! - where each cluster starts (`roots`, members nobody else links to)
//! - what a recursive conversion has to visit next (`Traversal`, a worklist with an explicit
//!   visited set, so cycles terminate)

use crate::ir::nodes::NoteId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Directed graph of notes. Edges only connect known notes.
#[derive(Debug, Clone, Default)]
pub struct NoteGraph {
    nodes: BTreeSet<NoteId>,
    edges: BTreeMap<NoteId, BTreeSet<NoteId>>,
}

/// A weakly connected group of notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub members: Vec<NoteId>,
    /// Members with no incoming links from other notes
    pub roots: Vec<NoteId>,
}

impl NoteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NoteId) {
        self.nodes.insert(id);
    }

    /// Add an edge. Returns `false` when either end is not a known note.
    pub fn add_edge(&mut self, from: &NoteId, to: &NoteId) -> bool {
        if !self.nodes.contains(from) || !self.nodes.contains(to) {
            return false;
        }
        self.edges.entry(from.clone()).or_default().insert(to.clone());
        true
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.nodes.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NoteId> {
        self.nodes.iter()
    }

    pub fn targets(&self, id: &NoteId) -> impl Iterator<Item = &NoteId> {
        self.edges.get(id).into_iter().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Incoming edges from other notes; self links do not count.
    pub fn in_degree(&self, id: &NoteId) -> usize {
        self.edges
            .iter()
            .filter(|(from, targets)| *from != id && targets.contains(id))
            .count()
    }

    /// Weakly connected components with more than one member, ordered by their first
    /// member.
    pub fn clusters(&self) -> Vec<Cluster> {
        let ids: Vec<&NoteId> = self.nodes.iter().collect();
        let position: BTreeMap<&NoteId, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut sets = DisjointSet::new(ids.len());
        for (from, targets) in &self.edges {
            for to in targets {
                if let (Some(&a), Some(&b)) = (position.get(from), position.get(to)) {
                    sets.union(a, b);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<NoteId>> = BTreeMap::new();
        for (i, id) in ids.iter().enumerate() {
            groups.entry(sets.find(i)).or_default().push((*id).clone());
        }

        let mut clusters: Vec<Cluster> = groups
            .into_values()
            .filter(|members| members.len() > 1)
            .map(|members| {
                let roots = members
                    .iter()
                    .filter(|id| self.in_degree(id) == 0)
                    .cloned()
                    .collect();
                Cluster { members, roots }
            })
            .collect();
        clusters.sort_by(|a, b| a.members.first().cmp(&b.members.first()));
        clusters
    }

    /// Every note reachable from `start` that is not yet in `visited`, in visiting order.
    /// `visited` is updated, so successive calls never repeat a note.
    pub fn traverse(&self, start: &NoteId, visited: &mut BTreeSet<NoteId>) -> Vec<NoteId> {
        let mut order = Vec::new();
        let mut traversal = Traversal::new(start.clone());
        std::mem::swap(&mut traversal.visited, visited);
        while let Some(id) = traversal.next() {
            let targets: Vec<NoteId> = self.targets(&id).cloned().collect();
            traversal.extend(targets);
            order.push(id);
        }
        std::mem::swap(&mut traversal.visited, visited);
        order
    }
}

/// Worklist for converting notes as they are discovered.
///
/// The front end pops a note, converts it, then feeds the notes it links to back in.
#[derive(Debug, Clone, Default)]
pub struct Traversal {
    pending: VecDeque<NoteId>,
    visited: BTreeSet<NoteId>,
}

impl Traversal {
    pub fn new(start: NoteId) -> Self {
        Self {
            pending: VecDeque::from([start]),
            visited: BTreeSet::new(),
        }
    }

    /// Queue notes; those already visited or queued are ignored.
    pub fn extend<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = NoteId>,
    {
        for id in ids {
            if !self.visited.contains(&id) && !self.pending.contains(&id) {
                self.pending.push_back(id);
            }
        }
    }

    pub fn visited(&self) -> &BTreeSet<NoteId> {
        &self.visited
    }
}

impl Iterator for Traversal {
    type Item = NoteId;

    fn next(&mut self) -> Option<NoteId> {
        while let Some(id) = self.pending.pop_front() {
            if self.visited.insert(id.clone()) {
                return Some(id);
            }
        }
        None
    }
}

/// Union-find over `0..n` with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
