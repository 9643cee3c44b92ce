//! Breadth-first search for an implicit source.
//!
//! Every suffix that ends a target's name seeds a root candidate. Expanding a
//! candidate enqueues one child per suffix that transforms into the
//! candidate's suffix, named `prefix + child suffix`. The first candidate that
//! names an existing graph node or file wins, so shorter chains are always
//! preferred and equal-length chains fall back to suffix registration order.
//!
//! All candidates of one search live in a [`CandidateSet`] and are dropped
//! together when the resolution call returns.

use crate::{BuildGraph, FileLookup, NodeId, SuffixId, SuffixRegistry};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::{Index, IndexMut};
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CandidateId(usize);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub file: String,
    pub prefix: String,
    pub suffix: SuffixId,
    /// The candidate this one would be transformed into.
    pub parent: Option<CandidateId>,
    pub node: Option<NodeId>,
    /// Number of candidates derived from this one.
    pub children: usize,
    pub depth: usize,
}

#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    /// Filename to the first candidate offered under it.
    seen: HashMap<String, CandidateId>,
    cycle: Option<Vec<String>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The filenames of the first suffix cycle met while expanding, root first.
    pub fn cycle(&self) -> Option<&[String]> {
        self.cycle.as_deref()
    }

    pub fn root(
        &mut self,
        file: String,
        prefix: String,
        suffix: SuffixId,
        node: Option<NodeId>,
    ) -> CandidateId {
        let id = CandidateId(self.candidates.len());
        self.seen.entry(file.clone()).or_insert(id);
        self.push(Candidate {
            file,
            prefix,
            suffix,
            parent: None,
            node,
            children: 0,
            depth: 0,
        })
    }

    /// Hangs a candidate under `parent` without consulting the seen-set.
    pub fn attach(
        &mut self,
        file: String,
        prefix: String,
        suffix: SuffixId,
        parent: CandidateId,
        node: Option<NodeId>,
    ) -> CandidateId {
        let depth = self[parent].depth + 1;
        self[parent].children += 1;
        self.push(Candidate {
            file,
            prefix,
            suffix,
            parent: Some(parent),
            node,
            children: 0,
            depth,
        })
    }

    pub fn bind(&mut self, id: CandidateId, node: NodeId) {
        self[id].node = Some(node);
    }

    pub fn root_of(&self, mut id: CandidateId) -> CandidateId {
        while let Some(parent) = self[id].parent {
            id = parent;
        }
        id
    }

    /// Candidates from `id` up to its root, inclusive.
    pub fn ancestry(&self, id: CandidateId) -> Vec<CandidateId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self[current].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn push(&mut self, candidate: Candidate) -> CandidateId {
        let id = CandidateId(self.candidates.len());
        self.candidates.push(candidate);
        id
    }

    /// Enqueues a candidate for every suffix that transforms into `parent`'s.
    pub fn expand(
        &mut self,
        suffixes: &SuffixRegistry,
        parent: CandidateId,
        frontier: &mut VecDeque<CandidateId>,
    ) {
        let prefix = self[parent].prefix.clone();
        let suffix = self[parent].suffix;
        for &child in &suffixes[suffix].children {
            let child_suffix = &suffixes[child];
            if child_suffix.flags.null && !child_suffix.name.is_empty() {
                self.offer(suffixes, prefix.clone(), &prefix, child, parent, frontier);
            }
            self.offer(
                suffixes,
                format!("{prefix}{}", child_suffix.name),
                &prefix,
                child,
                parent,
                frontier,
            );
        }
    }

    fn offer(
        &mut self,
        suffixes: &SuffixRegistry,
        file: String,
        prefix: &str,
        suffix: SuffixId,
        parent: CandidateId,
        frontier: &mut VecDeque<CandidateId>,
    ) {
        if let Some(&earlier) = self.seen.get(&file) {
            trace!(file = %file, "skipping duplicate candidate");
            if self.cycle.is_none()
                && self[earlier].suffix == suffix
                && loops_back(suffixes, suffix, self[parent].suffix)
            {
                let mut chain: Vec<String> = self
                    .ancestry(parent)
                    .into_iter()
                    .rev()
                    .map(|id| self[id].file.clone())
                    .collect();
                chain.push(file);
                self.cycle = Some(chain);
            }
            return;
        }

        let id = self.attach(file.clone(), prefix.to_string(), suffix, parent, None);
        self.seen.insert(file, id);
        frontier.push_back(id);
    }

    /// Runs the search to the first existing candidate.
    ///
    /// A candidate exists if the graph already has a node of that name or
    /// the file is found on its suffix's search path.
    pub fn search(
        &mut self,
        suffixes: &SuffixRegistry,
        graph: &BuildGraph,
        lookup: &dyn FileLookup,
        mut frontier: VecDeque<CandidateId>,
    ) -> Option<CandidateId> {
        while let Some(id) = frontier.pop_front() {
            let candidate = &self[id];
            if graph.find(&candidate.file).is_some() {
                debug!(file = %candidate.file, "trying candidate... got it (graph node)");
                return Some(id);
            }
            if lookup
                .find_file(&candidate.file, &suffixes[candidate.suffix].search_path)
                .is_some()
            {
                debug!(file = %candidate.file, "trying candidate... got it (file)");
                return Some(id);
            }
            debug!(file = %candidate.file, "trying candidate... not there");
            self.expand(suffixes, id, &mut frontier);
        }
        None
    }
}

/// Whether `to` is `from` or can be made into it, following `children` edges.
fn loops_back(suffixes: &SuffixRegistry, from: SuffixId, to: SuffixId) -> bool {
    let mut visited = HashSet::new();
    let mut pending = vec![from];
    while let Some(suffix) = pending.pop() {
        if suffix == to {
            return true;
        }
        if visited.insert(suffix) {
            pending.extend(suffixes[suffix].children.iter().copied());
        }
    }
    false
}

impl Index<CandidateId> for CandidateSet {
    type Output = Candidate;

    fn index(&self, id: CandidateId) -> &Candidate {
        &self.candidates[id.0]
    }
}

impl IndexMut<CandidateId> for CandidateSet {
    fn index_mut(&mut self, id: CandidateId) -> &mut Candidate {
        &mut self.candidates[id.0]
    }
}
