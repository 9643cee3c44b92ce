use crate::{
    BuildGraph, Dispatch, LocalVar, NodeId, Resolution, SearchPath, SuffixError, SuffixSession,
    TargetKind,
};
use tracing::debug;

impl SuffixSession {
    /// Finds the implicit sources of `node` and binds them into the graph.
    ///
    /// A node is resolved at most once; later calls return immediately.
    pub fn find_deps(&mut self, graph: &mut BuildGraph, node: NodeId) -> Result<(), SuffixError> {
        let Some(target) = graph.get_mut(node) else {
            return Err(SuffixError::UnknownNode(node));
        };
        if target.is_resolved() {
            return Ok(());
        }

        let dispatch = Dispatch::from(&target.kind);
        target.resolution = Resolution::Resolved(dispatch);
        let target_var = target.path_or_name().to_string();
        let prefix = target.name.clone();
        target.vars.set(LocalVar::Target, target_var);
        target.vars.set(LocalVar::Prefix, prefix);
        debug!(target = %target.name, ?dispatch, "finding implicit sources");

        match target.kind.clone() {
            TargetKind::Archive { archive, member } => {
                self.find_deps_archive(graph, node, &archive, &member)
            }
            TargetKind::Library { .. } => {
                self.find_deps_library(graph, node);
                Ok(())
            }
            TargetKind::Regular => self.find_deps_regular(graph, node),
        }
    }

    /// The directories a node's file should be looked for in.
    pub fn find_path(&self, graph: &BuildGraph, node: NodeId) -> &SearchPath {
        if let Some(suffix) = graph.get(node).and_then(|node| node.suffix) {
            return &self.suffixes[suffix].search_path;
        }
        let matched = graph
            .get(node)
            .and_then(|node| self.suffixes.matching(&node.name).next())
            .map(|(suffix, _)| suffix);
        match matched {
            Some(suffix) => &self.suffixes[suffix].search_path,
            None => &self.default_path,
        }
    }
}
