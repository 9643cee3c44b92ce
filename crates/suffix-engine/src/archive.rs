use crate::{BuildGraph, LocalVar, NodeId, SuffixError, SuffixSession};
use std::sync::Arc;
use tracing::debug;

impl SuffixSession {
    /// Resolves an `archive(member)` target through its member.
    ///
    /// The member is resolved as a target of its own first. The archive then
    /// gets at most one transformation step, from the member's suffix to a
    /// suffix that ends the archive's name.
    pub(crate) fn find_deps_archive(
        &mut self,
        graph: &mut BuildGraph,
        node: NodeId,
        archive: &str,
        member: &str,
    ) -> Result<(), SuffixError> {
        let member_node = graph.get_or_create(member);
        self.find_deps(graph, member_node)?;
        graph.add_child(node, member_node);

        let prefix = graph[member_node]
            .vars
            .local(LocalVar::Prefix)
            .unwrap_or(member)
            .to_string();

        let vars = &mut graph[node].vars;
        vars.set(LocalVar::Prefix, prefix);
        vars.set(LocalVar::Member, member);
        vars.set(LocalVar::Archive, archive);
        vars.set(LocalVar::Target, archive);

        let children = graph[node].children.clone();
        let hooks = Arc::clone(&self.hooks);
        hooks.expand_children(graph, node, &children);

        let member_suffix = graph[member_node].suffix.unwrap_or(self.suffixes.null());
        let archive_suffix = self.suffixes[member_suffix]
            .parents
            .iter()
            .copied()
            .find(|parent| archive.ends_with(self.suffixes[*parent].name.as_str()));
        match archive_suffix {
            Some(archive_suffix) => {
                self.apply_transform(graph, node, member_node, archive_suffix, member_suffix);
            }
            None => debug!(archive, member, "no transformation into the archive"),
        }

        graph[node].flags.depends = true;
        graph[member_node].flags.member = true;
        Ok(())
    }

    /// A `-lname` target never searches the suffix graph; the library suffix
    /// only supplies the path the archive is looked for on.
    pub(crate) fn find_deps_library(&mut self, graph: &mut BuildGraph, node: NodeId) {
        let library_suffix = self.config.library_suffix.clone();
        match self.suffixes.find(&library_suffix) {
            Some(suffix) => {
                self.reassign_suffix(graph, node, Some(suffix));
                self.hooks.find_library(
                    graph,
                    node,
                    &self.suffixes[suffix],
                    self.lookup.as_ref(),
                );
            }
            None => {
                debug!(library = %graph[node].name, suffix = %library_suffix, "library suffix not declared");
                self.reassign_suffix(graph, node, None);
                let name = graph[node].name.clone();
                graph[node].vars.set(LocalVar::Target, name);
            }
        }
        graph[node].vars.set(LocalVar::Prefix, "");
    }
}
