use crate::{BuildGraph, FileLookup, LocalVar, NodeId, Suffix, TargetKind, TransformRule};

/// Collaborators the resolver calls into while binding implicit sources.
///
/// The defaults cover rule application and library lookup; child expansion
/// belongs to the variable and wildcard engine and is a no-op here.
pub trait ResolveHooks: Send + Sync {
    /// Merges a transformation rule's recipe and static sources into `target`.
    fn apply_rule(&self, graph: &mut BuildGraph, rule: &TransformRule, target: NodeId) {
        apply_rule_as_use(graph, rule, target);
    }

    /// Expands variables and wildcards in `children`, newly acquired by `parent`.
    fn expand_children(&self, _graph: &mut BuildGraph, _parent: NodeId, _children: &[NodeId]) {}

    /// Locates the archive for a `-lname` target on the library suffix's path.
    fn find_library(
        &self,
        graph: &mut BuildGraph,
        node: NodeId,
        suffix: &Suffix,
        lookup: &dyn FileLookup,
    ) {
        find_library_archive(graph, node, suffix, lookup);
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardHooks;

impl ResolveHooks for StandardHooks {}

/// Commands are copied only onto a target that has none yet; static sources
/// always become children.
pub fn apply_rule_as_use(graph: &mut BuildGraph, rule: &TransformRule, target: NodeId) {
    let node = &mut graph[target];
    if node.commands.is_empty() {
        node.commands.extend(rule.commands.iter().cloned());
    }

    for source in &rule.children {
        let child = graph.get_or_create(source);
        graph.add_child(target, child);
    }
}

/// Looks for `lib<name><suffix>` and records where it was found.
pub fn find_library_archive(
    graph: &mut BuildGraph,
    node: NodeId,
    suffix: &Suffix,
    lookup: &dyn FileLookup,
) {
    let library = match &graph[node].kind {
        TargetKind::Library { name } => name.clone(),
        _ => graph[node].name.clone(),
    };
    let file = format!("lib{library}{}", suffix.name);
    let found = lookup.find_file(&file, &suffix.search_path);

    let node = &mut graph[node];
    node.path = found;
    let target = node.path_or_name().to_string();
    node.vars.set(LocalVar::Target, target);
}
