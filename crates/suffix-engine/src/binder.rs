use crate::{
    BuildGraph, CandidateId, CandidateSet, Diagnostic, Dispatch, LocalVar, NodeId, Resolution,
    Severity, SuffixError, SuffixId, SuffixSession,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

pub(crate) fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

impl SuffixSession {
    pub(crate) fn find_deps_regular(
        &mut self,
        graph: &mut BuildGraph,
        node: NodeId,
    ) -> Result<(), SuffixError> {
        let name = graph[node].name.clone();
        let mut set = CandidateSet::new();
        let mut roots = Vec::new();
        let mut bottom = None;

        // A phony target has no file to derive, so it gets no search.
        if !graph[node].flags.phony {
            let mut frontier = VecDeque::new();
            let matches: Vec<(SuffixId, String)> = self
                .suffixes
                .matching(&name)
                .map(|(suffix, prefix)| (suffix, prefix.to_string()))
                .collect();
            for (suffix, prefix) in matches {
                let root = set.root(name.clone(), prefix, suffix, Some(node));
                set.expand(&self.suffixes, root, &mut frontier);
                roots.push(root);
            }

            if roots.is_empty() {
                let root = set.root(name.clone(), name.clone(), self.suffixes.null(), Some(node));
                if graph[node].commands.is_empty() {
                    debug!(target = %name, "adding suffix rules");
                    set.expand(&self.suffixes, root, &mut frontier);
                } else {
                    debug!(target = %name, "not adding suffix rules");
                }
                roots.push(root);
            }

            bottom = set.search(&self.suffixes, graph, self.lookup.as_ref(), frontier);
        }

        if bottom.is_none() {
            if let Some(chain) = set.cycle() {
                let chain = chain.to_vec();
                self.report(
                    Diagnostic::new(
                        "suffix_cycle",
                        Severity::Fatal,
                        format!(
                            "transformation rules form a cycle: {}",
                            chain.join(" -> ")
                        ),
                    )
                    .with_target(name.clone()),
                );
                return Err(SuffixError::SuffixCycle {
                    target: name,
                    chain,
                });
            }
        }

        let root = match bottom {
            Some(bottom) => Some(set.root_of(bottom)),
            None => roots.first().copied(),
        };

        let target_var = graph[node].path_or_name().to_string();
        let prefix = root.map_or_else(|| name.clone(), |root| set[root].prefix.clone());
        let vars = &mut graph[node].vars;
        vars.set(LocalVar::Target, target_var);
        vars.set(LocalVar::Prefix, prefix);

        let hooks = Arc::clone(&self.hooks);
        let children = graph[node].children.clone();
        if !children.is_empty() {
            hooks.expand_children(graph, node, &children);
        }

        let Some(root) = root else {
            debug!(target = %name, "no valid suffix");
            self.bind_search_path(graph, node, None);
            return Ok(());
        };

        if self.suffixes[set[root].suffix].flags.library {
            graph[node].flags.library = true;
        }

        if !graph[node].children.is_empty() {
            if let Some(source) = self.find_explicit_source(graph, &mut set, root) {
                bottom = Some(source);
            }
        }

        match bottom {
            Some(bottom) => {
                self.bind_chain(graph, &mut set, node, bottom);
            }
            None => {
                debug!(target = %name, "no implicit source");
                self.bind_search_path(graph, node, Some(set[root].suffix));
            }
        }
        Ok(())
    }

    /// An explicit source of the target that a single rule turns into the
    /// target's suffix overrides whatever the search found.
    fn find_explicit_source(
        &self,
        graph: &BuildGraph,
        set: &mut CandidateSet,
        root: CandidateId,
    ) -> Option<CandidateId> {
        let target = set[root].node?;
        let prefix = set[root].prefix.clone();
        let target_suffix = set[root].suffix;
        let no_commands = graph[target].commands.is_empty();

        for &child in &graph[target].children {
            let source = &graph[child];
            // Optional sources may not exist yet.
            if source.flags.optional && no_commands {
                continue;
            }
            let Some(rest) = basename(&source.name).strip_prefix(prefix.as_str()) else {
                continue;
            };
            let Some(suffix) = self.suffixes.find(rest) else {
                continue;
            };
            if self.suffixes[suffix].parents.contains(&target_suffix) {
                debug!(source = %source.name, "using existing source");
                return Some(set.attach(
                    source.name.clone(),
                    prefix,
                    suffix,
                    root,
                    Some(child),
                ));
            }
        }
        None
    }

    /// Links every candidate from `bottom` up to the target and applies the
    /// rule for each step.
    fn bind_chain(
        &mut self,
        graph: &mut BuildGraph,
        set: &mut CandidateSet,
        target: NodeId,
        bottom: CandidateId,
    ) {
        let mut source = bottom;
        let mut source_node = match set[bottom].node {
            Some(node) => node,
            None => {
                let node = graph.get_or_create(&set[bottom].file);
                set.bind(bottom, node);
                node
            }
        };

        while let Some(parent) = set[source].parent {
            self.reassign_suffix(graph, source_node, Some(set[source].suffix));

            let parent_node = match set[parent].node {
                Some(node) => node,
                None => {
                    let node = graph.get_or_create(&set[parent].file);
                    set.bind(parent, node);
                    node
                }
            };
            self.apply_transform(
                graph,
                parent_node,
                source_node,
                set[parent].suffix,
                set[source].suffix,
            );

            // Nodes between the source and the target already know their
            // implicit source.
            if parent_node != target {
                let node = &mut graph[parent_node];
                node.resolution = Resolution::Resolved(Dispatch::Regular);
                node.vars.set(LocalVar::Prefix, set[parent].prefix.clone());
                let name = node.name.clone();
                node.vars.set(LocalVar::Target, name);
            }

            source = parent;
            source_node = parent_node;
        }

        self.reassign_suffix(graph, target, Some(set[source].suffix));
    }

    /// Makes `source` a child of `target` and applies the rule from
    /// `source_suffix` to `target_suffix`. Returns false when no such rule
    /// is defined; the edge is kept either way.
    pub(crate) fn apply_transform(
        &mut self,
        graph: &mut BuildGraph,
        target: NodeId,
        source: NodeId,
        target_suffix: SuffixId,
        source_suffix: SuffixId,
    ) -> bool {
        if !graph[target].children.contains(&source) {
            graph.add_child(target, source);
        }

        let rule_name = format!(
            "{}{}",
            self.suffixes[source_suffix].name, self.suffixes[target_suffix].name
        );
        let Some(rule) = self.transforms.find(&rule_name) else {
            let message = format!(
                "no transformation rule {rule_name} to make '{}' from '{}'",
                graph[target].name, graph[source].name
            );
            self.report(
                Diagnostic::new("missing_transform", Severity::Warning, message)
                    .with_target(graph[target].name.clone())
                    .with_suffix(self.suffixes[source_suffix].name.clone()),
            );
            return false;
        };

        debug!(
            "applying {} -> {} to \"{}\"",
            self.suffixes[source_suffix].name, self.suffixes[target_suffix].name, graph[target].name
        );

        let first_new = graph[target].children.len();
        let hooks = Arc::clone(&self.hooks);
        hooks.apply_rule(graph, &self.transforms[rule], target);
        let acquired = graph[target].children[first_new..].to_vec();
        if !acquired.is_empty() {
            hooks.expand_children(graph, target, &acquired);
        }

        graph[source].implicit_parents.push(target);
        true
    }

    /// Falls back to locating the target itself, on its suffix's path or
    /// the default path.
    fn bind_search_path(&mut self, graph: &mut BuildGraph, node: NodeId, suffix: Option<SuffixId>) {
        if graph[node].flags.phony {
            return;
        }
        let path = match suffix {
            Some(suffix) => &self.suffixes[suffix].search_path,
            None => &self.default_path,
        };
        let found = self.lookup.find_file(&graph[node].name, path);
        graph[node].path = found.clone();
        let Some(found) = found else {
            return;
        };

        self.reassign_suffix(graph, node, suffix);
        let stem = match suffix {
            Some(suffix) => found
                .strip_suffix(self.suffixes[suffix].name.as_str())
                .unwrap_or(&found),
            None => &found,
        };
        let prefix = basename(stem).to_string();

        let vars = &mut graph[node].vars;
        vars.set(LocalVar::Target, found.clone());
        vars.set(LocalVar::Prefix, prefix);
    }
}
