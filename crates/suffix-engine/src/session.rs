use crate::{
    BuildGraph, Diagnostic, DiskLookup, EngineConfig, FileLookup, NodeId, ResolveHooks, RuleId,
    SearchPath, Severity, StandardHooks, SuffixError, SuffixId, SuffixRegistry, TransformRegistry,
    parse_transform,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Everything the suffix engine knows during one run: the suffix graph, the
/// transformation rules, the default search path and the diagnostic log.
pub struct SuffixSession {
    pub(crate) config: EngineConfig,
    pub(crate) suffixes: SuffixRegistry,
    pub(crate) transforms: TransformRegistry,
    pub(crate) default_path: SearchPath,
    pub(crate) globals: BTreeMap<String, String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) lookup: Arc<dyn FileLookup>,
    pub(crate) hooks: Arc<dyn ResolveHooks>,
}

impl SuffixSession {
    pub fn new(config: EngineConfig) -> Self {
        let default_path = SearchPath::from_dirs(config.default_path.iter().cloned());
        Self {
            suffixes: SuffixRegistry::new(&default_path),
            transforms: TransformRegistry::new(),
            default_path,
            globals: BTreeMap::new(),
            diagnostics: Vec::new(),
            lookup: Arc::new(DiskLookup::default()),
            hooks: Arc::new(StandardHooks),
            config,
        }
    }

    pub fn with_lookup(mut self, lookup: Arc<dyn FileLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ResolveHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Drops all suffixes, rules, globals and diagnostics, returning the
    /// session to its freshly initialized state.
    pub fn end(&mut self) {
        self.default_path = SearchPath::from_dirs(self.config.default_path.iter().cloned());
        self.suffixes = SuffixRegistry::new(&self.default_path);
        self.transforms = TransformRegistry::new();
        self.globals.clear();
        self.diagnostics.clear();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn suffixes(&self) -> &SuffixRegistry {
        &self.suffixes
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    pub fn default_path(&self) -> &SearchPath {
        &self.default_path
    }

    pub fn default_path_mut(&mut self) -> &mut SearchPath {
        &mut self.default_path
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.globals.get(name).map(String::as_str)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Fatal => error!(code = %diagnostic.code, "{}", diagnostic.message),
            Severity::Warning => warn!(code = %diagnostic.code, "{}", diagnostic.message),
            Severity::Info => info!(code = %diagnostic.code, "{}", diagnostic.message),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Empties the active suffix list. Rules are kept so their edges come
    /// back once the suffixes are declared again.
    pub fn clear_suffixes(&mut self) {
        info!("clearing all suffixes");
        self.suffixes.clear(&self.default_path);
    }

    pub fn is_transform(&self, name: &str) -> bool {
        parse_transform(&self.suffixes, name).is_some()
    }

    pub fn add_transform(&mut self, name: &str) -> Result<RuleId, SuffixError> {
        let (source, target) = parse_transform(&self.suffixes, name)
            .ok_or_else(|| SuffixError::MalformedTransform(name.to_string()))?;

        let (rule, redefined) = self.transforms.define(name);
        if redefined {
            self.report(
                Diagnostic::new(
                    "transform_redefined",
                    Severity::Info,
                    format!("transformation {name} redefined; previous commands dropped"),
                )
                .with_target(name),
            );
        }

        debug!(
            "defining transformation from `{}' to `{}'",
            self.suffixes[source].name, self.suffixes[target].name
        );
        self.suffixes.relate(source, target);
        Ok(rule)
    }

    pub fn add_transform_command(
        &mut self,
        rule: RuleId,
        command: impl Into<String>,
    ) -> Result<(), SuffixError> {
        let rule = self
            .transforms
            .get_mut(rule)
            .ok_or(SuffixError::UnknownRule(rule))?;
        rule.commands.push(command.into());
        Ok(())
    }

    pub fn add_transform_source(
        &mut self,
        rule: RuleId,
        source: impl Into<String>,
    ) -> Result<(), SuffixError> {
        let rule = self
            .transforms
            .get_mut(rule)
            .ok_or(SuffixError::UnknownRule(rule))?;
        rule.children.push(source.into());
        Ok(())
    }

    /// Called once a rule's definition is complete. A rule left without
    /// commands or sources does not transform anything, so its edge is
    /// removed again.
    pub fn end_transform(&mut self, rule: RuleId) -> Result<(), SuffixError> {
        let rule = self
            .transforms
            .get(rule)
            .ok_or(SuffixError::UnknownRule(rule))?;
        if !rule.is_empty() {
            debug!("transformation {} complete", rule.name);
            return Ok(());
        }

        let Some((source, target)) = parse_transform(&self.suffixes, &rule.name) else {
            return Ok(());
        };
        debug!(
            "deleting incomplete transformation from `{}' to `{}'",
            self.suffixes[source].name, self.suffixes[target].name
        );
        self.suffixes.unrelate(source, target);
        Ok(())
    }

    /// Declares a suffix. Existing targets whose names now read as
    /// transformations become rules, and stored rules are re-linked.
    pub fn add_suffix(&mut self, graph: &mut BuildGraph, name: &str, main: &mut Option<NodeId>) {
        if name.is_empty() {
            return;
        }
        let (suffix, created) = self.suffixes.insert(name);
        if !created {
            return;
        }
        info!(suffix = name, "adding suffix");

        self.convert_targets(graph, suffix, main);

        let rules: Vec<String> = self
            .transforms
            .iter()
            .map(|(_, rule)| rule.name.clone())
            .collect();
        for rule in &rules {
            self.rebuild_edges(rule, suffix);
        }
    }

    fn convert_targets(&mut self, graph: &mut BuildGraph, suffix: SuffixId, main: &mut Option<NodeId>) {
        let mut removed_main = false;
        let ids: Vec<NodeId> = graph.ids().collect();

        for id in ids {
            let node = &graph[id];
            if main.is_none() && removed_main && !node.flags.not_target && !node.flags.transform {
                debug!("setting main node to \"{}\"", node.name);
                *main = Some(id);
                return;
            }
            if node.flags.transform {
                continue;
            }
            match node.name.find(self.suffixes[suffix].name.as_str()) {
                None | Some(0) => continue,
                Some(_) => {}
            }
            let Some((source, target)) = parse_transform(&self.suffixes, &node.name) else {
                continue;
            };

            if *main == Some(id) {
                debug!("setting main node from \"{}\" back to null", node.name);
                *main = None;
                removed_main = true;
            }

            let children = std::mem::take(&mut graph[id].children);
            for child in children {
                graph[child].parents.retain(|parent| *parent != id);
            }
            let node = &mut graph[id];
            node.unmade = 0;
            node.flags.transform = true;
            let commands = node.commands.clone();
            let (rule, _) = self.transforms.define(&node.name);
            if let Some(rule) = self.transforms.get_mut(rule) {
                rule.commands = commands;
            }

            debug!(
                "defining transformation from `{}' to `{}'",
                self.suffixes[source].name, self.suffixes[target].name
            );
            self.suffixes.relate(source, target);
        }
    }

    fn rebuild_edges(&mut self, rule: &str, suffix: SuffixId) {
        let name = self.suffixes[suffix].name.clone();

        if let Some(rest) = rule.strip_prefix(name.as_str()) {
            let target = if rest.is_empty() {
                Some(self.suffixes.null())
            } else {
                self.suffixes.find(rest)
            };
            if let Some(target) = target {
                self.suffixes.relate(suffix, target);
                return;
            }
        }

        if let Some(source) = rule
            .strip_suffix(name.as_str())
            .and_then(|rest| self.suffixes.find(rest))
        {
            self.suffixes.relate(source, suffix);
        }
    }

    pub fn get_path(&self, name: &str) -> Option<&SearchPath> {
        let suffix = self.suffixes.find(name)?;
        Some(&self.suffixes[suffix].search_path)
    }

    pub fn get_path_mut(&mut self, name: &str) -> Option<&mut SearchPath> {
        let suffix = self.suffixes.find(name)?;
        Some(&mut self.suffixes[suffix].search_path)
    }

    /// Finishes every suffix path with the default path and publishes the
    /// include and library directories as flag variables.
    pub fn do_paths(&mut self) {
        let mut includes = SearchPath::new();
        let mut libs = SearchPath::new();

        for id in self.suffixes.active().to_vec() {
            let suffix = &mut self.suffixes[id];
            if suffix.search_path.is_empty() {
                suffix.search_path = self.default_path.clone();
                continue;
            }
            if suffix.flags.include {
                includes.add_all(&suffix.search_path);
            }
            if suffix.flags.library {
                libs.add_all(&suffix.search_path);
            }
            suffix.search_path.add_all(&self.default_path);
        }

        self.globals.insert(
            self.config.includes_var.clone(),
            includes.to_flags(&self.config.include_flag),
        );
        self.globals.insert(
            self.config.libs_var.clone(),
            libs.to_flags(&self.config.library_flag),
        );
    }

    pub fn add_include(&mut self, name: &str) {
        if let Some(suffix) = self.suffixes.find(name) {
            self.suffixes[suffix].flags.include = true;
        }
    }

    pub fn add_lib(&mut self, name: &str) {
        if let Some(suffix) = self.suffixes.find(name) {
            self.suffixes[suffix].flags.library = true;
        }
    }

    pub fn set_null(&mut self, name: &str) {
        match self.suffixes.find(name) {
            Some(suffix) => self.suffixes.set_null(suffix),
            None => self.report(
                Diagnostic::new(
                    "null_suffix_undefined",
                    Severity::Warning,
                    format!("Desired null suffix {name} not defined."),
                )
                .with_suffix(name),
            ),
        }
    }

    /// Points `node` at `suffix`, moving one reference between holders.
    pub(crate) fn reassign_suffix(
        &mut self,
        graph: &mut BuildGraph,
        node: NodeId,
        suffix: Option<SuffixId>,
    ) {
        let previous = graph[node].suffix;
        if previous == suffix {
            return;
        }
        if let Some(previous) = previous {
            self.suffixes.release(previous);
        }
        if let Some(suffix) = suffix {
            self.suffixes.add_ref(suffix);
        }
        graph[node].suffix = suffix;
    }
}

impl Default for SuffixSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
