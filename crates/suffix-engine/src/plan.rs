//! JSON directive plans.
//!
//! A plan is an ordered list of the declarations a makefile would make:
//! suffixes, transformation rules, targets and paths. Applying it to a
//! session and a graph yields the state the resolver expects to run on.

use crate::{BuildGraph, EngineConfig, NodeId, SuffixError, SuffixSession};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub config: EngineConfig,
    #[serde(default)]
    pub directives: Vec<Directive>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "directive", rename_all = "snake_case")]
pub enum Directive {
    /// `.SUFFIXES:`; an empty list clears every suffix.
    Suffixes {
        #[serde(default)]
        names: Vec<String>,
    },
    Transform {
        name: String,
        #[serde(default)]
        commands: Vec<String>,
        #[serde(default)]
        sources: Vec<String>,
    },
    Target(TargetSpec),
    /// `.PATH<suffix>:`; no suffix extends the default path.
    Path {
        #[serde(default)]
        suffix: String,
        #[serde(default)]
        dirs: Vec<PathBuf>,
    },
    Include {
        suffix: String,
    },
    Library {
        suffix: String,
    },
    Null {
        suffix: String,
    },
    Main {
        name: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub phony: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub not_target: bool,
}

impl Plan {
    pub fn from_json(source: &str) -> Result<Self, SuffixError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, SuffixError> {
        let source = std::fs::read_to_string(path).map_err(|error| {
            SuffixError::Plan(format!("failed reading '{}': {error}", path.display()))
        })?;
        Self::from_json(&source)
    }

    /// Applies every directive in order, then finishes the search paths.
    /// Returns the main target.
    pub fn apply(
        &self,
        session: &mut SuffixSession,
        graph: &mut BuildGraph,
    ) -> Result<Option<NodeId>, SuffixError> {
        let mut main = None;

        for directive in &self.directives {
            match directive {
                Directive::Suffixes { names } if names.is_empty() => session.clear_suffixes(),
                Directive::Suffixes { names } => {
                    for name in names {
                        session.add_suffix(graph, name, &mut main);
                    }
                }
                Directive::Transform {
                    name,
                    commands,
                    sources,
                } => define_transform(session, name, commands, sources)?,
                Directive::Target(spec) if session.is_transform(&spec.name) => {
                    define_transform(session, &spec.name, &spec.commands, &spec.sources)?;
                }
                Directive::Target(spec) => {
                    let node = add_target(graph, spec);
                    if main.is_none() && !spec.not_target {
                        debug!(target = %spec.name, "setting main target");
                        main = Some(node);
                    }
                }
                Directive::Path { suffix, dirs } if suffix.is_empty() => {
                    let path = session.default_path_mut();
                    for dir in dirs {
                        path.add_dir(dir);
                    }
                }
                Directive::Path { suffix, dirs } => {
                    let path = session.get_path_mut(suffix).ok_or_else(|| {
                        SuffixError::Plan(format!("path for undeclared suffix '{suffix}'"))
                    })?;
                    for dir in dirs {
                        path.add_dir(dir);
                    }
                }
                Directive::Include { suffix } => session.add_include(suffix),
                Directive::Library { suffix } => session.add_lib(suffix),
                Directive::Null { suffix } => session.set_null(suffix),
                Directive::Main { name } => main = Some(graph.get_or_create(name)),
            }
        }

        session.do_paths();
        Ok(main)
    }
}

fn define_transform(
    session: &mut SuffixSession,
    name: &str,
    commands: &[String],
    sources: &[String],
) -> Result<(), SuffixError> {
    let rule = session.add_transform(name)?;
    for command in commands {
        session.add_transform_command(rule, command.as_str())?;
    }
    for source in sources {
        session.add_transform_source(rule, source.as_str())?;
    }
    session.end_transform(rule)
}

fn add_target(graph: &mut BuildGraph, spec: &TargetSpec) -> NodeId {
    let node = graph.get_or_create(&spec.name);
    let target = &mut graph[node];
    target.flags.depends = true;
    target.flags.phony |= spec.phony;
    target.flags.optional |= spec.optional;
    target.flags.not_target |= spec.not_target;
    target.commands.extend(spec.commands.iter().cloned());

    for source in &spec.sources {
        let child = graph.get_or_create(source);
        if !graph[node].children.contains(&child) {
            graph.add_child(node, child);
        }
    }
    node
}
