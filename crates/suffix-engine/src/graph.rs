use crate::SuffixId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-target variables the suffix engine maintains for recipes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocalVar {
    Target,
    Prefix,
    Archive,
    Member,
    ImpSrc,
    AllSrc,
    OoDate,
}

impl LocalVar {
    pub const ALL: [LocalVar; 7] = [
        LocalVar::Target,
        LocalVar::Prefix,
        LocalVar::Archive,
        LocalVar::Member,
        LocalVar::ImpSrc,
        LocalVar::AllSrc,
        LocalVar::OoDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Target => "@",
            Self::Prefix => "*",
            Self::Archive => "!",
            Self::Member => "%",
            Self::ImpSrc => "<",
            Self::AllSrc => ">",
            Self::OoDate => "?",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            Self::Target => ".TARGET",
            Self::Prefix => ".PREFIX",
            Self::Archive => ".ARCHIVE",
            Self::Member => ".MEMBER",
            Self::ImpSrc => ".IMPSRC",
            Self::AllSrc => ".ALLSRC",
            Self::OoDate => ".OODATE",
        }
    }

    /// Accepts the one-character name, the dotted long name, or `^`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "^" {
            return Some(Self::AllSrc);
        }
        Self::ALL
            .into_iter()
            .find(|var| var.name() == name || var.long_name() == name)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVars {
    values: BTreeMap<String, String>,
}

impl LocalVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn set(&mut self, var: LocalVar, value: impl Into<String>) {
        self.values.insert(var.name().to_string(), value.into());
    }

    pub fn local(&self, var: LocalVar) -> Option<&str> {
        self.values.get(var.name()).map(String::as_str)
    }

    pub fn set_named(&mut self, name: &str, value: impl Into<String>) {
        match LocalVar::from_name(name) {
            Some(var) => self.set(var, value),
            None => {
                self.values.insert(name.to_string(), value.into());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match LocalVar::from_name(name) {
            Some(var) => self.local(var),
            None => self.values.get(name).map(String::as_str),
        }
    }
}

/// How a target name is dispatched, decided once when the node is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetKind {
    Regular,
    Archive { archive: String, member: String },
    Library { name: String },
}

impl TargetKind {
    pub fn classify(name: &str) -> Self {
        match name.strip_prefix("-l") {
            Some(lib) if !lib.is_empty() => {
                return Self::Library {
                    name: lib.to_string(),
                };
            }
            _ => {}
        }

        match (name.find('('), name.strip_suffix(')')) {
            (Some(open), Some(body)) if open > 0 && open + 1 < body.len() => Self::Archive {
                archive: name[..open].to_string(),
                member: body[open + 1..].to_string(),
            },
            _ => Self::Regular,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    Archive,
    Library,
    Regular,
}

impl From<&TargetKind> for Dispatch {
    fn from(kind: &TargetKind) -> Self {
        match kind {
            TargetKind::Regular => Self::Regular,
            TargetKind::Archive { .. } => Self::Archive,
            TargetKind::Library { .. } => Self::Library,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Pending,
    Resolved(Dispatch),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    pub phony: bool,
    pub optional: bool,
    pub not_target: bool,
    pub transform: bool,
    pub depends: bool,
    pub member: bool,
    pub library: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GNode {
    pub name: String,
    pub path: Option<String>,
    pub kind: TargetKind,
    pub flags: NodeFlags,
    pub resolution: Resolution,
    pub suffix: Option<SuffixId>,
    pub children: Vec<NodeId>,
    pub parents: Vec<NodeId>,
    pub implicit_parents: Vec<NodeId>,
    pub commands: Vec<String>,
    pub unmade: usize,
    pub vars: LocalVars,
}

impl GNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: TargetKind::classify(&name),
            name,
            path: None,
            flags: NodeFlags::default(),
            resolution: Resolution::Pending,
            suffix: None,
            children: Vec::new(),
            parents: Vec::new(),
            implicit_parents: Vec::new(),
            commands: Vec::new(),
            unmade: 0,
            vars: LocalVars::new(),
        }
    }

    /// The located path if the node has been found on disk, else its name.
    pub fn path_or_name(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_))
    }
}

/// The build graph the suffix engine binds implicit sources into.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildGraph {
    nodes: Vec<GNode>,
    index: BTreeMap<String, NodeId>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    pub fn get_or_create(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.find(name) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(GNode::new(name));
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&GNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut GNode> {
        self.nodes.get_mut(id.index())
    }

    /// Node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let parent_node = &mut self[parent];
        parent_node.children.push(child);
        parent_node.unmade += 1;
        self[child].parents.push(parent);
    }

    /// The child `node` was implicitly derived from, if any.
    pub fn implicit_source(&self, node: NodeId) -> Option<NodeId> {
        self[node]
            .children
            .iter()
            .copied()
            .find(|child| self[*child].implicit_parents.contains(&node))
    }
}

impl Index<NodeId> for BuildGraph {
    type Output = GNode;

    fn index(&self, id: NodeId) -> &GNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for BuildGraph {
    fn index_mut(&mut self, id: NodeId) -> &mut GNode {
        &mut self.nodes[id.index()]
    }
}
