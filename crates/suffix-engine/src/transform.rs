use crate::{SuffixId, SuffixRegistry};
use serde::{Deserialize, Serialize};
use std::ops::Index;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleId(u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A transformation rule such as `.c.o`, named by its concatenated suffixes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRule {
    pub name: String,
    pub commands: Vec<String>,
    /// Sources listed on the rule's own dependency line.
    pub children: Vec<String>,
}

impl TransformRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.children.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRegistry {
    rules: Vec<TransformRule>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<RuleId> {
        self.rules
            .iter()
            .position(|rule| rule.name == name)
            .map(|index| RuleId(index as u32))
    }

    pub fn get(&self, id: RuleId) -> Option<&TransformRule> {
        self.rules.get(id.index())
    }

    pub fn get_mut(&mut self, id: RuleId) -> Option<&mut TransformRule> {
        self.rules.get_mut(id.index())
    }

    /// Creates the rule, or empties an existing one so it can be refilled.
    /// The flag is true when an existing rule was redefined.
    pub fn define(&mut self, name: &str) -> (RuleId, bool) {
        if let Some(id) = self.find(name) {
            let rule = &mut self.rules[id.index()];
            rule.commands.clear();
            rule.children.clear();
            return (id, true);
        }
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(TransformRule::new(name));
        (id, false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &TransformRule)> {
        self.rules
            .iter()
            .enumerate()
            .map(|(index, rule)| (RuleId(index as u32), rule))
    }
}

impl Index<RuleId> for TransformRegistry {
    type Output = TransformRule;

    fn index(&self, id: RuleId) -> &TransformRule {
        &self.rules[id.index()]
    }
}

/// Splits a rule name into its (source, target) suffixes.
///
/// A name made of two active suffixes always wins. A name that is exactly
/// one active suffix is a single-suffix rule whose target is the null
/// suffix.
pub fn parse_transform(suffixes: &SuffixRegistry, name: &str) -> Option<(SuffixId, SuffixId)> {
    let mut single = None;

    for &source in suffixes.active() {
        let Some(rest) = name.strip_prefix(suffixes[source].name.as_str()) else {
            continue;
        };
        if rest.is_empty() {
            single = Some(source);
        } else if let Some(target) = suffixes.find(rest) {
            return Some((source, target));
        }
    }

    single.map(|source| (source, suffixes.null()))
}
