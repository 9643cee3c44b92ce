use crate::SearchPath;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Stable handle into a [`SuffixRegistry`]. Handles are never reused, so a
/// graph node can keep one across `ClearSuffixes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SuffixId(u32);

impl SuffixId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixFlags {
    pub include: bool,
    pub library: bool,
    pub null: bool,
}

impl SuffixFlags {
    pub fn describe(&self) -> String {
        let mut names = Vec::new();
        if self.include {
            names.push("INCLUDE");
        }
        if self.library {
            names.push("LIBRARY");
        }
        if self.null {
            names.push("NULL");
        }
        names.join("|")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suffix {
    pub name: String,
    /// Registration order; edge lists are kept sorted by it.
    pub ordinal: u32,
    pub flags: SuffixFlags,
    pub search_path: SearchPath,
    /// Suffixes this one can be transformed into.
    pub parents: Vec<SuffixId>,
    /// Suffixes that can be transformed into this one.
    pub children: Vec<SuffixId>,
    pub ref_count: u32,
}

impl Suffix {
    fn new(name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            ordinal,
            flags: SuffixFlags::default(),
            search_path: SearchPath::new(),
            parents: Vec::new(),
            children: Vec::new(),
            ref_count: 0,
        }
    }

    /// The part of `name` left of this suffix, if `name` ends with it.
    pub fn strip_from<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_suffix(self.name.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRegistry {
    suffixes: Vec<Suffix>,
    active: Vec<SuffixId>,
    next_ordinal: u32,
    null: SuffixId,
    empty: SuffixId,
}

impl SuffixRegistry {
    pub fn new(default_path: &SearchPath) -> Self {
        let mut registry = Self {
            suffixes: Vec::new(),
            active: Vec::new(),
            next_ordinal: 0,
            null: SuffixId(0),
            empty: SuffixId(0),
        };
        registry.reset_empty(default_path);
        registry
    }

    /// Forgets every active suffix and installs a fresh empty suffix as the
    /// null suffix. Old records stay addressable.
    pub fn clear(&mut self, default_path: &SearchPath) {
        self.active.clear();
        self.next_ordinal = 0;
        self.reset_empty(default_path);
    }

    fn reset_empty(&mut self, default_path: &SearchPath) {
        let empty = self.alloc("");
        let suffix = &mut self[empty];
        suffix.flags.null = true;
        suffix.search_path.add_all(default_path);
        self.empty = empty;
        self.null = empty;
    }

    fn alloc(&mut self, name: &str) -> SuffixId {
        let id = SuffixId(self.suffixes.len() as u32);
        self.suffixes.push(Suffix::new(name, self.next_ordinal));
        self.next_ordinal += 1;
        id
    }

    /// Registers `name` unless it is already active. Returns the handle and
    /// whether it was created.
    pub fn insert(&mut self, name: &str) -> (SuffixId, bool) {
        if let Some(id) = self.find(name) {
            return (id, false);
        }
        let id = self.alloc(name);
        self.active.push(id);
        (id, true)
    }

    pub fn find(&self, name: &str) -> Option<SuffixId> {
        self.active
            .iter()
            .copied()
            .find(|id| self[*id].name == name)
    }

    pub fn get(&self, id: SuffixId) -> Option<&Suffix> {
        self.suffixes.get(id.index())
    }

    /// Active suffixes in registration order.
    pub fn active(&self) -> &[SuffixId] {
        &self.active
    }

    pub fn null(&self) -> SuffixId {
        self.null
    }

    pub fn empty(&self) -> SuffixId {
        self.empty
    }

    pub fn set_null(&mut self, id: SuffixId) {
        let previous = self.null;
        self[previous].flags.null = false;
        self[id].flags.null = true;
        self.null = id;
    }

    /// Active suffixes that end `name`, with the prefix each leaves behind.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (SuffixId, &'a str)> + 'a {
        self.active
            .iter()
            .copied()
            .filter_map(move |id| self[id].strip_from(name).map(|prefix| (id, prefix)))
    }

    /// Records that `source` transforms into `target`.
    pub fn relate(&mut self, source: SuffixId, target: SuffixId) {
        if self.insert_ordered(target, source, Side::Children) {
            self[source].ref_count += 1;
        }
        if self.insert_ordered(source, target, Side::Parents) {
            self[target].ref_count += 1;
        }
    }

    pub fn unrelate(&mut self, source: SuffixId, target: SuffixId) {
        if remove_from(&mut self[target].children, source) {
            self.release(source);
        }
        if remove_from(&mut self[source].parents, target) {
            self.release(target);
        }
    }

    pub fn add_ref(&mut self, id: SuffixId) {
        self[id].ref_count += 1;
    }

    pub fn release(&mut self, id: SuffixId) {
        let suffix = &mut self[id];
        suffix.ref_count = suffix.ref_count.saturating_sub(1);
    }

    fn insert_ordered(&mut self, owner: SuffixId, member: SuffixId, side: Side) -> bool {
        let ordinal = self[member].ordinal;
        let position = {
            let list = match side {
                Side::Parents => &self[owner].parents,
                Side::Children => &self[owner].children,
            };
            if list.contains(&member) {
                return false;
            }
            list.iter()
                .position(|existing| self[*existing].ordinal > ordinal)
                .unwrap_or(list.len())
        };
        let list = match side {
            Side::Parents => &mut self[owner].parents,
            Side::Children => &mut self[owner].children,
        };
        list.insert(position, member);
        true
    }
}

#[derive(Clone, Copy)]
enum Side {
    Parents,
    Children,
}

fn remove_from(list: &mut Vec<SuffixId>, id: SuffixId) -> bool {
    match list.iter().position(|existing| *existing == id) {
        Some(position) => {
            list.remove(position);
            true
        }
        None => false,
    }
}

impl Index<SuffixId> for SuffixRegistry {
    type Output = Suffix;

    fn index(&self, id: SuffixId) -> &Suffix {
        &self.suffixes[id.index()]
    }
}

impl IndexMut<SuffixId> for SuffixRegistry {
    fn index_mut(&mut self, id: SuffixId) -> &mut Suffix {
        &mut self.suffixes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SuffixRegistry {
        SuffixRegistry::new(&SearchPath::from_dirs(["."]))
    }

    #[test]
    fn new_registry_expected_empty_null_suffix_with_default_path() {
        let registry = registry();
        let null = &registry[registry.null()];
        assert_eq!(null.name, "");
        assert!(null.flags.null);
        assert_eq!(null.ordinal, 0);
        assert_eq!(null.search_path, SearchPath::from_dirs(["."]));
        assert!(registry.active().is_empty());
    }

    #[test]
    fn insert_twice_expected_same_handle_and_ordinals_from_one() {
        let mut registry = registry();
        let (c, created) = registry.insert(".c");
        assert!(created);
        let (again, created) = registry.insert(".c");
        assert!(!created);
        assert_eq!(c, again);
        let (o, _) = registry.insert(".o");
        assert_eq!(registry[c].ordinal, 1);
        assert_eq!(registry[o].ordinal, 2);
    }

    #[test]
    fn relate_expected_edges_sorted_by_ordinal_and_counted_once() {
        let mut registry = registry();
        let (c, _) = registry.insert(".c");
        let (y, _) = registry.insert(".y");
        let (o, _) = registry.insert(".o");

        registry.relate(y, o);
        registry.relate(c, o);
        registry.relate(c, o);

        assert_eq!(registry[o].children, vec![c, y]);
        assert_eq!(registry[c].parents, vec![o]);
        assert_eq!(registry[c].ref_count, 1);
        assert_eq!(registry[o].ref_count, 2);

        registry.unrelate(c, o);
        assert_eq!(registry[o].children, vec![y]);
        assert!(registry[c].parents.is_empty());
        assert_eq!(registry[c].ref_count, 0);
    }

    #[test]
    fn release_below_zero_expected_saturation() {
        let mut registry = registry();
        let (c, _) = registry.insert(".c");
        registry.release(c);
        assert_eq!(registry[c].ref_count, 0);
    }

    #[test]
    fn clear_expected_old_handles_valid_but_unreachable() {
        let mut registry = registry();
        let (c, _) = registry.insert(".c");
        let old_null = registry.null();

        registry.clear(&SearchPath::new());

        assert_eq!(registry.find(".c"), None);
        assert_eq!(registry[c].name, ".c");
        assert_ne!(registry.null(), old_null);
        let (again, created) = registry.insert(".c");
        assert!(created);
        assert_ne!(again, c);
        assert_eq!(registry[again].ordinal, 1);
    }

    #[test]
    fn set_null_expected_flag_moves_between_holders() {
        let mut registry = registry();
        let empty = registry.empty();
        let (out, _) = registry.insert(".out");

        registry.set_null(out);

        assert!(!registry[empty].flags.null);
        assert!(registry[out].flags.null);
        assert_eq!(registry.null(), out);
        assert_eq!(registry[out].flags.describe(), "NULL");
    }

    #[test]
    fn matching_expected_registration_order_and_prefixes() {
        let mut registry = registry();
        let (o, _) = registry.insert(".o");
        let (tab_o, _) = registry.insert(".tab.o");
        let matches: Vec<_> = registry.matching("gram.tab.o").collect();
        assert_eq!(matches, vec![(o, "gram.tab"), (tab_o, "gram")]);
    }
}
