use crate::{SuffixId, SuffixSession};
use std::fmt::Write;

impl SuffixSession {
    /// Renders the suffix graph and the transformation rules for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::from("#*** Suffixes:\n");
        for &id in self.suffixes.active() {
            let suffix = &self.suffixes[id];
            let _ = write!(
                out,
                "# \"{}\" (num {}, ref {})",
                suffix.name, suffix.ordinal, suffix.ref_count
            );
            let flags = suffix.flags.describe();
            if !flags.is_empty() {
                let _ = write!(out, " ({flags})");
            }
            out.push('\n');
            let _ = writeln!(out, "#\tTo: {}", self.suffix_list(&suffix.parents));
            let _ = writeln!(out, "#\tFrom: {}", self.suffix_list(&suffix.children));
            let dirs: String = suffix
                .search_path
                .dirs()
                .iter()
                .map(|dir| format!("{} ", dir.display()))
                .collect();
            let _ = writeln!(out, "#\tSearch Path: {dirs}");
        }

        out.push_str("#*** Transformations:\n");
        for (_, rule) in self.transforms.iter() {
            let _ = writeln!(out, "{:<16}:", rule.name);
            for command in &rule.commands {
                let _ = writeln!(out, "\t{command}");
            }
            out.push('\n');
        }
        out
    }

    fn suffix_list(&self, ids: &[SuffixId]) -> String {
        ids.iter()
            .map(|id| format!("{} ", self.suffixes[*id].name))
            .collect()
    }
}
