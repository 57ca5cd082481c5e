//! Layer groups and the expansion of group-level assignments onto leaf layers.

use std::collections::{HashMap, HashSet};

/// Upper bound on worklist pops for one assignment entry. Well-formed group
/// data never gets near it; it only stops runaway expansion of corrupt data.
pub const MAX_EXPANSION_STEPS: usize = 10_000;

/// Group name → member names, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct LayerGroups {
    groups: HashMap<String, Vec<String>>,
}

impl LayerGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an (initially empty) group. Re-registering keeps members.
    pub fn register(&mut self, group: &str) {
        if !self.groups.contains_key(group) {
            self.groups.insert(group.to_string(), Vec::new());
        }
    }

    pub fn add_member(&mut self, group: &str, member: &str) {
        self.register(group);
        if let Some(members) = self.groups.get_mut(group) {
            if !members.iter().any(|m| m == member) {
                members.push(member.to_string());
            }
        }
    }

    pub fn is_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn members(&self, group: &str) -> Option<&[String]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Expands a sparse layer-or-group assignment into a per-layer one.
    ///
    /// Entries are applied in iteration order and later entries overwrite
    /// earlier ones, so `[("Body", a), ("Head", b)]` gives `Head` the value
    /// `b` even when `Head` is a member of `Body`.
    ///
    /// Groups and layers share one namespace, so every visited name is
    /// recorded, group names included, before a group's members are queued.
    /// A layer named like its own group therefore still gets the value.
    /// Callers filter out names they do not draw.
    pub fn expand<S, T>(&self, assignment: impl IntoIterator<Item = (S, T)>) -> HashMap<String, T>
    where
        S: Into<String>,
        T: Clone,
    {
        let mut leaves = HashMap::new();

        for (name, value) in assignment {
            let mut worklist: Vec<(String, T)> = vec![(name.into(), value)];
            let mut visited: HashSet<String> = HashSet::new();
            let mut steps = 0;

            while let Some((name, value)) = worklist.pop() {
                steps += 1;
                if steps > MAX_EXPANSION_STEPS {
                    tracing::warn!(
                        group = %name,
                        "layer group expansion exceeded {MAX_EXPANSION_STEPS} steps, stopping"
                    );
                    break;
                }

                leaves.insert(name.clone(), value.clone());

                // Self-referencing or cyclic groups are expanded once.
                if let Some(members) = self.groups.get(&name) {
                    if visited.insert(name) {
                        for member in members.iter().rev() {
                            worklist.push((member.clone(), value.clone()));
                        }
                    }
                }
            }
        }

        leaves
    }
}
