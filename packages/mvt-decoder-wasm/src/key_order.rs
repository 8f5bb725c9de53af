use std::collections::HashMap;

/// Global key-priority ordering applied to every layer's key dictionary.
///
/// Lower ranks sort first; `None` means the key is not prioritised and keeps
/// its dictionary order after all ranked keys.
pub trait KeyPriority: Send + Sync {
    fn rank(&self, key: &str) -> Option<u32>;
}

impl<F> KeyPriority for F
where
    F: Fn(&str) -> Option<u32> + Send + Sync,
{
    fn rank(&self, key: &str) -> Option<u32> {
        self(key)
    }
}

/// Priority table built from an ordered list of key names.
#[derive(Debug, Clone, Default)]
pub struct KeyPriorityTable {
    ranks: HashMap<String, u32>,
}

impl KeyPriorityTable {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranks = HashMap::new();
        for (rank, key) in keys.into_iter().enumerate() {
            // first occurrence wins
            ranks.entry(key.into()).or_insert(rank as u32);
        }
        Self { ranks }
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

impl KeyPriority for KeyPriorityTable {
    fn rank(&self, key: &str) -> Option<u32> {
        self.ranks.get(key).copied()
    }
}

/// Sorts key ids by priority. Returns the ordered ids and, indexed by key id,
/// each key's position in that order.
pub(crate) fn order_keys(keys: &[String], priority: &dyn KeyPriority) -> (Vec<u32>, Vec<u32>) {
    let mut ordered: Vec<(Option<u32>, u32)> = keys
        .iter()
        .enumerate()
        .map(|(id, key)| (priority.rank(key), id as u32))
        .collect();
    ordered.sort_by_key(|&(rank, id)| (rank.is_none(), rank, id));

    let mut positions = vec![0u32; keys.len()];
    let ordered_ids: Vec<u32> = ordered
        .into_iter()
        .enumerate()
        .map(|(position, (_, id))| {
            positions[id as usize] = position as u32;
            id
        })
        .collect();
    (ordered_ids, positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn ranked_keys_come_first() {
        let table = KeyPriorityTable::new(["class", "name"]);
        let (ordered, positions) = order_keys(&keys(&["height", "name", "kind", "class"]), &table);
        assert_eq!(ordered, vec![3, 1, 0, 2]);
        assert_eq!(positions, vec![2, 1, 3, 0]);
    }

    #[test]
    fn empty_table_keeps_dictionary_order() {
        let (ordered, positions) = order_keys(&keys(&["b", "a", "c"]), &KeyPriorityTable::default());
        assert_eq!(ordered, vec![0, 1, 2]);
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn closure_priority() {
        let priority = |key: &str| if key == "z" { Some(0u32) } else { None };
        let (ordered, _) = order_keys(&keys(&["a", "z"]), &priority);
        assert_eq!(ordered, vec![1, 0]);
    }

    #[test]
    fn duplicate_table_entries_keep_first_rank() {
        let table = KeyPriorityTable::new(["a", "b", "a"]);
        assert_eq!(table.rank("a"), Some(0));
        assert_eq!(table.len(), 2);
    }
}
