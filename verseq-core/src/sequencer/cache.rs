use std::collections::VecDeque;

use hashbrown::HashMap;

use crate::{Result, VerseqError};

#[derive(Default)]
struct Reserved {
    values: VecDeque<u64>,
    // the greatest value ever appended, survives consumption
    high: u64,
}

/// Reserved but unconsumed identifiers, per sequence name, oldest first.
#[derive(Default)]
pub(crate) struct SequenceCache {
    entries: HashMap<String, Reserved>,
}

impl SequenceCache {
    /// Pops the oldest reserved identifier of `name`.
    pub(crate) fn try_take(&mut self, name: &str) -> Option<u64> {
        self.entries.get_mut(name).and_then(|it| it.values.pop_front())
    }

    pub(crate) fn depth(&self, name: &str) -> usize {
        self.entries
            .get(name)
            .map(|it| it.values.len())
            .unwrap_or_default()
    }

    /// Appends a batch of versions for `name`.
    ///
    /// The batch must be non-empty and strictly increasing, and must start above everything
    /// appended for `name` before. A rejected batch leaves the cache untouched.
    pub(crate) fn append(&mut self, name: &str, versions: Vec<u64>) -> Result<()> {
        let ent = self.entries.entry_ref(name).or_default();

        let mut prev = ent.high;
        for &v in &versions {
            if v <= prev {
                return Err(VerseqError::InvalidVersions(
                    name.to_string(),
                    format!("version {} does not follow {}", v, prev).into(),
                ));
            }
            prev = v;
        }

        if versions.is_empty() {
            return Err(VerseqError::InvalidVersions(
                name.to_string(),
                "empty batch".into(),
            ));
        }

        ent.high = prev;
        ent.values.extend(versions);

        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
