//! Category path resolution
//!
//! Walks a category path from the root down, reusing known categories and
//! creating the missing ones. Lookups are cached per `(name, parent)` for the
//! lifetime of the resolver, which is one import run.

use std::collections::HashMap;

use crate::core::store::{RecordStore, StoreError, ROOT_CATEGORY};

/// Outcome of finding or creating one category level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(i64),
    Created(i64),
    Failed,
}

/// Outcome of resolving a whole path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    /// Id of the deepest category
    Resolved(i64),
    /// Creating `name` (0-based `index`) failed; `skipped` deeper levels were not attempted
    Broken {
        name: String,
        index: usize,
        skipped: usize,
    },
}

/// Result of `CategoryResolver::resolve`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolution {
    pub outcome: PathOutcome,
    /// Categories created while walking this path
    pub created: usize,
}

/// Resolves category paths to ids, creating missing levels
#[derive(Debug, Default)]
pub struct CategoryResolver {
    cache: HashMap<(String, i64), i64>,
}

impl CategoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Find the category `name` under `parent`, creating it when absent
    ///
    /// Store lookup errors propagate; a failed create is `Lookup::Failed`.
    pub fn find_or_create(
        &mut self,
        store: &mut dyn RecordStore,
        name: &str,
        parent: i64,
    ) -> Result<Lookup, StoreError> {
        let key = (name.to_string(), parent);
        if let Some(&id) = self.cache.get(&key) {
            return Ok(Lookup::Found(id));
        }

        if let Some(id) = store.find_category(name, parent)? {
            self.cache.insert(key, id);
            return Ok(Lookup::Found(id));
        }

        match store.create_category(name, parent) {
            Ok(id) => {
                tracing::debug!(category = name, parent, id, "created category");
                self.cache.insert(key, id);
                Ok(Lookup::Created(id))
            }
            Err(e) => {
                tracing::warn!(category = name, parent, error = %e, "category creation failed");
                Ok(Lookup::Failed)
            }
        }
    }

    /// Resolve a path of category names to the id of its last level
    ///
    /// Stops at the first level that cannot be created; deeper levels are
    /// never attempted. An empty path resolves to the root.
    pub fn resolve(
        &mut self,
        store: &mut dyn RecordStore,
        segments: &[String],
    ) -> Result<PathResolution, StoreError> {
        let mut parent = ROOT_CATEGORY;
        let mut created = 0;

        for (index, name) in segments.iter().enumerate() {
            parent = match self.find_or_create(store, name, parent)? {
                Lookup::Found(id) => id,
                Lookup::Created(id) => {
                    created += 1;
                    id
                }
                Lookup::Failed => {
                    return Ok(PathResolution {
                        outcome: PathOutcome::Broken {
                            name: name.clone(),
                            index,
                            skipped: segments.len() - index - 1,
                        },
                        created,
                    });
                }
            };
        }

        Ok(PathResolution {
            outcome: PathOutcome::Resolved(parent),
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use crate::upload::testing::FlakyStore;

    fn path(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_creates_only_missing_levels() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let x = store.create_category("X", ROOT_CATEGORY).unwrap();
        let mut resolver = CategoryResolver::new();

        let result = resolver.resolve(&mut store, &path(&["X", "Y"])).unwrap();
        assert_eq!(result.created, 1);
        let y = match result.outcome {
            PathOutcome::Resolved(id) => id,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(store.find_category("Y", x).unwrap(), Some(y));
    }

    #[test]
    fn test_find_or_create_reports_status() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut resolver = CategoryResolver::new();

        let first = resolver.find_or_create(&mut store, "Arts", ROOT_CATEGORY).unwrap();
        let id = match first {
            Lookup::Created(id) => id,
            other => panic!("unexpected lookup: {other:?}"),
        };
        assert_eq!(
            resolver.find_or_create(&mut store, "Arts", ROOT_CATEGORY).unwrap(),
            Lookup::Found(id)
        );
    }

    #[test]
    fn test_stops_at_first_failure() {
        let mut store = FlakyStore::new().fail_category("Y");
        let mut resolver = CategoryResolver::new();

        let result = resolver.resolve(&mut store, &path(&["X", "Y", "Z"])).unwrap();
        assert_eq!(
            result.outcome,
            PathOutcome::Broken {
                name: "Y".into(),
                index: 1,
                skipped: 1,
            }
        );
        assert_eq!(result.created, 1);
        assert_eq!(store.category_attempts("Z"), 0);
        assert_eq!(store.category_attempts("Y"), 1);
    }

    #[test]
    fn test_repeated_path_reuses_cached_ids() {
        let mut store = FlakyStore::new();
        let mut resolver = CategoryResolver::new();
        let segments = path(&["Science", "Compsci"]);

        let first = resolver.resolve(&mut store, &segments).unwrap();
        let second = resolver.resolve(&mut store, &segments).unwrap();

        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(store.category_attempts("Science"), 1);
        assert_eq!(store.category_attempts("Compsci"), 1);
        assert_eq!(store.category_lookups(), 2);
        assert_eq!(resolver.cached(), 2);
    }

    #[test]
    fn test_same_name_under_different_parents() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut resolver = CategoryResolver::new();

        let a = resolver.resolve(&mut store, &path(&["Science", "Labs"])).unwrap();
        let b = resolver.resolve(&mut store, &path(&["Arts", "Labs"])).unwrap();
        assert_ne!(a.outcome, b.outcome);
        assert_eq!(b.created, 2);
    }

    #[test]
    fn test_empty_path_resolves_to_root() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut resolver = CategoryResolver::new();
        let result = resolver.resolve(&mut store, &[]).unwrap();
        assert_eq!(result.outcome, PathOutcome::Resolved(ROOT_CATEGORY));
        assert_eq!(result.created, 0);
    }
}
