//! Dependency resolver: kanji -> difficulty level via the item cache.
//!
//! # Responsibility
//! - Map each kanji to its owning item through a [`SubjectIndex`].
//! - Warm the cache with every item reachable through component ids.
//! - Report each kanji's level from its own item record.
//!
//! # Invariants
//! - A kanji without an owning item gets [`UNRESOLVED_LEVEL`], never a guess.
//! - A failed fetch fails that kanji only; other kanji still resolve.
//! - Component traversal visits each id at most once, so cyclic data
//!   terminates.

use crate::cache::{CacheError, ItemCache, ItemSource, SubjectIndex};
use crate::db::DbError;
use crate::model::item::SubjectId;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Level reported for kanji that have no owning item.
pub const UNRESOLVED_LEVEL: i32 = -1;

/// Per-kanji resolution failure.
#[derive(Debug)]
pub enum ResolveError {
    /// Owning-item lookup failed.
    Index(DbError),
    /// Fetching the owning item or a component failed.
    Cache(CacheError),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(err) => write!(f, "owning item lookup failed: {err}"),
            Self::Cache(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(err) => Some(err),
            Self::Cache(err) => Some(err),
        }
    }
}

impl From<DbError> for ResolveError {
    fn from(value: DbError) -> Self {
        Self::Index(value)
    }
}

impl From<CacheError> for ResolveError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

/// A component id that the source reports as nonexistent.
///
/// Non-fatal: the owning kanji still resolves from its own record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedComponent {
    pub unit: char,
    pub parent_id: SubjectId,
    pub component_id: SubjectId,
}

/// Outcome of [`DependencyResolver::resolve_levels`].
#[derive(Debug, Default)]
pub struct LevelResolution {
    /// Level per kanji; `UNRESOLVED_LEVEL` for kanji without an owning item.
    pub levels: BTreeMap<char, i32>,
    /// Kanji whose resolution failed; absent from `levels`.
    pub failures: BTreeMap<char, ResolveError>,
    pub unresolved_components: Vec<UnresolvedComponent>,
}

impl LevelResolution {
    pub fn level(&self, unit: char) -> Option<i32> {
        self.levels.get(&unit).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.failures.is_empty()
    }
}

/// Resolves kanji levels through an owning-item index and the item cache.
pub struct DependencyResolver<'r, 'conn, S: ItemSource, I: SubjectIndex> {
    cache: &'r ItemCache<'conn, S>,
    index: I,
}

impl<'r, 'conn, S: ItemSource, I: SubjectIndex> DependencyResolver<'r, 'conn, S, I> {
    pub fn new(cache: &'r ItemCache<'conn, S>, index: I) -> Self {
        Self { cache, index }
    }

    /// Resolves the level of every distinct kanji in `units`.
    pub fn resolve_levels<U>(&self, units: U) -> LevelResolution
    where
        U: IntoIterator<Item = char>,
    {
        let units: BTreeSet<char> = units.into_iter().collect();
        let mut resolution = LevelResolution::default();

        for unit in units {
            match self.resolve_unit(unit, &mut resolution.unresolved_components) {
                Ok(level) => {
                    resolution.levels.insert(unit, level);
                }
                Err(err) => {
                    error!(
                        "event=level_resolve module=resolve status=error unit={unit} error={err}"
                    );
                    resolution.failures.insert(unit, err);
                }
            }
        }

        info!(
            "event=level_resolve module=resolve status=ok resolved={} failed={} unresolved_components={}",
            resolution.levels.len(),
            resolution.failures.len(),
            resolution.unresolved_components.len()
        );
        resolution
    }

    fn resolve_unit(
        &self,
        unit: char,
        unresolved: &mut Vec<UnresolvedComponent>,
    ) -> Result<i32, ResolveError> {
        let Some(owner_id) = self.index.lookup(unit.encode_utf8(&mut [0; 4]))? else {
            debug!("event=level_resolve module=resolve status=no_owner unit={unit}");
            return Ok(UNRESOLVED_LEVEL);
        };

        let owner = self.cache.get(owner_id)?;
        self.warm_components(unit, owner_id, &owner.component_ids, unresolved)?;
        Ok(owner.level)
    }

    /// Fetches every item reachable from `roots` with an explicit worklist.
    fn warm_components(
        &self,
        unit: char,
        owner_id: SubjectId,
        roots: &[SubjectId],
        unresolved: &mut Vec<UnresolvedComponent>,
    ) -> Result<(), ResolveError> {
        let mut seen: HashSet<SubjectId> = HashSet::from([owner_id]);
        let mut worklist: Vec<(SubjectId, SubjectId)> =
            roots.iter().rev().map(|id| (owner_id, *id)).collect();

        while let Some((parent_id, id)) = worklist.pop() {
            if !seen.insert(id) {
                continue;
            }
            match self.cache.get(id) {
                Ok(component) => {
                    worklist.extend(
                        component
                            .component_ids
                            .iter()
                            .rev()
                            .map(|child| (id, *child)),
                    );
                }
                Err(CacheError::Fetch(err)) if err.is_not_found() => {
                    warn!(
                        "event=unresolved_component module=resolve status=warn unit={unit} parent_id={parent_id} component_id={id}"
                    );
                    unresolved.push(UnresolvedComponent {
                        unit,
                        parent_id,
                        component_id: id,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}
