// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy set of tasks known by uuid.
//!
//! A [`LazyTaskSet`] is either *lazy* (a uuid set, authoritative for
//! containment, size and algebra) or *materialized* (a fetched
//! [`TaskCollection`], authoritative from then on). The switch happens once,
//! through a single [`TaskStore::filter`] call, and is never undone.
//!
//! Right-hand operands of every algebra method are arbitrary iterables of
//! [`TaskLike`] values. Only their uuids are read, so algebra never fetches
//! anything on either side.

use crate::error::LazyError;
use crate::ident::{TaskLike, TaskUuid, ID_FIELD};
use crate::record::{TaskCollection, TaskRecord};
use crate::reference::LazyTask;
use crate::store::{Backend, TaskStore};
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{hash_set, HashSet};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Sub};
use tracing::{debug, instrument, trace, warn};

enum SetState<S: TaskStore> {
    Lazy { uuids: HashSet<TaskUuid> },
    Materialized { collection: S::Collection },
}

/// A set of tasks known by uuid, fetched only when identifiers are not enough.
///
/// While lazy, `contains`, `len`, iteration, set algebra and the mutators all
/// work on uuids and never touch the store. Anything else (reading fields
/// across the set, bulk updates, borrowing the records) materializes the set
/// into `S::Collection` with one [`TaskStore::filter`] call; after that,
/// every operation, algebra included, goes through the collection.
///
/// Probes such as [`is_materialized`](LazyTaskSet::is_materialized),
/// [`try_collection`](LazyTaskSet::try_collection), `Debug` and `Display`
/// never materialize.
pub struct LazyTaskSet<S: TaskStore> {
    backend: Backend<S>,
    state: SetState<S>,
}

fn uuids_of<I>(items: I) -> HashSet<TaskUuid>
where
    I: IntoIterator,
    I::Item: TaskLike,
{
    items.into_iter().filter_map(|t| t.task_uuid()).collect()
}

fn sorted<'a>(uuids: impl IntoIterator<Item = &'a TaskUuid>) -> Vec<&'a str> {
    let mut out: Vec<&str> = uuids.into_iter().map(TaskUuid::as_str).collect();
    out.sort_unstable();
    out
}

/// One `filter` call for `uuids`; empty sets short-circuit to an empty collection.
fn fetch_collection<S: TaskStore>(
    backend: &Backend<S>,
    uuids: &HashSet<TaskUuid>,
) -> Result<S::Collection, LazyError> {
    if uuids.is_empty() {
        debug!("empty task set materializes without a backend call");
        return Ok(S::Collection::default());
    }
    if let Some(limit) = backend.config().warn_materialize_above {
        if uuids.len() > limit {
            warn!(members = uuids.len(), limit, "materializing a large task set");
        }
    }
    let store = backend.store();
    let query = sorted(uuids).join(store.query_separator());
    debug!(
        members = uuids.len(),
        query_len = query.len(),
        "materializing task set"
    );
    store.filter(&query)
}

/// Fetch `wanted` and insert whatever the store returns into `collection`.
///
/// Uuids the store does not know simply do not appear.
fn fetch_into<S: TaskStore>(
    backend: &Backend<S>,
    collection: &mut S::Collection,
    wanted: &HashSet<TaskUuid>,
) -> Result<(), LazyError> {
    let mut fetched = fetch_collection(backend, wanted)?;
    while let Some(record) = fetched.pop() {
        if record.uuid().is_some_and(|u| wanted.contains(u)) {
            collection.insert(record);
        }
    }
    Ok(())
}

impl<S: TaskStore> LazyTaskSet<S> {
    /// A lazy set over `uuids`; duplicates collapse. No backend call.
    pub fn new(backend: Backend<S>, uuids: impl IntoIterator<Item = TaskUuid>) -> Self {
        Self {
            backend,
            state: SetState::Lazy {
                uuids: uuids.into_iter().collect(),
            },
        }
    }

    /// A lazy set over the uuids of any task-like values.
    pub fn from_tasks<I>(backend: Backend<S>, tasks: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        Self::new(backend, uuids_of(tasks))
    }

    fn derive(&self, uuids: HashSet<TaskUuid>, op: &'static str) -> Self {
        trace!(op, members = uuids.len(), "task set algebra");
        Self {
            backend: self.backend.clone(),
            state: SetState::Lazy { uuids },
        }
    }

    /// The handle this set materializes through.
    pub fn backend(&self) -> &Backend<S> {
        &self.backend
    }

    /// Whether the set has been replaced by a fetched collection.
    pub fn is_materialized(&self) -> bool {
        matches!(self.state, SetState::Materialized { .. })
    }

    /// The fetched collection, or `None` while lazy. Never materializes.
    pub fn try_collection(&self) -> Option<&S::Collection> {
        match &self.state {
            SetState::Lazy { .. } => None,
            SetState::Materialized { collection } => Some(collection),
        }
    }

    fn members(&self) -> Cow<'_, HashSet<TaskUuid>> {
        match &self.state {
            SetState::Lazy { uuids } => Cow::Borrowed(uuids),
            SetState::Materialized { collection } => {
                Cow::Owned(collection.uuids().into_iter().collect())
            }
        }
    }

    /// The member uuids.
    pub fn uuids(&self) -> HashSet<TaskUuid> {
        self.members().into_owned()
    }

    /// Whether `task`'s uuid is a member. Values without a uuid never are.
    pub fn contains(&self, task: &impl TaskLike) -> bool {
        let Some(uuid) = task.task_uuid() else {
            return false;
        };
        match &self.state {
            SetState::Lazy { uuids } => uuids.contains(&uuid),
            SetState::Materialized { collection } => collection.contains(&uuid),
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        match &self.state {
            SetState::Lazy { uuids } => uuids.len(),
            SetState::Materialized { collection } => collection.len(),
        }
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the members as [`LazyTask`]s, in no particular order.
    ///
    /// Never materializes. Once the set is materialized the yielded tasks
    /// carry their fetched records.
    pub fn iter(&self) -> LazyTaskSetIter<'_, S> {
        let inner = match &self.state {
            SetState::Lazy { uuids } => IterInner::Lazy(uuids.iter()),
            SetState::Materialized { collection } => {
                IterInner::Materialized(collection.records().iter())
            }
        };
        LazyTaskSetIter {
            backend: &self.backend,
            inner,
        }
    }

    // ── pure algebra ─────────────────────────────────────────────────────

    /// Members of either side.
    pub fn union<I>(&self, other: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let mut uuids = self.members().into_owned();
        uuids.extend(uuids_of(other));
        self.derive(uuids, "union")
    }

    /// Members of both sides.
    pub fn intersection<I>(&self, other: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        let uuids = self
            .members()
            .iter()
            .filter(|u| theirs.contains(*u))
            .cloned()
            .collect();
        self.derive(uuids, "intersection")
    }

    /// Members of `self` not in `other`.
    pub fn difference<I>(&self, other: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        let uuids = self
            .members()
            .iter()
            .filter(|u| !theirs.contains(*u))
            .cloned()
            .collect();
        self.derive(uuids, "difference")
    }

    /// Members of `other` not in `self`: the reversed difference
    /// (`other - self`).
    pub fn difference_from<I>(&self, other: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let mine = self.members();
        let uuids = uuids_of(other)
            .into_iter()
            .filter(|u| !mine.contains(u))
            .collect();
        self.derive(uuids, "difference_from")
    }

    /// Members of exactly one side.
    pub fn symmetric_difference<I>(&self, other: I) -> Self
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        let uuids = self.members().symmetric_difference(&theirs).cloned().collect();
        self.derive(uuids, "symmetric_difference")
    }

    /// Whether every member of `self` is in `other`.
    pub fn is_subset<I>(&self, other: I) -> bool
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        self.members().iter().all(|u| theirs.contains(u))
    }

    /// Whether every element of `other` is a member of `self`.
    ///
    /// An element without a uuid is never a member, so its presence makes
    /// this `false`.
    pub fn is_superset<I>(&self, other: I) -> bool
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        other.into_iter().all(|t| self.contains(&t))
    }

    /// Whether `other` names exactly the members of `self`, order ignored.
    /// Never errors; an element without a uuid makes the sets unequal.
    pub fn equals<I>(&self, other: I) -> bool
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let mut theirs = HashSet::new();
        for item in other {
            match item.task_uuid() {
                Some(uuid) => theirs.insert(uuid),
                None => return false,
            };
        }
        *self.members() == theirs
    }

    // ── in-place algebra ────────────────────────────────────────────────

    /// Add the members of `other`.
    ///
    /// Once materialized, the missing records are fetched with one `filter`
    /// call; uuids the store does not know are dropped.
    pub fn update<I>(&mut self, other: I) -> Result<&mut Self, LazyError>
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        match &mut self.state {
            SetState::Lazy { uuids } => uuids.extend(theirs),
            SetState::Materialized { collection } => {
                let missing = theirs
                    .into_iter()
                    .filter(|u| !collection.contains(u))
                    .collect();
                fetch_into(&self.backend, collection, &missing)?;
            }
        }
        Ok(self)
    }

    /// Keep only members also in `other`.
    pub fn intersection_update<I>(&mut self, other: I) -> Result<&mut Self, LazyError>
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        match &mut self.state {
            SetState::Lazy { uuids } => uuids.retain(|u| theirs.contains(u)),
            SetState::Materialized { collection } => {
                collection.retain(&mut |r| r.uuid().is_some_and(|u| theirs.contains(u)));
            }
        }
        Ok(self)
    }

    /// Drop members that are in `other`.
    pub fn difference_update<I>(&mut self, other: I) -> Result<&mut Self, LazyError>
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        match &mut self.state {
            SetState::Lazy { uuids } => uuids.retain(|u| !theirs.contains(u)),
            SetState::Materialized { collection } => {
                collection.retain(&mut |r| !r.uuid().is_some_and(|u| theirs.contains(u)));
            }
        }
        Ok(self)
    }

    /// Keep members of exactly one side.
    ///
    /// Once materialized, records entering the set are fetched with one
    /// `filter` call.
    pub fn symmetric_difference_update<I>(&mut self, other: I) -> Result<&mut Self, LazyError>
    where
        I: IntoIterator,
        I::Item: TaskLike,
    {
        let theirs = uuids_of(other);
        match &mut self.state {
            SetState::Lazy { uuids } => {
                for uuid in theirs {
                    if !uuids.remove(&uuid) {
                        uuids.insert(uuid);
                    }
                }
            }
            SetState::Materialized { collection } => {
                let (shared, entering): (HashSet<_>, HashSet<_>) =
                    theirs.into_iter().partition(|u| collection.contains(u));
                fetch_into(&self.backend, collection, &entering)?;
                collection.retain(&mut |r| !r.uuid().is_some_and(|u| shared.contains(u)));
            }
        }
        Ok(self)
    }

    // ── mutators ────────────────────────────────────────────────────────

    /// Add one task. Returns whether it was newly added.
    ///
    /// Fails with [`LazyError::MissingUuid`] for values without a uuid. Once
    /// materialized, a new member's record is fetched with `get`.
    pub fn add(&mut self, task: &impl TaskLike) -> Result<bool, LazyError> {
        let uuid = task.task_uuid().ok_or(LazyError::MissingUuid)?;
        match &mut self.state {
            SetState::Lazy { uuids } => Ok(uuids.insert(uuid)),
            SetState::Materialized { collection } => {
                if collection.contains(&uuid) {
                    return Ok(false);
                }
                collection.insert(self.backend.store().get(&uuid)?);
                Ok(true)
            }
        }
    }

    /// Remove one task and return it. Fails with [`LazyError::NotFound`] if
    /// it is not a member.
    pub fn remove(&mut self, task: &impl TaskLike) -> Result<LazyTask<S>, LazyError> {
        let uuid = task.task_uuid().ok_or(LazyError::MissingUuid)?;
        match &mut self.state {
            SetState::Lazy { uuids } => {
                if uuids.remove(&uuid) {
                    Ok(LazyTask::new(self.backend.clone(), uuid))
                } else {
                    Err(LazyError::NotFound { uuid })
                }
            }
            SetState::Materialized { collection } => match collection.remove(&uuid) {
                Some(record) => Ok(LazyTask::with_record(self.backend.clone(), uuid, record)),
                None => Err(LazyError::NotFound { uuid }),
            },
        }
    }

    /// Remove and return an arbitrary member. Fails with
    /// [`LazyError::EmptyCollection`] on an empty set.
    ///
    /// A fetched collection whose records carry no uuid fails with
    /// [`LazyError::MissingUuid`] and is left untouched.
    pub fn pop(&mut self) -> Result<LazyTask<S>, LazyError> {
        match &mut self.state {
            SetState::Lazy { uuids } => {
                let uuid = uuids.iter().next().cloned().ok_or(LazyError::EmptyCollection)?;
                uuids.remove(&uuid);
                Ok(LazyTask::new(self.backend.clone(), uuid))
            }
            SetState::Materialized { collection } => {
                if collection.is_empty() {
                    return Err(LazyError::EmptyCollection);
                }
                let uuid = collection
                    .records()
                    .iter()
                    .rev()
                    .find_map(|r| r.uuid().cloned())
                    .ok_or(LazyError::MissingUuid)?;
                let record = collection
                    .remove(&uuid)
                    .ok_or_else(|| LazyError::not_found(&uuid))?;
                Ok(LazyTask::with_record(self.backend.clone(), uuid, record))
            }
        }
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        match &mut self.state {
            SetState::Lazy { uuids } => uuids.clear(),
            SetState::Materialized { collection } => collection.clear(),
        }
    }

    // ── materialization and delegation ──────────────────────────────────

    /// Replace the uuid set with the fetched collection (once) and return it.
    ///
    /// Issues a single `filter` call whose query is the sorted member uuids
    /// joined by the store's separator. An empty set becomes an empty
    /// collection without a backend call. On failure the set stays lazy.
    #[instrument(level = "debug", skip(self), fields(members = self.len()))]
    pub fn materialize(&mut self) -> Result<&mut S::Collection, LazyError> {
        self.fetched()
    }

    fn fetched(&mut self) -> Result<&mut S::Collection, LazyError> {
        match self.state {
            SetState::Materialized { ref mut collection } => Ok(collection),
            SetState::Lazy { ref uuids } => {
                let collection = fetch_collection(&self.backend, uuids)?;
                self.state = SetState::Materialized { collection };
                self.fetched()
            }
        }
    }

    /// Borrow the fetched collection, materializing first if needed.
    pub fn collection(&mut self) -> Result<&S::Collection, LazyError> {
        self.materialize().map(|c| &*c)
    }

    /// Take the fetched collection, materializing first if needed.
    pub fn into_collection(self) -> Result<S::Collection, LazyError> {
        match self.state {
            SetState::Lazy { uuids } => fetch_collection(&self.backend, &uuids),
            SetState::Materialized { collection } => Ok(collection),
        }
    }

    /// Borrow the fetched records.
    pub fn records(&mut self) -> Result<&[S::Record], LazyError> {
        Ok(self.materialize()?.records())
    }

    /// Borrow the fetched record for `uuid`. Fails with
    /// [`LazyError::NotFound`] if the collection has no such record.
    pub fn get(&mut self, uuid: &TaskUuid) -> Result<&S::Record, LazyError> {
        self.materialize()?
            .get(uuid)
            .ok_or_else(|| LazyError::not_found(uuid))
    }

    /// Read one field from every record, in collection order. Records
    /// lacking the field yield `None`.
    pub fn field_values(&mut self, name: &str) -> Result<Vec<Option<Value>>, LazyError> {
        Ok(self
            .materialize()?
            .records()
            .iter()
            .map(|r| r.field(name))
            .collect())
    }

    /// Set one field on every record. Returns how many records were touched.
    ///
    /// [`ID_FIELD`] is refused up front with [`LazyError::ImmutableUuid`],
    /// without materializing. Otherwise the first record-level error is
    /// returned after every record has been visited.
    pub fn set_field_all(&mut self, name: &str, value: &Value) -> Result<usize, LazyError> {
        if name == ID_FIELD {
            return Err(LazyError::immutable_uuid());
        }
        let collection = self.materialize()?;
        let mut touched = 0;
        let mut first_err = None;
        collection.for_each_mut(&mut |r| match r.set_field(name, value.clone()) {
            Ok(()) => touched += 1,
            Err(err) => {
                first_err.get_or_insert(err);
            }
        });
        debug!(field = name, touched, "bulk field update");
        first_err.map_or(Ok(touched), Err)
    }
}

/// Iterator over a [`LazyTaskSet`]'s members as [`LazyTask`]s.
pub struct LazyTaskSetIter<'a, S: TaskStore> {
    backend: &'a Backend<S>,
    inner: IterInner<'a, S>,
}

enum IterInner<'a, S: TaskStore> {
    Lazy(hash_set::Iter<'a, TaskUuid>),
    Materialized(std::slice::Iter<'a, S::Record>),
}

impl<S: TaskStore> Iterator for LazyTaskSetIter<'_, S> {
    type Item = LazyTask<S>;

    fn next(&mut self) -> Option<Self::Item> {
        let backend = self.backend;
        match &mut self.inner {
            IterInner::Lazy(uuids) => uuids
                .next()
                .map(|uuid| LazyTask::new(backend.clone(), uuid.clone())),
            IterInner::Materialized(records) => records.find_map(|record| {
                let uuid = record.uuid()?.clone();
                Some(LazyTask::with_record(backend.clone(), uuid, record.clone()))
            }),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IterInner::Lazy(uuids) => uuids.size_hint(),
            IterInner::Materialized(records) => (0, records.size_hint().1),
        }
    }
}

impl<'a, S: TaskStore> IntoIterator for &'a LazyTaskSet<S> {
    type Item = LazyTask<S>;
    type IntoIter = LazyTaskSetIter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: TaskStore> Clone for LazyTaskSet<S> {
    fn clone(&self) -> Self {
        let state = match &self.state {
            SetState::Lazy { uuids } => SetState::Lazy {
                uuids: uuids.clone(),
            },
            SetState::Materialized { collection } => SetState::Materialized {
                collection: collection.clone(),
            },
        };
        Self {
            backend: self.backend.clone(),
            state,
        }
    }
}

impl<S: TaskStore> PartialEq for LazyTaskSet<S> {
    fn eq(&self, other: &Self) -> bool {
        self.members() == other.members()
    }
}

impl<S: TaskStore> Eq for LazyTaskSet<S> {}

/// Subset ordering: `a <= b` is `a.is_subset(&b)`, `a >= b` is
/// `a.is_superset(&b)`. Sets that overlap only partially are unordered.
impl<S: TaskStore> PartialOrd for LazyTaskSet<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (mine, theirs) = (self.members(), other.members());
        if mine == theirs {
            Some(Ordering::Equal)
        } else if mine.is_subset(&theirs) {
            Some(Ordering::Less)
        } else if mine.is_superset(&theirs) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl<S: TaskStore> fmt::Debug for LazyTaskSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_materialized() {
            "materialized"
        } else {
            "lazy"
        };
        let members = self.members();
        f.debug_struct("LazyTaskSet")
            .field("state", &state)
            .field("uuids", &sorted(members.iter()))
            .finish_non_exhaustive()
    }
}

impl<S: TaskStore> fmt::Display for LazyTaskSet<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members = self.members();
        write!(f, "LazyTaskSet([{}])", sorted(members.iter()).join(", "))
    }
}

impl<S: TaskStore, I> BitOr<I> for &LazyTaskSet<S>
where
    I: IntoIterator,
    I::Item: TaskLike,
{
    type Output = LazyTaskSet<S>;

    fn bitor(self, rhs: I) -> LazyTaskSet<S> {
        self.union(rhs)
    }
}

impl<S: TaskStore, I> BitAnd<I> for &LazyTaskSet<S>
where
    I: IntoIterator,
    I::Item: TaskLike,
{
    type Output = LazyTaskSet<S>;

    fn bitand(self, rhs: I) -> LazyTaskSet<S> {
        self.intersection(rhs)
    }
}

impl<S: TaskStore, I> Sub<I> for &LazyTaskSet<S>
where
    I: IntoIterator,
    I::Item: TaskLike,
{
    type Output = LazyTaskSet<S>;

    fn sub(self, rhs: I) -> LazyTaskSet<S> {
        self.difference(rhs)
    }
}

impl<S: TaskStore, I> BitXor<I> for &LazyTaskSet<S>
where
    I: IntoIterator,
    I::Item: TaskLike,
{
    type Output = LazyTaskSet<S>;

    fn bitxor(self, rhs: I) -> LazyTaskSet<S> {
        self.symmetric_difference(rhs)
    }
}
