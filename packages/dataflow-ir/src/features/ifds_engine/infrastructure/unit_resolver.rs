//! Built-in Unit Resolvers.
//!
//! The engine is generic over the caller's `Method` type, so every
//! built-in resolver here is parameterised by a caller-supplied key
//! function rather than reaching into concrete IR fields, the same
//! pattern the flow-function contract uses to stay IR-agnostic.

use super::super::ports::UnitResolver;
use crate::shared::models::UnitId;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// One shard per method: maximal scheduling granularity, maximal
/// message-passing overhead.
pub struct MethodUnitResolver<M, K> {
    key: K,
    _marker: PhantomData<fn(&M)>,
}

impl<M, K> MethodUnitResolver<M, K>
where
    K: Fn(&M) -> String,
{
    pub fn new(key: K) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }
}

impl<M, K> UnitResolver<M> for MethodUnitResolver<M, K>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
    K: Fn(&M) -> String + Send + Sync,
{
    fn resolve(&self, method: &M) -> UnitId {
        UnitId::Method((self.key)(method))
    }
}

/// One shard per declaring class. `collapse_to_outer` strips a trailing
/// `$Inner` (or similarly nested-class) suffix so that an outer class and
/// its inner classes share a shard. Useful when those classes are
/// expected to call each other heavily and splitting them would just
/// generate extra `SubscriptionOnStart` traffic.
pub struct ClassUnitResolver<M, K> {
    key: K,
    collapse_to_outer: bool,
    _marker: PhantomData<fn(&M)>,
}

impl<M, K> ClassUnitResolver<M, K>
where
    K: Fn(&M) -> String,
{
    pub fn new(key: K) -> Self {
        Self {
            key,
            collapse_to_outer: false,
            _marker: PhantomData,
        }
    }

    pub fn collapsing_inner_classes(mut self) -> Self {
        self.collapse_to_outer = true;
        self
    }
}

impl<M, K> UnitResolver<M> for ClassUnitResolver<M, K>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
    K: Fn(&M) -> String + Send + Sync,
{
    fn resolve(&self, method: &M) -> UnitId {
        let mut class_name = (self.key)(method);
        if self.collapse_to_outer {
            if let Some(idx) = class_name.find('$') {
                class_name.truncate(idx);
            }
        }
        UnitId::Class(class_name)
    }
}

/// One shard per package/namespace: coarser than per-class, trades
/// cross-unit messaging for more work concentrated in fewer Runners.
pub struct PackageUnitResolver<M, K> {
    key: K,
    _marker: PhantomData<fn(&M)>,
}

impl<M, K> PackageUnitResolver<M, K>
where
    K: Fn(&M) -> String,
{
    pub fn new(key: K) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }
}

impl<M, K> UnitResolver<M> for PackageUnitResolver<M, K>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
    K: Fn(&M) -> String + Send + Sync,
{
    fn resolve(&self, method: &M) -> UnitId {
        UnitId::Package((self.key)(method))
    }
}

/// A single shard for the whole run: no cross-unit messaging at all, at
/// the cost of zero parallelism across Runners. Useful as a baseline, or
/// for small inputs where the message-passing overhead would dominate.
pub struct SingletonUnitResolver<M> {
    _marker: PhantomData<fn(&M)>,
}

impl<M> SingletonUnitResolver<M> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<M> Default for SingletonUnitResolver<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> UnitResolver<M> for SingletonUnitResolver<M>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
{
    fn resolve(&self, _method: &M) -> UnitId {
        UnitId::Singleton
    }
}

/// An arbitrary caller-supplied assignment, for callers whose sharding
/// policy doesn't fit the four built-ins.
pub struct CustomUnitResolver<M> {
    assign: Box<dyn Fn(&M) -> UnitId + Send + Sync>,
}

impl<M> CustomUnitResolver<M> {
    pub fn new(assign: impl Fn(&M) -> UnitId + Send + Sync + 'static) -> Self {
        Self {
            assign: Box::new(assign),
        }
    }
}

impl<M> UnitResolver<M> for CustomUnitResolver<M>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
{
    fn resolve(&self, method: &M) -> UnitId {
        (self.assign)(method)
    }
}

/// Memoizes another resolver's `resolve` behind a lock-free concurrent
/// cache. Resolution must already be a pure function of the method,
/// so caching never changes the result. It only
/// matters when the wrapped resolver does real work per call (e.g.
/// `ClassUnitResolver` deriving a name from a slower lookup than a plain
/// field access), and when many Runner tasks call `resolve` concurrently
/// for the same hot methods (cross-unit call resolution in the Manager).
pub struct CachingUnitResolver<M, R> {
    inner: R,
    cache: DashMap<M, UnitId>,
}

impl<M, R> CachingUnitResolver<M, R>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
    R: UnitResolver<M>,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Number of distinct methods resolved (and cached) so far.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Borrows the wrapped resolver, mainly so tests can inspect its state.
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<M, R> UnitResolver<M> for CachingUnitResolver<M, R>
where
    M: Clone + Eq + Hash + Debug + Send + Sync,
    R: UnitResolver<M>,
{
    fn resolve(&self, method: &M) -> UnitId {
        if let Some(cached) = self.cache.get(method) {
            return cached.clone();
        }
        let resolved = self.inner.resolve(method);
        self.cache.insert(method.clone(), resolved.clone());
        resolved
    }
}
