//! The [`ComponentStore`] is the table of entities: a generational allocator
//! plus one sparse column per component kind.
//!
//! The store holds no game logic. It creates handles, attaches and looks up
//! components, and destroys entities. Lookups come in two flavours:
//!
//! - [`get`](ComponentStore::get) / [`get_mut`](ComponentStore::get_mut)
//!   return `Option` for components that may legitimately be absent.
//! - [`require`](ComponentStore::require) / [`require_mut`](ComponentStore::require_mut)
//!   return `Result` for components a caller expects the entity to carry, so
//!   a wrongly shaped entity surfaces as [`EcsError::MissingComponent`]
//!   instead of being silently skipped.

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::component::{Component, ComponentColumn, ErasedColumn};
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

/// Entity table with per-kind component columns.
#[derive(Default)]
pub struct ComponentStore {
    allocator: EntityAllocator,
    columns: Vec<Box<dyn ErasedColumn>>,
    by_type: HashMap<TypeId, usize>,
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name()).collect();
        f.debug_struct("ComponentStore")
            .field("entities", &self.allocator.alive_count())
            .field("columns", &names)
            .finish()
    }
}

impl ComponentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- entity life-cycle --------------------------------------------------

    /// Allocate a new entity with no components.
    pub fn create(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Destroy an entity and drop all of its components.
    pub fn destroy(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if !self.allocator.deallocate(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        for column in &mut self.columns {
            column.remove(entity.index());
        }
        Ok(())
    }

    /// Whether `entity` is a live handle of the current generation.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Every live entity, in slot order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.allocator.alive_ids()
    }

    /// Destroy every entity. Handles issued before the call become stale.
    pub fn clear(&mut self) {
        for entity in self.allocator.alive_ids() {
            self.allocator.deallocate(entity);
        }
        for column in &mut self.columns {
            column.clear();
        }
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, replacing any previous value of that kind.
    pub fn insert<T: Component>(&mut self, entity: EntityId, value: T) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.column_mut_or_create::<T>().insert(entity.index(), value);
        Ok(())
    }

    /// Detach and return the `T` component of `entity`.
    pub fn remove<T: Component>(&mut self, entity: EntityId) -> Result<Option<T>, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        Ok(self.column_mut::<T>().and_then(|c| c.take(entity.index())))
    }

    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.column::<T>()?.get(entity.index())
    }

    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.column_mut::<T>()?.get_mut(entity.index())
    }

    pub fn has<T: Component>(&self, entity: EntityId) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Like [`get`](Self::get), but a stale handle or an absent component is
    /// an error naming the missing kind.
    pub fn require<T: Component>(&self, entity: EntityId) -> Result<&T, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.column::<T>()
            .and_then(|c| c.get(entity.index()))
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Mutable variant of [`require`](Self::require).
    pub fn require_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.column_mut::<T>()
            .and_then(|c| c.get_mut(entity.index()))
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    // -- iteration ----------------------------------------------------------

    /// Live entities carrying a `T`, in slot order.
    ///
    /// Returns an owned list so callers can mutate the store while walking it.
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.iter::<T>().map(|(entity, _)| entity).collect()
    }

    /// `(entity, &T)` for every live entity carrying a `T`.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        let allocator = &self.allocator;
        self.column::<T>()
            .into_iter()
            .flat_map(|c| c.iter())
            .filter_map(move |(slot, value)| allocator.id_at(slot).map(|id| (id, value)))
    }

    /// `(entity, &mut T)` for every live entity carrying a `T`.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        let allocator = &self.allocator;
        let column = self
            .by_type
            .get(&TypeId::of::<T>())
            .and_then(|&idx| self.columns.get_mut(idx))
            .and_then(|c| c.as_any_mut().downcast_mut::<ComponentColumn<T>>());
        column
            .into_iter()
            .flat_map(|c| c.iter_mut())
            .filter_map(move |(slot, value)| allocator.id_at(slot).map(|id| (id, value)))
    }

    // -- snapshot -----------------------------------------------------------

    /// Serialize every column as `{ name: [[slot, value], ...] }` with keys in
    /// sorted order, suitable for hashing.
    pub fn snapshot(&self) -> serde_json::Value {
        let map: BTreeMap<&str, serde_json::Value> = self
            .columns
            .iter()
            .map(|c| (c.name(), c.snapshot()))
            .collect();
        serde_json::json!({
            "entities": self.allocator.alive_ids(),
            "columns": map,
        })
    }

    // -- internal -----------------------------------------------------------

    fn column<T: Component>(&self) -> Option<&ComponentColumn<T>> {
        let idx = *self.by_type.get(&TypeId::of::<T>())?;
        self.columns.get(idx)?.as_any().downcast_ref()
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut ComponentColumn<T>> {
        let idx = *self.by_type.get(&TypeId::of::<T>())?;
        self.columns.get_mut(idx)?.as_any_mut().downcast_mut()
    }

    fn column_mut_or_create<T: Component>(&mut self) -> &mut ComponentColumn<T> {
        let idx = match self.by_type.get(&TypeId::of::<T>()) {
            Some(&idx) => idx,
            None => {
                assert!(
                    !self.columns.iter().any(|c| c.name() == T::NAME),
                    "component name '{}' is already used by a different type",
                    T::NAME
                );
                self.columns.push(Box::new(ComponentColumn::<T>::new()));
                let idx = self.columns.len() - 1;
                self.by_type.insert(TypeId::of::<T>(), idx);
                idx
            }
        };
        self.columns[idx]
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| unreachable!("column {idx} holds {}", T::NAME))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Pos {
        x: f32,
        y: f32,
    }

    impl Component for Pos {
        const NAME: &'static str = "position";
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Hp(u32);

    impl Component for Hp {
        const NAME: &'static str = "health";
    }

    #[test]
    fn destroy_strips_components() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.insert(e, Pos { x: 1.0, y: 2.0 }).unwrap();
        store.insert(e, Hp(3)).unwrap();
        store.destroy(e).unwrap();

        assert!(!store.is_alive(e));
        assert!(store.get::<Pos>(e).is_none());
        assert!(store.iter::<Hp>().next().is_none());
    }

    #[test]
    fn recycled_slot_does_not_inherit_components() {
        let mut store = ComponentStore::new();
        let e0 = store.create();
        store.insert(e0, Hp(9)).unwrap();
        store.destroy(e0).unwrap();

        let e1 = store.create();
        assert_eq!(e1.index(), e0.index());
        assert!(store.get::<Hp>(e1).is_none());
        assert!(store.get::<Hp>(e0).is_none());
    }

    #[test]
    fn require_reports_missing_kind() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.insert(e, Pos { x: 0.0, y: 0.0 }).unwrap();

        match store.require::<Hp>(e) {
            Err(EcsError::MissingComponent { component, .. }) => assert_eq!(component, "health"),
            other => panic!("expected MissingComponent, got {other:?}"),
        }
        assert!(store.require::<Pos>(e).is_ok());
    }

    #[test]
    fn require_on_stale_handle_is_error() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.insert(e, Hp(1)).unwrap();
        store.destroy(e).unwrap();
        assert!(matches!(
            store.require::<Hp>(e),
            Err(EcsError::StaleEntity { .. })
        ));
        assert!(store.insert(e, Hp(2)).is_err());
        assert!(store.destroy(e).is_err());
    }

    #[test]
    fn iter_mut_modifies_in_place() {
        let mut store = ComponentStore::new();
        let a = store.create();
        let b = store.create();
        store.insert(a, Hp(1)).unwrap();
        store.insert(b, Hp(5)).unwrap();

        for (_, hp) in store.iter_mut::<Hp>() {
            hp.0 += 1;
        }
        assert_eq!(store.get::<Hp>(a), Some(&Hp(2)));
        assert_eq!(store.get::<Hp>(b), Some(&Hp(6)));
        assert_eq!(store.entities_with::<Hp>(), vec![a, b]);
    }

    #[test]
    fn clear_empties_table() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.insert(e, Pos { x: 0.0, y: 0.0 }).unwrap();
        store.clear();
        assert_eq!(store.entity_count(), 0);
        assert!(store.entities_with::<Pos>().is_empty());
        assert!(!store.is_alive(e));
    }

    #[test]
    fn snapshot_is_keyed_by_name() {
        let mut store = ComponentStore::new();
        let e = store.create();
        store.insert(e, Hp(4)).unwrap();
        store.insert(e, Pos { x: 1.0, y: 1.0 }).unwrap();
        let snap = store.snapshot();
        let keys: Vec<&String> = snap["columns"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["health", "position"]);
    }
}
