//! Component trait and sparse per-kind storage.
//!
//! Every component kind lives in its own [`ComponentColumn`], a sparse array
//! indexed by entity slot. Columns are type-erased behind [`ErasedColumn`]
//! so the [`ComponentStore`](crate::store::ComponentStore) can strip all of an
//! entity's components on destruction and snapshot the whole table without
//! knowing the concrete kinds.

use std::any::Any;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker for types that can be attached to an entity.
///
/// `NAME` is used in diagnostics ([`EcsError::MissingComponent`](crate::EcsError))
/// and as the key of the column in store snapshots, so it must be unique.
pub trait Component: Serialize + 'static {
    /// Stable, human-readable name of the component kind.
    const NAME: &'static str;
}

// ---------------------------------------------------------------------------
// ComponentColumn
// ---------------------------------------------------------------------------

/// Sparse storage for one component kind, indexed by entity slot.
#[derive(Debug)]
pub struct ComponentColumn<T> {
    data: Vec<Option<T>>,
}

impl<T> Default for ComponentColumn<T> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

impl<T> ComponentColumn<T> {
    /// Create an empty column.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value for `index`.
    pub fn insert(&mut self, index: u32, value: T) {
        let idx = index as usize;
        if idx >= self.data.len() {
            self.data.resize_with(idx + 1, || None);
        }
        self.data[idx] = Some(value);
    }

    /// Remove and return the value for `index`.
    pub fn take(&mut self, index: u32) -> Option<T> {
        self.data.get_mut(index as usize).and_then(Option::take)
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.data.get(index as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.data.get_mut(index as usize).and_then(Option::as_mut)
    }

    /// Occupied `(slot, value)` pairs in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.as_ref().map(|v| (idx as u32, v)))
    }

    /// Mutable variant of [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .filter_map(|(idx, v)| v.as_mut().map(|v| (idx as u32, v)))
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// ErasedColumn
// ---------------------------------------------------------------------------

/// Object-safe view of a [`ComponentColumn`] used by the store for
/// kind-agnostic bookkeeping.
pub trait ErasedColumn: Any {
    /// Registered name of the stored kind.
    fn name(&self) -> &'static str;
    /// Drop the value at `index`, if any.
    fn remove(&mut self, index: u32);
    /// Drop every value.
    fn clear(&mut self);
    /// Serialize occupied slots as `[[slot, value], ...]`.
    fn snapshot(&self) -> serde_json::Value;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedColumn for ComponentColumn<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn remove(&mut self, index: u32) {
        self.take(index);
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn snapshot(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .iter()
            .map(|(slot, value)| {
                serde_json::json!([
                    slot,
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
                ])
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Pos {
        x: f32,
        y: f32,
    }

    impl Component for Pos {
        const NAME: &'static str = "pos";
    }

    #[test]
    fn insert_grows_and_overwrites() {
        let mut col = ComponentColumn::new();
        col.insert(5, Pos { x: 1.0, y: 2.0 });
        assert_eq!(col.len(), 1);
        assert!(col.get(4).is_none());
        col.insert(5, Pos { x: 3.0, y: 4.0 });
        assert_eq!(col.get(5), Some(&Pos { x: 3.0, y: 4.0 }));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn take_leaves_hole() {
        let mut col = ComponentColumn::new();
        col.insert(0, Pos { x: 0.0, y: 0.0 });
        col.insert(1, Pos { x: 1.0, y: 1.0 });
        assert!(col.take(0).is_some());
        assert!(col.take(0).is_none());
        let slots: Vec<u32> = col.iter().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![1]);
    }

    #[test]
    fn erased_snapshot_lists_slots() {
        let mut col = ComponentColumn::new();
        col.insert(2, Pos { x: 1.5, y: -1.0 });
        let erased: &dyn ErasedColumn = &col;
        assert_eq!(erased.name(), "pos");
        assert_eq!(
            erased.snapshot(),
            serde_json::json!([[2, {"x": 1.5, "y": -1.0}]])
        );
    }
}
