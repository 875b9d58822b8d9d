use indexmap::IndexMap;
use std::path::PathBuf;

pub type EntityId = usize;

/// Insertion-ordered collection keyed by a stable integer identifier. Ids
/// are allocated monotonically and never reused, so a result from an
/// in-flight async operation can be detected as stale after its row was
/// removed instead of landing on an unrelated entity.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    next_id: EntityId,
    entries: IndexMap<EntityId, T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { next_id: 0, entries: IndexMap::new() }
    }

    pub fn insert(&mut self, value: T) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    /// Applies `f` if the id is still live. A stale id is the expected
    /// outcome of an async result arriving after removal, so it is a silent
    /// no-op; the return value only reports whether anything happened.
    pub fn update(&mut self, id: EntityId, f: impl FnOnce(&mut T)) -> bool {
        match self.entries.get_mut(&id) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Removes by identity, keeping the order of the remaining entries.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        self.entries.shift_remove(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.entries.iter_mut().map(|(id, value)| (*id, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.keys().copied()
    }
}

/// A body part groups the candidate models the compiled output can switch
/// between. Models live in their own arena one level down, mutated through
/// the owning part in the same tick.
#[derive(Debug, Clone)]
pub struct BodyPart {
    pub name: String,
    pub models: Arena<ModelSlot>,
}

impl Default for BodyPart {
    fn default() -> Self {
        Self { name: String::from("New Body Group"), models: Arena::new() }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSlot {
    pub name: String,
    /// A blank model contributes no mesh to its body part.
    pub blank: bool,
    pub source: Option<PathBuf>,
    /// One slot per part of the source file; `None` means that named mesh
    /// part is excluded for this variant. `None` overall means no source
    /// has finished loading yet.
    pub part_selection: Option<Vec<Option<String>>>,
}

impl Default for ModelSlot {
    fn default() -> Self {
        Self { name: String::from("New Model"), blank: false, source: None, part_selection: None }
    }
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub name: String,
    pub source: Option<PathBuf>,
    /// Which animation of the source file to use; `None` falls back to the
    /// first one the file offers at assembly time.
    pub source_animation: Option<String>,
}

impl Default for Animation {
    fn default() -> Self {
        Self { name: String::from("New Animation"), source: None, source_animation: None }
    }
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: String,
    /// Row-major grid of animation names driving the sequence's blending.
    /// Empty cells are empty strings; grid position is meaningful to the
    /// downstream compiler and must survive assembly untouched.
    pub grid: Vec<Vec<String>>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self { name: String::from("New Sequence"), grid: Vec::new() }
    }
}

/// The in-memory model-under-construction. Pure data; the session wires it
/// to the reference cache, the model itself never touches file lifetimes.
#[derive(Debug, Clone, Default)]
pub struct EditModel {
    pub model_name: String,
    pub export_path: Option<PathBuf>,
    pub body_parts: Arena<BodyPart>,
    pub animations: Arena<Animation>,
    pub sequences: Arena<Sequence>,
}

impl EditModel {
    pub fn model_slot(&self, part: EntityId, model: EntityId) -> Option<&ModelSlot> {
        self.body_parts.get(part).and_then(|body_part| body_part.models.get(model))
    }

    pub fn model_slot_mut(&mut self, part: EntityId, model: EntityId) -> Option<&mut ModelSlot> {
        self.body_parts.get_mut(part).and_then(|body_part| body_part.models.get_mut(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut arena: Arena<Animation> = Arena::new();
        let first = arena.insert(Animation::default());
        let second = arena.insert(Animation::default());
        arena.remove(first);
        let third = arena.insert(Animation::default());
        assert!(third > second, "removed ids must not be reissued");
        assert!(!arena.contains(first));
    }

    #[test]
    fn update_after_remove_is_a_no_op() {
        let mut arena: Arena<Animation> = Arena::new();
        let id = arena.insert(Animation::default());
        arena.remove(id);
        let applied = arena.update(id, |animation| animation.name = String::from("idle"));
        assert!(!applied);
        assert!(arena.is_empty());
    }

    #[test]
    fn removal_preserves_order_of_the_rest() {
        let mut arena: Arena<Sequence> = Arena::new();
        let a = arena.insert(Sequence { name: "a".into(), grid: Vec::new() });
        let b = arena.insert(Sequence { name: "b".into(), grid: Vec::new() });
        let c = arena.insert(Sequence { name: "c".into(), grid: Vec::new() });
        arena.remove(b);
        let order: Vec<EntityId> = arena.ids().collect();
        assert_eq!(order, vec![a, c]);
    }
}
