//! Mark-and-sweep garbage collection over a generational slot arena.
//!
//! Objects are addressed by [`ObjectId`]: a slot index plus the generation the
//! slot had when the object was allocated. Sweeping a slot bumps its
//! generation, so an id that outlived its object is detected on access instead
//! of silently aliasing whatever reuses the slot.
//!
//! Roots come from two places: the handle stack shared by every [`GcScope`],
//! and whatever extra roots the owner passes to [`Heap::collect`].

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::value::JsValue;

/// Default threshold: collect after this many allocations
pub const DEFAULT_GC_THRESHOLD: usize = 100;

// ============================================================================
// ObjectId
// ============================================================================

/// Reference to a heap slot, valid while the object it was allocated for lives.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Slot index (stable for the lifetime of the object)
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

// ============================================================================
// Traceable trait - for discovering object references
// ============================================================================

/// Trait for types that can be traced by the garbage collector.
///
/// The GC calls `trace()` during the mark phase; implementations report every
/// [`ObjectId`] stored in their fields.
pub trait Traceable {
    fn trace(&self, visitor: &mut dyn FnMut(ObjectId));
}

impl Traceable for JsValue {
    fn trace(&self, visitor: &mut dyn FnMut(ObjectId)) {
        if let JsValue::Object(id) = self {
            visitor(*id);
        }
    }
}

// ============================================================================
// Heap
// ============================================================================

struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// Shared handle stack. Scopes push onto it and truncate it when dropped.
type RootStack = Rc<RefCell<Vec<ObjectId>>>;

/// Arena of GC-managed objects
pub struct Heap<T: Traceable> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    roots: RootStack,
    allocs_since_gc: usize,
    gc_threshold: usize,
    collections: usize,
}

impl<T: Traceable> Heap<T> {
    pub fn new(gc_threshold: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            roots: Rc::new(RefCell::new(Vec::new())),
            allocs_since_gc: 0,
            gc_threshold,
            collections: 0,
        }
    }

    /// Store `data` in a free slot. Never collects; the owner decides when
    /// to collect (see [`Heap::should_collect`]).
    pub fn alloc(&mut self, data: T) -> ObjectId {
        self.allocs_since_gc += 1;
        if let Some(index) = self.free_list.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.data = Some(data);
                return ObjectId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, id: ObjectId) -> Option<&T> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.data.as_mut()
    }

    /// Check whether `id` still refers to a live object
    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    /// True once enough allocations happened since the last collection
    pub fn should_collect(&self) -> bool {
        self.gc_threshold > 0 && self.allocs_since_gc >= self.gc_threshold
    }

    /// Open a new root scope
    pub fn create_scope(&self) -> GcScope {
        GcScope::new(self.roots.clone())
    }

    /// Run mark-and-sweep. Roots are every scope handle plus `extra_roots`.
    /// Returns the number of objects collected.
    pub fn collect<I: IntoIterator<Item = ObjectId>>(&mut self, extra_roots: I) -> usize {
        let mut marked = vec![false; self.slots.len()];
        let mut stack: Vec<ObjectId> = self.roots.borrow().clone();
        stack.extend(extra_roots);

        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            let Some(mark) = marked.get_mut(id.index as usize) else {
                continue;
            };
            if *mark {
                continue;
            }
            *mark = true;
            if let Some(data) = &slot.data {
                data.trace(&mut |child| stack.push(child));
            }
        }

        let mut collected = 0;
        for (index, (slot, is_marked)) in self.slots.iter_mut().zip(marked).enumerate() {
            if slot.data.is_some() && !is_marked {
                slot.data = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
                collected += 1;
            }
        }

        self.allocs_since_gc = 0;
        self.collections += 1;
        log::debug!(
            "gc: collected {} objects, {} live",
            collected,
            self.live_count()
        );
        collected
    }

    fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn stats(&self) -> GcStats {
        GcStats {
            live_objects: self.live_count(),
            free_slots: self.free_list.len(),
            scope_roots: self.roots.borrow().len(),
            collections: self.collections,
            gc_threshold: self.gc_threshold,
        }
    }

    pub fn gc_threshold(&self) -> usize {
        self.gc_threshold
    }

    /// Set the GC threshold (0 = disable automatic collection)
    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.gc_threshold = threshold;
    }
}

// ============================================================================
// GcScope - RAII root scope
// ============================================================================

/// A lexical root scope.
///
/// Every handle created through a scope keeps its object alive until the
/// scope is dropped, on every exit path. Scopes nest LIFO: while an inner
/// scope is alive, create handles only through the inner one.
pub struct GcScope {
    roots: RootStack,
    base: usize,
}

impl GcScope {
    fn new(roots: RootStack) -> Self {
        let base = roots.borrow().len();
        Self { roots, base }
    }

    /// Root `value` (if it is an object) for the lifetime of this scope
    pub fn handle(&self, value: JsValue) -> Handle<'_> {
        if let JsValue::Object(id) = value {
            self.push(id);
        }
        Handle {
            value,
            _scope: PhantomData,
        }
    }

    /// Root an object for the lifetime of this scope
    pub fn object(&self, id: ObjectId) -> ObjectHandle<'_> {
        self.push(id);
        ObjectHandle {
            id,
            _scope: PhantomData,
        }
    }

    /// Number of roots registered by this scope
    pub fn len(&self) -> usize {
        self.roots.borrow().len().saturating_sub(self.base)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, id: ObjectId) {
        let mut roots = self.roots.borrow_mut();
        debug_assert!(roots.len() >= self.base, "GcScope used after an outer scope was dropped");
        roots.push(id);
    }
}

impl Drop for GcScope {
    fn drop(&mut self) {
        self.roots.borrow_mut().truncate(self.base);
    }
}

// ============================================================================
// Handles
// ============================================================================

/// A value rooted by the scope `'s`
#[derive(Clone, Debug)]
pub struct Handle<'s> {
    value: JsValue,
    _scope: PhantomData<&'s GcScope>,
}

impl<'s> Handle<'s> {
    pub fn get(&self) -> &JsValue {
        &self.value
    }

    pub fn value(&self) -> JsValue {
        self.value.clone()
    }

    /// Narrow to an object handle; the root is already held by the same scope
    pub fn as_object(&self) -> Option<ObjectHandle<'s>> {
        self.value.as_object().map(|id| ObjectHandle {
            id,
            _scope: PhantomData,
        })
    }
}

/// An object rooted by the scope `'s`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObjectHandle<'s> {
    id: ObjectId,
    _scope: PhantomData<&'s GcScope>,
}

impl ObjectHandle<'_> {
    pub fn id(self) -> ObjectId {
        self.id
    }

    pub fn value(self) -> JsValue {
        JsValue::Object(self.id)
    }
}

// ============================================================================
// GcStats - statistics about the GC
// ============================================================================

/// Statistics about the garbage collector
#[derive(Debug, Clone)]
pub struct GcStats {
    /// Objects currently allocated
    pub live_objects: usize,
    /// Slots waiting for reuse
    pub free_slots: usize,
    /// Handles held by open scopes
    pub scope_roots: usize,
    /// Completed collection cycles
    pub collections: usize,
    pub gc_threshold: usize,
}

// ============================================================================
// Tests
// ============================================================================
