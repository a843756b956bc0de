//! Per-module runtime state
//!
//! Each compiled module owns a template-object cache keyed by call-site id
//! and a table of CommonJS module factories reachable through `requireFast`.
//! Both live exactly as long as the module.

use rustc_hash::FxHashMap;

use crate::error::{JsError, JsResult};
use crate::gc::ObjectId;
use crate::object::PropertyDescriptor;
use crate::runtime::Runtime;
use crate::value::{JsString, JsValue, PropertyKey};

/// Slot of a module in the runtime's module arena. The generation tells a
/// destroyed module apart from a later one reusing its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    index: u32,
    generation: u32,
}

impl ModuleId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct ModuleSlot {
    generation: u32,
    module: Option<RuntimeModule>,
}

/// Generational slot arena of loaded modules. Destroyed slots are reused.
#[derive(Default)]
pub(crate) struct ModuleArena {
    slots: Vec<ModuleSlot>,
    free_list: Vec<u32>,
}

impl ModuleArena {
    fn insert(&mut self, module: RuntimeModule) -> ModuleId {
        if let Some(index) = self.free_list.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.module = Some(module);
                return ModuleId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(ModuleSlot {
            generation: 0,
            module: Some(module),
        });
        ModuleId {
            index,
            generation: 0,
        }
    }

    fn remove(&mut self, id: ModuleId) -> Option<RuntimeModule> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let module = slot.module.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        Some(module)
    }

    fn get(&self, id: ModuleId) -> Option<&RuntimeModule> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.module.as_ref()
    }

    fn get_mut(&mut self, id: ModuleId) -> Option<&mut RuntimeModule> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.module.as_mut()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RuntimeModule> + '_ {
        self.slots.iter().filter_map(|slot| slot.module.as_ref())
    }

    /// Number of slots ever allocated, live or free
    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// A CommonJS module registered for `requireFast`
#[derive(Debug, Clone)]
pub struct CjsModule {
    /// Called as `factory(exports, require, module)` on first require
    pub factory: JsValue,
    /// The `module` object, present once the factory has started running
    pub module_object: Option<ObjectId>,
}

/// Runtime state owned by one compiled module
#[derive(Debug)]
pub struct RuntimeModule {
    name: JsString,
    template_cache: FxHashMap<u32, ObjectId>,
    cjs_modules: FxHashMap<u32, CjsModule>,
}

impl RuntimeModule {
    fn new(name: JsString) -> Self {
        Self {
            name,
            template_cache: FxHashMap::default(),
            cjs_modules: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &JsString {
        &self.name
    }

    pub fn find_cached_template_object(&self, template_id: u32) -> Option<ObjectId> {
        self.template_cache.get(&template_id).copied()
    }

    /// Record the template object for `template_id`. Each id is cached once.
    pub fn cache_template_object(&mut self, template_id: u32, template: ObjectId) {
        debug_assert!(
            !self.template_cache.contains_key(&template_id),
            "template object {} cached twice",
            template_id
        );
        self.template_cache.entry(template_id).or_insert(template);
    }

    pub fn template_cache_len(&self) -> usize {
        self.template_cache.len()
    }

    pub fn cjs_module(&self, index: u32) -> Option<&CjsModule> {
        self.cjs_modules.get(&index)
    }

    /// Every object this module keeps alive
    pub(crate) fn roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        let templates = self.template_cache.values().copied();
        let cjs = self.cjs_modules.values().flat_map(|m| {
            m.factory
                .as_object()
                .into_iter()
                .chain(m.module_object)
        });
        templates.chain(cjs)
    }
}

impl Runtime {
    /// Create an empty module. Its caches start empty.
    pub fn create_module(&mut self, name: &str) -> ModuleId {
        let id = self.modules.insert(RuntimeModule::new(JsString::from(name)));
        log::debug!("module {} '{}' created", id.index, name);
        id
    }

    /// Destroy a module together with its template cache and CommonJS table
    pub fn destroy_module(&mut self, id: ModuleId) -> JsResult<()> {
        match self.modules.remove(id) {
            Some(module) => {
                log::debug!(
                    "module {} '{}' destroyed, {} cached templates released",
                    id.index,
                    module.name,
                    module.template_cache.len()
                );
                Ok(())
            }
            None => Err(JsError::type_error("Module already destroyed")),
        }
    }

    pub fn module(&self, id: ModuleId) -> JsResult<&RuntimeModule> {
        self.modules
            .get(id)
            .ok_or_else(|| JsError::type_error("Module is not loaded"))
    }

    pub fn module_mut(&mut self, id: ModuleId) -> JsResult<&mut RuntimeModule> {
        self.modules
            .get_mut(id)
            .ok_or_else(|| JsError::type_error("Module is not loaded"))
    }

    /// Register a CommonJS module factory under `index` in `module`
    pub fn register_cjs_module(
        &mut self,
        module: ModuleId,
        index: u32,
        factory: JsValue,
    ) -> JsResult<()> {
        if !self.is_callable(&factory) {
            return Err(JsError::type_error("CommonJS module factory must be a function"));
        }
        self.module_mut(module)?.cjs_modules.insert(
            index,
            CjsModule {
                factory,
                module_object: None,
            },
        );
        Ok(())
    }

    /// Load (once) and return the exports of CommonJS module `index`
    pub fn require_cjs(&mut self, module: ModuleId, index: u32) -> JsResult<JsValue> {
        let entry = self
            .module(module)?
            .cjs_module(index)
            .cloned()
            .ok_or_else(|| JsError::type_error(format!("Unable to find module with ID: {}", index)))?;

        if let Some(module_object) = entry.module_object {
            return self.get_named(module_object, "exports");
        }

        let scope = self.gc_scope();
        let exports = scope.object(self.create_object());
        let module_object = scope.object(self.create_object());
        self.define_own_property(
            module_object.id(),
            PropertyKey::from("exports"),
            PropertyDescriptor::data(exports.value()),
            crate::object::PropOpFlags::THROW,
        )?;

        // Recorded before running so a cyclic require sees the partial exports
        if let Some(cjs) = self.module_mut(module)?.cjs_modules.get_mut(&index) {
            cjs.module_object = Some(module_object.id());
        }

        self.call(
            &entry.factory,
            JsValue::Undefined,
            &[exports.value(), JsValue::Undefined, module_object.value()],
        )?;
        self.get_named(module_object.id(), "exports")
    }
}
