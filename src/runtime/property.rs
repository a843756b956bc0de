//! Property operations: define, get, put, delete, enumeration and conversions
//!
//! `define_own_property` follows ValidateAndApplyPropertyDescriptor, with the
//! array exotic rules for indices and `length` layered on top. Rejections
//! surface as `Ok(false)`, or as a TypeError when the caller passes
//! [`PropOpFlags::THROW`].

use crate::error::{JsError, JsResult};
use crate::gc::ObjectId;
use crate::object::{
    JsObject, ObjectKind, PropOpFlags, Property, PropertyDescriptor, PropertyFlags, PropertySlot,
};
use crate::value::{InternalSlot, JsValue, PropertyKey, same_value, to_uint32};

use super::Runtime;

fn reject(flags: PropOpFlags, message: impl FnOnce() -> String) -> JsResult<bool> {
    if flags.throw_on_error {
        Err(JsError::type_error(message()))
    } else {
        Ok(false)
    }
}

fn length_flags(writable: bool) -> PropertyFlags {
    PropertyFlags {
        writable,
        enumerable: false,
        configurable: false,
    }
}

impl Runtime {
    // ------------------------------------------------------------------------
    // Own property lookup
    // ------------------------------------------------------------------------

    /// Own property of `obj`, including the virtual `length` of arrays
    pub fn get_own_property(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<Option<Property>> {
        let object = self.object(obj)?;
        if let ObjectKind::Array {
            length,
            length_writable,
        } = object.kind
        {
            if key.eq_str("length") {
                return Ok(Some(Property::data(
                    JsValue::from(length),
                    length_flags(length_writable),
                )));
            }
        }
        Ok(object.stored_property(key).cloned())
    }

    pub fn has_own_property(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let object = self.object(obj)?;
        Ok((object.is_array() && key.eq_str("length")) || object.stored_property(key).is_some())
    }

    // ------------------------------------------------------------------------
    // [[DefineOwnProperty]]
    // ------------------------------------------------------------------------

    pub fn define_own_property(
        &mut self,
        obj: ObjectId,
        key: PropertyKey,
        desc: PropertyDescriptor,
        flags: PropOpFlags,
    ) -> JsResult<bool> {
        let array_length = match self.object(obj)?.kind {
            ObjectKind::Array {
                length,
                length_writable,
            } => Some((length, length_writable)),
            _ => None,
        };
        let Some((length, length_writable)) = array_length else {
            return self.ordinary_define_own_property(obj, &key, desc, flags);
        };

        if key.eq_str("length") {
            return self.array_set_length(obj, desc, flags);
        }
        let PropertyKey::Index(index) = key else {
            return self.ordinary_define_own_property(obj, &key, desc, flags);
        };
        if index >= length && !length_writable {
            return reject(flags, || {
                format!("Cannot define index {} past the read-only array length", index)
            });
        }
        if !self.ordinary_define_own_property(obj, &key, desc, flags)? {
            return Ok(false);
        }
        if index >= length {
            set_array_length(self.object_mut(obj)?, index + 1);
        }
        Ok(true)
    }

    fn ordinary_define_own_property(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
        flags: PropOpFlags,
    ) -> JsResult<bool> {
        let object = self.object_mut(obj)?;
        let extensible = object.extensible;

        let Some(current) = object.stored_property_mut(key) else {
            if !extensible {
                return reject(flags, || {
                    format!("Cannot define property {}, object is not extensible", key)
                });
            }
            let property = if desc.is_accessor() {
                Property {
                    slot: PropertySlot::Accessor {
                        getter: desc.getter.unwrap_or_default(),
                        setter: desc.setter.unwrap_or_default(),
                    },
                    flags: PropertyFlags {
                        writable: false,
                        enumerable: desc.enumerable.unwrap_or(false),
                        configurable: desc.configurable.unwrap_or(false),
                    },
                }
            } else {
                Property::data(
                    desc.value.unwrap_or_default(),
                    PropertyFlags {
                        writable: desc.writable.unwrap_or(false),
                        enumerable: desc.enumerable.unwrap_or(false),
                        configurable: desc.configurable.unwrap_or(false),
                    },
                )
            };
            object.insert_property(key.clone(), property);
            return Ok(true);
        };

        let is_data_desc = desc.value.is_some() || desc.writable.is_some();
        if !current.flags.configurable {
            let redefine = || format!("Cannot redefine property: {}", key);
            if desc.configurable == Some(true) {
                return reject(flags, redefine);
            }
            if desc.enumerable.is_some_and(|e| e != current.flags.enumerable) {
                return reject(flags, redefine);
            }
            if (desc.is_accessor() && !current.is_accessor())
                || (is_data_desc && current.is_accessor())
            {
                return reject(flags, redefine);
            }
            match &current.slot {
                PropertySlot::Data(value) if !current.flags.writable => {
                    if desc.writable == Some(true) {
                        return reject(flags, redefine);
                    }
                    if desc.value.as_ref().is_some_and(|v| !same_value(v, value)) {
                        return reject(flags, redefine);
                    }
                }
                PropertySlot::Accessor { getter, setter } => {
                    let changed = |new: &Option<JsValue>, old: &JsValue| {
                        new.as_ref().is_some_and(|v| !same_value(v, old))
                    };
                    if changed(&desc.getter, getter) || changed(&desc.setter, setter) {
                        return reject(flags, redefine);
                    }
                }
                PropertySlot::Data(_) => {}
            }
        }

        if desc.is_accessor() && !current.is_accessor() {
            current.slot = PropertySlot::Accessor {
                getter: JsValue::Undefined,
                setter: JsValue::Undefined,
            };
            current.flags.writable = false;
        } else if is_data_desc && current.is_accessor() {
            current.slot = PropertySlot::Data(JsValue::Undefined);
            current.flags.writable = false;
        }

        match &mut current.slot {
            PropertySlot::Data(value) => {
                if let Some(new) = desc.value {
                    *value = new;
                }
                if let Some(writable) = desc.writable {
                    current.flags.writable = writable;
                }
            }
            PropertySlot::Accessor { getter, setter } => {
                if let Some(new) = desc.getter {
                    *getter = new;
                }
                if let Some(new) = desc.setter {
                    *setter = new;
                }
            }
        }
        if let Some(enumerable) = desc.enumerable {
            current.flags.enumerable = enumerable;
        }
        if let Some(configurable) = desc.configurable {
            current.flags.configurable = configurable;
        }
        Ok(true)
    }

    /// ArraySetLength
    fn array_set_length(
        &mut self,
        obj: ObjectId,
        desc: PropertyDescriptor,
        flags: PropOpFlags,
    ) -> JsResult<bool> {
        let redefine = || "Cannot redefine property: length".to_string();
        if desc.is_accessor() || desc.configurable == Some(true) || desc.enumerable == Some(true) {
            return reject(flags, redefine);
        }

        let new_len = match &desc.value {
            Some(value) => {
                let number = self.to_number(value)?;
                let len = to_uint32(number);
                if f64::from(len) != number {
                    return Err(JsError::range_error("Invalid array length"));
                }
                Some(len)
            }
            None => None,
        };

        let (old_len, writable) = self.array_length_slot(obj)?;
        if !writable && (desc.writable == Some(true) || new_len.is_some_and(|len| len != old_len)) {
            return reject(flags, || {
                "Cannot assign to read only property 'length' of object '[object Array]'".to_string()
            });
        }

        let object = self.object_mut(obj)?;
        let target_len = new_len.unwrap_or(old_len);
        let mut final_len = target_len;
        if target_len < old_len {
            let doomed: Vec<u32> = object.elements.range(target_len..).map(|(i, _)| *i).collect();
            for index in doomed.into_iter().rev() {
                let configurable = object
                    .elements
                    .get(&index)
                    .is_some_and(|p| p.flags.configurable);
                if !configurable {
                    final_len = index + 1;
                    break;
                }
                object.elements.remove(&index);
            }
        }
        set_array_length(object, final_len);
        if let (Some(false), ObjectKind::Array { length_writable, .. }) =
            (desc.writable, &mut object.kind)
        {
            *length_writable = false;
        }
        if final_len != target_len {
            return reject(flags, || {
                format!("Cannot delete array element {}", final_len - 1)
            });
        }
        Ok(true)
    }

    fn array_length_slot(&self, obj: ObjectId) -> JsResult<(u32, bool)> {
        match self.object(obj)?.kind {
            ObjectKind::Array {
                length,
                length_writable,
            } => Ok((length, length_writable)),
            _ => Err(JsError::type_error("not an array")),
        }
    }

    // ------------------------------------------------------------------------
    // [[Get]], [[Set]], [[Delete]]
    // ------------------------------------------------------------------------

    /// [[Get]] with `receiver` as `this` for getters
    pub fn get(&mut self, obj: ObjectId, key: &PropertyKey, receiver: &JsValue) -> JsResult<JsValue> {
        let mut current = Some(obj);
        while let Some(id) = current {
            match self.get_own_property(id, key)? {
                Some(Property {
                    slot: PropertySlot::Data(value),
                    ..
                }) => return Ok(value),
                Some(Property {
                    slot: PropertySlot::Accessor { getter, .. },
                    ..
                }) => {
                    if getter.is_undefined() {
                        return Ok(JsValue::Undefined);
                    }
                    return self.call(&getter, receiver.clone(), &[]);
                }
                None => current = self.object(id)?.prototype,
            }
        }
        Ok(JsValue::Undefined)
    }

    pub fn get_named(&mut self, obj: ObjectId, name: &str) -> JsResult<JsValue> {
        self.get(obj, &PropertyKey::from(name), &JsValue::Object(obj))
    }

    /// GetV: property lookup on any value; primitives read through their prototype
    pub fn get_value(&mut self, value: &JsValue, key: &PropertyKey) -> JsResult<JsValue> {
        let holder = match value {
            JsValue::Object(id) => *id,
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    value.to_js_string(),
                    key
                )));
            }
            JsValue::String(s) => {
                if key.eq_str("length") {
                    return Ok(JsValue::from(s.utf16_len()));
                }
                if let PropertyKey::Index(index) = key {
                    return Ok(s.code_unit_at(*index).map(JsValue::String).unwrap_or_default());
                }
                self.realm.string_prototype
            }
            _ => self.realm.object_prototype,
        };
        self.get(holder, key, value)
    }

    /// [[Set]] with `obj` as the receiver. Runs setters found on the
    /// prototype chain; otherwise writes an own data property.
    pub fn put(
        &mut self,
        obj: ObjectId,
        key: PropertyKey,
        value: JsValue,
        flags: PropOpFlags,
    ) -> JsResult<bool> {
        let mut current = Some(obj);
        let mut found = None;
        while let Some(id) = current {
            if let Some(property) = self.get_own_property(id, &key)? {
                found = Some((id, property));
                break;
            }
            current = self.object(id)?.prototype;
        }

        match found {
            Some((_, Property {
                slot: PropertySlot::Accessor { setter, .. },
                ..
            })) => {
                if setter.is_undefined() {
                    return reject(flags, || {
                        format!("Cannot set property {} which has only a getter", key)
                    });
                }
                self.call(&setter, JsValue::Object(obj), &[value])?;
                Ok(true)
            }
            Some((_, property)) if !property.flags.writable => reject(flags, || {
                format!("Cannot assign to read only property '{}' of object", key)
            }),
            Some((owner, _)) if owner == obj => {
                let desc = PropertyDescriptor {
                    value: Some(value),
                    ..PropertyDescriptor::default()
                };
                self.define_own_property(obj, key, desc, flags)
            }
            _ => self.define_own_property(obj, key, PropertyDescriptor::data(value), flags),
        }
    }

    pub fn delete_property(&mut self, obj: ObjectId, key: &PropertyKey, flags: PropOpFlags) -> JsResult<bool> {
        let object = self.object_mut(obj)?;
        let configurable = if object.is_array() && key.eq_str("length") {
            Some(false)
        } else {
            object.stored_property(key).map(|p| p.flags.configurable)
        };
        match configurable {
            None => Ok(true),
            Some(true) => {
                object.remove_property(key);
                Ok(true)
            }
            Some(false) => reject(flags, || format!("Cannot delete property '{}'", key)),
        }
    }

    // ------------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------------

    /// Visit own properties: indexed keys ascending, then named keys in
    /// definition order. Internal slots are never visited. Keys are
    /// snapshotted up front; a property deleted by an earlier visitor is
    /// skipped and flags are read at visit time. Returns `Ok(false)` when a
    /// visitor asked to stop.
    pub fn for_each_own_property_while<I, N>(
        &mut self,
        obj: ObjectId,
        mut indexed: I,
        named: N,
    ) -> JsResult<bool>
    where
        I: FnMut(&mut Runtime, u32, PropertyFlags) -> JsResult<bool>,
        N: FnMut(&mut Runtime, &PropertyKey, PropertyFlags) -> JsResult<bool>,
    {
        let indices: Vec<u32> = self.object(obj)?.elements.keys().copied().collect();
        for index in indices {
            let flags = self.object(obj)?.elements.get(&index).map(|p| p.flags);
            let Some(flags) = flags else {
                continue;
            };
            if !indexed(self, index, flags)? {
                return Ok(false);
            }
        }
        self.for_each_named_property_while(obj, named)
    }

    /// Named half of [`Runtime::for_each_own_property_while`]
    pub fn for_each_named_property_while<N>(&mut self, obj: ObjectId, mut named: N) -> JsResult<bool>
    where
        N: FnMut(&mut Runtime, &PropertyKey, PropertyFlags) -> JsResult<bool>,
    {
        let object = self.object(obj)?;
        let mut keys = Vec::with_capacity(object.properties.len() + 1);
        if object.is_array() {
            keys.push(PropertyKey::from("length"));
        }
        keys.extend(object.properties.keys().filter(|k| !k.is_internal()).cloned());

        for key in keys {
            let Some(property) = self.get_own_property(obj, &key)? else {
                continue;
            };
            if !named(self, &key, property.flags)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Own keys in enumeration order, enumerable or not
    pub fn own_property_keys(&mut self, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let mut keys = Vec::new();
        let mut named_keys = Vec::new();
        self.for_each_own_property_while(
            obj,
            |_, index, _| {
                keys.push(PropertyKey::Index(index));
                Ok(true)
            },
            |_, key, _| {
                named_keys.push(key.clone());
                Ok(true)
            },
        )?;
        keys.append(&mut named_keys);
        Ok(keys)
    }

    // ------------------------------------------------------------------------
    // Extensibility and prototype
    // ------------------------------------------------------------------------

    pub fn prevent_extensions(&mut self, obj: ObjectId) -> JsResult<bool> {
        self.object_mut(obj)?.extensible = false;
        Ok(true)
    }

    pub fn is_extensible(&self, obj: ObjectId) -> JsResult<bool> {
        Ok(self.object(obj)?.extensible)
    }

    /// [[SetPrototypeOf]]
    pub fn set_prototype(
        &mut self,
        obj: ObjectId,
        prototype: Option<ObjectId>,
        flags: PropOpFlags,
    ) -> JsResult<bool> {
        let object = self.object(obj)?;
        if object.prototype == prototype {
            return Ok(true);
        }
        if !object.extensible {
            return reject(flags, || "#<Object> is not extensible".to_string());
        }
        let mut cursor = prototype;
        while let Some(id) = cursor {
            if id == obj {
                return reject(flags, || "Cyclic __proto__ value".to_string());
            }
            cursor = self.object(id)?.prototype;
        }
        self.object_mut(obj)?.prototype = prototype;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------------

    /// ToObject. Strings become wrappers exposing their characters as
    /// read-only indexed properties.
    pub fn to_object(&mut self, value: &JsValue) -> JsResult<ObjectId> {
        let primitive_slot = |value: &JsValue| {
            Property::data(value.clone(), PropertyFlags::constant())
        };
        let wrapper = match value {
            JsValue::Object(id) => return Ok(*id),
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(
                    "Cannot convert undefined or null to object",
                ));
            }
            JsValue::String(s) => {
                let mut wrapper = JsObject::with_prototype(Some(self.realm.string_prototype));
                let mut count = 0u32;
                for (index, unit) in s.code_units().enumerate() {
                    wrapper.insert_property(
                        PropertyKey::Index(index as u32),
                        Property::data(JsValue::String(unit), PropertyFlags::frozen_element()),
                    );
                    count += 1;
                }
                wrapper.insert_property(
                    PropertyKey::from("length"),
                    Property::data(JsValue::from(count), PropertyFlags::constant()),
                );
                wrapper.insert_property(
                    PropertyKey::Internal(InternalSlot::PrimitiveValue),
                    primitive_slot(value),
                );
                wrapper
            }
            JsValue::Boolean(_) | JsValue::Number(_) | JsValue::Symbol(_) => {
                let mut wrapper = JsObject::with_prototype(Some(self.realm.object_prototype));
                wrapper.insert_property(
                    PropertyKey::Internal(InternalSlot::PrimitiveValue),
                    primitive_slot(value),
                );
                wrapper
            }
        };
        Ok(self.alloc(wrapper))
    }

    /// [[PrimitiveValue]] of a wrapper object
    pub fn primitive_value(&self, obj: ObjectId) -> JsResult<Option<JsValue>> {
        Ok(self
            .object(obj)?
            .stored_property(&PropertyKey::Internal(InternalSlot::PrimitiveValue))
            .and_then(|p| p.value().cloned()))
    }

    /// ToPrimitive with hint "number": `valueOf`, then `toString`
    pub fn to_primitive(&mut self, value: &JsValue) -> JsResult<JsValue> {
        let JsValue::Object(id) = value else {
            return Ok(value.clone());
        };
        for method in ["valueOf", "toString"] {
            let func = self.get_named(*id, method)?;
            if self.is_callable(&func) {
                let result = self.call(&func, value.clone(), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error("Cannot convert object to primitive value"))
    }

    /// ToNumber
    pub fn to_number(&mut self, value: &JsValue) -> JsResult<f64> {
        match value {
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s.as_str())),
            JsValue::Symbol(_) => Err(JsError::type_error(
                "Cannot convert a Symbol value to a number",
            )),
            JsValue::Object(_) => {
                let primitive = self.to_primitive(value)?;
                self.to_number(&primitive)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Array helpers
    // ------------------------------------------------------------------------

    /// The array's internal length slot
    pub fn array_length(&self, obj: ObjectId) -> JsResult<u32> {
        Ok(self.array_length_slot(obj)?.0)
    }

    /// Element `index` straight from storage: holes and accessors read as undefined
    pub fn array_element_at(&self, obj: ObjectId, index: u32) -> JsResult<JsValue> {
        Ok(self
            .object(obj)?
            .elements
            .get(&index)
            .and_then(|p| p.value().cloned())
            .unwrap_or_default())
    }

    pub fn is_callable(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap.get(id))
            .is_some_and(JsObject::is_callable)
    }
}

fn set_array_length(object: &mut JsObject, new_length: u32) {
    if let ObjectKind::Array { length, .. } = &mut object.kind {
        *length = new_length;
    }
}

/// StringToNumber for decimal, hex, octal and binary literals
fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix_body = |prefix_lower: &str, prefix_upper: &str| {
        trimmed
            .strip_prefix(prefix_lower)
            .or_else(|| trimmed.strip_prefix(prefix_upper))
    };
    for (lower, upper, radix) in [("0x", "0X", 16), ("0o", "0O", 8), ("0b", "0B", 2)] {
        if let Some(digits) = radix_body(lower, upper) {
            return u64::from_str_radix(digits, radix).map_or(f64::NAN, |n| n as f64);
        }
    }
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rust also accepts "inf" and "nan", which are not numeric literals here
    if unsigned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
