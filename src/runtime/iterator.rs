//! Iterator protocol and the array/string iterators

use crate::builtins::NativeArgs;
use crate::error::{JsError, JsResult};
use crate::gc::{GcScope, Handle, ObjectHandle, ObjectId};
use crate::object::{JsObject, ObjectKind, Property, PropertyFlags};
use crate::value::{JsValue, PropertyKey, to_uint32};

use super::Runtime;

/// An open iterator: the iterator object and its cached `next` method
pub struct IteratorRecord<'s> {
    pub iterator: ObjectHandle<'s>,
    pub next_method: Handle<'s>,
}

impl Runtime {
    /// GetIterator(value, sync)
    pub fn get_iterator<'s>(
        &mut self,
        scope: &'s GcScope,
        value: &JsValue,
    ) -> JsResult<IteratorRecord<'s>> {
        let key = PropertyKey::Symbol(self.symbol_iterator());
        let method = scope.handle(self.get_value(value, &key)?);
        if !self.is_callable(method.get()) {
            return Err(JsError::type_error(format!(
                "{} is not iterable",
                self.describe_value(value)
            )));
        }
        let iterator = scope.handle(self.call(method.get(), value.clone(), &[])?);
        let iterator = iterator.as_object().ok_or_else(|| {
            JsError::type_error("Result of the Symbol.iterator method is not an object")
        })?;
        let next_method = scope.handle(self.get_named(iterator.id(), "next")?);
        Ok(IteratorRecord {
            iterator,
            next_method,
        })
    }

    /// IteratorStep: the next result object, or `None` once `done` is truthy
    pub fn iterator_step<'s>(
        &mut self,
        scope: &'s GcScope,
        record: &IteratorRecord<'_>,
    ) -> JsResult<Option<ObjectHandle<'s>>> {
        let result = scope.handle(self.call(
            record.next_method.get(),
            record.iterator.value(),
            &[],
        )?);
        let Some(result) = result.as_object() else {
            return Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                self.describe_value(result.get())
            )));
        };
        let done = self.get_named(result.id(), "done")?;
        Ok(if done.to_boolean() { None } else { Some(result) })
    }

    /// CreateIterResultObject
    pub fn create_iter_result(&mut self, value: JsValue, done: bool) -> ObjectId {
        let scope = self.gc_scope();
        let value = scope.handle(value);
        let result = self.create_object();
        if let Ok(object) = self.object_mut(result) {
            object.insert_property(
                PropertyKey::from("value"),
                Property::data(value.value(), PropertyFlags::default_new()),
            );
            object.insert_property(
                PropertyKey::from("done"),
                Property::data(JsValue::Boolean(done), PropertyFlags::default_new()),
            );
        }
        result
    }
}

/// Array.prototype[@@iterator]
pub(super) fn array_values(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let target = rt.to_object(args.this())?;
    let prototype = rt.realm.array_iterator_prototype;
    let mut iterator = JsObject::with_prototype(Some(prototype));
    iterator.kind = ObjectKind::ArrayIterator {
        target,
        next_index: 0,
        done: false,
    };
    Ok(JsValue::Object(rt.alloc(iterator)))
}

/// %ArrayIteratorPrototype%.next
pub(super) fn array_iterator_next(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let incompatible = || JsError::type_error("next method called on incompatible receiver");
    let iterator = args.this().as_object().ok_or_else(incompatible)?;
    let ObjectKind::ArrayIterator {
        target,
        next_index,
        done,
    } = rt.object(iterator)?.kind
    else {
        return Err(incompatible());
    };
    if done {
        return Ok(JsValue::Object(rt.create_iter_result(JsValue::Undefined, true)));
    }

    let length = if rt.object(target)?.is_array() {
        rt.array_length(target)?
    } else {
        let length = rt.get_named(target, "length")?;
        to_uint32(rt.to_number(&length)?)
    };
    if next_index >= length {
        if let ObjectKind::ArrayIterator { done, .. } = &mut rt.object_mut(iterator)?.kind {
            *done = true;
        }
        return Ok(JsValue::Object(rt.create_iter_result(JsValue::Undefined, true)));
    }

    let value = rt.get(target, &PropertyKey::Index(next_index), &JsValue::Object(target))?;
    if let ObjectKind::ArrayIterator { next_index, .. } = &mut rt.object_mut(iterator)?.kind {
        *next_index += 1;
    }
    Ok(JsValue::Object(rt.create_iter_result(value, false)))
}

/// String.prototype[@@iterator]
pub(super) fn string_iterator(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let string = match args.this() {
        JsValue::String(s) => s.clone(),
        JsValue::Object(id) => match rt.primitive_value(*id)? {
            Some(JsValue::String(s)) => s,
            _ => return Err(JsError::type_error("String iterator called on a non-string")),
        },
        _ => return Err(JsError::type_error("String iterator called on a non-string")),
    };
    let prototype = rt.realm.string_iterator_prototype;
    let mut iterator = JsObject::with_prototype(Some(prototype));
    iterator.kind = ObjectKind::StringIterator {
        string,
        position: 0,
    };
    Ok(JsValue::Object(rt.alloc(iterator)))
}

/// %StringIteratorPrototype%.next, one code point per step
pub(super) fn string_iterator_next(rt: &mut Runtime, args: &NativeArgs) -> JsResult<JsValue> {
    let incompatible = || JsError::type_error("next method called on incompatible receiver");
    let iterator = args.this().as_object().ok_or_else(incompatible)?;
    let ObjectKind::StringIterator { string, position } = &mut rt.object_mut(iterator)?.kind else {
        return Err(incompatible());
    };
    let next = string.as_str().get(*position..).and_then(|rest| rest.chars().next());
    let value = match next {
        Some(ch) => {
            *position += ch.len_utf8();
            JsValue::from(ch.to_string())
        }
        None => return Ok(JsValue::Object(rt.create_iter_result(JsValue::Undefined, true))),
    };
    Ok(JsValue::Object(rt.create_iter_result(value, false)))
}
