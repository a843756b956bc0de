#![no_main]

use libfuzzer_sys::fuzz_target;
use jsnative::{BuiltinMethod, JsValue, Runtime, RuntimeConfig};

const MAX_CALLS: usize = 64;
const MAX_ARGS: usize = 8;

/// Decode one argument from the byte stream. Objects are picked from `pool`.
fn decode_value(rt: &mut Runtime, pool: &[JsValue], bytes: &mut impl Iterator<Item = u8>) -> JsValue {
    let tag = bytes.next().unwrap_or(0);
    let payload = bytes.next().unwrap_or(0);
    match tag % 8 {
        0 => JsValue::Undefined,
        1 => JsValue::Null,
        2 => JsValue::Boolean(payload & 1 == 1),
        3 => JsValue::from(i32::from(payload as i8)),
        4 => JsValue::from(f64::from(payload) / 3.0),
        5 => JsValue::from(String::from_utf8_lossy(&[payload]).as_ref()),
        6 => JsValue::Symbol(rt.create_symbol(None)),
        _ => pool
            .get(usize::from(payload) % pool.len().max(1))
            .cloned()
            .unwrap_or(JsValue::Undefined),
    }
}

fuzz_target!(|data: &[u8]| {
    let config = RuntimeConfig {
        gc_threshold: 1,
        ..RuntimeConfig::default()
    };
    let mut rt = Runtime::with_config(config);
    let module = rt.create_module("fuzz");
    let scope = rt.gc_scope();

    // Objects arguments can refer to: plain, array, and function values
    let mut pool = Vec::new();
    for _ in 0..2 {
        pool.push(scope.handle(JsValue::Object(rt.create_object())).value());
        pool.push(scope.handle(JsValue::Object(rt.create_array(0))).value());
    }
    let function = rt.create_code_function(module, "f", |_, _| Ok(JsValue::Undefined));
    pool.push(scope.handle(JsValue::Object(function)).value());

    let mut bytes = data.iter().copied();
    for _ in 0..MAX_CALLS {
        let Some(selector) = bytes.next() else {
            break;
        };
        let method = BuiltinMethod::ALL[usize::from(selector) % BuiltinMethod::ALL.len()];
        let argc = usize::from(bytes.next().unwrap_or(0)) % (MAX_ARGS + 1);

        let result = {
            let call_scope = rt.gc_scope();
            let mut args = Vec::with_capacity(argc);
            for _ in 0..argc {
                let value = decode_value(&mut rt, &pool, &mut bytes);
                args.push(call_scope.handle(value).value());
            }

            // Half the calls come from compiled code so frame-sensitive built-ins run
            if selector & 0x80 == 0 {
                rt.call_builtin(method, &args)
            } else {
                let caller = rt.create_code_function(module, "caller", move |rt, _| {
                    rt.call_builtin(method, &args)
                });
                rt.call(&JsValue::Object(caller), JsValue::Undefined, &[])
            }
        };
        // Rooted in the outer scope only after the call scope is gone
        if let Ok(value) = result {
            pool.push(scope.handle(value).value());
        }
        assert_eq!(rt.call_depth(), 0);
    }
});
