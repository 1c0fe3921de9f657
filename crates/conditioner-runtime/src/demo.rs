//! # Demo Modules
//!
//! | Path | Methods |
//! |------|---------|
//! | `demo/echo` | `echo(args…)` → args, `label()` → `options.label` |
//! | `demo/counter` | `increment(step?)` → new count, `count()` |
//!
//! The counter publishes `count` on its own emitter after every increment.

use cn_02_module_controller::{BaseModule, Capabilities, Module, ModuleContext, StaticResolver};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_types::ModuleError;
use std::sync::Arc;

pub const ECHO: &str = "demo/echo";
pub const COUNTER: &str = "demo/counter";

/// Register every demo module with `resolver`.
pub fn register(resolver: &StaticResolver) {
    resolver.register(ECHO, echo);
    resolver.register(COUNTER, counter);
}

fn echo(context: ModuleContext) -> Result<Box<dyn Module>, ModuleError> {
    let label = context.option("label").cloned().unwrap_or(Value::Null);
    let capabilities = Capabilities::new()
        .with("echo", |args: &[Value]| Ok(Value::Array(args.to_vec())))
        .with("label", move |_: &[Value]| Ok(label.clone()));
    Ok(Box::new(BaseModule::new(context, capabilities)))
}

fn counter(context: ModuleContext) -> Result<Box<dyn Module>, ModuleError> {
    let start = context
        .option("start")
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| ModuleError::Instantiation("option start must be an integer".into()))
        })
        .transpose()?
        .unwrap_or(0);
    let count = Arc::new(Mutex::new(start));

    let publisher = context.clone();
    let increments = Arc::clone(&count);
    let reads = Arc::clone(&count);
    let capabilities = Capabilities::new()
        .with("increment", move |args: &[Value]| {
            let step = match args.first() {
                None => 1,
                Some(v) => v
                    .as_i64()
                    .ok_or_else(|| ModuleError::method("increment", "step must be an integer"))?,
            };
            let value = {
                let mut count = increments.lock();
                *count += step;
                *count
            };
            publisher.publish("count", json!({ "count": value }));
            Ok(json!(value))
        })
        .with("count", move |_: &[Value]| Ok(json!(*reads.lock())));
    Ok(Box::new(BaseModule::new(context, capabilities)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::EventBus;
    use shared_types::EmitterId;

    fn context(options: Value) -> ModuleContext {
        ModuleContext {
            host: None,
            options,
            bus: Arc::new(EventBus::new()),
            emitter: EmitterId::new(),
        }
    }

    fn call(module: &dyn Module, method: &str, args: &[Value]) -> Result<Value, ModuleError> {
        let method = module.capabilities().get(method).unwrap();
        method(args)
    }

    #[test]
    fn test_echo() {
        let module = echo(context(json!({"label": "menu"}))).unwrap();
        assert_eq!(call(&*module, "echo", &[json!(1), json!("a")]).unwrap(), json!([1, "a"]));
        assert_eq!(call(&*module, "label", &[]).unwrap(), json!("menu"));
    }

    #[test]
    fn test_counter_publishes() {
        let ctx = context(json!({"start": 5}));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        ctx.bus.subscribe(ctx.emitter, "count", move |event| {
            sink.lock().push(event.payload["count"].clone())
        });

        let module = counter(ctx).unwrap();
        assert_eq!(call(&*module, "increment", &[]).unwrap(), json!(6));
        assert_eq!(call(&*module, "increment", &[json!(4)]).unwrap(), json!(10));
        assert!(call(&*module, "increment", &[json!("x")]).is_err());
        assert_eq!(call(&*module, "count", &[]).unwrap(), json!(10));
        assert_eq!(*seen.lock(), vec![json!(6), json!(10)]);
    }

    #[test]
    fn test_counter_rejects_bad_start() {
        assert!(counter(context(json!({"start": "x"}))).is_err());
    }
}
