//! Scripting backend (ES modules on QuickJS).
//!
//! Per call:
//! - a fresh `Runtime` + `Context` with heap and stack ceilings,
//! - an interrupt handler polling a wall-clock deadline,
//! - no module loader (imports fail), no filesystem or network globals;
//!   only a `console` shim forwarding to `tracing`.
//!
//! The entry point is invoked as `entry(profile, phdr)`. Its return value is
//! sorted into [`ReturnValue`]; interpretation is left to the classifier.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{
    Array, CatchResultExt, CaughtError, Context, Ctx, Function, Module, Object, Runtime, Value,
};
use serde_json::Value as Json;

use scitt_policy_core::{NativeInput, PolicyError, Result};

use super::{Evaluation, ResourceLimits, Timings};

/// Log target for `console.*` calls made by policies.
pub const SCRIPT_LOG_TARGET: &str = "scitt_policy::script";

/// Raw return value of an entry point, sorted by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnValue {
    /// Primitive non-empty string.
    Reason(String),
    /// Any other value that is truthy by JS rules.
    Truthy,
    /// Falsy value, stringified for diagnostics.
    Falsy(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    Returned(ReturnValue),
    Failed(PolicyError),
}

/// Shared wall-clock deadline polled by the interrupt handler.
#[derive(Clone, Default)]
struct Deadline(Arc<Mutex<Option<Instant>>>);

impl Deadline {
    fn arm(&self, budget: Duration) {
        if let Ok(mut g) = self.0.lock() {
            *g = Instant::now().checked_add(budget);
        }
    }

    fn disarm(&self) {
        if let Ok(mut g) = self.0.lock() {
            *g = None;
        }
    }

    fn expired(&self) -> bool {
        // Poisoned lock: interrupt rather than run unbounded.
        match self.0.lock() {
            Ok(g) => g.is_some_and(|d| Instant::now() >= d),
            Err(_) => true,
        }
    }
}

/// Compile `source` as module `name`, then call its `entry` export with the
/// marshaled input under `limits`.
pub fn evaluate_script(
    source: &str,
    name: &str,
    entry: &str,
    input: &NativeInput,
    limits: &ResourceLimits,
) -> Evaluation<ScriptOutcome> {
    let mut timings = Timings::default();
    let outcome = match run(source, name, entry, input, limits, &mut timings) {
        Ok(ret) => ScriptOutcome::Returned(ret),
        Err(e) => ScriptOutcome::Failed(e),
    };
    Evaluation { outcome, timings }
}

fn run(
    source: &str,
    name: &str,
    entry: &str,
    input: &NativeInput,
    limits: &ResourceLimits,
    timings: &mut Timings,
) -> Result<ReturnValue> {
    let compile_started = Instant::now();

    let rt = Runtime::new().map_err(|e| execution(format!("failed to create runtime: {e}")))?;
    rt.set_memory_limit(limits.max_heap_bytes);
    rt.set_max_stack_size(limits.max_stack_bytes);

    let deadline = Deadline::default();
    let watchdog = deadline.clone();
    rt.set_interrupt_handler(Some(Box::new(move || watchdog.expired())));

    let ctx =
        Context::full(&rt).map_err(|e| execution(format!("failed to create context: {e}")))?;

    ctx.with(|ctx| {
        install_console(&ctx, name)
            .map_err(|e| execution(format!("failed to install globals: {e}")))?;

        let apply = load_entry_point(&ctx, source, name, entry, &deadline, limits)?;

        let compiled = compile_started.elapsed();
        timings.compile = Some(compiled);
        tracing::info!(policy = %name, elapsed_us = micros(compiled), "JS policy compilation took");

        let phdr = json_to_js(&ctx, input.phdr())
            .map_err(|e| PolicyError::Input(format!("failed to marshal protected header: {e}")))?;

        let exec_started = Instant::now();
        deadline.arm(limits.max_execution_time);
        let result = apply
            .call::<_, Value>((input.profile().as_str(), phdr))
            .catch(&ctx)
            .and_then(|v| settle(&ctx, v));
        deadline.disarm();

        let elapsed = exec_started.elapsed();
        timings.execution = Some(elapsed);
        tracing::info!(policy = %name, elapsed_us = micros(elapsed), "JS policy execution took");

        match result {
            Ok(value) => Ok(classify_return(&value)),
            Err(err) => Err(execution_failure(err, elapsed, limits)),
        }
    })
}

/// Declare and evaluate the module, then resolve the entry-point export.
/// Top-level code runs under the same time ceiling as the call itself.
fn load_entry_point<'js>(
    ctx: &Ctx<'js>,
    source: &str,
    name: &str,
    entry: &str,
    deadline: &Deadline,
    limits: &ResourceLimits,
) -> Result<Function<'js>> {
    let declared = Module::declare(ctx.clone(), name, source)
        .catch(ctx)
        .map_err(|e| PolicyError::Module(describe(e).0))?;

    deadline.arm(limits.max_execution_time);
    let evaluated = declared.eval().catch(ctx).and_then(|(module, promise)| {
        promise.finish::<()>().catch(ctx).map(|_| module)
    });
    deadline.disarm();
    let module = evaluated.map_err(|e| PolicyError::Module(describe(e).0))?;

    module
        .get::<_, Function>(entry)
        .catch(ctx)
        .map_err(|e| {
            PolicyError::Module(format!(
                "failed to resolve export '{entry}' of '{name}': {}",
                describe(e).0
            ))
        })
}

/// An `async` entry point returns a promise; drive it to completion so its
/// settled value is what gets classified.
fn settle<'js>(
    ctx: &Ctx<'js>,
    value: Value<'js>,
) -> std::result::Result<Value<'js>, CaughtError<'js>> {
    match value.as_promise() {
        Some(promise) => promise.finish::<Value>().catch(ctx),
        None => Ok(value),
    }
}

fn classify_return(value: &Value<'_>) -> ReturnValue {
    if let Some(s) = value.as_string() {
        return match s.to_string() {
            Ok(s) if s.is_empty() => ReturnValue::Falsy(String::new()),
            Ok(s) => ReturnValue::Reason(s),
            Err(_) => ReturnValue::Reason(well_formed(value)),
        };
    }

    match value.get::<Coerced<bool>>() {
        Ok(Coerced(true)) => ReturnValue::Truthy,
        _ => ReturnValue::Falsy(stringify(value)),
    }
}

/// Lone UTF-16 surrogates cannot cross into Rust; replace them with U+FFFD
/// so an ill-formed string still reads as a rejection reason.
fn well_formed(value: &Value<'_>) -> String {
    const REPAIR: &str = r"(s) => s.replace(/[\uD800-\uDBFF](?![\uDC00-\uDFFF])|(?<![\uD800-\uDBFF])[\uDC00-\uDFFF]/g, '\uFFFD')";
    value
        .ctx()
        .eval::<Function, _>(REPAIR)
        .and_then(|repair| repair.call::<_, String>((value.clone(),)))
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string())
}

fn stringify(value: &Value<'_>) -> String {
    value
        .get::<Coerced<String>>()
        .map(|c| c.0)
        .unwrap_or_else(|_| format!("<{:?}>", value.type_of()))
}

/// Message and optional stack trace of a caught error.
fn describe(err: CaughtError<'_>) -> (String, Option<String>) {
    match err {
        CaughtError::Exception(ex) => {
            let message = ex
                .message()
                .unwrap_or_else(|| "uncaught exception".to_string());
            (message, ex.stack().filter(|s| !s.trim().is_empty()))
        }
        CaughtError::Value(v) => (stringify(&v), None),
        CaughtError::Error(e) => (e.to_string(), None),
    }
}

fn execution_failure(err: CaughtError<'_>, elapsed: Duration, limits: &ResourceLimits) -> PolicyError {
    let (message, trace) = describe(err);
    let message = if elapsed >= limits.max_execution_time {
        format!(
            "execution time limit of {}ms exceeded ({message})",
            limits.max_execution_time.as_millis()
        )
    } else {
        message
    };
    PolicyError::Execution { message, trace }
}

fn execution(message: String) -> PolicyError {
    PolicyError::Execution {
        message,
        trace: None,
    }
}

fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

fn install_console(ctx: &Ctx<'_>, policy: &str) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    for method in ["log", "info", "warn", "error", "debug"] {
        let policy = policy.to_string();
        let f = Function::new(ctx.clone(), move |args: Rest<Coerced<String>>| {
            let line = args
                .0
                .into_iter()
                .map(|c| c.0)
                .collect::<Vec<_>>()
                .join(" ");
            tracing::info!(target: SCRIPT_LOG_TARGET, policy = %policy, method, "{line}");
        })?;
        console.set(method, f)?;
    }
    ctx.globals().set("console", console)?;
    Ok(())
}

/// Integers that fit `i32` become JS ints; wider ones become doubles.
fn json_to_js<'js>(ctx: &Ctx<'js>, v: &Json) -> rquickjs::Result<Value<'js>> {
    Ok(match v {
        Json::Null => Value::new_null(ctx.clone()),
        Json::Bool(b) => Value::new_bool(ctx.clone(), *b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => match i32::try_from(i) {
                Ok(small) => Value::new_int(ctx.clone(), small),
                Err(_) => Value::new_float(ctx.clone(), i as f64),
            },
            None => Value::new_float(ctx.clone(), n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => rquickjs::String::from_str(ctx.clone(), s)?.into_value(),
        Json::Array(items) => {
            let arr = Array::new(ctx.clone())?;
            for (i, item) in items.iter().enumerate() {
                arr.set(i, json_to_js(ctx, item)?)?;
            }
            arr.into_value()
        }
        Json::Object(map) => {
            let obj = Object::new(ctx.clone())?;
            for (k, item) in map {
                obj.set(k.as_str(), json_to_js(ctx, item)?)?;
            }
            obj.into_value()
        }
    })
}
