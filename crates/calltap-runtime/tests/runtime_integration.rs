use anyhow::Result;
use calltap_runtime::{
    AsyncCallable, BoundArgs, CallArgs, CallCounter, CallHooks, Callable, FailingFunction,
    Function, Interceptor, Namespace,
};
use serde_json::{json, Value};
use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct Unavailable;

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("service unavailable")
    }
}

impl std::error::Error for Unavailable {}

// Records every hook invocation with the argument it saw
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl CallHooks for Recorder {
    fn pre_call(&self, args: &BoundArgs) {
        self.events
            .lock()
            .unwrap()
            .push(format!("before:{}", args.get("x").unwrap_or(&Value::Null)));
    }

    fn post_call(&self, _args: &BoundArgs, result: &Value) {
        self.events.lock().unwrap().push(format!("after:{}", result));
    }
}

fn square() -> Function {
    Function::new("square", ["x"], |args| {
        let x = args.get("x").and_then(Value::as_i64).unwrap_or_default();
        Ok(json!(x * x))
    })
}

#[test]
fn test_mock_function_scenario() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let call_log = order.clone();
    let mock_function = Function::new("mock_function", ["posarg", "kwarg"], move |args| {
        call_log.lock().unwrap().push("call");
        Ok(json!(format!(
            "{}{}",
            args.str("posarg").unwrap_or_default(),
            args.str("kwarg").unwrap_or_default()
        )))
    });

    let before = order.clone();
    let after = order.clone();
    let wrapped = Interceptor::with_hooks(
        mock_function,
        calltap_runtime::FnHooks::new()
            .before(move |_| before.lock().unwrap().push("before"))
            .after(move |_, _| after.lock().unwrap().push("after")),
    );

    let result = wrapped
        .call(CallArgs::new().arg("foo").kwarg("kwarg", "bar"))
        .unwrap();

    assert_eq!(result, json!("foobar"));
    assert_eq!(*order.lock().unwrap(), vec!["before", "call", "after"]);
}

#[test]
fn test_composed_wrappers() -> Result<()> {
    let recorder = Arc::new(Recorder::default());
    let flaky = FailingFunction::new(square(), || Unavailable, 2)?;
    let counted = CallCounter::new(flaky);
    let wrapped = Interceptor::with_hooks(counted, recorder.clone());

    for _ in 0..2 {
        let err = wrapped.call(CallArgs::new().arg(3)).unwrap_err();
        assert!(err.downcast_ref::<Unavailable>().is_some());
    }
    assert_eq!(wrapped.call(CallArgs::new().arg(3))?, json!(9));

    assert_eq!(wrapped.inner().times_called(), 1);
    assert_eq!(wrapped.inner().inner().attempts(), 3);
    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec!["before:3", "before:3", "before:3", "after:9"]
    );
    Ok(())
}

#[tokio::test]
async fn test_composed_wrappers_async() -> Result<()> {
    let wrapped = CallCounter::new(FailingFunction::new(square(), || Unavailable, 1)?);

    assert!(wrapped.call_async(CallArgs::new().arg(5)).await.is_err());
    assert_eq!(wrapped.call_async(CallArgs::new().arg(5)).await?, json!(25));
    assert_eq!(wrapped.times_called(), 1);
    Ok(())
}

#[test]
fn test_swap_failing_function_into_namespace() -> Result<()> {
    let ns = Namespace::new("math", json!({}));
    ns.define("square", Arc::new(square()));

    {
        let failing = FailingFunction::new(
            ns.get("square").unwrap(),
            || Unavailable,
            FailingFunction::INFINITY,
        )?;
        let _guard = ns.swap("square", Arc::new(failing))?;
        for i in 0..20 {
            assert!(ns.call("square", CallArgs::new().arg(i)).is_err());
        }
    }

    assert_eq!(ns.call("square", CallArgs::new().arg(4))?, json!(16));
    Ok(())
}
