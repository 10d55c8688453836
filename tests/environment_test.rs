use color_eyre::Result;
use foxlite::{
    interpreter::{context::BufferedContext, Environment, Evaluator},
    lexer::Lexer,
    parser::{statement::Scope, Parser},
    value::Value,
};

fn evaluate_in(source: &str, environment: &Environment) -> Result<Value> {
    let (program, errors) = Parser::new(Lexer::new(source)).parse()?;
    assert!(errors.is_empty(), "Unexpected syntax errors {errors:?}");
    let mut evaluator = Evaluator::new(BufferedContext::new());
    Ok(evaluator.evaluate_program(&program, environment)?)
}

fn number(value: Option<Value>) -> Option<f64> {
    match value {
        Some(Value::Number(v)) => Some(v),
        _ => None,
    }
}

#[test]
fn test_natives_are_public_globals() {
    let global = Environment::new_global();
    assert!(global.is_global());
    assert!(matches!(global.get("len"), Some(Value::NativeFunction(_))));
    assert!(matches!(global.get("type"), Some(Value::NativeFunction(_))));

    let call = global.new_call_scope().new_call_scope();
    assert!(!call.is_global());
    assert!(matches!(call.get("len"), Some(Value::NativeFunction(_))));
}

#[test]
fn test_local_is_only_visible_in_its_own_environment() {
    let global = Environment::new_global();
    global.set("x", Scope::Local, Value::Number(1.0));
    assert_eq!(number(global.get("x")), Some(1.0));

    let call = global.new_call_scope();
    assert!(call.get("x").is_none());
    assert!(call.lookup_owner("x").is_none());
}

#[test]
fn test_private_is_inherited_by_calls() {
    let global = Environment::new_global();
    let outer = global.new_call_scope();
    outer.set("x", Scope::Private, Value::Number(2.0));

    let inner = outer.new_call_scope();
    assert_eq!(number(inner.get("x")), Some(2.0));
    assert!(global.get("x").is_none());
}

#[test]
fn test_public_is_written_to_global() {
    let global = Environment::new_global();
    let call = global.new_call_scope().new_call_scope();
    call.set("g", Scope::Public, Value::Boolean(true));

    assert!(!call.contains_local("g"));
    assert!(global.contains_local("g"));
    assert!(matches!(
        global.get_binding("g"),
        Some(binding) if binding.scope == Scope::Public
    ));
}

#[test]
fn test_nearer_binding_shadows_outer_one() {
    let global = Environment::new_global();
    global.set("x", Scope::Private, Value::Number(1.0));
    let call = global.new_call_scope();
    call.set("x", Scope::Local, Value::Number(5.0));

    assert_eq!(number(call.get("x")), Some(5.0));
    assert_eq!(number(global.get("x")), Some(1.0));
}

#[test]
fn test_assign_updates_owner_and_keeps_scope() {
    let global = Environment::new_global();
    global.set("count", Scope::Private, Value::Number(0.0));
    let call = global.new_call_scope();

    call.assign("count", Value::Number(3.0));
    assert!(!call.contains_local("count"));
    assert_eq!(number(global.get_local("count")), Some(3.0));
    assert!(matches!(
        global.get_binding("count"),
        Some(binding) if binding.scope == Scope::Private
    ));
}

#[test]
fn test_assign_without_binding_creates_private_here() {
    let global = Environment::new_global();
    let outer = global.new_call_scope();
    outer.assign("fresh", Value::Number(1.0));

    assert!(outer.contains_local("fresh"));
    assert!(!global.contains_local("fresh"));
    assert!(matches!(
        outer.get_binding("fresh"),
        Some(binding) if binding.scope == Scope::Private
    ));
    assert_eq!(number(outer.new_call_scope().get("fresh")), Some(1.0));
}

#[test]
fn test_assign_skips_hidden_local() {
    let global = Environment::new_global();
    global.set("x", Scope::Local, Value::Number(1.0));
    let call = global.new_call_scope();
    call.assign("x", Value::Number(9.0));

    assert_eq!(number(call.get_local("x")), Some(9.0));
    assert_eq!(number(global.get_local("x")), Some(1.0));
}

#[test]
fn test_clones_share_bindings() {
    let global = Environment::new_global();
    let alias = global.clone();
    alias.set("shared", Scope::Private, Value::Null);
    assert!(matches!(global.get("shared"), Some(Value::Null)));
    assert!(global.new_call_scope().get_global().contains_local("shared"));
}

#[test]
fn test_activation_declaring_a_function_is_freed() -> Result<()> {
    let global = Environment::new_global();
    let call = global.new_call_scope();
    let weak = call.downgrade();

    let result = evaluate_in("FUNCTION inner\nENDFUNC\nRETURN 1", &call)?;
    assert!(matches!(result, Value::Number(v) if v == 1.0));
    assert!(matches!(call.get("inner"), Some(Value::Function(_))));

    drop(call);
    assert!(weak.upgrade().is_none());
    Ok(())
}

#[test]
fn test_returned_function_keeps_its_activation() -> Result<()> {
    let global = Environment::new_global();
    let call = global.new_call_scope();
    let weak = call.downgrade();

    let source = "PRIVATE seed = 4\nFUNCTION inner\nRETURN seed\nENDFUNC\nRETURN inner";
    let function = evaluate_in(source, &call)?;
    drop(call);
    assert!(weak.upgrade().is_some());

    global.set("keep", Scope::Private, function);
    let result = evaluate_in("RETURN keep()", &global)?;
    assert!(matches!(result, Value::Number(v) if v == 4.0));

    global.set("keep", Scope::Private, Value::Null);
    assert!(weak.upgrade().is_none());
    Ok(())
}

#[test]
fn test_function_stored_in_its_own_closure_does_not_keep_it_alive() -> Result<()> {
    let global = Environment::new_global();
    let call = global.new_call_scope();
    let weak = call.downgrade();

    evaluate_in("FUNCTION inner\nENDFUNC\nalias = inner", &call)?;
    assert!(matches!(call.get("alias"), Some(Value::Function(_))));

    drop(call);
    assert!(weak.upgrade().is_none());
    Ok(())
}
