//! Integration tests for argument resolution between steps.

use std::sync::{Arc, Mutex};

use sagaflow::{
    ArgumentSource, Arguments, Context, Executor, FailureKind, StepDefinition, StepError,
    StepImplementation, StepOutcome, ValuePath, WorkflowDefinition,
};
use serde::Deserialize;
use serde_json::{Value, json};

fn no_inputs() -> Vec<(String, Value)> {
    Vec::new()
}

#[test]
fn paths_drill_into_inputs_and_results() -> anyhow::Result<()> {
    let workflow = WorkflowDefinition::builder("paths")
        .input("order")
        .step(
            StepDefinition::builder("customer")
                .argument("id", ArgumentSource::input("order").at("customer.id"))
                .run(|args, _| json!({"id": args.get("id"), "tags": ["vip", "early"]}))
                .build(),
        )
        .step(
            StepDefinition::builder("summary")
                .argument("first_tag", ArgumentSource::result("customer").at(vec!["tags", "0"]))
                .argument("sku", ArgumentSource::input("order").at(ValuePath::key("sku")))
                .argument(
                    "line_count",
                    ArgumentSource::input("order").at(ValuePath::accessor("len", |value| {
                        value["lines"].as_array().map(|lines| json!(lines.len()))
                    })),
                )
                .argument("missing", ArgumentSource::input("order").at("customer.address.city"))
                .argument("fixed", ArgumentSource::literal("v1"))
                .run(|args, _| Value::from(args.clone()))
                .build(),
        )
        .return_step("summary")
        .build()?;

    let order = json!({
        "sku": "A-1",
        "customer": {"id": 7},
        "lines": [{}, {}, {}],
    });
    let outcome = Executor::new(Arc::new(workflow), [("order", order)]).execute()?;

    assert_eq!(
        outcome,
        json!({
            "first_tag": "vip",
            "sku": "A-1",
            "line_count": 3,
            "missing": null,
            "fixed": "v1",
        })
    );
    Ok(())
}

#[test]
fn null_result_resolves_to_null() -> anyhow::Result<()> {
    let workflow = WorkflowDefinition::builder("nothing")
        .step(StepDefinition::builder("empty").run(|_, _| ()).build())
        .step(
            StepDefinition::builder("reader")
                .argument("whole", ArgumentSource::result("empty"))
                .argument("nested", ArgumentSource::result("empty").at("a.b"))
                .run(|args, _| json!([args.get("whole"), args.get("nested")]))
                .build(),
        )
        .return_step("reader")
        .build()?;

    let outcome = Executor::new(Arc::new(workflow), no_inputs()).execute()?;
    assert_eq!(outcome, json!([null, null]));
    Ok(())
}

#[test]
fn transforms_apply_after_resolution() -> anyhow::Result<()> {
    let workflow = WorkflowDefinition::builder("normalize")
        .input("email")
        .step(
            StepDefinition::builder("store")
                .argument_with("email", ArgumentSource::input("email"), |value| {
                    let email = value.as_str().ok_or("email must be a string")?;
                    Ok(json!(email.trim().to_lowercase()))
                })
                .run(|args, _| args.get("email").clone())
                .build(),
        )
        .return_step("store")
        .build()?;

    let outcome =
        Executor::new(Arc::new(workflow), [("email", json!("  Ada@Example.COM "))]).execute()?;
    assert_eq!(outcome, json!("ada@example.com"));
    Ok(())
}

#[test]
fn failing_transform_is_a_step_failure() -> anyhow::Result<()> {
    let compensated_with = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&compensated_with);
    let ran = Arc::new(Mutex::new(false));
    let ran_flag = Arc::clone(&ran);

    let workflow = WorkflowDefinition::builder("strict")
        .input("account")
        .input("amount")
        .step(
            StepDefinition::builder("withdraw")
                .argument("account", ArgumentSource::input("account"))
                .argument_with("amount", ArgumentSource::input("amount"), |value| {
                    value
                        .as_u64()
                        .map(Value::from)
                        .ok_or_else(|| StepError::new("amount must be a positive integer"))
                })
                .run(move |_, _| {
                    *ran_flag.lock().expect("flag lock") = true;
                    json!(null)
                })
                .compensate(move |_, arguments, _| {
                    *sink.lock().expect("sink lock") = Some(arguments.clone());
                    Ok(())
                })
                .build(),
        )
        .build()?;

    let error = Executor::new(
        Arc::new(workflow),
        [("account", json!("acc-1")), ("amount", json!(-5))],
    )
    .execute()
    .expect_err("negative amount");

    assert_eq!(error.kind(), FailureKind::StepFailure);
    assert_eq!(
        error.to_string(),
        "Step 'withdraw' failed: argument 'amount' could not be transformed: \
         amount must be a positive integer"
    );
    assert!(!*ran.lock().expect("flag lock"));

    let arguments = compensated_with
        .lock()
        .expect("sink lock")
        .clone()
        .expect("compensation ran");
    assert_eq!(arguments.get("account"), &json!("acc-1"));
    assert!(!arguments.contains("amount"));
    Ok(())
}

#[derive(Debug, Deserialize, PartialEq)]
struct Address {
    city: String,
    zip: String,
}

struct Geocode;

impl StepImplementation for Geocode {
    fn run(&self, arguments: &Arguments, _context: &Context) -> StepOutcome {
        match arguments.parse::<Address>("address") {
            Ok(address) => StepOutcome::success(json!({
                "label": format!("{} {}", address.zip, address.city),
            })),
            Err(error) => StepOutcome::failure(error),
        }
    }

    fn undo_description(&self, step: &str) -> String {
        format!("forget geocode from {step}")
    }
}

#[test]
fn delegated_implementation_parses_typed_arguments() -> anyhow::Result<()> {
    let workflow = WorkflowDefinition::builder("geo")
        .input("address")
        .step(
            StepDefinition::builder("geocode")
                .argument("address", ArgumentSource::input("address"))
                .implementation(Geocode)
                .build(),
        )
        .return_step("geocode")
        .build()?;
    let workflow = Arc::new(workflow);

    let report = Executor::new(
        Arc::clone(&workflow),
        [("address", json!({"city": "Berlin", "zip": "10115"}))],
    )
    .execute_with_report();
    assert_eq!(report.outcome, Ok(json!({"label": "10115 Berlin"})));
    assert_eq!(
        report
            .audit
            .record("geocode")
            .and_then(|r| r.detail.as_deref()),
        Some("forget geocode from geocode")
    );

    let error = Executor::new(workflow, [("address", json!({"city": "Berlin"}))])
        .execute()
        .expect_err("zip is missing");
    assert!(error.to_string().contains("argument 'address' has an unexpected shape"));
    Ok(())
}

#[test]
fn explicit_success_and_raw_values_are_both_recorded() -> anyhow::Result<()> {
    let workflow = WorkflowDefinition::builder("mixed")
        .step(
            StepDefinition::builder("explicit")
                .run(|_, _| StepOutcome::success("wrapped"))
                .build(),
        )
        .step(
            StepDefinition::builder("raw")
                .run(|_, _| json!({"wrapped": false}))
                .build(),
        )
        .step(
            StepDefinition::builder("result")
                .run(|_, _| Ok::<_, StepError>(json!(1)))
                .build(),
        )
        .build()?;

    let report = Executor::new(Arc::new(workflow), no_inputs()).execute_with_report();

    assert_eq!(
        report.outcome,
        Ok(json!({"explicit": "wrapped", "raw": {"wrapped": false}, "result": 1}))
    );
    assert_eq!(report.context.ledger().len(), 3);
    Ok(())
}
