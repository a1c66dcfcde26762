//! Demonstration providers: a stateful test submodel and a multi-shell
//! repository. Used by the CLI and by tests.

use crate::aggregator::ProviderAggregator;
use crate::binding::FnBinding;
use crate::element::{Collection, Property};
use crate::operation::{
    CANCELLATION_MESSAGE, FnOperation, Operation, OperationCall, OperationHandler,
    OperationVariable,
};
use crate::shell::ShellProvider;
use crate::submodel::SubmodelProvider;
use crate::value::ValueType;
use async_trait::async_trait;
use rhai::Engine;
use rhai::packages::{ArithmeticPackage, BasicMathPackage, Package};
use serde_json::{Value, json};
use shellhub_kernel::{Identifier, ShellhubError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TEST_SHELL: &str = "TestAAS";
pub const TEST_SUBMODEL: &str = "TestSubmodel";

const MAX_EXPRESSION_OPERATIONS: u64 = 100_000;

#[derive(Debug)]
struct Counters {
    text: String,
    i: i64,
    y: f64,
}

type Shared = Arc<Mutex<Counters>>;

fn with_counters<T>(state: &Shared, f: impl FnOnce(&mut Counters) -> T) -> T {
    let mut counters = state.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut counters)
}

/// Text property: `<text>_<i>`, stepping the shared counter by `step`.
fn text_property(id_short: &str, state: &Shared, step: i64) -> Property {
    let read = Arc::clone(state);
    let write = Arc::clone(state);
    Property::with_binding(
        id_short,
        ValueType::String,
        FnBinding::new(
            move || {
                with_counters(&read, |c| {
                    let value = format!("{}_{}", c.text, c.i);
                    c.i += step;
                    json!(value)
                })
            },
            move |value| {
                if let Some(text) = value.as_str() {
                    with_counters(&write, |c| c.text = text.to_string());
                }
            },
        ),
    )
}

/// Counter property: returns `i`, then steps it.
fn counter_property(id_short: &str, state: &Shared, step: i64) -> Property {
    let read = Arc::clone(state);
    let write = Arc::clone(state);
    Property::with_binding(
        id_short,
        ValueType::Integer,
        FnBinding::new(
            move || {
                with_counters(&read, |c| {
                    let value = c.i;
                    c.i += step;
                    json!(value)
                })
            },
            move |value| {
                if let Some(i) = value.as_i64() {
                    with_counters(&write, |c| c.i = i);
                }
            },
        ),
    )
}

/// Power property: `y^i`.
fn power_property(id_short: &str, state: &Shared) -> Property {
    let read = Arc::clone(state);
    let write = Arc::clone(state);
    Property::with_binding(
        id_short,
        ValueType::Double,
        FnBinding::new(
            move || with_counters(&read, |c| json!(c.y.powf(c.i as f64))),
            move |value| {
                if let Some(y) = value.as_f64() {
                    with_counters(&write, |c| c.y = y);
                }
            },
        ),
    )
}

/// The stateful test submodel: four properties, a nested collection with
/// four more, `GetTime` and `Calculate`.
pub fn test_submodel() -> SubmodelProvider {
    let state: Shared = Arc::new(Mutex::new(Counters {
        text: "TestFromInside".to_string(),
        i: 0,
        y: 2.0,
    }));

    SubmodelProvider::new(
        TEST_SUBMODEL,
        Identifier::custom(format!("urn:shellhub:submodels:{}", uuid::Uuid::new_v4())),
    )
    .with_element(text_property("TestProperty1", &state, 1))
    .with_element(text_property("TestProperty2", &state, 1))
    .with_element(counter_property("TestProperty3", &state, 1))
    .with_element(power_property("TestProperty4", &state))
    .with_element(
        Collection::new("TestSubmodelElementCollection")
            .with_element(text_property("TestSubProperty1", &state, -1))
            .with_element(text_property("TestSubProperty2", &state, -1))
            .with_element(counter_property("TestSubProperty3", &state, -1))
            .with_element(power_property("TestSubProperty4", &state)),
    )
    .with_element(get_time())
    .with_element(calculate())
}

fn get_time() -> Operation {
    Operation::new(
        "GetTime",
        FnOperation::new(|call| {
            let now = chrono::Local::now();
            call.set_output("Date", json!(format!("Today is {}", now.format("%Y-%m-%d"))));
            call.set_output("Time", json!(format!("It is {}", now.format("%H:%M:%S%.3f"))));
            call.set_output("Ticks", json!(format!("Ticks: {}", now.timestamp_millis())));
            Ok(())
        }),
    )
    .with_output(OperationVariable::optional("Date", ValueType::String))
    .with_output(OperationVariable::optional("Time", ValueType::String))
    .with_output(OperationVariable::optional("Ticks", ValueType::String))
}

/// Calculator with simulated computing time.
struct Calculate;

#[async_trait]
impl OperationHandler for Calculate {
    async fn invoke(
        &self,
        call: &mut OperationCall,
        cancel: CancellationToken,
    ) -> Result<(), ShellhubError> {
        let expression = call.input_str("Expression").unwrap_or_default().to_string();
        let computing_time = call.input_i64("ComputingTime");

        let throughput = call
            .in_out("ThroughputVariable")
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        if let Some(text) = throughput {
            call.set_in_out(
                "ThroughputVariable",
                json!(format!("{text} modified in Calculate Method")),
            );
        }

        if let Some(ms) = computing_time {
            let ms = u64::try_from(ms).map_err(|_| {
                ShellhubError::validation("ComputingTime must not be negative")
            })?;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
                _ = cancel.cancelled() => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(ShellhubError::Cancelled(CANCELLATION_MESSAGE.to_string()));
        }

        let value = evaluate_expression(&expression)?;
        call.set_output("Result", json!(value));
        Ok(())
    }
}

fn calculate() -> Operation {
    Operation::new("Calculate", Calculate)
        .with_input(OperationVariable::required("Expression", ValueType::String))
        .with_input(OperationVariable::optional("ComputingTime", ValueType::Integer))
        .with_in_out(OperationVariable::optional("ThroughputVariable", ValueType::String))
        .with_output(OperationVariable::optional("Result", ValueType::Double))
}

/// Evaluate an arithmetic expression such as `5*9`.
///
/// Integer operands use integer arithmetic (`7/2` is `3`); write `7.0/2` for
/// a fractional result.
pub fn evaluate_expression(expression: &str) -> Result<f64, ShellhubError> {
    if expression.trim().is_empty() {
        return Err(ShellhubError::validation("expression must not be empty"));
    }
    let value = expression_engine()
        .eval_expression::<rhai::Dynamic>(expression)
        .map_err(|err| {
            ShellhubError::validation(format!("cannot evaluate `{expression}`: {err}"))
        })?;
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f64);
    }
    Err(ShellhubError::validation(format!(
        "expression `{expression}` did not produce a number"
    )))
}

/// Arithmetic and math functions only, bounded in work and allocation.
fn expression_engine() -> Engine {
    let mut engine = Engine::new_raw();
    engine.register_global_module(ArithmeticPackage::new().as_shared_module());
    engine.register_global_module(BasicMathPackage::new().as_shared_module());
    engine
        .set_max_operations(MAX_EXPRESSION_OPERATIONS)
        .set_max_expr_depths(64, 32)
        .set_max_string_size(1024)
        .set_max_array_size(1024)
        .set_max_map_size(256);
    engine
}

/// `MultiAAS_<i>` shell with a `TestSubmodel` whose `Property_<i>` reads `i²`.
pub fn multi_shell(i: usize) -> ShellProvider {
    let id_short = format!("MultiAAS_{i}");
    let squared = (i * i) as f64;
    ShellProvider::new(
        id_short.clone(),
        Identifier::iri(format!("urn:shellhub:shells:{id_short}:1.0.0")),
    )
    .with_submodel(
        SubmodelProvider::new(
            TEST_SUBMODEL,
            Identifier::iri(format!("urn:shellhub:submodels:{id_short}:TestSubmodel:1.0.0")),
        )
        .with_element(Property::with_binding(
            format!("Property_{i}"),
            ValueType::Double,
            FnBinding::read_only(move || json!(squared)),
        )),
    )
}

/// `count` multi shells plus the test shell, each keyed by its idShort.
pub fn repository(count: usize) -> ProviderAggregator {
    let aggregator = ProviderAggregator::new();
    for i in 0..count {
        let shell = multi_shell(i);
        let key = shell.id_short().to_string();
        aggregator.register(key, shell);
    }
    aggregator.register(
        TEST_SHELL,
        ShellProvider::new(
            TEST_SHELL,
            Identifier::iri(format!("http://shellhub.local/shells/{TEST_SHELL}")),
        )
        .with_submodel(test_submodel()),
    );
    aggregator
}
