use fanout_lambda::adapters::invoke::LambdaSelfInvoker;
use fanout_lambda::adapters::object_store::S3ObjectStore;
use fanout_lambda::adapters::request_execution::HttpRequestExecutor;
use fanout_lambda::config::WorkerConfig;
use fanout_lambda::handlers::dispatcher::{handle_worker_event, DispatchSummary, DispatcherConfig};
use fanout_lambda::telemetry;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    config: WorkerConfig,
    executor: HttpRequestExecutor,
    store: S3ObjectStore,
    invoker: LambdaSelfInvoker,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<DispatchSummary, Error> {
    let config = DispatcherConfig {
        function_identity: event.context.invoked_function_arn.clone(),
        results_prefix: deps.config.results_prefix.clone(),
    };

    handle_worker_event(
        event.payload,
        &config,
        &deps.executor,
        &deps.store,
        &deps.invoker,
    )
    .await
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    telemetry::init();

    let config = WorkerConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        executor: HttpRequestExecutor::new(config.request_timeout)?,
        store: S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config), config.bucket.clone()),
        invoker: LambdaSelfInvoker::new(aws_sdk_lambda::Client::new(&aws_config)),
        config,
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event| handle_request(event, deps))).await
}
