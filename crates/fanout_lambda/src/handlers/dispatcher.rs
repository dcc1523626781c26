use std::time::Instant;

use fanout_core::contract::{
    encode_work_packet, parse_work_packet, template_fingerprint, ContractError, Payload, Protocol,
    WorkPacket,
};
use fanout_core::outcome::ExecutionResult;
use fanout_core::splitting::split_packet;
use fanout_core::template::render;
use futures::future::{join, join_all};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapters::invoke::SelfInvoker;
use crate::adapters::object_store::{ObjectStore, StoreError};
use crate::adapters::request_execution::RequestExecutor;
use crate::handlers::sink::persist_outcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Identity of the running worker; continuations are addressed to it.
    pub function_identity: String,
    pub results_prefix: String,
}

/// What one invocation did. This is a log/diagnostic value only; completion of
/// the whole tree is observed through the result store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub local_claimed: usize,
    pub persisted_keys: Vec<String>,
    pub continuations_enqueued: usize,
    pub continuations_failed: usize,
    /// Local outcomes whose record could not be written. Logged at `error`;
    /// the invocation still succeeds so the platform does not replay the
    /// packet and duplicate its subtree.
    pub records_failed: usize,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Contract(#[from] ContractError),
}

pub async fn handle_worker_event(
    event: Value,
    config: &DispatcherConfig,
    executor: &impl RequestExecutor,
    store: &impl ObjectStore,
    invoker: &impl SelfInvoker,
) -> Result<DispatchSummary, WorkerError> {
    let packet = match parse_work_packet(event) {
        Ok(packet) => packet,
        Err(contract_error) => {
            error!(
                component = "dispatcher",
                event = "invalid_input",
                error = %contract_error,
            );
            return Err(contract_error.into());
        }
    };
    Ok(dispatch_packet(packet, config, executor, store, invoker).await)
}

/// Claims local work, runs it, and hands the remainder to two continuations.
///
/// Local items and continuation enqueues run concurrently on the current task.
/// Continuation and record-write failures are logged and dropped. Once the
/// packet is accepted the invocation never fails, since a failed asynchronous
/// invocation is replayed whole.
pub async fn dispatch_packet(
    packet: WorkPacket,
    config: &DispatcherConfig,
    executor: &impl RequestExecutor,
    store: &impl ObjectStore,
    invoker: &impl SelfInvoker,
) -> DispatchSummary {
    let started_at = Instant::now();
    let template_id = template_fingerprint(&packet.raw_request);
    let protocol = packet.protocol;
    let raw_request = packet.raw_request.clone();

    info!(
        component = "dispatcher",
        event = "packet_received",
        template = %template_id,
        protocol = %protocol,
        payloads = packet.payloads.len(),
    );

    let plan = split_packet(packet);
    if plan.local.is_empty() {
        warn!(
            component = "dispatcher",
            event = "empty_packet",
            template = %template_id,
        );
        return DispatchSummary::default();
    }

    let local_work = join_all(
        plan.local
            .iter()
            .map(|payload| process_payload(protocol, &raw_request, payload, config, executor, store)),
    );
    let continuations = enqueue_continuations(plan.delegated, config, invoker);
    let (local_results, (continuations_enqueued, continuations_failed)) =
        join(local_work, continuations).await;

    let claimed = local_results.len();
    let mut persisted_keys = Vec::with_capacity(claimed);
    let mut records_failed = 0;
    for result in local_results {
        match result {
            Ok(key) => persisted_keys.push(key),
            Err(store_error) => {
                records_failed += 1;
                error!(
                    component = "dispatcher",
                    event = "persistence_failed",
                    template = %template_id,
                    error = %store_error,
                );
            }
        }
    }

    info!(
        component = "dispatcher",
        event = "packet_completed",
        template = %template_id,
        local_claimed = claimed,
        records_failed,
        continuations_enqueued,
        continuations_failed,
        duration_ms = started_at.elapsed().as_millis() as u64,
    );
    DispatchSummary {
        local_claimed: claimed,
        persisted_keys,
        continuations_enqueued,
        continuations_failed,
        records_failed,
    }
}

/// Render, execute, classify and persist a single payload. Render and
/// transport problems become a failure record; only the store write can fail
/// this item.
async fn process_payload(
    protocol: Protocol,
    raw_request: &str,
    payload: &Payload,
    config: &DispatcherConfig,
    executor: &impl RequestExecutor,
    store: &impl ObjectStore,
) -> Result<String, StoreError> {
    for (placeholder, value) in payload.substitutions() {
        debug!(
            component = "dispatcher",
            event = "placeholder_substituted",
            placeholder,
            value = %value,
        );
    }

    let outcome = match render(raw_request, payload) {
        Ok(request) => executor.execute(protocol, &request).await,
        Err(render_error) => ExecutionResult::failure(render_error),
    };

    if let ExecutionResult::Failure { error } = &outcome {
        warn!(
            component = "dispatcher",
            event = "item_failed",
            error = %error,
        );
    }

    let key = persist_outcome(store, &config.results_prefix, &outcome).await?;
    info!(
        component = "dispatcher",
        event = "record_persisted",
        key = %key,
        success = outcome.is_success(),
    );
    Ok(key)
}

/// Enqueues both halves and reports `(enqueued, failed)`. Only enqueueing is
/// awaited; nothing about the continuations' own work is observed.
async fn enqueue_continuations(
    delegated: Option<(WorkPacket, WorkPacket)>,
    config: &DispatcherConfig,
    invoker: &impl SelfInvoker,
) -> (usize, usize) {
    let Some((first, second)) = delegated else {
        return (0, 0);
    };

    let results = join(
        enqueue_continuation(&first, config, invoker),
        enqueue_continuation(&second, config, invoker),
    )
    .await;

    let mut enqueued = 0;
    let mut failed = 0;
    for result in [results.0, results.1] {
        match result {
            Ok(payloads) => {
                enqueued += 1;
                info!(
                    component = "dispatcher",
                    event = "continuation_enqueued",
                    function = %config.function_identity,
                    payloads,
                );
            }
            Err(message) => {
                failed += 1;
                warn!(
                    component = "dispatcher",
                    event = "continuation_failed",
                    function = %config.function_identity,
                    error = %message,
                );
            }
        }
    }
    (enqueued, failed)
}

async fn enqueue_continuation(
    packet: &WorkPacket,
    config: &DispatcherConfig,
    invoker: &impl SelfInvoker,
) -> Result<usize, String> {
    let body = encode_work_packet(packet).map_err(|encode_error| encode_error.to_string())?;
    invoker
        .invoke_async(&config.function_identity, body)
        .await
        .map_err(|dispatch_error| dispatch_error.to_string())?;
    Ok(packet.payloads.len())
}
