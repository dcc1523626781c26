#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use fanout_core::contract::{Protocol, WorkPacket};
use fanout_core::outcome::{ExecutionResult, ResponseRecord};
use fanout_core::template::RenderedRequest;
use fanout_lambda::adapters::invoke::{DispatchError, SelfInvoker};
use fanout_lambda::adapters::object_store::{ObjectStore, StoreError};
use fanout_lambda::adapters::request_execution::RequestExecutor;
use fanout_lambda::handlers::dispatcher::DispatcherConfig;
use serde_json::Value;

pub const SELF_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:fanout-worker";

pub fn dispatcher_config() -> DispatcherConfig {
    DispatcherConfig {
        function_identity: SELF_ARN.to_string(),
        results_prefix: String::new(),
    }
}

/// Answers every request with 200 unless the host is listed as unreachable.
#[derive(Default)]
pub struct StubExecutor {
    pub unreachable_hosts: Vec<String>,
    pub issued_uris: Mutex<Vec<String>>,
}

#[async_trait]
impl RequestExecutor for StubExecutor {
    async fn execute(&self, protocol: Protocol, request: &RenderedRequest) -> ExecutionResult {
        let uri = request.uri(protocol);
        self.issued_uris.lock().expect("executor lock").push(uri.clone());
        if self.unreachable_hosts.contains(&request.host) {
            return ExecutionResult::failure(format!("request to '{uri}' failed: dns error"));
        }
        ExecutionResult::Success(ResponseRecord {
            headers: Default::default(),
            body: format!("{} {}", request.method, request.target),
            status: 200,
            hostname: request.host.clone(),
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<Vec<(String, Value)>>,
    /// Writes whose key contains this fragment fail.
    pub reject_keys_containing: Option<String>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("store lock")
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn count_in(&self, namespace: &str) -> usize {
        self.keys()
            .iter()
            .filter(|key| key.starts_with(namespace))
            .count()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        if let Some(fragment) = &self.reject_keys_containing {
            if key.contains(fragment.as_str()) {
                return Err(StoreError::Write {
                    key: key.to_string(),
                    message: "simulated outage".to_string(),
                });
            }
        }
        let value: Value = serde_json::from_slice(&body).expect("records are json");
        self.objects
            .lock()
            .expect("store lock")
            .push((key.to_string(), value));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingInvoker {
    pub packets: Mutex<Vec<(String, WorkPacket)>>,
    pub fail: bool,
}

impl RecordingInvoker {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn take(&self) -> Vec<(String, WorkPacket)> {
        std::mem::take(&mut *self.packets.lock().expect("invoker lock"))
    }
}

#[async_trait]
impl SelfInvoker for RecordingInvoker {
    async fn invoke_async(
        &self,
        function_identity: &str,
        payload: Vec<u8>,
    ) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError {
                function_identity: function_identity.to_string(),
                message: "throttled".to_string(),
            });
        }
        let packet: WorkPacket = serde_json::from_slice(&payload).expect("continuation is a packet");
        self.packets
            .lock()
            .expect("invoker lock")
            .push((function_identity.to_string(), packet));
        Ok(())
    }
}
