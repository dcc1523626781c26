use async_trait::async_trait;
use aws_sdk_lambda::types::InvocationType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to invoke continuation '{function_identity}': {message}")]
pub struct DispatchError {
    pub function_identity: String,
    pub message: String,
}

/// Starts another invocation of a worker without waiting for its work.
///
/// Implementations return once the invocation is enqueued; the continuation's
/// own result is never observed.
#[async_trait]
pub trait SelfInvoker: Send + Sync {
    async fn invoke_async(&self, function_identity: &str, payload: Vec<u8>)
        -> Result<(), DispatchError>;
}

pub struct LambdaSelfInvoker {
    lambda_client: aws_sdk_lambda::Client,
}

impl LambdaSelfInvoker {
    pub fn new(lambda_client: aws_sdk_lambda::Client) -> Self {
        Self { lambda_client }
    }
}

#[async_trait]
impl SelfInvoker for LambdaSelfInvoker {
    async fn invoke_async(
        &self,
        function_identity: &str,
        payload: Vec<u8>,
    ) -> Result<(), DispatchError> {
        self.lambda_client
            .invoke()
            .function_name(function_identity)
            .invocation_type(InvocationType::Event)
            .set_payload(Some(payload.into()))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| DispatchError {
                function_identity: function_identity.to_string(),
                message: aws_sdk_lambda::error::DisplayErrorContext(&error).to_string(),
            })
    }
}
