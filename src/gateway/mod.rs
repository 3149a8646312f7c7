pub mod kurobbs;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Issue one request on behalf of the account and decode the reply.
    ///
    /// Fails when the service is unreachable or the reply does not decode
    /// into an [`Envelope`]. Never retries.
    async fn call(&self, endpoint: Endpoint, form: FormBody) -> Result<Envelope>;
}

