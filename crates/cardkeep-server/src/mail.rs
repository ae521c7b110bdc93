// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

#[derive(Debug)]
pub struct MailError(pub String);

impl std::fmt::Display for MailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for MailError {}

/// Outbound mail port. The reset flow only ever needs one message shape,
/// so the trait stays narrow.
#[async_trait]
pub trait MailSender: Send + Sync + 'static {
    async fn send_reset_link(&self, to: &str, reset_url: &str) -> Result<(), MailError>;
}

/// Default sender: logs the link instead of delivering it. Suitable for
/// development and for deployments that wire reset links elsewhere.
#[derive(Debug, Default)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send_reset_link(&self, to: &str, reset_url: &str) -> Result<(), MailError> {
        tracing::info!(to, reset_url, "password reset link issued");
        Ok(())
    }
}
