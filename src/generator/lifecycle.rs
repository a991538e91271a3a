//! Shutdown coordination.

use super::ImageGenerator;

impl ImageGenerator {
    /// Stop accepting jobs and cancel every in-flight poll loop
    ///
    /// Jobs that were being polled end with [`Error::Cancelled`](crate::Error::Cancelled)
    /// and can still be picked up later by id. Downloads already in progress finish.
    /// Calling this more than once is harmless.
    pub fn shutdown(&self) {
        if self.shutdown_token.is_cancelled() {
            return;
        }
        tracing::info!("Initiating shutdown");
        self.shutdown_token.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_shut_down(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }
}
