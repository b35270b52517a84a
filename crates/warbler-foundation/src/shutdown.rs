use crate::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative shutdown flag shared between the capture loop and the
/// interrupt handler. Checked once per block; no locks involved.
#[derive(Clone)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a Ctrl-C handler that trips this token. Interrupt is the
    /// normal way to stop the recorder, not an error.
    pub fn install(self) -> Result<Self, AppError> {
        let flag = self.flag.clone();
        ctrlc::set_handler(move || {
            tracing::info!("Interrupt received, shutting down");
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(|e| AppError::Fatal(format!("Failed to install interrupt handler: {}", e)))?;
        Ok(self)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
