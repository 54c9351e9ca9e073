//! Process-wide resource settings applied before any work starts

use crate::core::{Result, RunnerError};
use log::{debug, info};
use std::env;

/// Thread-count variables of common native numeric back-ends
pub const THREAD_ENV_VARS: [&str; 5] = [
    "OMP_NUM_THREADS",
    "OPENBLAS_NUM_THREADS",
    "MKL_NUM_THREADS",
    "VECLIB_MAXIMUM_THREADS",
    "NUMEXPR_NUM_THREADS",
];

/// Pin numeric back-ends to one thread and apply the memory ceiling
///
/// Must run while the process is still single-threaded.
pub fn apply_process_limits(memory_limit: Option<u64>) -> Result<()> {
    for var in THREAD_ENV_VARS {
        env::set_var(var, "1");
    }
    debug!("Pinned numeric back-ends to a single thread");

    match memory_limit {
        Some(bytes) => {
            apply_memory_limit(bytes)?;
            info!("Address space limited to {bytes} bytes");
        }
        None => debug!("No memory limit requested"),
    }
    Ok(())
}

/// Lower the soft `RLIMIT_AS`; the hard limit is left untouched
#[cfg(unix)]
pub fn apply_memory_limit(bytes: u64) -> Result<()> {
    use rlimit::Resource;

    let (_, hard) = rlimit::getrlimit(Resource::AS)
        .map_err(|e| RunnerError::ResourceLimit(format!("getrlimit failed: {e}")))?;

    let soft = if hard == rlimit::INFINITY {
        bytes
    } else {
        bytes.min(hard)
    };
    rlimit::setrlimit(Resource::AS, soft, hard)
        .map_err(|e| RunnerError::ResourceLimit(format!("setrlimit failed: {e}")))
}

#[cfg(not(unix))]
pub fn apply_memory_limit(bytes: u64) -> Result<()> {
    log::warn!("Memory limit of {bytes} bytes is not supported on this platform");
    Ok(())
}
