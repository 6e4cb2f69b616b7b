use anyhow::Result;

/// Both binaries run everything on one thread; nothing in daynote needs a worker pool.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
