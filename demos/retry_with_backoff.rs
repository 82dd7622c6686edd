//! # Example: retry_with_backoff
//!
//! Demonstrates how an [`Engine`] retries attempts that run out of time, growing the
//! wait budget by the backoff factor each time.
//!
//! The "quote" task stalls on its first two attempts (like a hung remote call) and
//! answers promptly on the third.
//!
//! ## Flow
//! ```text
//! Engine::execute()
//!   ├─► publish(AttemptStarting, attempt=1, wait=50ms)
//!   ├─► await → TimeoutHit → CancelRequested (task sees ctx.is_cancelled())
//!   ├─► publish(BackoffScheduled{next_wait=100ms})
//!   ├─► attempt=2, wait=100ms → TimeoutHit → CancelRequested
//!   ├─► publish(BackoffScheduled{next_wait=200ms})
//!   └─► attempt=3, wait=200ms → Ok(quote) → AttemptSucceeded
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_with_backoff --features logging
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};
use taskbound::{Engine, LogWriter, Subscribe, TaskFn, TaskRef, TimeUnit};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Subscribers print every lifecycle event
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    // 2. Three attempts: 50ms, 100ms, 200ms
    let engine = Engine::builder()
        .retries(2)
        .wait(50.0, TimeUnit::Milliseconds)
        .backoff_factor(2.0)
        .with_subscribers(subs)
        .build()?;

    // 3. A task that hangs until cancelled on its first two attempts
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let quote: TaskRef<String, String> = TaskFn::arc("quote", move |ctx: CancellationToken| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[quote] attempt {attempt}");
        if attempt < 3 {
            while !ctx.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            return Err::<String, String>(format!("attempt {attempt} abandoned"));
        }
        Ok(format!("EURUSD=1.0842 (attempt {attempt})"))
    });

    // 4. Execute and report
    match engine.execute(quote).await {
        Ok(value) => println!("result: {value}"),
        Err(err) => println!("failed ({}): {err}", err.as_label()),
    }
    println!("attempts made: {}", calls.load(Ordering::SeqCst));

    // Let the subscriber drain its queue before exiting
    drop(engine);
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
