//! Batch sessions: stopping keeps completed results.

use azul_analyzer::services::{AnalysisMode, BatchRequest, SessionManager, SessionStatus};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_stop_keeps_exactly_the_completed_results() {
    let manager = SessionManager::new();
    let mut request = BatchRequest::new(200, AnalysisMode::Quick);
    request.max_workers = Some(1);
    request.seed = 7;
    let id = manager.start_batch(request).await.unwrap();

    let deadline = Instant::now() + Duration::from_secs(120);
    loop {
        let progress = manager.progress(id).await.unwrap();
        if progress.positions_done >= 1 || Instant::now() > deadline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let progress = manager.stop(id).await.unwrap();
    let results = manager.results(id).await.unwrap();

    assert_eq!(progress.status, SessionStatus::Stopped);
    assert!(progress.positions_done >= 1);
    assert!(progress.positions_done < progress.positions_total);
    assert_eq!(results.len(), progress.positions_done);
    assert!(results.iter().all(|r| r.response.is_some()));

    // Progress is frozen once stopped.
    let later = manager.progress(id).await.unwrap();
    assert_eq!(later.positions_done, progress.positions_done);
    assert_eq!(later.elapsed_ms, progress.elapsed_ms);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let manager = SessionManager::new();
    let first = manager
        .start_batch(BatchRequest::new(2, AnalysisMode::Quick))
        .await
        .unwrap();
    let second = manager
        .start_batch(BatchRequest::new(1, AnalysisMode::Quick))
        .await
        .unwrap();
    assert_ne!(first, second);

    let a = manager.wait(first).await.unwrap();
    let b = manager.wait(second).await.unwrap();
    assert_eq!((a.positions_done, a.status), (2, SessionStatus::Completed));
    assert_eq!((b.positions_done, b.status), (1, SessionStatus::Completed));
    assert_eq!(manager.list().await.len(), 2);
}
