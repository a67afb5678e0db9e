//! End-to-end tests for the translation service: submit, poll, the worker
//! loop and shutdown, driven by in-process mock backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tolk::{
    Config, LanguagePairCatalog, Result, RetryConfig, SubmitResponse, TaskId, TaskView, TolkError,
    TranslationBackend, TranslationModel, TranslationService, TranslationServiceBuilder,
};

// ============================================================================
// Mock backend
// ============================================================================

/// Wraps text in angle brackets, records every call, and misbehaves on cue:
/// text `"fail"` errors, text `"boom"` panics, model `"opus-broken"` won't load.
struct BracketModel {
    model_id: String,
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TranslationModel for BracketModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn translate(&self, text: &str, _max_length: usize) -> Result<String> {
        self.calls.lock().unwrap().push(text.to_string());
        match text {
            "fail" => Err(TolkError::Translation("decoder exploded".to_string())),
            "boom" => panic!("model crashed"),
            _ => Ok(format!("<{text}>")),
        }
    }
}

#[derive(Default)]
struct BracketBackend {
    calls: Arc<Mutex<Vec<String>>>,
    loads: Arc<Mutex<Vec<String>>>,
    /// When set, every load waits for a permit.
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl TranslationBackend for BracketBackend {
    fn name(&self) -> &str {
        "bracket"
    }

    async fn load(&self, model_id: &str) -> Result<Box<dyn TranslationModel>> {
        if let Some(ref gate) = self.gate {
            gate.acquire()
                .await
                .map_err(|e| TolkError::Http(e.to_string()))?
                .forget();
        }
        if model_id == "opus-broken" {
            return Err(TolkError::ModelNotFound(model_id.to_string()));
        }
        self.loads.lock().unwrap().push(model_id.to_string());
        Ok(Box::new(BracketModel {
            model_id: model_id.to_string(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn catalog() -> LanguagePairCatalog {
    LanguagePairCatalog::new()
        .with_language("en", "English")
        .with_language("fr", "French")
        .with_language("hi", "Hindi")
        .with_language("xx", "Broken")
        .with_pair("hi", "en", "opus-hi-en")
        .with_pair("fr", "en", "opus-fr-en")
        .with_pair("en", "fr", "opus-en-fr")
        .with_pair("xx", "en", "opus-broken")
}

fn builder(backend: BracketBackend) -> TranslationServiceBuilder {
    TranslationService::builder()
        .backend(Arc::new(backend))
        .catalog(catalog())
        .retry(RetryConfig::disabled())
}

fn task_id(response: &SubmitResponse) -> TaskId {
    response
        .task_id()
        .cloned()
        .expect("submission should be queued")
}

/// Poll until the task reaches a terminal state.
async fn wait_for(service: &TranslationService, id: &TaskId) -> TaskView {
    for _ in 0..500 {
        match service.poll(Some(id.as_str())).expect("task should exist") {
            TaskView::Processing => tokio::time::sleep(Duration::from_millis(10)).await,
            done => return done,
        }
    }
    panic!("task {id} did not finish");
}

// ============================================================================
// Submit and poll
// ============================================================================

#[tokio::test]
async fn submit_then_poll_returns_translation_once() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let submitted = service.submit("namaste", "hi", "en").unwrap();
    let id = task_id(&submitted);

    let view = wait_for(&service, &id).await;
    assert_eq!(
        view,
        TaskView::Completed {
            translation: "<namaste>".to_string()
        }
    );

    // Results are read at most once.
    let err = service.poll(Some(id.as_str())).unwrap_err();
    assert!(matches!(err, TolkError::TaskNotFound(_)));

    service.shutdown().await;
}

#[tokio::test]
async fn pending_task_polls_as_processing() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = BracketBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let service = builder(backend).build().unwrap();

    let id = task_id(&service.submit("bonjour", "fr", "en").unwrap());
    assert_eq!(
        service.poll(Some(id.as_str())).unwrap(),
        TaskView::Processing
    );
    // Processing polls don't consume.
    assert_eq!(
        service.poll(Some(id.as_str())).unwrap(),
        TaskView::Processing
    );

    gate.add_permits(1);
    assert_eq!(
        wait_for(&service, &id).await,
        TaskView::Completed {
            translation: "<bonjour>".to_string()
        }
    );

    service.shutdown().await;
}

#[tokio::test]
async fn empty_text_completes_immediately() {
    let backend = BracketBackend::default();
    let loads = Arc::clone(&backend.loads);
    let service = builder(backend).build().unwrap();

    let submitted = service.submit("", "hi", "en").unwrap();
    assert_eq!(
        submitted,
        SubmitResponse::Completed {
            translation: String::new()
        }
    );
    assert!(submitted.task_id().is_none());

    service.shutdown().await;
    assert!(loads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_pair_completes_with_explanation() {
    let backend = BracketBackend::default();
    let loads = Arc::clone(&backend.loads);
    let service = builder(backend).build().unwrap();

    let id = task_id(&service.submit("bonjour", "fr", "hi").unwrap());
    assert_eq!(
        wait_for(&service, &id).await,
        TaskView::Completed {
            translation: "Translation not available for fr to hi.".to_string()
        }
    );

    service.shutdown().await;
    assert!(loads.lock().unwrap().is_empty(), "no model should be loaded");
}

#[tokio::test]
async fn missing_task_id_is_rejected() {
    let service = builder(BracketBackend::default()).build().unwrap();

    assert!(matches!(service.poll(None), Err(TolkError::MissingTaskId)));
    assert!(matches!(service.poll(Some("")), Err(TolkError::MissingTaskId)));
    assert_eq!(
        service.poll_response(None),
        TaskView::Error {
            message: "No task ID provided".to_string()
        }
    );

    service.shutdown().await;
}

#[tokio::test]
async fn unknown_task_id_is_not_found() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let err = service.poll(Some("no-such-task")).unwrap_err();
    assert!(matches!(err, TolkError::TaskNotFound(ref id) if id == "no-such-task"));
    assert!(matches!(
        service.poll_response(Some("no-such-task")),
        TaskView::Error { .. }
    ));

    service.shutdown().await;
}

#[tokio::test]
async fn task_ids_are_unique() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let a = task_id(&service.submit("one", "hi", "en").unwrap());
    let b = task_id(&service.submit("one", "hi", "en").unwrap());
    assert_ne!(a, b);

    service.shutdown().await;
}

// ============================================================================
// Worker behaviour
// ============================================================================

#[tokio::test]
async fn long_input_is_chunked_in_order() {
    let backend = BracketBackend::default();
    let calls = Arc::clone(&backend.calls);
    let service = builder(backend)
        .max_length(4)
        .chunk_threshold_factor(2)
        .chunk_chars(4)
        .build()
        .unwrap();

    let id = task_id(&service.submit("abcdefghij", "hi", "en").unwrap());
    assert_eq!(
        wait_for(&service, &id).await,
        TaskView::Completed {
            translation: "<abcd> <efgh> <ij>".to_string()
        }
    );
    assert_eq!(*calls.lock().unwrap(), vec!["abcd", "efgh", "ij"]);

    service.shutdown().await;
}

#[tokio::test]
async fn input_at_threshold_is_not_chunked() {
    let backend = BracketBackend::default();
    let calls = Arc::clone(&backend.calls);
    let service = builder(backend)
        .max_length(4)
        .chunk_threshold_factor(2)
        .build()
        .unwrap();

    let id = task_id(&service.submit("abcdefgh", "hi", "en").unwrap());
    assert_eq!(
        wait_for(&service, &id).await,
        TaskView::Completed {
            translation: "<abcdefgh>".to_string()
        }
    );
    assert_eq!(calls.lock().unwrap().len(), 1);

    service.shutdown().await;
}

#[tokio::test]
async fn jobs_run_in_submission_order() {
    let backend = BracketBackend::default();
    let calls = Arc::clone(&backend.calls);
    let service = builder(backend).build().unwrap();

    let texts = ["first", "second", "third", "fourth"];
    let pairs = [("hi", "en"), ("fr", "en"), ("hi", "en"), ("en", "fr")];
    let ids: Vec<TaskId> = texts
        .iter()
        .zip(pairs)
        .map(|(text, (src, tgt))| task_id(&service.submit(*text, src, tgt).unwrap()))
        .collect();

    for id in &ids {
        assert!(wait_for(&service, id).await.is_terminal());
    }
    assert_eq!(*calls.lock().unwrap(), texts);

    service.shutdown().await;
}

#[tokio::test]
async fn switching_pairs_reloads_with_single_slot() {
    let backend = BracketBackend::default();
    let loads = Arc::clone(&backend.loads);
    let service = builder(backend).build().unwrap();

    for (text, src) in [("a", "hi"), ("b", "hi"), ("c", "fr"), ("d", "hi")] {
        let id = task_id(&service.submit(text, src, "en").unwrap());
        wait_for(&service, &id).await;
    }

    assert_eq!(
        *loads.lock().unwrap(),
        vec!["opus-hi-en", "opus-fr-en", "opus-hi-en"]
    );
    let status = service.status();
    assert_eq!(status.loaded_models.len(), 1);
    assert_eq!(status.loaded_models[0].model_id, "opus-hi-en");

    service.shutdown().await;
}

#[tokio::test]
async fn translation_error_fails_task_and_worker_continues() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let failed = task_id(&service.submit("fail", "hi", "en").unwrap());
    let next = task_id(&service.submit("after", "hi", "en").unwrap());

    match wait_for(&service, &failed).await {
        TaskView::Error { message } => assert!(message.contains("decoder exploded")),
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(
        wait_for(&service, &next).await,
        TaskView::Completed {
            translation: "<after>".to_string()
        }
    );

    service.shutdown().await;
}

#[tokio::test]
async fn model_load_failure_fails_task() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let id = task_id(&service.submit("text", "xx", "en").unwrap());
    match wait_for(&service, &id).await {
        TaskView::Error { message } => {
            assert!(message.contains("opus-broken"), "message: {message}");
        }
        other => panic!("expected error, got {other:?}"),
    }

    service.shutdown().await;
}

#[tokio::test]
async fn error_text_is_truncated() {
    let service = builder(BracketBackend::default())
        .error_message_chars(10)
        .build()
        .unwrap();

    let id = task_id(&service.submit("text", "xx", "en").unwrap());
    match wait_for(&service, &id).await {
        TaskView::Error { message } => assert_eq!(message, "model opus"),
        other => panic!("expected error, got {other:?}"),
    }

    service.shutdown().await;
}

#[tokio::test]
async fn panic_in_job_reports_server_error_and_worker_survives() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let crashed = task_id(&service.submit("boom", "hi", "en").unwrap());
    let next = task_id(&service.submit("still here", "hi", "en").unwrap());

    assert_eq!(
        wait_for(&service, &crashed).await,
        TaskView::Error {
            message: "server error".to_string()
        }
    );
    assert_eq!(
        wait_for(&service, &next).await,
        TaskView::Completed {
            translation: "<still here>".to_string()
        }
    );
    assert!(service.status().worker_running);

    service.shutdown().await;
}

// ============================================================================
// Status and shutdown
// ============================================================================

#[tokio::test]
async fn status_reports_queue_and_languages() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = BracketBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let service = builder(backend).build().unwrap();

    let ids: Vec<TaskId> = (0..3)
        .map(|i| task_id(&service.submit(format!("t{i}"), "hi", "en").unwrap()))
        .collect();

    let status = service.status();
    assert!(status.worker_running);
    assert_eq!(status.tracked_tasks, 3);
    assert!(status.queue_depth <= 3);
    assert_eq!(status.languages_available, vec!["en", "fr", "hi", "xx"]);
    assert!(status.loaded_models.is_empty());

    gate.add_permits(1);
    for id in &ids {
        wait_for(&service, id).await;
    }
    let status = service.status();
    assert_eq!(status.queue_depth, 0);
    assert_eq!(status.tracked_tasks, 0);

    service.shutdown().await;
}

#[tokio::test]
async fn shutdown_drains_queue_then_rejects_work() {
    let service = builder(BracketBackend::default()).build().unwrap();

    let ids: Vec<TaskId> = ["one", "two", "three"]
        .iter()
        .map(|text| task_id(&service.submit(*text, "hi", "en").unwrap()))
        .collect();

    service.shutdown().await;

    // Everything queued before shutdown was translated and is still readable.
    for id in &ids {
        assert!(matches!(
            service.poll(Some(id.as_str())).unwrap(),
            TaskView::Completed { .. }
        ));
    }

    assert!(matches!(
        service.submit("late", "hi", "en"),
        Err(TolkError::ServiceStopped)
    ));
    let status = service.status();
    assert!(!status.worker_running);
    assert!(status.loaded_models.is_empty());

    // Idempotent.
    service.shutdown().await;
}

#[tokio::test]
async fn build_without_backend_fails() {
    let result = TranslationService::builder().catalog(catalog()).build();
    assert!(matches!(result, Err(TolkError::Configuration(_))));
}

#[tokio::test]
async fn default_catalog_is_embedded_seed() {
    let service = TranslationService::builder()
        .backend(Arc::new(BracketBackend::default()))
        .build()
        .unwrap();

    let languages = service.languages();
    assert_eq!(languages.get("hi").map(String::as_str), Some("Hindi"));
    assert!(service.catalog().supports(&"hi-en".parse().unwrap()));

    service.shutdown().await;
}

// ============================================================================
// Configuration and expiry
// ============================================================================

#[tokio::test]
async fn config_catalog_replaces_embedded_seed() {
    let config: Config = toml::from_str(
        r#"
            [service]
            max_length = 4
            chunk_chars = 4

            [retry]
            max_attempts = 1

            [catalog.languages]
            en = "English"
            ja = "Japanese"

            [catalog.pairs]
            "en-ja" = "opus-en-jap"
        "#,
    )
    .unwrap();

    let backend = BracketBackend::default();
    let loads = Arc::clone(&backend.loads);
    let service = TranslationService::builder()
        .config(&config)
        .unwrap()
        .backend(Arc::new(backend))
        .build()
        .unwrap();

    assert_eq!(
        service.languages().keys().collect::<Vec<_>>(),
        vec!["en", "ja"]
    );

    let custom = task_id(&service.submit("abcdefghij", "en", "ja").unwrap());
    assert_eq!(
        wait_for(&service, &custom).await,
        TaskView::Completed {
            translation: "<abcd> <efgh> <ij>".to_string()
        }
    );

    // A pair from the embedded seed is gone.
    let seeded = task_id(&service.submit("namaste", "hi", "en").unwrap());
    assert_eq!(
        wait_for(&service, &seeded).await,
        TaskView::Completed {
            translation: "Translation not available for hi to en.".to_string()
        }
    );

    service.shutdown().await;
    assert_eq!(*loads.lock().unwrap(), vec!["opus-en-jap"]);
}

#[tokio::test]
async fn task_ttl_does_not_expire_queued_tasks() {
    let gate = Arc::new(Semaphore::new(0));
    let backend = BracketBackend {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let service = builder(backend)
        .task_ttl(Duration::from_millis(50))
        .build()
        .unwrap();

    let id = task_id(&service.submit("hello", "hi", "en").unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        service.poll(Some(id.as_str())).unwrap(),
        TaskView::Processing
    );

    gate.add_permits(1);
    assert_eq!(
        wait_for(&service, &id).await,
        TaskView::Completed {
            translation: "<hello>".to_string()
        }
    );

    service.shutdown().await;
}

#[tokio::test]
async fn task_ttl_expires_unpolled_results() {
    let service = builder(BracketBackend::default())
        .task_ttl(Duration::from_millis(50))
        .build()
        .unwrap();

    let id = task_id(&service.submit("hello", "hi", "en").unwrap());
    // Shutdown drains the queue, so the result is recorded when it returns.
    service.shutdown().await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(matches!(
        service.poll(Some(id.as_str())),
        Err(TolkError::TaskNotFound(_))
    ));
}
