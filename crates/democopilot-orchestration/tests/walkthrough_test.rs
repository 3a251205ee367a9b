//! End-to-end walkthrough scenarios against recorded collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FIVE_WORDS, Harness, TEN_WORDS, click, script_of, step};
use democopilot_core::action::{ActionSpec, ActionStatus};
use democopilot_core::browser::BrowserError;
use democopilot_core::error::DomainError;
use democopilot_core::language_model::ProductContext;
use democopilot_core::state::SessionState;
use democopilot_orchestration::application::session_machine::SessionOutcome;
use democopilot_orchestration::config::EngineConfig;
use democopilot_orchestration::domain::question::FollowUp;
use democopilot_orchestration::domain::script::DemoScript;
use democopilot_test_support::{
    BrowserCall, RecordingBrowser, ScriptedLanguageModel, ScriptedSpeech, SilentSpeech,
};
use tokio::time::{Instant, sleep};

fn clicks(prefix: &str, count: usize) -> Vec<ActionSpec> {
    (0..count).map(|i| click(&format!("#{prefix}{i}"))).collect()
}

#[tokio::test(start_paused = true)]
async fn test_happy_path_runs_every_step_in_order() {
    // Arrange
    let script = DemoScript::new(
        "tour",
        vec![
            step("login", TEN_WORDS, clicks("login", 2)),
            step("dashboard", TEN_WORDS, clicks("dash", 3)),
            step("reports", TEN_WORDS, clicks("rep", 1)),
        ],
    )
    .unwrap();
    let browser = Arc::new(RecordingBrowser::new());
    let speech = Arc::new(ScriptedSpeech::per_word(Duration::from_millis(400)));
    let harness = Harness::new(
        script,
        browser.clone(),
        speech.clone(),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let started = Instant::now();

    // Act
    let outcome = harness.spawn().await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(started.elapsed(), Duration::from_secs(12));
    let expected: Vec<BrowserCall> = [
        "#login0", "#login1", "#dash0", "#dash1", "#dash2", "#rep0",
    ]
    .iter()
    .map(|s| BrowserCall::Click((*s).to_owned()))
    .collect();
    assert_eq!(browser.action_calls(), expected);
    assert_eq!(speech.spoken().len(), 3);
    assert_eq!(harness.observer.audio().len(), 3);
    assert_eq!(
        harness.observer.executed_steps(),
        vec!["login", "dashboard", "reports"]
    );
    assert_eq!(
        harness.observer.states(),
        vec![
            SessionState::Starting,
            SessionState::Running,
            SessionState::Completed
        ]
    );

    let snapshot = harness.machine.snapshot();
    assert_eq!(snapshot.state, SessionState::Completed);
    assert!((snapshot.percent_complete - 100.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.last_step.unwrap().drift_ms, 0);

    let percents: Vec<f64> = harness
        .observer
        .snapshots()
        .iter()
        .map(|s| s.percent_complete)
        .collect();
    assert!(percents.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_narration_runs_actions_back_to_back() {
    // Arrange
    let actions = vec![
        click("#a"),
        ActionSpec::Wait { duration_ms: 500 },
        click("#b"),
    ];
    let script = DemoScript::new(
        "silent",
        vec![
            step("one", TEN_WORDS, actions.clone()),
            step("two", TEN_WORDS, actions),
        ],
    )
    .unwrap();
    let browser = Arc::new(RecordingBrowser::new());
    let speech = Arc::new(SilentSpeech::default());
    let harness = Harness::new(
        script,
        browser.clone(),
        speech.clone(),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let started = Instant::now();

    // Act
    let outcome = harness.spawn().await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(started.elapsed(), Duration::from_secs(1));
    assert_eq!(browser.action_calls().len(), 4);
    assert_eq!(speech.calls(), 0);
    assert_eq!(harness.machine.state(), SessionState::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_at_next_action_boundary() {
    // Arrange: 4s narration, 400ms lead, 640ms per action
    let script =
        DemoScript::new("pause", vec![step("overview", TEN_WORDS, clicks("b", 5))]).unwrap();
    let browser = Arc::new(RecordingBrowser::new());
    let harness = Harness::new(
        script,
        browser.clone(),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(4))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_millis(1_500)).await;
    let dispatched_before_pause = browser.action_calls().len();
    harness.machine.pause().unwrap();
    sleep(Duration::from_secs(10)).await;
    let dispatched_while_paused = browser.action_calls().len();
    let state_while_paused = harness.machine.state();
    harness.machine.resume().unwrap();
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert_eq!(dispatched_before_pause, 2);
    assert_eq!(dispatched_while_paused, 2);
    assert_eq!(state_while_paused, SessionState::Paused);
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(browser.action_calls().len(), 5);

    let snapshot = harness.machine.snapshot();
    assert_eq!(snapshot.pauses_taken, 1);
    // Finished at 13.42s of wall time with 10s paused.
    assert!((snapshot.elapsed_active_seconds - 3.42).abs() < 0.05);
    assert_eq!(
        harness.observer.states(),
        vec![
            SessionState::Starting,
            SessionState::Running,
            SessionState::Paused,
            SessionState::Running,
            SessionState::Completed
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_question_with_jump_redirects_after_current_step() {
    // Arrange: each step lasts 2s
    let script = script_of(
        &["intro", "features", "integrations", "pricing", "closing"],
        FIVE_WORDS,
    );
    let speech = Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2)));
    let model = Arc::new(ScriptedLanguageModel::jumping_to(
        "Let me show you pricing.",
        "pricing",
    ));
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        speech.clone(),
        model.clone(),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(3)).await;
    let ticket = harness.machine.ask_question("How much does it cost?").unwrap();
    let second = harness.machine.ask_question("And for enterprises?");
    let pause_while_answering = harness.machine.pause();
    let resolved = ticket.resolved().await.unwrap();
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert!(matches!(
        second,
        Err(DomainError::InvalidTransition {
            state: SessionState::AnsweringQuestion,
            ..
        })
    ));
    assert!(pause_while_answering.is_err());
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(
        harness.observer.executed_steps(),
        vec!["intro", "features", "pricing", "closing"]
    );

    let resolution = resolved.resolution.unwrap();
    assert_eq!(resolution.directive, FollowUp::JumpToStep);
    assert!(resolution.jumped);
    assert!(!resolution.fallback);

    let answers: Vec<String> = speech
        .spoken()
        .into_iter()
        .filter(|text| text.starts_with("Great question."))
        .collect();
    assert_eq!(answers, vec!["Great question. Let me show you pricing."]);

    let received = model.received();
    let (question, context) = &received[0];
    assert_eq!(question, "How much does it cost?");
    assert_eq!(context.current_step.as_deref(), Some("features"));
    assert_eq!(context.customer_name.as_deref(), Some("Grace"));
    assert_eq!(context.available_steps.len(), 5);
    assert_eq!(harness.machine.snapshot().questions_answered, 1);
}

#[tokio::test(start_paused = true)]
async fn test_question_context_carries_product_facts() {
    // Arrange
    let product = ProductContext {
        name: "InSign".to_owned(),
        description: Some("Electronic signatures for small teams.".to_owned()),
        features: vec!["Bulk send".to_owned(), "Audit trails".to_owned()],
        pricing: Some("From $10 per user per month".to_owned()),
    };
    let script = script_of(&["intro", "closing"], FIVE_WORDS).with_product(product.clone());
    let model = Arc::new(ScriptedLanguageModel::answering("Ten dollars a seat."));
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        model.clone(),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    let ticket = harness.machine.ask_question("What does it cost?").unwrap();
    ticket.resolved().await.unwrap();
    driver.await.unwrap().unwrap();

    // Assert
    let received = model.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].1.product, Some(product));
}

#[tokio::test(start_paused = true)]
async fn test_resume_cue_is_spoken_once_before_next_step() {
    // Arrange: each step lasts 2s, as does the cue
    let script = script_of(&["intro", "features"], FIVE_WORDS);
    let speech = Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2)));
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        speech.clone(),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let started = Instant::now();
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    harness.machine.pause().unwrap();
    sleep(Duration::from_secs(3)).await;
    harness.machine.resume().unwrap();
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(started.elapsed(), Duration::from_secs(8));
    let cue = EngineConfig::default().resume_cue;
    assert_eq!(
        speech.spoken(),
        vec![FIVE_WORDS.to_owned(), cue, FIVE_WORDS.to_owned()]
    );
    assert_eq!(harness.observer.audio().len(), 3);
    assert_eq!(harness.observer.executed_steps(), vec!["intro", "features"]);
}

#[tokio::test(start_paused = true)]
async fn test_jump_to_unknown_step_continues_in_order() {
    // Arrange
    let script = script_of(&["a", "b", "c"], FIVE_WORDS);
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::jumping_to("Over here.", "nonexistent")),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    let ticket = harness.machine.ask_question("Can you show me billing?").unwrap();
    let resolved = ticket.resolved().await.unwrap();
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Completed);
    assert!(!resolved.resolution.unwrap().jumped);
    assert_eq!(harness.observer.executed_steps(), vec!["a", "b", "c"]);
}

#[tokio::test(start_paused = true)]
async fn test_single_failing_action_does_not_stop_the_step() {
    // Arrange
    let script =
        DemoScript::new("flaky", vec![step("form", TEN_WORDS, clicks("b", 5))]).unwrap();
    let browser = Arc::new(
        RecordingBrowser::new().failing_on("#b2", BrowserError::ElementNotFound("#b2".into())),
    );
    let harness = Harness::new(
        script,
        browser.clone(),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(4))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );

    // Act
    let outcome = harness.spawn().await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(browser.action_calls().len(), 5);
    let results = harness.observer.step_results();
    let (_, outcomes) = &results[0];
    let statuses: Vec<ActionStatus> = outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            ActionStatus::Succeeded,
            ActionStatus::Succeeded,
            ActionStatus::Failed,
            ActionStatus::Succeeded,
            ActionStatus::Succeeded
        ]
    );
    assert_eq!(harness.machine.snapshot().last_step.unwrap().failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_lost_browser_fails_the_session() {
    // Arrange
    let script = script_of(&["a", "b", "c"], FIVE_WORDS);
    let browser = Arc::new(
        RecordingBrowser::new().failing_on("#b", BrowserError::SessionLost("tab crashed".into())),
    );
    let harness = Harness::new(
        script,
        browser.clone(),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );

    // Act
    let result = harness.spawn().await.unwrap();
    harness.machine.stop().await;

    // Assert
    assert!(matches!(result, Err(DomainError::FatalCollaborator(_))));
    assert_eq!(harness.machine.state(), SessionState::Failed);
    assert_eq!(harness.observer.executed_steps(), vec!["a"]);
    assert_eq!(
        browser.action_calls(),
        vec![
            BrowserCall::Click("#a".to_owned()),
            BrowserCall::Click("#b".to_owned())
        ]
    );
    assert_eq!(browser.shutdown_count(), 1);
    assert!(
        harness
            .machine
            .snapshot()
            .last_error
            .unwrap()
            .contains("tab crashed")
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_paused_releases_browser() {
    // Arrange
    let script = script_of(&["intro", "middle", "end"], FIVE_WORDS);
    let browser = Arc::new(RecordingBrowser::new());
    let harness = Harness::new(
        script,
        browser.clone(),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    harness.machine.pause().unwrap();
    sleep(Duration::from_secs(4)).await;
    harness.machine.stop().await;
    harness.machine.stop().await;
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert_eq!(outcome, SessionOutcome::Stopped);
    assert_eq!(harness.machine.state(), SessionState::Idle);
    assert_eq!(harness.observer.executed_steps(), vec!["intro"]);
    assert_eq!(browser.shutdown_count(), 1);
    assert_eq!(
        harness.observer.states().last(),
        Some(&SessionState::Idle)
    );
    assert_eq!(
        harness
            .observer
            .states()
            .iter()
            .filter(|s| **s == SessionState::Idle)
            .count(),
        1
    );
    assert!(harness.machine.start().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_stop_abandons_pending_question() {
    // Arrange
    let script = script_of(&["intro", "end"], FIVE_WORDS);
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::answering("Sure.")),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    let ticket = harness.machine.ask_question("Is there an API?").unwrap();
    harness.machine.stop().await;
    let resolved = ticket.resolved().await;
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert!(resolved.is_none());
    assert_eq!(outcome, SessionOutcome::Stopped);
    assert_eq!(harness.machine.snapshot().questions_answered, 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_redirects_after_current_step() {
    // Arrange
    let script = script_of(&["a", "b", "c", "d"], FIVE_WORDS);
    let harness = Harness::new(
        script,
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );
    let driver = harness.spawn();

    // Act
    sleep(Duration::from_secs(1)).await;
    let unknown = harness.machine.skip_to("zzz");
    harness.machine.skip_to("d").unwrap();
    let outcome = driver.await.unwrap().unwrap();

    // Assert
    assert!(matches!(unknown, Err(DomainError::StepNotFound(name)) if name == "zzz"));
    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(harness.observer.executed_steps(), vec!["a", "d"]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_script_completes_immediately() {
    let harness = Harness::new(
        DemoScript::new("empty", Vec::new()).unwrap(),
        Arc::new(RecordingBrowser::new()),
        Arc::new(ScriptedSpeech::fixed(Duration::from_secs(2))),
        Arc::new(ScriptedLanguageModel::answering("unused")),
    );

    let outcome = harness.spawn().await.unwrap().unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert!((harness.machine.snapshot().percent_complete - 100.0).abs() < f64::EPSILON);
}
