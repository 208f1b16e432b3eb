mod common;

use common::FakeSandbox;
use lucidra_core::{
    CompletionStatus, DashboardPoller, MissionForm, MissionStore, SubtaskForm, SubtaskStatus,
    TemplateCatalog,
};
use std::sync::Arc;
use std::time::Duration;

fn store_for(fake: &FakeSandbox) -> MissionStore {
    MissionStore::new(Arc::new(fake.client()), TemplateCatalog::builtin())
}

#[tokio::test]
async fn mission_subtask_iteration_flow() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    let mission = store.create_mission("X", "Y", "Z", None).await.unwrap();
    assert!(!mission.id.is_empty());
    assert_eq!(mission.total_xp, 0);
    assert!(mission.subtasks.is_empty());
    assert_eq!(mission.category, "custom");
    assert_eq!(mission.completion_status, CompletionStatus::NotStarted);

    let mut form = SubtaskForm::new("Size the market", "Estimate TAM for {region}");
    form.add_constraint("Use public data only");
    let subtask = form.submit(&store, &mission.id).await.unwrap();

    let fetched = store.get_mission(&mission.id).await.unwrap();
    assert_eq!(fetched.subtasks.len(), 1);
    assert_eq!(fetched.subtasks[0].constraints, vec!["Use public data only"]);

    let iteration = store
        .add_iteration(
            &mission.id,
            &subtask.id,
            "Estimate TAM for Norway",
            "Roughly 2.1B NOK",
            Some("Check the source"),
        )
        .await
        .unwrap();
    assert_eq!(iteration.prompt_used, "Estimate TAM for Norway");

    let fetched = store.get_mission(&mission.id).await.unwrap();
    let history = &fetched.subtask(&subtask.id).unwrap().iterations;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].prompt_used, "Estimate TAM for Norway");
    assert_eq!(history[0].advisor_response, "Roughly 2.1B NOK");
    assert_eq!(history[0].user_annotation.as_deref(), Some("Check the source"));
    assert_eq!(store.current_mission().await, Some(fetched));
    assert!(store.error().await.is_none());
}

#[tokio::test]
async fn iterations_keep_insertion_order() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    let mission = store.create_mission("X", "Y", "Z", None).await.unwrap();
    let subtask = SubtaskForm::new("Draft", "Write {thing}")
        .submit(&store, &mission.id)
        .await
        .unwrap();

    for i in 0..5 {
        let prompt = format!("prompt {i}");
        store
            .add_iteration(&mission.id, &subtask.id, &prompt, "ok", None)
            .await
            .unwrap();
    }

    let prompts: Vec<String> = fake
        .mission(&mission.id)
        .unwrap()
        .subtasks[0]
        .iterations
        .iter()
        .map(|it| it.prompt_used.clone())
        .collect();
    assert_eq!(
        prompts,
        (0..5).map(|i| format!("prompt {i}")).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn empty_mission_form_never_reaches_server() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    assert!(MissionForm::new("", "", "").submit(&store).await.is_none());
    assert_eq!(fake.request_count(), 0);
    let error = store.error().await.unwrap();
    assert!(error.contains("title"));

    // The store itself does not validate
    let mission = store.create_mission("", "", "", None).await;
    assert!(mission.is_some());
    assert_eq!(fake.request_count(), 1);
}

#[tokio::test]
async fn created_mission_is_not_merged_into_cached_list() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    assert!(store.refresh_dashboard().await);
    assert!(store.dashboard().await.unwrap().missions.is_empty());

    let mission = store
        .create_mission_from_template("blue-ocean")
        .await
        .unwrap();
    assert!(store.dashboard().await.unwrap().missions.is_empty());

    assert!(store.refresh_dashboard().await);
    let dashboard = store.dashboard().await.unwrap();
    assert_eq!(dashboard.missions.len(), 1);
    assert_eq!(dashboard.mission(&mission.id).unwrap().title, "Blue Ocean Strategy");
}

#[tokio::test]
async fn assignment_is_reflected_only_after_refetch() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    let mission = store.create_mission("X", "Y", "Z", None).await.unwrap();
    let subtask = SubtaskForm::new("Draft", "Write {thing}")
        .submit(&store, &mission.id)
        .await
        .unwrap();
    assert!(store.refresh_dashboard().await);

    assert!(store.assign_advisor(&mission.id, &subtask.id, "strategist").await);
    let cached = store.dashboard().await.unwrap();
    assert_eq!(cached.missions[0].subtasks[0].assigned_advisor, None);

    let fetched = store.get_mission(&mission.id).await.unwrap();
    let assigned = fetched.subtask(&subtask.id).unwrap();
    assert_eq!(assigned.assigned_advisor.as_deref(), Some("strategist"));
    assert_eq!(assigned.status, SubtaskStatus::Assigned);
}

#[tokio::test]
async fn server_rejection_surfaces_its_message() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    // No roster cached, so the server decides
    let mission = store.create_mission("X", "Y", "Z", None).await.unwrap();
    let subtask = SubtaskForm::new("Draft", "Write {thing}")
        .submit(&store, &mission.id)
        .await
        .unwrap();

    assert!(!store.assign_advisor(&mission.id, &subtask.id, "ghost").await);
    assert_eq!(store.error().await.as_deref(), Some("Advisor not found"));

    assert!(store.get_mission("mission-404").await.is_none());
    assert_eq!(store.error().await.as_deref(), Some("Mission not found"));
}

#[tokio::test]
async fn session_issued_on_first_contact_is_reused() {
    let fake = FakeSandbox::start().await;
    let store = store_for(&fake);

    assert!(store.refresh_dashboard().await);
    assert!(store.get_user_progress().await.is_some());
    store.create_mission("X", "Y", "Z", None).await.unwrap();

    assert_eq!(
        fake.sessions_seen(),
        vec![
            None,
            Some("session-1".to_string()),
            Some("session-1".to_string())
        ]
    );
}

#[tokio::test]
async fn poller_refreshes_until_stopped() {
    let fake = FakeSandbox::start().await;
    let store = Arc::new(store_for(&fake));

    let handle = DashboardPoller::new(Arc::clone(&store), Duration::from_millis(50)).start();
    tokio::time::sleep(Duration::from_millis(180)).await;
    assert!(handle.ticks() >= 2);
    assert!(store.dashboard().await.is_some());

    handle.stop().await;
    let seen = fake.request_count();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fake.request_count(), seen);
}
