use super::*;
use crate::test_support::{meeting, note, FakeGateway};

async fn notes_setup(gateway: &FakeGateway) -> (Arc<NoteListController>, NoteEnhancementController) {
    let notes = Arc::new(NoteListController::new(
        Arc::new(gateway.clone()),
        MeetingId(3),
    ));
    notes.load().await.expect("load");
    let controller =
        NoteEnhancementController::for_notes(Arc::new(gateway.clone()), Arc::clone(&notes));
    (notes, controller)
}

fn two_notes() -> FakeGateway {
    FakeGateway::new().with_notes(vec![note(10, 3, 1, "X"), note(11, 3, 2, "second")])
}

async fn shown(notes: &NoteListController, id: i64) -> String {
    notes
        .find(NoteId(id))
        .await
        .map(|n| n.content)
        .unwrap_or_default()
}

#[tokio::test]
async fn enhance_then_undo_restores_exact_content() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;

    controller.enhance(NoteId(10)).await.expect("enhance");
    assert_eq!(shown(&notes, 10).await, "X (enhanced)");
    assert_eq!(controller.phase(NoteId(10)).await, EnhancePhase::Settled);
    assert!(controller.can_undo(NoteId(10)).await);

    controller.undo(NoteId(10)).await.expect("undo");
    assert_eq!(shown(&notes, 10).await, "X");
    assert_eq!(gateway.stored_note(10).map(|n| n.content), Some("X".into()));
    assert_eq!(controller.phase(NoteId(10)).await, EnhancePhase::Idle);
    assert!(!controller.can_undo(NoteId(10)).await);

    assert_eq!(
        gateway.calls_to("update_note"),
        vec!["update_note:10=X (enhanced)", "update_note:10=X"]
    );
}

#[tokio::test]
async fn failed_enhancement_leaves_content_and_offers_no_undo() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;
    gateway.fail_next("enhance", 500, "LLM provider unavailable");

    let err = controller.enhance(NoteId(10)).await.expect_err("must fail");

    assert_eq!(err.message(), "LLM provider unavailable");
    assert_eq!(
        controller.phase(NoteId(10)).await,
        EnhancePhase::Failed("LLM provider unavailable".into())
    );
    assert!(!controller.can_undo(NoteId(10)).await);
    assert_eq!(shown(&notes, 10).await, "X");
    assert!(gateway.calls_to("update_note").is_empty());
}

#[tokio::test]
async fn failed_save_of_enhanced_text_counts_as_failure() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;
    gateway.fail_next("update_note", 500, "database is locked");

    controller.enhance(NoteId(10)).await.expect_err("must fail");

    assert!(!controller.can_undo(NoteId(10)).await);
    assert_eq!(gateway.stored_note(10).map(|n| n.content), Some("X".into()));
    assert_eq!(shown(&notes, 10).await, "X");
}

#[tokio::test]
async fn second_enhancement_replaces_the_undo_slot() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;

    controller.enhance(NoteId(10)).await.expect("first");
    controller.enhance(NoteId(10)).await.expect("second");
    assert_eq!(shown(&notes, 10).await, "X (enhanced) (enhanced)");

    controller.undo(NoteId(10)).await.expect("undo");
    assert_eq!(shown(&notes, 10).await, "X (enhanced)");
    assert!(!controller.can_undo(NoteId(10)).await);
}

#[tokio::test]
async fn failed_reenhancement_discards_the_earlier_undo() {
    let gateway = two_notes();
    let (_notes, controller) = notes_setup(&gateway).await;

    controller.enhance(NoteId(10)).await.expect("first");
    gateway.fail_next_transport("enhance");
    controller.enhance(NoteId(10)).await.expect_err("second");

    assert!(!controller.can_undo(NoteId(10)).await);
    let err = controller.undo(NoteId(10)).await.expect_err("nothing to undo");
    assert!(matches!(err, ClientError::Precondition(_)));
}

#[tokio::test]
async fn failed_undo_keeps_the_slot_for_retry() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;
    controller.enhance(NoteId(10)).await.expect("enhance");

    gateway.fail_next("update_note", 500, "database is locked");
    controller.undo(NoteId(10)).await.expect_err("undo fails");
    assert!(controller.can_undo(NoteId(10)).await);
    assert_eq!(shown(&notes, 10).await, "X (enhanced)");

    controller.undo(NoteId(10)).await.expect("retry");
    assert_eq!(shown(&notes, 10).await, "X");
}

#[tokio::test]
async fn requests_for_a_busy_target_are_rejected() {
    let gateway = two_notes();
    let (_notes, controller) = notes_setup(&gateway).await;
    let release = gateway.hold("enhance");

    let first = controller.enhance(NoteId(10));
    let second = async {
        while !controller.is_pending(NoteId(10)).await {
            tokio::task::yield_now().await;
        }
        let again = controller.enhance(NoteId(10)).await.expect_err("busy");
        let undo = controller.undo(NoteId(10)).await.expect_err("busy");
        // Other notes are independent.
        controller.enhance(NoteId(11)).await.expect("other note");
        release.send(()).expect("release");
        (again, undo)
    };
    let (first, (again, undo)) = tokio::join!(first, second);

    first.expect("first enhancement");
    assert!(matches!(again, ClientError::Precondition(_)));
    assert!(matches!(undo, ClientError::Precondition(_)));
    assert_eq!(gateway.calls_to("enhance").len(), 2);
    assert!(controller.can_undo(NoteId(10)).await);
    assert!(controller.can_undo(NoteId(11)).await);
}

#[tokio::test]
async fn undo_slots_are_per_note() {
    let gateway = two_notes();
    let (notes, controller) = notes_setup(&gateway).await;

    controller.enhance(NoteId(10)).await.expect("10");
    controller.enhance(NoteId(11)).await.expect("11");
    controller.undo(NoteId(10)).await.expect("undo 10");

    assert_eq!(shown(&notes, 10).await, "X");
    assert_eq!(shown(&notes, 11).await, "second (enhanced)");
    assert!(controller.can_undo(NoteId(11)).await);
}

#[tokio::test]
async fn note_must_be_loaded() {
    let gateway = two_notes();
    let (_notes, controller) = notes_setup(&gateway).await;

    let err = controller.enhance(NoteId(99)).await.expect_err("unknown");

    assert!(matches!(err, ClientError::Precondition(_)));
    assert!(gateway.calls_to("enhance").is_empty());
    assert_eq!(controller.phase(NoteId(99)).await, EnhancePhase::Idle);
}

async fn meeting_setup(gateway: &FakeGateway) -> (Arc<MeetingDetailController>, SummaryController) {
    let detail = Arc::new(MeetingDetailController::new(Arc::new(gateway.clone())));
    detail.load(MeetingId(5)).await.expect("load");
    let controller = SummaryController::for_meeting(Arc::new(gateway.clone()), Arc::clone(&detail));
    (detail, controller)
}

#[tokio::test]
async fn summary_undo_restores_previous_summary() {
    let mut existing = meeting(5, "Planning");
    existing.summary = Some("hand written".into());
    let gateway = FakeGateway::new().with_meetings(vec![existing]);
    gateway.set_summary_text("generated summary");
    let (detail, controller) = meeting_setup(&gateway).await;

    controller.enhance(MeetingId(5)).await.expect("summarize");
    assert_eq!(
        detail.entity().await.and_then(|m| m.summary),
        Some("generated summary".into())
    );
    assert!(controller.can_undo(MeetingId(5)).await);

    controller.undo(MeetingId(5)).await.expect("undo");
    assert_eq!(
        detail.entity().await.and_then(|m| m.summary),
        Some("hand written".into())
    );
    assert_eq!(
        gateway.stored_meeting(5).and_then(|m| m.summary),
        Some("hand written".into())
    );
    assert_eq!(gateway.calls_to("update_meeting"), vec!["update_meeting:5"]);
}

#[tokio::test]
async fn summary_undo_clears_a_summary_that_did_not_exist() {
    let gateway = FakeGateway::new().with_meetings(vec![meeting(5, "Planning")]);
    let (detail, controller) = meeting_setup(&gateway).await;

    controller.enhance(MeetingId(5)).await.expect("summarize");
    assert_eq!(
        detail.entity().await.and_then(|m| m.summary),
        Some("Summary of 0 notes".into())
    );

    controller.undo(MeetingId(5)).await.expect("undo");
    assert_eq!(detail.entity().await.and_then(|m| m.summary), None);
    assert_eq!(detail.entity().await.map(|m| m.subject), Some("Planning".into()));
}

#[tokio::test]
async fn failed_summary_keeps_displayed_meeting() {
    let gateway = FakeGateway::new().with_meetings(vec![meeting(5, "Planning")]);
    let (detail, controller) = meeting_setup(&gateway).await;
    gateway.fail_next("summarize", 400, "no notes to summarize");

    let err = controller.enhance(MeetingId(5)).await.expect_err("fails");

    assert_eq!(err.status(), Some(400));
    assert_eq!(detail.entity().await.and_then(|m| m.summary), None);
    assert!(!controller.can_undo(MeetingId(5)).await);
}

#[test]
fn flow_transitions() {
    let mut flow = TargetFlow::default();
    assert!(!flow.can_undo());

    flow.begin_enhance("X".to_string()).expect("begin");
    assert!(!flow.can_undo());
    assert!(flow.begin_undo().is_err());
    flow.enhance_succeeded();
    assert_eq!(flow.previous(), Some(&"X".to_string()));

    assert_eq!(flow.begin_undo().expect("undo"), "X");
    flow.undo_failed("offline".into());
    assert!(flow.can_undo());
    assert_eq!(flow.phase(), &EnhancePhase::Failed("offline".into()));

    flow.begin_undo().expect("retry");
    flow.undo_succeeded();
    assert!(!flow.can_undo());
    assert_eq!(flow.phase(), &EnhancePhase::Idle);
}
