mod common;

use chatdeck::api::ChatBackend;
use chatdeck::controller::{
    EntryState, MessagePanel, Placeholder, UiController, FALLBACK_TITLE, NEW_CONVERSATION_TITLE,
    NO_SELECTION_TITLE, SEND_FAILED_ALERT,
};
use chatdeck::events::{Message, Role};
use chatdeck::store::ListStatus;
use chatdeck::streaming::StreamEvent;
use chatdeck::view::{MessagesView, ModalView, ViewModel, ANSWER_FAILED_TEXT};
use common::{fragment, FakeBackend};

fn last_entry<B: ChatBackend>(controller: &UiController<B>) -> (Role, String, EntryState) {
    match controller.panel() {
        MessagePanel::Thread(entries) => {
            let entry = entries.last().unwrap();
            (entry.role, entry.text.clone(), entry.state)
        }
        other => panic!("expected a thread, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_list_bootstraps_exactly_one_conversation() {
    let backend = FakeBackend::default();
    backend.queue_id("fresh");
    let mut controller = UiController::new(backend.clone());

    controller.reload().await;

    let calls = backend.calls();
    assert_eq!(calls.create, 1);
    assert_eq!(controller.session().current_chat_id(), Some("fresh"));
    assert_eq!(controller.title(), NEW_CONVERSATION_TITLE);
    assert_eq!(controller.panel(), &MessagePanel::Placeholder(Placeholder::Greeting));
    assert!(controller.input_enabled());
    // The ghost conversation is not listed yet and does not trigger another creation.
    assert!(controller.store().is_empty());
}

#[tokio::test]
async fn non_empty_list_does_not_create() {
    let backend = FakeBackend::with_conversations(&[("a", "First"), ("b", "Second")]);
    let mut controller = UiController::new(backend.clone());

    controller.reload().await;

    assert_eq!(backend.calls().create, 0);
    assert_eq!(controller.store().len(), 2);
    assert_eq!(controller.session().current_chat_id(), None);
    assert!(!controller.input_enabled());
    assert_eq!(controller.title(), NO_SELECTION_TITLE);
}

#[tokio::test]
async fn list_failure_is_reported_inline() {
    let backend = FakeBackend::default();
    backend.update(|s| s.fail_list = true);
    let mut controller = UiController::new(backend.clone());

    controller.reload().await;

    assert_eq!(controller.store().status(), ListStatus::Failed);
    assert_eq!(backend.calls().create, 0);
    assert!(controller.alert().is_none());
    let view = ViewModel::build(&controller, chrono::Utc::now());
    assert_eq!(
        view.sidebar.unwrap().placeholder,
        Some("Error loading conversations")
    );
}

#[tokio::test]
async fn select_loads_history_and_title() {
    let backend = FakeBackend::with_conversations(&[("a", "Rust questions")]);
    backend.set_messages("a", vec![Message::user("hi"), Message::ai("**hello**")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    assert!(controller.select("a").await);

    assert_eq!(controller.session().current_chat_id(), Some("a"));
    assert_eq!(controller.title(), "Rust questions");
    assert!(controller.input_enabled());
    match controller.panel() {
        MessagePanel::Thread(entries) => {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].role, Role::User);
            assert_eq!(entries[1].text, "**hello**");
        }
        other => panic!("unexpected panel {:?}", other),
    }
}

#[tokio::test]
async fn selecting_the_active_conversation_does_not_fetch() {
    let backend = FakeBackend::with_conversations(&[("a", "One")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;
    assert_eq!(backend.calls().messages, 1);

    assert!(!controller.select("a").await);
    assert_eq!(backend.calls().messages, 1);
}

#[tokio::test]
async fn empty_history_shows_placeholder() {
    let backend = FakeBackend::with_conversations(&[("a", "")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.select("a").await;

    assert_eq!(controller.panel(), &MessagePanel::Placeholder(Placeholder::NoMessages));
    // Untitled conversations keep whatever the backend says; only unknown ids fall back.
    assert_eq!(controller.title(), "");
}

#[tokio::test]
async fn selecting_an_unlisted_id_uses_fallback_title() {
    let backend = FakeBackend::with_conversations(&[("a", "One")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.select("zzz").await;

    assert_eq!(controller.title(), FALLBACK_TITLE);
}

#[tokio::test]
async fn history_failure_keeps_active_conversation() {
    let backend = FakeBackend::with_conversations(&[("a", "One"), ("b", "Two")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;
    backend.update(|s| s.fail_messages = true);

    assert!(!controller.select("b").await);

    assert_eq!(controller.session().current_chat_id(), Some("a"));
    assert_eq!(controller.panel(), &MessagePanel::Placeholder(Placeholder::LoadFailed));
    assert!(!controller.session().is_busy());
}

#[tokio::test]
async fn deleting_the_active_conversation_disables_input() {
    let backend = FakeBackend::with_conversations(&[("a", "One"), ("b", "Two")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;

    controller.request_delete("a");
    assert_eq!(controller.pending_delete(), Some("a"));
    assert!(controller.confirm_delete().await);

    assert_eq!(backend.calls().delete, 1);
    assert_eq!(controller.session().current_chat_id(), None);
    assert!(!controller.input_enabled());
    assert_eq!(controller.panel(), &MessagePanel::Placeholder(Placeholder::Deleted));
    assert_eq!(controller.title(), NO_SELECTION_TITLE);
    assert_eq!(controller.store().len(), 1);
    assert_eq!(backend.calls().create, 0);
}

#[tokio::test]
async fn deleting_another_conversation_keeps_the_active_one() {
    let backend = FakeBackend::with_conversations(&[("a", "One"), ("b", "Two")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;

    assert!(controller.delete("b").await);

    assert_eq!(controller.session().current_chat_id(), Some("a"));
    assert!(controller.input_enabled());
    assert_eq!(controller.store().len(), 1);
}

#[tokio::test]
async fn deleting_the_last_conversation_bootstraps_a_new_one() {
    let backend = FakeBackend::with_conversations(&[("a", "Only")]);
    backend.queue_id("replacement");
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;

    controller.delete("a").await;

    assert_eq!(backend.calls().create, 1);
    assert_eq!(controller.session().current_chat_id(), Some("replacement"));
}

#[tokio::test]
async fn cancelled_delete_does_nothing() {
    let backend = FakeBackend::with_conversations(&[("a", "One")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.request_delete("a");
    controller.cancel_delete();

    assert!(!controller.confirm_delete().await);
    assert_eq!(backend.calls().delete, 0);
}

#[tokio::test]
async fn delete_failure_raises_an_alert() {
    let backend = FakeBackend::with_conversations(&[("a", "One")]);
    backend.update(|s| s.fail_delete = true);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;

    assert!(!controller.delete("a").await);

    assert_eq!(controller.alert(), Some("Error deleting conversation."));
    assert_eq!(controller.session().current_chat_id(), Some("a"));
    assert!(!controller.session().is_busy());

    controller.dismiss_alert();
    assert!(controller.alert().is_none());
}

#[tokio::test]
async fn create_failure_raises_an_alert() {
    let backend = FakeBackend::default();
    backend.update(|s| s.fail_create = true);
    let mut controller = UiController::new(backend.clone());

    controller.reload().await;

    assert_eq!(
        controller.alert(),
        Some("Error creating new conversation. Please try again.")
    );
    assert_eq!(controller.session().current_chat_id(), None);
    assert!(!controller.session().is_busy());
}

#[tokio::test]
async fn fragments_accumulate_into_the_answer() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(vec![fragment("Hel"), fragment("lo")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    assert!(controller.send("  greet me  ").await);
    assert!(controller.session().is_busy());
    assert!(!controller.input_enabled());
    controller.wait_stream().await;

    assert_eq!(last_entry(&controller), (Role::Ai, "Hello".to_string(), EntryState::Settled));
    match controller.panel() {
        MessagePanel::Thread(entries) => {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].text, "greet me");
        }
        other => panic!("unexpected panel {:?}", other),
    }
    assert!(!controller.session().is_busy());
    assert!(controller.input_enabled());
    assert!(!controller.is_streaming());
}

#[tokio::test]
async fn completed_answer_refreshes_title_from_the_list() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(vec![fragment("Sure."), StreamEvent::Done]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    assert_eq!(controller.title(), NEW_CONVERSATION_TITLE);

    controller.send("Explain lifetimes").await;
    controller.wait_stream().await;

    assert_eq!(controller.store().len(), 1);
    assert_eq!(controller.title(), "Explain lifetimes");
}

#[tokio::test]
async fn pump_stream_drains_without_waiting() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(vec![fragment("a"), fragment("b"), StreamEvent::Done]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.send("q").await;

    assert!(!controller.pump_stream().await);

    assert_eq!(last_entry(&controller).1, "ab");
    assert!(!controller.session().is_busy());
}

#[tokio::test]
async fn stream_without_content_fails_inline_and_alerts() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(Vec::new());
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.send("hello?").await;
    controller.wait_stream().await;

    assert_eq!(last_entry(&controller).2, EntryState::Failed);
    assert_eq!(controller.alert(), Some(SEND_FAILED_ALERT));
    assert!(!controller.session().is_busy());
    assert!(controller.input_enabled());

    let view = ViewModel::build(&controller, chrono::Utc::now());
    assert_eq!(view.modal, Some(ModalView::Alert(SEND_FAILED_ALERT.to_string())));
    match view.messages {
        MessagesView::Thread { entries, .. } => {
            let body: String = entries[1].body.lines[0]
                .spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect();
            assert_eq!(body, ANSWER_FAILED_TEXT);
        }
        other => panic!("unexpected view {:?}", other),
    }
}

#[tokio::test]
async fn explicit_done_with_no_content_is_a_success() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(vec![StreamEvent::Done]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.send("say nothing").await;
    controller.wait_stream().await;

    assert_eq!(last_entry(&controller), (Role::Ai, String::new(), EntryState::Settled));
}

#[tokio::test]
async fn transport_error_after_content_keeps_partial_answer() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.queue_answer(vec![fragment("partial"), StreamEvent::Failed("reset".into())]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    controller.send("q").await;
    controller.wait_stream().await;

    assert_eq!(last_entry(&controller), (Role::Ai, "partial".to_string(), EntryState::Settled));
    assert!(controller.alert().is_none());
}

#[tokio::test]
async fn send_failure_marks_answer_and_alerts() {
    let backend = FakeBackend::default();
    backend.queue_id("c1");
    backend.update(|s| s.fail_stream = true);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    assert!(!controller.send("hi").await);

    assert_eq!(last_entry(&controller).2, EntryState::Failed);
    assert_eq!(
        controller.alert(),
        Some("Error sending message. Please try again.")
    );
    assert!(controller.input_enabled());
}

#[tokio::test]
async fn actions_while_busy_are_dropped() {
    let backend = FakeBackend::with_conversations(&[("a", "One"), ("b", "Two")]);
    backend.queue_answer(vec![fragment("slow")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;
    controller.send("q").await;
    assert!(controller.session().is_busy());

    assert!(!controller.create().await);
    assert!(!controller.select("b").await);
    assert!(!controller.delete("b").await);
    assert!(!controller.send("again").await);
    controller.request_delete("b");

    let calls = backend.calls();
    assert_eq!(calls.create, 0);
    assert_eq!(calls.messages, 1);
    assert_eq!(calls.delete, 0);
    assert_eq!(calls.stream, 1);
    assert_eq!(controller.pending_delete(), None);

    controller.wait_stream().await;
    assert!(!controller.session().is_busy());
}

#[tokio::test]
async fn blank_questions_and_missing_conversation_do_not_send() {
    let backend = FakeBackend::with_conversations(&[("a", "One")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;

    assert!(!controller.send("hello").await);
    controller.select("a").await;
    assert!(!controller.send("   ").await);

    assert_eq!(backend.calls().stream, 0);
}

#[tokio::test]
async fn view_model_reflects_controller_state() {
    let backend = FakeBackend::with_conversations(&[("a", "<b>Bold</b> title"), ("b", "Two")]);
    backend.set_messages("a", vec![Message::user("<b>x</b>")]);
    let mut controller = UiController::new(backend.clone());
    controller.reload().await;
    controller.select("a").await;
    controller.request_delete("b");

    let view = ViewModel::build(&controller, chrono::Utc::now());

    let sidebar = view.sidebar.expect("sidebar visible");
    assert_eq!(sidebar.items.len(), 2);
    assert!(sidebar.items[0].active);
    assert_eq!(sidebar.items[0].title, "<b>Bold</b> title");
    assert_eq!(sidebar.items[0].date, "");
    assert!(view.composer.enabled);
    assert_eq!(
        view.modal,
        Some(ModalView::ConfirmDelete {
            title: "Two".to_string()
        })
    );
    match view.messages {
        MessagesView::Thread { entries, .. } => {
            let text: String = entries[0].body.lines[0]
                .spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect();
            assert_eq!(text, "<b>x</b>");
        }
        other => panic!("unexpected view {:?}", other),
    }

    controller.toggle_sidebar();
    assert!(ViewModel::build(&controller, chrono::Utc::now()).sidebar.is_none());
}
