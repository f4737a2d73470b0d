use std::sync::Arc;
use std::time::Duration;

use futures::stream::StreamExt;

use zakchat::application::ports::ConversationRepository;
use zakchat::application::services::{ChatError, ChatService, RelayEvent};
use zakchat::domain::{Conversation, ConversationId, InlineImage, MessageRole, UserId};
use zakchat::infrastructure::llm::MockModelGateway;
use zakchat::infrastructure::persistence::InMemoryConversationRepository;

const SYSTEM_PROMPT: &str = "be rude";

struct Fixture {
    service: ChatService<MockModelGateway>,
    gateway: MockModelGateway,
    repository: InMemoryConversationRepository,
    owner: UserId,
    conversation_id: ConversationId,
}

async fn fixture_with_timeout(gateway: MockModelGateway, idle_timeout: Duration) -> Fixture {
    let repository = InMemoryConversationRepository::new();
    let owner = UserId::new("owner");
    let conversation = Conversation::new(owner.clone(), "New Chat".to_string());
    let conversation_id = conversation.id;
    repository
        .create_conversation(&conversation)
        .await
        .expect("Failed to create conversation");

    let service = ChatService::new(
        Arc::new(gateway.clone()),
        Arc::new(repository.clone()),
        SYSTEM_PROMPT.to_string(),
        100,
        idle_timeout,
    );

    Fixture {
        service,
        gateway,
        repository,
        owner,
        conversation_id,
    }
}

async fn fixture(gateway: MockModelGateway) -> Fixture {
    fixture_with_timeout(gateway, Duration::from_secs(5)).await
}

impl Fixture {
    async fn stored_messages(&self) -> Vec<(MessageRole, String)> {
        self.repository
            .get_conversation(self.conversation_id, &self.owner)
            .await
            .expect("Failed to load conversation")
            .expect("Conversation missing")
            .messages
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect()
    }

    async fn run_turn(&self, content: &str) -> Vec<RelayEvent> {
        let turn = self
            .service
            .start_turn(self.conversation_id, &self.owner, content.to_string())
            .await
            .expect("Failed to start turn");
        self.service.relay(turn).collect().await
    }
}

fn content(text: &str) -> RelayEvent {
    RelayEvent::Content {
        content: text.to_string(),
    }
}

#[tokio::test]
async fn given_streamed_fragments_when_relaying_then_forwards_each_then_done() {
    let f = fixture(MockModelGateway::with_fragments(["Oh, ", "it's ", "you."])).await;

    let events = f.run_turn("hello").await;

    assert_eq!(
        events,
        vec![
            content("Oh, "),
            content("it's "),
            content("you."),
            RelayEvent::Done { done: true },
        ]
    );
}

#[tokio::test]
async fn given_completed_turn_when_fetching_conversation_then_has_user_then_assistant() {
    let f = fixture(MockModelGateway::with_fragments(["Oh, ", "it's ", "you."])).await;

    f.run_turn("hello").await;

    assert_eq!(
        f.stored_messages().await,
        vec![
            (MessageRole::User, "hello".to_string()),
            (MessageRole::Assistant, "Oh, it's you.".to_string()),
        ]
    );
}

#[tokio::test]
async fn given_new_message_when_starting_turn_then_user_message_is_in_history_sent_upstream() {
    let f = fixture(MockModelGateway::default()).await;

    f.run_turn("first").await;
    f.run_turn("second").await;

    let histories = f.gateway.histories();
    assert_eq!(histories.len(), 2);
    let last_history = &histories[1];
    assert_eq!(last_history.len(), 3);
    assert_eq!(last_history[2].role, MessageRole::User);
    assert_eq!(last_history[2].content, "second");
}

#[tokio::test]
async fn given_gateway_failure_when_starting_turn_then_user_message_is_still_persisted() {
    let f = fixture(MockModelGateway::default().failing_on_open()).await;

    let result = f
        .service
        .start_turn(f.conversation_id, &f.owner, "hello".to_string())
        .await;

    assert!(matches!(result, Err(ChatError::Gateway(_))));
    assert_eq!(
        f.stored_messages().await,
        vec![(MessageRole::User, "hello".to_string())]
    );
}

#[tokio::test]
async fn given_other_users_conversation_when_starting_turn_then_not_found_and_gateway_untouched() {
    let f = fixture(MockModelGateway::default()).await;
    let intruder = UserId::new("intruder");

    let result = f
        .service
        .start_turn(f.conversation_id, &intruder, "hello".to_string())
        .await;

    assert!(matches!(result, Err(ChatError::ConversationNotFound(_))));
    assert!(f.gateway.histories().is_empty());
    assert!(f.stored_messages().await.is_empty());
}

#[tokio::test]
async fn given_image_directive_when_image_succeeds_then_emits_image_and_persists_markdown() {
    let image = InlineImage::new("image/png", b"png-bytes".to_vec());
    let gateway = MockModelGateway::with_fragments(["Here: [[GENERATE_IM", "AGE: a cat]] enjoy"])
        .with_image(image.clone());
    let f = fixture(gateway).await;

    let events = f.run_turn("draw a cat").await;

    assert_eq!(
        events,
        vec![
            content("Here: [[GENERATE_IM"),
            content("AGE: a cat]] enjoy"),
            RelayEvent::Image {
                image_url: image.to_data_uri(),
            },
            RelayEvent::Done { done: true },
        ]
    );
    assert_eq!(f.gateway.image_prompts(), vec!["a cat".to_string()]);

    let messages = f.stored_messages().await;
    assert_eq!(
        messages[1].1,
        format!("Here: [[GENERATE_IMAGE: a cat]] enjoy{}", image.to_markdown())
    );
}

#[tokio::test]
async fn given_image_directive_when_image_fails_then_persists_text_only_and_still_done() {
    let gateway = MockModelGateway::with_fragments(["Ugh. [[GENERATE_IMAGE: a cat]]"]);
    let f = fixture(gateway).await;

    let events = f.run_turn("draw a cat").await;

    assert_eq!(
        events,
        vec![
            content("Ugh. [[GENERATE_IMAGE: a cat]]"),
            RelayEvent::Done { done: true },
        ]
    );
    assert_eq!(
        f.stored_messages().await[1],
        (
            MessageRole::Assistant,
            "Ugh. [[GENERATE_IMAGE: a cat]]".to_string()
        )
    );
}

#[tokio::test]
async fn given_unterminated_directive_when_relaying_then_no_image_requested() {
    let gateway = MockModelGateway::with_fragments(["[[GENERATE_IMAGE: a cat"])
        .with_image(InlineImage::new("image/png", vec![1]));
    let f = fixture(gateway).await;

    let events = f.run_turn("draw").await;

    assert!(f.gateway.image_prompts().is_empty());
    assert_eq!(events.last(), Some(&RelayEvent::Done { done: true }));
}

#[tokio::test]
async fn given_mid_stream_failure_when_relaying_then_emits_error_and_persists_no_reply() {
    let gateway = MockModelGateway::with_fragments(["partial "]).failing_mid_stream();
    let f = fixture(gateway).await;

    let events = f.run_turn("hello").await;

    assert_eq!(
        events,
        vec![
            content("partial "),
            RelayEvent::Error {
                error: "Failed to send message".to_string(),
            },
        ]
    );
    assert_eq!(
        f.stored_messages().await,
        vec![(MessageRole::User, "hello".to_string())]
    );
}

#[tokio::test]
async fn given_client_abort_after_partial_content_when_dropping_stream_then_no_reply_persisted() {
    let gateway = MockModelGateway::with_fragments(["one ", "two ", "three"]);
    let f = fixture(gateway).await;

    let turn = f
        .service
        .start_turn(f.conversation_id, &f.owner, "hello".to_string())
        .await
        .expect("Failed to start turn");
    let mut relay = Box::pin(f.service.relay(turn));
    assert_eq!(relay.next().await, Some(content("one ")));
    drop(relay);

    assert_eq!(
        f.stored_messages().await,
        vec![(MessageRole::User, "hello".to_string())]
    );
}

#[tokio::test]
async fn given_stalled_upstream_when_idle_timeout_expires_then_emits_error() {
    let gateway = MockModelGateway::with_fragments(["still "]).stalling_mid_stream();
    let f = fixture_with_timeout(gateway, Duration::from_millis(50)).await;

    let events = f.run_turn("hello").await;

    assert_eq!(
        events.last(),
        Some(&RelayEvent::Error {
            error: "Failed to send message".to_string(),
        })
    );
    assert_eq!(f.stored_messages().await.len(), 1);
}

#[tokio::test]
async fn given_empty_fragments_when_relaying_then_they_are_not_forwarded() {
    let f = fixture(MockModelGateway::with_fragments(["", "text", ""])).await;

    let events = f.run_turn("hello").await;

    assert_eq!(events, vec![content("text"), RelayEvent::Done { done: true }]);
}
