use zakchat::application::ports::{ConversationRepository, RepositoryError};
use zakchat::domain::{Conversation, Message, MessageRole, UserId};

use crate::helpers::TestPostgres;

#[tokio::test]
#[ignore = "requires docker"]
async fn given_new_conversation_when_creating_and_retrieving_then_conversation_is_persisted() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let conversation = Conversation::new(owner.clone(), "Test Conversation".to_string());

    test_pg
        .conversation_repository
        .create_conversation(&conversation)
        .await
        .expect("Failed to create conversation");

    let retrieved = test_pg
        .conversation_repository
        .get_conversation(conversation.id, &owner)
        .await
        .expect("Failed to retrieve conversation")
        .expect("Conversation not found");

    assert_eq!(retrieved.id, conversation.id);
    assert_eq!(retrieved.title, "Test Conversation");
    assert_eq!(retrieved.user_id, owner);
    assert!(retrieved.messages.is_empty());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn given_conversation_when_appending_messages_then_messages_are_stored_in_order() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let conversation = Conversation::new(owner.clone(), "Chat Session".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&conversation)
        .await
        .expect("Failed to create conversation");

    let first = Message::new(conversation.id, MessageRole::User, "Hello".to_string());
    let second = Message::new(
        conversation.id,
        MessageRole::Assistant,
        "What do you want?".to_string(),
    );
    test_pg
        .conversation_repository
        .append_message(&first, &owner)
        .await
        .expect("Failed to append first message");
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    test_pg
        .conversation_repository
        .append_message(&second, &owner)
        .await
        .expect("Failed to append second message");

    let retrieved = test_pg
        .conversation_repository
        .get_conversation(conversation.id, &owner)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(retrieved.messages.len(), 2);
    assert_eq!(retrieved.messages[0].role, MessageRole::User);
    assert_eq!(retrieved.messages[1].content, "What do you want?");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn given_multiple_messages_when_getting_with_limit_then_returns_most_recent() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let conversation = Conversation::new(owner.clone(), "Long Chat".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&conversation)
        .await
        .unwrap();

    for i in 0..5 {
        let msg = Message::new(conversation.id, MessageRole::User, format!("Message {}", i));
        test_pg
            .conversation_repository
            .append_message(&msg, &owner)
            .await
            .unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    let messages = test_pg
        .conversation_repository
        .get_messages(conversation.id, &owner, 3)
        .await
        .unwrap();

    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Message 2", "Message 3", "Message 4"]);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn given_other_user_when_accessing_conversation_then_it_is_invisible() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let intruder = UserId::new("mallory");
    let conversation = Conversation::new(owner.clone(), "Private".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&conversation)
        .await
        .unwrap();

    let fetched = test_pg
        .conversation_repository
        .get_conversation(conversation.id, &intruder)
        .await
        .unwrap();
    let listed = test_pg
        .conversation_repository
        .list_conversations(&intruder)
        .await
        .unwrap();
    let deleted = test_pg
        .conversation_repository
        .delete_conversation(conversation.id, &intruder)
        .await
        .unwrap();
    let history = test_pg
        .conversation_repository
        .get_messages(conversation.id, &intruder, 10)
        .await
        .unwrap();
    let appended = test_pg
        .conversation_repository
        .append_message(
            &Message::new(conversation.id, MessageRole::User, "hi".to_string()),
            &intruder,
        )
        .await;

    assert!(fetched.is_none());
    assert!(listed.is_empty());
    assert!(!deleted);
    assert!(history.is_empty());
    assert!(matches!(appended, Err(RepositoryError::NotFound(_))));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn given_conversation_with_messages_when_deleting_then_messages_cascade() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let conversation = Conversation::new(owner.clone(), "Doomed".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&conversation)
        .await
        .unwrap();
    test_pg
        .conversation_repository
        .append_message(
            &Message::new(conversation.id, MessageRole::User, "hi".to_string()),
            &owner,
        )
        .await
        .unwrap();

    let deleted = test_pg
        .conversation_repository
        .delete_conversation(conversation.id, &owner)
        .await
        .unwrap();

    let (remaining,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation.id.as_uuid())
            .fetch_one(&test_pg.pool)
            .await
            .unwrap();
    assert!(deleted);
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn given_conversations_when_listing_then_newest_first() {
    let test_pg = TestPostgres::new().await;
    let owner = UserId::new("alice");
    let older = Conversation::new(owner.clone(), "Older".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&older)
        .await
        .unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    let newer = Conversation::new(owner.clone(), "Newer".to_string());
    test_pg
        .conversation_repository
        .create_conversation(&newer)
        .await
        .unwrap();

    let listed = test_pg
        .conversation_repository
        .list_conversations(&owner)
        .await
        .unwrap();

    let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}
