//! Message relay against the in-memory note service.

use memobridge_client::mock::{MockCall, MockMemosService};
use memobridge_client::Credential;
use memobridge_core::{AnnotationRange, Result, RowStatus, UploadMeta, Visibility};
use memobridge_relay::{
    Connector, IncomingMessage, MemorySessionStore, NoteRelay, ReplyTarget, SessionStore,
};

const CREDENTIAL: &str = "https://memos.example.com/api/note?openId=abc";
const SESSION: &str = "-100200";

struct MockConnector(MockMemosService);

impl Connector for MockConnector {
    type Api = MockMemosService;

    fn connect(&self, _credential: &Credential) -> Result<MockMemosService> {
        Ok(self.0.clone())
    }
}

async fn bound_relay(service: &MockMemosService) -> NoteRelay<MemorySessionStore, MockConnector> {
    let sessions = MemorySessionStore::new();
    sessions.bind(SESSION, CREDENTIAL).await.unwrap();
    NoteRelay::new(sessions, MockConnector(service.clone()))
}

fn message(message_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        session: SESSION.to_string(),
        message_id,
        text: text.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_publish_annotated_message() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let text = "Ship it #PUBLIC #project";
    let msg = IncomingMessage {
        markup: "<b>Ship</b> it #PUBLIC #project".to_string(),
        annotations: Some(vec![
            AnnotationRange::hashtag(8, 7),
            AnnotationRange::hashtag(16, 8),
        ]),
        ..message(10, text)
    };

    let published = relay.publish(&msg).await.unwrap();

    let note = service.note(published.id).unwrap();
    assert_eq!(note.content, "**Ship** it #project");
    assert_eq!(note.visibility, Visibility::Public);
    assert_eq!(
        published.link,
        format!("https://memos.example.com/m/{}", published.id)
    );
    assert!(service.calls().contains(&MockCall::CreateTag("project".into())));
    assert_eq!(
        relay.sessions().note_for_message(SESSION, 10).await.unwrap(),
        Some(published.id)
    );
}

#[tokio::test]
async fn test_publish_plain_message() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let published = relay
        .publish(&message(1, "hello #work &7 world PUBLIC"))
        .await
        .unwrap();

    let note = service.note(published.id).unwrap();
    assert_eq!(note.content, "hello #work world");
    assert_eq!(note.resource_ids, vec![7]);
    assert_eq!(note.visibility, Visibility::Public);
}

#[tokio::test]
async fn test_publish_archived_sets_status_after_create() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let published = relay.publish(&message(1, "done ARCHIVED")).await.unwrap();

    assert!(published.warnings.is_empty());
    let note = service.note(published.id).unwrap();
    assert_eq!(note.row_status, RowStatus::Archived);
    assert_eq!(note.content, "done");
}

#[tokio::test]
async fn test_failed_status_update_keeps_message_mapping() {
    let service = MockMemosService::new().fail_update(1);
    let relay = bound_relay(&service).await;

    let published = relay.publish(&message(10, "done ARCHIVED")).await.unwrap();

    assert_eq!(published.id, 1);
    assert_eq!(published.warnings.len(), 1);
    let note = service.note(1).unwrap();
    assert_eq!(note.content, "done");
    assert_eq!(note.row_status, RowStatus::Normal);
    assert_eq!(
        relay.sessions().note_for_message(SESSION, 10).await.unwrap(),
        Some(1)
    );
}

#[tokio::test]
async fn test_failed_tag_creation_is_a_warning() {
    let service = MockMemosService::new().fail_tag_create("broken");
    let relay = bound_relay(&service).await;

    let published = relay
        .publish(&message(10, "note #broken #fine"))
        .await
        .unwrap();

    assert_eq!(published.warnings.len(), 1);
    assert!(published.warnings[0].contains("broken"));
    assert!(service.tags().contains(&"fine".to_string()));
    assert_eq!(
        relay.sessions().note_for_message(SESSION, 10).await.unwrap(),
        Some(published.id)
    );
}

#[tokio::test]
async fn test_unbound_session_is_not_found() {
    let service = MockMemosService::new();
    let relay = NoteRelay::new(MemorySessionStore::new(), MockConnector(service.clone()));

    let err = relay.publish(&message(1, "hello")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_reply_claims_album_photos() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;
    let meta = UploadMeta::image("photo.jpg");

    let first = relay
        .attach_photo(SESSION, 20, Some("album"), "https://files.example/1.jpg", &meta)
        .await
        .unwrap();
    let second = relay
        .attach_photo(SESSION, 21, Some("album"), "https://files.example/2.jpg", &meta)
        .await
        .unwrap();

    let reply = IncomingMessage {
        reply_to: Some(ReplyTarget {
            message_id: 20,
            media_group_id: Some("album".to_string()),
        }),
        ..message(22, "holiday #trip")
    };
    let published = relay.publish(&reply).await.unwrap();

    let note = service.note(published.id).unwrap();
    assert_eq!(note.resource_ids, vec![first, second]);
    assert!(relay.media().is_empty());
}

#[tokio::test]
async fn test_single_photo_reply_uses_message_id() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let photo = relay
        .attach_photo(SESSION, 30, None, "https://files.example/3.jpg", &UploadMeta::image("3.jpg"))
        .await
        .unwrap();
    let reply = IncomingMessage {
        reply_to: Some(ReplyTarget {
            message_id: 30,
            media_group_id: None,
        }),
        ..message(31, "caption")
    };

    let published = relay.publish(&reply).await.unwrap();
    assert_eq!(service.note(published.id).unwrap().resource_ids, vec![photo]);
}

#[tokio::test]
async fn test_edit_updates_note_and_keeps_photos() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let photo = relay
        .attach_photo(SESSION, 40, None, "https://files.example/4.jpg", &UploadMeta::image("4.jpg"))
        .await
        .unwrap();
    let reply = IncomingMessage {
        reply_to: Some(ReplyTarget {
            message_id: 40,
            media_group_id: None,
        }),
        ..message(41, "first draft")
    };
    let published = relay.publish(&reply).await.unwrap();

    let edited = relay
        .apply_edit(&message(41, "second draft #final PROTECTED"))
        .await
        .unwrap();

    assert_eq!(edited.id, published.id);
    let note = service.note(published.id).unwrap();
    assert_eq!(note.content, "second draft #final");
    assert_eq!(note.visibility, Visibility::Protected);
    assert_eq!(note.resource_ids, vec![photo]);
    assert!(service.calls().contains(&MockCall::CreateTag("final".into())));
}

#[tokio::test]
async fn test_edit_of_unknown_message_is_not_found() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let err = relay.apply_edit(&message(99, "edit")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(service.mutation_count(), 0);
}

#[tokio::test]
async fn test_malformed_annotations_abort_before_remote_calls() {
    let service = MockMemosService::new();
    let relay = bound_relay(&service).await;

    let msg = IncomingMessage {
        markup: "short".to_string(),
        annotations: Some(vec![AnnotationRange::hashtag(3, 40)]),
        ..message(1, "short")
    };
    let err = relay.publish(&msg).await.unwrap_err();
    assert!(matches!(err, memobridge_core::Error::ParseInconsistency(_)));
    assert!(service.calls().is_empty());
}
