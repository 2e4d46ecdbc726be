//! State projector: the consumer-facing view of the chat.
//!
//! Owns the [`ConnectionManager`] and turns its notifications into a message
//! log (append-only, arrival order), the latest presence snapshot (replaced
//! wholesale) and a connected flag. The render layer reads these and never
//! touches the transport.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    connection::ConnectionManager,
    domain::{ChatMessage, PresenceSnapshot, SessionId},
};

/// Everything the render layer needs at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    pub messages: Vec<ChatMessage>,
    pub presence: PresenceSnapshot,
    pub connected: bool,
}

pub struct StateProjector {
    manager: ConnectionManager,
    view: Arc<Mutex<ChatView>>,
}

impl StateProjector {
    /// Take ownership of the manager and subscribe to all three notifications
    pub fn new(mut manager: ConnectionManager) -> Self {
        let view = Arc::new(Mutex::new(ChatView::default()));

        let messages = view.clone();
        manager.on_message(move |message| lock(&messages).messages.push(message));

        let presence = view.clone();
        manager.on_presence(move |snapshot| lock(&presence).presence = snapshot);

        let status = view.clone();
        manager.on_status(move |state| lock(&status).connected = state.is_connected());

        Self { manager, view }
    }

    pub fn connect(&mut self) {
        self.manager.connect();
    }

    pub fn disconnect(&mut self) {
        self.manager.disconnect();
    }

    pub fn send_message(&mut self, content: &str) {
        self.manager.send_message(content);
    }

    /// See [`ConnectionManager::dispatch_next`]
    pub async fn dispatch_next(&mut self) -> bool {
        self.manager.dispatch_next().await
    }

    /// See [`ConnectionManager::dispatch_pending`]
    pub fn dispatch_pending(&mut self) -> usize {
        self.manager.dispatch_pending()
    }

    pub fn session_id(&self) -> &SessionId {
        self.manager.session_id()
    }

    /// Relay URL the manager connects to
    pub fn url(&self) -> &str {
        self.manager.url()
    }

    pub fn is_own_message(&self, message: &ChatMessage) -> bool {
        message.is_from(self.session_id())
    }

    /// Connected flag as last reported by a status notification
    pub fn is_connected(&self) -> bool {
        lock(&self.view).connected
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.view).messages.clone()
    }

    /// Messages that arrived after the first `start` ones
    pub fn messages_since(&self, start: usize) -> Vec<ChatMessage> {
        lock(&self.view)
            .messages
            .get(start..)
            .map(<[ChatMessage]>::to_vec)
            .unwrap_or_default()
    }

    pub fn message_count(&self) -> usize {
        lock(&self.view).messages.len()
    }

    pub fn presence(&self) -> PresenceSnapshot {
        lock(&self.view).presence.clone()
    }

    pub fn snapshot(&self) -> ChatView {
        lock(&self.view).clone()
    }
}

// Handlers never panic while holding the lock, but a poisoned view is still usable.
fn lock(view: &Mutex<ChatView>) -> MutexGuard<'_, ChatView> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use tsunagi_shared::time::FixedClock;

    use super::*;
    use crate::transport::{MemoryConnector, MemoryPeer};

    fn create_test_projector() -> (StateProjector, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (connector, peers) = MemoryConnector::new();
        let manager = ConnectionManager::with_parts(
            "ws://localhost:8080/ws",
            Arc::new(connector),
            Arc::new(FixedClock::from_millis(1_704_067_200_000)),
        );
        (StateProjector::new(manager), peers)
    }

    fn open(
        projector: &mut StateProjector,
        peers: &mut mpsc::UnboundedReceiver<MemoryPeer>,
    ) -> MemoryPeer {
        projector.connect();
        let peer = peers.try_recv().unwrap();
        peer.open();
        projector.dispatch_pending();
        peer
    }

    fn message_frame(content: &str, sender: &str) -> String {
        json!({"type": "message", "content": content, "senderId": sender, "timestamp": "2024-01-01T00:00:00Z"})
            .to_string()
    }

    #[test]
    fn test_chat_session_scenario() {
        // テスト項目: 接続 → 送信 → 受信 → プレゼンス更新 → 切断の一連の流れ
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let session = projector.session_id().to_string();

        // when (操作): 接続して open イベントを受け取る
        let mut peer = open(&mut projector, &mut peers);

        // then (期待する結果):
        assert!(projector.is_connected());
        let join: Value = serde_json::from_str(&peer.try_recv_sent().unwrap()).unwrap();
        assert_eq!(join, json!({"type": "user_join", "userId": session}));

        // when (操作): メッセージを送信する
        projector.send_message("hi");

        // then (期待する結果):
        let sent: Value = serde_json::from_str(&peer.try_recv_sent().unwrap()).unwrap();
        assert_eq!(sent["type"], "message");
        assert_eq!(sent["content"], "hi");
        assert_eq!(sent["senderId"], json!(session));

        // when (操作): 他のユーザーのメッセージを受信する
        peer.deliver(r#"{"type":"message","content":"hello","senderId":"user_abc123","timestamp":"2024-01-01T00:00:00Z"}"#);
        projector.dispatch_pending();

        // then (期待する結果):
        assert_eq!(
            projector.messages(),
            vec![ChatMessage {
                content: "hello".to_string(),
                sender_id: "user_abc123".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            }]
        );

        // when (操作): プレゼンス情報を受信する
        peer.deliver(r#"{"type":"client_info","totalClients":3,"onlineUsers":["a","b","c"]}"#);
        projector.dispatch_pending();

        // then (期待する結果):
        assert_eq!(
            projector.presence(),
            PresenceSnapshot {
                total_clients: 3,
                online_users: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            }
        );

        // when (操作): トランスポートが閉じる
        peer.close();
        projector.dispatch_pending();

        // then (期待する結果):
        assert!(!projector.is_connected());
    }

    #[test]
    fn test_message_log_keeps_arrival_order() {
        // テスト項目: メッセージログは正しい形式のフレーム数と受信順を保つ
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);

        // when (操作):
        peer.deliver(message_frame("one", "a"));
        peer.deliver("garbage");
        peer.deliver(message_frame("two", "b"));
        peer.deliver(r#"{"type":"message","content":["not","text"]}"#);
        peer.deliver(message_frame("two", "b"));
        projector.dispatch_pending();

        // then (期待する結果):
        let contents: Vec<String> = projector
            .messages()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["one", "two", "two"]);
        assert_eq!(projector.message_count(), 3);
        assert_eq!(projector.messages_since(2).len(), 1);
        assert!(projector.messages_since(10).is_empty());
    }

    #[test]
    fn test_frames_with_omitted_fields_are_logged() {
        // テスト項目: リレーが省略・null にしたフィールドを含む message も全てログに追加される
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);

        // when (操作):
        peer.deliver(r#"{"type":"message","content":"a","senderId":null}"#);
        peer.deliver(r#"{"type":"message","senderId":"u"}"#);
        peer.deliver(r#"{"type":"message","content":"c","senderId":"u","timestamp":null}"#);
        projector.dispatch_pending();

        // then (期待する結果):
        let messages = projector.messages();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "", "c"]);
        assert_eq!(messages[0].sender_id, "");
        assert_eq!(messages[2].timestamp, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_presence_is_replaced_not_merged() {
        // テスト項目: client_info はプレゼンスを完全に置き換え、マージしない
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);
        peer.deliver(r#"{"type":"client_info","totalClients":2,"onlineUsers":["a","b"]}"#);
        projector.dispatch_pending();

        // when (操作):
        peer.deliver(r#"{"type":"client_info","totalClients":1}"#);
        projector.dispatch_pending();

        // then (期待する結果):
        assert_eq!(
            projector.presence(),
            PresenceSnapshot {
                total_clients: 1,
                online_users: vec![],
            }
        );
    }

    #[test]
    fn test_malformed_payload_leaves_view_unchanged() {
        // テスト項目: 不正なペイロードはメッセージ・プレゼンス・接続状態を変えない
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);
        peer.deliver(message_frame("kept", "a"));
        projector.dispatch_pending();
        let before = projector.snapshot();

        // when (操作):
        peer.deliver("{\"type\":\"client_info\",");
        peer.deliver("[]");
        projector.dispatch_pending();

        // then (期待する結果):
        assert_eq!(projector.snapshot(), before);
        assert!(before.connected);
    }

    #[test]
    fn test_send_while_disconnected_changes_nothing() {
        // テスト項目: 未接続時の送信は何も送らず、ビューも変わらない
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();

        // when (操作):
        projector.send_message("lost");

        // then (期待する結果):
        assert!(peers.try_recv().is_err());
        assert_eq!(projector.snapshot(), ChatView::default());
    }

    #[test]
    fn test_own_messages_are_recognised() {
        // テスト項目: 自分の SessionId で送信されたメッセージを識別できる
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);
        let session = projector.session_id().to_string();

        // when (操作):
        peer.deliver(message_frame("echo", &session));
        peer.deliver(message_frame("other", "user_zzz"));
        projector.dispatch_pending();

        // then (期待する結果):
        let messages = projector.messages();
        assert!(projector.is_own_message(&messages[0]));
        assert!(!projector.is_own_message(&messages[1]));
    }

    #[test]
    fn test_disconnect_clears_connected_flag() {
        // テスト項目: disconnect で接続フラグが false になる
        // given (前提条件):
        let (mut projector, mut peers) = create_test_projector();
        let peer = open(&mut projector, &mut peers);

        // when (操作):
        projector.disconnect();

        // then (期待する結果):
        assert!(!projector.is_connected());
        assert!(peer.is_released());
    }
}
