//! Message formatting utilities for client display.

use chrono::{DateTime, Local};

use crate::domain::{ChatMessage, ConnectionState, PresenceSnapshot};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat message line
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    /// * `is_own` - Whether the current session sent it (marked as "me")
    ///
    /// # Returns
    ///
    /// A formatted string like `\n[12:00:00] alice: hello\n`
    pub fn format_chat_message(message: &ChatMessage, is_own: bool) -> String {
        let sender = if message.sender_id.is_empty() {
            "(unknown)"
        } else {
            message.sender_id.as_str()
        };
        let me_suffix = if is_own { " (me)" } else { "" };
        format!(
            "\n[{}] {}{}: {}\n",
            Self::format_time(&message.timestamp),
            sender,
            me_suffix,
            message.content
        )
    }

    /// Format the presence snapshot showing all online users
    ///
    /// # Arguments
    ///
    /// * `presence` - Latest snapshot from the relay
    /// * `current_user_id` - The current session id (to mark as "me")
    pub fn format_presence(presence: &PresenceSnapshot, current_user_id: &str) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str(&format!("Online: {}\n", presence.total_clients));

        if presence.online_users.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for user in &presence.online_users {
                let me_suffix = if user == current_user_id { " (me)" } else { "" };
                output.push_str(&format!("{}{}\n", user, me_suffix));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a connection status change
    pub fn format_connection_state(state: ConnectionState, url: &str) -> String {
        match state {
            ConnectionState::Connected => format!("\n* Connected to {}\n", url),
            ConnectionState::Disconnected => format!("\n* Disconnected from {}\n", url),
        }
    }

    /// Render an ISO-8601 timestamp as local `HH:MM:SS`, or as-is when unparseable
    fn format_time(timestamp: &str) -> String {
        DateTime::parse_from_rfc3339(timestamp)
            .map(|time| time.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|_| timestamp.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: &str, timestamp: &str) -> ChatMessage {
        ChatMessage {
            content: "Hello!".to_string(),
            sender_id: sender.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_format_own_chat_message() {
        // テスト項目: 自分のメッセージには "(me)" が付く
        // given (前提条件):
        let msg = message("user_abc", "2024-01-01T00:00:00Z");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&msg, true);

        // then (期待する結果):
        assert!(result.contains("user_abc (me): Hello!"));
    }

    #[test]
    fn test_format_chat_message_with_unparseable_time() {
        // テスト項目: パースできないタイムスタンプはそのまま表示される
        // given (前提条件):
        let msg = message("", "yesterday");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&msg, false);

        // then (期待する結果):
        assert_eq!(result, "\n[yesterday] (unknown): Hello!\n");
    }

    #[test]
    fn test_format_presence_marks_current_user() {
        // テスト項目: プレゼンス一覧で自分に "(me)" が付く
        // given (前提条件):
        let presence = PresenceSnapshot {
            total_clients: 2,
            online_users: vec!["user_a".to_string(), "user_b".to_string()],
        };

        // when (操作):
        let result = MessageFormatter::format_presence(&presence, "user_b");

        // then (期待する結果):
        assert!(result.contains("Online: 2\n"));
        assert!(result.contains("user_a\n"));
        assert!(result.contains("user_b (me)\n"));
    }

    #[test]
    fn test_format_empty_presence() {
        // テスト項目: 参加者がいない場合は "(No participants)" と表示される
        // given (前提条件):
        let presence = PresenceSnapshot::default();

        // when (操作):
        let result = MessageFormatter::format_presence(&presence, "user_a");

        // then (期待する結果):
        assert!(result.contains("(No participants)"));
    }

    #[test]
    fn test_format_connection_state() {
        // テスト項目: 接続状態の変化が URL と共に表示される
        // given (前提条件):
        let url = "ws://localhost:8080/ws";

        // when (操作):
        let connected = MessageFormatter::format_connection_state(ConnectionState::Connected, url);
        let disconnected =
            MessageFormatter::format_connection_state(ConnectionState::Disconnected, url);

        // then (期待する結果):
        assert_eq!(connected, "\n* Connected to ws://localhost:8080/ws\n");
        assert_eq!(disconnected, "\n* Disconnected from ws://localhost:8080/ws\n");
    }
}
