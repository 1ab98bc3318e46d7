//! Server-sent-event framing.
//!
//! Each conversation event is serialized to one JSON object and wrapped in
//! an SSE `data:` frame terminated by a blank line. Consumers parse the
//! `type` field of the payload; no SSE `event:` names are used.

use roundtable_domain::ConversationEvent;

/// Wrap one event in an SSE frame: `data: {json}\n\n`.
pub fn frame(event: &ConversationEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("data: {json}\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{EventKind, MeetingId};

    #[test]
    fn frame_is_a_single_data_line() {
        let event = ConversationEvent::now(EventKind::Connected {
            meeting_id: MeetingId(3),
        });
        let framed = frame(&event).unwrap();
        assert!(framed.starts_with("data: {"));
        assert!(framed.ends_with("\n\n"));
        // Exactly one payload line; JSON escaping keeps newlines out.
        assert_eq!(framed.trim_end().lines().count(), 1);

        let payload: serde_json::Value =
            serde_json::from_str(framed.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(payload["type"], "connected");
        assert_eq!(payload["meeting_id"], 3);
    }

    #[test]
    fn multiline_content_stays_in_one_frame() {
        let event = ConversationEvent::now(EventKind::MeetingError {
            meeting_id: MeetingId(1),
            detail: "first line\nsecond line".to_string(),
        });
        let framed = frame(&event).unwrap();
        assert_eq!(framed.trim_end().lines().count(), 1);
        let payload: serde_json::Value =
            serde_json::from_str(framed.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(payload["detail"], "first line\nsecond line");
    }
}
