//! Per-card view state derived from the shared session and engine status.
//!
//! Cards never hold a player of their own. Each render asks what it should
//! show for its (item, context) pair; only the active pair gets live values.

use reverie_core::{EngineStatus, PlayableItem, PlaybackContext, PlaybackTime};
use serde::Serialize;

use crate::session::Session;

/// What a play button and its progress bar should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardView {
    pub is_playing: bool,
    pub is_loading: bool,
    /// Progress through the recording, `0.0..=100.0`.
    pub progress_percent: f64,
    pub current_time_label: String,
    pub duration_label: String,
}

impl CardView {
    fn idle(duration_ms: u64) -> Self {
        Self {
            is_playing: false,
            is_loading: false,
            progress_percent: 0.0,
            current_time_label: PlaybackTime(0).format(),
            duration_label: PlaybackTime(duration_ms).format(),
        }
    }
}

/// Project the session onto the card for `item_id` in `context`.
pub fn project(
    session: &Session,
    status: &EngineStatus,
    item_id: &str,
    context: PlaybackContext,
) -> CardView {
    project_with_hint(session, status, item_id, context, None)
}

/// Like [`project`], falling back to the item's duration hint while the
/// engine has not reported a length.
pub fn project_item(
    session: &Session,
    status: &EngineStatus,
    item: &PlayableItem,
    context: PlaybackContext,
) -> CardView {
    project_with_hint(session, status, &item.id, context, item.duration_hint_ms)
}

fn project_with_hint(
    session: &Session,
    status: &EngineStatus,
    item_id: &str,
    context: PlaybackContext,
    duration_hint_ms: Option<u64>,
) -> CardView {
    let hint = duration_hint_ms.unwrap_or(0);

    if session.is_loading(item_id, context) {
        return CardView {
            is_loading: true,
            ..CardView::idle(hint)
        };
    }
    if !session.is_active(item_id, context) {
        return CardView::idle(hint);
    }

    let duration_ms = if status.duration_ms > 0 {
        status.duration_ms
    } else {
        hint
    };
    let (current_ms, progress_percent) = if duration_ms == 0 {
        (status.current_time_ms, 0.0)
    } else {
        let current_ms = status.current_time_ms.min(duration_ms);
        (current_ms, current_ms as f64 / duration_ms as f64 * 100.0)
    };

    CardView {
        is_playing: session.is_playing(item_id, context),
        is_loading: false,
        progress_percent,
        current_time_label: PlaybackTime(current_ms).format(),
        duration_label: PlaybackTime(duration_ms).format(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reverie_core::PlaybackIdentity;

    fn playing(item_id: &str, context: PlaybackContext) -> Session {
        let mut session = Session::new();
        session.begin_request(PlaybackIdentity::new(item_id, context));
        session.mark_playing();
        session
    }

    fn status(current_time_ms: u64, duration_ms: u64) -> EngineStatus {
        EngineStatus {
            current_time_ms,
            duration_ms,
            is_playing: true,
            did_just_finish: false,
        }
    }

    #[test]
    fn test_active_card_gets_live_values() {
        let session = playing("d1", PlaybackContext::Feed);
        let view = project(&session, &status(30_000, 120_000), "d1", PlaybackContext::Feed);
        assert!(view.is_playing);
        assert!(!view.is_loading);
        assert!((view.progress_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(view.current_time_label, "0:30");
        assert_eq!(view.duration_label, "2:00");
    }

    #[test]
    fn test_same_item_other_context_is_idle() {
        let session = playing("d1", PlaybackContext::Modal);
        let view = project(&session, &status(30_000, 120_000), "d1", PlaybackContext::Feed);
        assert_eq!(view, CardView::idle(0));
    }

    #[test]
    fn test_loading_card() {
        let mut session = Session::new();
        session.begin_request(PlaybackIdentity::new("d2", PlaybackContext::Journal));
        let view = project(&session, &status(5_000, 10_000), "d2", PlaybackContext::Journal);
        assert!(view.is_loading);
        assert!(!view.is_playing);
        assert!(view.progress_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn test_paused_card_keeps_progress() {
        let mut session = playing("d1", PlaybackContext::Feed);
        session.mark_paused();
        let view = project(&session, &status(60_000, 120_000), "d1", PlaybackContext::Feed);
        assert!(!view.is_playing);
        assert!((view.progress_percent - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duration_hint_fallback() {
        let session = playing("d1", PlaybackContext::Feed);
        let item = PlayableItem::new("d1", "a.m4a", "alice").with_duration_hint(40_000);
        let view = project_item(&session, &status(10_000, 0), &item, PlaybackContext::Feed);
        assert!((view.progress_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(view.duration_label, "0:40");

        let idle = project_item(&Session::new(), &status(0, 0), &item, PlaybackContext::Feed);
        assert_eq!(idle.duration_label, "0:40");
        assert_eq!(idle.current_time_label, "0:00");
    }
}
