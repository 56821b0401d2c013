use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use guestbook_types::models::{MessageId, Mood, MoodFilter, SearchScope, Tab, ViewMode};

/// Per-visitor UI state. One of these lives for each session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub tab: Tab,
    pub view_mode: ViewMode,
    pub mood_filter: MoodFilter,
    pub search_query: String,
    pub search_scope: SearchScope,
    pub liked: HashSet<MessageId>,
    pub show_word_cloud: bool,
    /// Mood preselected in the compose form.
    pub mood: Mood,
    pub(crate) animation_played: bool,
    pub(crate) just_submitted: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tab: Tab::Compose,
            view_mode: ViewMode::Card,
            mood_filter: MoodFilter::All,
            search_query: String::new(),
            search_scope: SearchScope::Content,
            liked: HashSet::new(),
            show_word_cloud: false,
            mood: Mood::Happy,
            animation_played: false,
            just_submitted: false,
        }
    }
}

/// Everything a visitor can do to their session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SelectTab(Tab),
    /// A message was appended; jump to the message list.
    SubmissionSucceeded,
    SelectMood(Mood),
    SetViewMode(ViewMode),
    SetMoodFilter(MoodFilter),
    SetSearch { query: String, scope: SearchScope },
    ClearSearch,
    Refresh,
    ToggleLike(MessageId),
    SetWordCloud(bool),
}

impl SessionState {
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SelectTab(tab) => self.tab = tab,
            SessionEvent::SubmissionSucceeded => {
                self.tab = Tab::Browse;
                self.just_submitted = true;
                self.animation_played = false;
            }
            SessionEvent::SelectMood(mood) => self.mood = mood,
            SessionEvent::SetViewMode(mode) => {
                if self.view_mode != mode {
                    self.view_mode = mode;
                    self.animation_played = false;
                }
            }
            SessionEvent::SetMoodFilter(filter) => {
                if self.mood_filter != filter {
                    self.mood_filter = filter;
                    self.animation_played = false;
                }
            }
            SessionEvent::SetSearch { query, scope } => {
                if self.search_query != query || self.search_scope != scope {
                    self.search_query = query;
                    self.search_scope = scope;
                    self.animation_played = false;
                }
            }
            SessionEvent::ClearSearch => {
                self.search_query.clear();
                self.search_scope = SearchScope::Content;
            }
            SessionEvent::Refresh => self.animation_played = false,
            SessionEvent::ToggleLike(id) => {
                if !self.liked.remove(&id) {
                    self.liked.insert(id);
                }
            }
            SessionEvent::SetWordCloud(show) => self.show_word_cloud = show,
        }
    }

    pub fn is_liked(&self, id: MessageId) -> bool {
        self.liked.contains(&id)
    }

    pub fn search_active(&self) -> bool {
        !self.search_query.is_empty()
    }

    /// True once after a successful submission.
    pub fn take_submission_ack(&mut self) -> bool {
        std::mem::take(&mut self.just_submitted)
    }

    /// True when the loading animation should play on this render; marks
    /// it played.
    pub fn take_animation(&mut self) -> bool {
        !std::mem::replace(&mut self.animation_played, true)
    }

    /// Copy of the state for one page render. The submission ack moves to
    /// the copy, so only one page ever shows it.
    pub fn checkout(&mut self) -> SessionState {
        let copy = self.clone();
        self.just_submitted = false;
        copy
    }

    /// Fold what a render consumed or corrected (`before` → `after`) back
    /// into the live state. Fields another request changed in the meantime
    /// keep that newer value.
    pub fn commit(&mut self, before: &SessionState, after: &SessionState) {
        if after.animation_played != before.animation_played
            && self.animation_played == before.animation_played
        {
            self.animation_played = after.animation_played;
        }
        if after.mood_filter != before.mood_filter && self.mood_filter == before.mood_filter {
            self.mood_filter = after.mood_filter.clone();
        }
    }
}

/// Session identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

struct Entry {
    state: SessionState,
    last_seen: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            state: SessionState::default(),
            last_seen: Instant::now(),
        }
    }
}

/// All live sessions. Nothing is persisted; sessions idle for too long are
/// dropped by [`SessionStore::evict_idle`].
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` names a live session; marks it as seen.
    pub async fn touch(&self, id: SessionId) -> bool {
        match self.sessions.write().await.get_mut(&id.0) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Start a fresh session with default state.
    pub async fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        self.sessions.write().await.insert(id, Entry::new());
        SessionId(id)
    }

    /// Copy of a session's state; defaults for an unknown id.
    pub async fn snapshot(&self, id: SessionId) -> SessionState {
        self.sessions
            .read()
            .await
            .get(&id.0)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Run `f` against the session's state under the write lock. Keep `f`
    /// short: every session waits on it.
    pub async fn update<F, T>(&self, id: SessionId, f: F) -> T
    where
        F: FnOnce(&mut SessionState) -> T,
    {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(id.0).or_insert_with(Entry::new);
        entry.last_seen = Instant::now();
        f(&mut entry.state)
    }

    pub async fn apply(&self, id: SessionId, event: SessionEvent) {
        self.update(id, |state| state.apply(event)).await
    }

    /// Drop every session not seen for `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Background task that evicts idle sessions every `every`.
pub async fn run_session_sweep(sessions: SessionStore, max_idle: Duration, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        let evicted = sessions.evict_idle(max_idle).await;
        if evicted > 0 {
            info!("Session sweep: dropped {} idle sessions", evicted);
        } else {
            debug!("Session sweep: nothing idle");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let state = SessionState::default();
        assert_eq!(state.tab, Tab::Compose);
        assert_eq!(state.view_mode, ViewMode::Card);
        assert_eq!(state.mood_filter, MoodFilter::All);
        assert!(state.search_query.is_empty());
        assert_eq!(state.search_scope, SearchScope::Content);
        assert!(state.liked.is_empty());
        assert!(!state.show_word_cloud);
        assert_eq!(state.mood, Mood::Happy);
    }

    #[test]
    fn submission_switches_tab_and_acks_once() {
        let mut state = SessionState::default();
        state.apply(SessionEvent::SubmissionSucceeded);
        assert_eq!(state.tab, Tab::Browse);
        assert!(state.take_submission_ack());
        assert!(!state.take_submission_ack());
    }

    #[test]
    fn animation_plays_once_until_a_control_changes() {
        let mut state = SessionState::default();
        assert!(state.take_animation());
        assert!(!state.take_animation());

        // same value: nothing changed
        state.apply(SessionEvent::SetViewMode(ViewMode::Card));
        assert!(!state.take_animation());

        state.apply(SessionEvent::SetViewMode(ViewMode::Grid));
        assert!(state.take_animation());
        assert!(!state.take_animation());

        state.apply(SessionEvent::SetMoodFilter(MoodFilter::Only("😢 難過".into())));
        assert!(state.take_animation());

        state.apply(SessionEvent::SetSearch {
            query: "hello".into(),
            scope: SearchScope::Content,
        });
        assert!(state.take_animation());

        state.apply(SessionEvent::Refresh);
        assert!(state.take_animation());
    }

    #[test]
    fn likes_toggle() {
        let mut state = SessionState::default();
        state.apply(SessionEvent::ToggleLike(MessageId(4)));
        assert!(state.is_liked(MessageId(4)));
        state.apply(SessionEvent::ToggleLike(MessageId(4)));
        assert!(!state.is_liked(MessageId(4)));
    }

    #[test]
    fn clear_search_resets_scope() {
        let mut state = SessionState::default();
        state.apply(SessionEvent::SetSearch {
            query: "bob".into(),
            scope: SearchScope::Author,
        });
        assert!(state.search_active());
        state.apply(SessionEvent::ClearSearch);
        assert!(!state.search_active());
        assert_eq!(state.search_scope, SearchScope::Content);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create().await;
        let b = store.create().await;
        store.apply(a, SessionEvent::SelectTab(Tab::Browse)).await;

        assert_eq!(store.snapshot(a).await.tab, Tab::Browse);
        assert_eq!(store.snapshot(b).await.tab, Tab::Compose);
        assert_eq!(store.len().await, 2);
        assert!(store.touch(a).await);
        assert!(!store.touch(SessionId(Uuid::new_v4())).await);
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let store = SessionStore::new();
        let idle = store.create().await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let active = store.create().await;

        assert_eq!(store.evict_idle(Duration::from_millis(150)).await, 1);
        assert!(!store.touch(idle).await);
        assert!(store.touch(active).await);

        // an evicted id starts over from the defaults
        assert_eq!(store.snapshot(idle).await, SessionState::default());

        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn activity_keeps_a_session_alive() {
        let store = SessionStore::new();
        let id = store.create().await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        store.apply(id, SessionEvent::SelectTab(Tab::Browse)).await;

        assert_eq!(store.evict_idle(Duration::from_millis(150)).await, 0);
        assert_eq!(store.snapshot(id).await.tab, Tab::Browse);
    }

    #[test]
    fn checkout_hands_the_ack_to_one_render() {
        let mut live = SessionState::default();
        live.apply(SessionEvent::SubmissionSucceeded);

        let mut copy = live.checkout();
        assert!(copy.take_submission_ack());
        assert!(!live.clone().take_submission_ack());
        assert!(!live.checkout().take_submission_ack());
    }

    #[test]
    fn commit_applies_render_changes() {
        let mut live = SessionState {
            mood_filter: MoodFilter::Only("😡 生氣".into()),
            ..SessionState::default()
        };
        let before = live.checkout();
        let mut after = before.clone();
        assert!(after.take_animation());
        after.mood_filter = MoodFilter::All;

        live.commit(&before, &after);
        assert!(!live.take_animation());
        assert_eq!(live.mood_filter, MoodFilter::All);
    }

    #[test]
    fn commit_keeps_changes_made_during_the_render() {
        let mut live = SessionState::default();
        live.take_animation();
        let before = live.checkout();

        // another request while this page renders
        live.apply(SessionEvent::SetViewMode(ViewMode::Grid));
        live.apply(SessionEvent::SetMoodFilter(MoodFilter::Only("😢 難過".into())));

        let mut after = before.clone();
        after.take_animation();
        after.mood_filter = MoodFilter::Only("🤔 思考中".into());

        live.commit(&before, &after);
        assert!(live.take_animation());
        assert_eq!(live.mood_filter, MoodFilter::Only("😢 難過".into()));
    }
}
