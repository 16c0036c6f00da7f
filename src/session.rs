//! Interaction Session
//!
//! Owns the drag tracker for one board view and runs each drop as a
//! decode-then-mutate task. Closing the session (or dropping it) cancels
//! drops that have not started writing yet.

use std::sync::Arc;

use counter_core::{Container, CounterId, MoveOutcome, OrderingEngine};
use drag_tracker::{DragTracker, DropTarget};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a drop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The engine ran the move
    Applied(MoveOutcome),
    /// The payload didn't name a live counter
    Rejected,
    /// The session closed before the move started
    Cancelled,
    /// The engine refused the move
    Failed(String),
}

pub struct InteractionSession {
    engine: Arc<OrderingEngine>,
    tracker: DragTracker<CounterId, Container>,
    token: CancellationToken,
}

impl InteractionSession {
    pub fn new(engine: Arc<OrderingEngine>) -> Self {
        Self {
            engine,
            tracker: DragTracker::new(),
            token: CancellationToken::new(),
        }
    }

    pub fn tracker(&self) -> &DragTracker<CounterId, Container> {
        &self.tracker
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Pointer down on a counter row
    pub fn press(&mut self, id: CounterId, x: f64, y: f64) {
        self.tracker.press(id, x, y);
    }

    /// Returns true once the press turned into a drag
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> bool {
        self.tracker.pointer_moved(x, y)
    }

    /// Start a drag without a threshold (keyboard or long-press)
    pub fn begin_drag(&mut self, id: CounterId) {
        self.tracker.begin_drag(id);
    }

    /// Hover over a row; the indicator picks before/after from the offset
    pub fn hover_row(&mut self, container: Container, row_index: usize, offset_y: f64, row_height: f64) {
        self.tracker.hover_row(container, row_index, offset_y, row_height);
    }

    /// Hover over a gap or an empty container
    pub fn hover_gap(&mut self, container: Container, index: usize) {
        self.tracker.update_drop_target(container, index);
    }

    /// Abandon the current drag without writing anything
    pub fn cancel_drag(&mut self) {
        self.tracker.end_drag();
    }

    /// Pointer released. Spawns the drop when a drag had a target; the
    /// tracker is idle afterwards either way.
    pub fn release(&mut self) -> Option<JoinHandle<DropOutcome>> {
        let request = self.tracker.release()?;
        Some(self.drop_payload(request.dragged.to_string(), request.target))
    }

    /// Run a drop carrying an opaque text payload; `target.index` is an
    /// insertion gap as the list shows it during the drag
    pub fn drop_payload(&self, payload: String, target: DropTarget<Container>) -> JoinHandle<DropOutcome> {
        let engine = self.engine.clone();
        let token = self.token.clone();
        tokio::spawn(async move { run_drop(&engine, &token, &payload, target).await })
    }

    /// Tear down: pending drops are cancelled and the drag state cleared
    pub fn close(&mut self) {
        self.token.cancel();
        self.tracker.end_drag();
    }
}

impl Drop for InteractionSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_drop(
    engine: &OrderingEngine,
    token: &CancellationToken,
    payload: &str,
    target: DropTarget<Container>,
) -> DropOutcome {
    let resolved = tokio::select! {
        biased;
        _ = token.cancelled() => return DropOutcome::Cancelled,
        id = engine.resolve_dragged_entity(payload) => id,
    };
    let Some(id) = resolved else {
        return DropOutcome::Rejected;
    };

    // Last point where the drop can be abandoned; the move itself is one batch
    if token.is_cancelled() {
        log::debug!("Drop of counter {} cancelled before writing", id);
        return DropOutcome::Cancelled;
    }

    match engine
        .drop_into_gap(id, target.container.collection_id(), target.index)
        .await
    {
        Ok(outcome) => DropOutcome::Applied(outcome),
        Err(e) => {
            log::warn!("Drop of counter {} into {} failed: {}", id, target.container, e);
            DropOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counter_core::{Collection, Counter, MemoryStore};

    async fn setup() -> (Arc<OrderingEngine>, Vec<Counter>, Collection) {
        let engine = Arc::new(OrderingEngine::new(Arc::new(MemoryStore::new())));
        let mut pool = Vec::new();
        for name in ["A", "B", "C"] {
            let draft = Counter::new(CounterId(0), name);
            pool.push(engine.create_counter(draft, Container::Pool).await.unwrap());
        }
        let work = engine.create_collection("Work", None).await.unwrap();
        (engine, pool, work)
    }

    async fn names(engine: &OrderingEngine, container: Container) -> Vec<String> {
        engine
            .container_members(container)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    #[tokio::test]
    async fn test_drag_and_release_moves_counter() {
        let (engine, pool, work) = setup().await;
        let mut session = InteractionSession::new(engine.clone());
        let target = Container::Collection(work.id);

        session.press(pool[0].id, 10.0, 10.0);
        assert!(session.pointer_moved(10.0, 30.0));
        session.hover_gap(target, 0);

        let outcome = session.release().unwrap().await.unwrap();
        assert_eq!(outcome, DropOutcome::Applied(MoveOutcome::Moved));
        assert!(!session.tracker().is_dragging());
        assert_eq!(names(&engine, Container::Pool).await, vec!["B", "C"]);
        assert_eq!(names(&engine, target).await, vec!["A"]);
    }

    #[tokio::test]
    async fn test_hover_below_last_row_moves_to_end() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.begin_drag(pool[0].id);
        session.hover_row(Container::Pool, 2, 35.0, 40.0);

        let outcome = session.release().unwrap().await.unwrap();
        assert_eq!(outcome, DropOutcome::Applied(MoveOutcome::Moved));
        assert_eq!(names(&engine, Container::Pool).await, vec!["B", "C", "A"]);
    }

    #[tokio::test]
    async fn test_drop_above_row_lands_between_neighbours() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        // top band of C: gap between B and C
        session.begin_drag(pool[0].id);
        session.hover_row(Container::Pool, 2, 5.0, 40.0);

        let outcome = session.release().unwrap().await.unwrap();
        assert_eq!(outcome, DropOutcome::Applied(MoveOutcome::Moved));
        assert_eq!(names(&engine, Container::Pool).await, vec!["B", "A", "C"]);
    }

    #[tokio::test]
    async fn test_drop_below_own_row_is_noop() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.begin_drag(pool[0].id);
        session.hover_row(Container::Pool, 0, 35.0, 40.0);
        assert!(session.tracker().is_self_drop(Container::Pool, 0));

        let outcome = session.release().unwrap().await.unwrap();
        assert_eq!(outcome, DropOutcome::Applied(MoveOutcome::Unchanged));
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_drop_above_first_row_moves_up() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.begin_drag(pool[2].id);
        session.hover_row(Container::Pool, 0, 2.0, 40.0);

        let outcome = session.release().unwrap().await.unwrap();
        assert_eq!(outcome, DropOutcome::Applied(MoveOutcome::Moved));
        assert_eq!(names(&engine, Container::Pool).await, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_release_over_middle_of_row_drops_nothing() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.begin_drag(pool[0].id);
        session.hover_row(Container::Pool, 2, 35.0, 40.0);
        session.hover_row(Container::Pool, 1, 20.0, 40.0);

        assert!(session.release().is_none());
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_click_without_drag_spawns_nothing() {
        let (engine, pool, _) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.press(pool[1].id, 10.0, 10.0);
        assert!(!session.pointer_moved(12.0, 11.0));
        assert!(session.release().is_none());
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_cancel_drag_clears_target() {
        let (engine, pool, work) = setup().await;
        let mut session = InteractionSession::new(engine.clone());

        session.begin_drag(pool[0].id);
        session.hover_gap(Container::Collection(work.id), 0);
        session.cancel_drag();

        assert!(session.tracker().drop_target().is_none());
        assert!(session.release().is_none());
    }

    #[tokio::test]
    async fn test_stale_payload_is_rejected() {
        let (engine, pool, work) = setup().await;
        let session = InteractionSession::new(engine.clone());
        let payload = pool[2].id.to_string();
        engine.delete_counter(pool[2].id).await.unwrap();

        let target = DropTarget { container: Container::Collection(work.id), index: 0 };
        let outcome = session.drop_payload(payload, target).await.unwrap();
        assert_eq!(outcome, DropOutcome::Rejected);
        assert!(names(&engine, Container::Collection(work.id)).await.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_payload_is_rejected() {
        let (engine, _, _) = setup().await;
        let session = InteractionSession::new(engine.clone());

        let target = DropTarget { container: Container::Pool, index: 0 };
        let outcome = session.drop_payload("not-a-counter".to_string(), target).await.unwrap();
        assert_eq!(outcome, DropOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_missing_collection_fails_drop() {
        let (engine, pool, work) = setup().await;
        let session = InteractionSession::new(engine.clone());
        engine.delete_collection(work.id).await.unwrap();

        let target = DropTarget { container: Container::Collection(work.id), index: 0 };
        let outcome = session.drop_payload(pool[0].id.to_string(), target).await.unwrap();
        assert!(matches!(outcome, DropOutcome::Failed(_)));
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_close_cancels_pending_drop() {
        let (engine, pool, work) = setup().await;
        let mut session = InteractionSession::new(engine.clone());
        let target = DropTarget { container: Container::Collection(work.id), index: 0 };

        // current-thread runtime: the task has not been polled yet
        let handle = session.drop_payload(pool[0].id.to_string(), target);
        session.close();

        assert_eq!(handle.await.unwrap(), DropOutcome::Cancelled);
        assert!(session.is_closed());
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_dropping_session_cancels_pending_drop() {
        let (engine, pool, _) = setup().await;
        let session = InteractionSession::new(engine.clone());
        let target = DropTarget { container: Container::Pool, index: 2 };

        let handle = session.drop_payload(pool[0].id.to_string(), target);
        drop(session);

        assert_eq!(handle.await.unwrap(), DropOutcome::Cancelled);
        assert_eq!(names(&engine, Container::Pool).await, vec!["A", "B", "C"]);
    }
}
