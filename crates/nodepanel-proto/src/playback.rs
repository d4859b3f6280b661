//! Show player mirror.
//!
//! The node owns the player; this side only remembers the last successful
//! poll. Every command is a POST followed by a fresh poll, and nothing is
//! displayed until that poll says so. If the node ignores a command the next
//! poll simply shows the old state again.

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::NodeError;
use crate::protocol::{
    Action, Flag, PlayCommand, ShowDirectory, ShowId, ShowStatus, SHOW_DIRECTORY, SHOW_STATUS,
};
use crate::table::{render_directory, render_show_status, PanelId, RenderTarget};
use crate::transport::{get_json, Transport};

/// Last polled player data. `rev` increases with every successful poll of
/// either resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub rev: u64,
    pub status: Option<ShowStatus>,
    pub directory: Option<ShowDirectory>,
}

impl PlayerSnapshot {
    pub fn selected(&self) -> Option<ShowId> {
        self.status.as_ref().and_then(|s| s.show)
    }

    /// Hand the status and directory tables to `target`. Parts never polled
    /// are skipped so whatever the target already shows stays.
    pub fn present<R: RenderTarget>(&self, target: &mut R) {
        if let Some(status) = &self.status {
            target.present(PanelId::ShowStatus, render_show_status(status));
        }
        if let Some(directory) = &self.directory {
            target.present(PanelId::ShowDirectory, render_directory(directory, self.selected()));
        }
    }
}

pub struct PlaybackController<X> {
    transport: X,
    snapshot: RwLock<PlayerSnapshot>,
}

impl<X: Transport> PlaybackController<X> {
    pub fn new(transport: X) -> Self {
        Self {
            transport,
            snapshot: RwLock::new(PlayerSnapshot::default()),
        }
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Fetch the player status. The snapshot only changes on success.
    pub async fn poll(&self) -> Result<ShowStatus, NodeError> {
        let status: ShowStatus = get_json(&self.transport, SHOW_STATUS).await?;
        let mut snapshot = self.snapshot.write().await;
        snapshot.status = Some(status.clone());
        snapshot.rev += 1;
        debug!("player poll rev={} {:?}", snapshot.rev, status);
        Ok(status)
    }

    pub async fn poll_directory(&self) -> Result<ShowDirectory, NodeError> {
        let directory: ShowDirectory = get_json(&self.transport, SHOW_DIRECTORY).await?;
        let mut snapshot = self.snapshot.write().await;
        snapshot.directory = Some(directory.clone());
        snapshot.rev += 1;
        debug!("show directory rev={}: {} shows", snapshot.rev, directory.shows.len());
        Ok(directory)
    }

    /// Status and directory together; the first error wins but both are tried.
    pub async fn refresh(&self) -> Result<(), NodeError> {
        let (status, directory) = tokio::join!(self.poll(), self.poll_directory());
        status?;
        directory?;
        Ok(())
    }

    async fn command(&self, action: Action) -> Result<ShowStatus, NodeError> {
        info!("player command {:?}", action);
        if let Err(e) = self.transport.post_action(&action).await {
            warn!("player command {:?} not submitted: {}", action, e);
            return Err(e);
        }
        self.poll().await
    }

    /// Ask the node to select `show`. Valid from any state; the node decides
    /// whether to honour it while playing.
    pub async fn select(&self, show: ShowId) -> Result<ShowStatus, NodeError> {
        self.command(Action::Show(show)).await
    }

    pub async fn start(&self) -> Result<ShowStatus, NodeError> {
        self.command(Action::Status(PlayCommand::Start)).await
    }

    pub async fn stop(&self) -> Result<ShowStatus, NodeError> {
        self.command(Action::Status(PlayCommand::Stop)).await
    }

    pub async fn resume(&self) -> Result<ShowStatus, NodeError> {
        self.command(Action::Status(PlayCommand::Resume)).await
    }

    /// Send the negation of the last *polled* loop flag.
    ///
    /// No local flag is kept: if the last poll is stale the node receives a
    /// stale target. Poll first when that matters.
    pub async fn toggle_loop(&self) -> Result<ShowStatus, NodeError> {
        let looping = self
            .snapshot
            .read()
            .await
            .status
            .as_ref()
            .map(|s| s.looping)
            .ok_or(NodeError::NotPolled)?;
        self.command(Action::Loop(Flag(!looping))).await
    }

    /// Remove `show` from the node, then re-read the directory and status
    /// (the selection may have pointed at the deleted show).
    pub async fn delete(&self, show: ShowId) -> Result<ShowDirectory, NodeError> {
        info!("delete show {}", show);
        self.transport.delete_action(&Action::Show(show)).await?;
        let directory = self.poll_directory().await?;
        self.poll().await?;
        Ok(directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlaybackStatus;
    use futures_util::future;
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    /// Scripted node: GETs pop queued bodies, actions are recorded.
    #[derive(Default)]
    struct FakeNode {
        bodies: RefCell<VecDeque<Result<Value, u16>>>,
        gets: RefCell<Vec<String>>,
        posts: RefCell<Vec<Value>>,
        deletes: RefCell<Vec<Value>>,
        reject_actions: Cell<bool>,
        first_get_gate: RefCell<Option<oneshot::Receiver<()>>>,
    }

    impl FakeNode {
        fn with(bodies: Vec<Result<Value, u16>>) -> Self {
            Self {
                bodies: RefCell::new(bodies.into()),
                ..Self::default()
            }
        }
    }

    impl Transport for FakeNode {
        async fn get(&self, resource: &str) -> Result<Value, NodeError> {
            let gate = self.first_get_gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.gets.borrow_mut().push(resource.to_string());
            match self.bodies.borrow_mut().pop_front() {
                Some(Ok(v)) => Ok(v),
                Some(Err(code)) => Err(NodeError::Status(code)),
                None => Err(NodeError::Status(503)),
            }
        }

        async fn post_action(&self, action: &Action) -> Result<(), NodeError> {
            if self.reject_actions.get() {
                return Err(NodeError::Status(400));
            }
            self.posts.borrow_mut().push(serde_json::to_value(action)?);
            Ok(())
        }

        async fn delete_action(&self, action: &Action) -> Result<(), NodeError> {
            self.deletes.borrow_mut().push(serde_json::to_value(action)?);
            Ok(())
        }
    }

    fn status(show: u32, st: &str, looping: bool) -> Result<Value, u16> {
        Ok(json!({"show": format!("{:02}", show), "status": st, "loop": u8::from(looping)}))
    }

    #[derive(Default)]
    struct Recorder(Vec<(PanelId, crate::table::DisplayTable)>);

    impl RenderTarget for Recorder {
        fn present(&mut self, panel: PanelId, table: crate::table::DisplayTable) {
            self.0.push((panel, table));
        }
    }

    #[tokio::test]
    async fn test_resume_confirmed_by_poll() {
        let node = FakeNode::with(vec![status(3, "Paused", false), status(3, "Playing", false)]);
        let ctl = PlaybackController::new(node);
        ctl.poll().await.unwrap();

        let after = ctl.resume().await.unwrap();
        assert_eq!(after.status, PlaybackStatus::Playing);
        assert_eq!(*ctl.transport().posts.borrow(), vec![json!({"status": "resume"})]);
        let snap = ctl.snapshot().await;
        assert_eq!(snap.status.unwrap().status, PlaybackStatus::Playing);
        assert_eq!(snap.rev, 2);
    }

    #[tokio::test]
    async fn test_resume_rejected_by_node_stays_paused() {
        let node = FakeNode::with(vec![status(3, "Paused", false), status(3, "Paused", false)]);
        let ctl = PlaybackController::new(node);
        ctl.poll().await.unwrap();

        let after = ctl.resume().await;
        assert!(after.is_ok());
        assert_eq!(ctl.snapshot().await.status.unwrap().status, PlaybackStatus::Paused);
    }

    #[tokio::test]
    async fn test_toggle_loop_negates_last_poll() {
        // Node flips loop off behind our back; the toggle still targets the
        // negation of what was last polled (on -> 0).
        let node = FakeNode::with(vec![status(1, "Playing", true), status(1, "Playing", false)]);
        let ctl = PlaybackController::new(node);
        ctl.poll().await.unwrap();

        ctl.toggle_loop().await.unwrap();
        assert_eq!(*ctl.transport().posts.borrow(), vec![json!({"loop": 0})]);
    }

    #[tokio::test]
    async fn test_toggle_loop_without_poll_fails_locally() {
        let ctl = PlaybackController::new(FakeNode::default());
        assert!(matches!(ctl.toggle_loop().await, Err(NodeError::NotPolled)));
        assert!(ctl.transport().posts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submit_leaves_snapshot() {
        let node = FakeNode::with(vec![status(2, "Stopped", false)]);
        node.reject_actions.set(true);
        let ctl = PlaybackController::new(node);
        ctl.poll().await.unwrap();
        let before = ctl.snapshot().await;

        assert!(matches!(ctl.start().await, Err(NodeError::Status(400))));
        assert_eq!(ctl.snapshot().await, before);
        assert_eq!(ctl.transport().gets.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_repoll_leaves_snapshot() {
        let node = FakeNode::with(vec![status(2, "Stopped", false), Err(500)]);
        let ctl = PlaybackController::new(node);
        ctl.poll().await.unwrap();
        let before = ctl.snapshot().await;

        assert!(ctl.start().await.is_err());
        assert_eq!(ctl.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_start_does_not_wait_for_select_poll() {
        let (release, gate) = oneshot::channel();
        let node = FakeNode::with(vec![status(5, "Playing", false), status(5, "Playing", false)]);
        *node.first_get_gate.borrow_mut() = Some(gate);
        let ctl = PlaybackController::new(node);

        let show = ShowId::new(5).unwrap();
        // `future::join` polls in argument order: select posts first, then
        // parks on its re-poll while start runs to completion.
        let (selected, started) = future::join(ctl.select(show), async {
            let started = ctl.start().await;
            let _ = release.send(());
            started
        })
        .await;

        assert_eq!(started.unwrap().status, PlaybackStatus::Playing);
        assert!(selected.is_ok());
        assert_eq!(
            *ctl.transport().posts.borrow(),
            vec![json!({"show": 5}), json!({"status": "start"})]
        );
        assert_eq!(ctl.transport().gets.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_refreshes_directory_and_status() {
        let node = FakeNode::with(vec![
            Ok(json!({"shows": ["00", "02"]})),
            Ok(json!({"show": "none", "status": "Stopped", "loop": 0})),
        ]);
        let ctl = PlaybackController::new(node);

        let dir = ctl.delete(ShowId::new(1).unwrap()).await.unwrap();
        assert_eq!(dir.shows.len(), 2);
        assert_eq!(*ctl.transport().deletes.borrow(), vec![json!({"show": 1})]);
        assert_eq!(
            *ctl.transport().gets.borrow(),
            vec![SHOW_DIRECTORY.to_string(), SHOW_STATUS.to_string()]
        );
        assert_eq!(ctl.snapshot().await.selected(), None);
    }

    #[tokio::test]
    async fn test_partial_refresh_keeps_the_poll_that_landed() {
        let node = FakeNode::with(vec![status(1, "Playing", true), Err(500)]);
        let ctl = PlaybackController::new(node);

        assert!(matches!(ctl.refresh().await, Err(NodeError::Status(500))));
        let snap = ctl.snapshot().await;
        assert_eq!(snap.rev, 1);
        assert!(snap.status.unwrap().looping);
        assert_eq!(snap.directory, None);
    }

    #[tokio::test]
    async fn test_delete_with_failed_status_poll_keeps_new_directory() {
        let node = FakeNode::with(vec![
            status(1, "Stopped", false),
            Ok(json!({"shows": ["00", "01"]})),
            Ok(json!({"shows": ["00"]})),
            Err(500),
        ]);
        let ctl = PlaybackController::new(node);
        ctl.refresh().await.unwrap();

        assert!(ctl.delete(ShowId::new(1).unwrap()).await.is_err());
        let snap = ctl.snapshot().await;
        assert_eq!(snap.rev, 3);
        assert_eq!(snap.directory.unwrap().shows, vec![ShowId::new(0).unwrap()]);
    }

    #[tokio::test]
    async fn test_snapshot_presents_only_polled_parts() {
        let node = FakeNode::with(vec![status(4, "Recording", false)]);
        let ctl = PlaybackController::new(node);

        let mut target = Recorder::default();
        ctl.snapshot().await.present(&mut target);
        assert!(target.0.is_empty());

        ctl.poll().await.unwrap();
        ctl.snapshot().await.present(&mut target);
        assert_eq!(target.0.len(), 1);
        assert_eq!(target.0[0].0, PanelId::ShowStatus);
        assert_eq!(target.0[0].1.rows[0], vec!["04", "Recording", "off"]);
    }
}
