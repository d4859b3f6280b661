//! Port-status reconciliation.
//!
//! A refresh cycle fetches the canonical port list, then fans out one status
//! request per port. Responses settle in whatever order the network delivers
//! them; each one is put back at its identity's position in the canonical
//! list, so rows always come out in port-list order.

use std::future::Future;

use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::NodeError;
use crate::protocol::{DmxPortStatus, PortIdentity, RdmTod, DMX_PORTS, RDM_PORTS};
use crate::table::{render, PanelId, RenderTarget, StatusColumns};
use crate::transport::{get_json, Transport};

/// What happens to a port whose status fetch failed. One policy applies to
/// every panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Keep the row, with every status cell shown as unknown.
    #[default]
    #[serde(alias = "unknown")]
    MarkUnknown,
    /// Drop the row for this cycle.
    Omit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortReading<S> {
    Status(S),
    Unknown,
}

impl<S> PortReading<S> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, PortReading::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRow<S> {
    pub identity: PortIdentity,
    pub reading: PortReading<S>,
}

/// Fetch every port's status concurrently and return rows in `canonical`
/// order.
///
/// A failed fetch only affects its own slot, per `policy`. Results are
/// matched back by identity, never by completion index; repeated identities
/// fill their slots first come first served.
pub async fn reconcile<S, F, Fut>(
    canonical: &[PortIdentity],
    fetch_one: F,
    policy: MissingPolicy,
) -> Vec<PortRow<S>>
where
    F: Fn(PortIdentity) -> Fut,
    Fut: Future<Output = Result<S, NodeError>>,
{
    let mut pending: FuturesUnordered<_> = canonical
        .iter()
        .cloned()
        .map(|identity| {
            let fetch = fetch_one(identity.clone());
            async move { (identity, fetch.await) }
        })
        .collect();

    let mut slots: Vec<Option<PortReading<S>>> = canonical.iter().map(|_| None).collect();

    while let Some((identity, result)) = pending.next().await {
        let reading = match result {
            Ok(status) => PortReading::Status(status),
            Err(e) => {
                warn!("port {}: status fetch failed: {}", identity.port, e);
                PortReading::Unknown
            }
        };
        let slot = canonical
            .iter()
            .zip(slots.iter())
            .position(|(c, filled)| filled.is_none() && *c == identity);
        match slot {
            Some(i) => slots[i] = Some(reading),
            None => warn!("port {}: response has no canonical slot", identity.port),
        }
    }

    let rows: Vec<PortRow<S>> = canonical
        .iter()
        .cloned()
        .zip(slots)
        .filter_map(|(identity, slot)| {
            let reading = slot.unwrap_or(PortReading::Unknown);
            if reading.is_unknown() && policy == MissingPolicy::Omit {
                return None;
            }
            Some(PortRow { identity, reading })
        })
        .collect();

    debug!(
        "reconciled {} of {} ports ({:?})",
        rows.len(),
        canonical.len(),
        policy
    );
    rows
}

/// A status panel built on a port-list endpoint plus a per-port endpoint.
pub trait PortPanel {
    type Status: DeserializeOwned + StatusColumns;

    const ID: PanelId;
    const TITLE: &'static str;
    /// Canonical port list resource.
    const PORTS: &'static str;

    fn status_resource(port: &PortIdentity) -> String;
}

pub struct DmxPanel;

impl PortPanel for DmxPanel {
    type Status = DmxPortStatus;

    const ID: PanelId = PanelId::Dmx;
    const TITLE: &'static str = "DMX";
    const PORTS: &'static str = DMX_PORTS;

    fn status_resource(port: &PortIdentity) -> String {
        format!("dmx/status?{}", port.port)
    }
}

pub struct RdmPanel;

impl PortPanel for RdmPanel {
    type Status = RdmTod;

    const ID: PanelId = PanelId::Rdm;
    const TITLE: &'static str = "RDM";
    const PORTS: &'static str = RDM_PORTS;

    fn status_resource(port: &PortIdentity) -> String {
        format!("rdm/tod?{}", port.port)
    }
}

/// One refresh cycle's data: canonical list, then reconciled fan-out.
/// Fails only when the canonical list itself cannot be fetched.
pub async fn refresh_ports<P, X>(
    transport: &X,
    policy: MissingPolicy,
) -> Result<Vec<PortRow<P::Status>>, NodeError>
where
    P: PortPanel,
    X: Transport,
{
    let canonical: Vec<PortIdentity> = get_json(transport, P::PORTS).await?;
    let rows: Vec<PortRow<P::Status>> = reconcile(
        &canonical,
        |identity| async move { get_json(transport, &P::status_resource(&identity)).await },
        policy,
    )
    .await;
    Ok(rows)
}

/// Refresh one panel and hand the table to `target`. On failure nothing is
/// presented, so the previous table stays on screen.
pub async fn refresh_panel<P, X, R>(
    transport: &X,
    policy: MissingPolicy,
    target: &mut R,
) -> Result<(), NodeError>
where
    P: PortPanel,
    X: Transport,
    R: RenderTarget,
{
    match refresh_ports::<P, X>(transport, policy).await {
        Ok(rows) => {
            target.present(P::ID, render(P::TITLE, &rows));
            Ok(())
        }
        Err(e) => {
            warn!("{} refresh failed, keeping last table: {}", P::TITLE, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Direction;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tokio::sync::oneshot;

    fn ports(names: &[&str]) -> Vec<PortIdentity> {
        names
            .iter()
            .map(|n| PortIdentity::new(*n, Direction::Output))
            .collect()
    }

    fn order<S>(rows: &[PortRow<S>]) -> Vec<String> {
        rows.iter().map(|r| r.identity.port.clone()).collect()
    }

    /// Fetches block until the test releases them, so completion order is
    /// chosen by the test.
    struct Gates {
        waiting: RefCell<HashMap<String, oneshot::Receiver<Result<u32, ()>>>>,
        completed: RefCell<Vec<String>>,
    }

    impl Gates {
        fn new(names: &[&str]) -> (Self, HashMap<String, oneshot::Sender<Result<u32, ()>>>) {
            let mut waiting = HashMap::new();
            let mut senders = HashMap::new();
            for n in names {
                let (tx, rx) = oneshot::channel();
                waiting.insert(n.to_string(), rx);
                senders.insert(n.to_string(), tx);
            }
            let gates = Self {
                waiting: RefCell::new(waiting),
                completed: RefCell::new(Vec::new()),
            };
            (gates, senders)
        }

        async fn fetch(&self, id: PortIdentity) -> Result<u32, NodeError> {
            let rx = self.waiting.borrow_mut().remove(&id.port).expect("gate");
            let result = rx.await.expect("released");
            self.completed.borrow_mut().push(id.port.clone());
            result.map_err(|_| NodeError::Status(500))
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_canonical_order() {
        let canonical = ports(&["P1", "P2", "P3"]);
        let (gates, mut senders) = Gates::new(&["P1", "P2", "P3"]);

        let run = reconcile(&canonical, |id| gates.fetch(id), MissingPolicy::MarkUnknown);
        let release = async {
            for (port, value) in [("P2", 2), ("P1", 1), ("P3", 3)] {
                senders.remove(port).unwrap().send(Ok(value)).unwrap();
                settle().await;
            }
        };
        let (rows, ()) = tokio::join!(run, release);

        assert_eq!(*gates.completed.borrow(), vec!["P2", "P1", "P3"]);
        assert_eq!(order(&rows), vec!["P1", "P2", "P3"]);
        assert_eq!(rows[0].reading, PortReading::Status(1));
        assert_eq!(rows[1].reading, PortReading::Status(2));
        assert_eq!(rows[2].reading, PortReading::Status(3));
    }

    #[tokio::test]
    async fn test_failed_fetch_marked_unknown() {
        let canonical = ports(&["P1", "P2", "P3"]);
        let (gates, mut senders) = Gates::new(&["P1", "P2", "P3"]);

        let run = reconcile(&canonical, |id| gates.fetch(id), MissingPolicy::MarkUnknown);
        let release = async {
            senders.remove("P2").unwrap().send(Ok(2)).unwrap();
            settle().await;
            senders.remove("P1").unwrap().send(Ok(1)).unwrap();
            settle().await;
            senders.remove("P3").unwrap().send(Err(())).unwrap();
        };
        let (rows, ()) = tokio::join!(run, release);

        assert_eq!(order(&rows), vec!["P1", "P2", "P3"]);
        assert_eq!(rows[2].reading, PortReading::Unknown);
    }

    #[tokio::test]
    async fn test_failed_fetch_omitted() {
        let canonical = ports(&["P1", "P2", "P3"]);
        let rows = reconcile(
            &canonical,
            |id| async move {
                if id.port == "P2" {
                    Err(NodeError::Status(404))
                } else {
                    Ok(id.port.len())
                }
            },
            MissingPolicy::Omit,
        )
        .await;
        assert_eq!(order(&rows), vec!["P1", "P3"]);
    }

    #[tokio::test]
    async fn test_every_permutation_of_completion() {
        let names = ["A", "B", "C", "D"];
        let canonical = ports(&names);
        let perms = [
            [0, 1, 2, 3],
            [3, 2, 1, 0],
            [1, 3, 0, 2],
            [2, 0, 3, 1],
            [3, 0, 2, 1],
        ];
        for perm in perms {
            let (gates, mut senders) = Gates::new(&names);
            let run = reconcile(&canonical, |id| gates.fetch(id), MissingPolicy::MarkUnknown);
            let release = async {
                for i in perm {
                    senders.remove(names[i]).unwrap().send(Ok(i as u32)).unwrap();
                    settle().await;
                }
            };
            let (rows, ()) = tokio::join!(run, release);
            assert_eq!(order(&rows), names.to_vec(), "completion order {:?}", perm);
            for (i, row) in rows.iter().enumerate() {
                assert_eq!(row.reading, PortReading::Status(i as u32));
            }
        }
    }

    #[tokio::test]
    async fn test_duplicate_identities_fill_successive_slots() {
        let canonical = ports(&["A", "A"]);
        let rows = reconcile(
            &canonical,
            |_| async { Ok::<_, NodeError>(7u8) },
            MissingPolicy::MarkUnknown,
        )
        .await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.reading == PortReading::Status(7)));
    }

    #[tokio::test]
    async fn test_empty_canonical_list() {
        let rows: Vec<PortRow<u8>> = reconcile(
            &[],
            |_| async { Ok::<_, NodeError>(0u8) },
            MissingPolicy::MarkUnknown,
        )
        .await;
        assert!(rows.is_empty());
    }

    #[test]
    fn test_missing_policy_config_names() {
        #[derive(Deserialize)]
        struct W {
            p: MissingPolicy,
        }
        let w: W = toml::from_str("p = \"omit\"").unwrap();
        assert_eq!(w.p, MissingPolicy::Omit);
        let w: W = toml::from_str("p = \"unknown\"").unwrap();
        assert_eq!(w.p, MissingPolicy::MarkUnknown);
    }
}
