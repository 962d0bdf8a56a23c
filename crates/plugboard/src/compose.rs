//! Snippet aggregation.
//!
//! Turns a snap's declarations and the set of live connections touching it
//! into one policy document per security backend. Composition is a pure
//! function of its arguments: the same inputs always produce byte-identical
//! documents, so callers can diff against what is loaded and skip reloads.
//!
//! Document layout:
//! 1. bus-name ownership blocks (D-Bus only)
//! 2. permanent slot fragments, then permanent plug fragments, in
//!    declaration order
//! 3. connected fragments, ordered by peer snap, peer endpoint, own endpoint
//!    and side; on classic hosts a plug's widening fragment follows its own.
//!    Device rules never carry connected fragments.

use std::collections::BTreeSet;

use bytes::{Bytes, BytesMut};
use crossbeam_channel::unbounded;
use plugboard_common::{Domain, PlugboardError, PlugboardResult, RuntimeMode, SnapName};
use sha2::{Digest, Sha256};

use crate::interfaces::{Catalogue, Connection, Fragment, Interface, SnapDeclaration};
use crate::security::SecurityBackend;

/// Concatenated policy for one snap and one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Snap the policy confines.
    pub snap: SnapName,
    /// Target backend.
    pub backend: SecurityBackend,
    /// Concatenated fragments.
    pub content: Bytes,
}

impl PolicyDocument {
    /// Whether no interface contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Document bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Hex SHA-256 of the content, for cheap comparison with loaded policy.
    #[must_use]
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.content))
    }
}

/// Which side of a connection the composed snap is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    Slot,
    Plug,
}

/// One side of one connection, as seen from the composed snap.
struct Contribution<'c> {
    side: Side,
    conn: &'c Connection,
}

impl Contribution<'_> {
    fn key(&self) -> (&str, &str, &str, Side) {
        let (peer_snap, peer, own) = match self.side {
            Side::Slot => (&self.conn.plug.snap.name, &self.conn.plug.name, &self.conn.slot.name),
            Side::Plug => (&self.conn.slot.snap.name, &self.conn.slot.name, &self.conn.plug.name),
        };
        (peer_snap.as_str(), peer.as_str(), own.as_str(), self.side)
    }
}

/// Composes policy documents from the interfaces in a catalogue.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    catalogue: &'a Catalogue,
}

impl<'a> Composer<'a> {
    /// Create a composer over a catalogue.
    #[must_use]
    pub const fn new(catalogue: &'a Catalogue) -> Self {
        Self { catalogue }
    }

    /// The catalogue interfaces are looked up in.
    #[must_use]
    pub const fn catalogue(&self) -> &'a Catalogue {
        self.catalogue
    }

    /// Compose the snap-wide document for one backend.
    ///
    /// # Errors
    ///
    /// Returns [`PlugboardError::UnknownInterface`] if a declaration or
    /// connection names an interface missing from the catalogue, and
    /// [`PlugboardError::Composition`] if an interface fails to produce a
    /// fragment. Nothing is returned in either case.
    pub fn compose(
        &self,
        decl: &SnapDeclaration,
        connections: &[Connection],
        backend: SecurityBackend,
        mode: RuntimeMode,
    ) -> PlugboardResult<PolicyDocument> {
        self.compose_filtered(decl, None, connections, backend, mode)
    }

    /// Compose the document of a single app or hook.
    ///
    /// Only plugs and slots bound to the domain contribute.
    ///
    /// # Errors
    ///
    /// Same as [`Composer::compose`]; additionally fails if the snap has no
    /// such domain.
    pub fn compose_domain(
        &self,
        decl: &SnapDeclaration,
        domain: &Domain,
        connections: &[Connection],
        backend: SecurityBackend,
        mode: RuntimeMode,
    ) -> PlugboardResult<PolicyDocument> {
        if !decl.info.has_domain(domain) {
            return Err(PlugboardError::composition(
                decl.name().as_str(),
                backend,
                format!("snap has no app or hook {domain}"),
            ));
        }
        self.compose_filtered(decl, Some(domain), connections, backend, mode)
    }

    /// Compose many snaps on a pool of worker threads.
    ///
    /// Results come back in input order; one snap failing does not affect
    /// the others.
    pub fn compose_batch(
        &self,
        decls: &[SnapDeclaration],
        connections: &[Connection],
        backend: SecurityBackend,
        mode: RuntimeMode,
        workers: usize,
    ) -> Vec<PlugboardResult<PolicyDocument>> {
        batch(decls, workers, |decl| {
            self.compose(decl, connections, backend, mode)
        })
    }

    fn compose_filtered(
        &self,
        decl: &SnapDeclaration,
        domain: Option<&Domain>,
        connections: &[Connection],
        backend: SecurityBackend,
        mode: RuntimeMode,
    ) -> PlugboardResult<PolicyDocument> {
        let snap = decl.name();
        let in_scope = |bound: &BTreeSet<Domain>| {
            domain.is_none_or(|d| bound.contains(d))
        };
        let mut content = BytesMut::new();
        let mut push = |fragment: Option<Fragment>, what: &str| {
            if let Some(fragment) = fragment {
                tracing::trace!(snap = %snap, %backend, what, bytes = fragment.len(), "Fragment");
                content.extend_from_slice(&fragment);
            }
        };

        let slots: Vec<_> = decl.slots.iter().filter(|s| in_scope(&s.bound)).collect();
        let plugs: Vec<_> = decl.plugs.iter().filter(|p| in_scope(&p.bound)).collect();

        if backend == SecurityBackend::DBus {
            for slot in &slots {
                let iface = self.catalogue.get(slot.interface.as_str())?;
                push(
                    iface.bus_name_ownership(slot).map(|o| o.render()),
                    "bus-name-ownership",
                );
            }
        }

        for slot in &slots {
            let iface = self.catalogue.get(slot.interface.as_str())?;
            let fragment = iface
                .permanent_slot_fragment(slot, backend)
                .map_err(|e| wrap(snap, backend, e))?;
            push(fragment, "permanent-slot");
        }
        for plug in &plugs {
            let iface = self.catalogue.get(plug.interface.as_str())?;
            let fragment = iface
                .permanent_plug_fragment(plug, backend)
                .map_err(|e| wrap(snap, backend, e))?;
            push(fragment, "permanent-plug");
        }

        let connections: &[Connection] = if backend.is_connection_scoped() {
            connections
        } else {
            &[]
        };
        for contribution in contributions(snap, connections, &in_scope) {
            let conn = contribution.conn;
            if conn.plug.interface != conn.slot.interface {
                return Err(PlugboardError::composition(
                    snap.as_str(),
                    backend,
                    format!(
                        "connection {conn} pairs interface {} with {}",
                        conn.plug.interface, conn.slot.interface
                    ),
                ));
            }
            let iface: &dyn Interface = &**self.catalogue.get(conn.plug.interface.as_str())?;
            match contribution.side {
                Side::Slot => {
                    let fragment = iface
                        .connected_slot_fragment(&conn.plug, &conn.slot, backend)
                        .map_err(|e| wrap(snap, backend, e))?;
                    push(fragment, "connected-slot");
                }
                Side::Plug => {
                    let fragment = iface
                        .connected_plug_fragment(&conn.plug, &conn.slot, backend)
                        .map_err(|e| wrap(snap, backend, e))?;
                    push(fragment, "connected-plug");
                    if mode.is_classic() {
                        push(
                            iface.classic_plug_fragment(&conn.plug, &conn.slot, backend),
                            "classic-plug",
                        );
                    }
                }
            }
        }

        let doc = PolicyDocument {
            snap: snap.clone(),
            backend,
            content: content.freeze(),
        };
        tracing::debug!(
            snap = %snap,
            %backend,
            domain = ?domain.map(ToString::to_string),
            bytes = doc.content.len(),
            "Composed policy"
        );
        Ok(doc)
    }
}

/// Sides of connections touching the snap, in stable order, each once.
fn contributions<'c>(
    snap: &SnapName,
    connections: &'c [Connection],
    in_scope: &dyn Fn(&BTreeSet<Domain>) -> bool,
) -> Vec<Contribution<'c>> {
    let mut found = Vec::new();
    for conn in connections {
        if &conn.slot.snap.name == snap && in_scope(&conn.slot.bound) {
            found.push(Contribution {
                side: Side::Slot,
                conn,
            });
        }
        if &conn.plug.snap.name == snap && in_scope(&conn.plug.bound) {
            found.push(Contribution {
                side: Side::Plug,
                conn,
            });
        }
    }
    found.sort_by(|a, b| a.key().cmp(&b.key()));
    found.dedup_by(|a, b| a.key() == b.key());
    found
}

/// Interface failures become composition errors of this snap; catalogue
/// errors keep their own kind.
fn wrap(snap: &SnapName, backend: SecurityBackend, err: PlugboardError) -> PlugboardError {
    match err {
        PlugboardError::Composition { .. } | PlugboardError::UnknownInterface { .. } => err,
        other => PlugboardError::composition(snap.as_str(), backend, other.to_string()),
    }
}

/// Run `f` over every declaration on `workers` threads.
///
/// Results are returned in input order.
///
/// # Panics
///
/// Propagates a panic raised by `f` on any worker.
pub fn batch<T, F>(decls: &[SnapDeclaration], workers: usize, f: F) -> Vec<PlugboardResult<T>>
where
    T: Send,
    F: Fn(&SnapDeclaration) -> PlugboardResult<T> + Sync,
{
    let workers = workers.clamp(1, decls.len().max(1));
    let (job_tx, job_rx) = unbounded::<usize>();
    let (result_tx, result_rx) = unbounded();
    for index in 0..decls.len() {
        // Both ends are alive here; sending cannot fail.
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let f = &f;
            scope.spawn(move || {
                for index in job_rx {
                    if result_tx.send((index, f(&decls[index]))).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<Option<PlugboardResult<T>>> = decls.iter().map(|_| None).collect();
    for (index, result) in result_rx {
        results[index] = Some(result);
    }
    // Every index was queued and the scope only returns once all workers
    // drained the queue; a worker panic propagates out of the scope instead.
    results
        .into_iter()
        .map(|result| result.expect("every queued declaration yields a result"))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use plugboard_common::AppName;

    use super::*;
    use crate::interfaces::testing::{TestInterface, consumer, provider};

    fn catalogue(ifaces: Vec<TestInterface>) -> Catalogue {
        let mut catalogue = Catalogue::new();
        for iface in ifaces {
            catalogue.register(Arc::new(iface)).unwrap();
        }
        catalogue
    }

    fn text(doc: &PolicyDocument) -> String {
        String::from_utf8(doc.content.to_vec()).unwrap()
    }

    fn setup() -> (SnapDeclaration, SnapDeclaration, Connection) {
        let mut p = provider("modemd");
        let slot = p.add_slot("modem", "modem").unwrap().clone();
        let mut c = consumer("dialer");
        let plug = c.add_plug("modem", "modem").unwrap().clone();
        (p, c, Connection::new(plug, slot))
    }

    #[test]
    fn permanent_only_without_connections() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (p, c, _) = setup();

        let doc = composer
            .compose(&p, &[], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(text(&doc), "# modem permanent-slot modem\n");

        let doc = composer
            .compose(&c, &[], SecurityBackend::SecComp, RuntimeMode::Classic)
            .unwrap();
        assert_eq!(text(&doc), "# modem permanent-plug modem\n");
    }

    #[test]
    fn connected_fragments_follow_permanent_ones() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (p, c, conn) = setup();
        let conns = [conn];

        let doc = composer
            .compose(&p, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(
            text(&doc),
            "# modem permanent-slot modem\n# modem connected-slot peer=\"snap.dialer.*\"\n"
        );

        let doc = composer
            .compose(&c, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(
            text(&doc),
            "# modem permanent-plug modem\n# modem connected-plug peer=\"snap.modemd.daemon\"\n"
        );
    }

    #[test]
    fn device_rules_never_carry_connections() {
        let catalogue = catalogue(vec![TestInterface::new("modem").widened_on_classic()]);
        let composer = Composer::new(&catalogue);
        let (p, c, conn) = setup();
        let conns = [conn];

        let doc = composer
            .compose(&p, &conns, SecurityBackend::UDev, RuntimeMode::Classic)
            .unwrap();
        assert_eq!(text(&doc), "# modem permanent-slot modem\n");

        let doc = composer
            .compose(&c, &conns, SecurityBackend::UDev, RuntimeMode::Classic)
            .unwrap();
        let body = text(&doc);
        assert_eq!(body, "# modem permanent-plug modem\n");
        assert!(!body.contains("connected"));
        assert!(!body.contains("classic"));

        // The same connection still reaches the other backends.
        let doc = composer
            .compose(&c, &conns, SecurityBackend::SecComp, RuntimeMode::Classic)
            .unwrap();
        assert!(text(&doc).contains("connected-plug"));
    }

    #[test]
    fn absent_backends_contribute_nothing() {
        let catalogue = catalogue(vec![
            TestInterface::new("modem").only(&[SecurityBackend::AppArmor]),
        ]);
        let composer = Composer::new(&catalogue);
        let (p, c, conn) = setup();
        let conns = [conn];
        for decl in [&p, &c] {
            for backend in [
                SecurityBackend::SecComp,
                SecurityBackend::DBus,
                SecurityBackend::UDev,
            ] {
                let doc = composer
                    .compose(decl, &conns, backend, RuntimeMode::Classic)
                    .unwrap();
                assert!(doc.is_empty(), "{backend} should be empty");
            }
        }
    }

    #[test]
    fn classic_widening_only_for_plugs_of_willing_interfaces() {
        let catalogue = catalogue(vec![TestInterface::new("modem").widened_on_classic()]);
        let composer = Composer::new(&catalogue);
        let (p, c, conn) = setup();
        let conns = [conn];

        let classic = text(
            &composer
                .compose(&c, &conns, SecurityBackend::AppArmor, RuntimeMode::Classic)
                .unwrap(),
        );
        assert!(classic.ends_with(
            "connected-plug peer=\"snap.modemd.daemon\"\n# modem classic peer=unconfined\n"
        ));

        let core = text(
            &composer
                .compose(&c, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
                .unwrap(),
        );
        assert!(!core.contains("unconfined"));

        let provider_side = text(
            &composer
                .compose(&p, &conns, SecurityBackend::AppArmor, RuntimeMode::Classic)
                .unwrap(),
        );
        assert!(!provider_side.contains("unconfined"));
    }

    #[test]
    fn unwilling_interface_never_widens() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (_, c, conn) = setup();
        let doc = composer
            .compose(&c, &[conn], SecurityBackend::AppArmor, RuntimeMode::Classic)
            .unwrap();
        assert!(!text(&doc).contains("unconfined"));
    }

    #[test]
    fn connections_are_ordered_by_peer() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let mut p = provider("modemd");
        let slot = p.add_slot("modem", "modem").unwrap().clone();
        let mut zed = consumer("zed");
        let mut alpha = consumer("alpha");
        let z = Connection::new(zed.add_plug("modem", "modem").unwrap().clone(), slot.clone());
        let a = Connection::new(alpha.add_plug("modem", "modem").unwrap().clone(), slot);

        let forward = composer
            .compose(
                &p,
                &[z.clone(), a.clone()],
                SecurityBackend::AppArmor,
                RuntimeMode::Core,
            )
            .unwrap();
        let backward = composer
            .compose(&p, &[a, z], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(forward, backward);
        let body = text(&forward);
        assert!(body.find("snap.alpha").unwrap() < body.find("snap.zed").unwrap());
    }

    #[test]
    fn removing_one_connection_keeps_the_others() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let mut p = provider("modemd");
        let slot = p.add_slot("modem", "modem").unwrap().clone();
        let mut zed = consumer("zed");
        let mut alpha = consumer("alpha");
        let z = Connection::new(zed.add_plug("modem", "modem").unwrap().clone(), slot.clone());
        let a = Connection::new(alpha.add_plug("modem", "modem").unwrap().clone(), slot);

        let both = text(
            &composer
                .compose(&p, &[a, z.clone()], SecurityBackend::AppArmor, RuntimeMode::Core)
                .unwrap(),
        );
        let remaining = text(
            &composer
                .compose(&p, &[z], SecurityBackend::AppArmor, RuntimeMode::Core)
                .unwrap(),
        );

        let alpha_line = "# modem connected-slot peer=\"snap.alpha.*\"\n";
        let zed_line = "# modem connected-slot peer=\"snap.zed.*\"\n";
        assert!(both.contains(alpha_line));
        assert!(!remaining.contains("snap.alpha"));
        assert_eq!(both.matches(zed_line).count(), 1);
        assert_eq!(remaining.matches(zed_line).count(), 1);
        assert!(remaining.starts_with("# modem permanent-slot modem\n"));
        assert_eq!(remaining, both.replace(alpha_line, ""));
    }

    #[test]
    fn duplicate_connections_compose_once() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (_, c, conn) = setup();
        let doc = composer
            .compose(
                &c,
                &[conn.clone(), conn],
                SecurityBackend::AppArmor,
                RuntimeMode::Core,
            )
            .unwrap();
        assert_eq!(text(&doc).matches("connected-plug").count(), 1);
    }

    #[test]
    fn self_connection_contributes_both_sides() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let mut snap = consumer("combo");
        let slot = snap.add_slot("modem-slot", "modem").unwrap().clone();
        let plug = snap.add_plug("modem-plug", "modem").unwrap().clone();
        let doc = composer
            .compose(
                &snap,
                &[Connection::new(plug, slot)],
                SecurityBackend::AppArmor,
                RuntimeMode::Core,
            )
            .unwrap();
        let body = text(&doc);
        assert!(body.contains("connected-slot"));
        assert!(body.contains("connected-plug"));
    }

    #[test]
    fn unrelated_connections_are_ignored() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (_, _, conn) = setup();
        let bystander = consumer("bystander");
        let with = composer
            .compose(&bystander, &[conn], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        let without = composer
            .compose(&bystander, &[], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn unknown_interface_aborts() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let mut p = provider("radiod");
        let slot = p.add_slot("radio", "radio").unwrap().clone();
        let mut c = consumer("dialer");
        let plug = c.add_plug("radio", "radio").unwrap().clone();
        let err = composer
            .compose(
                &c,
                &[Connection::new(plug, slot)],
                SecurityBackend::AppArmor,
                RuntimeMode::Core,
            )
            .unwrap_err();
        assert!(matches!(err, PlugboardError::UnknownInterface { .. }));
    }

    #[test]
    fn mismatched_interfaces_abort() {
        let catalogue = catalogue(vec![
            TestInterface::new("modem"),
            TestInterface::new("radio"),
        ]);
        let composer = Composer::new(&catalogue);
        let mut p = provider("radiod");
        let slot = p.add_slot("radio", "radio").unwrap().clone();
        let (_, c, conn) = setup();
        let bad = Connection::new(conn.plug, slot);
        let err = composer
            .compose(&c, &[bad], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap_err();
        assert!(matches!(err, PlugboardError::Composition { .. }));
    }

    #[test]
    fn failing_fragment_is_a_composition_error() {
        let catalogue = catalogue(vec![TestInterface::new("modem").failing()]);
        let composer = Composer::new(&catalogue);
        let (_, c, conn) = setup();
        let err = composer
            .compose(&c, &[conn], SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap_err();
        match err {
            PlugboardError::Composition {
                snap,
                backend,
                message,
            } => {
                assert_eq!(snap, "dialer");
                assert_eq!(backend, "apparmor");
                assert!(message.contains("fragment generator broke"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bus_ownership_leads_dbus_document() {
        let catalogue = catalogue(vec![
            TestInterface::new("modem").owning_bus_name("org.example.Modem"),
        ]);
        let composer = Composer::new(&catalogue);
        let (p, c, _) = setup();

        let doc = composer
            .compose(&p, &[], SecurityBackend::DBus, RuntimeMode::Core)
            .unwrap();
        let body = text(&doc);
        assert!(body.starts_with("<policy user=\"root\">\n  <allow own=\"org.example.Modem\"/>"));
        assert!(body.ends_with("# modem permanent-slot modem\n"));

        let doc = composer
            .compose(&c, &[], SecurityBackend::DBus, RuntimeMode::Core)
            .unwrap();
        assert!(!text(&doc).contains("<policy"));
    }

    #[test]
    fn domain_documents_only_include_bound_endpoints() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (_, mut c, conn) = setup();
        let cli = Domain::App(AppName::new("cli").unwrap());
        let app = Domain::App(AppName::new("app").unwrap());
        let plug = c.plugs[0].clone().bind([app.clone()]);
        c.plugs[0] = plug.clone();
        let conns = [Connection::new(plug, conn.slot)];

        let doc = composer
            .compose_domain(&c, &app, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert!(text(&doc).contains("connected-plug"));

        let doc = composer
            .compose_domain(&c, &cli, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert!(doc.is_empty());

        let missing = Domain::App(AppName::new("ghost").unwrap());
        assert!(
            composer
                .compose_domain(
                    &c,
                    &missing,
                    &conns,
                    SecurityBackend::AppArmor,
                    RuntimeMode::Core,
                )
                .is_err()
        );
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (p, c, conn) = setup();
        let mut broken = consumer("broken");
        broken.add_plug("radio", "radio").unwrap();

        let decls = vec![p, broken, c];
        let results = composer.compose_batch(
            &decls,
            &[conn],
            SecurityBackend::AppArmor,
            RuntimeMode::Core,
            4,
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().snap.as_str(), "modemd");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().snap.as_str(), "dialer");
    }

    #[test]
    fn digest_is_stable() {
        let catalogue = catalogue(vec![TestInterface::new("modem")]);
        let composer = Composer::new(&catalogue);
        let (p, _, conn) = setup();
        let conns = [conn];
        let a = composer
            .compose(&p, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        let b = composer
            .compose(&p, &conns, SecurityBackend::AppArmor, RuntimeMode::Core)
            .unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
