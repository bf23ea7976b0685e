//! Session bootstrap and role resolution.
//!
//! [`SessionResolver`] owns the single [`ResolvedSessionState`] for the
//! process. It is fed by two signal sources:
//!
//! - a one-shot bootstrap query ([`SessionResolver::initialize`]), and
//! - the provider's session change notifications.
//!
//! Every accepted signal takes a ticket from a monotonic counter at the
//! moment it is accepted. A continuation (role lookup completing, bootstrap
//! query returning) may only write the state if its ticket is still the
//! newest one issued, so the final state always reflects the most recently
//! fired signal no matter in which order lookups complete. Sign-out needs no
//! lookup and is committed immediately under its own ticket.
//!
//! Teardown flips a liveness flag and cancels the provider subscription;
//! continuations that complete afterwards are dropped.

use crate::resolver_fsm::{ResolverInput, ResolverMachine};
use crate::{
    AuthProvider, AuthResult, AuthenticatedIdentity, ProfileStore, ResolvedSessionState, Role,
    Session, SessionEvent, SessionListener, SessionStateReader, SignUpOutcome, SignUpProfile,
    Subscription,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

/// Position of a signal in acceptance order. `0` means nothing issued yet.
type Ticket = u64;

/// The most recently accepted signal, used to skip redundant role lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LatestSignal {
    SignedIn(AuthenticatedIdentity),
    SignedOut,
}

impl LatestSignal {
    fn from_state(state: &ResolvedSessionState) -> Option<Self> {
        match state {
            ResolvedSessionState::Unresolved => None,
            ResolvedSessionState::Unauthenticated => Some(LatestSignal::SignedOut),
            ResolvedSessionState::Authenticated { identity, .. } => {
                Some(LatestSignal::SignedIn(identity.clone()))
            }
        }
    }
}

struct Coordinator {
    fsm: ResolverMachine,
    /// Newest ticket issued. Only this ticket may write the state.
    latest: Ticket,
    latest_signal: Option<LatestSignal>,
    bootstrap_started: bool,
}

/// A sign-in waiting for its role lookup.
struct PendingSignIn {
    ticket: Ticket,
    identity: AuthenticatedIdentity,
}

struct Shared {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    alive: AtomicBool,
    torn_down: Notify,
    coordinator: Mutex<Coordinator>,
    state_tx: watch::Sender<ResolvedSessionState>,
    /// Highest ticket whose continuation has settled.
    settled_tx: watch::Sender<Ticket>,
    subscription: Mutex<Option<Subscription>>,
}

impl Shared {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn issue(coord: &mut Coordinator) -> Ticket {
        coord.latest += 1;
        coord.latest
    }

    fn current(&self) -> ResolvedSessionState {
        self.state_tx.borrow().clone()
    }

    /// Register with the provider once. The listener holds only a weak
    /// reference so the provider never keeps a dropped resolver alive.
    fn ensure_subscribed(self: &Arc<Self>) {
        let mut slot = self.subscription.lock();
        if slot.is_some() {
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "No async runtime, session events will not be observed");
                return;
            }
        };

        let weak = Arc::downgrade(self);
        let listener: SessionListener =
            Arc::new(move |event: SessionEvent, session: Option<Session>| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if let Some(pending) = shared.accept_signal(event, session) {
                    handle.spawn(async move { shared.settle(pending).await });
                }
            });

        *slot = Some(self.auth.subscribe(listener));
        debug!("Subscribed to session events");
    }

    /// Take a ticket for an incoming event.
    ///
    /// Sign-outs are committed before returning. Sign-ins come back as
    /// pending work unless they repeat the latest accepted identity.
    fn accept_signal(
        &self,
        event: SessionEvent,
        session: Option<Session>,
    ) -> Option<PendingSignIn> {
        if !self.is_alive() {
            debug!(event = %event, "Resolver torn down, ignoring session event");
            return None;
        }

        let session = if event.is_sign_in() { session } else { None };
        let mut coord = self.coordinator.lock();

        match session {
            Some(session) => {
                let identity = session.user;
                let signal = LatestSignal::SignedIn(identity.clone());
                if coord.latest_signal.as_ref() == Some(&signal) {
                    debug!(
                        event = %event,
                        identity_id = %identity.id,
                        "Identity unchanged, skipping role lookup"
                    );
                    return None;
                }

                let ticket = Self::issue(&mut coord);
                coord.latest_signal = Some(signal);
                debug!(ticket, event = %event, identity_id = %identity.id, "Sign-in accepted");
                Some(PendingSignIn { ticket, identity })
            }
            None => {
                let ticket = Self::issue(&mut coord);
                coord.latest_signal = Some(LatestSignal::SignedOut);
                debug!(ticket, event = %event, "Sign-out accepted");
                self.commit_locked(
                    &mut coord,
                    ticket,
                    ResolverInput::SignedOut,
                    ResolvedSessionState::Unauthenticated,
                );
                None
            }
        }
    }

    /// Resolve the role for a pending sign-in and commit it if still current.
    async fn settle(&self, pending: PendingSignIn) {
        let role = self.resolve_role(&pending.identity.id).await;
        let mut coord = self.coordinator.lock();
        self.commit_locked(
            &mut coord,
            pending.ticket,
            ResolverInput::SignedIn,
            ResolvedSessionState::authenticated(pending.identity, role),
        );
    }

    /// Write `next` if `ticket` is still the newest and the resolver is alive.
    fn commit_locked(
        &self,
        coord: &mut Coordinator,
        ticket: Ticket,
        input: ResolverInput,
        next: ResolvedSessionState,
    ) -> bool {
        if !self.is_alive() {
            debug!(ticket, "Resolver torn down, dropping result");
            return false;
        }
        if ticket != coord.latest {
            debug!(ticket, latest = coord.latest, "Superseded result discarded");
            return false;
        }

        let old_phase = coord.fsm.state().clone();
        let applied = match coord.fsm.consume(&input) {
            Ok(_) => {
                debug!(
                    old_state = ?old_phase,
                    new_state = ?coord.fsm.state(),
                    ticket,
                    "Resolver state transition"
                );
                self.state_tx.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
                true
            }
            Err(_) => {
                warn!(state = ?old_phase, input = ?input, "Rejected resolver transition");
                false
            }
        };

        // Waiters key off the settled ticket, so advance it either way.
        self.settled_tx.send_replace(ticket);
        applied
    }

    /// Start the one-shot bootstrap unless it already ran or an event
    /// has already been accepted.
    fn begin_bootstrap(&self) -> Option<Ticket> {
        let mut coord = self.coordinator.lock();
        if coord.bootstrap_started || coord.latest_signal.is_some() {
            return None;
        }
        coord.bootstrap_started = true;
        Some(Self::issue(&mut coord))
    }

    fn is_latest(&self, ticket: Ticket) -> bool {
        self.coordinator.lock().latest == ticket
    }

    async fn run_bootstrap(&self, ticket: Ticket) {
        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Session query failed, resolving as signed out");
                None
            }
        };

        let (input, next) = match session {
            None => (
                ResolverInput::BootstrapUnauthenticated,
                ResolvedSessionState::Unauthenticated,
            ),
            Some(session) => {
                if !self.is_latest(ticket) || !self.is_alive() {
                    debug!(ticket, "Bootstrap superseded before role lookup");
                    return;
                }
                let identity = session.user;
                match self.lookup_role(&identity.id).await {
                    Ok(role) => (
                        ResolverInput::BootstrapAuthenticated,
                        ResolvedSessionState::authenticated(identity, role),
                    ),
                    Err(e) => {
                        warn!(
                            identity_id = %identity.id,
                            error = %e,
                            "Profile lookup failed during bootstrap, resolving as signed out"
                        );
                        (
                            ResolverInput::BootstrapUnauthenticated,
                            ResolvedSessionState::Unauthenticated,
                        )
                    }
                }
            }
        };

        let signal = LatestSignal::from_state(&next);
        let mut coord = self.coordinator.lock();
        if self.commit_locked(&mut coord, ticket, input, next) {
            coord.latest_signal = signal;
        }
    }

    /// Wait until the newest ticket issued so far has settled (or teardown).
    async fn await_latest(&self) -> ResolvedSessionState {
        let target = self.coordinator.lock().latest;
        let torn_down = self.torn_down.notified();

        if self.is_alive() {
            let mut settled = self.settled_tx.subscribe();
            tokio::select! {
                _ = settled.wait_for(|ticket| *ticket >= target) => {}
                _ = torn_down => {}
            }
        }

        self.current()
    }

    /// Role lookup that reports backend failures.
    async fn lookup_role(&self, identity_id: &str) -> AuthResult<Role> {
        match self.profiles.profile_by_identity(identity_id).await? {
            Some(profile) => Ok(profile.role),
            None => {
                warn!(identity_id, "No profile for identity, using default role");
                Ok(Role::default())
            }
        }
    }

    async fn resolve_role(&self, identity_id: &str) -> Role {
        match self.lookup_role(identity_id).await {
            Ok(role) => role,
            Err(e) => {
                warn!(identity_id, error = %e, "Profile lookup failed, using default role");
                Role::default()
            }
        }
    }
}

/// Bootstraps the visitor's session and keeps identity and role current.
///
/// Dropping the resolver tears it down.
pub struct SessionResolver {
    shared: Arc<Shared>,
}

impl SessionResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state_tx, _) = watch::channel(ResolvedSessionState::Unresolved);
        let (settled_tx, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                auth,
                profiles,
                alive: AtomicBool::new(true),
                torn_down: Notify::new(),
                coordinator: Mutex::new(Coordinator {
                    fsm: ResolverMachine::new(),
                    latest: 0,
                    latest_signal: None,
                    bootstrap_started: false,
                }),
                state_tx,
                settled_tx,
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Read-only projection of the state.
    pub fn reader(&self) -> SessionStateReader {
        SessionStateReader::new(self.shared.state_tx.subscribe())
    }

    pub fn state(&self) -> ResolvedSessionState {
        self.shared.current()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_alive()
    }

    /// Subscribe to session changes, then run the one-shot bootstrap query.
    ///
    /// Returns once the state has left `Unresolved` (or the resolver was torn
    /// down). A failing query resolves to `Unauthenticated`; so does a
    /// failing profile lookup for the bootstrapped identity, while a missing
    /// profile resolves to the default role. If a session event is accepted
    /// while the bootstrap is in flight, the bootstrap result is discarded.
    /// Calling this again only waits for the current state to settle.
    pub async fn initialize(&self) -> ResolvedSessionState {
        let shared = &self.shared;
        if !shared.is_alive() {
            return shared.current();
        }

        shared.ensure_subscribed();

        if let Some(ticket) = shared.begin_bootstrap() {
            debug!(ticket, "Bootstrapping session");
            let torn_down = shared.torn_down.notified();
            tokio::select! {
                _ = shared.run_bootstrap(ticket) => {}
                _ = torn_down => debug!("Resolver torn down during bootstrap"),
            }
        }

        let state = shared.await_latest().await;
        info!(
            authenticated = state.is_authenticated(),
            role = ?state.role(),
            "Session resolved"
        );
        state
    }

    /// Feed a session change into the resolver and wait for it to settle.
    ///
    /// The listener installed by [`initialize`](Self::initialize) calls the
    /// same path without waiting.
    pub async fn on_session_changed(
        &self,
        event: SessionEvent,
        session: Option<Session>,
    ) -> ResolvedSessionState {
        if let Some(pending) = self.shared.accept_signal(event, session) {
            self.shared.settle(pending).await;
        }
        self.shared.await_latest().await
    }

    /// Look up the role for `identity_id`.
    ///
    /// Never fails: a missing profile or a failed lookup yields the default
    /// role, logged at `warn`.
    pub async fn resolve_role(&self, identity_id: &str) -> Role {
        self.shared.resolve_role(identity_id).await
    }

    /// Sign in through the provider and wait for the role to resolve.
    ///
    /// Credential errors are returned as-is and leave the state untouched.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<ResolvedSessionState> {
        let session = self
            .shared
            .auth
            .sign_in_with_password(email, password)
            .await?;
        info!(identity_id = %session.user.id, "Signed in");
        Ok(self
            .on_session_changed(SessionEvent::SignedIn, Some(session))
            .await)
    }

    /// Create an account. If the backend signs the new user in immediately
    /// the state follows; otherwise it is left unchanged.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> AuthResult<SignUpOutcome> {
        let outcome = self.shared.auth.sign_up(email, password, profile).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            info!(identity_id = %session.user.id, role = %profile.role, "Signed up and signed in");
            self.on_session_changed(SessionEvent::SignedIn, Some(session.clone()))
                .await;
        }
        Ok(outcome)
    }

    /// Sign out. The state becomes `Unauthenticated` even if the provider
    /// reports an error, which is still returned.
    pub async fn sign_out(&self) -> AuthResult<ResolvedSessionState> {
        let result = self.shared.auth.sign_out().await;
        let state = self.on_session_changed(SessionEvent::SignedOut, None).await;
        match result {
            Ok(()) => {
                info!("Signed out");
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "Provider sign-out failed, local state cleared");
                Err(e)
            }
        }
    }

    /// Stop observing session changes and drop any in-flight results.
    /// Idempotent.
    pub fn teardown(&self) {
        if self.shared.alive.swap(false, Ordering::AcqRel) {
            let subscription = self.shared.subscription.lock().take();
            drop(subscription);
            self.shared.torn_down.notify_waiters();
            debug!("Session resolver torn down");
        }
    }
}

impl Drop for SessionResolver {
    fn drop(&mut self) {
        self.teardown();
    }
}
