//! Hooks that run the chain feeds and fold their updates into signals.
//!
//! Each feed hook restarts its feed whenever the wallet session (or the farm
//! selector) changes: the previous run's token is cancelled, the snapshot is
//! reset and a fresh feed is spawned. Unmounting cancels the last run.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use coaster_chain::actions::{self, FarmAction, FarmTarget};
use coaster_chain::error::ConfigError;
use coaster_chain::feed::buyback::{self, BuybackSnapshot};
use coaster_chain::feed::farm::{self as farm_feed, FarmSnapshot};
use coaster_chain::feed::harvest::{self, ClaimsUpdate, HarvestChunkClaims, HarvestHistory};
use coaster_chain::feed::presale::{self, PresaleSnapshot};
use coaster_chain::feed::treasury::{self, TreasuryState};
use coaster_chain::feed::Updates;
use coaster_chain::session::{self, WalletSession};
use coaster_chain::Farm;
use dioxus::prelude::*;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::state::{describe, AppState, FatalError};

/// Holds the token of the feed currently running for one hook.
#[derive(Clone, Default)]
struct FeedSlot(Rc<RefCell<Option<CancellationToken>>>);

impl FeedSlot {
    fn restart(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.0.borrow_mut().replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    fn stop(&self) {
        if let Some(token) = self.0.borrow_mut().take() {
            token.cancel();
        }
    }
}

fn use_feed_slot() -> FeedSlot {
    let slot = use_hook(FeedSlot::default);
    let on_drop = slot.clone();
    use_drop(move || on_drop.stop());
    slot
}

/// Spawn `feed` and a consumer folding its updates into `target`.
fn drive<S, U, F, Fut>(mut target: Signal<S>, cancel: CancellationToken, apply: fn(&mut S, U), feed: F)
where
    S: 'static,
    U: 'static,
    F: FnOnce(Updates<U>) -> Fut,
    Fut: Future<Output = ()> + 'static,
{
    let (updates, mut rx) = Updates::channel(cancel.clone());
    spawn(feed(updates));
    spawn(async move {
        while let Some(update) = rx.recv().await {
            if cancel.is_cancelled() {
                break;
            }
            apply(&mut *target.write(), update);
        }
    });
}

fn report_fatal(fatal: FatalError, err: ConfigError) {
    error!("fatal configuration error: {err}");
    let FatalError(mut message) = fatal;
    message.set(Some(err.to_string()));
}

/// Wakes the session watcher for an immediate poll.
#[derive(Clone)]
pub struct SessionWake(Arc<Notify>);

/// Create the session signal, provide it to the tree and start the
/// provider watcher. The watcher is the only writer of the signal.
pub fn use_wallet_session_provider() -> Signal<WalletSession> {
    let state = use_context::<AppState>();
    let environment = state.config.environment;
    let session = use_context_provider(|| Signal::new(WalletSession::new(environment)));
    let SessionWake(wake) = use_context_provider(|| SessionWake(Arc::new(Notify::new())));
    let slot = use_feed_slot();

    use_hook(move || {
        let cancel = slot.restart();
        drive(session, cancel, WalletSession::apply, move |updates| async move {
            session::run(state.chain.as_deref(), &updates, &wake).await;
        });
    });
    session
}

/// Ask the wallet for accounts. The granted account reaches the session
/// through the watcher.
pub fn connect_wallet(state: &AppState, wake: &SessionWake, mut error: Signal<Option<String>>) {
    let Some(chain) = state.chain.clone() else {
        return;
    };
    let SessionWake(wake) = wake.clone();
    spawn(async move {
        if let Err(err) = session::connect(chain.as_ref(), &wake).await {
            error.set(Some(describe(err)));
        }
    });
}

/// A feed's snapshot plus the trigger that re-reads it after a write.
pub struct FeedHandle<S: 'static> {
    pub snapshot: Signal<S>,
    refresh: Arc<Notify>,
}

impl<S: 'static> Clone for FeedHandle<S> {
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot,
            refresh: self.refresh.clone(),
        }
    }
}

impl<S: 'static> FeedHandle<S> {
    /// Handed to an action so it can request a re-read once its receipt is
    /// in.
    pub fn refresher(&self) -> Arc<Notify> {
        self.refresh.clone()
    }
}

pub fn use_presale() -> FeedHandle<PresaleSnapshot> {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let fatal = use_context::<FatalError>();
    let mut snapshot = use_signal(PresaleSnapshot::default);
    let refresh = use_hook(|| Arc::new(Notify::new()));
    let slot = use_feed_slot();

    let notify = refresh.clone();
    use_effect(move || {
        let session = session.read().clone();
        let state = state.clone();
        let notify = notify.clone();
        let cancel = slot.restart();
        snapshot.set(PresaleSnapshot::default());
        drive(snapshot, cancel, PresaleSnapshot::apply, move |updates| async move {
            let chain = state.chain.as_deref();
            let result = presale::run(chain, &state.contracts, &session, &updates, &notify).await;
            if let Err(err) = result {
                report_fatal(fatal, err);
            }
        });
    });
    FeedHandle { snapshot, refresh }
}

pub fn use_buyback() -> FeedHandle<BuybackSnapshot> {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let fatal = use_context::<FatalError>();
    let mut snapshot = use_signal(BuybackSnapshot::default);
    let refresh = use_hook(|| Arc::new(Notify::new()));
    let slot = use_feed_slot();

    let notify = refresh.clone();
    use_effect(move || {
        let session = session.read().clone();
        let state = state.clone();
        let notify = notify.clone();
        let cancel = slot.restart();
        snapshot.set(BuybackSnapshot::default());
        drive(snapshot, cancel, BuybackSnapshot::apply, move |updates| async move {
            let chain = state.chain.as_deref();
            let result = buyback::run(chain, &state.contracts, &session, &updates, &notify).await;
            if let Err(err) = result {
                report_fatal(fatal, err);
            }
        });
    });
    FeedHandle { snapshot, refresh }
}

pub fn use_treasury() -> Signal<TreasuryState> {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let treasury_address = state.config.addresses.treasury;
    let mut snapshot = use_signal(|| TreasuryState::new(treasury_address));
    let slot = use_feed_slot();

    use_effect(move || {
        let session = session.read().clone();
        let state = state.clone();
        let cancel = slot.restart();
        snapshot.set(TreasuryState::new(treasury_address));
        drive(snapshot, cancel, TreasuryState::apply, move |updates| async move {
            treasury::run(state.chain.as_deref(), &state.contracts, &session, &updates).await;
        });
    });
    snapshot
}

/// The selected farm's snapshot plus the trigger that reloads the position.
#[derive(Clone)]
pub struct FarmHandle {
    pub snapshot: Signal<FarmSnapshot>,
    refresh: Arc<Notify>,
    state: AppState,
    session: Signal<WalletSession>,
}

impl PartialEq for FarmHandle {
    fn eq(&self, other: &Self) -> bool {
        self.snapshot == other.snapshot
    }
}

impl FarmHandle {
    /// Submit `farm_action` against the loaded pool, then reload the
    /// position once the receipt is in.
    pub fn submit(&self, action: Action, farm_action: FarmAction) {
        let Some(chain) = self.state.chain.clone() else {
            return;
        };
        let Some(pool) = self.snapshot.peek().pool.clone() else {
            return;
        };
        let target = FarmTarget {
            farm: pool.farm_address,
            farm_token: pool.farm_token_address,
        };
        let account = self.session.peek().account;
        let contracts = self.state.contracts.clone();
        let refresh = self.refresh.clone();
        action.run(async move {
            actions::execute_farm(chain.as_ref(), &contracts, target, account, farm_action)
                .await
                .map_err(describe)?;
            refresh.notify_one();
            Ok(())
        });
    }
}

pub fn use_farm(farm: Signal<Farm>) -> FarmHandle {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let fatal = use_context::<FatalError>();
    let mut snapshot = use_signal(|| FarmSnapshot::new(*farm.peek()));
    let refresh = use_hook(|| Arc::new(Notify::new()));
    let slot = use_feed_slot();

    let notify = refresh.clone();
    let feed_state = state.clone();
    use_effect(move || {
        let farm = *farm.read();
        let session = session.read().clone();
        let state = feed_state.clone();
        let notify = notify.clone();
        let cancel = slot.restart();
        snapshot.set(FarmSnapshot::new(farm));
        drive(snapshot, cancel, FarmSnapshot::apply, move |updates| async move {
            let chain = state.chain.as_deref();
            let result =
                farm_feed::run(chain, &state.contracts, farm, &session, &updates, &notify).await;
            if let Err(err) = result {
                report_fatal(fatal, err);
            }
        });
    });
    FarmHandle {
        snapshot,
        refresh,
        state,
        session,
    }
}

pub fn use_harvest_history(farm: Farm) -> Signal<HarvestHistory> {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let fatal = use_context::<FatalError>();
    let mut snapshot = use_signal(HarvestHistory::default);
    let slot = use_feed_slot();

    // Re-runs when the route switches farms without remounting the page.
    use_effect(use_reactive!(|farm| {
        let session = session.read().clone();
        let state = state.clone();
        let cancel = slot.restart();
        snapshot.set(HarvestHistory::default());
        drive(snapshot, cancel, HarvestHistory::apply, move |updates| async move {
            let chain = state.chain.as_deref();
            if let Err(err) = harvest::run(chain, &state.contracts, farm, &session, &updates).await {
                report_fatal(fatal, err);
            }
        });
    }));
    snapshot
}

/// Claim details for one chunk at a time. `on_loaded` fires once the claims
/// for a request have arrived.
#[derive(Clone)]
pub struct HarvestClaims {
    pub claims: Signal<HarvestChunkClaims>,
    request: Rc<dyn Fn(usize)>,
}

impl HarvestClaims {
    pub fn request(&self, index: usize) {
        (self.request)(index)
    }
}

pub fn use_harvest_claims(farm: Farm, on_loaded: EventHandler<()>) -> HarvestClaims {
    let state = use_context::<AppState>();
    let session = use_context::<Signal<WalletSession>>();
    let fatal = use_context::<FatalError>();
    let claims = use_signal(HarvestChunkClaims::default);
    let slot = use_feed_slot();

    let request = Rc::new(move |index: usize| {
        let Some(chain) = state.chain.clone() else {
            return;
        };
        let Some(account) = session.peek().account else {
            return;
        };
        let contracts = state.contracts.clone();
        let cancel = slot.restart();
        drive(claims, cancel, HarvestChunkClaims::apply, move |updates: Updates<ClaimsUpdate>| async move {
            match harvest::request_claims(chain.as_ref(), &contracts, farm, account, index, &updates).await {
                Ok(true) => on_loaded.call(()),
                Ok(false) => {}
                Err(err) => report_fatal(fatal, err),
            }
        });
    });
    HarvestClaims { claims, request }
}

/// A busy flag and an error message for one action button.
#[derive(Clone, Copy, PartialEq)]
pub struct Action {
    pub busy: Signal<bool>,
    pub error: Signal<Option<String>>,
}

impl Action {
    /// Run `work` unless a previous run is still in flight.
    pub fn run<F>(self, work: F)
    where
        F: Future<Output = Result<(), String>> + 'static,
    {
        let mut busy = self.busy;
        let mut error = self.error;
        if *busy.peek() {
            return;
        }
        busy.set(true);
        error.set(None);
        spawn(async move {
            let result = work.await;
            busy.set(false);
            if let Err(msg) = result {
                error.set(Some(msg));
            }
        });
    }

    /// Report a failure that happened before anything was submitted.
    pub fn fail(self, message: impl Into<String>) {
        let mut error = self.error;
        error.set(Some(message.into()));
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.read()
    }
}

pub fn use_action() -> Action {
    Action {
        busy: use_signal(|| false),
        error: use_signal(|| None),
    }
}
