// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scroll-reveal latching.
//!
//! A [`RevealTrigger`] watches visibility fractions reported for a region
//! and latches `is_visible` the first time a fraction reaches its threshold.
//! The transition happens at most once: the trigger unsubscribes the moment
//! it fires, and later visibility loss is ignored. Sources are abstract —
//! [`VisibilityFeed`] is the in-process one used by tests and headless
//! hosts; a real host would adapt its viewport intersection machinery to
//! [`IntersectionSource`].

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// Identifies an observed region with a visibility source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionId(pub Uuid);

impl RegionId {
    /// Create a new random region ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RegionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one observation registered with a visibility source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Viewport edge offsets applied when judging intersection, in pixels.
///
/// Positive values grow the viewport, negative values shrink it (the hero
/// sections pull the bottom edge up so content reveals slightly before it
/// would naturally scroll in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RootMargin {
    /// Top edge offset.
    pub top: f32,
    /// Right edge offset.
    pub right: f32,
    /// Bottom edge offset.
    pub bottom: f32,
    /// Left edge offset.
    pub left: f32,
}

/// Options a reveal trigger registers with its visibility source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RevealOptions {
    /// Visibility fraction (`0..=1`) at which the latch fires.
    pub threshold: f32,
    /// Viewport margin adjustment.
    pub root_margin: RootMargin,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin {
                top: 0.0,
                right: 0.0,
                bottom: -50.0,
                left: 0.0,
            },
        }
    }
}

/// Receives visibility fractions for an observed region.
pub type VisibilityCallback = Box<dyn FnMut(f32) + Send + 'static>;

/// Host collaborator reporting geometric visibility of regions.
pub trait IntersectionSource: Send + Sync {
    /// Register interest in `region`; `callback` receives visibility
    /// fractions as the host reports them.
    fn observe(
        &self,
        region: RegionId,
        options: RevealOptions,
        callback: VisibilityCallback,
    ) -> SubscriptionId;

    /// Stop delivering to a subscription. Idempotent.
    fn unobserve(&self, subscription: SubscriptionId);
}

struct FeedEntry {
    /// Region this subscription watches.
    region: RegionId,
    /// Options recorded at registration.
    options: RevealOptions,
    /// Callback, individually locked so delivery runs outside the registry lock.
    callback: Arc<Mutex<VisibilityCallback>>,
}

/// In-process [`IntersectionSource`] for tests and headless hosts.
///
/// [`publish`](Self::publish) delivers a sample synchronously to every live
/// subscription for the region, in registration order. Samples are not
/// filtered by the subscription's options; observers apply their own
/// thresholds, as [`RevealTrigger`] does. A callback may unobserve any
/// subscription (itself included) during delivery.
#[derive(Default)]
pub struct VisibilityFeed {
    subscriptions: Mutex<IndexMap<SubscriptionId, FeedEntry>>,
}

impl VisibilityFeed {
    /// Feed with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a visibility fraction for `region` to its subscribers.
    pub fn publish(&self, region: RegionId, fraction: f32) {
        // Snapshot the targets so callbacks can mutate the registry.
        let targets: Vec<(SubscriptionId, Arc<Mutex<VisibilityCallback>>)> = {
            let subscriptions = self.subscriptions.lock();
            subscriptions
                .iter()
                .filter(|(_, entry)| entry.region == region)
                .map(|(id, entry)| (*id, Arc::clone(&entry.callback)))
                .collect()
        };
        for (id, callback) in targets {
            // Skip entries unobserved earlier in this same delivery.
            if !self.subscriptions.lock().contains_key(&id) {
                continue;
            }
            (*callback.lock())(fraction);
        }
    }

    /// Number of live subscriptions across all regions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Options recorded for a live subscription.
    pub fn options(&self, subscription: SubscriptionId) -> Option<RevealOptions> {
        self.subscriptions
            .lock()
            .get(&subscription)
            .map(|entry| entry.options)
    }
}

impl IntersectionSource for VisibilityFeed {
    fn observe(
        &self,
        region: RegionId,
        options: RevealOptions,
        callback: VisibilityCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        let mut subscriptions = self.subscriptions.lock();
        subscriptions.insert(
            id,
            FeedEntry {
                region,
                options,
                callback: Arc::new(Mutex::new(callback)),
            },
        );
        id
    }

    fn unobserve(&self, subscription: SubscriptionId) {
        let mut subscriptions = self.subscriptions.lock();
        // shift_remove keeps the registration order of the survivors.
        subscriptions.shift_remove(&subscription);
    }
}

struct TriggerState {
    /// The one-way latch.
    visible: bool,
    /// Set by `dispose`; blocks any later latching.
    disposed: bool,
    /// Live registration with the source, until latch or dispose.
    subscription: Option<SubscriptionId>,
}

struct TriggerShared {
    state: Mutex<TriggerState>,
}

/// Edge-triggered visibility latch.
///
/// `is_visible` starts `false` and flips to `true` at most once, on the
/// first reported fraction at or above the threshold; the trigger
/// unsubscribes from its source the moment that happens. Dropping the
/// trigger (or calling [`dispose`](Self::dispose)) unsubscribes early and
/// freezes the latch at its current value.
pub struct RevealTrigger {
    shared: Arc<TriggerShared>,
    source: Arc<dyn IntersectionSource>,
}

impl RevealTrigger {
    /// Observe `region` on `source` with [`RevealOptions::default`].
    pub fn observe(source: &Arc<dyn IntersectionSource>, region: RegionId) -> Self {
        Self::observe_with(source, region, RevealOptions::default())
    }

    /// Observe `region` on `source` with explicit options.
    pub fn observe_with(
        source: &Arc<dyn IntersectionSource>,
        region: RegionId,
        options: RevealOptions,
    ) -> Self {
        let shared = Arc::new(TriggerShared {
            state: Mutex::new(TriggerState {
                visible: false,
                disposed: false,
                subscription: None,
            }),
        });

        let threshold = options.threshold;
        let weak_shared = Arc::downgrade(&shared);
        let weak_source: Weak<dyn IntersectionSource> = Arc::downgrade(source);
        let callback: VisibilityCallback = Box::new(move |fraction| {
            if fraction < threshold {
                return;
            }
            let Some(shared) = weak_shared.upgrade() else {
                return;
            };
            let subscription = {
                let mut state = shared.state.lock();
                if state.visible || state.disposed {
                    return;
                }
                state.visible = true;
                state.subscription.take()
            };
            tracing::debug!("Reveal latched at fraction {fraction:.2} (threshold {threshold})");
            if let Some(subscription) = subscription {
                if let Some(source) = weak_source.upgrade() {
                    source.unobserve(subscription);
                }
            }
        });

        // Register, then record the subscription. If the source delivered a
        // latching sample in between, the registration is already spent:
        // drop it instead of recording it.
        let subscription = source.observe(region, options, callback);
        let leftover = {
            let mut state = shared.state.lock();
            if state.visible {
                Some(subscription)
            } else {
                state.subscription = Some(subscription);
                None
            }
        };
        if let Some(leftover) = leftover {
            source.unobserve(leftover);
        }

        Self {
            shared,
            source: Arc::clone(source),
        }
    }

    /// Whether the latch has fired.
    pub fn is_visible(&self) -> bool {
        self.shared.state.lock().visible
    }

    /// Whether the trigger still holds a live subscription.
    pub fn is_observing(&self) -> bool {
        self.shared.state.lock().subscription.is_some()
    }

    /// Unsubscribe and freeze the latch at its current value. Idempotent.
    pub fn dispose(&self) {
        let subscription = {
            let mut state = self.shared.state.lock();
            state.disposed = true;
            state.subscription.take()
        };
        if let Some(subscription) = subscription {
            self.source.unobserve(subscription);
        }
    }
}

impl Drop for RevealTrigger {
    fn drop(&mut self) {
        self.dispose();
    }
}
