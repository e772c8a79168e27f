//! Upgrade gating
//!
//! When a non-admin user runs out of free chats, the front end blocks
//! further interaction behind an inert overlay and shows an upgrade
//! notice. [`GateCoordinator`] owns the single modal-visibility flag and
//! answers the questions a renderer needs: is the overlay up, what does a
//! click on it do, and which limit banner (if any) to show.

use crate::quota::{is_limit_reached, QuotaInfo};
use std::sync::atomic::{AtomicBool, Ordering};

/// Data for the "free trial limit reached" banner
#[derive(Debug, Clone, PartialEq)]
pub struct LimitBanner {
    /// Chats used so far
    pub used: i64,
    /// Plan maximum (0 when unknown)
    pub max: i64,
    /// Chats left (never negative)
    pub remaining: i64,
    /// Share of the plan used, 0-100
    pub progress_percent: f64,
    /// Plan name
    pub subscription_type: String,
}

/// Holder of the upgrade modal flag
#[derive(Debug, Default)]
pub struct GateCoordinator {
    modal_visible: AtomicBool,
}

impl GateCoordinator {
    /// Create a coordinator with the modal hidden
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the upgrade modal is showing
    pub fn is_modal_visible(&self) -> bool {
        self.modal_visible.load(Ordering::SeqCst)
    }

    /// Show or hide the upgrade modal
    ///
    /// Hiding the modal does not touch the quota state; if the limit is
    /// still reached the overlay stays up.
    pub fn set_modal_visible(&self, visible: bool) {
        let previous = self.modal_visible.swap(visible, Ordering::SeqCst);
        if previous != visible {
            tracing::debug!(visible, "Upgrade modal visibility changed");
        }
    }

    /// Show the upgrade modal
    pub fn open_upgrade_modal(&self) {
        self.set_modal_visible(true);
    }

    /// Hide the upgrade modal
    pub fn close_modal(&self) {
        self.set_modal_visible(false);
    }

    /// React to a change of quota information
    ///
    /// Opens the modal when the limit is reached. Never closes it.
    pub fn on_quota_changed(&self, info: Option<&QuotaInfo>) {
        if is_limit_reached(info) {
            tracing::info!("Chat limit reached, opening upgrade modal");
            self.open_upgrade_modal();
        }
    }

    /// Whether the blocking overlay should be rendered
    pub fn overlay_active(&self, info: Option<&QuotaInfo>) -> bool {
        let is_admin = info.map(|i| i.is_admin).unwrap_or(false);
        !is_admin && is_limit_reached(info)
    }

    /// Handle a click on the overlay
    ///
    /// The overlay cannot be dismissed; clicking it opens the modal.
    /// Returns whether the overlay was active.
    pub fn click_overlay(&self, info: Option<&QuotaInfo>) -> bool {
        if self.overlay_active(info) {
            self.open_upgrade_modal();
            true
        } else {
            false
        }
    }

    /// Banner to show above the chat, if any
    ///
    /// Nothing is shown for admins, when no quota information is known,
    /// or while the user still has chats left.
    pub fn banner(&self, info: Option<&QuotaInfo>) -> Option<LimitBanner> {
        let info = info?;
        if info.is_admin || !is_limit_reached(Some(info)) {
            return None;
        }

        let max = info.max_chats.filter(|m| *m > 0).unwrap_or(0);
        let remaining = info.remaining_chats.filter(|r| *r >= 0).unwrap_or(0);
        let used = if max > 0 { (max - remaining).max(0) } else { 0 };
        let progress_percent = if max > 0 {
            used as f64 / max as f64 * 100.0
        } else {
            0.0
        };

        Some(LimitBanner {
            used,
            max,
            remaining,
            progress_percent,
            subscription_type: info.subscription_type.clone(),
        })
    }

    /// Forget modal state (used on logout)
    pub fn reset(&self) {
        self.close_modal();
    }
}
