//! Local weather notifications: a permission state machine in front of a
//! delivery sink.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::alerts::AlertEvent;
use crate::error::StoreError;
use crate::store::KeyValueStore;

const PERMISSION_KEY: &str = "meteo-notifications";
const APP_TITLE: &str = "meteo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
    Unsupported,
}

impl Permission {
    /// The decision remembered from an earlier session, if any.
    pub fn load(store: &impl KeyValueStore) -> Option<Permission> {
        match store.get(PERMISSION_KEY) {
            Ok(Some(raw)) => match raw.as_str() {
                "granted" => Some(Permission::Granted),
                "denied" => Some(Permission::Denied),
                _ => None,
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "cannot read notification permission");
                None
            }
        }
    }

    pub fn save(self, store: &mut impl KeyValueStore) -> Result<(), StoreError> {
        match self {
            Permission::Granted => store.set(PERMISSION_KEY, "granted"),
            Permission::Denied => store.set(PERMISSION_KEY, "denied"),
            Permission::Default | Permission::Unsupported => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
}

pub trait NotificationSink {
    fn is_ready(&self) -> bool;

    /// Fire-and-forget. A notification whose tag matches a live one
    /// replaces it.
    fn deliver(&mut self, notification: Notification);
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    expires_at: Instant,
}

/// Short-lived in-app notifications, newest last.
#[derive(Debug)]
pub struct ToastTray {
    ttl: Duration,
    toasts: Vec<Toast>,
}

impl ToastTray {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            toasts: Vec::new(),
        }
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn deliver_at(&mut self, notification: Notification, now: Instant) {
        self.toasts
            .retain(|t| t.notification.tag != notification.tag);
        self.toasts.push(Toast {
            notification,
            expires_at: now + self.ttl,
        });
    }

    /// Drops expired toasts; returns whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at > now);
        before != self.toasts.len()
    }
}

impl NotificationSink for ToastTray {
    fn is_ready(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn deliver(&mut self, notification: Notification) {
        self.deliver_at(notification, Instant::now());
    }
}

#[derive(Debug)]
pub struct Dispatcher<N> {
    permission: Permission,
    sink: N,
}

impl<N: NotificationSink> Dispatcher<N> {
    pub fn new(supported: bool, saved: Option<Permission>, sink: N) -> Self {
        let permission = if supported {
            saved.unwrap_or_default()
        } else {
            Permission::Unsupported
        };
        Self { permission, sink }
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Whether asking the user would change anything.
    pub fn needs_prompt(&self) -> bool {
        self.permission == Permission::Default
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    /// Applies the user's answer to the permission prompt. Only an
    /// undecided permission can change; a grant is confirmed with one
    /// notification.
    pub fn request_permission(&mut self, granted: bool) -> Permission {
        if self.permission != Permission::Default {
            return self.permission;
        }

        self.permission = if granted {
            Permission::Granted
        } else {
            Permission::Denied
        };
        info!(permission = ?self.permission, "notification permission decided");

        if self.permission == Permission::Granted && self.sink.is_ready() {
            self.sink.deliver(Notification {
                title: APP_TITLE.to_string(),
                body: "Notifications enabled 🎉".to_string(),
                tag: "info".to_string(),
            });
        }
        self.permission
    }

    /// Returns whether the alert was handed to the sink.
    pub fn dispatch(&mut self, event: &AlertEvent) -> bool {
        if self.permission != Permission::Granted || !self.sink.is_ready() {
            debug!(tag = event.kind.tag(), "notification suppressed");
            return false;
        }
        self.sink.deliver(Notification {
            title: format!("Alert: {}", event.city),
            body: event.message.clone(),
            tag: event.kind.tag().to_string(),
        });
        true
    }
}
