//! Simulated WhatsApp delivery.
//!
//! The engine hands `Notification`s to a `DispatcherHandle` and moves on; the
//! dispatcher task renders the template and "delivers" it by logging and
//! appending to the tenant's outbox.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::limits::MAX_OUTBOX_LEN;
use crate::model::{MessageTemplates, StudioState, TemplateKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: Recipient,
    pub template: TemplateKey,
    pub templates: MessageTemplates,
    pub vars: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(recipient: Recipient, template: TemplateKey, templates: MessageTemplates) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("nome".to_string(), recipient.name.clone());
        Self {
            recipient,
            template,
            templates,
            vars,
        }
    }

    /// Notification for a student by name, or `None` when the tenant's settings
    /// disable `template`. Unknown students get a recipient without a phone.
    pub fn for_student(state: &StudioState, student: &str, template: TemplateKey) -> Option<Self> {
        let settings = &state.settings;
        if !settings.whatsapp.allows(template) {
            return None;
        }
        let phone = state.student_by_name(student).and_then(|s| s.phone.clone());
        let recipient = Recipient {
            name: student.to_string(),
            phone,
        };
        Some(
            Self::new(recipient, template, settings.templates.clone())
                .var("studio", &settings.studio_name),
        )
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn body(&self) -> String {
        render(self.templates.get(self.template), &self.vars)
    }
}

/// Replace every `{key}` in `template` with its value. Unknown tokens are left as-is.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Sending side held by the engine. Sends never block and never fail.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<Notification>,
}

impl DispatcherHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            debug!("dispatcher stopped, notification dropped");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub phone: String,
    pub template: TemplateKey,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Bounded history of delivered messages, newest last.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<VecDeque<SentMessage>>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: SentMessage) {
        let mut queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_OUTBOX_LEN {
            queue.pop_front();
        }
        queue.push_back(message);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        let queue = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        queue.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render and deliver one notification. Recipients without a phone are skipped.
pub fn deliver(notification: &Notification, outbox: &Outbox) -> Option<SentMessage> {
    let template = notification.template.as_str();
    let Some(phone) = notification
        .recipient
        .phone
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    else {
        debug!("skipping {template} for {}: no phone", notification.recipient.name);
        metrics::counter!(crate::observability::NOTIFICATIONS_SKIPPED_TOTAL, "template" => template)
            .increment(1);
        return None;
    };

    let message = SentMessage {
        to: notification.recipient.name.clone(),
        phone: phone.to_string(),
        template: notification.template,
        body: notification.body(),
        sent_at: Utc::now(),
    };
    info!("whatsapp (simulated) {template} to {} <{phone}>: {}", message.to, message.body);
    metrics::counter!(crate::observability::NOTIFICATIONS_SENT_TOTAL, "template" => template)
        .increment(1);
    outbox.push(message.clone());
    Some(message)
}

/// Background task that delivers notifications until every handle is dropped.
pub async fn run_dispatcher(mut rx: mpsc::UnboundedReceiver<Notification>, outbox: Outbox) {
    while let Some(notification) = rx.recv().await {
        deliver(&notification, &outbox);
    }
    debug!("dispatcher stopped");
}

/// Spawn a dispatcher task. Returns the sending handle and the outbox it fills.
pub fn spawn_dispatcher() -> (DispatcherHandle, Outbox) {
    let (handle, rx) = DispatcherHandle::channel();
    let outbox = Outbox::new();
    tokio::spawn(run_dispatcher(rx, outbox.clone()));
    (handle, outbox)
}
