// ABOUTME: Routes inbound chat updates to the state machine and forwards replies
// ABOUTME: Thin routing only: command mapping, photo selection, per-event task spawning
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 Morsel Project

//! # Dispatcher
//!
//! Long-polls the chat gateway, maps each update to an [`InboundEvent`],
//! hands it to the session state machine on its own task, and forwards the
//! reply. Per-user ordering is enforced inside the machine by the session
//! lock, so events from distinct users run fully concurrently here.
//!
//! Routing rules:
//! - `/reset` or the bare phrase "first meal" → [`InboundEvent::Reset`]
//! - `/summary` → [`InboundEvent::Summary`]
//! - `/start` and unknown commands → usage greeting, handled in place
//! - a photo → [`InboundEvent::Photo`] with the largest variant's handle,
//!   followed by a text event when a caption came along
//! - anything else → [`InboundEvent::Text`]

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::chat::telegram::{Message, TelegramClient, Update};
use crate::chat::ChatGateway;
use crate::constants::chat::RESET_PHRASE;
use crate::models::{InboundEvent, PhotoRef, Reply, UserId};
use crate::session::{replies, SessionMachine};

/// Pause before re-polling after a transport failure
const POLL_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Routes chat updates to the state machine
pub struct Dispatcher {
    client: Arc<TelegramClient>,
    machine: Arc<SessionMachine>,
}

impl Dispatcher {
    /// Create a dispatcher over the chat client and the state machine
    #[must_use]
    pub fn new(client: Arc<TelegramClient>, machine: Arc<SessionMachine>) -> Self {
        Self { client, machine }
    }

    /// Poll updates forever, spawning one task per inbound event.
    ///
    /// Poll failures are logged and retried after a short pause; they keep
    /// the process alive rather than surfacing to the caller.
    pub async fn run(&self) {
        info!("Dispatcher started, polling for updates");
        let mut offset = 0i64;

        loop {
            let updates = match self.client.poll_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Update poll failed, retrying");
                    tokio::time::sleep(POLL_RETRY_PAUSE).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.dispatch_update(update);
            }
        }
    }

    /// Route one update, spawning tasks for its events
    fn dispatch_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let user = UserId(message.chat.id);

        if let Some(text) = message.text.as_deref() {
            let trimmed = text.trim();
            if trimmed == "/start" || (trimmed.starts_with('/') && !is_known_command(trimmed)) {
                self.deliver(Reply {
                    user,
                    text: replies::GREETING.to_owned(),
                });
                return;
            }
        }

        let events = events_from_message(user, message);
        if events.is_empty() {
            return;
        }

        // One task per update; its events (photo, then caption) stay ordered
        let machine = Arc::clone(&self.machine);
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            for event in events {
                let reply = machine.handle(event).await;
                if let Err(e) = client.send_reply(&reply).await {
                    error!(user = %reply.user, error = %e, "Failed to deliver reply");
                }
            }
        });
    }

    /// Send a dispatcher-originated reply on its own task
    fn deliver(&self, reply: Reply) {
        let client = Arc::clone(&self.client);
        tokio::spawn(async move {
            if let Err(e) = client.send_reply(&reply).await {
                error!(user = %reply.user, error = %e, "Failed to deliver reply");
            }
        });
    }
}

/// Whether a slash command is one the assistant understands
fn is_known_command(text: &str) -> bool {
    matches!(text, "/reset" | "/summary")
}

/// Map one message to its inbound events
fn events_from_message(user: UserId, message: Message) -> Vec<InboundEvent> {
    // Photos: take the largest variant; a caption doubles as the description
    if let Some(photos) = message.photo {
        let Some(best) = photos
            .into_iter()
            .max_by_key(|p| p.file_size.unwrap_or(0))
        else {
            return Vec::new();
        };

        let mut events = vec![InboundEvent::Photo {
            user,
            photo: PhotoRef(best.file_id),
        }];
        if let Some(caption) = message.caption.filter(|c| !c.trim().is_empty()) {
            events.push(InboundEvent::Text {
                user,
                text: caption,
            });
        }
        return events;
    }

    let Some(text) = message.text else {
        return Vec::new();
    };
    let trimmed = text.trim();

    let event = if trimmed == "/reset" || trimmed.eq_ignore_ascii_case(RESET_PHRASE) {
        InboundEvent::Reset { user }
    } else if trimmed == "/summary" {
        InboundEvent::Summary { user }
    } else {
        InboundEvent::Text { user, text }
    };
    vec![event]
}
