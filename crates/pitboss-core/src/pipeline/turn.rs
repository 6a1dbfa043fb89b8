use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatStore, Message, Role};
use crate::constants::completion::{REGENERATE_FALLBACK, SEND_FALLBACK};
use crate::error::{PitbossError, Result};
use crate::llm::{CompletionRequest, ProfileHint};

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Send,
    Regenerate,
}

impl TurnKind {
    pub fn fallback(&self) -> &'static str {
        match self {
            TurnKind::Send => SEND_FALLBACK,
            TurnKind::Regenerate => REGENERATE_FALLBACK,
        }
    }
}

/// Everything the async runner needs to carry out one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub turn: TurnId,
    pub kind: TurnKind,
    pub conversation_id: String,
    pub placeholder_id: String,
    pub request: CompletionRequest,
    pub cancel: CancellationToken,
}

/// Progress reported back by the runner. Only the state owner applies these.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The placeholder now reads `text` (a full prefix, not a delta).
    Content { turn: TurnId, text: String },
    /// The completion call failed; the placeholder gets the fallback text.
    Failed { turn: TurnId, error: String },
    /// The turn settled, successfully or not.
    Finished { turn: TurnId },
}

impl TurnEvent {
    pub fn turn(&self) -> TurnId {
        match self {
            TurnEvent::Content { turn, .. }
            | TurnEvent::Failed { turn, .. }
            | TurnEvent::Finished { turn } => *turn,
        }
    }
}

#[derive(Debug)]
struct InFlight {
    turn: TurnId,
    kind: TurnKind,
    placeholder_id: String,
    cancel: CancellationToken,
}

/// Turn state machine: commits user messages and placeholders to the store,
/// hands out [`TurnRequest`]s, and folds [`TurnEvent`]s back in. At most one
/// turn is in flight per conversation.
pub struct Pipeline {
    next_turn: TurnId,
    in_flight: HashMap<String, InFlight>,
    profile: Option<ProfileHint>,
    cancel_stale: bool,
}

impl Pipeline {
    pub fn new(profile: Option<ProfileHint>, cancel_stale: bool) -> Self {
        Self {
            next_turn: 1,
            in_flight: HashMap::new(),
            profile,
            cancel_stale,
        }
    }

    pub fn is_busy(&self, conversation_id: &str) -> bool {
        self.in_flight.contains_key(conversation_id)
    }

    pub fn any_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether the active conversation shows a pending reply (turn in flight
    /// and the placeholder still empty), i.e. the typing indicator state.
    pub fn is_typing(&self, store: &ChatStore) -> bool {
        let Some(conv) = store.active() else {
            return false;
        };
        let Some(flight) = self.in_flight.get(&conv.id) else {
            return false;
        };
        conv.messages
            .iter()
            .any(|m| m.id == flight.placeholder_id && m.is_placeholder())
    }

    /// Start a turn for `text` in the active conversation, creating one when
    /// none is active. Returns `None` for blank input or a busy conversation.
    pub fn send(&mut self, store: &mut ChatStore, text: &str) -> Option<TurnRequest> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some(id) = store.active().map(|c| c.id.clone()) {
            if self.is_busy(&id) {
                tracing::debug!("Ignoring send while a turn is in flight for {id}");
                return None;
            }
        }

        let conversation_id = store.ensure_active();
        store.append_message(&conversation_id, Message::user(trimmed));

        Some(self.start_turn(store, conversation_id, TurnKind::Send))
    }

    /// Drop everything after the user message at `user_index` in the active
    /// conversation and request a fresh reply to it.
    pub fn regenerate_from(
        &mut self,
        store: &mut ChatStore,
        user_index: usize,
    ) -> Result<TurnRequest> {
        let conv = store.active().ok_or(PitbossError::NoActiveConversation)?;
        let conversation_id = conv.id.clone();

        if self.is_busy(&conversation_id) {
            return Err(PitbossError::TurnInFlight(conversation_id));
        }
        match conv.messages.get(user_index) {
            Some(m) if m.role == Role::User => {}
            _ => return Err(PitbossError::InvalidMessageIndex(user_index)),
        }

        store.truncate_messages(&conversation_id, user_index + 1);
        Ok(self.start_turn(store, conversation_id, TurnKind::Regenerate))
    }

    /// Text of the user message at `index` for the compose field. History is
    /// left untouched.
    pub fn edit_and_resend(store: &ChatStore, index: usize) -> Option<String> {
        store
            .active()?
            .messages
            .get(index)
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.clone())
    }

    fn start_turn(
        &mut self,
        store: &mut ChatStore,
        conversation_id: String,
        kind: TurnKind,
    ) -> TurnRequest {
        let history = store
            .get(&conversation_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        let request = CompletionRequest::from_history(&history, self.profile.as_ref());

        let placeholder = Message::assistant("");
        let placeholder_id = placeholder.id.clone();
        store.append_message(&conversation_id, placeholder);

        let turn = self.next_turn;
        self.next_turn += 1;
        let cancel = CancellationToken::new();

        self.in_flight.insert(
            conversation_id.clone(),
            InFlight {
                turn,
                kind,
                placeholder_id: placeholder_id.clone(),
                cancel: cancel.clone(),
            },
        );
        tracing::debug!("Turn {turn} ({kind:?}) started in {conversation_id}");

        TurnRequest {
            turn,
            kind,
            conversation_id,
            placeholder_id,
            request,
            cancel,
        }
    }

    /// Fold a runner event into the store. Returns `false` when the event
    /// belongs to no live turn and was dropped.
    pub fn apply(&mut self, store: &mut ChatStore, event: TurnEvent) -> bool {
        let turn = event.turn();
        let Some(conversation_id) = self
            .in_flight
            .iter()
            .find(|(_, f)| f.turn == turn)
            .map(|(id, _)| id.clone())
        else {
            tracing::debug!("Dropping event for stale turn {turn}");
            return false;
        };

        match event {
            TurnEvent::Content { text, .. } => {
                let placeholder_id = &self.in_flight[&conversation_id].placeholder_id;
                store.set_message_content(&conversation_id, placeholder_id, &text);
            }
            TurnEvent::Failed { error, .. } => {
                let flight = &self.in_flight[&conversation_id];
                tracing::warn!("Turn {turn} failed: {error}");
                store.set_message_content(
                    &conversation_id,
                    &flight.placeholder_id,
                    flight.kind.fallback(),
                );
            }
            TurnEvent::Finished { .. } => {
                self.in_flight.remove(&conversation_id);
                tracing::debug!("Turn {turn} finished");
                store.save();
            }
        }
        true
    }

    /// Abort the turn in flight for `conversation_id`. An empty placeholder is
    /// removed so no reply stays pending; partially revealed text is kept.
    pub fn cancel(&mut self, store: &mut ChatStore, conversation_id: &str) -> bool {
        let Some(flight) = self.in_flight.remove(conversation_id) else {
            return false;
        };
        flight.cancel.cancel();
        tracing::debug!("Turn {} cancelled", flight.turn);

        let empty = store
            .get(conversation_id)
            .and_then(|c| c.messages.iter().find(|m| m.id == flight.placeholder_id))
            .is_some_and(|m| m.is_placeholder());
        if empty {
            store.delete_message(conversation_id, &flight.placeholder_id);
        } else {
            store.save();
        }
        true
    }

    /// Cancel every turn in flight, e.g. on shutdown. Returns how many were
    /// cancelled.
    pub fn cancel_all(&mut self, store: &mut ChatStore) -> usize {
        let ids: Vec<String> = self.in_flight.keys().cloned().collect();
        ids.iter().filter(|id| self.cancel(store, id)).count()
    }

    /// Delete a conversation, cancelling its turn when stale turns are
    /// cancelled.
    pub fn delete_conversation(&mut self, store: &mut ChatStore, conversation_id: &str) -> bool {
        if self.cancel_stale {
            if let Some(flight) = self.in_flight.remove(conversation_id) {
                flight.cancel.cancel();
            }
        }
        store.delete_conversation(conversation_id)
    }

    /// Delete a message. Removing the placeholder of a live turn cancels that
    /// turn when stale turns are cancelled.
    pub fn delete_message(
        &mut self,
        store: &mut ChatStore,
        conversation_id: &str,
        message_id: &str,
    ) -> bool {
        if self.cancel_stale {
            let hits_placeholder = self
                .in_flight
                .get(conversation_id)
                .is_some_and(|f| f.placeholder_id == message_id);
            if hits_placeholder {
                if let Some(flight) = self.in_flight.remove(conversation_id) {
                    flight.cancel.cancel();
                }
            }
        }
        store.delete_message(conversation_id, message_id)
    }
}
