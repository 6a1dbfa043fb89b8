use std::sync::Arc;
use tokio::sync::mpsc;

use super::reveal::{reveal, RevealSchedule};
use super::turn::{TurnEvent, TurnRequest};
use crate::llm::CompletionClient;

/// Carry out one turn: await the completion, reveal it, then report
/// `Finished`. A cancelled turn reports nothing further.
pub async fn run_turn(
    client: Arc<dyn CompletionClient>,
    request: TurnRequest,
    schedule: RevealSchedule,
    events: mpsc::UnboundedSender<TurnEvent>,
) {
    let turn = request.turn;
    let cancel = request.cancel.clone();

    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Turn {turn} cancelled while awaiting completion");
            return;
        }
        result = client.complete(&request.request) => result,
    };

    match outcome {
        Ok(text) => {
            let revealed = reveal(&text, schedule, &cancel, |prefix| {
                events
                    .send(TurnEvent::Content {
                        turn,
                        text: prefix.to_string(),
                    })
                    .is_ok()
            })
            .await;
            if revealed.is_err() {
                tracing::debug!("Turn {turn} cancelled during reveal");
                return;
            }
        }
        Err(e) => {
            let _ = events.send(TurnEvent::Failed {
                turn,
                error: e.to_string(),
            });
        }
    }

    let _ = events.send(TurnEvent::Finished { turn });
}

/// Spawn [`run_turn`] on the current runtime.
pub fn spawn_turn(
    client: Arc<dyn CompletionClient>,
    request: TurnRequest,
    schedule: RevealSchedule,
    events: mpsc::UnboundedSender<TurnEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run_turn(client, request, schedule, events))
}
