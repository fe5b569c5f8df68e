use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::message::{Message, MessageKind};
use super::segmenter::{classify, finalize, strip_markers};
use crate::config::Config;
use crate::engine::models::model_identifier;
use crate::engine::session::{SessionEvent, StreamSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AwaitingResponse,
    Streaming,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("a turn is already in progress")]
    Busy,
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("no model selected")]
    NoModel,
}

/// Transcript mutations, published for whatever front-end drives the
/// controller. Payloads carry the affected content so consumers can mirror
/// the transcript without re-reading it.
#[derive(Debug, Clone)]
pub enum TranscriptUpdate {
    MessageAppended {
        index: usize,
        message: Message,
    },
    PlaceholderChanged {
        index: usize,
        text: String,
        kind: MessageKind,
    },
    PlaceholderReplaced {
        index: usize,
        messages: Vec<Message>,
    },
}

#[derive(Default)]
struct StreamAccumulator {
    raw: String,
    header_inserted: bool,
}

struct ActiveTurn {
    placeholder_index: usize,
    accumulator: StreamAccumulator,
}

/// Owns the conversation transcript and at most one streaming turn at a
/// time. All mutation happens inside `send_message`, which holds `&mut self`
/// for the whole turn: chunk events are consumed one at a time from the
/// session channel, so transcript writes are serialized by construction.
pub struct ChatController {
    transcript: Vec<Message>,
    phase: TurnPhase,
    next_id: u64,
    turn: Option<ActiveTurn>,
}

impl ChatController {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            phase: TurnPhase::Idle,
            next_id: 1,
            turn: None,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Run one full turn: append the user message and a streaming
    /// placeholder, spawn the inference process, fold chunk events into the
    /// placeholder, and on completion replace it with the finalized
    /// segments. Returns the complete raw response text.
    ///
    /// Rejected with `TurnError::Busy` while another turn is active; nothing
    /// is queued. The `cancel` token is the caller's handle for stopping the
    /// turn early; cancellation still completes the turn exactly once.
    pub async fn send_message(
        &mut self,
        config: &Config,
        model_selector: &str,
        prompt: &str,
        cancel: CancellationToken,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) -> Result<String, TurnError> {
        self.begin_turn(model_selector, prompt, update_tx)?;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let session = StreamSession::start(
            config,
            model_selector,
            prompt.to_string(),
            events_tx,
            cancel,
        );

        let mut completion = None;
        while let Some(event) = events_rx.recv().await {
            match event {
                SessionEvent::Started => self.mark_streaming(),
                SessionEvent::Chunk(text) => self.apply_chunk(&text, update_tx),
                SessionEvent::Complete(text) => {
                    completion = Some(text);
                    break;
                }
            }
        }
        session.join().await;

        // The session guarantees a completion event; falling back to the
        // accumulated raw text keeps partial output if that ever breaks.
        let full_text = completion.unwrap_or_else(|| {
            self.turn
                .as_ref()
                .map(|turn| turn.accumulator.raw.clone())
                .unwrap_or_default()
        });

        self.complete_turn(&full_text, update_tx);
        Ok(full_text)
    }

    fn begin_turn(
        &mut self,
        model_selector: &str,
        prompt: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) -> Result<(), TurnError> {
        if self.phase != TurnPhase::Idle {
            return Err(TurnError::Busy);
        }
        if prompt.trim().is_empty() {
            return Err(TurnError::EmptyPrompt);
        }
        if model_identifier(model_selector).is_empty() {
            return Err(TurnError::NoModel);
        }

        let user = Message::user(self.allocate_id(), prompt.to_string());
        self.push_message(user, update_tx);

        let placeholder_index = self.transcript.len();
        let placeholder =
            Message::assistant(self.allocate_id(), MessageKind::Normal, String::new());
        self.push_message(placeholder, update_tx);

        self.turn = Some(ActiveTurn {
            placeholder_index,
            accumulator: StreamAccumulator::default(),
        });
        self.phase = TurnPhase::AwaitingResponse;
        Ok(())
    }

    fn mark_streaming(&mut self) {
        if self.phase == TurnPhase::AwaitingResponse {
            self.phase = TurnPhase::Streaming;
        }
    }

    fn apply_chunk(
        &mut self,
        chunk: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        self.mark_streaming();
        let Some(turn) = self.turn.as_mut() else {
            return;
        };

        turn.accumulator.raw.push_str(chunk);
        let classification = classify(&turn.accumulator.raw, turn.accumulator.header_inserted);
        // Reset the header flag when a span closes so the next span gets its
        // own header.
        turn.accumulator.header_inserted = if classification.in_reasoning_span {
            classification.header_inserted
        } else {
            false
        };

        let kind = if classification.in_reasoning_span {
            MessageKind::Reasoning
        } else {
            MessageKind::Normal
        };
        let index = turn.placeholder_index;
        if let Some(placeholder) = self.transcript.get_mut(index) {
            placeholder.text = classification.display_text.clone();
            placeholder.kind = kind;
        }

        emit_update(
            update_tx,
            TranscriptUpdate::PlaceholderChanged {
                index,
                text: classification.display_text,
                kind,
            },
        );
    }

    fn complete_turn(
        &mut self,
        full_text: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        let Some(turn) = self.turn.take() else {
            self.phase = TurnPhase::Idle;
            return;
        };
        let index = turn.placeholder_index;

        let segments = finalize(full_text);
        if segments.is_empty() {
            // Degenerate response (nothing but markers or whitespace): keep
            // the placeholder holding the marker-stripped raw text.
            let fallback = strip_markers(full_text);
            if let Some(placeholder) = self.transcript.get_mut(index) {
                placeholder.text = fallback.clone();
                placeholder.kind = MessageKind::Normal;
            }
            emit_update(
                update_tx,
                TranscriptUpdate::PlaceholderChanged {
                    index,
                    text: fallback,
                    kind: MessageKind::Normal,
                },
            );
        } else {
            let mut messages = Vec::with_capacity(segments.len());
            for segment in segments {
                messages.push(Message::assistant(
                    self.allocate_id(),
                    segment.kind,
                    segment.text,
                ));
            }
            self.transcript
                .splice(index..index + 1, messages.iter().cloned());
            emit_update(
                update_tx,
                TranscriptUpdate::PlaceholderReplaced { index, messages },
            );
        }

        self.phase = TurnPhase::Idle;
    }

    fn push_message(
        &mut self,
        message: Message,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        let index = self.transcript.len();
        self.transcript.push(message.clone());
        emit_update(update_tx, TranscriptUpdate::MessageAppended { index, message });
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for ChatController {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_update(
    update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    update: TranscriptUpdate,
) {
    if let Some(tx) = update_tx {
        let _ = tx.send(update);
    }
}
