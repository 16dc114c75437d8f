//! Edit session state machine.
//!
//! A [`Session`] owns the input image, the prompt, and the outcome of the
//! latest edit. Phases move `Idle -> Processing -> Success | Error`, and
//! [`Session::reset`] returns to `Idle` from anywhere.
//!
//! Starting an edit hands out an [`EditTicket`] tagged with the session
//! generation. The caller performs the exchange and feeds the outcome back
//! through [`Session::complete`]; outcomes carrying a generation that is no
//! longer current are dropped, so a reset during an in-flight exchange cannot
//! be overwritten by its late answer.

use crate::error::{ErrorKind, Result, SadaamError, EMPTY_RESULT_MESSAGE};
use crate::image::{EditRequest, EditResult, ImageEditor, InputImage};
use serde::Serialize;

/// Current phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Nothing submitted yet, or reset.
    #[default]
    Idle,
    /// An exchange is in flight.
    Processing,
    /// The last exchange returned an image and/or text.
    Success,
    /// The last exchange failed.
    Error,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One-click edits bound to a fixed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// Strip the background from the image.
    RemoveBackground,
}

impl QuickAction {
    /// The instruction sent for this action.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::RemoveBackground => "Remove the background",
        }
    }
}

/// A canned prompt offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// Short name, also used on the command line.
    pub name: &'static str,
    /// Display label.
    pub label: &'static str,
    /// The prompt text it fills in.
    pub prompt: &'static str,
}

/// Prompt presets, in display order.
pub const SUGGESTIONS: [Suggestion; 6] = [
    Suggestion {
        name: "watercolor",
        label: "Watercolor 🎨",
        prompt: "Convert this image into a watercolor painting style",
    },
    Suggestion {
        name: "sunglasses",
        label: "Sunglasses 🕶️",
        prompt: "Add a pair of cool sunglasses to the person",
    },
    Suggestion {
        name: "cyberpunk",
        label: "Cyberpunk 🌆",
        prompt: "Change the background to a futuristic cyberpunk city with neon lights",
    },
    Suggestion {
        name: "sketch",
        label: "Sketch ✏️",
        prompt: "Turn this image into a charcoal sketch",
    },
    Suggestion {
        name: "vintage",
        label: "Vintage 📸",
        prompt: "Apply a vintage 90s film grain filter",
    },
    Suggestion {
        name: "snowy",
        label: "Snowy ❄️",
        prompt: "Make it look like it is snowing",
    },
];

/// Looks up a suggestion by its short name.
pub fn find_suggestion(name: &str) -> Option<&'static Suggestion> {
    SUGGESTIONS
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
}

/// Permission to run one exchange, issued by [`Session::start_edit`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an edit ticket must be run and completed"]
pub struct EditTicket {
    generation: u64,
    request: EditRequest,
}

impl EditTicket {
    /// The session generation this ticket belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The request to send.
    pub fn request(&self) -> &EditRequest {
        &self.request
    }
}

/// State of a single editing session.
#[derive(Debug, Default)]
pub struct Session {
    phase: SessionPhase,
    input: Option<InputImage>,
    prompt: String,
    result: Option<EditResult>,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
    generation: u64,
}

impl Session {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True while an exchange is in flight.
    pub fn is_processing(&self) -> bool {
        self.phase == SessionPhase::Processing
    }

    /// The active input image.
    pub fn input_image(&self) -> Option<&InputImage> {
        self.input.as_ref()
    }

    /// The prompt text as currently shown.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Prompt length in characters.
    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }

    /// Result of the last successful edit.
    pub fn result(&self) -> Option<&EditResult> {
        self.result.as_ref()
    }

    /// Message of the last failed edit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Classification of the last failed edit.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Monotonic counter bumped by every start and reset.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether [`start_edit`](Self::start_edit) would currently be accepted.
    pub fn can_start(&self) -> bool {
        !self.is_processing() && self.input.is_some() && !self.prompt.trim().is_empty()
    }

    /// Replaces the input image.
    pub fn set_input_image(&mut self, image: InputImage) -> Result<()> {
        self.ensure_idle()?;
        self.input = Some(image);
        Ok(())
    }

    /// Removes the input image.
    pub fn clear_input_image(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.input = None;
        Ok(())
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        self.ensure_idle()?;
        self.prompt = prompt.into();
        Ok(())
    }

    /// Fills the prompt from a suggestion without starting an edit.
    pub fn apply_suggestion(&mut self, suggestion: &Suggestion) -> Result<()> {
        self.set_prompt(suggestion.prompt)
    }

    /// Starts an edit with the current prompt.
    ///
    /// Rejected with [`SadaamError::Busy`] while processing, and with
    /// [`SadaamError::InvalidRequest`] when there is no input image or the
    /// prompt is blank. A rejected start leaves the session untouched.
    pub fn start_edit(&mut self) -> Result<EditTicket> {
        let prompt = self.prompt.clone();
        self.start_with_prompt(prompt)
    }

    /// Starts an edit with a fixed instruction, which also becomes the shown prompt.
    pub fn quick_action(&mut self, action: QuickAction) -> Result<EditTicket> {
        self.start_with_prompt(action.prompt().to_string())
    }

    fn start_with_prompt(&mut self, prompt: String) -> Result<EditTicket> {
        self.ensure_idle()?;
        let Some(input) = self.input.as_ref() else {
            return Err(SadaamError::InvalidRequest("no input image selected".into()));
        };
        if prompt.trim().is_empty() {
            return Err(SadaamError::InvalidRequest("prompt is empty".into()));
        }

        let request = EditRequest::for_image(input, prompt.as_str());
        self.prompt = prompt;
        self.generation += 1;
        self.phase = SessionPhase::Processing;
        self.result = None;
        self.error = None;
        self.error_kind = None;

        tracing::debug!(generation = self.generation, "edit started");
        Ok(EditTicket {
            generation: self.generation,
            request,
        })
    }

    /// Applies the outcome of an exchange.
    ///
    /// Returns `false` when the outcome is stale (the session was reset or
    /// restarted since the ticket was issued) and was discarded.
    pub fn complete(&mut self, ticket: &EditTicket, outcome: Result<EditResult>) -> bool {
        if ticket.generation != self.generation || !self.is_processing() {
            tracing::warn!(
                ticket = ticket.generation,
                current = self.generation,
                phase = %self.phase,
                "discarding stale edit outcome"
            );
            return false;
        }

        match outcome {
            Ok(result) if result.is_empty() => {
                self.fail(ErrorKind::EmptyResult, EMPTY_RESULT_MESSAGE.to_string());
            }
            Ok(result) => {
                self.result = Some(result);
                self.phase = SessionPhase::Success;
                tracing::debug!(generation = self.generation, "edit succeeded");
            }
            Err(err) => {
                self.fail(err.kind(), err.to_string());
            }
        }
        true
    }

    /// Runs an issued ticket against an editor and applies the outcome.
    pub async fn run<E: ImageEditor + ?Sized>(
        &mut self,
        editor: &E,
        ticket: EditTicket,
    ) -> SessionPhase {
        let outcome = editor.edit(ticket.request()).await;
        self.complete(&ticket, outcome);
        self.phase
    }

    /// Starts an edit with the current prompt and runs it to completion.
    pub async fn edit<E: ImageEditor + ?Sized>(&mut self, editor: &E) -> Result<SessionPhase> {
        let ticket = self.start_edit()?;
        Ok(self.run(editor, ticket).await)
    }

    /// Runs a quick action to completion.
    pub async fn edit_quick<E: ImageEditor + ?Sized>(
        &mut self,
        editor: &E,
        action: QuickAction,
    ) -> Result<SessionPhase> {
        let ticket = self.quick_action(action)?;
        Ok(self.run(editor, ticket).await)
    }

    /// Clears everything and returns to `Idle`.
    ///
    /// Any exchange still in flight becomes stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.phase = SessionPhase::Idle;
        self.input = None;
        self.prompt.clear();
        self.result = None;
        self.error = None;
        self.error_kind = None;
    }

    fn fail(&mut self, kind: ErrorKind, message: String) {
        tracing::debug!(generation = self.generation, ?kind, %message, "edit failed");
        self.result = None;
        self.error = Some(message);
        self.error_kind = Some(kind);
        self.phase = SessionPhase::Error;
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_processing() {
            return Err(SadaamError::Busy);
        }
        Ok(())
    }
}
