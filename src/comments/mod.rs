//! Comment form state machine
//!
//! ```text
//! Editing --submit(valid)--> Submitting --ok--> Acknowledged
//!    ^   \--submit(invalid)--> Editing          |
//!    |                                          |
//!    +------------------------err---------------+ (back to Editing, input kept)
//! ```

mod sink;

pub use sink::{CommentSink, EndpointSink};

use serde::{Deserialize, Serialize};

use crate::content::NewComment;

pub const NAME_REQUIRED: &str = "The Name field is required";
pub const EMAIL_REQUIRED: &str = "The Email field is required";
pub const COMMENT_REQUIRED: &str = "The Comment field is required";
pub const SUBMIT_FAILED: &str = "Sorry, your comment could not be submitted. Please try again.";

/// Raw form input, including the hidden post identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInput {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

impl CommentInput {
    /// Empty input bound to the post with `post_id`
    pub fn for_post(post_id: &str) -> Self {
        Self {
            id: post_id.to_string(),
            ..Default::default()
        }
    }

    /// Check required fields, producing the outbound payload when all are present
    pub fn validate(&self) -> Result<NewComment, FieldErrors> {
        let errors = FieldErrors {
            name: is_blank(&self.name),
            email: is_blank(&self.email),
            comment: is_blank(&self.comment),
        };
        if errors.any() {
            return Err(errors);
        }
        Ok(NewComment {
            post_id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            comment: self.comment.clone(),
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Which required fields are missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: bool,
    pub email: bool,
    pub comment: bool,
}

impl FieldErrors {
    pub fn any(&self) -> bool {
        self.name || self.email || self.comment
    }

    /// Inline messages, one per missing field, in form order
    pub fn messages(&self) -> Vec<&'static str> {
        [
            (self.name, NAME_REQUIRED),
            (self.email, EMAIL_REQUIRED),
            (self.comment, COMMENT_REQUIRED),
        ]
        .into_iter()
        .filter_map(|(missing, message)| missing.then_some(message))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing {
        input: CommentInput,
        errors: FieldErrors,
        /// Set after a rejected submission
        failure: Option<String>,
    },
    Submitting {
        input: CommentInput,
    },
    Acknowledged,
}

/// Why a submission did not start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Required fields missing; the form shows the errors
    Invalid,
    /// A submission is already in flight
    InFlight,
    /// The comment was already acknowledged
    Closed,
}

/// The comment form of one post page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentForm {
    state: FormState,
}

impl CommentForm {
    /// A fresh form in the editing state
    pub fn new(post_id: &str) -> Self {
        Self {
            state: FormState::Editing {
                input: CommentInput::for_post(post_id),
                errors: FieldErrors::default(),
                failure: None,
            },
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_acknowledged(&self) -> bool {
        matches!(self.state, FormState::Acknowledged)
    }

    /// Validate `input` and enter `Submitting`, returning the payload to send
    pub fn begin(&mut self, input: CommentInput) -> Result<NewComment, Rejected> {
        match self.state {
            FormState::Submitting { .. } => return Err(Rejected::InFlight),
            FormState::Acknowledged => return Err(Rejected::Closed),
            FormState::Editing { .. } => {}
        }

        match input.validate() {
            Ok(payload) => {
                self.state = FormState::Submitting { input };
                Ok(payload)
            }
            Err(errors) => {
                self.state = FormState::Editing {
                    input,
                    errors,
                    failure: None,
                };
                Err(Rejected::Invalid)
            }
        }
    }

    /// Leave `Submitting` with the outcome of the outbound call
    pub fn complete<E: std::fmt::Display>(&mut self, outcome: Result<(), E>) {
        let FormState::Submitting { input } = &self.state else {
            tracing::warn!("Submission completed outside of the submitting state");
            return;
        };
        let input = input.clone();

        self.state = match outcome {
            Ok(()) => FormState::Acknowledged,
            Err(e) => {
                tracing::error!("Comment submission failed: {}", e);
                FormState::Editing {
                    input,
                    errors: FieldErrors::default(),
                    failure: Some(SUBMIT_FAILED.to_string()),
                }
            }
        };
    }

    /// Run a full submission through `sink`
    pub async fn submit(&mut self, input: CommentInput, sink: &dyn CommentSink) -> &FormState {
        match self.begin(input) {
            Ok(payload) => {
                let outcome = sink.submit(&payload).await;
                self.complete(outcome);
            }
            Err(reason) => tracing::debug!("Comment not submitted: {:?}", reason),
        }
        &self.state
    }
}
