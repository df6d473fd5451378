use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostRequest {
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PostResponse {
    Created { id: String },
    RateLimited,
    Rejected { status: u16, body: String },
}

// Object style note:
// These are the shapes that cross the two remote boundaries of a run: the
// language-model exchange and the platform post. They carry no behavior so
// that clients, test doubles and the pipeline can agree on them without
// depending on each other.
