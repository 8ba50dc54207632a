use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

pub const GREETING: &str = "Hello! I'm the RIT Links In assistant. How can I help you today?";

/// Topic
///
/// The canned reply a message is routed to. Earlier keyword groups win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Topic {
    AddSkill,
    Projects,
    Seminars,
    Fallback,
}

impl Topic {
    pub fn reply(self) -> &'static str {
        match self {
            Topic::AddSkill => {
                "To add a skill, go to 'Add Skills and Project' in the sidebar. You can upload your certification and provide details about your projects there."
            }
            Topic::Projects => {
                "You can view available projects in the 'My Projects' section. To apply, click on a project and select 'Apply'."
            }
            Topic::Seminars => {
                "Upcoming seminars are displayed on your dashboard. You can join them by clicking the 'Join Seminar' button."
            }
            Topic::Fallback => {
                "I'm here to help you navigate the RIT Links In platform. You can ask me about adding skills, finding projects, joining seminars, or any other features."
            }
        }
    }
}

const ROUTES: [(Topic, &[&str]); 3] = [
    (Topic::AddSkill, &["add skill", "upload certificate"]),
    (Topic::Projects, &["project", "apply"]),
    (Topic::Seminars, &["seminar", "workshop"]),
];

/// AssistantReply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AssistantReply {
    pub topic: Topic,
    pub text: String,
}

/// Case-insensitive keyword routing. Blank input gets no reply.
pub fn reply_to(input: &str) -> Option<AssistantReply> {
    if input.trim().is_empty() {
        return None;
    }
    let text = input.to_lowercase();
    let topic = ROUTES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(topic, _)| *topic)
        .unwrap_or(Topic::Fallback);

    Some(AssistantReply {
        topic,
        text: topic.reply().to_string(),
    })
}
