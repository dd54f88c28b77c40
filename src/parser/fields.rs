use std::sync::LazyLock;

use regex::Regex;

use crate::export::Record;
use crate::feed::Post;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Workflow,
    Author,
    Service,
    Urgency,
    ProblemType,
    Question,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Workflow => "workflow",
            Field::Author => "author",
            Field::Service => "service",
            Field::Urgency => "urgency",
            Field::ProblemType => "problem_type",
            Field::Question => "question_text",
        }
    }
}

/// What a rule yields when none of its patterns match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Empty,
    RawText,
}

/// One extraction rule: patterns are tried in order and the first capture
/// group of the first match wins.
pub struct FieldRule {
    pub field: Field,
    patterns: Vec<Regex>,
    fallback: Fallback,
}

impl FieldRule {
    fn new(field: Field, patterns: &[&str], fallback: Fallback) -> Self {
        Self {
            field,
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
            fallback,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        self.patterns
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| match self.fallback {
                Fallback::Empty => String::new(),
                Fallback::RawText => text.to_string(),
            })
    }
}

// Labels are the Russian field names the workflow bot writes.
static RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        // Leading **bold** span names the workflow
        FieldRule::new(Field::Workflow, &[r"^\*\*(.*?)\*\*"], Fallback::Empty),
        FieldRule::new(Field::Author, &[r"от пользователя (.*)"], Fallback::Empty),
        FieldRule::new(
            Field::Service,
            &[
                r"(?s)\*\*Сервис\*\*:\s*\n*(.*?)\s*\n\*\*",
                r"(?s)\*\*По какому сервису вопрос.*?\*\*:\s*\n*(.*?)\n",
            ],
            Fallback::Empty,
        ),
        FieldRule::new(Field::Urgency, &[r"(?s)\*\*Срочность\*\*:\s*\n*(.*?)\n"], Fallback::Empty),
        FieldRule::new(
            Field::ProblemType,
            &[r"(?s)\*\*Тип проблемы\*\*:\s*\n*(.*?)\n"],
            Fallback::Empty,
        ),
        // "Вопрос", "Вопрос клиента", ... up to the next bold label
        FieldRule::new(
            Field::Question,
            &[r"(?s)\*\*Вопрос.*?\*\*:\s*\n*(.*?)\n\*\*"],
            Fallback::RawText,
        ),
    ]
});

pub fn rules() -> &'static [FieldRule] {
    &RULES
}

fn field(text: &str, field: Field) -> String {
    RULES
        .iter()
        .find(|r| r.field == field)
        .map(|r| r.apply(text))
        .unwrap_or_default()
}

/// Build a record from one post. Missing fields come back empty; a missing
/// question falls back to the whole message. Posts from the paginator always
/// carry a valid `create_at`.
pub fn extract(post: &Post) -> Record {
    let text = post.message.as_str();
    Record {
        id: post.id.clone(),
        date_created: post
            .created_at()
            .map(|t| t.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        author: field(text, Field::Author),
        workflow: field(text, Field::Workflow),
        service: field(text, Field::Service),
        urgency: field(text, Field::Urgency),
        problem_type: field(text, Field::ProblemType),
        question_text: field(text, Field::Question),
        raw_message: post.message.clone(),
    }
}
