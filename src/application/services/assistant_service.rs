//! Help Assistant
//!
//! Rule-based assistant behind the help widget. Small talk is answered from
//! canned replies; everything else is matched against a curated knowledge
//! base by token overlap.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::application::dto::request::{AssistantChatRequest, ChatRole, ChatTurn};
use crate::application::dto::response::{AssistantReply, AssistantSource, ReplySource};

/// Turns of history taken into account
pub const MAX_HISTORY_TURNS: usize = 6;

const MAX_CONTEXTS: usize = 3;
/// Queries shorter than this borrow tokens from the previous user turn
const FOLLOW_UP_TOKEN_THRESHOLD: usize = 3;
const TAG_BONUS: f64 = 2.0;
const HISTORY_WEIGHT: f64 = 0.75;
const PAGE_TITLE_WEIGHT: f64 = 0.5;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from",
    "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "me", "my", "of", "on",
    "or", "that", "the", "their", "this", "to", "what", "when", "where", "why", "with", "you",
    "your",
];

const GREETINGS: &[&str] = &[
    "hi", "hey", "hello", "hola", "namaste", "helo", "heloo", "hii", "hiii", "hiya", "hlw",
    "wassup", "sup", "good morning", "good afternoon", "good evening", "hey there", "hello there",
];

const GREETING_REPLY: &str = "Hi! I can help with live classes, attendance and support tickets. What would you like to know?";

struct SmallTalkRule {
    phrases: &'static [&'static str],
    reply: &'static str,
}

const SMALL_TALK: &[SmallTalkRule] = &[
    SmallTalkRule {
        phrases: &["how are you", "how are u", "how r u", "how ru", "how is it going", "how s it going", "howdy"],
        reply: "Thanks for asking! I'm here and ready to help with your classes. How can I help you today?",
    },
    SmallTalkRule {
        phrases: &["thank you", "thanks", "thx", "much appreciated", "appreciate it"],
        reply: "You're very welcome! If there's anything else you need, just let me know.",
    },
    SmallTalkRule {
        phrases: &["bye", "goodbye", "see you", "see ya", "catch you later", "cya", "talk soon"],
        reply: "Thanks for stopping by! I'll be right here whenever you need help again.",
    },
];

const FALLBACK_REPLY: &str = "I'm here to help with live classes, attendance and support tickets, but I need a bit more detail to share something useful. You can also open a support ticket and our team will get back to you.";

/// One curated knowledge entry
#[derive(Debug, Clone)]
pub struct KnowledgeEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub tags: &'static [&'static str],
    pub content: &'static str,
}

const KNOWLEDGE: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        id: "live-join",
        title: "Joining a live class",
        tags: &["join", "live", "class", "meeting", "link"],
        content: "When your instructor goes live, the course page shows a Join live class button. Clicking it records your attendance and opens the meeting in a new tab.",
    },
    KnowledgeEntry {
        id: "live-schedule",
        title: "When live classes run",
        tags: &["schedule", "live", "time", "upcoming", "running"],
        content: "Live classes are scheduled by your instructor. If no class is running, the course page says so and updates automatically the moment a session starts.",
    },
    KnowledgeEntry {
        id: "attendance",
        title: "How attendance is tracked",
        tags: &["attendance", "watch", "time", "percentage", "minutes"],
        content: "While you are in a live class the page reports your presence every 30 seconds. Your watch time and attendance percentage are calculated from those check-ins against the planned class duration.",
    },
    KnowledgeEntry {
        id: "attendance-leave",
        title: "Leaving a class",
        tags: &["leave", "attendance", "close", "tab"],
        content: "Use the Leave button when you are done. Closing the page also ends your attendance for the session; time already recorded is kept and you can rejoin while the class is live.",
    },
    KnowledgeEntry {
        id: "enrollment",
        title: "Enrollment required",
        tags: &["enroll", "enrollment", "enrolled", "access", "course"],
        content: "Only learners enrolled in a course can join its live classes. If the page says you are not enrolled, enroll in the course first or contact support.",
    },
    KnowledgeEntry {
        id: "sign-in",
        title: "Signing in",
        tags: &["sign", "login", "account", "password"],
        content: "You need to be signed in to join a live class. If you try to join while signed out you are sent to the sign-in page and brought back to the course afterwards.",
    },
    KnowledgeEntry {
        id: "teams",
        title: "Microsoft Teams classes",
        tags: &["teams", "microsoft", "browser", "app"],
        content: "Teams classes open in the browser version of Teams, so no app install is needed. Allow camera and microphone access if your browser asks.",
    },
    KnowledgeEntry {
        id: "zoom",
        title: "Zoom classes",
        tags: &["zoom", "meeting", "app", "password"],
        content: "Zoom classes open the meeting link your instructor provided. If Zoom asks for a passcode, it is included in the link or shared by your instructor.",
    },
    KnowledgeEntry {
        id: "tickets",
        title: "Support tickets",
        tags: &["ticket", "support", "help", "problem", "issue", "contact"],
        content: "Open the Tickets tab in this help widget to raise a support ticket. Describe the issue and our team replies in the same thread; you can follow up or close the ticket any time.",
    },
    KnowledgeEntry {
        id: "technical",
        title: "Technical problems",
        tags: &["error", "broken", "not", "working", "technical", "audio", "video"],
        content: "If the meeting does not open, check that pop-ups are allowed for this site and try the Join button again. For audio or video problems, rejoin the meeting or switch browsers.",
    },
];

struct IndexedEntry {
    entry: &'static KnowledgeEntry,
    counts: HashMap<String, usize>,
    tags: HashSet<String>,
}

static INDEX: Lazy<Vec<IndexedEntry>> = Lazy::new(|| {
    KNOWLEDGE
        .iter()
        .map(|entry| {
            let combined = format!("{} {} {}", entry.title, entry.content, entry.tags.join(" "));
            let mut counts = HashMap::new();
            for token in tokenize(&combined) {
                *counts.entry(token).or_insert(0) += 1;
            }
            let tags = entry.tags.iter().flat_map(|tag| tokenize(tag)).collect();
            IndexedEntry { entry, counts, tags }
        })
        .collect()
});

/// Lowercase, strip punctuation, drop stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .map(str::to_string)
        .collect()
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    format!(" {normalized} ").contains(&format!(" {phrase} "))
}

/// Canned reply for greetings and other small talk.
pub fn small_talk_reply(message: &str) -> Option<&'static str> {
    let normalized = normalize(message);
    if normalized.is_empty() {
        return None;
    }

    let is_greeting = GREETINGS.contains(&normalized.as_str())
        || normalized
            .split(' ')
            .all(|word| GREETINGS.contains(&word) || word == "there");
    if is_greeting {
        return Some(GREETING_REPLY);
    }

    SMALL_TALK
        .iter()
        .find(|rule| rule.phrases.iter().any(|p| contains_phrase(&normalized, p)))
        .map(|rule| rule.reply)
}

/// Keyword assistant over the built-in knowledge base
#[derive(Debug, Clone, Default)]
pub struct AssistantService;

impl AssistantService {
    pub fn new() -> Self {
        Self
    }

    /// Answer a chat message.
    pub fn reply(&self, request: &AssistantChatRequest) -> AssistantReply {
        let message = request.message.trim();

        if let Some(reply) = small_talk_reply(message) {
            return AssistantReply {
                reply: reply.to_string(),
                source: ReplySource::SmallTalk,
                contexts: Vec::new(),
            };
        }

        let weighted = weighted_query(request);
        let matches = top_matches(&weighted);

        if matches.is_empty() {
            tracing::debug!(message, "No knowledge matched");
            return AssistantReply {
                reply: FALLBACK_REPLY.to_string(),
                source: ReplySource::Fallback,
                contexts: Vec::new(),
            };
        }

        let summary = matches
            .iter()
            .map(|entry| format!("- {}", entry.content))
            .collect::<Vec<_>>()
            .join("\n");

        AssistantReply {
            reply: format!(
                "Here is what I found:\n{summary}\n\nIf this does not answer your question, open a support ticket from the Tickets tab."
            ),
            source: ReplySource::Knowledge,
            contexts: matches
                .iter()
                .map(|entry| AssistantSource {
                    id: entry.id.to_string(),
                    title: entry.title.to_string(),
                })
                .collect(),
        }
    }
}

fn sanitized_history(history: &[ChatTurn]) -> &[ChatTurn] {
    &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..]
}

fn weighted_query(request: &AssistantChatRequest) -> Vec<(String, f64)> {
    let mut weighted: Vec<(String, f64)> = tokenize(&request.message)
        .into_iter()
        .map(|token| (token, 1.0))
        .collect();

    if weighted.len() < FOLLOW_UP_TOKEN_THRESHOLD {
        let previous = sanitized_history(&request.history)
            .iter()
            .rev()
            .find(|turn| turn.role == ChatRole::User && turn.content.trim() != request.message.trim());
        if let Some(turn) = previous {
            weighted.extend(tokenize(&turn.content).into_iter().map(|t| (t, HISTORY_WEIGHT)));
        }
    }

    if let Some(page) = &request.page_context {
        weighted.extend(tokenize(&page.title).into_iter().map(|t| (t, PAGE_TITLE_WEIGHT)));
    }

    weighted
}

fn top_matches(weighted: &[(String, f64)]) -> Vec<&'static KnowledgeEntry> {
    let mut scored: Vec<(f64, usize)> = INDEX
        .iter()
        .enumerate()
        .map(|(position, doc)| {
            let score = weighted
                .iter()
                .map(|(token, weight)| {
                    let mut score = doc.counts.get(token).copied().unwrap_or(0) as f64 * weight;
                    if doc.tags.contains(token) {
                        score += TAG_BONUS * weight;
                    }
                    score
                })
                .sum::<f64>();
            (score, position)
        })
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    scored
        .into_iter()
        .take(MAX_CONTEXTS)
        .map(|(_, position)| INDEX[position].entry)
        .collect()
}
