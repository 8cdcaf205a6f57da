//! Recognizing "solved" signals in comments.

use crate::effects::CommentData;
use crate::types::Username;

/// Keyword that marks a thread solved.
pub const SOLVED_KEYWORD: &str = "solved";

/// Account of the platform's automated moderator.
pub const AUTOMODERATOR: &str = "AutoModerator";

/// Phrase found in automated reminders that quote the keyword.
pub const PARTICIPATION_REMINDER: &str = "reminder to participate";

/// Why a comment does or doesn't count as a solved signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Solved,
    /// The keyword isn't in the body as a whole word.
    NoKeyword,
    /// The commenter is neither the thread author nor distinguished.
    NotAuthorized,
    /// The bot, AutoModerator, or a participation reminder.
    Excluded,
}

/// Returns true if `word` occurs in `text` as a whole word, ignoring ASCII case.
///
/// A boundary is the start or end of the text or a non-alphanumeric character,
/// so `"Solved!"` and `"(solved)"` match but `"unsolved"` and `"solvedness"` don't.
pub fn contains_word(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let mut search_pos = 0;
    while search_pos < text.len() {
        let Some(candidate_pos) = find_ignore_case(&text[search_pos..], word) else {
            return false;
        };
        let start = search_pos + candidate_pos;
        let end = start + word.len();

        let left_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let right_ok = text[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }

        search_pos = start + text[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack.char_indices().find_map(|(i, _)| {
        haystack
            .get(i..i + needle.len())
            .filter(|candidate| candidate.eq_ignore_ascii_case(needle))
            .map(|_| i)
    })
}

/// Who may mark a thread solved, and whose comments never count.
#[derive(Debug, Clone)]
pub struct SolvedSignalRules {
    /// The bot's own account.
    pub bot: Username,
}

impl SolvedSignalRules {
    pub fn new(bot: Username) -> Self {
        Self { bot }
    }

    /// Classifies a comment.
    ///
    /// `thread_author` is the author of the thread the comment belongs to;
    /// `None` if unknown or deleted.
    pub fn evaluate(&self, comment: &CommentData, thread_author: Option<&Username>) -> Verdict {
        if !contains_word(&comment.body, SOLVED_KEYWORD) {
            return Verdict::NoKeyword;
        }

        let Some(author) = comment.author.as_ref() else {
            return Verdict::NotAuthorized;
        };
        let is_op = thread_author.is_some_and(|op| op == author);
        if !is_op && !comment.distinguished {
            return Verdict::NotAuthorized;
        }

        if author == &self.bot
            || author.as_str() == AUTOMODERATOR
            || comment
                .body
                .to_lowercase()
                .contains(PARTICIPATION_REMINDER)
        {
            return Verdict::Excluded;
        }

        Verdict::Solved
    }
}
