//! Rule-based email triage.
//!
//! Rules are evaluated top to bottom and the first match wins:
//!
//! | # | Rule              | Category      | Action                      |
//! |---|-------------------|---------------|-----------------------------|
//! | 1 | newsletter words  | `NEWSLETTER`  | `MOVE_TO_FOLDER: Newsletters` |
//! | 2 | OTP/receipt words | `OTP_RECEIPT` | `MOVE_TO_FOLDER: Receipts`  |
//! | 3 | promotional words | `PROMOTIONAL` | `MOVE_TO_FOLDER: Promotions` |
//! | 4 | known + urgent    | `URGENT`      | `FLAG_PRIORITY: High`       |
//! | 5 | known contact     | `IMPORTANT`   | `FLAG_PRIORITY: High`       |
//! | 6 | urgent language   | `IMPORTANT`   | `FLAG_PRIORITY: High`       |
//! | 7 | fallback          | `OTHER`       | `MOVE_TO_FOLDER: Inbox`     |
//!
//! Keywords match case-insensitively on word boundaries, with an optional
//! plural `s`/`es`. `invoices` fires the `invoice` rule, but `sale` does not
//! fire on `wholesale` or `salesforce` and `otp` does not fire on `hotpot`.

use crate::domain::{Category, Contact, EmailInput, Priority, TriageAction, TriageResult};

const NEWSLETTER_TERMS: &[&str] = &["unsubscribe", "weekly update", "latest issue", "newsletter"];

const RECEIPT_TERMS: &[&str] = &[
    "otp",
    "one time password",
    "verification code",
    "receipt",
    "invoice",
    "order receipt",
    "payment receipt",
];

const PROMOTIONAL_TERMS: &[&str] = &[
    "sale",
    "offer",
    "discount",
    "buy now",
    "limited time",
    "promo",
    "promotional",
];

const URGENCY_TERMS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "important",
    "action required",
    "deadline",
    "respond immediately",
];

/// Lowercased view of the fields rules look at.
struct Haystack {
    text: String,
    sender: String,
}

impl Haystack {
    fn new(email: &EmailInput) -> Self {
        Self {
            text: format!("{}\n{}", email.subject, email.body).to_lowercase(),
            sender: email.sender.to_lowercase(),
        }
    }

    fn mentions_any(&self, terms: &[&str]) -> bool {
        terms.iter().any(|term| contains_phrase(&self.text, term))
    }
}

type Predicate = fn(&Haystack, bool) -> bool;

/// One row of the rule table.
struct Rule {
    predicate: Predicate,
    category: Category,
    action: fn() -> TriageAction,
    justification: &'static str,
}

fn move_to(folder: &'static str) -> TriageAction {
    TriageAction::MoveToFolder(folder.to_string())
}

fn flag_high() -> TriageAction {
    TriageAction::FlagPriority(Priority::High)
}

static RULES: &[Rule] = &[
    Rule {
        predicate: |h, _| h.mentions_any(NEWSLETTER_TERMS),
        category: Category::Newsletter,
        action: || move_to("Newsletters"),
        justification: "The email appears to be a newsletter or periodic update.",
    },
    Rule {
        predicate: |h, _| h.mentions_any(RECEIPT_TERMS),
        category: Category::OtpReceipt,
        action: || move_to("Receipts"),
        justification: "The email contains an OTP, verification code, receipt or invoice.",
    },
    Rule {
        predicate: |h, _| h.mentions_any(PROMOTIONAL_TERMS),
        category: Category::Promotional,
        action: || move_to("Promotions"),
        justification: "The email looks like a promotional or marketing message.",
    },
    Rule {
        predicate: |h, known| known && h.mentions_any(URGENCY_TERMS),
        category: Category::Urgent,
        action: flag_high,
        justification: "The email is from a known contact and uses urgent language.",
    },
    Rule {
        predicate: |_, known| known,
        category: Category::Important,
        action: flag_high,
        justification: "The email is from a known contact.",
    },
    Rule {
        predicate: |h, _| h.mentions_any(URGENCY_TERMS),
        category: Category::Important,
        action: flag_high,
        justification: "The email uses urgent language.",
    },
    Rule {
        predicate: |_, _| true,
        category: Category::Other,
        action: || move_to("Inbox"),
        justification: "No specific rule matched; leaving the email in the inbox.",
    },
];

/// Plural endings accepted after a keyword.
const PLURAL_SUFFIXES: &[&str] = &["", "s", "es"];

/// Whether `phrase`, optionally pluralized, occurs in `text` delimited by
/// non-alphanumeric characters.
///
/// Both arguments must already be lowercase.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric();
    let ends_word = |rest: &str| rest.chars().next().map_or(true, |c| !is_word(c));
    let mut start = 0;
    while let Some(offset) = text[start..].find(phrase) {
        let begin = start + offset;
        let end = begin + phrase.len();
        let before_ok = text[..begin].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = PLURAL_SUFFIXES.iter().any(|suffix| {
            text[end..]
                .strip_prefix(suffix)
                .is_some_and(ends_word)
        });
        if before_ok && after_ok {
            return true;
        }
        start = begin
            + text[begin..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
    }
    false
}

/// Evaluates the triage rule table against emails.
#[derive(Debug, Clone, Default)]
pub struct TriageEngine {
    contacts: Vec<Contact>,
}

impl TriageEngine {
    /// Creates an engine that treats `contacts` as known senders.
    pub fn new(contacts: impl IntoIterator<Item = Contact>) -> Self {
        Self {
            contacts: contacts.into_iter().collect(),
        }
    }

    /// Whether a sender string refers to a known contact.
    pub fn is_known_sender(&self, sender: &str) -> bool {
        self.contacts.iter().any(|c| c.matches_sender(sender))
    }

    /// Classifies an email. Always returns a result.
    pub fn evaluate(&self, email: &EmailInput) -> TriageResult {
        let haystack = Haystack::new(email);
        let known = self.is_known_sender(&haystack.sender);

        let rule = RULES
            .iter()
            .find(|rule| (rule.predicate)(&haystack, known))
            .unwrap_or(&RULES[RULES.len() - 1]);

        tracing::debug!(category = %rule.category, known_sender = known, "Triage evaluated");

        TriageResult {
            category: rule.category,
            action: (rule.action)(),
            justification: rule.justification.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine() -> TriageEngine {
        TriageEngine::new([Contact::new("boss@company.com")])
    }

    fn email(subject: &str, body: &str, sender: &str) -> EmailInput {
        EmailInput::new(subject, body, sender)
    }

    #[test]
    fn invoice_goes_to_receipts() {
        let result = engine().evaluate(&email("Invoice overdue", "Please pay", "a@b.com"));
        assert_eq!(result.category, Category::OtpReceipt);
        assert_eq!(result.action.to_string(), "MOVE_TO_FOLDER: Receipts");
    }

    #[test]
    fn evaluation_is_deterministic() {
        let input = email("Invoice overdue", "Please pay", "a@b.com");
        let engine = engine();
        assert_eq!(engine.evaluate(&input), engine.evaluate(&input));
    }

    #[test]
    fn newsletter_outranks_everything() {
        let result = engine().evaluate(&email(
            "URGENT: our weekly update",
            "Click to unsubscribe",
            "boss@company.com",
        ));
        assert_eq!(result.category, Category::Newsletter);
        assert_eq!(result.action.to_string(), "MOVE_TO_FOLDER: Newsletters");
    }

    #[test]
    fn promotional_offer() {
        let result = engine().evaluate(&email("Limited time offer", "Buy now!", "shop@store.com"));
        assert_eq!(result.category, Category::Promotional);
        assert_eq!(result.action.to_string(), "MOVE_TO_FOLDER: Promotions");
    }

    #[test]
    fn known_contact_with_urgency_is_urgent() {
        let result = engine().evaluate(&email(
            "Need this ASAP",
            "Board meeting moved",
            "The Boss <Boss@Company.com>",
        ));
        assert_eq!(result.category, Category::Urgent);
        assert_eq!(result.action, TriageAction::FlagPriority(Priority::High));
    }

    #[test]
    fn known_contact_is_important() {
        let result = engine().evaluate(&email("Lunch?", "Free tomorrow?", "boss@company.com"));
        assert_eq!(result.category, Category::Important);
        assert_eq!(result.action.to_string(), "FLAG_PRIORITY: High");
    }

    #[test]
    fn urgent_language_from_stranger_is_important() {
        let result = engine().evaluate(&email(
            "Action required",
            "Please review before the deadline",
            "x@y.com",
        ));
        assert_eq!(result.category, Category::Important);
    }

    #[test]
    fn fallback_is_other() {
        let result = engine().evaluate(&email("Hello", "How are you?", "friend@mail.com"));
        assert_eq!(result.category, Category::Other);
        assert_eq!(result.action.to_string(), "MOVE_TO_FOLDER: Inbox");
        assert!(!result.justification.is_empty());
    }

    #[test]
    fn keywords_match_whole_words_only() {
        let result = engine().evaluate(&email(
            "Wholesale pricing",
            "We had hotpot and discussed the proposal",
            "x@y.com",
        ));
        assert_eq!(result.category, Category::Other);
    }

    #[test]
    fn contains_phrase_boundaries() {
        assert!(contains_phrase("your otp is 1234", "otp"));
        assert!(contains_phrase("otp", "otp"));
        assert!(contains_phrase("(sale!)", "sale"));
        assert!(contains_phrase("a weekly update here", "weekly update"));
        assert!(!contains_phrase("hotpot", "otp"));
        assert!(!contains_phrase("salesforce", "sale"));
        assert!(contains_phrase("salesforce sale", "sale"));
        assert!(contains_phrase("two invoices attached", "invoice"));
        assert!(contains_phrase("new offers", "offer"));
        assert!(contains_phrase("weekly updates inside", "weekly update"));
        assert!(!contains_phrase("offered", "offer"));
    }

    #[test]
    fn plural_keywords_are_routed() {
        let cases = [
            ("Your invoices for March", "", Category::OtpReceipt, "MOVE_TO_FOLDER: Receipts"),
            ("Payment receipts", "", Category::OtpReceipt, "MOVE_TO_FOLDER: Receipts"),
            ("Big discounts this week", "", Category::Promotional, "MOVE_TO_FOLDER: Promotions"),
            ("Our newsletters", "", Category::Newsletter, "MOVE_TO_FOLDER: Newsletters"),
            ("Deadlines approaching", "", Category::Important, "FLAG_PRIORITY: High"),
        ];

        let engine = TriageEngine::new(Vec::new());
        for (subject, body, category, action) in cases {
            let result = engine.evaluate(&email(subject, body, "x@y.com"));
            assert_eq!(result.category, category, "{}", subject);
            assert_eq!(result.action.to_string(), action, "{}", subject);
        }
    }
}
