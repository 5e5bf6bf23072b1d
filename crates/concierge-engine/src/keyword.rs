//! Rule-based keyword strategies
//!
//! Keyword tables distilled from historical support-ticket analysis. Each
//! table maps cue phrases to a label; confidence grows with the number of
//! distinct cues matched, in 0.05 steps, so the engine's epsilon tie-break
//! has meaningful granularity.

use crate::strategies::{ActorClassifier, PriorityScorer, StrategyError, TicketClassifier};
use concierge_domain::{ActorType, Confidence, Interaction, Priority, TicketType};

/// Confidence for `hits` matched cues: 0.6, 0.65, 0.7, ... capped at 0.9
fn score_hits(hits: usize) -> Option<Confidence> {
    if hits == 0 {
        return None;
    }
    // Integer percent steps keep scores exactly representable
    let percent = (60 + 5 * (hits as u32 - 1)).min(90);
    Some(Confidence::new(f64::from(percent) / 100.0))
}

/// Count how many cue phrases occur in the text
fn count_hits(text: &str, cues: &[&str]) -> usize {
    cues.iter().filter(|cue| text.contains(*cue)).count()
}

const CANCELLATION_CUES: &[&str] = &[
    "cancel",
    "cancellation",
    "unsubscribe",
    "end my account",
    "close my account",
    "end my membership",
];

const REFUND_CUES: &[&str] = &["refund", "money back", "reimburse", "charge back"];

const ACCOUNT_PAYMENT_CUES: &[&str] = &[
    "billing",
    "charge",
    "invoice",
    "overcharged",
    "double charge",
    "update card",
    "new card",
    "payment method",
    "credit card",
    "past due",
];

const PROMOTIONAL_CUES: &[&str] = &[
    "promotion",
    "promo code",
    "discount",
    "coupon",
    "special offer",
    "free week",
];

const TECHNICAL_CUES: &[&str] = &[
    "not working",
    "error",
    "broken",
    "problem",
    "bug",
    "password",
    "reset",
    "can't log in",
    "login issue",
    "app crash",
];

const SPRAY_TAN_CUES: &[&str] = &[
    "spray tan",
    "sunless",
    "bronzer",
    "versa",
    "mystic tan",
];

const REVIEW_CUES: &[&str] = &[
    "review",
    "feedback",
    "my experience",
    "one star",
    "five star",
    "terrible service",
    "great service",
];

const SPAM_CUES: &[&str] = &[
    "limited time offer",
    "act now",
    "congratulations you",
    "free cruise",
    "extended warranty",
    "press 1",
    "seo services",
    "business loan",
    "increase your sales",
    "this is not a sales call",
];

const NEW_CLIENT_CUES: &[&str] = &["sign up", "join", "become a member", "first visit", "pricing"];

const EXISTING_MEMBER_CUES: &[&str] = &[
    "my membership",
    "my account",
    "my plan",
    "my monthly",
    "member since",
];

const RETURNING_CLIENT_CUES: &[&str] = &[
    "rejoin",
    "re-join",
    "used to be a member",
    "coming back",
    "reactivate",
];

const EMPLOYEE_CUES: &[&str] = &["my shift", "my schedule", "my manager", "paycheck", "time off"];

const APPLICANT_CUES: &[&str] = &[
    "application",
    "applying",
    "job opening",
    "interview",
    "resume",
    "hiring",
];

const FORMER_EMPLOYEE_CUES: &[&str] = &[
    "former employee",
    "used to work",
    "last paycheck",
    "w-2",
    "final pay",
];

const FRANCHISEE_CUES: &[&str] = &[
    "franchise",
    "franchisee",
    "my location",
    "my salon",
    "royalty",
    "territory",
];

const URGENT_CUES: &[&str] = &[
    "urgent",
    "immediately",
    "asap",
    "right now",
    "emergency",
    "lawsuit",
    "legal action",
];

const HIGH_CUES: &[&str] = &[
    "angry",
    "frustrated",
    "disappointed",
    "escalate",
    "manager",
    "unresolved",
    "third time",
    "still waiting",
];

const LOW_CUES: &[&str] = &["no rush", "whenever", "just wondering", "just curious"];

/// Keyword-table ticket classifier
#[derive(Debug, Clone, Default)]
pub struct KeywordTicketClassifier;

impl TicketClassifier for KeywordTicketClassifier {
    fn score(
        &self,
        interaction: &Interaction,
    ) -> Result<Vec<(TicketType, Confidence)>, StrategyError> {
        let text = interaction.normalized_text.as_str();

        let tables: &[(TicketType, &[&str])] = &[
            (TicketType::Cancellation, CANCELLATION_CUES),
            (TicketType::Refund, REFUND_CUES),
            (TicketType::AccountPayment, ACCOUNT_PAYMENT_CUES),
            (TicketType::Promotional, PROMOTIONAL_CUES),
            (TicketType::TechnicalSupport, TECHNICAL_CUES),
            (TicketType::SprayTan, SPRAY_TAN_CUES),
            (TicketType::Review, REVIEW_CUES),
            (TicketType::Spam, SPAM_CUES),
        ];

        let mut candidates = Vec::new();
        for (label, cues) in tables {
            if let Some(confidence) = score_hits(count_hits(text, cues)) {
                candidates.push((*label, confidence));
            }
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "keyword-ticket"
    }
}

/// Keyword-table actor classifier
///
/// A pre-known actor hint acts as a prior: it enters as a candidate on its
/// own and is boosted when cue phrases corroborate it.
#[derive(Debug, Clone, Default)]
pub struct KeywordActorClassifier;

impl ActorClassifier for KeywordActorClassifier {
    fn score(
        &self,
        interaction: &Interaction,
    ) -> Result<Vec<(ActorType, Confidence)>, StrategyError> {
        let text = interaction.normalized_text.as_str();

        let tables: &[(ActorType, &[&str])] = &[
            (ActorType::NewClient, NEW_CLIENT_CUES),
            (ActorType::ExistingMember, EXISTING_MEMBER_CUES),
            (ActorType::ReturningClient, RETURNING_CLIENT_CUES),
            (ActorType::CurrentEmployee, EMPLOYEE_CUES),
            (ActorType::Applicant, APPLICANT_CUES),
            (ActorType::FormerEmployee, FORMER_EMPLOYEE_CUES),
            (ActorType::Franchisee, FRANCHISEE_CUES),
            (ActorType::External, SPAM_CUES),
        ];

        let mut candidates = Vec::new();
        for (label, cues) in tables {
            if let Some(confidence) = score_hits(count_hits(text, cues)) {
                candidates.push((*label, confidence));
            }
        }

        if let Some(hint) = interaction.actor_hint {
            match candidates.iter_mut().find(|(label, _)| *label == hint) {
                Some((_, confidence)) => {
                    // Hint corroborated by cues
                    *confidence = Confidence::new((confidence.value() + 0.15).min(0.95));
                }
                None => candidates.push((hint, Confidence::new(0.75))),
            }
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "keyword-actor"
    }
}

/// Keyword-table priority scorer
///
/// Defaults to `Normal` with modest confidence when no urgency cue is
/// present; absence of urgency language is itself weak evidence of normal
/// priority, not the absence of signal.
#[derive(Debug, Clone, Default)]
pub struct KeywordPriorityScorer;

impl PriorityScorer for KeywordPriorityScorer {
    fn score(
        &self,
        interaction: &Interaction,
    ) -> Result<Vec<(Priority, Confidence)>, StrategyError> {
        let text = interaction.normalized_text.as_str();

        let mut candidates = Vec::new();
        if let Some(confidence) = score_hits(count_hits(text, URGENT_CUES)) {
            candidates.push((Priority::Urgent, confidence));
        }
        if let Some(confidence) = score_hits(count_hits(text, HIGH_CUES)) {
            candidates.push((Priority::High, confidence));
        }
        if let Some(confidence) = score_hits(count_hits(text, LOW_CUES)) {
            candidates.push((Priority::Low, confidence));
        }

        if candidates.is_empty() {
            candidates.push((Priority::Normal, Confidence::new(0.6)));
        }

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "keyword-priority"
    }
}
