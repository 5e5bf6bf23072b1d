//! Label vocabularies for the three classification axes

/// Who an interaction is with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorType {
    /// First-time prospect, no account on file
    NewClient,

    /// Active member with a current account
    ExistingMember,

    /// Lapsed client re-establishing contact
    ReturningClient,

    /// Staff member at a location
    CurrentEmployee,

    /// Job applicant
    Applicant,

    /// Former staff member
    FormerEmployee,

    /// Franchise owner or their management
    Franchisee,

    /// Outside party with no service relationship (telemarketers included)
    External,

    /// Could not be determined
    Unknown,
}

impl ActorType {
    /// Get the actor type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorType::NewClient => "new_client",
            ActorType::ExistingMember => "existing_member",
            ActorType::ReturningClient => "returning_client",
            ActorType::CurrentEmployee => "current_employee",
            ActorType::Applicant => "applicant",
            ActorType::FormerEmployee => "former_employee",
            ActorType::Franchisee => "franchisee",
            ActorType::External => "external",
            ActorType::Unknown => "unknown",
        }
    }

    /// Parse an actor type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new_client" => Some(ActorType::NewClient),
            "existing_member" => Some(ActorType::ExistingMember),
            "returning_client" => Some(ActorType::ReturningClient),
            "current_employee" => Some(ActorType::CurrentEmployee),
            "applicant" => Some(ActorType::Applicant),
            "former_employee" => Some(ActorType::FormerEmployee),
            "franchisee" => Some(ActorType::Franchisee),
            "external" => Some(ActorType::External),
            "unknown" => Some(ActorType::Unknown),
            _ => None,
        }
    }

    /// Whether this label carries real signal (tie-break prefers specific labels)
    pub fn is_specific(&self) -> bool {
        !matches!(self, ActorType::Unknown)
    }

    /// All actor types, for iteration in scoring and tests
    pub fn all() -> &'static [ActorType] {
        &[
            ActorType::NewClient,
            ActorType::ExistingMember,
            ActorType::ReturningClient,
            ActorType::CurrentEmployee,
            ActorType::Applicant,
            ActorType::FormerEmployee,
            ActorType::Franchisee,
            ActorType::External,
            ActorType::Unknown,
        ]
    }
}

impl std::str::FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid actor type: {}", s))
    }
}

/// The categorical reason/topic of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketType {
    /// Membership cancellation request
    Cancellation,

    /// Refund request
    Refund,

    /// Billing, charges, payment method updates
    AccountPayment,

    /// Promotions, discounts, marketing offers
    Promotional,

    /// Something broken or not working
    TechnicalSupport,

    /// Spray tan service questions
    SprayTan,

    /// Customer review or complaint about service quality
    Review,

    /// Telemarketing / unsolicited outreach
    Spam,

    /// Everything else
    Other,
}

impl TicketType {
    /// Get the ticket type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Cancellation => "cancellation",
            TicketType::Refund => "refund",
            TicketType::AccountPayment => "account_payment",
            TicketType::Promotional => "promotional",
            TicketType::TechnicalSupport => "technical_support",
            TicketType::SprayTan => "spray_tan",
            TicketType::Review => "review",
            TicketType::Spam => "spam",
            TicketType::Other => "other",
        }
    }

    /// Parse a ticket type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cancellation" => Some(TicketType::Cancellation),
            "refund" => Some(TicketType::Refund),
            "account_payment" => Some(TicketType::AccountPayment),
            "promotional" => Some(TicketType::Promotional),
            "technical_support" => Some(TicketType::TechnicalSupport),
            "spray_tan" => Some(TicketType::SprayTan),
            "review" => Some(TicketType::Review),
            "spam" => Some(TicketType::Spam),
            "other" => Some(TicketType::Other),
            _ => None,
        }
    }

    /// Whether this label carries real signal (tie-break prefers specific labels)
    pub fn is_specific(&self) -> bool {
        !matches!(self, TicketType::Other)
    }

    /// All ticket types, for iteration in scoring and tests
    pub fn all() -> &'static [TicketType] {
        &[
            TicketType::Cancellation,
            TicketType::Refund,
            TicketType::AccountPayment,
            TicketType::Promotional,
            TicketType::TechnicalSupport,
            TicketType::SprayTan,
            TicketType::Review,
            TicketType::Spam,
            TicketType::Other,
        ]
    }
}

impl std::str::FromStr for TicketType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid ticket type: {}", s))
    }
}

/// Urgency of an interaction
///
/// Ordered: Low < Normal < High < Urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Can wait days
    Low,

    /// Standard handling
    Normal,

    /// Same-day handling expected
    High,

    /// Immediate attention required
    Urgent,
}

impl Priority {
    /// Get the priority name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse a priority from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid priority: {}", s))
    }
}

/// The three independent classification axes
///
/// Keys for per-category routing thresholds and feedback accuracy metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelCategory {
    /// Actor classification
    Actor,

    /// Ticket type classification
    Ticket,

    /// Priority scoring
    Priority,
}

impl LabelCategory {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelCategory::Actor => "actor",
            LabelCategory::Ticket => "ticket",
            LabelCategory::Priority => "priority",
        }
    }

    /// Parse a category from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "actor" => Some(LabelCategory::Actor),
            "ticket" => Some(LabelCategory::Ticket),
            "priority" => Some(LabelCategory::Priority),
            _ => None,
        }
    }

    /// All categories
    pub fn all() -> &'static [LabelCategory] {
        &[LabelCategory::Actor, LabelCategory::Ticket, LabelCategory::Priority]
    }
}
