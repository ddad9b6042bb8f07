//! Agency identity and the fixed persona instruction
//!
//! Every provider request carries the same system instruction; the strings the
//! widget shows on its own (greeting, fallbacks) live here as well so the
//! persona stays in one place.

use crate::location::Location;

/// Agency display name
pub const AGENCY_NAME: &str = "DrewVerse";

/// City the agency operates from. Also a location keyword for the classifier.
pub const HOME_CITY: &str = "Kampala";

/// Coordinate used whenever a live device position is not available
pub const HOME_LOCATION: Location = Location {
    latitude: 0.3476,
    longitude: 32.5825,
};

/// Provider model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// System instruction sent with every request
pub const SYSTEM_INSTRUCTION: &str = r"You are the DrewVerse AI Design Consultant and Research Assistant based in Kampala, Uganda.
Your primary tasks:
1. CONSULT: Help clients explore DrewVerse's services (Web, Mobile, UI/UX, Brand).
2. RESEARCH: Use Google Search to provide up-to-date digital marketing trends, technology news, and industry standards.
3. GEO-LOCATE: Use Google Maps to help users find our physical location or recommend local Ugandan business contexts.

Always be professional. DrewVerse started in 2023.
If you use research, cite your sources clearly using the provided tools.
Encourage project inquiries.";

/// First model message of every transcript
pub const GREETING: &str = "Hello! I'm your DrewVerse AI Consultant. I can help with design advice, market research, or finding our location in Kampala. What's on your mind?";

/// Substituted when the provider answers without any text
pub const EMPTY_RESPONSE_TEXT: &str = "I'm sorry, I couldn't generate a response.";

/// Returned for every failure absorbed by the gateway
pub const FALLBACK_TEXT: &str =
    "There was an error connecting to the AI consultant. Please try again later.";

/// Words that make a question location-relevant, matched case-insensitively
pub const LOCATION_KEYWORDS: &[&str] = &["location", "where", "near", "find", "address", HOME_CITY];

/// Inquiry synthesized by a "learn more" trigger
pub fn topic_inquiry(topic: &str) -> String {
    format!("Tell me more about your {topic} services.")
}
