// Identity Extractor - Pulls transacting-party identifiers out of narrations
// Two independent pattern families (UPI/phone and names) unioned into one set

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

// ============================================================================
// TRANSACTION METHOD
// ============================================================================

/// Payment rail mentioned in a narration. Absence of any method keyword
/// is modeled as `None` at the call sites.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TransactionMethod {
    Upi,
    Imps,
    Neft,
    Rtgs,
    Card,
    CashWithdrawal,
}

impl TransactionMethod {
    /// Classification scan order. First keyword found in the narration
    /// wins, even when several methods are mentioned.
    pub const ALL: [TransactionMethod; 6] = [
        TransactionMethod::Upi,
        TransactionMethod::Imps,
        TransactionMethod::Neft,
        TransactionMethod::Rtgs,
        TransactionMethod::Card,
        TransactionMethod::CashWithdrawal,
    ];

    /// Human-readable name for display and reports
    pub fn label(&self) -> &'static str {
        match self {
            TransactionMethod::Upi => "UPI",
            TransactionMethod::Imps => "IMPS",
            TransactionMethod::Neft => "NEFT",
            TransactionMethod::Rtgs => "RTGS",
            TransactionMethod::Card => "Card",
            TransactionMethod::CashWithdrawal => "Cash Withdrawal",
        }
    }

    /// Lowercase keyword tested against the narration
    fn keyword(&self) -> &'static str {
        match self {
            TransactionMethod::Upi => "upi",
            TransactionMethod::Imps => "imps",
            TransactionMethod::Neft => "neft",
            TransactionMethod::Rtgs => "rtgs",
            TransactionMethod::Card => "card",
            TransactionMethod::CashWithdrawal => "cash withdrawal",
        }
    }
}

/// Classify the payment method of a narration by case-insensitive
/// substring test, first match in `TransactionMethod::ALL` order.
pub fn classify_method(narration: &str) -> Option<TransactionMethod> {
    let lower = narration.to_lowercase();
    TransactionMethod::ALL
        .iter()
        .copied()
        .find(|method| lower.contains(method.keyword()))
}

// ============================================================================
// IDENTITY PATTERNS
// ============================================================================

/// UPI handles and phone numbers: a 10-digit number followed by
/// `@provider`, a `word@word` handle, or a bare 10-digit number. The
/// handle alternatives come first so a full `digits@provider` match is
/// never split into its digit prefix.
fn upi_or_phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[0-9]{10}@[A-Za-z]+|[A-Za-z]+@[A-Za-z]+|[0-9]{10}")
            .expect("upi/phone regex")
    })
}

/// Counter-party names in NEFT/IMPS/RTGS narrations shaped like
/// `METHOD ... -Name Words-REFERENCE11`, capturing the name between the
/// hyphens.
fn reference_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:NEFT|IMPS|RTGS).*?-([A-Za-z]+[A-Za-z ]+)-[A-Z0-9]{11}")
            .expect("reference name regex")
    })
}

/// Fallback name candidate: two consecutive capitalized words anywhere
/// in the narration.
fn plain_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+\s[A-Z][a-z]+\b").expect("plain name regex")
    })
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract the transaction method and all candidate identity tokens from
/// one free-text narration.
///
/// The two pattern families run independently and their matches are
/// unioned. A narration that matches both a UPI pattern and a name
/// pattern yields both tokens; they are treated as distinct identities
/// downstream. Never fails: text with no matches yields an empty set.
pub fn extract(narration: &str) -> (Option<TransactionMethod>, BTreeSet<String>) {
    let method = classify_method(narration);
    let mut identities = BTreeSet::new();

    for m in upi_or_phone_re().find_iter(narration) {
        identities.insert(m.as_str().to_string());
    }

    for caps in reference_name_re().captures_iter(narration) {
        if let Some(name) = caps.get(1) {
            let token = name.as_str().trim();
            if !token.is_empty() {
                identities.insert(token.to_string());
            }
        }
    }

    for m in plain_name_re().find_iter(narration) {
        identities.insert(m.as_str().to_string());
    }

    (method, identities)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(narration: &str) -> BTreeSet<String> {
        extract(narration).1
    }

    #[test]
    fn test_upi_handle_extracted_verbatim() {
        let ids = tokens("UPI 9876543210@ybl payment");
        assert!(ids.contains("9876543210@ybl"));
        // The digit prefix must not also appear as a separate token
        assert!(!ids.contains("9876543210"));
    }

    #[test]
    fn test_bare_phone_number_extracted() {
        let ids = tokens("Paid to 9876543210 on request");
        assert!(ids.contains("9876543210"));
    }

    #[test]
    fn test_word_at_word_handle_extracted() {
        let ids = tokens("upi transfer to ramesh@okhdfc done");
        assert!(ids.contains("ramesh@okhdfc"));
    }

    #[test]
    fn test_reference_name_pattern() {
        let (method, ids) = extract("IMPS-Ramesh Kumar-AB12345678Z transfer");
        assert_eq!(method, Some(TransactionMethod::Imps));
        assert!(ids.contains("Ramesh Kumar"));
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_plain_name_fallback() {
        let ids = tokens("paid towards rent by Suresh Sharma monthly");
        assert!(ids.contains("Suresh Sharma"));
    }

    #[test]
    fn test_upi_and_name_yield_separate_identities() {
        let ids = tokens("UPI 9876543210@ybl from Ramesh Kumar");
        assert!(ids.contains("9876543210@ybl"));
        assert!(ids.contains("Ramesh Kumar"));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_no_identifiers_yields_empty_set() {
        let (method, ids) = extract("random text no identifiers");
        assert_eq!(method, None);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_empty_narration() {
        let (method, ids) = extract("");
        assert_eq!(method, None);
        assert!(ids.is_empty());
    }

    #[test]
    fn test_method_first_match_wins() {
        // Both UPI and NEFT appear; UPI is earlier in the scan order
        let (method, _) = extract("NEFT return of UPI collect");
        assert_eq!(method, Some(TransactionMethod::Upi));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        assert_eq!(classify_method("neft salary credit"), Some(TransactionMethod::Neft));
        assert_eq!(classify_method("Rtgs settlement"), Some(TransactionMethod::Rtgs));
        assert_eq!(
            classify_method("atm cash withdrawal branch"),
            Some(TransactionMethod::CashWithdrawal)
        );
    }

    #[test]
    fn test_method_classification_independent_of_identities() {
        // A method keyword with no extractable identity still classifies
        let (method, ids) = extract("upi collect request declined");
        assert_eq!(method, Some(TransactionMethod::Upi));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_name_capture_is_trimmed() {
        let ids = tokens("NEFT ref-John Smith -AB12345678Z done");
        assert!(ids.contains("John Smith"));
        assert!(!ids.iter().any(|t| t.ends_with(' ')));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        // Lowercase pairs are not name candidates
        let ids = tokens("payment from ramesh kumar via cheque");
        assert!(ids.is_empty());
    }
}
