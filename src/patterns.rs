//! Deterministic pattern extractors over raw statement text.
//!
//! Each extractor is a pure function from text to a candidate value, built as
//! an ordered chain of (matcher, transform) rules where the first confident
//! match wins. New statement formats are added by extending a rule table, not
//! by touching merge logic.

use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};

use crate::schema::{RewardPointsSummary, StatementRecord, Transaction};

/// Labeled financial amounts recovered by pattern matching. `opening_balance`
/// is the reward-points precursor label some issuers print in the summary box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmountFields {
    pub total_amount_due: Option<f64>,
    pub minimum_amount_due: Option<f64>,
    pub credit_limit: Option<f64>,
    pub available_credit_limit: Option<f64>,
    pub opening_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerInfo {
    pub customer_name: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateFields {
    pub statement_date: Option<String>,
    pub payment_due_date: Option<String>,
}

/// Card number rules, most explicit first. The paired character set is
/// stripped from the match (internal whitespace in "Card No" layouts,
/// grouping separators in fully-numeric layouts).
static CARD_NUMBER_RULES: LazyLock<Vec<(Regex, &'static [char])>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)Card Number\s*:?\s*(\d{4}\*+\d{4})").unwrap(),
            &[],
        ),
        (
            Regex::new(r"(?i)Card No\s*:?\s*(\d{4}[\s*]+\d{4})").unwrap(),
            &[' '],
        ),
        (
            Regex::new(r"(?i)Card Number\s*:?\s*(\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4})").unwrap(),
            &[' ', '-'],
        ),
        (Regex::new(r"\b(\d{4}\*+\d{4})\b").unwrap(), &[]),
    ]
});

pub fn extract_card_number(text: &str) -> Option<String> {
    CARD_NUMBER_RULES.iter().find_map(|(rule, strip)| {
        let matched = rule.captures(text)?.get(1)?;
        Some(
            matched
                .as_str()
                .chars()
                .filter(|c| !strip.contains(c))
                .collect(),
        )
    })
}

static TOTAL_DUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Total Amount Due|Total Due|New Balance)[\s:]*[₹$]?\s*([0-9,]+\.?[0-9]*)")
        .unwrap()
});
static MIN_DUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Minimum Amount Due|Min Amount Due|Minimum Due|Min Due)[\s:]*[₹$]?\s*([0-9,]+\.?[0-9]*)",
    )
    .unwrap()
});
static CREDIT_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Credit Limit|Limit)[\s:]*[₹$]?\s*([0-9,]+\.?[0-9]*)").unwrap()
});
static AVAILABLE_CREDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Available Credit Limit|Available Credit|Available Limit)[\s:]*[₹$]?\s*([0-9,]+\.?[0-9]*)",
    )
    .unwrap()
});
static OPENING_BALANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Opening Balance|Previous Balance)[\s:]*[₹$]?\s*([0-9,]+\.?[0-9]*)").unwrap()
});

/// Parses the first labeled amount, tolerating thousands separators. A capture
/// that fails to parse leaves the field absent rather than raising.
fn labeled_amount(text: &str, rule: &Regex) -> Option<f64> {
    let raw = rule.captures(text)?.get(1)?.as_str().replace(',', "");
    raw.parse::<f64>().ok()
}

pub fn extract_financial_amounts(text: &str) -> AmountFields {
    let mut amounts = AmountFields {
        total_amount_due: labeled_amount(text, &TOTAL_DUE_RE),
        minimum_amount_due: labeled_amount(text, &MIN_DUE_RE),
        credit_limit: labeled_amount(text, &CREDIT_LIMIT_RE),
        available_credit_limit: labeled_amount(text, &AVAILABLE_CREDIT_RE),
        opening_balance: labeled_amount(text, &OPENING_BALANCE_RE),
    };

    // Pre-compute available credit so the merge sees it as a directly
    // observed high-confidence value. Finalize repeats this derivation for
    // records that arrive through other paths.
    if amounts.available_credit_limit.is_none() {
        if let (Some(limit), Some(due)) = (amounts.credit_limit, amounts.total_amount_due) {
            amounts.available_credit_limit = Some(limit - due);
        }
    }

    amounts
}

/// Reward section patterns, strictest first. Group order is opening, earned,
/// then closing as the final group; an intermediate redeemed/adjusted group
/// is ignored.
static REWARD_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?is)REWARDS\s*SUMMARY\s*Opening Balance\s*(\d+)\s*Rewards Earned\s*(\d+)\s*Redeemed/Adjusted\s*(\d+)\s*Closing Balance\s*(\d+)",
        )
        .unwrap(),
        Regex::new(
            r"(?is)Reward Points.*?Opening Balance\s*(\d+).*?Earned\s*(\d+).*?Closing Balance\s*(\d+)",
        )
        .unwrap(),
        Regex::new(r"(?is)Opening Balance\s*(\d+)\s*Rewards Earned\s*(\d+)\s*Closing Balance\s*(\d+)")
            .unwrap(),
    ]
});

fn reward_group(caps: &Captures, index: usize) -> Option<f64> {
    caps.get(index)?.as_str().parse::<f64>().ok()
}

pub fn extract_reward_points(text: &str) -> RewardPointsSummary {
    let mut summary = RewardPointsSummary::default();

    for rule in REWARD_RULES.iter() {
        if let Some(caps) = rule.captures(text) {
            summary.opening_balance = reward_group(&caps, 1);
            summary.earned = reward_group(&caps, 2);
            summary.closing_balance = reward_group(&caps, caps.len() - 1);
            break;
        }
    }

    if summary.closing_balance.is_none() {
        if let (Some(opening), Some(earned)) = (summary.opening_balance, summary.earned) {
            summary.closing_balance = Some(opening + earned);
        }
    }

    summary
}

/// Bounds of the transaction table: everything between the section header and
/// the next section header, a page footer, or end of text.
static TRANSACTION_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)YOUR TRANSACTIONS(.*?)(?:KEY OFFERS|Page \d+ of \d+|\z)").unwrap()
});

static TRANSACTION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})\s+([A-Za-z0-9 \t.\-&]+?)\s+([0-9,]+\.?[0-9]*)\s*(CR)?")
        .unwrap()
});

pub fn extract_transactions(text: &str) -> Vec<Transaction> {
    let Some(section) = TRANSACTION_SECTION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
    else {
        return Vec::new();
    };

    let mut transactions = Vec::new();
    for caps in TRANSACTION_LINE_RE.captures_iter(section.as_str()) {
        let raw_amount = caps[3].replace(',', "");
        // A malformed numeric token skips the row, not the scan.
        let Ok(mut amount) = raw_amount.parse::<f64>() else {
            debug!("skipping transaction row with unparseable amount {:?}", &caps[3]);
            continue;
        };
        if caps.get(4).is_some() {
            amount = -amount;
        }
        transactions.push(Transaction {
            date: caps[1].trim().to_string(),
            description: caps[2].trim().to_string(),
            amount,
        });
    }

    transactions
}

/// Customer name rules: explicit labels first, then the line directly above a
/// "Credit Card" mention.
static NAME_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?im)Customer Name\s*:?[ \t]*([A-Za-z][A-Za-z .]*)").unwrap(),
        Regex::new(r"(?im)Cardholder\s*:?[ \t]*([A-Za-z][A-Za-z .]*)").unwrap(),
        Regex::new(r"(?im)Name\s*:?[ \t]*([A-Za-z][A-Za-z .]*)").unwrap(),
        Regex::new(r"(?im)^([A-Za-z][A-Za-z .]+)\r?\n[^\n]*Credit Card").unwrap(),
    ]
});

static BANK_RULES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?i)(HDFC Bank|ICICI Bank|Axis Bank|IDFC FIRST Bank|RBL Bank|SBI Card|Kotak Bank|Standard Chartered)",
        )
        .unwrap(),
        Regex::new(r"(?i)([A-Za-z]+ Bank Limited)").unwrap(),
        Regex::new(r"(?i)([A-Za-z]+ Card Services)").unwrap(),
    ]
});

/// Drops an accidental email-label capture ("John Doe email" → "John Doe").
/// Returns None when nothing remains, so the chain can keep looking.
fn sanitize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    let cleaned = match lowered.find("email") {
        Some(pos) => trimmed[..pos].trim(),
        None => trimmed,
    };
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

pub fn extract_customer_info(text: &str) -> CustomerInfo {
    let customer_name = NAME_RULES.iter().find_map(|rule| {
        let caps = rule.captures(text)?;
        sanitize_name(caps.get(1)?.as_str())
    });

    let bank_name = BANK_RULES.iter().find_map(|rule| {
        Some(rule.captures(text)?.get(1)?.as_str().trim().to_string())
    });

    CustomerInfo {
        customer_name,
        bank_name,
    }
}

static STATEMENT_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Statement Date|Date)[\s:]*(\d{1,2}/\d{1,2}/\d{4})").unwrap()
});
static DUE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Payment Due Date|Due Date)[\s:]*(\d{1,2}/\d{1,2}/\d{4})").unwrap()
});

/// Dates keep their printed separators and padding; no normalization.
pub fn extract_dates(text: &str) -> DateFields {
    let capture = |rule: &Regex| {
        rule.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    DateFields {
        statement_date: capture(&STATEMENT_DATE_RE),
        payment_due_date: capture(&DUE_DATE_RE),
    }
}

/// Runs every pattern extractor over the text and assembles the
/// pattern-matched candidate record.
pub fn extract_statement_patterns(text: &str) -> StatementRecord {
    let amounts = extract_financial_amounts(text);
    let customer = extract_customer_info(text);
    let dates = extract_dates(text);
    let transactions = extract_transactions(text);
    let rewards = extract_reward_points(text);
    let card_number = extract_card_number(text);

    debug!(
        "pattern extraction: {} transactions, total_due={:?}, card={}",
        transactions.len(),
        amounts.total_amount_due,
        card_number.is_some()
    );

    StatementRecord {
        customer_name: customer.customer_name,
        statement_date: dates.statement_date,
        payment_due_date: dates.payment_due_date,
        total_amount_due: amounts.total_amount_due,
        minimum_amount_due: amounts.minimum_amount_due,
        credit_limit: amounts.credit_limit,
        available_credit_limit: amounts.available_credit_limit,
        card_number,
        bank_name: customer.bank_name,
        transactions,
        reward_points_summary: rewards,
    }
}
