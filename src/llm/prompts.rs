//! Prompt builders for the extraction and statement-chat calls.

/// Cap on statement text included in the extraction prompt. A cost/latency
/// bound, not a correctness requirement; the merge tolerates missing tail
/// data.
pub const MAX_EXTRACTION_TEXT_CHARS: usize = 15_000;

/// Cap on raw text appended to a chat prompt as secondary context.
pub const MAX_CHAT_CONTEXT_CHARS: usize = 4_000;

const EXTRACTION_INSTRUCTIONS: &str = r#"CRITICAL TASK: Extract ALL 11 data points from this credit card statement. DO NOT skip any field.

MANDATORY INSTRUCTIONS:
1. You MUST attempt ALL 11 fields below. Use null ONLY when a value is impossible to find.
2. Use the computation rules when a direct value is not printed.
3. Be thorough - search every section of every page.

DATA POINTS TO EXTRACT:

1. customer_name: Full name of the cardholder
   - Search: header, address block, transaction headers
   - Labels: "Customer Name:", "Cardholder:", "Name:"

2. statement_date: Statement generation date
   - Labels: "Statement Date:", "Date:"
   - Keep the original format as printed

3. payment_due_date: Payment deadline
   - Labels: "Payment Due Date:", "Due Date:"
   - Keep the original format as printed

4. total_amount_due: Total balance owed
   - Labels: "Total Amount Due:", "Total Due:", "New Balance"
   - Number only (no currency symbols or separators)

5. minimum_amount_due: Minimum payment required
   - Labels: "Minimum Amount Due:", "Min Amount Due:", "Minimum Due:"
   - Often printed next to the total amount due

6. credit_limit: Total credit line
   - Labels: "Credit Limit:", "Limit:"

7. available_credit_limit: Remaining credit
   - Labels: "Available Credit Limit:", "Available Credit:"
   - COMPUTATION: if not printed, credit_limit - total_amount_due

8. card_number: Card number, possibly masked
   - Labels: "Card Number:", "Card No:"
   - May look like 428102*****9388

9. transactions: Every transaction row
   - Fields per row: date, description, amount
   - Credits/refunds (rows marked CR) have NEGATIVE amounts

10. reward_points_summary: opening_balance, earned, closing_balance
    - Search the "REWARDS SUMMARY" or "Reward Points" section
    - COMPUTATION: if closing is not printed, opening_balance + earned

11. bank_name: Issuing bank or card services name
    - Examples: "HDFC Bank", "ICICI Bank", "Axis Bank", "IDFC FIRST Bank", "RBL Bank"

RETURN FORMAT - A SINGLE VALID JSON OBJECT, NOTHING ELSE:
{
  "customer_name": "string or null",
  "statement_date": "string or null",
  "payment_due_date": "string or null",
  "total_amount_due": number or null,
  "minimum_amount_due": number or null,
  "credit_limit": number or null,
  "available_credit_limit": number or null,
  "card_number": "string or null",
  "bank_name": "string or null",
  "transactions": [
    {"date": "string", "description": "string", "amount": number}
  ],
  "reward_points_summary": {
    "opening_balance": number or null,
    "earned": number or null,
    "closing_balance": number or null
  }
}

No explanations, no markdown, no partial data. JSON only."#;

/// Truncates on a char boundary to at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// The structured-extraction prompt: instructions, a bounded prefix of the
/// statement text, and the JSON-only output contract.
pub fn build_extraction_prompt(statement_text: &str) -> String {
    format!(
        "{}\n\nEXTRACTED TEXT FROM ALL PAGES:\n{}\n",
        EXTRACTION_INSTRUCTIONS,
        truncate_chars(statement_text, MAX_EXTRACTION_TEXT_CHARS)
    )
}

/// The analyst prompt for answering a question about a processed statement.
/// The reconciled record is the primary context; raw text is secondary.
pub fn build_chat_prompt(record_json: &str, statement_text: &str, question: &str) -> String {
    format!(
        "You are a financial analyst assistant answering questions about one \
         credit card statement.\n\n\
         EXTRACTED STRUCTURED DATA:\n{}\n\n\
         ADDITIONAL TEXT CONTEXT (for reference):\n{}\n\n\
         USER QUESTION: {}\n\n\
         RESPONSE GUIDELINES:\n\
         - Structure the answer with clear sections and bullet points\n\
         - Quote amounts with their currency as printed\n\
         - Summarize rather than dumping raw rows\n\
         - Say plainly when the statement does not contain the answer",
        record_json,
        truncate_chars(statement_text, MAX_CHAT_CONTEXT_CHARS),
        question
    )
}
