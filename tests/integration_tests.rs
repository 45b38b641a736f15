use anyhow::Result;
use card_sense::llm::{CompletionError, CompletionModel, CompletionOptions};
use card_sense::{
    extract_without_model, MemorySessionStore, Session, SessionStore, StatementAssistant,
    StatementPipeline, StatementRecord, TableGrid,
};

const FULL_STATEMENT: &str = "\
John Doe\n\
HDFC Bank Credit Card Statement\n\
Statement Date: 01/04/2024\n\
Payment Due Date: 21/04/2024\n\
Card Number: 4281*****9388\n\
Credit Limit: 50,000\n\
Total Amount Due: 12,345.67\n\
Minimum Amount Due: 620.00\n\
REWARDS SUMMARY Opening Balance 100 Rewards Earned 50 Redeemed/Adjusted 0 Closing Balance 150\n\
YOUR TRANSACTIONS\n\
12/03/2024 AMAZON RETAIL 1,499.00\n\
15/03/2024 GROCERY MART 850.25\n\
18/03/2024 REFUND STORE 500.00 CR\n\
KEY OFFERS\n\
Page 2 of 2\n";

/// Returns a canned response regardless of prompt.
struct FixedModel(String);

impl FixedModel {
    fn json(body: &str) -> Self {
        Self(body.to_string())
    }
}

impl CompletionModel for FixedModel {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> std::result::Result<String, CompletionError> {
        Ok(self.0.clone())
    }
}

struct DownModel;

impl CompletionModel for DownModel {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> std::result::Result<String, CompletionError> {
        Err(CompletionError::Transient("upstream timeout".to_string()))
    }
}

/// Captures the prompt it was sent, then answers with a fixed string.
struct RecordingModel {
    sent: std::sync::Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
        }
    }
}

impl CompletionModel for &RecordingModel {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> std::result::Result<String, CompletionError> {
        self.sent.lock().unwrap().push(prompt.to_string());
        Ok("the answer".to_string())
    }
}

#[tokio::test]
async fn test_full_pipeline_with_cooperative_model() -> Result<()> {
    let model = FixedModel::json(
        r#"```json
{
  "customer_name": "J. Doe",
  "statement_date": "01/04/2024",
  "payment_due_date": "21/04/2024",
  "total_amount_due": 12345.67,
  "minimum_amount_due": 620.0,
  "credit_limit": 50000,
  "available_credit_limit": null,
  "card_number": "4281*****9388",
  "bank_name": "HDFC",
  "transactions": [
    {"date": "12/03/2024", "description": "AMAZON RETAIL", "amount": 1499.0},
    {"date": "15/03/2024", "description": "GROCERY MART", "amount": 850.25},
    {"date": "18/03/2024", "description": "REFUND STORE", "amount": -500.0}
  ],
  "reward_points_summary": {"opening_balance": 100, "earned": 50, "closing_balance": null}
}
```"#,
    );

    let pipeline = StatementPipeline::new(model);
    let record = pipeline.extract(FULL_STATEMENT).await?;

    // Pattern data wins the identity fields
    assert_eq!(record.customer_name.as_deref(), Some("John Doe"));
    assert_eq!(record.bank_name.as_deref(), Some("HDFC Bank"));
    assert_eq!(record.card_number.as_deref(), Some("4281*****9388"));

    // Model data is kept for amounts and dates
    assert_eq!(record.total_amount_due, Some(12345.67));
    assert_eq!(record.minimum_amount_due, Some(620.0));

    // Derivations repair what neither source stated directly
    assert_eq!(record.available_credit_limit, Some(50000.0 - 12345.67));
    assert_eq!(record.reward_points_summary.closing_balance, Some(150.0));

    // Equal-length transaction lists keep the model's rows
    assert_eq!(record.transactions.len(), 3);
    assert_eq!(record.transactions[2].amount, -500.0);
    Ok(())
}

#[tokio::test]
async fn test_prose_only_model_degrades_without_error() -> Result<()> {
    let model = FixedModel::json("I'm sorry, I cannot parse this document reliably.");
    let pipeline = StatementPipeline::new(model);
    let record = pipeline.extract(FULL_STATEMENT).await?;

    // Everything still comes through the pattern pass
    assert_eq!(record.customer_name.as_deref(), Some("John Doe"));
    assert_eq!(record.total_amount_due, Some(12345.67));
    assert_eq!(record.transactions.len(), 3);
    assert_eq!(record.reward_points_summary.opening_balance, Some(100.0));
    Ok(())
}

#[tokio::test]
async fn test_dead_model_still_completes_extraction() -> Result<()> {
    let pipeline = StatementPipeline::new(DownModel);
    let record = pipeline.extract(FULL_STATEMENT).await?;

    assert_eq!(record.total_amount_due, Some(12345.67));
    assert_eq!(record.available_credit_limit, Some(50000.0 - 12345.67));
    Ok(())
}

#[tokio::test]
async fn test_messy_model_output_is_repaired() -> Result<()> {
    // Bare keys, single quotes, trailing comma, leading prose
    let model = FixedModel::json(
        "Here is the data you asked for: {total_amount_due: 9999.5, bank_name: 'ICICI Bank',}",
    );
    let pipeline = StatementPipeline::new(model);
    let record = pipeline.extract("Statement Date: 02/05/2024").await?;

    assert_eq!(record.total_amount_due, Some(9999.5));
    assert_eq!(record.bank_name.as_deref(), Some("ICICI Bank"));
    assert_eq!(record.statement_date.as_deref(), Some("02/05/2024"));
    // Derived from the model-provided total
    assert_eq!(record.minimum_amount_due, Some(499.98));
    Ok(())
}

#[tokio::test]
async fn test_session_lifecycle_end_to_end() -> Result<()> {
    let store = MemorySessionStore::new();
    let grid: TableGrid = vec![
        vec![Some("Date".to_string()), Some("Amount".to_string())],
        vec![Some("12/03/2024".to_string()), Some("1499.00".to_string())],
    ];
    let session = store.put(Session::new(FULL_STATEMENT, vec![grid]).with_filename("april.pdf"));
    let id = session.id.clone();

    let pipeline = StatementPipeline::new(DownModel);
    let processed = pipeline.process_session(&store, &id).await?;
    let record = processed.record.as_ref().expect("record attached");
    assert_eq!(record.customer_name.as_deref(), Some("John Doe"));

    // Re-read observes the finalized record
    let reread = store.get(&id).expect("session still present");
    assert!(reread.record.is_some());

    let summaries = store.summaries();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].has_record);
    assert_eq!(summaries[0].filename.as_deref(), Some("april.pdf"));
    assert_eq!(summaries[0].table_count, 1);

    assert!(store.delete(&id));
    assert!(pipeline.process_session(&store, &id).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let store = MemorySessionStore::new();
    let pipeline = StatementPipeline::new(DownModel);
    let err = pipeline
        .process_session(&store, "no-such-session")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no-such-session"));
}

#[tokio::test]
async fn test_assistant_sees_reconciled_record() -> Result<()> {
    let store = MemorySessionStore::new();
    let session = store.put(Session::new(FULL_STATEMENT, Vec::new()));

    let pipeline = StatementPipeline::new(DownModel);
    let processed = pipeline.process_session(&store, &session.id).await?;

    let model = RecordingModel::new();
    let assistant = StatementAssistant::new(&model);
    let answer = assistant.ask(&processed, "what is my total due?").await?;
    assert_eq!(answer, "the answer");

    let prompts = model.sent.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("12345.67"));
    assert!(prompts[0].contains("what is my total due?"));
    Ok(())
}

#[test]
fn test_record_serializes_with_full_key_set() -> Result<()> {
    let record = extract_without_model(FULL_STATEMENT)?;
    let json = serde_json::to_value(&record)?;
    let map = json.as_object().expect("object");

    assert_eq!(map.len(), 11);
    assert!(!map["transactions"].is_null());
    assert_eq!(map["reward_points_summary"]["closing_balance"], 150.0);

    // A sparse document still yields every key, as explicit nulls
    let sparse = extract_without_model("Total Amount Due: 2,000")?;
    let json = serde_json::to_value(&sparse)?;
    assert!(json["customer_name"].is_null());
    assert!(json["transactions"].as_array().unwrap().is_empty());
    assert_eq!(json["minimum_amount_due"], 100.0);
    Ok(())
}

#[test]
fn test_round_trip_record_deserialization() -> Result<()> {
    let record = extract_without_model(FULL_STATEMENT)?;
    let json = serde_json::to_string(&record)?;
    let parsed: StatementRecord = serde_json::from_str(&json)?;
    assert_eq!(parsed, record);
    Ok(())
}
