use serde::{Deserialize, Serialize};

pub mod workbook;

pub use workbook::{decode_workbook, SheetRow, WorkbookError, WorkbookTable};

/// Fallback shown when a generation request fails without a server-provided message.
pub const GENERATION_FALLBACK_ERROR: &str = "Failed to generate budget.";

/// Fallback shown when an audio transcription request fails without a message.
pub const TRANSCRIPTION_FALLBACK_ERROR: &str = "Speech transcription failed.";

/// One editable row of the expense form. Amounts stay as the raw input string;
/// the server parses them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub category: String,
    pub amount: String,
}

impl ExpenseDraft {
    /// A draft only makes it into a submission once both fields are filled in.
    pub fn is_complete(&self) -> bool {
        !self.category.is_empty() && !self.amount.is_empty()
    }
}

/// Which field of an expense row an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Category,
    Amount,
}

/// Append one empty expense row at the end of the list.
pub fn push_blank(drafts: &mut Vec<ExpenseDraft>) {
    drafts.push(ExpenseDraft::default());
}

/// Replace the named field of the row at `index`, leaving the rest unchanged.
/// Out-of-range indices are a no-op.
pub fn update_field(drafts: &mut [ExpenseDraft], index: usize, field: ExpenseField, value: String) {
    if let Some(draft) = drafts.get_mut(index) {
        match field {
            ExpenseField::Category => draft.category = value,
            ExpenseField::Amount => draft.amount = value,
        }
    }
}

/// Delete the row at `index`, shifting later rows left. Removing the only row
/// leaves an empty list; no row is implicitly re-added. Out-of-range indices
/// are a no-op.
pub fn remove_entry(drafts: &mut Vec<ExpenseDraft>, index: usize) {
    if index < drafts.len() {
        drafts.remove(index);
    }
}

/// Keep only the drafts with both fields filled in. An all-incomplete list
/// yields an empty sequence, which is a valid submission.
pub fn complete_entries(drafts: &[ExpenseDraft]) -> Vec<ExpenseEntry> {
    drafts
        .iter()
        .filter(|draft| draft.is_complete())
        .map(|draft| ExpenseEntry {
            category: draft.category.clone(),
            amount: draft.amount.clone(),
        })
        .collect()
}

/// A complete (category, amount) pair as sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub category: String,
    pub amount: String,
}

/// Payload for form-based generation. Built once at submit time and not
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSubmission {
    pub income: String,
    pub expenses: Vec<ExpenseEntry>,
    pub concerns: String,
}

/// Payload for prompt-based generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// A free-text section of the generated budget (concerns, advice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceText {
    pub content: String,
}

impl AdviceText {
    /// The content split into lines, in original order. Rendering projects
    /// each line as its own block without reinterpreting list markup.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.content.lines()
    }
}

/// One expense line of a generated budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetExpense {
    pub category: String,
    pub amount: f64,
}

/// The budget object returned by the generation service. Every field may be
/// absent; an `error` signals a failed generation and short-circuits normal
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedBudget {
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub expenses: Option<Vec<BudgetExpense>>,
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub concerns: Option<AdviceText>,
    #[serde(default)]
    pub advice: Option<AdviceText>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GeneratedBudget {
    /// The converged error shape every failure kind reduces to.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether there is at least one expense line to render. A missing or
    /// empty list gets the "no expenses" placeholder, never an error.
    pub fn has_expenses(&self) -> bool {
        self.expenses
            .as_ref()
            .map(|expenses| !expenses.is_empty())
            .unwrap_or(false)
    }
}

/// Wire shape of a generation response, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawGenerationReply {
    #[serde(default)]
    pub budget: Option<GeneratedBudget>,
    #[serde(default)]
    pub excel_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Wire shape of a transcription response, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawTranscriptionReply {
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// An interpreted generation success: the budget plus an absolute workbook
/// URL, ready to store in session state.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReply {
    pub budget: GeneratedBudget,
    pub excel_url: Option<String>,
}

impl GenerationReply {
    /// Build the stored reply from the wire shape: a missing budget becomes
    /// an empty one, and the service-relative workbook path is joined onto
    /// the API base URL.
    pub fn from_raw(raw: RawGenerationReply, base_url: &str) -> Self {
        Self {
            budget: raw.budget.unwrap_or_default(),
            excel_url: raw
                .excel_url
                .map(|path| format!("{}{}", base_url, path)),
        }
    }
}

/// Interpret a generation response body against the shared error contract:
/// a non-2xx status and a 2xx body carrying an `error` field both fail, using
/// the payload's `error` string as the user-facing message when present.
pub fn interpret_generation_body(http_ok: bool, body: &str) -> Result<RawGenerationReply, String> {
    let reply: Option<RawGenerationReply> = serde_json::from_str(body).ok();
    let error = reply.as_ref().and_then(|reply| reply.error.clone());
    if !http_ok || error.is_some() {
        return Err(error.unwrap_or_else(|| GENERATION_FALLBACK_ERROR.to_string()));
    }
    reply.ok_or_else(|| GENERATION_FALLBACK_ERROR.to_string())
}

/// Same contract as [`interpret_generation_body`] for the transcription
/// endpoint; a success body without a `transcription` field also fails.
pub fn interpret_transcription_body(http_ok: bool, body: &str) -> Result<String, String> {
    let reply: Option<RawTranscriptionReply> = serde_json::from_str(body).ok();
    let error = reply.as_ref().and_then(|reply| reply.error.clone());
    if !http_ok || error.is_some() {
        return Err(error.unwrap_or_else(|| TRANSCRIPTION_FALLBACK_ERROR.to_string()));
    }
    reply
        .and_then(|reply| reply.transcription)
        .ok_or_else(|| TRANSCRIPTION_FALLBACK_ERROR.to_string())
}

/// Page-session state, owned by the session controller and mutated only
/// through these transitions. Nothing here survives a reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub message_text: String,
    pub loading: bool,
    pub generated: Option<GeneratedBudget>,
    pub excel_url: Option<String>,
    pub sheet: Option<WorkbookTable>,
    pub show_form: bool,
    pub active_request: Option<u64>,
}

impl SessionState {
    pub fn set_message(&mut self, text: String) {
        self.message_text = text;
    }

    pub fn open_form(&mut self) {
        self.show_form = true;
    }

    pub fn close_form(&mut self) {
        self.show_form = false;
    }

    /// Start a generation request: prior result, workbook URL, and decoded
    /// sheet are cleared before the request goes out, and `id` becomes the
    /// only request whose outcome may apply.
    pub fn begin_generation(&mut self, id: u64) {
        self.generated = None;
        self.excel_url = None;
        self.sheet = None;
        self.loading = true;
        self.active_request = Some(id);
    }

    /// Apply a finished generation request. Outcomes for anything other than
    /// the active request are dropped, so an overlapping earlier submission
    /// can never clobber a later one. Returns whether the outcome applied.
    ///
    /// Every exit path of a request (success, error payload, transport
    /// failure, timeout) funnels through here, so `loading` is released on
    /// every path.
    pub fn finish_generation(&mut self, id: u64, outcome: Result<GenerationReply, String>) -> bool {
        if self.active_request != Some(id) {
            return false;
        }
        match outcome {
            Ok(reply) => {
                self.generated = Some(reply.budget);
                self.excel_url = reply.excel_url;
                self.message_text.clear();
            }
            Err(message) => {
                self.generated = Some(GeneratedBudget::from_error(message));
                self.excel_url = None;
            }
        }
        self.loading = false;
        self.show_form = false;
        self.active_request = None;
        true
    }

    /// Replace the decoded sheet wholesale after a successful fetch+decode.
    pub fn set_sheet(&mut self, table: WorkbookTable) {
        self.sheet = Some(table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(category: &str, amount: &str) -> ExpenseDraft {
        ExpenseDraft {
            category: category.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_push_blank_appends_empty_row() {
        let mut drafts = vec![draft("Rent", "500")];
        push_blank(&mut drafts);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1], ExpenseDraft::default());
    }

    #[test]
    fn test_update_field_replaces_only_named_field() {
        let mut drafts = vec![draft("Rent", "500"), draft("Food", "200")];
        update_field(&mut drafts, 1, ExpenseField::Amount, "250".to_string());
        assert_eq!(drafts[1], draft("Food", "250"));
        assert_eq!(drafts[0], draft("Rent", "500"));

        update_field(&mut drafts, 0, ExpenseField::Category, "Mortgage".to_string());
        assert_eq!(drafts[0], draft("Mortgage", "500"));
    }

    #[test]
    fn test_update_field_out_of_range_is_noop() {
        let mut drafts = vec![draft("Rent", "500")];
        update_field(&mut drafts, 5, ExpenseField::Category, "Food".to_string());
        assert_eq!(drafts, vec![draft("Rent", "500")]);
    }

    #[test]
    fn test_remove_entry_preserves_relative_order() {
        let mut drafts = vec![draft("Rent", "500"), draft("Food", "200"), draft("Gas", "80")];
        remove_entry(&mut drafts, 1);
        assert_eq!(drafts, vec![draft("Rent", "500"), draft("Gas", "80")]);
    }

    #[test]
    fn test_remove_only_entry_leaves_empty_list() {
        let mut drafts = vec![draft("Rent", "500")];
        remove_entry(&mut drafts, 0);
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_remove_entry_out_of_range_is_noop() {
        let mut drafts = vec![draft("Rent", "500")];
        remove_entry(&mut drafts, 3);
        assert_eq!(drafts.len(), 1);
    }

    #[test]
    fn test_complete_entries_filters_incomplete_drafts() {
        let drafts = vec![
            draft("Rent", "500"),
            draft("", "200"),
            draft("Food", ""),
            draft("Gas", "80"),
        ];
        let entries = complete_entries(&drafts);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, "Rent");
        assert_eq!(entries[1].category, "Gas");
    }

    #[test]
    fn test_all_incomplete_drafts_yield_empty_submission() {
        let drafts = vec![draft("", ""), draft("Rent", ""), draft("", "500")];
        assert!(complete_entries(&drafts).is_empty());
    }

    #[test]
    fn test_interpret_generation_success() {
        let body = r#"{"budget":{"income":1000,"expenses":[{"category":"Rent","amount":500}]},"excel_url":"/f.xlsx"}"#;
        let reply = interpret_generation_body(true, body).unwrap();
        let budget = reply.budget.unwrap();
        assert_eq!(budget.income, Some(1000.0));
        assert_eq!(budget.expenses.as_ref().unwrap()[0].category, "Rent");
        assert_eq!(budget.expenses.as_ref().unwrap()[0].amount, 500.0);
        assert_eq!(reply.excel_url.as_deref(), Some("/f.xlsx"));
    }

    #[test]
    fn test_interpret_generation_error_status_uses_payload_message() {
        let outcome = interpret_generation_body(false, r#"{"error":"bad prompt"}"#);
        assert_eq!(outcome, Err("bad prompt".to_string()));
    }

    #[test]
    fn test_interpret_generation_ok_status_with_error_field_fails() {
        let outcome = interpret_generation_body(true, r#"{"error":"model overloaded"}"#);
        assert_eq!(outcome, Err("model overloaded".to_string()));
    }

    #[test]
    fn test_interpret_generation_malformed_body_falls_back() {
        let outcome = interpret_generation_body(false, "<html>gateway error</html>");
        assert_eq!(outcome, Err(GENERATION_FALLBACK_ERROR.to_string()));
    }

    #[test]
    fn test_interpret_generation_tolerates_missing_budget() {
        let reply = interpret_generation_body(true, r#"{"excel_url":"/f.xlsx"}"#).unwrap();
        assert!(reply.budget.is_none());
        assert_eq!(reply.excel_url.as_deref(), Some("/f.xlsx"));
    }

    #[test]
    fn test_interpret_transcription_success() {
        let body = r#"{"transcription":"I earn 3000 a month"}"#;
        let text = interpret_transcription_body(true, body).unwrap();
        assert_eq!(text, "I earn 3000 a month");
    }

    #[test]
    fn test_interpret_transcription_missing_field_fails() {
        let outcome = interpret_transcription_body(true, "{}");
        assert_eq!(outcome, Err(TRANSCRIPTION_FALLBACK_ERROR.to_string()));
    }

    #[test]
    fn test_interpret_transcription_error_field_fails() {
        let outcome = interpret_transcription_body(true, r#"{"error":"no speech detected"}"#);
        assert_eq!(outcome, Err("no speech detected".to_string()));
    }

    #[test]
    fn test_generation_reply_absolutizes_workbook_url() {
        let raw = interpret_generation_body(
            true,
            r#"{"budget":{"income":1000},"excel_url":"/f.xlsx"}"#,
        )
        .unwrap();
        let reply = GenerationReply::from_raw(raw, "https://api.test");
        assert_eq!(reply.excel_url.as_deref(), Some("https://api.test/f.xlsx"));
        assert_eq!(reply.budget.income, Some(1000.0));
    }

    #[test]
    fn test_generation_reply_defaults_missing_budget() {
        let reply = GenerationReply::from_raw(RawGenerationReply::default(), "https://api.test");
        assert_eq!(reply.budget, GeneratedBudget::default());
        assert!(reply.excel_url.is_none());
    }

    #[test]
    fn test_generated_budget_from_error_shape() {
        let budget = GeneratedBudget::from_error("bad prompt");
        assert_eq!(budget.error.as_deref(), Some("bad prompt"));
        assert!(budget.income.is_none());
        assert!(budget.expenses.is_none());
        assert!(budget.savings.is_none());
    }

    #[test]
    fn test_has_expenses_tolerates_absent_and_empty_lists() {
        assert!(!GeneratedBudget::default().has_expenses());

        let empty = GeneratedBudget {
            expenses: Some(Vec::new()),
            ..GeneratedBudget::default()
        };
        assert!(!empty.has_expenses());

        let listed = GeneratedBudget {
            expenses: Some(vec![BudgetExpense {
                category: "Rent".to_string(),
                amount: 500.0,
            }]),
            ..GeneratedBudget::default()
        };
        assert!(listed.has_expenses());
    }

    #[test]
    fn test_advice_lines_preserve_order() {
        let advice = AdviceText {
            content: "1. Save more\n2. Spend less\n3. Track everything".to_string(),
        };
        let lines: Vec<&str> = advice.lines().collect();
        assert_eq!(lines, vec!["1. Save more", "2. Spend less", "3. Track everything"]);
    }

    fn reply(income: f64, url: &str) -> GenerationReply {
        GenerationReply {
            budget: GeneratedBudget {
                income: Some(income),
                ..GeneratedBudget::default()
            },
            excel_url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_begin_generation_clears_prior_result() {
        let mut state = SessionState::default();
        state.begin_generation(1);
        assert!(state.finish_generation(1, Ok(reply(1000.0, "https://api.test/f.xlsx"))));
        state.set_sheet(WorkbookTable::from_rows(vec![vec!["A".to_string()]]));

        state.begin_generation(2);
        assert!(state.generated.is_none());
        assert!(state.excel_url.is_none());
        assert!(state.sheet.is_none());
        assert!(state.loading);
        assert_eq!(state.active_request, Some(2));
    }

    #[test]
    fn test_finish_generation_success_stores_result() {
        let mut state = SessionState {
            message_text: "I earn 1000".to_string(),
            ..SessionState::default()
        };
        state.begin_generation(1);
        assert!(state.finish_generation(1, Ok(reply(1000.0, "https://api.test/f.xlsx"))));

        assert_eq!(state.generated.as_ref().unwrap().income, Some(1000.0));
        assert_eq!(state.excel_url.as_deref(), Some("https://api.test/f.xlsx"));
        assert!(state.message_text.is_empty());
        assert!(!state.loading);
        assert!(!state.show_form);
        assert!(state.active_request.is_none());
    }

    #[test]
    fn test_finish_generation_error_converges_to_error_budget() {
        let mut state = SessionState::default();
        state.begin_generation(1);
        assert!(state.finish_generation(1, Err("bad prompt".to_string())));

        assert_eq!(state.generated, Some(GeneratedBudget::from_error("bad prompt")));
        assert!(state.excel_url.is_none());
        assert!(!state.loading);
    }

    #[test]
    fn test_finish_generation_keeps_input_on_failure() {
        let mut state = SessionState {
            message_text: "I earn 1000".to_string(),
            ..SessionState::default()
        };
        state.begin_generation(1);
        state.finish_generation(1, Err("bad prompt".to_string()));
        assert_eq!(state.message_text, "I earn 1000");
    }

    #[test]
    fn test_stale_finish_is_dropped() {
        let mut state = SessionState::default();
        state.begin_generation(1);
        state.begin_generation(2);

        // The first request resolves late; its outcome must not apply.
        assert!(!state.finish_generation(1, Ok(reply(1.0, "https://api.test/old.xlsx"))));
        assert!(state.generated.is_none());
        assert!(state.loading);

        assert!(state.finish_generation(2, Ok(reply(2.0, "https://api.test/new.xlsx"))));
        assert_eq!(state.generated.as_ref().unwrap().income, Some(2.0));
        assert!(!state.loading);
    }

    #[test]
    fn test_finish_without_begin_is_dropped() {
        let mut state = SessionState::default();
        assert!(!state.finish_generation(7, Err("late".to_string())));
        assert!(state.generated.is_none());
    }
}
