use std::rc::Rc;

use shared::{decode_workbook, BudgetSubmission, GenerationReply, SessionState, WorkbookTable};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::api::ApiClient;
use crate::services::logging::Logger;

const LOG_COMPONENT: &str = "session";

/// Actions dispatched against the session store. All state transitions go
/// through [`shared::SessionState`]; this enum is just the reducer surface.
pub enum SessionAction {
    SetMessage(String),
    OpenForm,
    CloseForm,
    Begin { id: u64 },
    Finish { id: u64, outcome: Result<GenerationReply, String> },
    SetSheet(WorkbookTable),
}

#[derive(Clone, PartialEq)]
pub struct SessionStore(pub SessionState);

impl Reducible for SessionStore {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: SessionAction) -> Rc<Self> {
        let mut next = self.0.clone();
        match action {
            SessionAction::SetMessage(text) => next.set_message(text),
            SessionAction::OpenForm => next.open_form(),
            SessionAction::CloseForm => next.close_form(),
            SessionAction::Begin { id } => next.begin_generation(id),
            SessionAction::Finish { id, outcome } => {
                if !next.finish_generation(id, outcome) {
                    Logger::warn(LOG_COMPONENT, "Dropping response for a superseded request");
                }
            }
            SessionAction::SetSheet(table) => next.set_sheet(table),
        }
        Rc::new(SessionStore(next))
    }
}

#[derive(Clone)]
pub struct UseBudgetSessionActions {
    pub set_message: Callback<String>,
    pub generate_from_prompt: Callback<()>,
    pub generate_from_form: Callback<BudgetSubmission>,
    pub fetch_spreadsheet: Callback<()>,
    pub open_form: Callback<()>,
    pub close_form: Callback<()>,
}

pub struct UseBudgetSessionResult {
    pub state: SessionState,
    pub actions: UseBudgetSessionActions,
}

/// Session controller: owns the page-session state and coordinates the remote
/// generation, transcription, and spreadsheet collaborators.
///
/// Each generation request carries a monotonic id issued here; the reducer
/// only applies the outcome matching the latest issued id, so an overlapping
/// earlier submission can never clobber a later one.
#[hook]
pub fn use_budget_session(api: &ApiClient) -> UseBudgetSessionResult {
    let store = use_reducer(|| SessionStore(SessionState::default()));
    let request_seq = use_mut_ref(|| 0u64);

    let set_message = {
        let store = store.clone();
        Callback::from(move |text: String| {
            store.dispatch(SessionAction::SetMessage(text));
        })
    };

    let generate_from_prompt = {
        let api = api.clone();
        let store = store.clone();
        let request_seq = request_seq.clone();
        Callback::from(move |_| {
            let prompt = store.0.message_text.clone();
            let id = next_request_id(&request_seq);
            store.dispatch(SessionAction::Begin { id });

            let api = api.clone();
            let store = store.clone();
            spawn_local(async move {
                let outcome = api.generate_budget(&prompt).await;
                store.dispatch(SessionAction::Finish { id, outcome });
            });
        })
    };

    let generate_from_form = {
        let api = api.clone();
        let store = store.clone();
        let request_seq = request_seq.clone();
        Callback::from(move |submission: BudgetSubmission| {
            let id = next_request_id(&request_seq);
            store.dispatch(SessionAction::Begin { id });

            let api = api.clone();
            let store = store.clone();
            spawn_local(async move {
                let outcome = api.generate_budget_from_form(&submission).await;
                store.dispatch(SessionAction::Finish { id, outcome });
            });
        })
    };

    let fetch_spreadsheet = {
        let api = api.clone();
        let store = store.clone();
        Callback::from(move |_| {
            let Some(url) = store.0.excel_url.clone() else {
                return;
            };

            let api = api.clone();
            let store = store.clone();
            spawn_local(async move {
                match api.fetch_workbook(&url).await {
                    Ok(bytes) => match decode_workbook(&bytes) {
                        Ok(table) => {
                            Logger::info(
                                LOG_COMPONENT,
                                &format!("Decoded spreadsheet with {} rows", table.rows.len()),
                            );
                            store.dispatch(SessionAction::SetSheet(table));
                        }
                        Err(e) => {
                            Logger::error(
                                LOG_COMPONENT,
                                &format!("Failed to decode workbook: {}", e),
                            );
                        }
                    },
                    Err(message) => {
                        Logger::error(
                            LOG_COMPONENT,
                            &format!("Failed to fetch workbook: {}", message),
                        );
                    }
                }
            });
        })
    };

    let open_form = {
        let store = store.clone();
        Callback::from(move |_| store.dispatch(SessionAction::OpenForm))
    };

    let close_form = {
        let store = store.clone();
        Callback::from(move |_| store.dispatch(SessionAction::CloseForm))
    };

    UseBudgetSessionResult {
        state: store.0.clone(),
        actions: UseBudgetSessionActions {
            set_message,
            generate_from_prompt,
            generate_from_form,
            fetch_spreadsheet,
            open_form,
            close_form,
        },
    }
}

fn next_request_id(seq: &Rc<std::cell::RefCell<u64>>) -> u64 {
    let mut seq = seq.borrow_mut();
    *seq += 1;
    *seq
}
