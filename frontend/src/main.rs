mod components;
mod config;
mod hooks;
mod services;

use components::{BudgetForm, BudgetResult, SpreadsheetTable};
use config::AppConfig;
use hooks::{use_budget_session, use_voice_capture};
use web_sys::{Element, HtmlTextAreaElement, ScrollBehavior, ScrollIntoViewOptions};
use yew::prelude::*;

#[function_component(App)]
fn app() -> Html {
    let config = AppConfig::from_location();
    let api = config.api_client();

    let session = use_budget_session(&api);
    let voice = use_voice_capture(config.speech, &api, session.actions.set_message.clone());

    // Reveal the freshly generated result.
    let result_anchor = use_node_ref();
    {
        let result_anchor = result_anchor.clone();
        use_effect_with(session.state.generated.clone(), move |generated| {
            if generated.is_some() {
                if let Some(element) = result_anchor.cast::<Element>() {
                    let options = ScrollIntoViewOptions::new();
                    options.set_behavior(ScrollBehavior::Smooth);
                    element.scroll_into_view_with_scroll_into_view_options(&options);
                }
            }
            || ()
        });
    }

    let on_message_input = {
        let set_message = session.actions.set_message.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            set_message.emit(input.value());
        })
    };

    let on_send = {
        let generate_from_prompt = session.actions.generate_from_prompt.clone();
        Callback::from(move |_: MouseEvent| generate_from_prompt.emit(()))
    };

    let on_voice_toggle = {
        let is_recording = voice.is_recording;
        let start = voice.start.clone();
        let stop = voice.stop.clone();
        Callback::from(move |_: MouseEvent| {
            if is_recording {
                stop.emit(());
            } else {
                start.emit(());
            }
        })
    };

    let on_show_form = {
        let open_form = session.actions.open_form.clone();
        Callback::from(move |_: MouseEvent| open_form.emit(()))
    };

    let on_form_cancel = {
        let close_form = session.actions.close_form.clone();
        Callback::from(move |_| close_form.emit(()))
    };

    html! {
        <div class="page">
            <div class="result-card">
                <h2>{"📊 AI-Generated Budget"}</h2>
                {if let Some(budget) = session.state.generated.clone() {
                    html! {
                        <BudgetResult
                            budget={budget}
                            excel_url={session.state.excel_url.clone()}
                            on_view_spreadsheet={session.actions.fetch_spreadsheet.clone()}
                        />
                    }
                } else { html! {} }}
            </div>

            <SpreadsheetTable table={session.state.sheet.clone()} />

            <div ref={result_anchor} class="result-anchor"></div>

            <div class="prompt-card">
                <textarea
                    value={session.state.message_text.clone()}
                    oninput={on_message_input}
                    placeholder="Speak or type your budget details..."
                    rows="5"
                    disabled={session.state.loading}
                />

                <button
                    class={if voice.is_recording { "btn btn-recording" } else { "btn btn-voice" }}
                    onclick={on_voice_toggle}
                    disabled={!voice.is_available}
                >
                    {if voice.is_recording { "⏹ Stop Recording" } else { "🎙 Voice Input" }}
                </button>

                <button class="btn btn-primary" onclick={on_send} disabled={session.state.loading}>
                    {if session.state.loading { "Generating..." } else { "Send" }}
                </button>
            </div>

            {if session.state.show_form {
                html! {
                    <BudgetForm
                        on_submit={session.actions.generate_from_form.clone()}
                        on_cancel={on_form_cancel}
                    />
                }
            } else {
                html! {
                    <button class="btn btn-primary show-form-btn" onclick={on_show_form}>
                        {"✏️ Fill Budget Form"}
                    </button>
                }
            }}
        </div>
    }
}

fn main() {
    yew::Renderer::<App>::new().render();
}
