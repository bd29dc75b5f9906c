use shared::{AdviceText, GeneratedBudget};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct BudgetResultProps {
    pub budget: GeneratedBudget,
    pub excel_url: Option<String>,
    pub on_view_spreadsheet: Callback<()>,
}

/// Pure projection of a generated budget: only present fields are rendered,
/// and an `error` replaces the whole card with a message.
#[function_component(BudgetResult)]
pub fn budget_result(props: &BudgetResultProps) -> Html {
    let budget = &props.budget;

    if let Some(error) = budget.error.as_ref() {
        return html! {
            <div class="form-message error">{error}</div>
        };
    }

    let on_view = {
        let on_view_spreadsheet = props.on_view_spreadsheet.clone();
        Callback::from(move |_: MouseEvent| on_view_spreadsheet.emit(()))
    };

    html! {
        <div class="budget-result">
            {if let Some(income) = budget.income {
                html! { <p class="result-income">{format!("💰 Income: ${}", income)}</p> }
            } else { html! {} }}

            {if budget.has_expenses() {
                html! {
                    <div class="result-expenses">
                        <h3>{"💸 Expenses:"}</h3>
                        <ul>
                            {for budget.expenses.iter().flatten().map(|expense| html! {
                                <li>
                                    <span class="expense-category">{&expense.category}</span>
                                    {format!(": ${}", expense.amount)}
                                </li>
                            })}
                        </ul>
                    </div>
                }
            } else {
                html! { <p class="result-empty">{"No expenses listed."}</p> }
            }}

            {if let Some(savings) = budget.savings {
                html! { <p class="result-savings">{format!("💾 Recommended Savings: ${}", savings)}</p> }
            } else { html! {} }}

            {if let Some(concerns) = budget.concerns.as_ref() {
                advice_section("🔍 Financial Concerns:", "result-concerns", concerns)
            } else { html! {} }}

            {if let Some(advice) = budget.advice.as_ref() {
                advice_section("💡 AI Advice:", "result-advice", advice)
            } else { html! {} }}

            {if let Some(url) = props.excel_url.as_ref() {
                html! {
                    <div class="spreadsheet-actions">
                        <a href={url.clone()} download="" class="btn btn-primary">
                            {"📥 Download Excel"}
                        </a>
                        <button class="btn btn-secondary" onclick={on_view}>
                            {"📊 View Spreadsheet"}
                        </button>
                    </div>
                }
            } else { html! {} }}
        </div>
    }
}

/// Free-text sections render line by line, in original order, without
/// reinterpreting any list markup the model produced.
fn advice_section(title: &str, class: &'static str, text: &AdviceText) -> Html {
    html! {
        <div class={class}>
            <span class="section-title">{title.to_string()}</span>
            {for text.lines().map(|line| html! {
                <p class="advice-line">{line.to_string()}</p>
            })}
        </div>
    }
}
