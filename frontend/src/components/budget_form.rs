use shared::{
    complete_entries, push_blank, remove_entry, update_field, BudgetSubmission, ExpenseDraft,
    ExpenseField,
};
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct BudgetFormProps {
    pub on_submit: Callback<BudgetSubmission>,
    pub on_cancel: Callback<()>,
}

/// Structured budget entry form: income, a dynamic expense list, and
/// free-text concerns. Builds the submission and hands it to the parent;
/// all network I/O stays with the session controller.
#[function_component(BudgetForm)]
pub fn budget_form(props: &BudgetFormProps) -> Html {
    let income = use_state(String::new);
    let concerns = use_state(String::new);
    let expenses = use_state(|| vec![ExpenseDraft::default()]);

    let on_income_change = {
        let income = income.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            income.set(input.value());
        })
    };

    let on_concerns_change = {
        let concerns = concerns.clone();
        Callback::from(move |e: Event| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            concerns.set(input.value());
        })
    };

    let add_expense = {
        let expenses = expenses.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*expenses).clone();
            push_blank(&mut next);
            expenses.set(next);
        })
    };

    let on_submit = {
        let income = income.clone();
        let concerns = concerns.clone();
        let expenses = expenses.clone();
        let on_submit = props.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if income.is_empty() {
                return;
            }
            on_submit.emit(BudgetSubmission {
                income: (*income).clone(),
                expenses: complete_entries(&expenses),
                concerns: (*concerns).clone(),
            });
        })
    };

    let on_cancel = {
        let on_cancel = props.on_cancel.clone();
        Callback::from(move |_: MouseEvent| on_cancel.emit(()))
    };

    html! {
        <div class="budget-form-card">
            <h2>{"📋 Enter Your Budget Details"}</h2>

            <form class="budget-form" onsubmit={on_submit}>
                <div class="form-group">
                    <label for="income">{"💰 Monthly Income"}</label>
                    <input
                        type="number"
                        id="income"
                        placeholder="Enter your monthly income"
                        value={(*income).clone()}
                        onchange={on_income_change}
                        required=true
                    />
                </div>

                <div class="form-group">
                    <label>{"💸 Expenses"}</label>
                    {for expenses.iter().enumerate().map(|(index, expense)| {
                        let on_category_change = {
                            let expenses = expenses.clone();
                            Callback::from(move |e: Event| {
                                let input: HtmlInputElement = e.target_unchecked_into();
                                let mut next = (*expenses).clone();
                                update_field(&mut next, index, ExpenseField::Category, input.value());
                                expenses.set(next);
                            })
                        };
                        let on_amount_change = {
                            let expenses = expenses.clone();
                            Callback::from(move |e: Event| {
                                let input: HtmlInputElement = e.target_unchecked_into();
                                let mut next = (*expenses).clone();
                                update_field(&mut next, index, ExpenseField::Amount, input.value());
                                expenses.set(next);
                            })
                        };
                        let on_remove = {
                            let expenses = expenses.clone();
                            Callback::from(move |_: MouseEvent| {
                                let mut next = (*expenses).clone();
                                remove_entry(&mut next, index);
                                expenses.set(next);
                            })
                        };

                        html! {
                            <div class="expense-row">
                                <input
                                    type="text"
                                    placeholder="Expense name (e.g., Rent)"
                                    value={expense.category.clone()}
                                    onchange={on_category_change}
                                    required=true
                                />
                                <input
                                    type="number"
                                    placeholder="Amount"
                                    value={expense.amount.clone()}
                                    onchange={on_amount_change}
                                    required=true
                                />
                                <button type="button" class="remove-expense-btn" onclick={on_remove}>
                                    {"❌"}
                                </button>
                            </div>
                        }
                    })}
                    <button type="button" class="add-expense-btn" onclick={add_expense}>
                        {"➕ Add Expense"}
                    </button>
                </div>

                <div class="form-group">
                    <label for="concerns">{"🔍 Financial Concerns"}</label>
                    <textarea
                        id="concerns"
                        placeholder="Any financial concerns or goals?"
                        rows="3"
                        value={(*concerns).clone()}
                        onchange={on_concerns_change}
                    />
                </div>

                <div class="form-actions">
                    <button type="button" class="btn btn-secondary" onclick={on_cancel}>
                        {"Cancel"}
                    </button>
                    <button type="submit" class="btn btn-primary">
                        {"✅ Submit Budget"}
                    </button>
                </div>
            </form>
        </div>
    }
}
