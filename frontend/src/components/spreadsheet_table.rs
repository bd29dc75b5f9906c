use shared::WorkbookTable;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SpreadsheetTableProps {
    pub table: Option<WorkbookTable>,
}

/// Pure projection of the decoded workbook: the column set is the header row
/// of the first sheet. Renders nothing when there is nothing to show.
#[function_component(SpreadsheetTable)]
pub fn spreadsheet_table(props: &SpreadsheetTableProps) -> Html {
    let Some(table) = props.table.as_ref().filter(|table| !table.is_empty()) else {
        return html! {};
    };

    html! {
        <div class="spreadsheet-card">
            <h2>{"📄 Budget Spreadsheet"}</h2>
            <div class="table-container">
                <table class="spreadsheet-table">
                    <thead>
                        <tr>
                            {for table.headers.iter().map(|header| html! {
                                <th>{header.clone()}</th>
                            })}
                        </tr>
                    </thead>
                    <tbody>
                        {for table.rows.iter().map(|row| html! {
                            <tr>
                                {for row.cells.iter().map(|(_, value)| html! {
                                    <td>{value.clone()}</td>
                                })}
                            </tr>
                        })}
                    </tbody>
                </table>
            </div>
        </div>
    }
}
