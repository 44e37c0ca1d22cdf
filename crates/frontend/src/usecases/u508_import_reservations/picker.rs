use leptos::prelude::*;

use super::reconcile::ReconciliationItem;

/// Отметки строк с ошибками. По умолчанию отмечены все.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRowsSelection {
    items: Vec<ReconciliationItem>,
    selected: Vec<bool>,
}

impl FailedRowsSelection {
    pub fn new(items: Vec<ReconciliationItem>) -> Self {
        let selected = vec![true; items.len()];
        Self { items, selected }
    }

    pub fn items(&self) -> &[ReconciliationItem] {
        &self.items
    }

    pub fn is_selected(&self, position: usize) -> bool {
        self.selected.get(position).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, position: usize) {
        if let Some(flag) = self.selected.get_mut(position) {
            *flag = !*flag;
        }
    }

    pub fn set_all(&mut self, value: bool) {
        self.selected.iter_mut().for_each(|flag| *flag = value);
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|flag| **flag).count()
    }

    pub fn all_selected(&self) -> bool {
        self.selected.iter().all(|flag| *flag)
    }

    /// Отмеченные строки в исходном порядке
    pub fn confirm(&self) -> Vec<ReconciliationItem> {
        self.items
            .iter()
            .zip(&self.selected)
            .filter(|(_, flag)| **flag)
            .map(|(item, _)| item.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerDecision {
    Confirmed(Vec<ReconciliationItem>),
    Cancelled,
}

/// Список строк, которые backend не принял.
///
/// Пользователь отмечает строки, которые хочет сохранить в файл для
/// исправления. Ни подтверждение, ни отмена ничего не отправляют повторно.
#[component]
pub fn FailedRowsPicker(
    /// Заголовок окна
    title: String,
    items: Vec<ReconciliationItem>,
    on_resolve: Callback<PickerDecision>,
) -> impl IntoView {
    let selection = RwSignal::new(FailedRowsSelection::new(items));
    let rows = selection.with_untracked(|s| s.items().to_vec());

    let handle_confirm = move |_| {
        let kept = selection.with(FailedRowsSelection::confirm);
        on_resolve.run(PickerDecision::Confirmed(kept));
    };

    view! {
        <div class="picker-container">
            <div class="picker-header">
                <h3>{title}</h3>
            </div>

            <div class="picker-content">
                {if rows.is_empty() {
                    view! { <div class="picker-empty">"Нет строк с ошибками"</div> }.into_any()
                } else {
                    view! {
                        <table class="picker-table">
                            <thead>
                                <tr>
                                    <th>
                                        <input
                                            type="checkbox"
                                            prop:checked=move || selection.with(FailedRowsSelection::all_selected)
                                            on:change=move |ev| {
                                                let checked = event_target_checked(&ev);
                                                selection.update(|s| s.set_all(checked));
                                            }
                                        />
                                    </th>
                                    <th>"Строка"</th>
                                    <th>"Номер"</th>
                                    <th>"Ошибка"</th>
                                </tr>
                            </thead>
                            <tbody>
                                {rows.into_iter().enumerate().map(|(position, item)| {
                                    let row_number = item
                                        .row_number()
                                        .map(|n| n.to_string())
                                        .unwrap_or_else(|| item.key.clone());
                                    view! {
                                        <tr
                                            class="picker-row"
                                            class:selected=move || selection.with(|s| s.is_selected(position))
                                            on:click=move |_| selection.update(|s| s.toggle(position))
                                        >
                                            <td>
                                                <input
                                                    type="checkbox"
                                                    prop:checked=move || selection.with(|s| s.is_selected(position))
                                                    on:click=move |ev| ev.stop_propagation()
                                                    on:change=move |_| selection.update(|s| s.toggle(position))
                                                />
                                            </td>
                                            <td>{row_number}</td>
                                            <td>{item.row_label}</td>
                                            <td>{item.message}</td>
                                        </tr>
                                    }
                                }).collect_view()}
                            </tbody>
                        </table>
                    }.into_any()
                }}
            </div>

            <div class="picker-actions">
                <button
                    class="button button--primary"
                    on:click=handle_confirm
                    disabled=move || selection.with(|s| s.selected_count() == 0)
                >
                    {move || format!("Сохранить выбранные ({})", selection.with(FailedRowsSelection::selected_count))}
                </button>
                <button
                    class="button button--secondary"
                    on:click=move |_| on_resolve.run(PickerDecision::Cancelled)
                >
                    "Закрыть"
                </button>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, index: Option<usize>) -> ReconciliationItem {
        ReconciliationItem {
            key: key.to_string(),
            index,
            row_label: format!("N{}", key),
            message: "duplicate".to_string(),
        }
    }

    #[test]
    fn test_all_selected_by_default() {
        let selection = FailedRowsSelection::new(vec![item("0", Some(0)), item("2", Some(2))]);
        assert!(selection.all_selected());
        assert_eq!(selection.selected_count(), 2);
        assert_eq!(selection.confirm().len(), 2);
    }

    #[test]
    fn test_toggle_keeps_order() {
        let mut selection = FailedRowsSelection::new(vec![
            item("0", Some(0)),
            item("1", Some(1)),
            item("x", None),
        ]);
        selection.toggle(1);
        selection.toggle(7);

        let kept: Vec<String> = selection.confirm().into_iter().map(|i| i.key).collect();
        assert_eq!(kept, vec!["0", "x"]);
        assert!(!selection.all_selected());
    }

    #[test]
    fn test_set_all() {
        let mut selection = FailedRowsSelection::new(vec![item("0", Some(0)), item("1", Some(1))]);
        selection.set_all(false);
        assert_eq!(selection.selected_count(), 0);
        assert!(selection.confirm().is_empty());
        selection.set_all(true);
        assert!(selection.all_selected());
    }
}
