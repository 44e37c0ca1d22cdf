use crate::shared::icons::icon;
use crate::shared::modal_stack::{ModalHost, ModalStackService};
use crate::system::auth::AuthState;
use crate::usecases::u508_import_reservations::ReservationsImportButton;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    // Токен и пользователь кладутся сюда сервисом авторизации
    provide_context(RwSignal::new(AuthState::default()));

    // Provide ModalStackService for centralized modal management
    provide_context(ModalStackService::new());

    view! {
        <ReservationsPage />
        <ModalHost />
    }
}

/// Страница резервирований: список обновляется после импорта, если что-то
/// было создано.
#[component]
fn ReservationsPage() -> impl IntoView {
    let (reload_count, set_reload_count) = signal(0u32);

    let on_changed = Callback::new(move |_| {
        log::info!("Reservations changed, reloading list");
        set_reload_count.update(|n| *n += 1);
    });

    view! {
        <div class="page" id="u508_import_reservations--usecase">
            <div class="page__header">
                <h2 class="page__title">{icon("calendar-check")}" Резервирования"</h2>
                <div class="page__header-actions">
                    <ReservationsImportButton on_changed=on_changed />
                </div>
            </div>
            <div class="page__content">
                {move || match reload_count.get() {
                    0 => "Загрузите CSV, чтобы создать резервирования".to_string(),
                    n => format!("Список обновлён после импорта ({})", n),
                }}
            </div>
        </div>
    }
}
