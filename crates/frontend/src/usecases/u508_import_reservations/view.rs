use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;
use thaw::*;
use wasm_bindgen::JsCast;

use super::api::{BatchSubmitter, HttpBatchSubmitter};
use super::controller::drive_submission;
use super::picker::{FailedRowsPicker, PickerDecision};
use super::pipeline::load_file;
use super::reconcile::{failed_rows_csv, Reconciliation, ReconciliationItem};
use super::session::{
    CloseDecision, Finished, LoadedFile, Notice, NoticeLevel, Phase, SessionError, UploadSession,
};
use super::validate::ValidationRule;
use crate::shared::config::import_config;
use crate::shared::csv_importer::browser::read_file_text;
use crate::shared::csv_importer::{is_accepted_file, row_number, Header, ImportError};
use crate::shared::export::download_csv;
use crate::shared::icons::icon;
use crate::shared::modal_stack::{CloseGuard, ModalHandle, ModalStackService};
use crate::system::auth::{use_auth, Uploader};
use contracts::usecases::u508_import_reservations::{ReservationRecord, FIELD_NOTE};

pub type SharedSubmitter = Arc<dyn BatchSubmitter + Send + Sync>;

const IMPORT_MODAL_STYLE: &str = "max-width: min(1200px, 95vw); width: min(1200px, 95vw);";
const PICKER_MODAL_STYLE: &str = "max-width: min(900px, 95vw); width: min(900px, 95vw);";
const FAILED_ROWS_FILE: &str = "reservations_failed_rows.csv";
const NOTHING_TO_SAVE: &str = "Отмеченные строки не найдены в отправленном файле, сохранять нечего";

/// Guard окна импорта: пока идёт загрузка, окно не закрывается. При первом
/// разрешённом закрытии вызывает `on_finished(changed)`, повторные закрытия
/// его уже не вызывают.
pub fn import_close_guard(
    session: ArcRwSignal<UploadSession>,
    on_finished: Callback<bool>,
) -> CloseGuard {
    Arc::new(move || match session.try_update(|s| s.request_close()) {
        Some(CloseDecision::Allow { changed }) => {
            on_finished.run(changed);
            true
        }
        Some(CloseDecision::AlreadyClosed) | None => true,
        Some(CloseDecision::Blocked) => false,
    })
}

/// Что делать окну импорта после ответа сервера
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterSubmit {
    /// Пакет отклонён целиком: закрыть окно и открыть список строк
    CloseAndPick,
    Pick,
    Stay,
}

impl AfterSubmit {
    fn of(reconciliation: &Reconciliation) -> Self {
        if reconciliation.closes_dialog() {
            AfterSubmit::CloseAndPick
        } else if reconciliation.opens_picker() {
            AfterSubmit::Pick
        } else {
            AfterSubmit::Stay
        }
    }
}

/// Открыть окно импорта в стеке модальных окон.
///
/// `on_finished` вызывается ровно один раз, когда окно закрывается по
/// запросу пользователя; аргумент: сохранилось ли хоть одно резервирование.
pub fn open_reservations_import(
    svc: ModalStackService,
    uploader: Uploader,
    submitter: SharedSubmitter,
    on_finished: Callback<bool>,
) -> ModalHandle {
    let session = ArcRwSignal::new(UploadSession::new());
    let guard = import_close_guard(session.clone(), on_finished);

    svc.push_guarded(
        Some(IMPORT_MODAL_STYLE.to_string()),
        Some("reservations-import-modal".to_string()),
        Some(guard),
        move |handle| {
            view! {
                <ImportReservationsModal
                    session=session.clone()
                    handle=handle
                    uploader=uploader.clone()
                    submitter=submitter.clone()
                />
            }
            .into_any()
        },
    )
}

/// Список отклонённых строк поверх остальных окон. Подтверждение сохраняет
/// отмеченные строки в CSV для исправления.
pub fn open_failed_rows_picker(
    svc: ModalStackService,
    file: LoadedFile,
    reconciliation: Reconciliation,
) -> ModalHandle {
    let title = format!("Строки с ошибками: {}", reconciliation.failed());
    let items = reconciliation.items;

    svc.push_guarded(
        Some(PICKER_MODAL_STYLE.to_string()),
        Some("reservations-picker-modal".to_string()),
        None,
        move |handle| {
            let header = file.header.clone();
            let records = file.records.clone();
            let notice = RwSignal::new(None::<Notice>);
            // при ошибке сохранения окно остаётся открытым
            let on_resolve = Callback::new(move |decision: PickerDecision| match decision {
                PickerDecision::Confirmed(kept) => match save_failed_rows(&header, &records, &kept) {
                    Ok(()) => handle.close(),
                    Err(e) => notice.set(Some(e)),
                },
                PickerDecision::Cancelled => handle.close(),
            });

            view! {
                <div class="reservations-picker">
                    {move || notice.get().map(|notice| view! {
                        <div class=notice_class(notice.level)>
                            <span class="warning-box__icon">"⚠"</span>
                            <span class="warning-box__text">{notice.text}</span>
                        </div>
                    })}
                    <FailedRowsPicker
                        title=title.clone()
                        items=items.clone()
                        on_resolve=on_resolve
                    />
                </div>
            }
            .into_any()
        },
    )
}

/// CSV с отмеченными строками или сообщение, почему сохранять нечего
fn failed_rows_export(
    header: &Header,
    records: &[ReservationRecord],
    kept: &[ReconciliationItem],
) -> Result<String, Notice> {
    if kept.iter().all(|item| item.index.is_none()) {
        log::warn!("No selected rows match submitted records, nothing to save");
        return Err(Notice::warning(NOTHING_TO_SAVE));
    }
    failed_rows_csv(header, records, kept).map_err(|e| {
        log::error!("Failed to build rejected rows CSV: {}", e);
        Notice::error(format!("Не удалось сформировать CSV: {}", e))
    })
}

fn save_failed_rows(
    header: &Header,
    records: &[ReservationRecord],
    kept: &[ReconciliationItem],
) -> Result<(), Notice> {
    let csv = failed_rows_export(header, records, kept)?;
    download_csv(&csv, FAILED_ROWS_FILE).map_err(|e| {
        log::error!("Failed to save rejected rows: {}", e);
        Notice::error(format!("Не удалось скачать файл: {}", e))
    })
}

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "warning-box warning-box--info",
        NoticeLevel::Success => "warning-box warning-box--success",
        NoticeLevel::Warning => "warning-box warning-box--warning",
        NoticeLevel::Error => "warning-box warning-box--error",
    }
}

/// Колонки предпросмотра: заголовок файла и вычисленный комментарий
fn preview_columns(header: &Header) -> Vec<String> {
    let mut columns: Vec<String> = header
        .iter()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if !header.contains(FIELD_NOTE) {
        columns.push(FIELD_NOTE.to_string());
    }
    columns
}

#[component]
pub fn ImportReservationsModal(
    session: ArcRwSignal<UploadSession>,
    handle: ModalHandle,
    uploader: Uploader,
    submitter: SharedSubmitter,
) -> impl IntoView {
    let config = import_config();
    let svc = use_context::<ModalStackService>()
        .expect("ModalStackService not provided in context (provide it in app root)");
    let session = RwSignal::from(session);
    let (is_reading, set_is_reading) = signal(false);

    let uploader_sv = StoredValue::new(uploader);
    let submitter_sv = StoredValue::new(submitter);
    let handle_sv = StoredValue::new(handle);

    let is_uploading = move || session.with(|s| s.phase() == Phase::Uploading);

    let show_failed_rows = move || {
        let pending = session.with_untracked(|s| s.file().cloned().zip(s.reconciliation().cloned()));
        if let Some((file, reconciliation)) = pending {
            open_failed_rows_picker(svc, file, reconciliation);
        }
    };

    let handle_file_select = move |ev: web_sys::Event| {
        let input = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok());
        let Some(input) = input else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        // тот же файл можно выбрать снова после исправления
        input.set_value("");

        let name = file.name();
        if !is_accepted_file(&name, &config.accepted_extension) {
            log::debug!("Ignoring file {} with unsupported extension", name);
            return;
        }

        let uploader = uploader_sv.get_value();
        set_is_reading.set(true);
        spawn_local(async move {
            let size = file.size() as u64;
            let loaded = match read_file_text(&file).await {
                Ok(text) => load_file(&name, size, &text, config, &uploader, Utc::now())
                    .map_err(|e| e.to_string()),
                Err(e) => Err(ImportError::Read(e).to_string()),
            };
            set_is_reading.set(false);

            session.try_update(|s| match loaded {
                Ok(file) => {
                    if let Err(SessionError::NotCollecting) = s.select_file(file) {
                        s.set_notice(Notice::warning(SessionError::NotCollecting.to_string()));
                    }
                }
                Err(e) => s.set_notice(Notice::error(e)),
            });
        });
    };

    let handle_discard = move |_| {
        session.update(|s| match s.discard_file() {
            // сессия уже показала уведомление о загрузке
            Ok(()) | Err(SessionError::AlreadyInProgress) => {}
            Err(e) => s.set_notice(Notice::warning(e.to_string())),
        });
    };

    let handle_submit = move |_| {
        let submitter = submitter_sv.get_value();
        spawn_local(async move {
            match drive_submission(&session, submitter.as_ref()).await {
                Ok(Finished::Completed(reconciliation)) => match AfterSubmit::of(&reconciliation) {
                    AfterSubmit::CloseAndPick => {
                        let file = session.with_untracked(|s| s.file().cloned());
                        handle_sv.with_value(|h| {
                            h.request_close();
                        });
                        if let Some(file) = file {
                            open_failed_rows_picker(svc, file, reconciliation);
                        }
                    }
                    AfterSubmit::Pick => show_failed_rows(),
                    AfterSubmit::Stay => {}
                },
                Ok(Finished::ReturnedToCollecting { .. }) => {}
                Err(SessionError::AlreadyInProgress) | Err(SessionError::Disposed) => {}
                Err(e) => {
                    session.try_update(|s| s.set_notice(Notice::warning(e.to_string())));
                }
            }
        });
    };

    let handle_close = move |_| {
        handle_sv.with_value(|h| {
            h.request_close();
        });
    };

    view! {
        <div class="reservations-import">
            <div class="modal-header">
                <h3 class="modal-title">"Импорт резервирований из CSV"</h3>
                <div class="modal-header-actions">
                    <Button appearance=ButtonAppearance::Secondary on_click=handle_close>
                        {icon("x")}
                        " Закрыть"
                    </Button>
                </div>
            </div>

            <div class="modal-body">
                <div class="reservations-import__filebar">
                    <label
                        class=move || if is_uploading() || is_reading.get() {
                            "button button--primary button--disabled"
                        } else {
                            "button button--primary"
                        }
                        for="reservations-file-input"
                    >
                        {icon("file")}
                        " Выбрать CSV"
                    </label>
                    <input
                        id="reservations-file-input"
                        type="file"
                        accept=format!(".{}", config.accepted_extension.trim_start_matches('.'))
                        on:change=handle_file_select
                        disabled=move || is_uploading() || is_reading.get()
                        class="hidden"
                    />
                    <a class="button button--secondary" href=config.sample_file.clone() download="">
                        {icon("download")}
                        " Пример файла"
                    </a>
                    {move || session.with(|s| match s.file() {
                        Some(file) => view! {
                            <span class="reservations-import__fileinfo">
                                <strong>{file.name.clone()}</strong>
                                {format!(" ({:.2} KB, записей: {})", file.size as f64 / 1024.0, file.records.len())}
                            </span>
                        }.into_any(),
                        None => view! {
                            <span class="reservations-import__filehint">"Файл не выбран"</span>
                        }.into_any(),
                    })}
                    <Show when=move || session.with(|s| s.phase() == Phase::Collecting && s.file().is_some())>
                        <Button appearance=ButtonAppearance::Subtle on_click=handle_discard>
                            {icon("trash")}
                            " Убрать файл"
                        </Button>
                    </Show>
                </div>

                {move || session.with(|s| s.notice().cloned()).map(|notice| view! {
                    <div class=notice_class(notice.level)>
                        <span class="warning-box__icon">"⚠"</span>
                        <span class="warning-box__text">{notice.text}</span>
                    </div>
                })}

                <Show when=move || is_reading.get()>
                    <div class="loading">"Чтение файла..."</div>
                </Show>

                {move || session.with(|s| s.file().map(|file| file.report.clone())).map(|report| {
                    if report.record_count() == 0 {
                        view! {
                            <div class="warning-box warning-box--warning">
                                <span class="warning-box__icon">"⚠"</span>
                                <span class="warning-box__text">"В файле нет ни одной записи"</span>
                            </div>
                        }.into_any()
                    } else if report.has_violations() {
                        view! {
                            <table class="table reservations-import__report">
                                <thead>
                                    <tr>
                                        <th>"Ошибка"</th>
                                        <th>"Строки"</th>
                                    </tr>
                                </thead>
                                <tbody>
                                    {report.violated().map(|(rule, _)| view! {
                                        <tr>
                                            <td>{rule.description()}</td>
                                            <td>{report.display(rule)}</td>
                                        </tr>
                                    }).collect_view()}
                                </tbody>
                            </table>
                        }.into_any()
                    } else {
                        view! {
                            <div class="warning-box warning-box--success">
                                {icon("check")}
                                <span class="warning-box__text">
                                    {format!("Ошибок нет, записей к загрузке: {}", report.record_count())}
                                </span>
                            </div>
                        }.into_any()
                    }
                })}

                {move || session.with(|s| s.file().cloned()).filter(|f| !f.records.is_empty()).map(|file| {
                    let columns = preview_columns(&file.header);
                    let shown = file.records.len().min(config.preview_rows);
                    let flagged: Vec<usize> = ValidationRule::ALL
                        .iter()
                        .flat_map(|rule| file.report.rows(*rule).iter().copied())
                        .collect();
                    view! {
                        <div class="reservations-import__preview">
                            <table class="table">
                                <thead>
                                    <tr>
                                        <th>"#"</th>
                                        {columns.iter().map(|c| view! { <th>{c.clone()}</th> }).collect_view()}
                                    </tr>
                                </thead>
                                <tbody>
                                    {file.records.iter().take(shown).enumerate().map(|(index, record)| {
                                        let number = row_number(index);
                                        let has_error = flagged.contains(&number);
                                        view! {
                                            <tr class=if has_error { "table__row table__row--error" } else { "table__row" }>
                                                <td>{number}</td>
                                                {columns.iter().map(|c| view! {
                                                    <td>{record.get(c).unwrap_or_default().to_string()}</td>
                                                }).collect_view()}
                                            </tr>
                                        }
                                    }).collect_view()}
                                </tbody>
                            </table>
                            {(file.records.len() > shown).then(|| view! {
                                <div class="reservations-import__more">
                                    {format!("Показано {} из {}", shown, file.records.len())}
                                </div>
                            })}
                        </div>
                    }
                })}

                {move || session.with(|s| s.reconciliation().cloned().map(|r| (r, s.partial()))).map(|(reconciliation, partial)| {
                    let has_failed_rows = reconciliation.opens_picker();
                    view! {
                        <div class="reservations-import__summary">
                            <span>{format!("Создано: {}", reconciliation.accepted)}</span>
                            <span>{format!(" С ошибками: {}", reconciliation.failed())}</span>
                            <Show when=move || partial>
                                <span class="reservations-import__partial">" Загружено частично"</span>
                            </Show>
                            <Show when=move || has_failed_rows>
                                <Button
                                    appearance=ButtonAppearance::Secondary
                                    on_click=move |_| show_failed_rows()
                                >
                                    {icon("alert-triangle")}
                                    " Строки с ошибками"
                                </Button>
                            </Show>
                        </div>
                    }
                })}

                <div class="reservations-import__actions">
                    <Button
                        appearance=ButtonAppearance::Primary
                        on_click=handle_submit
                        disabled=Signal::derive(move || !session.with(UploadSession::can_submit) || is_reading.get())
                    >
                        {icon("upload")}
                        {move || match session.with(|s| s.file().map(|f| f.records.len())) {
                            Some(count) => format!(" Загрузить {} строк", count),
                            None => " Загрузить".to_string(),
                        }}
                    </Button>
                    <Show when=is_uploading>
                        <Space gap=SpaceGap::Small>
                            <Spinner />
                            <span style="color: var(--color-text-tertiary);">"Загрузка..."</span>
                        </Space>
                    </Show>
                </div>
            </div>
        </div>
    }
}

/// Кнопка для заголовка страницы резервирований
#[component]
pub fn ReservationsImportButton(
    /// Вызывается после закрытия окна, если хоть одно резервирование создано
    #[prop(optional)]
    on_changed: Option<Callback<()>>,
) -> impl IntoView {
    let svc = use_context::<ModalStackService>()
        .expect("ModalStackService not provided in context (provide it in app root)");
    let auth = use_auth();

    let on_finished = Callback::new(move |changed: bool| {
        log::debug!("Reservations import closed, changed: {}", changed);
        if changed {
            if let Some(on_changed) = on_changed {
                on_changed.run(());
            }
        }
    });

    let open = move |_| {
        let (uploader, token) = auth.with_untracked(|a| {
            (
                a.user_info.as_ref().map(Uploader::from_user).unwrap_or_default(),
                a.access_token.clone(),
            )
        });
        let submitter: SharedSubmitter =
            Arc::new(HttpBatchSubmitter::from_config(import_config()).with_bearer(token));
        open_reservations_import(svc, uploader, submitter, on_finished);
    };

    view! {
        <Button appearance=ButtonAppearance::Primary on_click=open>
            {icon("upload")}
            " Импорт CSV"
        </Button>
    }
}
