use crate::shared::modal_frame::ModalFrame;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use std::sync::Arc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::KeyboardEvent;

/// Спрашивается перед любым закрытием по инициативе пользователя
/// (подложка, Escape, кнопка "Закрыть"). `false` оставляет окно открытым.
pub type CloseGuard = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
struct ModalEntry {
    id: u64,
    builder: Arc<dyn Fn(ModalHandle) -> AnyView + Send + Sync>,
    modal_style: Option<String>,
    modal_class: Option<String>,
    guard: Option<CloseGuard>,
}

/// Handle окна из стека; клонируется в обработчики событий.
#[derive(Clone)]
pub struct ModalHandle {
    id: u64,
    svc: ModalStackService,
}

impl ModalHandle {
    /// Закрытие "как пользователь": через guard окна
    pub fn request_close(&self) -> bool {
        self.svc.request_close(self.id)
    }

    /// Закрыть без guard (программное закрытие)
    pub fn close(&self) {
        self.svc.close_deferred(self.id);
    }
}

/// Стек модальных окон приложения.
///
/// Escape и клик по подложке закрывают только верхнее окно, и только
/// если его guard это разрешает.
#[derive(Clone, Copy)]
pub struct ModalStackService {
    stack: RwSignal<Vec<ModalEntry>>,
    next_id: RwSignal<u64>,
}

impl Default for ModalStackService {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalStackService {
    pub fn new() -> Self {
        Self {
            stack: RwSignal::new(Vec::new()),
            next_id: RwSignal::new(1),
        }
    }

    pub fn is_open(&self) -> bool {
        !self.stack.get().is_empty()
    }

    /// Окно с переопределением стиля/класса поверхности и guard'ом закрытия.
    ///
    /// `builder` получает `ModalHandle`, чтобы окно могло закрыть себя.
    pub fn push_guarded<F>(
        &self,
        modal_style: Option<String>,
        modal_class: Option<String>,
        guard: Option<CloseGuard>,
        builder: F,
    ) -> ModalHandle
    where
        F: Fn(ModalHandle) -> AnyView + Send + Sync + 'static,
    {
        let id = self.next_id.get_untracked();
        self.next_id.set(id + 1);

        let handle = ModalHandle { id, svc: *self };
        let builder = Arc::new(builder) as Arc<dyn Fn(ModalHandle) -> AnyView + Send + Sync>;

        self.stack.update(|s| {
            s.push(ModalEntry {
                id,
                builder,
                modal_style,
                modal_class,
                guard,
            });
        });

        handle
    }

    /// Guard вызывается синхронно, само закрытие откладывается на следующий тик.
    pub fn request_close(&self, id: u64) -> bool {
        let guard = self.stack.with_untracked(|s| {
            s.iter()
                .find(|e| e.id == id)
                .map(|e| e.guard.clone())
        });

        let Some(guard) = guard else {
            // уже закрыто
            return false;
        };

        let allowed = guard.map(|g| g()).unwrap_or(true);
        if allowed {
            self.close_deferred(id);
        } else {
            log::debug!("Modal {} close blocked by guard", id);
        }
        allowed
    }

    pub fn request_close_top(&self) -> bool {
        let top = self.stack.with_untracked(|s| s.last().map(|e| e.id));
        match top {
            Some(id) => self.request_close(id),
            None => false,
        }
    }

    pub fn close(&self, id: u64) {
        self.stack.update(|s| {
            s.retain(|e| e.id != id);
        });
    }

    pub fn close_deferred(&self, id: u64) {
        let svc = *self;
        spawn_local(async move {
            // Следующий тик: окно не удаляется во время обработки
            // породившего закрытие DOM-события.
            TimeoutFuture::new(0).await;
            svc.close(id);
        });
    }
}

/// Рендерит стек окон в корне приложения. Монтируется ровно один раз.
#[component]
pub fn ModalHost() -> impl IntoView {
    let svc = use_context::<ModalStackService>()
        .expect("ModalStackService not provided in context (provide it in app root)");

    // Глобальный Escape: только верхнее окно
    Effect::new(move |_| {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            if let Some(keyboard_event) = event.dyn_ref::<KeyboardEvent>() {
                if keyboard_event.key() == "Escape" {
                    svc.request_close_top();
                }
            }
        }) as Box<dyn FnMut(_)>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            // ModalHost живёт всё время работы приложения
            closure.forget();
        }
    });

    view! {
        <Show when=move || svc.is_open()>
            <For
                each=move || {
                    svc.stack
                        .get()
                        .into_iter()
                        .enumerate()
                        .collect::<Vec<(usize, ModalEntry)>>()
                }
                key=|(_, entry)| entry.id
                children=move |(idx, entry)| {
                    let z_index = 1000 + idx as i32;
                    let id = entry.id;
                    let on_request_close = Callback::new(move |_| {
                        svc.request_close(id);
                    });

                    let handle = ModalHandle { id, svc };
                    let view = (entry.builder)(handle);

                    view! {
                        <ModalFrame
                            z_index=z_index
                            on_request_close=on_request_close
                            modal_style=entry.modal_style.clone().unwrap_or_default()
                            modal_class=entry.modal_class.clone().unwrap_or_default()
                        >
                            {view}
                        </ModalFrame>
                    }
                }
            />
        </Show>
    }
}
