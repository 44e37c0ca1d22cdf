use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// Overlay + позиционированная поверхность модального окна.
///
/// Заголовок и кнопки рисует содержимое. Клик по подложке вызывает
/// `on_request_close`; закроется ли окно, решает хост (guard).
#[component]
pub fn ModalFrame(
    on_request_close: Callback<()>,
    /// z-index для порядка окон в стеке
    z_index: i32,
    #[prop(optional)]
    modal_class: Option<String>,
    #[prop(optional)]
    modal_style: Option<String>,
    children: Children,
) -> impl IntoView {
    let overlay_mouse_down = RwSignal::new(false);

    let is_direct_overlay_event = |ev: &ev::MouseEvent| -> bool {
        match (ev.target(), ev.current_target()) {
            (Some(t), Some(ct)) => t == ct,
            _ => false,
        }
    };

    // Нажатие и отпускание должны быть на самой подложке: выделение текста
    // внутри окна с отпусканием снаружи окно не закрывает.
    let handle_overlay_mouse_down = move |ev: ev::MouseEvent| {
        overlay_mouse_down.set(is_direct_overlay_event(&ev));
    };

    let handle_overlay_click = move |ev: ev::MouseEvent| {
        let should_request = overlay_mouse_down.get() && is_direct_overlay_event(&ev);
        overlay_mouse_down.set(false);
        if should_request {
            // Следующий тик: подложка удаляется не во время собственного click
            spawn_local(async move {
                TimeoutFuture::new(0).await;
                on_request_close.run(());
            });
        }
    };

    let stop_propagation = move |ev: ev::MouseEvent| {
        ev.stop_propagation();
    };

    let modal_class = match modal_class {
        Some(cls) if !cls.is_empty() => format!("modal {cls}"),
        _ => "modal".to_string(),
    };
    let modal_style = match modal_style {
        Some(style) if !style.is_empty() => format!("position: relative; {style}"),
        _ => "position: relative;".to_string(),
    };

    view! {
        <div
            class="modal-overlay"
            style=format!("z-index: {z_index};")
            on:mousedown=handle_overlay_mouse_down
            on:click=handle_overlay_click
        >
            <div class=modal_class style=modal_style on:click=stop_propagation>
                {children()}
            </div>
        </div>
    }
}
