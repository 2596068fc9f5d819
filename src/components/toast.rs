use dioxus::prelude::*;
use std::time::Duration;

const TOAST_DURATION: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

/// A transient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    id: u64,
}

/// Handle to the toast slot shared through the context
#[derive(Clone, Copy)]
pub struct Toaster {
    current: Signal<Option<Toast>>,
    next_id: Signal<u64>,
}

impl Toaster {
    pub fn success(self, message: impl Into<String>) {
        self.show(message.into(), ToastKind::Success);
    }

    pub fn failure(self, message: impl Into<String>) {
        self.show(message.into(), ToastKind::Failure);
    }

    /// `ok` selects between the two messages
    pub fn outcome(self, ok: bool, success: impl Into<String>, failure: impl Into<String>) {
        if ok {
            self.success(success);
        } else {
            self.failure(failure);
        }
    }

    fn show(mut self, message: String, kind: ToastKind) {
        let id = *self.next_id.peek() + 1;
        self.next_id.set(id);
        log::debug!("Toast {:?}: {}", kind, message);
        self.current.set(Some(Toast { message, kind, id }));

        let mut current = self.current;
        spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            // a newer toast owns the slot now
            if current.peek().as_ref().map(|t| t.id) == Some(id) {
                current.set(None);
            }
        });
    }
}

/// Provides the [`Toaster`] to all children
pub fn use_toaster_provider() -> Toaster {
    let current = use_signal(|| None::<Toast>);
    let next_id = use_signal(|| 0u64);
    use_context_provider(|| Toaster { current, next_id })
}

pub fn use_toaster() -> Toaster {
    use_context::<Toaster>()
}

#[component]
pub fn ToastHost() -> Element {
    let toaster = use_toaster();
    let current = toaster.current;

    rsx! {
        if let Some(toast) = current() {
            div {
                style: match toast.kind {
                    ToastKind::Success => "position: fixed; bottom: 90px; left: 50%; transform: translateX(-50%); padding: 12px 20px; border-radius: 24px; background: rgba(30, 30, 30, 0.9); color: #ffffff; font-size: 14px; z-index: 100;",
                    ToastKind::Failure => "position: fixed; bottom: 90px; left: 50%; transform: translateX(-50%); padding: 12px 20px; border-radius: 24px; background: rgba(180, 30, 30, 0.9); color: #ffffff; font-size: 14px; z-index: 100;",
                },
                "{toast.message}"
            }
        }
    }
}
