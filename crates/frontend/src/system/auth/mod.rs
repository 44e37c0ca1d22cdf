//! Текущий пользователь. Вход/выход и обновление токенов живут в сервисе
//! авторизации; здесь только чтение состояния из контекста.

use contracts::system::auth::UserInfo;
use leptos::prelude::*;

#[derive(Clone, Debug, Default)]
pub struct AuthState {
    pub access_token: Option<String>,
    pub user_info: Option<UserInfo>,
}

/// Hook to access auth state
pub fn use_auth() -> RwSignal<AuthState> {
    use_context::<RwSignal<AuthState>>().expect("AuthState not provided in context")
}

/// Кто загружает файл: подставляется в вычисляемый комментарий
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uploader {
    pub email: Option<String>,
    pub address: Option<String>,
}

impl Uploader {
    pub fn from_user(user: &UserInfo) -> Self {
        Self {
            email: user.email.clone(),
            address: user.address.clone(),
        }
    }

    /// Email, если указан, иначе адресный идентификатор
    pub fn contact(&self) -> &str {
        [&self.email, &self.address]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_prefers_email() {
        let uploader = Uploader {
            email: Some("ops@example.com".to_string()),
            address: Some("0xabc".to_string()),
        };
        assert_eq!(uploader.contact(), "ops@example.com");
    }

    #[test]
    fn test_contact_falls_back_to_address() {
        let uploader = Uploader {
            email: Some("  ".to_string()),
            address: Some("0xabc".to_string()),
        };
        assert_eq!(uploader.contact(), "0xabc");
        assert_eq!(Uploader::default().contact(), "");
    }
}
