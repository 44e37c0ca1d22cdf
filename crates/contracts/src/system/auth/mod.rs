use serde::{Deserialize, Serialize};

/// Текущий пользователь, как его отдаёт сервис авторизации
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// Адресный идентификатор (используется, когда email не указан)
    pub address: Option<String>,
    pub is_admin: bool,
}
