use super::ids::UserId;

/// Явная сессия вызывающего пользователя.
///
/// Передаётся в каждый вызов координаторов и сервисов вместо чтения
/// глобального состояния авторизации. Проверка подлинности выполняется
/// снаружи, до создания сессии.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    access_token: Option<String>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        self.access_token = (!token.is_empty()).then(|| token.to_string());
        self
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }
}

/// Подтверждение успешной проверки ключа администратора.
///
/// Создаётся только `AdminService::verify_admin_key`, поэтому наличие
/// значения уже означает доступ к модерации.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGrant {
    _private: (),
}

impl AdminGrant {
    pub(crate) fn issue() -> Self {
        Self { _private: () }
    }
}
