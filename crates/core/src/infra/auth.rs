use crate::domain::error::AppError;

/// 認証プロバイダ trait（トークン検証のみ。発行・パスワード管理は外部）
pub trait AuthProvider: Send + Sync {
    /// 有効なトークンなら subject（メールアドレス等）を返す
    fn verify(&self, token: &str) -> Option<String>;

    fn name(&self) -> &str;
}

/// ログイン必須の操作用。トークンなしは "Token missing"、無効なら "Invalid token"。
pub fn require_subject(
    auth: &dyn AuthProvider,
    token: Option<&str>,
) -> Result<String, AppError> {
    let token = token.ok_or_else(|| AppError::unauthorized("Token missing"))?;
    auth.verify(token)
        .ok_or_else(|| AppError::unauthorized("Invalid token"))
}

/// NoopAuthProvider: 全トークンを無効として扱う。
/// 全クライアントが匿名扱いとなり、無料トライアル制限の対象になる。
pub struct NoopAuthProvider;

impl AuthProvider for NoopAuthProvider {
    fn verify(&self, _token: &str) -> Option<String> {
        None
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// 設定済みの共有トークン1つだけを受け付ける
pub struct StaticTokenAuth {
    token: String,
    subject: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: subject.into(),
        }
    }
}

impl AuthProvider for StaticTokenAuth {
    fn verify(&self, token: &str) -> Option<String> {
        if !self.token.is_empty() && token == self.token {
            Some(self.subject.clone())
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "static-token"
    }
}
