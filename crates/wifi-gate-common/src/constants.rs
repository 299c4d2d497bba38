//! Shared constants for Wifi Gate components.

/// Default HTTP listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Code comparisons allowed per verification record before it must be reset
pub const MAX_ATTEMPTS: u32 = 3;

/// Session token validity (24 hours)
pub const TOKEN_TTL_SECS: u64 = 86_400;

/// Lower bound (inclusive) of a generated verification code
pub const CODE_MIN: u32 = 100_000;

/// Upper bound (inclusive) of a generated verification code
pub const CODE_MAX: u32 = 999_999;

/// Accepted phone number lengths (digits only)
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_DIGITS: usize = 11;

/// Verification record ids: phone_{digits}
pub const RECORD_ID_PREFIX: &str = "phone_";

/// Placeholder signing secret, must be replaced in production
pub const DEFAULT_JWT_SECRET: &str = "your-secret-jwt-key-change-in-production";

/// Placeholder WiFi password
pub const DEFAULT_WIFI_PASSWORD: &str = "SenhaSeguraDaLoja2024";

/// Cookie the web client stores the session token in
pub const ACCESS_TOKEN_COOKIE: &str = "wifi_access_token";

/// Client-facing messages
pub mod messages {
    pub const CODE_SENT: &str = "Código de verificação enviado com sucesso";
    pub const VERIFIED: &str = "Verificação concluída com sucesso";
    pub const TOKEN_VALID: &str = "Token válido";
    pub const INVALID_PHONE: &str = "Número de telefone inválido. Formate como 11987654321";
    pub const MISSING_VERIFY_FIELDS: &str =
        "Número de telefone e código de verificação são obrigatórios";
    pub const MISSING_TOKEN: &str = "Token não fornecido";
    pub const INVALID_BODY: &str = "Corpo da requisição inválido";
}
