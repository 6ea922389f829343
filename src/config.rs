use std::env;

/// Endpoint and credential values for the two hosted backends.
///
/// Missing variables become empty strings on purpose: the backends reject
/// them with their own error messages, which the app surfaces as notices.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub openai_api_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
        }
    }
}
