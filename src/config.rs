use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,

    // OpenAI-compatible chat completions endpoint used for diet plans
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,

    pub diet_rate_limit_max: u32,
    pub diet_rate_limit_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            llm_api_url: env::var("LLM_API_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1/chat/completions".into()),
            llm_api_key: env::var("LLM_API_KEY").unwrap_or_else(|_| String::new()),
            llm_model: env::var("LLM_MODEL")
                .unwrap_or_else(|_| "qwen/qwen-2.5-72b-instruct:free".into()),

            diet_rate_limit_max: env::var("DIET_RATE_LIMIT_MAX")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            diet_rate_limit_window_secs: env::var("DIET_RATE_LIMIT_WINDOW_SECS")
                .unwrap_or_else(|_| "3600".into()) // 1 hour
                .parse()
                .unwrap_or(3600),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
