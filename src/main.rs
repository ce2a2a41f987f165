use clap::Parser;
use todo_web::config::Config;
use todo_web::error::Result;
use todo_web::logging::LogFormat;
use todo_web::server;

#[derive(Parser, Debug)]
#[command(name = "todo-web")]
#[command(about = "Small server-rendered todo list backed by SQLite")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("TODO_WEB_GIT_SHA")))]
struct Cli {
    /// Defaults to 127.0.0.1.
    #[arg(long, env = "TODO_HOST")]
    host: Option<String>,

    /// Defaults to 5000.
    #[arg(long, env = "TODO_PORT")]
    port: Option<u16>,

    /// Defaults to `instance/todo.db` under the platform data directory.
    #[arg(long, env = "TODO_DB_PATH")]
    db: Option<String>,

    /// Signs flash-message cookies. The built-in default is only fit for development.
    #[arg(long, env = "TODO_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    #[arg(long, env = "TODO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    fn config(&self) -> Config {
        let defaults = Config::convention_defaults();
        Config {
            host: self.host.clone().unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            db_path: self.db.clone().unwrap_or(defaults.db_path),
            secret_key: self.secret_key.clone().unwrap_or(defaults.secret_key),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    todo_web::logging::init_tracing("todo_web", cli.log_format);
    let config = cli.config();

    server::run_with_shutdown(&config, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_convention_defaults() {
        let cli = Cli::try_parse_from(["todo-web", "--port", "8080", "--db", "/tmp/t.db"]).unwrap();
        let config = cli.config();
        let defaults = Config::convention_defaults();

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, "/tmp/t.db");
        assert_eq!(config.host, defaults.host);
    }

    #[test]
    fn log_format_flag_accepts_json() {
        let cli = Cli::try_parse_from(["todo-web", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
