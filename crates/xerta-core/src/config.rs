use std::{
    env, fs,
    path::{Path, PathBuf},
};

use sqlx::mysql::MySqlConnectOptions;

use crate::{errors::Error, Result};

/// Typed configuration, read from the process environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database: DatabaseConfig,

    // Local file inputs
    pub jokes_path: PathBuf,
    pub start_message_path: PathBuf,
}

/// Connection parameters for the MySQL server.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let host = env_str("MYSQL_HOST")
            .and_then(non_empty)
            .unwrap_or_else(|| "localhost".to_string());
        let port = env_u16("MYSQL_PORT").unwrap_or(3306);
        let username = required("MYSQL_USERNAME")?;
        let password = env_str("MYSQL_PASSWORD").unwrap_or_default();
        let database = required("MYSQL_DATABASE")?;

        Ok(Self {
            host,
            port,
            username,
            password,
            database,
        })
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TOKEN")
            .and_then(non_empty)
            .or_else(|| env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TOKEN environment variable is required".to_string())
            })?;

        let database = DatabaseConfig::from_env()?;

        let jokes_path = env_path("JOKES_PATH").unwrap_or_else(|| PathBuf::from("data/jokes.txt"));
        let start_message_path = env_path("START_MESSAGE_PATH")
            .unwrap_or_else(|| PathBuf::from("messages/start.txt"));

        Ok(Self {
            telegram_bot_token,
            database,
            jokes_path,
            start_message_path,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv(
            "# db\nMYSQL_HOST=db.local\n\nMYSQL_PASSWORD=\"p a ss\"\nnot a pair\n=nokey\nTOKEN='123:abc'\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("MYSQL_HOST".to_string(), "db.local".to_string()),
                ("MYSQL_PASSWORD".to_string(), "p a ss".to_string()),
                ("TOKEN".to_string(), "123:abc".to_string()),
            ]
        );
    }

    #[test]
    fn database_config_debug_hides_password() {
        let cfg = DatabaseConfig {
            host: "localhost".to_string(),
            port: 3306,
            username: "xerta".to_string(),
            password: "hunter2".to_string(),
            database: "xerta".to_string(),
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
