use std::{env, net::SocketAddr, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub products_path: PathBuf,
    pub ledger_path: PathBuf,
    pub export_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("EXPIRY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let path_or = |key: &str, file_name: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(file_name))
        };

        Self {
            port: lookup("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            products_path: path_or("EXPIRY_PRODUCTS_PATH", "etiquetas.csv"),
            ledger_path: path_or("EXPIRY_LEDGER_PATH", "pontuacao.csv"),
            export_path: path_or("EXPIRY_EXPORT_PATH", "produtos_validade.csv"),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_live_under_data_dir() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.products_path, PathBuf::from("data/etiquetas.csv"));
        assert_eq!(config.ledger_path, PathBuf::from("data/pontuacao.csv"));
        assert_eq!(config.export_path, PathBuf::from("data/produtos_validade.csv"));
    }

    #[test]
    fn explicit_paths_override_data_dir() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("EXPIRY_DATA_DIR", "/tmp/expiry"),
            ("EXPIRY_LEDGER_PATH", "/var/lib/score.csv"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.port, 9000);
        assert_eq!(config.products_path, PathBuf::from("/tmp/expiry/etiquetas.csv"));
        assert_eq!(config.ledger_path, PathBuf::from("/var/lib/score.csv"));
    }

    #[test]
    fn bad_port_falls_back_to_default() {
        let config = Config::from_lookup(|key| (key == "PORT").then(|| "http".to_string()));
        assert_eq!(config.port, 8080);
    }
}
