use std::fmt;
use std::net::IpAddr;

pub const DEFAULT_EMAIL_FROM: &str = "Zero ID <verify@zeroid.app>";
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com";

/// Settings for the long-running HTTP process. Loaded once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub trigger_token: Option<Secret>,
    pub schedule_secs: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("ZEROID_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ZEROID_HOST: {e}"))?;

        let port: u16 = env_or("ZEROID_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid ZEROID_PORT: {e}"))?;

        let log_level = env_or("ZEROID_LOG_LEVEL", "info");

        let trigger_token = std::env::var("ZEROID_TRIGGER_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .map(Secret::new);

        let schedule_secs = match std::env::var("ZEROID_SCHEDULE_SECS").ok() {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|e| format!("Invalid ZEROID_SCHEDULE_SECS: {e}"))?;
                if secs == 0 {
                    return Err("ZEROID_SCHEDULE_SECS must be greater than zero".to_string());
                }
                Some(secs)
            }
            _ => None,
        };

        Ok(ServerConfig {
            host,
            port,
            log_level,
            trigger_token,
            schedule_secs,
        })
    }
}

/// Everything one invocation of the action processor needs. Built fresh per
/// invocation and handed to the processor; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub email: Option<EmailConfig>,
    pub chain: ChainConfig,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Secret,
    pub database_id: String,
    pub job_history_collection_id: String,
    pub server_actions_collection_id: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub from: String,
    pub transport: EmailTransport,
}

#[derive(Debug, Clone)]
pub enum EmailTransport {
    Api { base_url: String, api_key: Secret },
    Smtp(SmtpConfig),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: Secret,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub contract_address: String,
    pub rpc_url: String,
    pub env: ChainEnv,
    pub signer: ChainSigner,
    pub simulate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainEnv {
    Local,
    Dev,
    Prod,
}

impl ChainEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainEnv::Local => "local",
            ChainEnv::Dev => "dev",
            ChainEnv::Prod => "prod",
        }
    }
}

impl std::str::FromStr for ChainEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(ChainEnv::Local),
            "dev" => Ok(ChainEnv::Dev),
            "prod" => Ok(ChainEnv::Prod),
            other => Err(format!(
                "Invalid CHAIN_ENV '{other}': expected one of local, dev, prod"
            )),
        }
    }
}

/// Signing identity for contract calls. A local node uses a well-known dev
/// account (`//Alice`); shared networks use a mnemonic.
#[derive(Debug, Clone)]
pub enum ChainSigner {
    DevAccount(String),
    Mnemonic(Secret),
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as
    /// missing, and every missing required key is reported in one message.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing: Vec<&str> = Vec::new();
        let mut required = |key: &'static str| -> String {
            match get(key) {
                Some(v) => v,
                None => {
                    missing.push(key);
                    String::new()
                }
            }
        };

        let endpoint = required("API_ENDPOINT");
        let project_id = required("PROJECT_ID");
        let api_key = required("API_KEY");
        let database_id = required("DATABASE_ID");
        let job_history_collection_id = required("JOB_HISTORY_COLLECTION_ID");
        let server_actions_collection_id = required("SERVER_ACTIONS_COLLECTION_ID");
        let contract_address = required("CHAIN_CONTRACT_ADDRESS");
        let rpc_url = required("CHAIN_RPC_URL");
        let chain_env_raw = required("CHAIN_ENV");

        // The signer key depends on CHAIN_ENV, so it can only be checked once
        // the env itself parsed.
        let chain_env = if chain_env_raw.is_empty() {
            None
        } else {
            Some(chain_env_raw.parse::<ChainEnv>()?)
        };

        let signer = match chain_env {
            Some(ChainEnv::Local) => get("CHAIN_KEYPAIR_ACCOUNT").map(ChainSigner::DevAccount),
            Some(_) => get("CHAIN_KEYPAIR_MNEMONIC").map(|m| ChainSigner::Mnemonic(Secret::new(m))),
            None => None,
        };
        if signer.is_none() {
            match chain_env {
                Some(ChainEnv::Local) => missing.push("CHAIN_KEYPAIR_ACCOUNT"),
                Some(_) => missing.push("CHAIN_KEYPAIR_MNEMONIC"),
                None => {}
            }
        }

        if !missing.is_empty() {
            return Err(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            ));
        }

        let (Some(env), Some(signer)) = (chain_env, signer) else {
            return Err("Missing environment variables: CHAIN_ENV".to_string());
        };

        let simulate = match get("CHAIN_SIMULATE") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| format!("Invalid CHAIN_SIMULATE '{v}': expected true or false"))?,
            None => false,
        };

        let from = get("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string());

        let transport = match get("EMAIL_API_KEY") {
            Some(api_key) => Some(EmailTransport::Api {
                base_url: get("EMAIL_API_URL")
                    .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
                api_key: Secret::new(api_key),
            }),
            None => match (
                get("SMTP_HOST"),
                get("SMTP_PORT"),
                get("SMTP_USER"),
                get("SMTP_PASS"),
            ) {
                (Some(host), Some(port), Some(user), Some(pass)) => {
                    Some(EmailTransport::Smtp(SmtpConfig {
                        host,
                        port: port
                            .parse()
                            .map_err(|e| format!("Invalid SMTP_PORT: {e}"))?,
                        user,
                        pass: Secret::new(pass),
                    }))
                }
                _ => None,
            },
        };

        Ok(Config {
            backend: BackendConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                project_id,
                api_key: Secret::new(api_key),
                database_id,
                job_history_collection_id,
                server_actions_collection_id,
            },
            email: transport.map(|transport| EmailConfig { from, transport }),
            chain: ChainConfig {
                contract_address,
                rpc_url,
                env,
                signer,
                simulate,
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
