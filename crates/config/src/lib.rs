//! Typed configuration, sourced from environment variables (spec §6).
//!
//! Each `from_env` reads `std::env` directly rather than going through a
//! generic deserializer, so a missing or malformed key reports exactly
//! which variable is at fault — the same "fail loud at the process
//! boundary" shape §7's `ConfigurationError` propagation policy calls for.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use justifai_chain::contract::ContractType;
use justifai_errors::{Error, Result};

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::configuration(format!("missing required environment variable {key}")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn optional_parsed<T: FromStr>(key: &str) -> Result<Option<T>> {
    match optional(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::configuration(format!("invalid value for {key}: {raw:?}"))),
    }
}

fn parsed_with_default<T: FromStr>(key: &str, default: T) -> Result<T> {
    Ok(optional_parsed(key)?.unwrap_or(default))
}

/// Polling-interval values accept either a plain millisecond integer (the
/// wire format the spec describes) or a humantime duration string
/// (`"500ms"`, `"2s"`) for operator convenience on the command line.
fn parse_duration_ms(key: &str, default_ms: u64) -> Result<Duration> {
    match optional(key) {
        None => Ok(Duration::from_millis(default_ms)),
        Some(raw) => {
            if let Ok(ms) = raw.parse::<u64>() {
                return Ok(Duration::from_millis(ms));
            }
            humantime::parse_duration(&raw)
                .map_err(|e| Error::configuration(format!("invalid duration for {key} ({raw:?}): {e}")))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageDriver {
    Local,
    S3,
}

impl FromStr for StorageDriver {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(StorageDriver::Local),
            "s3" => Ok(StorageDriver::S3),
            other => Err(Error::configuration(format!(
                "unknown STORAGE_DRIVER {other:?}, expected local|s3"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub driver: StorageDriver,
    pub storage_path: Option<String>,
    pub s3_bucket_name: Option<String>,
    pub aws_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PollingConfig {
    pub job_interval: Duration,
    pub mri_interval: Duration,
    pub mru_interval: Duration,
    pub qr_interval: Duration,
    pub pdf_augment_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ChainEnvConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub anchorstore_address: String,
    pub contract_type: ContractType,
    pub chain_id: u64,
    pub min_priority_fee_gwei: u64,
    pub min_max_fee_gwei: Option<u64>,
    /// Shown in `verifyTransaction`'s `explorerUrl` (§4.7); `None` suppresses it.
    pub explorer_base_url: Option<String>,
    pub network_name: String,
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub verify_base_url: Option<String>,
    pub verify_qr_base_url: Option<String>,
    pub issuer_public_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrStyle {
    Classic,
    Dark,
    Transparent,
}

impl FromStr for QrStyle {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "classic" => Ok(QrStyle::Classic),
            "dark" => Ok(QrStyle::Dark),
            "transparent" => Ok(QrStyle::Transparent),
            other => Err(Error::configuration(format!(
                "unknown QR_STYLE {other:?}, expected classic|dark|transparent"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QrRenderConfig {
    pub png_width: u32,
    pub pdf_png_width: u32,
    pub margin: u32,
    pub dark_color: Option<String>,
    pub light_color: Option<String>,
    pub style: QrStyle,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub polling: PollingConfig,
    pub pdf_concurrency: usize,
    pub chain: ChainEnvConfig,
    pub verification: VerificationConfig,
    pub qr_render: QrRenderConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let driver = optional("STORAGE_DRIVER")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(StorageDriver::Local);
        let storage = StorageConfig {
            driver,
            storage_path: optional("STORAGE_PATH"),
            s3_bucket_name: optional("S3_BUCKET_NAME"),
            aws_endpoint: optional("AWS_ENDPOINT"),
        };
        if matches!(storage.driver, StorageDriver::S3) && storage.s3_bucket_name.is_none() {
            return Err(Error::configuration("S3_BUCKET_NAME is required when STORAGE_DRIVER=s3"));
        }

        let polling = PollingConfig {
            job_interval: parse_duration_ms("JOB_POLL_INTERVAL_MS", 2_000)?,
            mri_interval: parse_duration_ms("MRI_POLL_INTERVAL_MS", 5_000)?,
            mru_interval: parse_duration_ms("MRU_POLL_INTERVAL_MS", 10_000)?,
            qr_interval: parse_duration_ms("QR_POLL_INTERVAL_MS", 2_000)?,
            pdf_augment_interval: parse_duration_ms("PDF_AUGMENT_POLL_INTERVAL_MS", 2_000)?,
        };

        let pdf_concurrency = parsed_with_default("PDF_CONCURRENCY", 2usize)?;

        let contract_type = optional("CONTRACT_TYPE")
            .map(|s| s.parse::<ContractType>())
            .transpose()
            .map_err(|_| Error::configuration("invalid CONTRACT_TYPE"))?
            .unwrap_or(ContractType::EmitOnly);

        let chain = ChainEnvConfig {
            rpc_url: required("RPC_URL")?,
            private_key: required("PRIVATE_KEY")?,
            anchorstore_address: required("ANCHORSTORE_ADDRESS")?,
            contract_type,
            chain_id: parsed_with_default("CHAIN_ID", 80_002u64)?,
            min_priority_fee_gwei: parsed_with_default("MIN_PRIORITY_FEE_GWEI", 25u64)?,
            min_max_fee_gwei: optional_parsed("MIN_MAX_FEE_GWEI")?,
            explorer_base_url: optional("EXPLORER_BASE_URL"),
            network_name: optional("NETWORK_NAME").unwrap_or_else(|| "polygon-amoy".to_string()),
        };

        let verification = VerificationConfig {
            verify_base_url: optional("VERIFY_BASE_URL"),
            verify_qr_base_url: optional("VERIFY_QR_BASE_URL"),
            issuer_public_key: optional("ISSUER_PUBLIC_KEY"),
        };

        let style = optional("QR_STYLE")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(QrStyle::Classic);
        let qr_render = QrRenderConfig {
            png_width: parsed_with_default("QR_PNG_WIDTH", 768u32)?,
            pdf_png_width: parsed_with_default("QR_PDF_PNG_WIDTH", 1536u32)?,
            margin: parsed_with_default("QR_MARGIN", 8u32)?,
            dark_color: optional("QR_DARK_COLOR"),
            light_color: optional("QR_LIGHT_COLOR"),
            style,
        };

        Ok(Config {
            storage,
            polling,
            pdf_concurrency,
            chain,
            verification,
            qr_render,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that touch
    // them so they don't interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_all() {
        for key in [
            "STORAGE_DRIVER", "STORAGE_PATH", "S3_BUCKET_NAME", "AWS_ENDPOINT",
            "JOB_POLL_INTERVAL_MS", "MRI_POLL_INTERVAL_MS", "MRU_POLL_INTERVAL_MS",
            "QR_POLL_INTERVAL_MS", "PDF_AUGMENT_POLL_INTERVAL_MS", "PDF_CONCURRENCY",
            "RPC_URL", "PRIVATE_KEY", "ANCHORSTORE_ADDRESS", "CONTRACT_TYPE", "CHAIN_ID",
            "MIN_PRIORITY_FEE_GWEI", "MIN_MAX_FEE_GWEI", "EXPLORER_BASE_URL", "NETWORK_NAME", "VERIFY_BASE_URL",
            "VERIFY_QR_BASE_URL", "ISSUER_PUBLIC_KEY", "QR_PNG_WIDTH", "QR_PDF_PNG_WIDTH",
            "QR_MARGIN", "QR_DARK_COLOR", "QR_LIGHT_COLOR", "QR_STYLE",
        ] {
            env::remove_var(key);
        }
    }

    fn set_required_chain_vars() {
        env::set_var("RPC_URL", "https://rpc.example/v1");
        env::set_var("PRIVATE_KEY", "0x".to_string() + &"11".repeat(32));
        env::set_var("ANCHORSTORE_ADDRESS", "0x".to_string() + &"22".repeat(20));
    }

    #[test]
    fn from_env_fails_without_required_chain_vars() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn from_env_applies_defaults_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        set_required_chain_vars();

        let config = Config::from_env().unwrap();
        assert_eq!(config.pdf_concurrency, 2);
        assert_eq!(config.qr_render.png_width, 768);
        assert_eq!(config.qr_render.style, QrStyle::Classic);
        assert!(matches!(config.storage.driver, StorageDriver::Local));
        clear_all();
    }

    #[test]
    fn from_env_rejects_s3_driver_without_bucket_name() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        set_required_chain_vars();
        env::set_var("STORAGE_DRIVER", "s3");

        let result = Config::from_env();
        assert!(result.is_err());
        clear_all();
    }

    #[test]
    fn duration_accepts_either_plain_ms_or_humantime_string() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_all();
        set_required_chain_vars();
        env::set_var("JOB_POLL_INTERVAL_MS", "1500");
        env::set_var("MRI_POLL_INTERVAL_MS", "3s");

        let config = Config::from_env().unwrap();
        assert_eq!(config.polling.job_interval, Duration::from_millis(1500));
        assert_eq!(config.polling.mri_interval, Duration::from_secs(3));
        clear_all();
    }
}
