use crate::MarketContracts;
use alloy::primitives::Address;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};
use url::Url;

/// Command line and environment configuration for the backend.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "steptract-server", version)]
#[command(about = "Listing backend for the steptract marketplace")]
pub struct ServerConfig {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    /// Port to bind.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Directory of the built frontend. Unknown paths fall back to its
    /// `index.html`.
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
    /// Supabase project URL. Without it records are kept in memory.
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<Url>,
    /// Supabase service role key.
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,
    /// Collection address written into every listing.
    #[arg(long, env = "NFT_CONTRACT_ADDRESS")]
    pub nft_contract: Option<Address>,
    /// Seaport address written into every listing.
    #[arg(long, env = "SEAPORT_CONTRACT_ADDRESS")]
    pub seaport_contract: Option<Address>,
}

impl ServerConfig {
    /// The address to listen on.
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The contract addresses stamped onto listings.
    pub const fn contracts(&self) -> MarketContracts {
        MarketContracts {
            nft_contract: self.nft_contract,
            marketplace_contract: self.seaport_contract,
        }
    }

    /// The Supabase URL and key, if both are set.
    pub fn supabase(&self) -> eyre::Result<Option<(Url, String)>> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Ok(Some((url.clone(), key.clone()))),
            (None, None) => Ok(None),
            (Some(_), None) => {
                eyre::bail!("SUPABASE_URL is set but SUPABASE_SERVICE_ROLE_KEY is not")
            }
            (None, Some(_)) => {
                eyre::bail!("SUPABASE_SERVICE_ROLE_KEY is set but SUPABASE_URL is not")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_flags() {
        let config = ServerConfig::try_parse_from([
            "steptract-server",
            "--port",
            "8080",
            "--nft-contract",
            "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0",
        ])
        .unwrap();
        assert_eq!(config.socket_addr().port(), 8080);
        assert_eq!(config.contracts().nft_contract, Some(Address::repeat_byte(0xc0)));
    }

    #[test]
    fn supabase_needs_both_settings() {
        let mut config = ServerConfig::try_parse_from(["steptract-server"]).unwrap();
        config.supabase_url = Some("https://example.supabase.co".parse().unwrap());
        config.supabase_key = None;
        assert!(config.supabase().is_err());

        config.supabase_key = Some("key".into());
        assert!(config.supabase().unwrap().is_some());
    }
}
