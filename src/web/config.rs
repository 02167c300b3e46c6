use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::mssql::{DEFAULT_PORT, MssqlOptions};

/// Port on which the server runs in development; session cookies drop the
/// `Secure` flag only there.
pub const DEV_PORT: u16 = 3000;

/// Web server settings, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "sales-dashboard", version, about = "Sales dashboard web server")]
pub struct ServerConfig {
    /// HTTP port to listen on
    #[arg(env = "PORT", default_value_t = DEV_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(
        long,
        env = "BIND_ADDRESS",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub bind: IpAddr,

    /// Database server host name
    #[arg(long, env = "dbserver")]
    pub db_server: String,

    /// Database login
    #[arg(long, env = "dblogin")]
    pub db_login: String,

    /// Database password
    #[arg(long, env = "dbpasswd", hide_env_values = true)]
    pub db_password: String,

    /// Database port
    #[arg(long, env = "dbport", default_value_t = DEFAULT_PORT)]
    pub db_port: u16,

    /// Database name
    #[arg(long, env = "dbname")]
    pub db_name: String,

    /// Accept the server's TLS certificate without validation
    #[arg(
        long,
        env = "dbtrustcert",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub db_trust_server_certificate: bool,

    /// Secret used to sign session cookies
    #[arg(
        long,
        env = "cookieSecret",
        default_value = "dev",
        hide_env_values = true
    )]
    pub cookie_secret: String,

    /// Directory holding templates, stylesheets and other assets
    #[arg(long, env = "ASSETS_DIR", default_value = "assets")]
    pub assets_dir: PathBuf,
}

impl ServerConfig {
    #[must_use]
    pub fn mssql_options(&self) -> MssqlOptions {
        MssqlOptions::new(
            self.db_server.clone(),
            self.db_name.clone(),
            self.db_login.clone(),
            self.db_password.clone(),
        )
        .with_port(Some(self.db_port))
        .with_trust_server_certificate(self.db_trust_server_certificate)
        .with_application_name(env!("CARGO_PKG_NAME"))
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.port != DEV_PORT
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
