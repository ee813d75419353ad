use clap::Parser;
use steptract_server::ServerConfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    steptract_server::init_tracing();
    steptract_server::run(ServerConfig::parse()).await
}
