use config::Config;
use sea_orm_migration::prelude::*;
use std::env;

#[tokio::main]
async fn main() {
    // DATABASE_URL wins; otherwise use the revocation database from the provider's config file
    if env::var("DATABASE_URL").is_err() {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        let url = Config::builder()
            .add_source(config::File::with_name(&path))
            .build()
            .and_then(|settings| settings.get_string("revocation.database_url"));
        match url {
            Ok(url) => env::set_var("DATABASE_URL", url),
            Err(e) => eprintln!("No revocation.database_url in {path}: {e}"),
        }
    }
    cli::run_cli(migration::Migrator).await;
}
