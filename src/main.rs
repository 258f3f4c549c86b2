mod api;
mod cli;

use std::io;
use std::process::ExitCode;

use actix_web::{App, HttpServer, web};
use cert_ledger::{Blockchain, JsonFileStore, ServerConfig};
use clap::Parser;
use dotenvy::dotenv;
use log::{error, info};

use api::AppState;
use cli::{Cli, Command};

fn main() -> ExitCode {
    let _ = dotenv();
    env_logger::init();

    let config = ServerConfig::from_env();
    let result = match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => actix_web::rt::System::new().block_on(serve(config)),
        Command::Prove { student_id, course } => open_ledger(&config).and_then(|ledger| {
            let path = cli::save_proof(&ledger, &student_id, &course, &config.export_dir)
                .map_err(|e| io::Error::other(e.to_string()))?;
            println!("💾 Proof saved to {}", path.display());
            Ok(())
        }),
        Command::VerifyProof { path } => match cli::verify_proof_file(&path) {
            Ok(true) => {
                println!("✅ Proof VERIFIED: certificate is included under its Merkle root");
                Ok(())
            }
            Ok(false) => {
                println!("❌ Proof INVALID");
                return ExitCode::FAILURE;
            }
            Err(e) => Err(io::Error::other(e.to_string())),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn open_ledger(config: &ServerConfig) -> io::Result<Blockchain> {
    let store = JsonFileStore::new(&config.chain_file);
    let ledger = Blockchain::open(Box::new(store), config.ledger.clone())
        .map_err(|e| io::Error::other(e.to_string()))?;
    info!(
        "ledger ready: {} blocks, difficulty {}, store {}",
        ledger.len(),
        ledger.difficulty(),
        config.chain_file.display()
    );
    Ok(ledger)
}

async fn serve(config: ServerConfig) -> io::Result<()> {
    let ledger = open_ledger(&config)?;

    let host = config.host.clone();
    let port = config.port;
    println!("⛓️ Starting certificate ledger API at http://{host}:{port}");

    let state = web::Data::new(AppState::new(
        ledger,
        config.mining_timeout,
        config.export_dir.clone(),
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
