use std::fs;
use std::path::{Path, PathBuf};

use cert_ledger::{Blockchain, CertificateProof, LedgerError, StorageError};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "cert_ledger")]
#[command(about = "Append-only ledger of academic certificates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Write the inclusion proof of a mined certificate into the export directory.
    Prove { student_id: String, course: String },
    /// Check a proof file without touching the ledger.
    VerifyProof { path: PathBuf },
}

/// Save the proof for `(student_id, course)` as `dir/merkle_proof_b{b}_t{t}.json`.
pub fn save_proof(
    ledger: &Blockchain,
    student_id: &str,
    course: &str,
    dir: &Path,
) -> Result<PathBuf, LedgerError> {
    let artifact = ledger.prove(student_id, course)?;
    fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(artifact.file_name());
    artifact.write_to(&path)?;
    info!(
        "PROOF - {student_id}/{course} (block #{}, tx {}) saved to {}",
        artifact.block_index,
        artifact.tx_index,
        path.display()
    );
    Ok(path)
}

/// Read an artifact from disk and verify it.
/// A file whose leaf is not a well-formed certificate is an error, not `false`.
pub fn verify_proof_file(path: &Path) -> Result<bool, LedgerError> {
    let artifact = CertificateProof::read_from(path)?;
    Ok(artifact.verify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cert_ledger::{LedgerConfig, MemoryStore};

    fn mined_ledger() -> Blockchain {
        let config = LedgerConfig {
            difficulty: 1,
            ..LedgerConfig::default()
        };
        let mut bc = Blockchain::open(Box::new(MemoryStore::new()), config).unwrap();
        bc.submit("S1", "Alice", "Math", "A").unwrap();
        bc.submit("S2", "Bob", "Art", "B").unwrap();
        bc.mine().unwrap();
        bc
    }

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["cert_ledger"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_proof_subcommands() {
        let cli = Cli::try_parse_from(["cert_ledger", "prove", "S1", "Math"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Prove {
                student_id: "S1".into(),
                course: "Math".into()
            })
        );
        let cli = Cli::try_parse_from(["cert_ledger", "verify-proof", "p.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::VerifyProof {
                path: PathBuf::from("p.json")
            })
        );
        assert!(Cli::try_parse_from(["cert_ledger", "prove", "S1"]).is_err());
    }

    #[test]
    fn saved_proof_verifies_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let exports = dir.path().join("exports");
        let path = save_proof(&mined_ledger(), "S2", "Art", &exports).unwrap();
        assert_eq!(path, exports.join("merkle_proof_b1_t1.json"));
        assert!(verify_proof_file(&path).unwrap());
    }

    #[test]
    fn edited_proof_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_proof(&mined_ledger(), "S1", "Math", dir.path()).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        value["transaction"]["grade"] = serde_json::json!("A+");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
        assert!(!verify_proof_file(&path).unwrap());

        value["transaction"]["honors"] = serde_json::json!("summa cum laude");
        fs::write(&path, serde_json::to_vec(&value).unwrap()).unwrap();
        assert!(verify_proof_file(&path).is_err());
    }

    #[test]
    fn unknown_certificate_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_proof(&mined_ledger(), "S9", "Math", dir.path()).unwrap_err();
        assert!(matches!(err, LedgerError::CertificateNotFound { .. }));
    }
}
