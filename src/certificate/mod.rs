pub mod artifact;
pub mod model;

pub use artifact::CertificateProof;
pub use model::Certificate;
