//! Validators for Brazilian taxpayer documents (CPF/CNPJ) and password
//! strength.
//!
//! Both are pure functions with no I/O so they can be shared by the API
//! server and the admin CLI.

pub mod document;
pub mod password;

pub use document::{Cnpj, Cpf, Document, DocumentError, validate_cnpj, validate_cpf, validate_document};
pub use password::{PasswordReport, PasswordStrength, evaluate_password};
