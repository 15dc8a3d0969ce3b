//! CPF and CNPJ check-digit validation.
//!
//! Both documents use modulo-11 check digits with fixed weights. Input may
//! carry the usual punctuation (`529.982.247-25`, `11.222.333/0001-81`);
//! it is stripped before validation and the canonical form is digits only.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CPF_LEN: usize = 11;
const CNPJ_LEN: usize = 14;

const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", content = "detail", rename_all = "snake_case")]
pub enum DocumentError {
    #[error("Document is empty")]
    Empty,
    #[error("Invalid character '{0}' in document")]
    InvalidCharacter(char),
    #[error("Document must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    InvalidLength(usize),
    #[error("Document digits cannot all be the same")]
    RepeatedDigits,
    #[error("Check digits do not match")]
    InvalidCheckDigits,
}

/// A validated CPF (individual taxpayer number), stored as 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cpf(String);

/// A validated CNPJ (company taxpayer number), stored as 14 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cnpj(String);

/// Either kind of document, as detected from the digit count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "digits", rename_all = "lowercase")]
pub enum Document {
    Cpf(Cpf),
    Cnpj(Cnpj),
}

impl Cpf {
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Formats as `000.000.000-00`.
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
    }
}

impl Cnpj {
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Formats as `00.000.000/0000-00`.
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!("{}.{}.{}/{}-{}", &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14])
    }
}

impl Document {
    pub fn digits(&self) -> &str {
        match self {
            Document::Cpf(cpf) => cpf.digits(),
            Document::Cnpj(cnpj) => cnpj.digits(),
        }
    }

    pub fn formatted(&self) -> String {
        match self {
            Document::Cpf(cpf) => cpf.formatted(),
            Document::Cnpj(cnpj) => cnpj.formatted(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Document::Cpf(_) => "cpf",
            Document::Cnpj(_) => "cnpj",
        }
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl fmt::Display for Cnpj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

/// Strips punctuation and whitespace, returning the digits as numbers.
///
/// Only `.`, `-`, `/` and whitespace are accepted as separators; anything
/// else is rejected rather than silently dropped.
pub fn normalize(input: &str) -> Result<Vec<u32>, DocumentError> {
    let mut digits = Vec::with_capacity(CNPJ_LEN);
    for c in input.chars() {
        match c {
            '.' | '-' | '/' => continue,
            c if c.is_whitespace() => continue,
            c => match c.to_digit(10) {
                Some(d) => digits.push(d),
                None => return Err(DocumentError::InvalidCharacter(c)),
            },
        }
    }
    if digits.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(digits)
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn to_string(digits: &[u32]) -> String {
    digits.iter().map(|d| char::from_digit(*d, 10).unwrap_or('0')).collect()
}

fn cpf_check_digit(digits: &[u32]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (first_weight - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest == 10 { 0 } else { rest }
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let rest = sum % 11;
    if rest < 2 { 0 } else { 11 - rest }
}

fn check_cpf_digits(digits: &[u32]) -> Result<(), DocumentError> {
    if digits.len() != CPF_LEN {
        return Err(DocumentError::InvalidLength(digits.len()));
    }
    if all_same(digits) {
        return Err(DocumentError::RepeatedDigits);
    }
    let first = cpf_check_digit(&digits[..9]);
    let second = cpf_check_digit(&digits[..10]);
    if digits[9] != first || digits[10] != second {
        return Err(DocumentError::InvalidCheckDigits);
    }
    Ok(())
}

fn check_cnpj_digits(digits: &[u32]) -> Result<(), DocumentError> {
    if digits.len() != CNPJ_LEN {
        return Err(DocumentError::InvalidLength(digits.len()));
    }
    if all_same(digits) {
        return Err(DocumentError::RepeatedDigits);
    }
    let first = cnpj_check_digit(&digits[..12], &CNPJ_WEIGHTS_FIRST);
    let second = cnpj_check_digit(&digits[..13], &CNPJ_WEIGHTS_SECOND);
    if digits[12] != first || digits[13] != second {
        return Err(DocumentError::InvalidCheckDigits);
    }
    Ok(())
}

/// Validates a CPF, with or without punctuation.
///
/// # Example
/// ```
/// let cpf = valida::validate_cpf("529.982.247-25").unwrap();
/// assert_eq!(cpf.digits(), "52998224725");
/// ```
pub fn validate_cpf(input: &str) -> Result<Cpf, DocumentError> {
    let digits = normalize(input)?;
    check_cpf_digits(&digits)?;
    Ok(Cpf(to_string(&digits)))
}

/// Validates a CNPJ, with or without punctuation.
///
/// # Example
/// ```
/// let cnpj = valida::validate_cnpj("11.222.333/0001-81").unwrap();
/// assert_eq!(cnpj.formatted(), "11.222.333/0001-81");
/// ```
pub fn validate_cnpj(input: &str) -> Result<Cnpj, DocumentError> {
    let digits = normalize(input)?;
    check_cnpj_digits(&digits)?;
    Ok(Cnpj(to_string(&digits)))
}

/// Validates either document, choosing CPF or CNPJ by digit count.
pub fn validate_document(input: &str) -> Result<Document, DocumentError> {
    let digits = normalize(input)?;
    match digits.len() {
        CPF_LEN => {
            check_cpf_digits(&digits)?;
            Ok(Document::Cpf(Cpf(to_string(&digits))))
        }
        CNPJ_LEN => {
            check_cnpj_digits(&digits)?;
            Ok(Document::Cnpj(Cnpj(to_string(&digits))))
        }
        n => Err(DocumentError::InvalidLength(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cpf_with_and_without_punctuation() {
        let plain = validate_cpf("52998224725").expect("valid cpf");
        let punctuated = validate_cpf("529.982.247-25").expect("valid cpf");
        assert_eq!(plain, punctuated);
        assert_eq!(plain.digits(), "52998224725");
        assert_eq!(plain.formatted(), "529.982.247-25");
    }

    #[test]
    fn test_cpf_wrong_check_digits() {
        assert_eq!(validate_cpf("529.982.247-26"), Err(DocumentError::InvalidCheckDigits));
        assert_eq!(validate_cpf("529.982.247-15"), Err(DocumentError::InvalidCheckDigits));
    }

    #[test]
    fn test_cpf_repeated_digits_rejected() {
        // 111.111.111-11 satisfies the checksum but is not a valid CPF
        assert_eq!(validate_cpf("111.111.111-11"), Err(DocumentError::RepeatedDigits));
        assert_eq!(validate_cpf("00000000000"), Err(DocumentError::RepeatedDigits));
    }

    #[test]
    fn test_cpf_check_digit_ten_maps_to_zero() {
        // The first check digit of 123.456.789-09 computes to 10, written as 0
        let cpf = validate_cpf("123.456.789-09").expect("valid cpf");
        assert_eq!(cpf.digits(), "12345678909");
    }

    #[test]
    fn test_valid_cnpj() {
        let cnpj = validate_cnpj("11.222.333/0001-81").expect("valid cnpj");
        assert_eq!(cnpj.digits(), "11222333000181");
        assert_eq!(cnpj.to_string(), "11.222.333/0001-81");
    }

    #[test]
    fn test_cnpj_wrong_check_digits() {
        assert_eq!(validate_cnpj("11.222.333/0001-80"), Err(DocumentError::InvalidCheckDigits));
    }

    #[test]
    fn test_cnpj_repeated_digits_rejected() {
        assert_eq!(validate_cnpj("00.000.000/0000-00"), Err(DocumentError::RepeatedDigits));
    }

    #[test]
    fn test_lengths_and_characters() {
        assert_eq!(validate_cpf("1234"), Err(DocumentError::InvalidLength(4)));
        assert_eq!(validate_cnpj("52998224725"), Err(DocumentError::InvalidLength(11)));
        assert_eq!(validate_cpf("529.982.247-2X"), Err(DocumentError::InvalidCharacter('X')));
        assert_eq!(validate_cpf(" .-/ "), Err(DocumentError::Empty));
    }

    #[test]
    fn test_validate_document_dispatches_on_length() {
        let cpf = validate_document("529.982.247-25").expect("cpf");
        assert_eq!(cpf.kind(), "cpf");
        assert_eq!(cpf.digits(), "52998224725");

        let cnpj = validate_document("11222333000181").expect("cnpj");
        assert_eq!(cnpj.kind(), "cnpj");
        assert_eq!(cnpj.formatted(), "11.222.333/0001-81");

        assert_eq!(validate_document("123456789012"), Err(DocumentError::InvalidLength(12)));
    }
}
