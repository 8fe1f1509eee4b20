//! Validação de CPF (Cadastro de Pessoas Físicas)
//!
//! O validador é puro: recebe uma string qualquer e devolve `bool` (ou o CPF
//! formatado). Entradas malformadas nunca viram erro para o chamador, porque
//! a validação controla fluxos de conversa que precisam continuar (pedir o
//! CPF de novo) em vez de quebrar.
//!
//! Diagnósticos saem por um [`DiagnosticSink`] injetado. O padrão é
//! [`TracingSink`], que emite eventos `tracing` sem bloquear.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Quantidade de dígitos de um CPF
pub const CPF_LEN: usize = 11;

/// Máscara usada quando sobram menos de 5 dígitos
pub const SHORT_MASK: &str = "***";

const MIDDLE_MASK: &str = "****";

/// Motivos pelos quais uma string não é um CPF
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpfError {
    #[error("CPF vazio")]
    Empty,

    #[error("CPF deve ter 11 dígitos, encontrados {0}")]
    InvalidLength(usize),

    #[error("CPF com todos os dígitos iguais")]
    RepeatedDigits,

    #[error("dígito verificador {position} inválido: esperado {expected}, encontrado {found}")]
    CheckDigitMismatch { position: usize, expected: u32, found: u32 },

    /// Falha interna: a sequência limpa tem um numeral fora de `0-9`
    #[error("caractere não numérico '{character}' na posição {position}")]
    NonDigit { position: usize, character: char },
}

impl CpfError {
    /// Falhas internas (não deveriam ocorrer) são logadas como erro;
    /// o resto é só um CPF inválido
    pub fn is_internal(&self) -> bool {
        matches!(self, CpfError::NonDigit { .. })
    }
}

/// CPF já validado, guardado como os 11 dígitos limpos
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpf([u8; CPF_LEN]);

impl Cpf {
    /// Os 11 dígitos, sem formatação
    pub fn digits(&self) -> String {
        self.0.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Versão mascarada para logs
    pub fn masked(&self) -> String {
        mask(&self.digits())
    }
}

impl FromStr for Cpf {
    type Err = CpfError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(CpfError::Empty);
        }

        let clean = clean_cpf(input);
        let len = clean.chars().count();
        if len != CPF_LEN {
            return Err(CpfError::InvalidLength(len));
        }

        let mut digits = [0u8; CPF_LEN];
        for (position, character) in clean.chars().enumerate() {
            let digit = character
                .to_digit(10)
                .ok_or(CpfError::NonDigit { position, character })?;
            digits[position] = digit as u8;
        }

        if digits.iter().all(|d| *d == digits[0]) {
            return Err(CpfError::RepeatedDigits);
        }

        for position in [9, 10] {
            let expected = check_digit(&digits[..position]);
            let found = u32::from(digits[position]);
            if expected != found {
                return Err(CpfError::CheckDigitMismatch {
                    position: position + 1,
                    expected,
                    found,
                });
            }
        }

        Ok(Cpf(digits))
    }
}

impl fmt::Display for Cpf {
    /// Formato canônico `XXX.XXX.XXX-XX`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.digits();
        write!(f, "{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..])
    }
}

/// Dígito verificador sobre `digits` com pesos decrescentes terminando em 2
fn check_digit(digits: &[u8]) -> u32 {
    let first_weight = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * (first_weight - i as u32))
        .sum();

    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Remove tudo que não é numeral
///
/// Numerais Unicode (ex.: `٣`) contam como dígitos para o tamanho, mas só
/// `0-9` são aceitos na validação.
pub fn clean_cpf(input: &str) -> String {
    input.chars().filter(|c| c.is_numeric()).collect()
}

/// Mascara um CPF para logs: 3 primeiros e 2 últimos dígitos
///
/// Com menos de 5 dígitos devolve sempre [`SHORT_MASK`], para não vazar
/// fragmentos curtos.
pub fn mask(input: &str) -> String {
    let clean: Vec<char> = clean_cpf(input).chars().collect();
    if clean.len() >= 5 {
        let head: String = clean[..3].iter().collect();
        let tail: String = clean[clean.len() - 2..].iter().collect();
        format!("{}{}{}", head, MIDDLE_MASK, tail)
    } else {
        SHORT_MASK.to_string()
    }
}

/// Nível de um registro de diagnóstico
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Registro emitido pelo validador
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: &'static str,
    pub cpf_masked: String,
    pub is_valid: bool,
    pub error: Option<String>,
}

/// Destino dos diagnósticos do validador
///
/// Implementações não podem bloquear nem falhar de forma visível:
/// o resultado da validação não depende delas.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Sink padrão: eventos `tracing` com os campos estruturados
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, d: &Diagnostic) {
        match d.level {
            DiagnosticLevel::Debug => debug!(
                cpf_masked = %d.cpf_masked, is_valid = d.is_valid, error = ?d.error, "{}", d.message
            ),
            DiagnosticLevel::Info => info!(
                cpf_masked = %d.cpf_masked, is_valid = d.is_valid, error = ?d.error, "{}", d.message
            ),
            DiagnosticLevel::Warn => warn!(
                cpf_masked = %d.cpf_masked, is_valid = d.is_valid, error = ?d.error, "{}", d.message
            ),
            DiagnosticLevel::Error => error!(
                cpf_masked = %d.cpf_masked, is_valid = d.is_valid, error = ?d.error, "{}", d.message
            ),
        }
    }
}

/// Sink que descarta tudo, para quem trata os diagnósticos por conta própria
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Serviço de validação de CPF
#[derive(Debug, Clone, Default)]
pub struct CpfValidator<S = TracingSink> {
    sink: S,
}

impl CpfValidator<TracingSink> {
    pub fn new() -> Self {
        Self { sink: TracingSink }
    }
}

impl<S: DiagnosticSink> CpfValidator<S> {
    pub fn with_sink(sink: S) -> Self {
        Self { sink }
    }

    /// Valida e devolve o CPF tipado, ou `None`
    pub fn parse(&self, input: Option<&str>) -> Option<Cpf> {
        let input = match input {
            Some(s) if !s.is_empty() => s,
            _ => return None,
        };

        match input.parse::<Cpf>() {
            Ok(cpf) => {
                self.emit(DiagnosticLevel::Debug, "CPF validation performed", input, true, None);
                Some(cpf)
            }
            Err(e) if e.is_internal() => {
                self.emit(
                    DiagnosticLevel::Error,
                    "Error during CPF validation",
                    input,
                    false,
                    Some(e.to_string()),
                );
                None
            }
            Err(_) => {
                self.emit(DiagnosticLevel::Debug, "CPF validation performed", input, false, None);
                None
            }
        }
    }

    /// `true` somente para CPFs com estrutura e dígitos verificadores corretos
    pub fn validate(&self, input: Option<&str>) -> bool {
        self.parse(input).is_some()
    }

    /// `XXX.XXX.XXX-XX` se o CPF for válido, `None` caso contrário
    pub fn format(&self, input: Option<&str>) -> Option<String> {
        self.parse(input).map(|cpf| cpf.to_string())
    }

    fn emit(
        &self,
        level: DiagnosticLevel,
        message: &'static str,
        input: &str,
        is_valid: bool,
        error: Option<String>,
    ) {
        self.sink.emit(&Diagnostic {
            level,
            message,
            cpf_masked: mask(input),
            is_valid,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct RecordingSink(Arc<Mutex<Vec<Diagnostic>>>);

    impl RecordingSink {
        fn records(&self) -> Vec<Diagnostic> {
            self.0.lock().unwrap().clone()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn emit(&self, diagnostic: &Diagnostic) {
            self.0.lock().unwrap().push(diagnostic.clone());
        }
    }

    /// Gera um CPF válido a partir de 9 dígitos aleatórios
    fn random_valid_cpf(rng: &mut impl Rng) -> String {
        loop {
            let mut digits: Vec<u8> = (0..9).map(|_| rng.gen_range(0..10)).collect();
            let first = check_digit(&digits) as u8;
            digits.push(first);
            let second = check_digit(&digits) as u8;
            digits.push(second);
            if digits.iter().any(|d| *d != digits[0]) {
                return digits.iter().map(|d| char::from(b'0' + d)).collect();
            }
        }
    }

    #[test]
    fn test_known_valid_cpf() {
        let validator = CpfValidator::new();
        assert!(validator.validate(Some("52998224725")));
        assert_eq!(
            validator.format(Some("52998224725")),
            Some("529.982.247-25".to_string())
        );
    }

    #[test]
    fn test_known_invalid_checksum() {
        let validator = CpfValidator::new();
        assert!(!validator.validate(Some("52998224726")));
        assert_eq!(validator.format(Some("52998224726")), None);
        assert_eq!(
            "52998224726".parse::<Cpf>(),
            Err(CpfError::CheckDigitMismatch { position: 11, expected: 5, found: 6 })
        );
    }

    #[test]
    fn test_first_check_digit_mismatch() {
        assert_eq!(
            "52998224715".parse::<Cpf>(),
            Err(CpfError::CheckDigitMismatch { position: 10, expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_punctuated_input_matches_raw() {
        let validator = CpfValidator::new();
        assert_eq!(
            validator.validate(Some("529.982.247-25")),
            validator.validate(Some("52998224725"))
        );
        assert!(validator.validate(Some(" 529 982 247 25 ")));
    }

    #[test]
    fn test_empty_and_absent() {
        let validator = CpfValidator::new();
        assert!(!validator.validate(None));
        assert!(!validator.validate(Some("")));
        assert_eq!(validator.format(None), None);
        assert_eq!(validator.format(Some("")), None);
        assert_eq!("".parse::<Cpf>(), Err(CpfError::Empty));
    }

    #[test]
    fn test_wrong_length() {
        let validator = CpfValidator::new();
        assert!(!validator.validate(Some("5299822472")));
        assert!(!validator.validate(Some("529982247250")));
        assert!(!validator.validate(Some("abc.def.ghi-jk")));
        assert_eq!("529.982".parse::<Cpf>(), Err(CpfError::InvalidLength(6)));
    }

    #[test]
    fn test_repeated_digits_rejected() {
        let validator = CpfValidator::new();
        for d in 0..=9u8 {
            let cpf: String = std::iter::repeat(char::from(b'0' + d)).take(CPF_LEN).collect();
            assert!(!validator.validate(Some(&cpf)), "{} deveria ser inválido", cpf);
            assert_eq!(cpf.parse::<Cpf>(), Err(CpfError::RepeatedDigits));
        }
    }

    #[test]
    fn test_unicode_numerals_count_toward_length() {
        // Um numeral arábico a mais deixa a sequência com 12 dígitos
        let validator = CpfValidator::with_sink(NoopSink);
        assert_eq!(clean_cpf("529٣98224725").chars().count(), 12);
        assert!(!validator.validate(Some("529٣98224725")));
        assert_eq!("529٣98224725".parse::<Cpf>(), Err(CpfError::InvalidLength(12)));
    }

    #[test]
    fn test_unicode_numerals_are_internal_fault() {
        let sink = RecordingSink::default();
        let validator = CpfValidator::with_sink(sink.clone());

        assert!(!validator.validate(Some("٥٢٩٩٨٢٢٤٧٢٥")));
        assert_eq!(validator.format(Some("٥٢٩.٩٨٢.٢٤٧-٢٥")), None);
        assert_eq!(
            "٥٢٩٩٨٢٢٤٧٢٥".parse::<Cpf>(),
            Err(CpfError::NonDigit { position: 0, character: '٥' })
        );

        let records = sink.records();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.level, DiagnosticLevel::Error);
            assert_eq!(record.message, "Error during CPF validation");
            assert!(!record.is_valid);
            assert_eq!(record.cpf_masked, "٥٢٩****٢٥");
            let error = record.error.as_deref().unwrap();
            assert!(error.contains("posição 0"), "{}", error);
        }
    }

    #[test]
    fn test_error_record_fields() {
        let sink = RecordingSink::default();
        let validator = CpfValidator::with_sink(sink.clone());
        validator.emit(
            DiagnosticLevel::Error,
            "Error during CPF validation",
            "529.982.247-25",
            false,
            Some("falha".to_string()),
        );

        assert_eq!(
            sink.records(),
            vec![Diagnostic {
                level: DiagnosticLevel::Error,
                message: "Error during CPF validation",
                cpf_masked: "529****25".to_string(),
                is_valid: false,
                error: Some("falha".to_string()),
            }]
        );
    }

    #[test]
    fn test_tracing_sink_emits_error_record() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        let validator = CpfValidator::new();

        tracing::subscriber::with_default(subscriber, || {
            TracingSink.emit(&Diagnostic {
                level: DiagnosticLevel::Error,
                message: "Error during CPF validation",
                cpf_masked: "529****25".to_string(),
                is_valid: false,
                error: Some("falha".to_string()),
            });
            assert!(!validator.validate(Some("٥٢٩٩٨٢٢٤٧٢٥")));
        });
    }

    #[test]
    fn test_format_is_idempotent() {
        let validator = CpfValidator::new();
        let formatted = validator.format(Some("52998224725")).unwrap();
        assert_eq!(validator.format(Some(&formatted)), Some(formatted.clone()));
    }

    #[test]
    fn test_random_valid_cpfs() {
        let validator = CpfValidator::with_sink(NoopSink);
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let cpf = random_valid_cpf(&mut rng);
            assert!(validator.validate(Some(&cpf)), "{} deveria ser válido", cpf);

            // Alterar o último dígito sempre invalida
            let last = cpf.as_bytes()[10] - b'0';
            let altered = format!("{}{}", &cpf[..10], (last + 1) % 10);
            assert!(!validator.validate(Some(&altered)));
        }
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("52998224725"), "529****25");
        assert_eq!(mask("529.982.247-25"), "529****25");
        assert_eq!(mask("12345"), "123****45");
        assert_eq!(mask("1234"), SHORT_MASK);
        assert_eq!(mask(""), SHORT_MASK);
        assert_eq!(mask("ab-12"), SHORT_MASK);
        assert_eq!(mask("٥٢٩٩٨"), "٥٢٩****٩٨");
    }

    #[test]
    fn test_cpf_accessors() {
        let cpf: Cpf = "529.982.247-25".parse().unwrap();
        assert_eq!(cpf.digits(), "52998224725");
        assert_eq!(cpf.masked(), "529****25");
        assert_eq!(cpf.to_string(), "529.982.247-25");
    }

    #[test]
    fn test_diagnostics_are_masked() {
        let sink = RecordingSink::default();
        let validator = CpfValidator::with_sink(sink.clone());

        assert!(validator.validate(Some("529.982.247-25")));
        assert!(!validator.validate(Some("52998224726")));
        assert!(!validator.validate(None));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cpf_masked, "529****25");
        assert!(records[0].is_valid);
        assert_eq!(records[1].cpf_masked, "529****26");
        assert!(!records[1].is_valid);
        assert!(records.iter().all(|r| r.level == DiagnosticLevel::Debug));
        assert!(records.iter().all(|r| r.error.is_none()));
    }

    #[test]
    fn test_internal_error_classification() {
        assert!(CpfError::NonDigit { position: 0, character: 'x' }.is_internal());
        assert!(!CpfError::RepeatedDigits.is_internal());
        assert!(!CpfError::InvalidLength(3).is_internal());
    }

    #[test]
    fn test_validator_is_shareable_across_threads() {
        let validator = Arc::new(CpfValidator::with_sink(NoopSink));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let v = Arc::clone(&validator);
                std::thread::spawn(move || v.validate(Some("52998224725")))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    proptest! {
        #[test]
        fn prop_wrong_digit_count_is_invalid(s in "[0-9a-z.\\- ]{0,30}") {
            let validator = CpfValidator::with_sink(NoopSink);
            prop_assume!(clean_cpf(&s).chars().count() != CPF_LEN);
            prop_assert!(!validator.validate(Some(&s)));
        }

        #[test]
        fn prop_format_iff_validate(s in "[0-9.\\-]{0,16}") {
            let validator = CpfValidator::with_sink(NoopSink);
            prop_assert_eq!(validator.format(Some(&s)).is_some(), validator.validate(Some(&s)));
        }

        #[test]
        fn prop_mask_keeps_edges(digits in "[0-9]{11}") {
            let masked = mask(&digits);
            prop_assert_eq!(&masked[..3], &digits[..3]);
            prop_assert_eq!(&masked[masked.len() - 2..], &digits[9..]);
            prop_assert_eq!(&masked[3..masked.len() - 2], MIDDLE_MASK);
        }
    }
}
