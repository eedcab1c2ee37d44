use crate::error::{ReceivablesError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Credit-limit position of one clinic. `limite_aprovado` of `None` means no
/// limit is currently approved (never approved, or revoked).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditLimit {
    pub clinica_id: String,

    #[schemars(description = "Approved credit limit in BRL; absent when none is in force")]
    pub limite_aprovado: Option<f64>,

    #[serde(default)]
    #[schemars(description = "Amount of the approved limit already consumed, in BRL")]
    pub limite_utilizado: f64,
}

impl CreditLimit {
    /// Headroom still available under the approved limit, floored at zero.
    pub fn disponivel(&self) -> f64 {
        (self.limite_aprovado.unwrap_or(0.0) - self.limite_utilizado).max(0.0)
    }

    /// Consumed share of the approved limit. `None` without a positive
    /// approved limit, so callers never see a division artifact.
    pub fn utilizacao(&self) -> Option<f64> {
        match self.limite_aprovado {
            Some(approved) if approved != 0.0 => Some(self.limite_utilizado / approved),
            _ => None,
        }
    }

    /// Validates and applies one limit draw, returning the advanced position
    /// together with the record to append to the clinic's history. The
    /// original position is left untouched.
    pub fn register_utilization(
        &self,
        amount: f64,
        reference_date: NaiveDate,
        registered_by: &str,
        note: Option<&str>,
    ) -> Result<(CreditLimit, UtilizationRecord)> {
        if self.limite_aprovado.is_none() {
            return Err(ReceivablesError::NoApprovedLimit(self.clinica_id.clone()));
        }

        if amount <= 0.0 || amount.is_nan() {
            return Err(ReceivablesError::InvalidUtilizationAmount(amount));
        }

        let available = self.disponivel();
        if amount > available {
            return Err(ReceivablesError::UtilizationExceedsAvailable {
                requested: amount,
                available,
            });
        }

        let advanced = CreditLimit {
            clinica_id: self.clinica_id.clone(),
            limite_aprovado: self.limite_aprovado,
            limite_utilizado: self.limite_utilizado + amount,
        };
        let record = UtilizationRecord {
            valor_utilizado: amount,
            data_referencia: reference_date,
            registrado_por: registered_by.to_string(),
            observacao: note.map(str::to_string),
        };

        Ok((advanced, record))
    }
}

/// One recorded draw against an approved limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UtilizationRecord {
    pub valor_utilizado: f64,
    pub data_referencia: NaiveDate,
    pub registrado_por: String,
    pub observacao: Option<String>,
}

/// One entry of a clinic's limit-approval history. An entry with no value
/// records a revocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LimitHistoryEntry {
    pub limite_aprovado: Option<f64>,
    pub aprovado_em: Option<NaiveDate>,
    pub aprovado_por: Option<String>,
    pub observacao: Option<String>,
}

impl LimitHistoryEntry {
    pub fn is_revocation(&self) -> bool {
        self.limite_aprovado.is_none()
    }
}

/// The entry currently in force: the one with the latest approval date.
/// Undated entries lose to dated ones; among equal dates the later entry in
/// the list wins.
pub fn current_limit(history: &[LimitHistoryEntry]) -> Option<&LimitHistoryEntry> {
    history.iter().max_by_key(|entry| entry.aprovado_em)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(approved: Option<f64>, used: f64) -> CreditLimit {
        CreditLimit {
            clinica_id: "clinica-norte".to_string(),
            limite_aprovado: approved,
            limite_utilizado: used,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_disponivel_floors_at_zero() {
        assert_eq!(limit(Some(1000.0), 200.0).disponivel(), 800.0);
        assert_eq!(limit(Some(1000.0), 1500.0).disponivel(), 0.0);
        assert_eq!(limit(None, 0.0).disponivel(), 0.0);
    }

    #[test]
    fn test_utilizacao_ratio() {
        let ratio = limit(Some(1000.0), 250.0).utilizacao().unwrap();
        assert!((ratio - 0.25).abs() < 1e-9, "expected 0.25, got {}", ratio);
        assert_eq!(limit(Some(0.0), 0.0).utilizacao(), None);
        assert_eq!(limit(None, 100.0).utilizacao(), None);
    }

    #[test]
    fn test_register_advances_position_and_emits_record() {
        let before = limit(Some(1000.0), 200.0);
        let (after, record) = before
            .register_utilization(300.0, date(2025, 3, 15), "ana", Some("lote 42"))
            .unwrap();

        assert_eq!(after.limite_utilizado, 500.0);
        assert_eq!(after.disponivel(), 500.0);
        assert_eq!(record.valor_utilizado, 300.0);
        assert_eq!(record.data_referencia, date(2025, 3, 15));
        assert_eq!(record.registrado_por, "ana");
        assert_eq!(record.observacao.as_deref(), Some("lote 42"));

        // Input position is untouched
        assert_eq!(before.limite_utilizado, 200.0);
    }

    #[test]
    fn test_register_requires_approved_limit() {
        let err = limit(None, 0.0)
            .register_utilization(100.0, date(2025, 3, 15), "ana", None)
            .unwrap_err();
        assert!(matches!(err, ReceivablesError::NoApprovedLimit(ref id) if id == "clinica-norte"));
    }

    #[test]
    fn test_register_rejects_non_positive_amounts() {
        let position = limit(Some(1000.0), 0.0);
        for amount in [0.0, -50.0, f64::NAN] {
            let err = position
                .register_utilization(amount, date(2025, 3, 15), "ana", None)
                .unwrap_err();
            assert!(matches!(
                err,
                ReceivablesError::InvalidUtilizationAmount(_)
            ));
        }
    }

    #[test]
    fn test_register_rejects_amounts_over_available() {
        let err = limit(Some(1000.0), 800.0)
            .register_utilization(200.01, date(2025, 3, 15), "ana", None)
            .unwrap_err();
        match err {
            ReceivablesError::UtilizationExceedsAvailable {
                requested,
                available,
            } => {
                assert_eq!(requested, 200.01);
                assert_eq!(available, 200.0);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_register_allows_exact_available() {
        let (after, _) = limit(Some(1000.0), 800.0)
            .register_utilization(200.0, date(2025, 3, 15), "ana", None)
            .unwrap();
        assert_eq!(after.disponivel(), 0.0);
    }

    #[test]
    fn test_current_limit_takes_latest_approval() {
        let history = vec![
            LimitHistoryEntry {
                limite_aprovado: Some(500.0),
                aprovado_em: Some(date(2024, 6, 1)),
                aprovado_por: Some("carlos".to_string()),
                observacao: None,
            },
            LimitHistoryEntry {
                limite_aprovado: Some(800.0),
                aprovado_em: Some(date(2025, 1, 10)),
                aprovado_por: Some("ana".to_string()),
                observacao: Some("revisão anual".to_string()),
            },
            LimitHistoryEntry {
                limite_aprovado: Some(100.0),
                aprovado_em: None,
                aprovado_por: None,
                observacao: None,
            },
        ];

        let current = current_limit(&history).unwrap();
        assert_eq!(current.limite_aprovado, Some(800.0));
        assert_eq!(current.aprovado_por.as_deref(), Some("ana"));
    }

    #[test]
    fn test_current_limit_can_be_a_revocation() {
        let history = vec![
            LimitHistoryEntry {
                limite_aprovado: Some(500.0),
                aprovado_em: Some(date(2024, 6, 1)),
                aprovado_por: None,
                observacao: None,
            },
            LimitHistoryEntry {
                limite_aprovado: None,
                aprovado_em: Some(date(2025, 2, 1)),
                aprovado_por: Some("ana".to_string()),
                observacao: None,
            },
        ];

        let current = current_limit(&history).unwrap();
        assert!(current.is_revocation());
    }

    #[test]
    fn test_current_limit_of_empty_history() {
        assert_eq!(current_limit(&[]), None);
    }
}
