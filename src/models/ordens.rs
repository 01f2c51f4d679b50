// src/models/ordens.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::format::normalizar_data;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusOs {
    #[default]
    Aberta,
    Programada,
    EmAndamento,
    Concluida,
    Cancelada,
    #[serde(other)]
    Desconhecido,
}

impl StatusOs {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusOs::Aberta => "aberta",
            StatusOs::Programada => "programada",
            StatusOs::EmAndamento => "em_andamento",
            StatusOs::Concluida => "concluida",
            StatusOs::Cancelada => "cancelada",
            StatusOs::Desconhecido => "desconhecido",
        }
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            StatusOs::Aberta => "Aberta",
            StatusOs::Programada => "Programada",
            StatusOs::EmAndamento => "Em andamento",
            StatusOs::Concluida => "Concluída",
            StatusOs::Cancelada => "Cancelada",
            StatusOs::Desconhecido => "-",
        }
    }
}

/// As cinco raias do quadro de programação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prioridade {
    Baixa,
    Media,
    Alta,
    Seguranca,
    Preventiva,
}

impl Prioridade {
    pub const TODAS: [Prioridade; 5] = [
        Prioridade::Baixa,
        Prioridade::Media,
        Prioridade::Alta,
        Prioridade::Seguranca,
        Prioridade::Preventiva,
    ];

    /// Tolerante a acentos e caixa ("Média", "SEGURANÇA"...). Valores desconhecidos são `None`.
    pub fn parse(texto: &str) -> Option<Self> {
        let normalizado: String = texto
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                outro => outro,
            })
            .collect();

        match normalizado.as_str() {
            "baixa" => Some(Prioridade::Baixa),
            "media" => Some(Prioridade::Media),
            "alta" => Some(Prioridade::Alta),
            "seguranca" => Some(Prioridade::Seguranca),
            "preventiva" => Some(Prioridade::Preventiva),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Prioridade::Baixa => "baixa",
            Prioridade::Media => "media",
            Prioridade::Alta => "alta",
            Prioridade::Seguranca => "seguranca",
            Prioridade::Preventiva => "preventiva",
        }
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            Prioridade::Baixa => "Baixa",
            Prioridade::Media => "Média",
            Prioridade::Alta => "Alta",
            Prioridade::Seguranca => "Segurança",
            Prioridade::Preventiva => "Preventiva",
        }
    }
}

// --- Ordem de serviço ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrdemServico {
    pub id: i64,
    #[serde(default)]
    pub descricao: String,
    pub tipo_manutencao: Option<String>,
    pub oficina: Option<String>,
    // Mantido como texto: o backend já mandou "Média", "media" e "MEDIA".
    pub prioridade: Option<String>,
    #[serde(default)]
    pub status: StatusOs,
    pub data_programada: Option<String>,
    pub usuario_responsavel: Option<String>,
    pub hh: Option<f64>,
    pub qtd_pessoas: Option<i32>,
    pub horas: Option<f64>,
    pub pmp_id: Option<i64>,
    pub frequencia_origem: Option<String>,
    pub numero_sequencia: Option<i32>,
}

impl OrdemServico {
    pub fn prioridade(&self) -> Option<Prioridade> {
        self.prioridade.as_deref().and_then(Prioridade::parse)
    }

    /// Dia programado, se o backend mandou uma data legível.
    pub fn dia_programado(&self) -> Option<NaiveDate> {
        self.data_programada
            .as_deref()
            .and_then(|d| normalizar_data(d).ok())
    }

    pub fn responsavel(&self) -> Option<&str> {
        self.usuario_responsavel
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// HH = pessoas × horas; usa o valor do backend se já vier calculado.
    pub fn homem_hora(&self) -> Option<f64> {
        self.hh.or_else(|| match (self.qtd_pessoas, self.horas) {
            (Some(p), Some(h)) => Some(f64::from(p) * h),
            _ => None,
        })
    }
}

// --- Payloads enviados ao backend ---

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgramarPayload {
    pub id: i64,
    pub data_programada: String,
    pub usuario_responsavel: String,
    pub status: StatusOs,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrioridadePayload {
    pub prioridade: Prioridade,
}

// --- Payloads vindos do navegador ---

/// Soltar um card numa célula (dia × técnico).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SoltarCardPayload {
    pub os_id: i64,
    #[validate(length(min = 1, message = "A data é obrigatória."))]
    pub data: String,
    pub usuario_id: Option<i64>,
    #[validate(length(min = 1, message = "Selecione um técnico."))]
    pub usuario_nome: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoverRaiaPayload {
    pub os_id: i64,
    pub prioridade: Prioridade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parse_is_accent_insensitive() {
        assert_eq!(Prioridade::parse("Média"), Some(Prioridade::Media));
        assert_eq!(Prioridade::parse("SEGURANÇA"), Some(Prioridade::Seguranca));
        assert_eq!(Prioridade::parse("urgente"), None);
    }

    #[test]
    fn unknown_status_does_not_break_decoding() {
        let os: OrdemServico =
            serde_json::from_str(r#"{"id": 1, "status": "pausada"}"#).unwrap();
        assert_eq!(os.status, StatusOs::Desconhecido);

        let os: OrdemServico = serde_json::from_str(r#"{"id": 2}"#).unwrap();
        assert_eq!(os.status, StatusOs::Aberta);
    }

    #[test]
    fn man_hours_fall_back_to_people_times_hours() {
        let os = OrdemServico { qtd_pessoas: Some(2), horas: Some(1.5), ..Default::default() };
        assert_eq!(os.homem_hora(), Some(3.0));
    }

    #[test]
    fn programar_payload_serializes_status_as_programada() {
        let body = serde_json::to_value(ProgramarPayload {
            id: 7,
            data_programada: "2025-03-10".into(),
            usuario_responsavel: "Maria Santos".into(),
            status: StatusOs::Programada,
        })
        .unwrap();
        assert_eq!(body["status"], "programada");
    }
}
