// src/services/qrcode_service.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    api::{AssetRepository, BackendClient},
    capacidades::{Capacidades, EtiquetaQr},
    common::error::AppError,
    models::ativos::{Equipamento, Filial, Setor},
};

/// O que vai dentro de cada QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConteudoQr {
    pub id: i64,
    pub tag: String,
    #[serde(default)]
    pub descricao: String,
    pub setor_id: Option<i64>,
    pub filial_id: Option<i64>,
}

impl ConteudoQr {
    pub fn texto(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltroQr {
    #[serde(default, deserialize_with = "id_opcional")]
    pub filial_id: Option<i64>,
    #[serde(default, deserialize_with = "id_opcional")]
    pub setor_id: Option<i64>,
}

// O `<select>` "Todas" manda `filial_id=` vazio.
fn id_opcional<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let texto: Option<String> = Option::deserialize(deserializer)?;
    match texto.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartaoQr {
    pub conteudo: ConteudoQr,
    pub setor: Option<String>,
    pub filial: Option<String>,
    pub markup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListaQr {
    pub filiais: Vec<Filial>,
    pub setores: Vec<Setor>,
    pub cartoes: Vec<CartaoQr>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Atalho {
    pub rotulo: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultadoLeitura {
    pub equipamento: Equipamento,
    pub atalhos: Vec<Atalho>,
}

/// Equipamentos visíveis com o filtro de filial/setor, já com o conteúdo do QR.
pub fn filtrar_equipamentos(
    setores: &[Setor],
    equipamentos: Vec<Equipamento>,
    filtro: &FiltroQr,
) -> Vec<ConteudoQr> {
    let filial_do_setor: HashMap<i64, Option<i64>> =
        setores.iter().map(|s| (s.id, s.filial_id)).collect();

    equipamentos
        .into_iter()
        .filter_map(|e| {
            let filial_id = e.setor_id.and_then(|sid| filial_do_setor.get(&sid).copied().flatten());
            if filtro.setor_id.is_some() && e.setor_id != filtro.setor_id {
                return None;
            }
            if filtro.filial_id.is_some() && filial_id != filtro.filial_id {
                return None;
            }
            Some(ConteudoQr {
                id: e.id,
                tag: e.tag,
                descricao: e.descricao,
                setor_id: e.setor_id,
                filial_id,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct LidoQr {
    id: Option<serde_json::Value>,
    tag: Option<String>,
}

/// Texto lido pela câmera: JSON `{id, tag, ...}` ou só a TAG impressa.
pub fn decodificar_leitura(texto: &str) -> Result<(Option<i64>, Option<String>), AppError> {
    let texto = texto.trim();
    if texto.is_empty() {
        return Err(AppError::RegraNegocio("Nenhum conteúdo lido do QR code.".into()));
    }

    if texto.starts_with('{') {
        let lido: LidoQr = serde_json::from_str(texto)
            .map_err(|_| AppError::RegraNegocio("QR code com conteúdo inválido.".into()))?;
        let id = match lido.id {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        let tag = lido.tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        if id.is_none() && tag.is_none() {
            return Err(AppError::RegraNegocio("O QR code não identifica um equipamento.".into()));
        }
        return Ok((id, tag));
    }

    Ok((None, Some(texto.to_string())))
}

pub fn atalhos_para(equipamento: &Equipamento) -> Vec<Atalho> {
    let query = format!(
        "equipamento_id={}&tag={}",
        equipamento.id,
        codificar_query(&equipamento.tag)
    );
    vec![
        Atalho { rotulo: "Abrir chamado", url: format!("/chamados/novo?{}", query) },
        Atalho { rotulo: "Nova ordem de serviço", url: format!("/ordens-servico/nova?{}", query) },
    ]
}

fn codificar_query(valor: &str) -> String {
    let mut saida = String::with_capacity(valor.len());
    for b in valor.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => saida.push(b as char),
            _ => saida.push_str(&format!("%{:02X}", b)),
        }
    }
    saida
}

#[derive(Clone)]
pub struct QrCodeService {
    repo: AssetRepository,
    capacidades: Capacidades,
}

impl QrCodeService {
    pub fn new(repo: AssetRepository, capacidades: Capacidades) -> Self {
        Self { repo, capacidades }
    }

    async fn visiveis(
        &self,
        client: &BackendClient,
        filtro: &FiltroQr,
    ) -> Result<(Vec<Filial>, Vec<Setor>, Vec<ConteudoQr>), AppError> {
        let (filiais, setores, equipamentos) = tokio::try_join!(
            self.repo.list_filiais(client),
            self.repo.list_setores(client),
            self.repo.list_equipamentos(client),
        )?;
        let conteudos = filtrar_equipamentos(&setores, equipamentos, filtro);
        Ok((filiais, setores, conteudos))
    }

    pub async fn listar(&self, client: &BackendClient, filtro: &FiltroQr) -> Result<ListaQr, AppError> {
        let qr = self.capacidades.qr()?;
        let (filiais, setores, conteudos) = self.visiveis(client, filtro).await?;

        let mut cartoes = Vec::with_capacity(conteudos.len());
        for conteudo in conteudos {
            let markup = qr.markup(&conteudo.texto()?)?;
            let setor = conteudo
                .setor_id
                .and_then(|id| setores.iter().find(|s| s.id == id))
                .map(|s| s.tag.clone());
            let filial = conteudo
                .filial_id
                .and_then(|id| filiais.iter().find(|f| f.id == id))
                .map(|f| f.tag.clone());
            cartoes.push(CartaoQr { conteudo, setor, filial, markup });
        }

        tracing::info!("{} QR code(s) gerados pelo provedor {}", cartoes.len(), qr.nome());
        Ok(ListaQr { filiais, setores, cartoes })
    }

    /// PDF da grade visível (mesmo filtro da tela).
    pub async fn exportar_pdf(&self, client: &BackendClient, filtro: &FiltroQr) -> Result<Vec<u8>, AppError> {
        let qr = self.capacidades.qr()?;
        let pdf = self.capacidades.pdf()?;
        let (_, _, conteudos) = self.visiveis(client, filtro).await?;
        if conteudos.is_empty() {
            return Err(AppError::RegraNegocio("Nenhum equipamento para exportar.".into()));
        }

        let mut etiquetas = Vec::with_capacity(conteudos.len());
        for conteudo in &conteudos {
            etiquetas.push(EtiquetaQr {
                titulo: conteudo.tag.clone(),
                subtitulo: conteudo.descricao.clone(),
                imagem: qr.imagem(&conteudo.texto()?).await?,
            });
        }

        pdf.exportar_qrcodes("QR Codes dos Equipamentos", etiquetas)
    }

    pub async fn ler(&self, client: &BackendClient, texto: &str) -> Result<ResultadoLeitura, AppError> {
        let (id, tag) = decodificar_leitura(texto)?;
        let equipamentos = self.repo.list_equipamentos(client).await?;

        let equipamento = equipamentos
            .into_iter()
            .find(|e| match (id, tag.as_deref()) {
                (Some(id), _) => e.id == id,
                (None, Some(tag)) => e.tag.eq_ignore_ascii_case(tag),
                (None, None) => false,
            })
            .ok_or_else(|| {
                let chave = id.map(|i| format!("#{}", i)).or(tag).unwrap_or_default();
                AppError::ResourceNotFound(format!("Equipamento {}", chave))
            })?;

        tracing::info!("QR lido: equipamento {} ({})", equipamento.tag, equipamento.id);
        Ok(ResultadoLeitura { atalhos: atalhos_para(&equipamento), equipamento })
    }
}
