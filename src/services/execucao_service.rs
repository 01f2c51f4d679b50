// src/services/execucao_service.rs

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::Validate;

use crate::{
    api::{BackendClient, ExecucaoRepository, OrdemRepository},
    common::{
        error::AppError,
        format::{arredondar_centavos, formatar_moeda, normalizar_data_hora, valor_em_centavos},
    },
    events::{EventoOs, StatusBus},
    models::{
        execucao::{
            ExecucaoForm, ExecucaoOs, MaterialEstoque, MaterialForm, MaterialUtilizado, TipoMaterial,
        },
        ordens::{OrdemServico, StatusOs},
    },
};

const FORMATO_BACKEND: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize)]
pub struct FormularioExecucao {
    pub ordem: OrdemServico,
    pub execucao: ExecucaoOs,
    pub materiais: Vec<MaterialUtilizado>,
    pub estoque: Vec<MaterialEstoque>,
    pub total: Decimal,
}

/// Resultado do recálculo de uma linha de material (a cada mudança de campo).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinhaCalculada {
    pub valor_unitario: Decimal,
    pub valor_total: Decimal,
    pub valor_unitario_formatado: String,
    pub valor_total_formatado: String,
}

/// Execução nova começa "agora"; uma existente mantém o que já tinha.
pub fn preencher_execucao(ordem: &OrdemServico, existente: Option<ExecucaoOs>, agora: NaiveDateTime) -> ExecucaoOs {
    match existente {
        Some(mut e) => {
            if e.data_inicio.as_deref().map_or(true, |d| d.trim().is_empty()) {
                e.data_inicio = Some(agora.format(FORMATO_BACKEND).to_string());
            }
            e
        }
        None => ExecucaoOs {
            id: None,
            os_id: ordem.id,
            data_inicio: Some(agora.format(FORMATO_BACKEND).to_string()),
            data_fim: None,
            lista_execucao_status: Default::default(),
            observacoes: None,
        },
    }
}

/// Linha de material pronta para o backend: preço do catálogo (estoque) ou digitado (avulso).
pub fn montar_material(form: &MaterialForm, estoque: &[MaterialEstoque]) -> Result<MaterialUtilizado, AppError> {
    if form.quantidade <= Decimal::ZERO {
        return Err(AppError::RegraNegocio("A quantidade deve ser maior que zero.".into()));
    }

    let (material_estoque_id, descricao, valor_unitario) = match form.tipo_material {
        TipoMaterial::Estoque => {
            let id = form
                .material_estoque_id
                .ok_or_else(|| AppError::RegraNegocio("Selecione um material do estoque.".into()))?;
            let item = estoque
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Material de estoque #{}", id)))?;
            (Some(id), item.descricao.clone(), item.valor_unitario)
        }
        TipoMaterial::Avulso => {
            let descricao = form
                .descricao
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .ok_or_else(|| AppError::RegraNegocio("Descreva o material avulso.".into()))?;
            if form.valor_unitario < Decimal::ZERO {
                return Err(AppError::RegraNegocio("O valor unitário não pode ser negativo.".into()));
            }
            (None, descricao.to_string(), form.valor_unitario)
        }
    };

    let mut material = MaterialUtilizado {
        id: form.id,
        execucao_id: None,
        tipo_material: form.tipo_material,
        material_estoque_id,
        descricao: Some(descricao),
        quantidade: form.quantidade,
        valor_unitario,
        valor_total: Decimal::ZERO,
    };
    material.recalcular_total()?;
    Ok(material)
}

pub fn calcular_linha(form: &MaterialForm, estoque: &[MaterialEstoque]) -> Result<LinhaCalculada, AppError> {
    let valor_unitario = match form.tipo_material {
        TipoMaterial::Estoque => form
            .material_estoque_id
            .and_then(|id| estoque.iter().find(|m| m.id == id))
            .map(|m| m.valor_unitario)
            .unwrap_or(Decimal::ZERO),
        TipoMaterial::Avulso => form.valor_unitario,
    };
    let valor_total = valor_em_centavos(form.quantidade.max(Decimal::ZERO), valor_unitario)?;
    Ok(LinhaCalculada {
        valor_unitario,
        valor_total,
        valor_unitario_formatado: formatar_moeda(valor_unitario),
        valor_total_formatado: formatar_moeda(valor_total),
    })
}

pub fn total_materiais(materiais: &[MaterialUtilizado]) -> Result<Decimal, AppError> {
    materiais
        .iter()
        .try_fold(Decimal::ZERO, |soma, m| soma.checked_add(m.valor_total))
        .map(arredondar_centavos)
        .ok_or_else(|| AppError::RegraNegocio("Valor muito alto".into()))
}

fn data_hora_opcional(valor: Option<&str>) -> Result<Option<NaiveDateTime>, AppError> {
    match valor.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(normalizar_data_hora(v)?)),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct ExecucaoService {
    execucoes: ExecucaoRepository,
    ordens: OrdemRepository,
    bus: StatusBus,
}

impl ExecucaoService {
    pub fn new(execucoes: ExecucaoRepository, ordens: OrdemRepository, bus: StatusBus) -> Self {
        Self { execucoes, ordens, bus }
    }

    async fn estoque(&self, client: &BackendClient) -> Result<Vec<MaterialEstoque>, AppError> {
        match self.execucoes.list_estoque(client).await {
            Ok(estoque) => Ok(estoque),
            Err(AppError::NaoAutenticado) => Err(AppError::NaoAutenticado),
            Err(e) => {
                // Sem catálogo ainda dá para lançar material avulso.
                tracing::warn!("Catálogo de estoque indisponível: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn carregar(
        &self,
        client: &BackendClient,
        os_id: i64,
        agora: NaiveDateTime,
    ) -> Result<FormularioExecucao, AppError> {
        let (ordem, existente, estoque) = tokio::try_join!(
            self.ordens.get(client, os_id),
            self.execucoes.get_por_os(client, os_id),
            self.estoque(client),
        )?;

        let materiais = match existente.as_ref().and_then(|e| e.id) {
            Some(execucao_id) => self.execucoes.list_materiais(client, execucao_id).await?,
            None => Vec::new(),
        };

        Ok(FormularioExecucao {
            execucao: preencher_execucao(&ordem, existente, agora),
            total: total_materiais(&materiais)?,
            ordem,
            materiais,
            estoque,
        })
    }

    pub async fn calcular(&self, client: &BackendClient, form: &MaterialForm) -> Result<LinhaCalculada, AppError> {
        let estoque = match form.tipo_material {
            TipoMaterial::Estoque => self.estoque(client).await?,
            TipoMaterial::Avulso => Vec::new(),
        };
        calcular_linha(form, &estoque)
    }

    /// Salva a execução e depois cada material (POST novo, PUT existente).
    pub async fn salvar(
        &self,
        client: &BackendClient,
        os_id: i64,
        form: &ExecucaoForm,
    ) -> Result<(ExecucaoOs, Vec<MaterialUtilizado>), AppError> {
        form.validate()?;

        let inicio = data_hora_opcional(form.data_inicio.as_deref())?;
        let fim = data_hora_opcional(form.data_fim.as_deref())?;
        if let (Some(i), Some(f)) = (inicio, fim) {
            if f < i {
                return Err(AppError::RegraNegocio(
                    "A data de término não pode ser anterior à data de início.".into(),
                ));
            }
        }
        if fim.is_some() && inicio.is_none() {
            return Err(AppError::RegraNegocio("Informe a data de início.".into()));
        }

        // Valida todos os materiais antes de gravar qualquer coisa.
        let estoque = if form.materiais.iter().any(|m| m.tipo_material == TipoMaterial::Estoque) {
            self.estoque(client).await?
        } else {
            Vec::new()
        };
        let materiais = form
            .materiais
            .iter()
            .map(|m| montar_material(m, &estoque))
            .collect::<Result<Vec<_>, _>>()?;

        let existente = self.execucoes.get_por_os(client, os_id).await?;
        let execucao = ExecucaoOs {
            id: existente.as_ref().and_then(|e| e.id),
            os_id,
            data_inicio: inicio.map(|d| d.format(FORMATO_BACKEND).to_string()),
            data_fim: fim.map(|d| d.format(FORMATO_BACKEND).to_string()),
            lista_execucao_status: form.lista_execucao_status,
            observacoes: form.observacoes.clone().filter(|o| !o.trim().is_empty()),
        };

        let salva = match execucao.id {
            Some(id) => self.execucoes.update(client, id, &execucao).await?,
            None => self.execucoes.create(client, &execucao).await?,
        };
        let execucao_id = salva
            .id
            .or(execucao.id)
            .ok_or_else(|| AppError::RegraNegocio("O backend não devolveu o id da execução.".into()))?;

        let mut gravados = Vec::with_capacity(materiais.len());
        for mut material in materiais {
            material.execucao_id = Some(execucao_id);
            let gravado = match material.id {
                Some(id) => self.execucoes.update_material(client, id, &material).await?,
                None => self.execucoes.create_material(client, &material).await?,
            };
            gravados.push(gravado);
        }

        tracing::info!("Execução da OS #{} salva com {} material(is)", os_id, gravados.len());
        Ok((salva, gravados))
    }

    pub async fn excluir_material(&self, client: &BackendClient, id: i64) -> Result<String, AppError> {
        let msg = self.execucoes.delete_material(client, id).await?;
        Ok(msg.unwrap_or_else(|| "Material removido.".to_string()))
    }

    /// Encerrar: carimba o término se vazio, salva, encerra e avisa as outras abas.
    pub async fn encerrar(
        &self,
        client: &BackendClient,
        os_id: i64,
        mut form: ExecucaoForm,
        agora: NaiveDateTime,
    ) -> Result<String, AppError> {
        if form.data_fim.as_deref().map_or(true, |d| d.trim().is_empty()) {
            form.data_fim = Some(agora.format(FORMATO_BACKEND).to_string());
        }

        self.salvar(client, os_id, &form).await?;
        let msg = self.ordens.encerrar(client, os_id).await?;

        self.bus.publicar(EventoOs::status_alterado(os_id, StatusOs::Concluida));
        tracing::info!("OS #{} encerrada", os_id);
        Ok(msg.unwrap_or_else(|| format!("OS #{} encerrada com sucesso.", os_id)))
    }
}
