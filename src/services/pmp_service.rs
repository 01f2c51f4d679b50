// src/services/pmp_service.rs

use std::collections::BTreeMap;

use serde::Serialize;
use validator::Validate;

use crate::{
    api::{AssetRepository, BackendClient, PlanoRepository},
    common::error::AppError,
    models::{
        ativos::Equipamento,
        plano::{AtividadePlano, ChavePmp, PainelPmp, Pmp, PmpForm, ResultadoGeracao},
    },
};

/// Uma PMP com as atividades que a compõem.
#[derive(Debug, Clone, Serialize)]
pub struct GrupoPmp {
    pub pmp: Pmp,
    pub atividades: Vec<AtividadePlano>,
}

pub fn codigo_pmp(tag_equipamento: &str, sequencia: usize) -> String {
    format!("PMP-{}-{:03}", tag_equipamento.trim().to_uppercase(), sequencia)
}

pub fn descricao_pmp(chave: &ChavePmp) -> String {
    let mut descricao = format!("{} - {} - {}", chave.tipo_manutencao, chave.oficina, chave.frequencia);
    if !chave.status_ativo {
        descricao.push_str(" (INATIVA)");
    }
    descricao
}

/// Agrupa por (oficina, frequência, tipo, ativo): ativas primeiro, depois
/// alfabética pela chave. O número do código é a posição do grupo nessa ordem,
/// então criar, excluir ou desativar um grupo renumera os que vêm depois. Só as
/// PMPs já persistidas mantêm o código, herdado em `mesclar_persistidas`.
pub fn agrupar_atividades(equipamento: &Equipamento, atividades: Vec<AtividadePlano>) -> Vec<GrupoPmp> {
    let mut grupos: BTreeMap<(bool, ChavePmp), Vec<AtividadePlano>> = BTreeMap::new();
    for atividade in atividades {
        let chave = atividade.chave_pmp();
        grupos
            .entry((!chave.status_ativo, chave))
            .or_default()
            .push(atividade);
    }

    grupos
        .into_iter()
        .enumerate()
        .map(|(i, ((_, chave), atividades))| GrupoPmp {
            pmp: Pmp {
                id: None,
                codigo: codigo_pmp(&equipamento.tag, i + 1),
                descricao: descricao_pmp(&chave),
                equipamento_id: Some(equipamento.id),
                oficina: chave.oficina.clone(),
                tipo_manutencao: chave.tipo_manutencao.clone(),
                frequencia: chave.frequencia.clone(),
                status_ativo: chave.status_ativo,
                atividades_ids: atividades.iter().filter_map(|a| a.id).collect(),
            },
            atividades,
        })
        .collect()
}

/// Casa os grupos gerados com as PMPs já persistidas (mesma chave) para herdar id/código.
fn mesclar_persistidas(mut grupos: Vec<GrupoPmp>, persistidas: Vec<Pmp>) -> Vec<GrupoPmp> {
    for grupo in &mut grupos {
        let normalizar = |s: &str| s.trim().to_uppercase();
        let existente = persistidas.iter().find(|p| {
            normalizar(&p.oficina) == grupo.pmp.oficina
                && normalizar(&p.frequencia) == grupo.pmp.frequencia
                && normalizar(&p.tipo_manutencao) == grupo.pmp.tipo_manutencao
                && p.status_ativo == grupo.pmp.status_ativo
        });
        if let Some(p) = existente {
            grupo.pmp.id = p.id;
            grupo.pmp.codigo = p.codigo.clone();
            grupo.pmp.descricao = p.descricao.clone();
        }
    }
    grupos
}

#[derive(Clone)]
pub struct PmpService {
    repo: PlanoRepository,
    ativos: AssetRepository,
}

impl PmpService {
    pub fn new(repo: PlanoRepository, ativos: AssetRepository) -> Self {
        Self { repo, ativos }
    }

    async fn equipamento(&self, client: &BackendClient, id: i64) -> Result<Equipamento, AppError> {
        self.ativos
            .get_equipamento(client, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Equipamento #{}", id)))
    }

    pub async fn carregar(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
    ) -> Result<(Equipamento, Vec<GrupoPmp>), AppError> {
        let (equipamento, atividades) = tokio::try_join!(
            self.equipamento(client, equipamento_id),
            self.repo.list_atividades(client, equipamento_id),
        )?;

        // PMPs persistidas são opcionais: sem elas, mostramos só as geradas.
        let persistidas = match self.repo.list_pmps(client, equipamento_id).await {
            Ok(p) => p,
            Err(AppError::NaoAutenticado) => return Err(AppError::NaoAutenticado),
            Err(e) => {
                tracing::warn!("PMPs do equipamento #{} indisponíveis: {}", equipamento_id, e);
                Vec::new()
            }
        };

        let grupos = mesclar_persistidas(agrupar_atividades(&equipamento, atividades), persistidas);
        Ok((equipamento, grupos))
    }

    /// Salva metadados e membros de uma PMP (POST se nova, PUT se já existe).
    pub async fn salvar_pmp(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
        pmp_id: Option<i64>,
        form: &PmpForm,
    ) -> Result<Pmp, AppError> {
        form.validate()?;
        let (_, grupos) = self.carregar(client, equipamento_id).await?;

        let atividades: Vec<&AtividadePlano> = grupos
            .iter()
            .flat_map(|g| &g.atividades)
            .filter(|a| a.id.is_some_and(|id| form.atividades_ids.contains(&id)))
            .collect();
        if atividades.len() != form.atividades_ids.len() {
            return Err(AppError::RegraNegocio(
                "Há atividades selecionadas que não pertencem a este equipamento.".into(),
            ));
        }
        let Some(primeira) = atividades.first() else {
            return Err(AppError::RegraNegocio("Selecione ao menos uma atividade.".into()));
        };
        let chave = primeira.chave_pmp();
        if atividades.iter().any(|a| a.chave_pmp() != chave) {
            return Err(AppError::RegraNegocio(
                "Todas as atividades de uma PMP devem ter a mesma oficina, frequência, tipo e situação.".into(),
            ));
        }

        let pmp = Pmp {
            id: pmp_id,
            codigo: form.codigo.trim().to_string(),
            descricao: form.descricao.trim().to_string(),
            equipamento_id: Some(equipamento_id),
            oficina: chave.oficina,
            tipo_manutencao: chave.tipo_manutencao,
            frequencia: chave.frequencia,
            status_ativo: chave.status_ativo,
            atividades_ids: form.atividades_ids.clone(),
        };

        let salvo = match pmp_id {
            Some(id) => self.repo.update_pmp(client, id, &pmp).await?,
            None => self.repo.create_pmp(client, &pmp).await?,
        };
        tracing::info!("PMP {} salva ({} atividades)", salvo.codigo, salvo.atividades_ids.len());
        Ok(salvo)
    }

    // --- ATIVIDADES ---

    pub async fn criar_atividade(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
        mut atividade: AtividadePlano,
    ) -> Result<AtividadePlano, AppError> {
        atividade.id = None;
        atividade.equipamento_id = Some(equipamento_id);
        atividade.validate()?;
        self.repo.create_atividade(client, &atividade).await
    }

    pub async fn editar_atividade(
        &self,
        client: &BackendClient,
        id: i64,
        mut atividade: AtividadePlano,
    ) -> Result<AtividadePlano, AppError> {
        atividade.id = Some(id);
        atividade.validate()?;
        self.repo.update_atividade(client, id, &atividade).await
    }

    /// Cópia: mesma atividade, nova linha, descrição marcada.
    pub async fn copiar_atividade(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
        id: i64,
    ) -> Result<AtividadePlano, AppError> {
        let original = self.buscar_atividade(client, equipamento_id, id).await?;
        let copia = AtividadePlano {
            id: None,
            descricao: format!("{} (cópia)", original.descricao),
            ..original
        };
        self.repo.create_atividade(client, &copia).await
    }

    pub async fn alternar_atividade(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
        id: i64,
    ) -> Result<AtividadePlano, AppError> {
        let mut atividade = self.buscar_atividade(client, equipamento_id, id).await?;
        atividade.status_ativo = !atividade.status_ativo;
        self.repo.update_atividade(client, id, &atividade).await
    }

    pub async fn excluir_atividade(&self, client: &BackendClient, id: i64) -> Result<String, AppError> {
        let msg = self.repo.delete_atividade(client, id).await?;
        Ok(msg.unwrap_or_else(|| "Atividade excluída.".to_string()))
    }

    async fn buscar_atividade(
        &self,
        client: &BackendClient,
        equipamento_id: i64,
        id: i64,
    ) -> Result<AtividadePlano, AppError> {
        self.repo
            .list_atividades(client, equipamento_id)
            .await?
            .into_iter()
            .find(|a| a.id == Some(id))
            .ok_or_else(|| AppError::ResourceNotFound(format!("Atividade #{}", id)))
    }

    // --- Painel / geração ---

    /// Painel + lista de equipamentos. Sem painel a página ainda abre.
    pub async fn painel(
        &self,
        client: &BackendClient,
    ) -> Result<(Option<PainelPmp>, Vec<Equipamento>), AppError> {
        let (painel, equipamentos) = tokio::join!(
            self.repo.painel(client),
            self.ativos.list_equipamentos(client),
        );
        let painel = match painel {
            Ok(p) => Some(p),
            Err(AppError::NaoAutenticado) => return Err(AppError::NaoAutenticado),
            Err(e) => {
                tracing::warn!("Painel da PMP indisponível: {}", e);
                None
            }
        };
        Ok((painel, equipamentos?))
    }

    pub async fn gerar_os_pendentes(&self, client: &BackendClient) -> Result<ResultadoGeracao, AppError> {
        let resultado = self.repo.gerar_os_pendentes(client).await?;
        tracing::info!("Geração de OS preventivas: {} nova(s)", resultado.os_geradas);
        Ok(resultado)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::{cliente, MockTransport};
    use crate::api::Metodo;
    use serde_json::json;

    fn atividade(id: i64, oficina: &str, freq: &str, tipo: &str, ativo: bool) -> AtividadePlano {
        AtividadePlano {
            id: Some(id),
            equipamento_id: Some(7),
            descricao: format!("Atividade {id}"),
            oficina: oficina.into(),
            tipo_manutencao: tipo.into(),
            frequencia: freq.into(),
            status_ativo: ativo,
            ..Default::default()
        }
    }

    fn bomba() -> Equipamento {
        Equipamento { id: 7, tag: "f01-ext-eb01".into(), ..Default::default() }
    }

    #[test]
    fn groups_by_workshop_frequency_type_and_status() {
        let grupos = agrupar_atividades(
            &bomba(),
            vec![
                atividade(1, "Mecânica", "Mensal", "Preventiva", true),
                atividade(2, "mecânica ", "MENSAL", "preventiva", true),
                atividade(3, "Elétrica", "Mensal", "Preventiva", true),
                atividade(4, "Mecânica", "Mensal", "Preventiva", false),
            ],
        );

        assert_eq!(grupos.len(), 3);
        assert!(grupos[..2].iter().all(|g| g.pmp.status_ativo));
        assert!(!grupos[2].pmp.status_ativo);

        let mecanica = grupos.iter().find(|g| g.pmp.oficina == "MECÂNICA" && g.pmp.status_ativo).unwrap();
        assert_eq!(mecanica.pmp.atividades_ids, vec![1, 2]);
        assert_eq!(mecanica.pmp.descricao, "PREVENTIVA - MECÂNICA - MENSAL");
        assert_eq!(grupos[0].pmp.codigo, "PMP-F01-EXT-EB01-001");
        assert!(grupos[2].pmp.descricao.ends_with("(INATIVA)"));
    }

    #[test]
    fn unsaved_codes_follow_group_position() {
        let antes = agrupar_atividades(
            &bomba(),
            vec![
                atividade(1, "Mecânica", "Mensal", "Preventiva", true),
                atividade(2, "Pintura", "Anual", "Preventiva", true),
            ],
        );
        assert_eq!(antes[1].pmp.codigo, "PMP-F01-EXT-EB01-002");

        let depois = agrupar_atividades(
            &bomba(),
            vec![
                atividade(1, "Mecânica", "Mensal", "Preventiva", true),
                atividade(2, "Pintura", "Anual", "Preventiva", true),
                atividade(3, "Elétrica", "Mensal", "Preventiva", true),
            ],
        );
        let pintura = depois.iter().find(|g| g.pmp.oficina == "PINTURA").unwrap();
        assert_eq!(pintura.pmp.codigo, "PMP-F01-EXT-EB01-003");
    }

    #[test]
    fn persisted_pmps_keep_their_code() {
        let grupos = agrupar_atividades(&bomba(), vec![atividade(1, "Mecânica", "Mensal", "Preventiva", true)]);
        let persistida = Pmp {
            id: Some(40),
            codigo: "PMP-ANTIGA".into(),
            descricao: "Plano antigo".into(),
            oficina: "Mecânica".into(),
            frequencia: "mensal".into(),
            tipo_manutencao: "PREVENTIVA".into(),
            status_ativo: true,
            ..Default::default()
        };
        let grupos = mesclar_persistidas(grupos, vec![persistida]);
        assert_eq!(grupos[0].pmp.id, Some(40));
        assert_eq!(grupos[0].pmp.codigo, "PMP-ANTIGA");
    }

    fn mock_equipamento() -> std::sync::Arc<MockTransport> {
        let mock = MockTransport::new();
        mock.ok(Metodo::Get, "/api/equipamentos/7", json!({"success": true, "equipamento": {"id": 7, "tag": "EB01"}}));
        mock.ok(
            Metodo::Get,
            "/api/plano-mestre/equipamento/7/atividades",
            json!({"success": true, "atividades": [
                {"id": 1, "descricao": "Lubrificar", "oficina": "Mecânica", "tipo_manutencao": "Preventiva", "frequencia": "Mensal", "status_ativo": 1},
                {"id": 2, "descricao": "Medir isolação", "oficina": "Elétrica", "tipo_manutencao": "Preditiva", "frequencia": "Anual", "status_ativo": 1}
            ]}),
        );
        mock.ok(Metodo::Get, "/api/pmps", json!({"success": true, "pmps": []}));
        mock
    }

    #[tokio::test]
    async fn saving_new_pmp_posts_membership() {
        let mock = mock_equipamento();
        mock.ok(
            Metodo::Post,
            "/api/pmps",
            json!({"success": true, "pmp": {"id": 5, "codigo": "PMP-EB01-001", "descricao": "x", "atividades_ids": [1]}}),
        );
        let service = PmpService::new(PlanoRepository::new(), AssetRepository::new());
        let form = PmpForm { codigo: "PMP-EB01-001".into(), descricao: "Mecânica mensal".into(), atividades_ids: vec![1] };

        let salvo = service.salvar_pmp(&cliente(&mock), 7, None, &form).await.unwrap();

        assert_eq!(salvo.id, Some(5));
        let post = &mock.chamadas_para(Metodo::Post, "/api/pmps")[0];
        let corpo = post.corpo.clone().unwrap();
        assert_eq!(corpo["atividades_ids"], json!([1]));
        assert_eq!(corpo["oficina"], "MECÂNICA");
    }

    #[tokio::test]
    async fn pmp_cannot_mix_groups() {
        let mock = mock_equipamento();
        let service = PmpService::new(PlanoRepository::new(), AssetRepository::new());
        let form = PmpForm { codigo: "X".into(), descricao: "Y".into(), atividades_ids: vec![1, 2] };
        let err = service.salvar_pmp(&cliente(&mock), 7, None, &form).await.unwrap_err();
        assert!(matches!(err, AppError::RegraNegocio(_)));
        assert!(mock.chamadas_para(Metodo::Post, "/api/pmps").is_empty());
    }

    #[tokio::test]
    async fn copy_creates_marked_clone() {
        let mock = mock_equipamento();
        mock.ok(
            Metodo::Post,
            "/api/plano-mestre/atividades",
            json!({"success": true, "atividade": {"id": 3, "descricao": "Lubrificar (cópia)", "oficina": "Mecânica", "tipo_manutencao": "Preventiva", "frequencia": "Mensal"}}),
        );
        let service = PmpService::new(PlanoRepository::new(), AssetRepository::new());

        service.copiar_atividade(&cliente(&mock), 7, 1).await.unwrap();

        let corpo = mock.chamadas_para(Metodo::Post, "/api/plano-mestre/atividades")[0].corpo.clone().unwrap();
        assert_eq!(corpo["descricao"], "Lubrificar (cópia)");
        assert!(corpo.get("id").is_none());
    }

    #[tokio::test]
    async fn toggle_flips_active_flag() {
        let mock = mock_equipamento();
        mock.ok(
            Metodo::Put,
            "/api/plano-mestre/atividades/2",
            json!({"success": true, "atividade": {"id": 2, "status_ativo": false}}),
        );
        let service = PmpService::new(PlanoRepository::new(), AssetRepository::new());

        service.alternar_atividade(&cliente(&mock), 7, 2).await.unwrap();

        let corpo = mock.chamadas_para(Metodo::Put, "/api/plano-mestre/atividades/2")[0].corpo.clone().unwrap();
        assert_eq!(corpo["status_ativo"], false);
    }

    #[tokio::test]
    async fn unauthorized_activity_create_surfaces_error() {
        let mock = mock_equipamento();
        mock.responder(Metodo::Post, "/api/plano-mestre/atividades", 401, json!({"message": "login"}));
        let service = PmpService::new(PlanoRepository::new(), AssetRepository::new());
        let nova = atividade(0, "Mecânica", "Mensal", "Preventiva", true);

        let err = service.criar_atividade(&cliente(&mock), 7, nova).await.unwrap_err();
        assert!(matches!(err, AppError::NaoAutenticado));
    }
}
