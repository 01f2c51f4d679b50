// src/services/arvore_service.rs

use std::collections::HashMap;

use serde::Serialize;
use validator::Validate;

use crate::{
    api::{AssetRepository, BackendClient},
    common::error::AppError,
    middleware::rbac::{exigir, ExcluirAtivos},
    models::{
        ativos::{EdicaoNo, Equipamento, Filial, Setor, TipoNo},
        usuarios::User,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct NoSetor {
    pub setor: Setor,
    pub equipamentos: Vec<Equipamento>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoFilial {
    pub filial: Filial,
    pub setores: Vec<NoSetor>,
}

/// O que o modal de informações mostra, com os "pais" resolvidos.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum DetalheNo {
    Filial {
        filial: Filial,
    },
    Setor {
        setor: Setor,
        filial: Option<Filial>,
    },
    Equipamento {
        equipamento: Equipamento,
        setor: Option<Setor>,
        filial: Option<Filial>,
    },
}

/// Monta a árvore Filial -> Setor -> Equipamento pelas chaves estrangeiras.
/// Setores/equipamentos sem pai conhecido não aparecem em nenhum nó.
pub fn montar_arvore(
    filiais: Vec<Filial>,
    setores: Vec<Setor>,
    equipamentos: Vec<Equipamento>,
) -> Vec<NoFilial> {
    let mut equip_por_setor: HashMap<i64, Vec<Equipamento>> = HashMap::new();
    for e in equipamentos {
        if let Some(setor_id) = e.setor_id {
            equip_por_setor.entry(setor_id).or_default().push(e);
        }
    }

    let mut setores_por_filial: HashMap<i64, Vec<NoSetor>> = HashMap::new();
    for s in setores {
        if let Some(filial_id) = s.filial_id {
            let equipamentos = equip_por_setor.remove(&s.id).unwrap_or_default();
            setores_por_filial
                .entry(filial_id)
                .or_default()
                .push(NoSetor { setor: s, equipamentos });
        }
    }

    filiais
        .into_iter()
        .map(|f| NoFilial {
            setores: setores_por_filial.remove(&f.id).unwrap_or_default(),
            filial: f,
        })
        .collect()
}

#[derive(Clone)]
pub struct ArvoreService {
    repo: AssetRepository,
}

impl ArvoreService {
    pub fn new(repo: AssetRepository) -> Self {
        Self { repo }
    }

    /// As três listas, buscadas em paralelo.
    pub async fn carregar_listas(
        &self,
        client: &BackendClient,
    ) -> Result<(Vec<Filial>, Vec<Setor>, Vec<Equipamento>), AppError> {
        tokio::try_join!(
            self.repo.list_filiais(client),
            self.repo.list_setores(client),
            self.repo.list_equipamentos(client),
        )
    }

    pub async fn carregar(&self, client: &BackendClient) -> Result<Vec<NoFilial>, AppError> {
        let (filiais, setores, equipamentos) = self.carregar_listas(client).await?;
        tracing::info!(
            "Árvore carregada: {} filiais, {} setores, {} equipamentos",
            filiais.len(),
            setores.len(),
            equipamentos.len()
        );
        Ok(montar_arvore(filiais, setores, equipamentos))
    }

    pub async fn detalhes(
        &self,
        client: &BackendClient,
        tipo: TipoNo,
        id: i64,
    ) -> Result<DetalheNo, AppError> {
        let (filiais, setores, equipamentos) = self.carregar_listas(client).await?;
        let filial_de = |fid: Option<i64>| {
            fid.and_then(|fid| filiais.iter().find(|f| f.id == fid).cloned())
        };
        let nao_encontrado = || AppError::ResourceNotFound(format!("{} #{}", tipo.rotulo(), id));

        match tipo {
            TipoNo::Filial => {
                let filial = filiais.iter().find(|f| f.id == id).cloned().ok_or_else(nao_encontrado)?;
                Ok(DetalheNo::Filial { filial })
            }
            TipoNo::Setor => {
                let setor = setores.iter().find(|s| s.id == id).cloned().ok_or_else(nao_encontrado)?;
                let filial = filial_de(setor.filial_id);
                Ok(DetalheNo::Setor { setor, filial })
            }
            TipoNo::Equipamento => {
                let equipamento = equipamentos
                    .iter()
                    .find(|e| e.id == id)
                    .cloned()
                    .ok_or_else(nao_encontrado)?;
                let setor = equipamento
                    .setor_id
                    .and_then(|sid| setores.iter().find(|s| s.id == sid).cloned());
                let filial = filial_de(setor.as_ref().and_then(|s| s.filial_id));
                Ok(DetalheNo::Equipamento { equipamento, setor, filial })
            }
        }
    }

    pub async fn editar(
        &self,
        client: &BackendClient,
        id: i64,
        edicao: &EdicaoNo,
    ) -> Result<String, AppError> {
        match edicao {
            EdicaoNo::Filial(f) => f.validate()?,
            EdicaoNo::Setor(s) => s.validate()?,
            EdicaoNo::Equipamento(e) => e.validate()?,
        }

        let msg = self.repo.update(client, id, edicao).await?;
        Ok(msg.unwrap_or_else(|| format!("{} atualizado(a) com sucesso.", edicao.tipo().rotulo())))
    }

    /// Exclusão: só admin/master; filial e setor exigem confirmar a cascata.
    pub async fn excluir(
        &self,
        client: &BackendClient,
        user: &User,
        tipo: TipoNo,
        id: i64,
        confirmar_cascata: bool,
    ) -> Result<String, AppError> {
        exigir::<ExcluirAtivos>(user)?;

        if tipo.exclusao_em_cascata() && !confirmar_cascata {
            let filhos = match tipo {
                TipoNo::Filial => "todos os setores e equipamentos",
                _ => "todos os equipamentos",
            };
            return Err(AppError::ConfirmacaoNecessaria(format!(
                "Excluir este(a) {} remove também {} vinculados. Confirme novamente para continuar.",
                tipo.rotulo().to_lowercase(),
                filhos
            )));
        }

        let msg = self.repo.delete(client, tipo, id).await?;
        tracing::info!("{} #{} excluído(a) por {}", tipo.rotulo(), id, user.email);
        Ok(msg.unwrap_or_else(|| format!("{} excluído(a) com sucesso.", tipo.rotulo())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::testing::{cliente, MockTransport};
    use crate::api::Metodo;
    use crate::models::usuarios::Perfil;
    use serde_json::json;

    fn filial(id: i64) -> Filial {
        Filial { id, tag: format!("F{id:02}"), ..Default::default() }
    }

    fn setor(id: i64, filial_id: i64) -> Setor {
        Setor { id, tag: format!("S{id}"), filial_id: Some(filial_id), ..Default::default() }
    }

    fn equip(id: i64, setor_id: i64) -> Equipamento {
        Equipamento { id, tag: format!("E{id}"), setor_id: Some(setor_id), ..Default::default() }
    }

    #[test]
    fn tree_children_follow_foreign_keys() {
        let arvore = montar_arvore(
            vec![filial(1), filial(2)],
            vec![setor(10, 1), setor(11, 1), setor(20, 2), setor(99, 42)],
            vec![equip(100, 10), equip(101, 10), equip(200, 20), equip(999, 77)],
        );

        assert_eq!(arvore.len(), 2);
        assert_eq!(arvore[0].setores.len(), 2);
        assert!(arvore[0].setores.iter().all(|s| s.setor.filial_id == Some(1)));
        assert_eq!(arvore[0].setores[0].equipamentos.len(), 2);
        assert!(arvore[0].setores[1].equipamentos.is_empty());
        assert_eq!(arvore[1].setores[0].equipamentos[0].id, 200);

        let total_equip: usize = arvore
            .iter()
            .flat_map(|f| &f.setores)
            .map(|s| s.equipamentos.len())
            .sum();
        assert_eq!(total_equip, 3);
    }

    fn mock_listas() -> std::sync::Arc<MockTransport> {
        let mock = MockTransport::new();
        mock.ok(Metodo::Get, "/api/filiais", json!({"success": true, "filiais": [{"id": 1, "tag": "F01"}]}));
        mock.ok(Metodo::Get, "/api/setores", json!({"success": true, "setores": [{"id": 3, "tag": "S03", "filial_id": 1}]}));
        mock.ok(
            Metodo::Get,
            "/api/equipamentos",
            json!({"success": true, "equipamentos": [{"id": 7, "tag": "F01-EXT-EB01", "setor_id": 3}]}),
        );
        mock
    }

    #[tokio::test]
    async fn loads_three_lists_and_builds_tree() {
        let mock = mock_listas();
        let service = ArvoreService::new(AssetRepository::new());
        let arvore = service.carregar(&cliente(&mock)).await.unwrap();
        assert_eq!(arvore[0].setores[0].equipamentos[0].tag, "F01-EXT-EB01");
        assert_eq!(mock.chamadas().len(), 3);
    }

    #[tokio::test]
    async fn equipment_details_resolve_parents() {
        let mock = mock_listas();
        let service = ArvoreService::new(AssetRepository::new());
        let detalhe = service.detalhes(&cliente(&mock), TipoNo::Equipamento, 7).await.unwrap();
        match detalhe {
            DetalheNo::Equipamento { setor, filial, .. } => {
                assert_eq!(setor.unwrap().id, 3);
                assert_eq!(filial.unwrap().id, 1);
            }
            outro => panic!("detalhe inesperado: {outro:?}"),
        }
    }

    #[tokio::test]
    async fn technicians_cannot_delete() {
        let mock = MockTransport::new();
        let service = ArvoreService::new(AssetRepository::new());
        let tecnico = User { id: 2, profile: Perfil::User, ..Default::default() };

        let err = service
            .excluir(&cliente(&mock), &tecnico, TipoNo::Equipamento, 7, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(mock.chamadas().is_empty());
    }

    #[tokio::test]
    async fn branch_delete_requires_cascade_confirmation() {
        let mock = MockTransport::new();
        mock.ok(Metodo::Delete, "/api/filiais/1", json!({"success": true, "message": "Filial excluída"}));
        let service = ArvoreService::new(AssetRepository::new());
        let admin = User { id: 1, profile: Perfil::Admin, ..Default::default() };

        let err = service
            .excluir(&cliente(&mock), &admin, TipoNo::Filial, 1, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConfirmacaoNecessaria(_)));
        assert!(mock.chamadas().is_empty());

        let msg = service
            .excluir(&cliente(&mock), &admin, TipoNo::Filial, 1, true)
            .await
            .unwrap();
        assert_eq!(msg, "Filial excluída");
        assert_eq!(mock.chamadas_para(Metodo::Delete, "/api/filiais/1").len(), 1);
    }

    #[tokio::test]
    async fn edit_validates_before_calling_backend() {
        let mock = MockTransport::new();
        let service = ArvoreService::new(AssetRepository::new());
        let edicao: EdicaoNo =
            serde_json::from_value(json!({"tipo": "setor", "tag": "", "descricao": "Utilidades", "filial_id": 1}))
                .unwrap();
        let err = service.editar(&cliente(&mock), 3, &edicao).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(mock.chamadas().is_empty());
    }
}
