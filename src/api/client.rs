// src/api/client.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metodo {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub metodo: Metodo,
    pub caminho: String,
    pub query: Vec<(String, String)>,
    pub corpo: Option<Value>,
    // Cabeçalho Cookie repassado do navegador (a sessão pertence ao backend)
    pub sessao: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: u16,
    pub corpo: Value,
}

/// A "porta" de saída para o backend REST. Os testes trocam por um dublê.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn enviar(&self, req: BackendRequest) -> Result<BackendResponse, AppError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn enviar(&self, req: BackendRequest) -> Result<BackendResponse, AppError> {
        let url = format!("{}{}", self.base_url, req.caminho);
        let mut builder = match req.metodo {
            Metodo::Get => self.http.get(&url),
            Metodo::Post => self.http.post(&url),
            Metodo::Put => self.http.put(&url),
            Metodo::Delete => self.http.delete(&url),
        };

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(corpo) = &req.corpo {
            builder = builder.json(corpo);
        }
        if let Some(cookie) = &req.sessao {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }

        let resposta = builder.send().await?;
        let status = resposta.status().as_u16();
        let texto = resposta.text().await?;

        // Corpo vazio (204) ou HTML de erro do proxy: não é JSON, mas o status ainda vale.
        let corpo = if texto.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&texto) {
                Ok(v) => v,
                Err(e) if (200..300).contains(&status) => return Err(AppError::JsonError(e)),
                Err(_) => Value::String(texto),
            }
        };

        Ok(BackendResponse { status, corpo })
    }
}

/// Cliente do backend: entende o envelope `{success, <entidade>, message?}`.
#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn Transport>,
    sessao: Option<String>,
    cookie_sessao: Arc<str>,
}

pub const COOKIE_SESSAO_PADRAO: &str = "laravel_session";

impl BackendClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, sessao: None, cookie_sessao: COOKIE_SESSAO_PADRAO.into() }
    }

    /// Nome do cookie que identifica a sessão no backend.
    pub fn com_cookie_sessao(mut self, nome: &str) -> Self {
        self.cookie_sessao = nome.into();
        self
    }

    pub fn com_sessao(&self, sessao: Option<String>) -> Self {
        Self {
            transport: self.transport.clone(),
            sessao,
            cookie_sessao: self.cookie_sessao.clone(),
        }
    }

    /// Cabeçalho `Cookie` inteiro, repassado ao backend.
    pub fn sessao(&self) -> Option<&str> {
        self.sessao.as_deref()
    }

    /// Só o valor do cookie de sessão; é a chave dos caches por sessão.
    pub fn chave_sessao(&self) -> Option<&str> {
        self.sessao
            .as_deref()?
            .split(';')
            .filter_map(|par| par.trim().split_once('='))
            .find(|(nome, _)| *nome == &*self.cookie_sessao)
            .map(|(_, valor)| valor)
            .filter(|valor| !valor.is_empty())
    }

    pub async fn requisitar(
        &self,
        metodo: Metodo,
        caminho: &str,
        query: &[(&str, &str)],
        corpo: Option<Value>,
    ) -> Result<Value, AppError> {
        let req = BackendRequest {
            metodo,
            caminho: caminho.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            corpo,
            sessao: self.sessao.clone(),
        };

        let resposta = self.transport.enviar(req).await?;

        if resposta.status == 401 {
            return Err(AppError::NaoAutenticado);
        }

        let recusado = resposta.corpo.get("success").and_then(Value::as_bool) == Some(false);
        if !(200..300).contains(&resposta.status) || recusado {
            let message = mensagem_de(&resposta.corpo)
                .unwrap_or_else(|| format!("Falha na requisição para {}", caminho));
            tracing::warn!(
                "Backend recusou {:?} {} ({}): {}",
                metodo,
                caminho,
                resposta.status,
                message
            );
            return Err(AppError::Backend { status: resposta.status, message });
        }

        Ok(resposta.corpo)
    }

    pub async fn get<T: DeserializeOwned>(&self, caminho: &str, chave: &str) -> Result<T, AppError> {
        self.get_com_query(caminho, &[], chave).await
    }

    pub async fn get_com_query<T: DeserializeOwned>(
        &self,
        caminho: &str,
        query: &[(&str, &str)],
        chave: &str,
    ) -> Result<T, AppError> {
        let corpo = self.requisitar(Metodo::Get, caminho, query, None).await?;
        extrair(corpo, chave)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        caminho: &str,
        corpo: &B,
        chave: &str,
    ) -> Result<T, AppError> {
        let corpo = serde_json::to_value(corpo)?;
        let resposta = self.requisitar(Metodo::Post, caminho, &[], Some(corpo)).await?;
        extrair(resposta, chave)
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        caminho: &str,
        corpo: &B,
        chave: &str,
    ) -> Result<T, AppError> {
        let corpo = serde_json::to_value(corpo)?;
        let resposta = self.requisitar(Metodo::Put, caminho, &[], Some(corpo)).await?;
        extrair(resposta, chave)
    }

    /// Para operações em que só interessa o `success` (e a mensagem).
    pub async fn executar(
        &self,
        metodo: Metodo,
        caminho: &str,
        corpo: Option<Value>,
    ) -> Result<Option<String>, AppError> {
        let resposta = self.requisitar(metodo, caminho, &[], corpo).await?;
        Ok(mensagem_de(&resposta))
    }
}

fn mensagem_de(corpo: &Value) -> Option<String> {
    match corpo {
        Value::String(s) if !s.trim().is_empty() && !s.trim_start().starts_with('<') => {
            Some(s.trim().to_string())
        }
        Value::Object(m) => m
            .get("message")
            .or_else(|| m.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Tira a entidade do envelope; listas "peladas" também são aceitas.
fn extrair<T: DeserializeOwned>(corpo: Value, chave: &str) -> Result<T, AppError> {
    let valor = match corpo {
        Value::Object(mut m) => m.remove(chave).unwrap_or(Value::Null),
        outro => outro,
    };
    Ok(serde_json::from_value(valor)?)
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Transporte falso: responde o que foi registrado e anota cada chamada.
    #[derive(Default)]
    pub struct MockTransport {
        rotas: Mutex<HashMap<(Metodo, String), (u16, Value)>>,
        chamadas: Mutex<Vec<BackendRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn responder(&self, metodo: Metodo, caminho: &str, status: u16, corpo: Value) {
            self.rotas
                .lock()
                .unwrap()
                .insert((metodo, caminho.to_string()), (status, corpo));
        }

        pub fn ok(&self, metodo: Metodo, caminho: &str, corpo: Value) {
            self.responder(metodo, caminho, 200, corpo);
        }

        pub fn chamadas(&self) -> Vec<BackendRequest> {
            self.chamadas.lock().unwrap().clone()
        }

        pub fn chamadas_para(&self, metodo: Metodo, caminho: &str) -> Vec<BackendRequest> {
            self.chamadas()
                .into_iter()
                .filter(|c| c.metodo == metodo && c.caminho == caminho)
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn enviar(&self, req: BackendRequest) -> Result<BackendResponse, AppError> {
            self.chamadas.lock().unwrap().push(req.clone());
            let rota = self
                .rotas
                .lock()
                .unwrap()
                .get(&(req.metodo, req.caminho.clone()))
                .cloned();
            let (status, corpo) = rota.unwrap_or((
                404,
                serde_json::json!({ "success": false, "message": "rota não mapeada" }),
            ));
            Ok(BackendResponse { status, corpo })
        }
    }

    pub fn cliente(mock: &Arc<MockTransport>) -> BackendClient {
        BackendClient::new(mock.clone())
    }
}
