// src/capacidades.rs

use std::sync::Arc;

use async_trait::async_trait;
use genpdf::{elements, fonts::FontData, fonts::FontFamily, style, Alignment, Element};
use image::{DynamicImage, Luma};
use qrcode::{render::svg, QrCode};

use crate::common::error::AppError;

// =============================================================================
//  QR CODE
// =============================================================================

/// Quem sabe desenhar um QR code. Escolhido uma vez, na inicialização.
#[async_trait]
pub trait QrProvider: Send + Sync {
    fn nome(&self) -> &'static str;

    /// HTML pronto para a grade (SVG inline ou `<img>`).
    fn markup(&self, conteudo: &str) -> Result<String, AppError>;

    /// Imagem rasterizada para o PDF.
    async fn imagem(&self, conteudo: &str) -> Result<DynamicImage, AppError>;
}

#[derive(Clone, Default)]
pub struct LocalQrProvider;

impl LocalQrProvider {
    fn codigo(conteudo: &str) -> Result<QrCode, AppError> {
        QrCode::new(conteudo.as_bytes()).map_err(|e| AppError::QrCode(e.to_string()))
    }
}

#[async_trait]
impl QrProvider for LocalQrProvider {
    fn nome(&self) -> &'static str {
        "local"
    }

    fn markup(&self, conteudo: &str) -> Result<String, AppError> {
        let svg = Self::codigo(conteudo)?
            .render::<svg::Color>()
            .min_dimensions(150, 150)
            .quiet_zone(true)
            .build();
        Ok(svg)
    }

    async fn imagem(&self, conteudo: &str) -> Result<DynamicImage, AppError> {
        let buffer = Self::codigo(conteudo)?
            .render::<Luma<u8>>()
            .min_dimensions(300, 300)
            .build();
        Ok(DynamicImage::ImageLuma8(buffer))
    }
}

/// Serviço remoto de imagens de QR (ex.: api.qrserver.com).
pub struct RemoteQrProvider {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteQrProvider {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, base_url: base_url.to_string() }
    }

    fn url(&self, conteudo: &str, tamanho: u32) -> Result<reqwest::Url, AppError> {
        let size = format!("{}x{}", tamanho, tamanho);
        reqwest::Url::parse_with_params(&self.base_url, &[("size", size.as_str()), ("data", conteudo)])
            .map_err(|e| AppError::QrCode(e.to_string()))
    }
}

#[async_trait]
impl QrProvider for RemoteQrProvider {
    fn nome(&self) -> &'static str {
        "remoto"
    }

    fn markup(&self, conteudo: &str) -> Result<String, AppError> {
        let url = self.url(conteudo, 150)?;
        Ok(format!(
            r#"<img src="{}" width="150" height="150" alt="QR code">"#,
            crate::common::format::escapar_html(url.as_str())
        ))
    }

    async fn imagem(&self, conteudo: &str) -> Result<DynamicImage, AppError> {
        let bytes = self
            .http
            .get(self.url(conteudo, 300)?)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        image::load_from_memory(&bytes).map_err(|e| AppError::QrCode(e.to_string()))
    }
}

// =============================================================================
//  PDF
// =============================================================================

/// Uma etiqueta da grade de QR codes.
pub struct EtiquetaQr {
    pub titulo: String,
    pub subtitulo: String,
    pub imagem: DynamicImage,
}

pub struct PdfExporter {
    fontes: FontFamily<FontData>,
}

impl PdfExporter {
    /// Carrega a família de fontes da pasta indicada (ex.: `./fonts/Roboto-*.ttf`).
    pub fn carregar(pasta: &str, familia: &str) -> Result<Self, AppError> {
        let fontes = genpdf::fonts::from_files(pasta, familia, None)
            .map_err(|e| AppError::Pdf(format!("fonte '{}' não encontrada em {}: {}", familia, pasta, e)))?;
        Ok(Self { fontes })
    }

    /// Grade de duas colunas: QR, TAG e descrição em cada célula.
    pub fn exportar_qrcodes(&self, titulo: &str, etiquetas: Vec<EtiquetaQr>) -> Result<Vec<u8>, AppError> {
        let mut doc = genpdf::Document::new(self.fontes.clone());
        doc.set_title(titulo);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(titulo)
                .aligned(Alignment::Center)
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(elements::Break::new(1.5));

        let mut table = elements::TableLayout::new(vec![1, 1]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(false, false, false));

        let mut etiquetas = etiquetas.into_iter();
        while let Some(primeira) = etiquetas.next() {
            let segunda = etiquetas.next();
            let mut linha = table.row().element(Self::celula(primeira)?);
            linha = match segunda {
                Some(e) => linha.element(Self::celula(e)?),
                None => linha.element(elements::Paragraph::new("")),
            };
            linha.push().map_err(|e| AppError::Pdf(e.to_string()))?;
        }

        doc.push(table);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(|e| AppError::Pdf(e.to_string()))?;
        Ok(buffer)
    }

    fn celula(etiqueta: EtiquetaQr) -> Result<impl Element, AppError> {
        let imagem = elements::Image::from_dynamic_image(etiqueta.imagem)
            .map_err(|e| AppError::Pdf(e.to_string()))?
            .with_alignment(Alignment::Center)
            .with_scale(genpdf::Scale::new(0.5, 0.5));

        let layout = elements::LinearLayout::vertical()
            .element(imagem)
            .element(
                elements::Paragraph::new(etiqueta.titulo)
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().bold().with_font_size(11)),
            )
            .element(
                elements::Paragraph::new(etiqueta.subtitulo)
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().with_font_size(8)),
            );

        Ok(layout.padded(4))
    }
}

// =============================================================================
//  CONJUNTO
// =============================================================================

/// Capacidades opcionais do servidor; sem provedor, um único erro bem definido.
#[derive(Clone, Default)]
pub struct Capacidades {
    pub qr: Option<Arc<dyn QrProvider>>,
    pub pdf: Option<Arc<PdfExporter>>,
}

impl Capacidades {
    pub fn qr(&self) -> Result<&Arc<dyn QrProvider>, AppError> {
        self.qr.as_ref().ok_or(AppError::CapacidadeIndisponivel("gerador de QR code"))
    }

    pub fn pdf(&self) -> Result<&Arc<PdfExporter>, AppError> {
        self.pdf.as_ref().ok_or(AppError::CapacidadeIndisponivel("exportação em PDF"))
    }
}
