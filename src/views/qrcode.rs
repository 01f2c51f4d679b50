// src/views/qrcode.rs

use axum::response::Html;

use crate::{
    common::format::escapar_html as esc,
    models::usuarios::User,
    services::qrcode_service::{FiltroQr, ListaQr, ResultadoLeitura},
    views::layout::render_page,
};

const CSS: &str = r#"
    .filtros { display: flex; gap: 12px; align-items: flex-end; flex-wrap: wrap; }
    .grade-qr { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 14px; }
    .qr-item { background: #fff; border-radius: 8px; box-shadow: var(--shadow); padding: 12px; text-align: center; }
    .qr-item svg, .qr-item img { width: 150px; height: 150px; }
    .qr-item .tag { font-weight: 700; margin-top: 6px; }
    #leitor { width: 100%; max-width: 420px; margin: 0 auto; }
    .atalhos { display: flex; gap: 10px; margin-top: 12px; }
"#;

fn opcao(id: i64, rotulo: &str, selecionado: Option<i64>) -> String {
    let sel = if Some(id) == selecionado { " selected" } else { "" };
    format!(r#"<option value="{id}"{sel}>{}</option>"#, esc(rotulo))
}

fn query_filtro(filtro: &FiltroQr) -> String {
    let mut partes = Vec::new();
    if let Some(f) = filtro.filial_id {
        partes.push(format!("filial_id={f}"));
    }
    if let Some(s) = filtro.setor_id {
        partes.push(format!("setor_id={s}"));
    }
    partes.join("&")
}

pub fn qrcodes_page(usuario: &User, lista: &ListaQr, filtro: &FiltroQr) -> Html<String> {
    let filiais: String = lista
        .filiais
        .iter()
        .map(|f| opcao(f.id, &f.tag, filtro.filial_id))
        .collect();
    let setores: String = lista
        .setores
        .iter()
        .filter(|s| filtro.filial_id.is_none() || s.filial_id == filtro.filial_id)
        .map(|s| opcao(s.id, &s.tag, filtro.setor_id))
        .collect();

    // O markup do QR vem do provedor (SVG gerado aqui ou <img> com URL já escapada).
    let itens: String = lista
        .cartoes
        .iter()
        .map(|c| {
            format!(
                r#"<div class="qr-item">
                    {markup}
                    <div class="tag">{tag}</div>
                    <div class="muted">{descricao}</div>
                    <div class="muted">{filial} / {setor}</div>
                </div>"#,
                markup = c.markup,
                tag = esc(&c.conteudo.tag),
                descricao = esc(&c.conteudo.descricao),
                filial = esc(c.filial.as_deref().unwrap_or("-")),
                setor = esc(c.setor.as_deref().unwrap_or("-")),
            )
        })
        .collect();
    let vazio = if lista.cartoes.is_empty() {
        r#"<p class="muted">Nenhum equipamento para o filtro selecionado.</p>"#
    } else {
        ""
    };

    let content = format!(
        r#"
        <style>{CSS}</style>
        <h1>QR Codes dos Equipamentos</h1>
        <form class="card filtros" method="get" action="/qrcodes">
            <div><label>Filial</label><select name="filial_id" onchange="this.form.setor_id.value=''; this.form.submit()"><option value="">Todas</option>{filiais}</select></div>
            <div><label>Setor</label><select name="setor_id" onchange="this.form.submit()"><option value="">Todos</option>{setores}</select></div>
            <a class="btn btn-ok" href="/qrcodes/pdf?{query}">Exportar PDF</a>
            <span class="muted">{n} equipamento(s)</span>
        </form>
        {vazio}
        <div class="grade-qr">{itens}</div>
        "#,
        query = query_filtro(filtro),
        n = lista.cartoes.len(),
    );
    render_page("QR Codes", Some(usuario), content)
}

pub fn scanner_page(usuario: &User) -> Html<String> {
    let content = format!(
        r#"
        <style>{CSS}</style>
        <h1>Leitor de QR Code</h1>
        <div class="card">
            <div id="leitor"></div>
            <label>Ou digite o conteúdo/TAG lido</label>
            <form onsubmit="event.preventDefault(); lerQr(this.texto.value);" style="display:flex; gap:8px">
                <input name="texto" style="flex:1" placeholder="F01-EXT-EB01">
                <button class="btn" type="submit">Buscar</button>
            </form>
        </div>
        <div id="resultado"></div>
        <script src="https://unpkg.com/html5-qrcode@2.3.8/html5-qrcode.min.js"></script>
        <script>
            let lendo = false;
            async function lerQr(texto) {{
                if (lendo) return;
                lendo = true;
                const r = await enviarAcao('POST', '/qrcodes/ler', {{ texto }});
                if (r.success) document.getElementById('resultado').innerHTML = r.html;
                setTimeout(() => {{ lendo = false; }}, 1500);
            }}
            document.addEventListener('DOMContentLoaded', () => {{
                if (typeof Html5QrcodeScanner === 'undefined') {{
                    document.getElementById('leitor').innerHTML = '<p class="muted">Câmera indisponível; use a busca manual.</p>';
                    return;
                }}
                const scanner = new Html5QrcodeScanner('leitor', {{ fps: 10, qrbox: 250 }}, false);
                scanner.render(texto => lerQr(texto), () => {{}});
            }});
        </script>
        "#
    );
    render_page("Leitor de QR Code", Some(usuario), content)
}

pub fn fragmento_leitura(resultado: &ResultadoLeitura) -> String {
    let atalhos: String = resultado
        .atalhos
        .iter()
        .map(|a| format!(r#"<a class="btn" href="{}">{}</a>"#, esc(&a.url), a.rotulo))
        .collect();
    format!(
        r#"<div class="card">
            <h2>{tag}</h2>
            <p>{descricao}</p>
            <div class="atalhos">{atalhos}<a class="btn btn-neutro" href="/pmp/equipamento/{id}">Plano de manutenção</a></div>
        </div>"#,
        tag = esc(&resultado.equipamento.tag),
        descricao = esc(&resultado.equipamento.descricao),
        id = resultado.equipamento.id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ativos::{Equipamento, Filial, Setor};
    use crate::services::qrcode_service::{atalhos_para, CartaoQr, ConteudoQr};

    #[test]
    fn pdf_link_keeps_filter() {
        let lista = ListaQr {
            filiais: vec![Filial { id: 1, tag: "F01".into(), ..Default::default() }],
            setores: vec![Setor { id: 3, tag: "S03".into(), filial_id: Some(1), ..Default::default() }],
            cartoes: vec![CartaoQr {
                conteudo: ConteudoQr { id: 7, tag: "EB<01>".into(), descricao: String::new(), setor_id: Some(3), filial_id: Some(1) },
                setor: Some("S03".into()),
                filial: Some("F01".into()),
                markup: "<svg></svg>".into(),
            }],
        };
        let filtro = FiltroQr { filial_id: Some(1), setor_id: Some(3) };
        let Html(html) = qrcodes_page(&User::default(), &lista, &filtro);
        assert!(html.contains("/qrcodes/pdf?filial_id=1&setor_id=3"));
        assert!(html.contains("<svg></svg>"));
        assert!(html.contains("EB&lt;01&gt;"));
        assert!(html.contains(r#"<option value="3" selected>S03</option>"#));
    }

    #[test]
    fn scan_result_lists_shortcuts() {
        let equipamento = Equipamento { id: 7, tag: "EB01".into(), ..Default::default() };
        let resultado = ResultadoLeitura { atalhos: atalhos_para(&equipamento), equipamento };
        let html = fragmento_leitura(&resultado);
        assert!(html.contains("/chamados/novo?equipamento_id=7&amp;tag=EB01"));
        assert!(html.contains("Nova ordem de serviço"));
    }
}
