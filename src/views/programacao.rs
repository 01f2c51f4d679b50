// src/views/programacao.rs

use axum::response::Html;
use chrono::{Datelike, NaiveDate, Weekday};

use crate::{
    common::format::{escapar_html as esc, formatar_data_br},
    models::{ordens::OrdemServico, usuarios::User},
    services::programacao_service::{raia_da_ordem, Quadro},
    views::layout::render_page,
};

const CSS: &str = r#"
    .semana-nav { display: flex; align-items: center; gap: 12px; margin-bottom: 12px; }
    .raias { display: grid; grid-template-columns: repeat(5, 1fr); gap: 10px; margin-bottom: 20px; }
    .raia { background: #fff; border-radius: 8px; box-shadow: var(--shadow); padding: 8px; min-height: 120px; }
    .raia h3 { margin: 0 0 8px; font-size: 14px; text-transform: uppercase; }
    .raia.baixa h3 { color: #2e7d32; } .raia.media h3 { color: #f9a825; } .raia.alta h3 { color: #ef6c00; }
    .raia.seguranca h3 { color: #c62828; } .raia.preventiva h3 { color: #1565c0; }
    .grade th.dia { text-align: center; min-width: 120px; }
    .grade td.celula { min-height: 60px; height: 60px; background: #fafafa; }
    .alvo { outline: 2px dashed var(--primary-color); background: #e3f2fd !important; }
    .card-os { background: #fff; border-left: 4px solid var(--text-light); border-radius: 4px; padding: 6px 8px; margin-bottom: 6px; font-size: 12px; cursor: grab; box-shadow: 0 1px 2px rgba(0,0,0,0.15); }
    .card-os .titulo { font-weight: 700; }
    .card-os.status-aberta { border-left-color: #9e9e9e; }
    .card-os.status-programada { border-left-color: #1565c0; }
    .card-os.status-em_andamento { border-left-color: #ef6c00; }
    .card-os.status-concluida { border-left-color: #2e7d32; opacity: 0.7; }
    .card-os.status-cancelada { border-left-color: #c62828; opacity: 0.5; }
    #menu-contexto { position: fixed; display: none; background: #fff; box-shadow: var(--shadow); border-radius: 4px; z-index: 950; }
    #menu-contexto button { display: block; width: 100%; border: none; background: none; padding: 8px 14px; text-align: left; cursor: pointer; }
    #menu-contexto button:hover { background: #e3f2fd; }
"#;

const JS: &str = r#"
    let arrastando = null;

    function semanaAtual() { return document.getElementById('quadro').dataset.semana; }

    function atualizarQuadro(html) {
        if (html) { document.getElementById('quadro').outerHTML = html; ligarQuadro(); }
    }

    async function recarregarQuadro() {
        const r = await fetch(`/programacao/quadro?semana=${semanaAtual()}`, { credentials: 'same-origin' });
        const d = await r.json().catch(() => ({}));
        if (d.success) atualizarQuadro(d.html);
    }

    function ligarQuadro() {
        document.querySelectorAll('.card-os[draggable]').forEach(card => {
            card.addEventListener('dragstart', ev => {
                arrastando = card.dataset.osId;
                ev.dataTransfer.setData('text/plain', arrastando);
            });
            card.addEventListener('contextmenu', ev => {
                if (card.dataset.programada !== 'true') return;
                ev.preventDefault();
                const menu = document.getElementById('menu-contexto');
                menu.dataset.osId = card.dataset.osId;
                menu.style.left = ev.clientX + 'px';
                menu.style.top = ev.clientY + 'px';
                menu.style.display = 'block';
            });
        });
        document.querySelectorAll('[data-alvo]').forEach(alvo => {
            alvo.addEventListener('dragover', ev => { ev.preventDefault(); alvo.classList.add('alvo'); });
            alvo.addEventListener('dragleave', () => alvo.classList.remove('alvo'));
            alvo.addEventListener('drop', async ev => {
                ev.preventDefault();
                alvo.classList.remove('alvo');
                const osId = Number(ev.dataTransfer.getData('text/plain') || arrastando);
                if (!osId) return;
                let r;
                if (alvo.dataset.alvo === 'celula') {
                    r = await enviarAcao('POST', `/programacao/programar?semana=${semanaAtual()}`, {
                        os_id: osId,
                        data: alvo.dataset.data,
                        usuario_id: Number(alvo.dataset.usuarioId),
                        usuario_nome: alvo.dataset.usuarioNome,
                    });
                } else {
                    r = await enviarAcao('POST', `/programacao/prioridade?semana=${semanaAtual()}`, {
                        os_id: osId,
                        prioridade: alvo.dataset.prioridade,
                    });
                }
                atualizarQuadro(r.html);
            });
        });
    }

    async function desprogramarMenu() {
        const menu = document.getElementById('menu-contexto');
        menu.style.display = 'none';
        const r = await enviarAcao('POST', `/programacao/desprogramar/${menu.dataset.osId}?semana=${semanaAtual()}`);
        atualizarQuadro(r.html);
    }

    document.addEventListener('click', () => { document.getElementById('menu-contexto').style.display = 'none'; });

    // Avisos de outras abas/telas (ex.: OS encerrada na execução).
    const eventos = new EventSource('/eventos');
    eventos.addEventListener('os_status', ev => {
        const d = JSON.parse(ev.data);
        document.querySelectorAll(`.card-os[data-os-id="${d.os_id}"]`).forEach(card => {
            card.className = card.className.replace(/status-\S+/, 'status-' + d.status);
        });
    });
    eventos.addEventListener('os_programada', () => recarregarQuadro());
    eventos.addEventListener('os_desprogramada', () => recarregarQuadro());

    document.addEventListener('DOMContentLoaded', ligarQuadro);
"#;

fn dia_curto(dia: NaiveDate) -> &'static str {
    match dia.weekday() {
        Weekday::Mon => "Seg",
        Weekday::Tue => "Ter",
        Weekday::Wed => "Qua",
        Weekday::Thu => "Qui",
        Weekday::Fri => "Sex",
        Weekday::Sat => "Sáb",
        Weekday::Sun => "Dom",
    }
}

fn render_card(os: &OrdemServico) -> String {
    let programada = os.responsavel().is_some() && os.dia_programado().is_some();
    let hh = os
        .homem_hora()
        .map(|h| format!(" · HH {:.1}", h))
        .unwrap_or_default();
    let oficina = os.oficina.as_deref().map(esc).unwrap_or_default();
    let raia = raia_da_ordem(os).map(|p| p.as_str()).unwrap_or("");
    format!(
        r#"<div class="card-os status-{status}" draggable="true" data-os-id="{id}" data-programada="{programada}" data-raia="{raia}">
            <div class="titulo">OS #{id}</div>
            <div>{descricao}</div>
            <div class="muted">{oficina}{hh} · {status_rotulo}</div>
        </div>"#,
        status = os.status.as_str(),
        id = os.id,
        descricao = esc(&os.descricao),
        status_rotulo = os.status.rotulo(),
    )
}

/// Raias + grade da semana. É o fragmento trocado depois de cada ação.
pub fn render_quadro(quadro: &Quadro) -> String {
    let semana = quadro.dias[0].format("%Y-%m-%d");

    let raias: String = quadro
        .raias
        .iter()
        .map(|r| {
            let cards: String = r.ordens.iter().map(render_card).collect();
            format!(
                r#"<div class="raia {p}" data-alvo="raia" data-prioridade="{p}">
                    <h3>{rotulo} ({n})</h3>
                    {cards}
                </div>"#,
                p = r.prioridade.as_str(),
                rotulo = r.prioridade.rotulo(),
                n = r.ordens.len(),
            )
        })
        .collect();

    let cabecalho: String = quadro
        .dias
        .iter()
        .map(|d| format!(r#"<th class="dia">{} {}</th>"#, dia_curto(*d), d.format("%d/%m")))
        .collect();

    let mut linhas = String::new();
    for linha in &quadro.linhas {
        let celulas: String = linha
            .celulas
            .iter()
            .map(|c| {
                let cards: String = c.ordens.iter().map(render_card).collect();
                format!(
                    r#"<td class="celula" data-alvo="celula" data-data="{data}" data-usuario-id="{uid}" data-usuario-nome="{nome}">{cards}</td>"#,
                    data = c.data.format("%Y-%m-%d"),
                    uid = c.usuario_id,
                    nome = esc(&c.usuario_nome),
                )
            })
            .collect();
        linhas.push_str(&format!(
            "<tr><th>{}</th>{}</tr>",
            esc(&linha.tecnico.name),
            celulas
        ));
    }
    if quadro.linhas.is_empty() {
        linhas.push_str(r#"<tr><td colspan="8" class="muted">Nenhum técnico cadastrado.</td></tr>"#);
    }

    let sem_tecnico = if quadro.sem_tecnico.is_empty() {
        String::new()
    } else {
        let cards: String = quadro.sem_tecnico.iter().map(render_card).collect();
        format!(
            r#"<div class="card"><h3>Programadas para responsáveis fora da lista de técnicos</h3>{cards}</div>"#
        )
    };

    format!(
        r#"<div id="quadro" data-semana="{semana}">
            <div class="raias">{raias}</div>
            <div class="card">
                <table class="grade">
                    <thead><tr><th>Técnico</th>{cabecalho}</tr></thead>
                    <tbody>{linhas}</tbody>
                </table>
            </div>
            {sem_tecnico}
        </div>"#
    )
}

pub fn programacao_page(usuario: &User, quadro: &Quadro) -> Html<String> {
    let inicio = quadro.dias[0];
    let fim = quadro.dias[quadro.dias.len() - 1];
    let content = format!(
        r#"
        <style>{CSS}</style>
        <h1>Programação de Ordens de Serviço</h1>
        <div class="semana-nav">
            <a class="btn btn-neutro" href="/programacao?semana={anterior}">◀ Semana anterior</a>
            <strong>{inicio_br} a {fim_br}</strong>
            <a class="btn btn-neutro" href="/programacao?semana={proxima}">Próxima semana ▶</a>
            <a class="btn" href="/programacao">Hoje</a>
        </div>
        {quadro}
        <div id="menu-contexto">
            <button onclick="desprogramarMenu()">Desprogramar</button>
        </div>
        <script>{JS}</script>
        "#,
        anterior = quadro.semana_anterior().format("%Y-%m-%d"),
        proxima = quadro.proxima_semana().format("%Y-%m-%d"),
        inicio_br = formatar_data_br(inicio),
        fim_br = formatar_data_br(fim),
        quadro = render_quadro(quadro),
    );
    render_page("Programação", Some(usuario), content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ordens::StatusOs;
    use crate::services::programacao_service::montar_quadro;
    use crate::store::EstadoProgramacao;

    fn estado() -> EstadoProgramacao {
        EstadoProgramacao {
            ordens: vec![
                OrdemServico { id: 7, descricao: "Trocar <rolamento>".into(), prioridade: Some("alta".into()), ..Default::default() },
                OrdemServico {
                    id: 8,
                    status: StatusOs::Programada,
                    data_programada: Some("2025-03-11".into()),
                    usuario_responsavel: Some("Maria Santos".into()),
                    ..Default::default()
                },
            ],
            tecnicos: vec![User { id: 3, name: "Maria Santos".into(), ..Default::default() }],
            versao: 1,
        }
    }

    #[test]
    fn board_has_five_lanes_and_seven_days() {
        let quadro = montar_quadro(&estado(), NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        let html = render_quadro(&quadro);
        assert_eq!(html.matches(r#"data-alvo="raia""#).count(), 5);
        assert_eq!(html.matches(r#"data-alvo="celula""#).count(), 7);
        assert!(html.contains(r#"data-semana="2025-03-10""#));
        assert!(html.contains("Trocar &lt;rolamento&gt;"));
    }

    #[test]
    fn scheduled_card_sits_in_its_cell() {
        let quadro = montar_quadro(&estado(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let html = render_quadro(&quadro);
        let celula = html
            .split(r#"data-data="2025-03-11""#)
            .nth(1)
            .and_then(|resto| resto.split("</td>").next())
            .unwrap();
        assert!(celula.contains(r#"data-os-id="8""#));
        assert!(celula.contains(r#"data-programada="true""#));
    }

    #[test]
    fn page_links_adjacent_weeks() {
        let quadro = montar_quadro(&estado(), NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        let Html(html) = programacao_page(&User::default(), &quadro);
        assert!(html.contains("/programacao?semana=2025-03-03"));
        assert!(html.contains("/programacao?semana=2025-03-17"));
        assert!(html.contains("10/03/2025 a 16/03/2025"));
        assert!(html.contains("new EventSource('/eventos')"));
    }
}
