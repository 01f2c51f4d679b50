// src/views/pmp.rs

use axum::response::Html;
use serde_json::Value;

use crate::{
    common::format::escapar_html as esc,
    models::{
        ativos::Equipamento,
        plano::{AtividadePlano, PainelPmp},
        usuarios::User,
    },
    services::pmp_service::GrupoPmp,
    views::layout::{opt, render_page},
};

const CSS: &str = r#"
    .pmp { border-left: 4px solid var(--primary-color); }
    .pmp.inativa { border-left-color: var(--text-light); opacity: 0.85; }
    .pmp-cabecalho { display: flex; gap: 10px; align-items: flex-end; flex-wrap: wrap; margin-bottom: 10px; }
    .pmp-cabecalho input[name=codigo] { width: 200px; }
    .pmp-cabecalho input[name=descricao] { flex: 1; min-width: 300px; }
    .atividade-inativa td { color: var(--text-light); text-decoration: line-through; }
    .painel { display: flex; gap: 20px; text-align: center; }
    .painel .numero { font-size: 2.2em; font-weight: 700; color: var(--primary-dark); }
    .form-atividade { display: grid; grid-template-columns: repeat(4, 1fr); gap: 8px; }
"#;

const JS: &str = r#"
    function equipamentoId() { return document.getElementById('pmp-editor').dataset.equipamentoId; }

    async function salvarPmp(ev, pmpId) {
        ev.preventDefault();
        const f = ev.target;
        const atividades_ids = [...f.querySelectorAll('input[name=atividade]:checked')].map(i => Number(i.value));
        const r = await enviarAcao('POST', `/pmp/equipamento/${equipamentoId()}/pmps`, {
            pmp_id: pmpId,
            codigo: f.codigo.value,
            descricao: f.descricao.value,
            atividades_ids,
        });
        if (r.success) location.reload();
    }

    function dadosAtividade(f) {
        const dados = Object.fromEntries(new FormData(f).entries());
        dados.valor_frequencia = dados.valor_frequencia ? Number(dados.valor_frequencia) : null;
        dados.status_ativo = f.status_ativo ? f.status_ativo.checked : true;
        for (const k of ['conjunto', 'ponto_controle', 'condicao']) if (!dados[k]) dados[k] = null;
        return dados;
    }

    async function criarAtividade(ev) {
        ev.preventDefault();
        const r = await enviarAcao('POST', `/pmp/equipamento/${equipamentoId()}/atividades`, dadosAtividade(ev.target));
        if (r.success) location.reload();
    }

    function editarAtividade(botao) {
        const a = JSON.parse(botao.dataset.atividade);
        const f = document.getElementById('form-editar-atividade');
        for (const k of ['descricao', 'oficina', 'tipo_manutencao', 'frequencia', 'conjunto', 'ponto_controle', 'valor_frequencia', 'condicao']) {
            f[k].value = a[k] ?? '';
        }
        f.status_ativo.checked = !!a.status_ativo;
        f.dataset.id = a.id;
        abrirModal('modal-atividade');
    }

    async function salvarAtividade(ev) {
        ev.preventDefault();
        const f = ev.target;
        const r = await enviarAcao('PUT', `/pmp/equipamento/${equipamentoId()}/atividades/${f.dataset.id}`, dadosAtividade(f));
        if (r.success) location.reload();
    }

    async function acaoAtividade(id, acao) {
        const r = await enviarAcao('POST', `/pmp/equipamento/${equipamentoId()}/atividades/${id}/${acao}`);
        if (r.success) location.reload();
    }

    async function excluirAtividade(id) {
        if (!confirm('Excluir esta atividade do plano?')) return;
        const r = await enviarAcao('DELETE', `/pmp/equipamento/${equipamentoId()}/atividades/${id}`);
        if (r.success) location.reload();
    }
"#;

fn campos_atividade(com_status: bool) -> String {
    let status = if com_status {
        r#"<label><input type="checkbox" name="status_ativo"> Ativa</label>"#
    } else {
        ""
    };
    format!(
        r#"<div class="form-atividade">
            <div><label>Descrição</label><input name="descricao" required></div>
            <div><label>Oficina</label><input name="oficina" required></div>
            <div><label>Tipo de manutenção</label><input name="tipo_manutencao" required></div>
            <div><label>Frequência</label><input name="frequencia" required></div>
            <div><label>Conjunto</label><input name="conjunto"></div>
            <div><label>Ponto de controle</label><input name="ponto_controle"></div>
            <div><label>Valor da frequência</label><input name="valor_frequencia" type="number" min="1"></div>
            <div><label>Condição</label><input name="condicao"></div>
        </div>
        {status}"#
    )
}

fn linha_atividade(a: &AtividadePlano) -> String {
    let Some(id) = a.id else {
        return String::new();
    };
    let json = serde_json::to_string(a).unwrap_or_default();
    let (classe, alternar) = if a.status_ativo { ("", "Desativar") } else { (" class=\"atividade-inativa\"", "Ativar") };
    format!(
        r#"<tr{classe}>
            <td><input type="checkbox" name="atividade" value="{id}" checked></td>
            <td>{descricao}</td>
            <td>{conjunto}</td>
            <td>{ponto}</td>
            <td>{valor}</td>
            <td>{condicao}</td>
            <td style="white-space:nowrap">
                <button type="button" class="btn btn-sm" data-atividade="{json}" onclick="editarAtividade(this)">Editar</button>
                <button type="button" class="btn btn-sm btn-neutro" onclick="acaoAtividade({id}, 'copiar')">Copiar</button>
                <button type="button" class="btn btn-sm btn-neutro" onclick="acaoAtividade({id}, 'alternar')">{alternar}</button>
                <button type="button" class="btn btn-sm btn-perigo" onclick="excluirAtividade({id})">Excluir</button>
            </td>
        </tr>"#,
        descricao = esc(&a.descricao),
        conjunto = opt(a.conjunto.as_deref()),
        ponto = opt(a.ponto_controle.as_deref()),
        valor = a.valor_frequencia.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
        condicao = opt(a.condicao.as_deref()),
        json = esc(&json),
    )
}

fn render_grupo(grupo: &GrupoPmp) -> String {
    let pmp = &grupo.pmp;
    let pmp_id = pmp.id.map(|i| i.to_string()).unwrap_or_else(|| "null".into());
    let situacao = if pmp.id.is_some() { "Salva" } else { "Não salva" };
    let linhas: String = grupo.atividades.iter().map(linha_atividade).collect();
    format!(
        r#"<div class="card pmp{inativa}">
            <form onsubmit="salvarPmp(event, {pmp_id})">
                <div class="pmp-cabecalho">
                    <div><label>Código</label><input name="codigo" value="{codigo}" required></div>
                    <div style="flex:1"><label>Descrição</label><input name="descricao" value="{descricao}" required style="width:100%"></div>
                    <button class="btn btn-ok" type="submit">Salvar PMP</button>
                </div>
                <div class="muted">{oficina} · {tipo} · {frequencia} · {situacao}</div>
                <table>
                    <thead><tr><th></th><th>Atividade</th><th>Conjunto</th><th>Ponto de controle</th><th>Valor freq.</th><th>Condição</th><th>Ações</th></tr></thead>
                    <tbody>{linhas}</tbody>
                </table>
            </form>
        </div>"#,
        inativa = if pmp.status_ativo { "" } else { " inativa" },
        codigo = esc(&pmp.codigo),
        descricao = esc(&pmp.descricao),
        oficina = esc(&pmp.oficina),
        tipo = esc(&pmp.tipo_manutencao),
        frequencia = esc(&pmp.frequencia),
    )
}

pub fn pmp_page(usuario: &User, equipamento: &Equipamento, grupos: &[GrupoPmp]) -> Html<String> {
    let grupos_html: String = if grupos.is_empty() {
        r#"<div class="card muted">Nenhuma atividade cadastrada para este equipamento.</div>"#.to_string()
    } else {
        grupos.iter().map(render_grupo).collect()
    };

    let content = format!(
        r#"
        <style>{CSS}</style>
        <div id="pmp-editor" data-equipamento-id="{id}">
            <h1>Plano de Manutenção · {tag}</h1>
            <p class="muted">{descricao}</p>
            {grupos_html}
            <div class="card">
                <h3>Nova atividade</h3>
                <form onsubmit="criarAtividade(event)">
                    {campos_novos}
                    <div style="margin-top:10px"><button class="btn btn-ok" type="submit">Adicionar</button></div>
                </form>
            </div>
        </div>

        <div class="modal-fundo" id="modal-atividade">
            <div class="modal">
                <h2>Editar atividade</h2>
                <form id="form-editar-atividade" onsubmit="salvarAtividade(event)">
                    {campos_edicao}
                    <div style="margin-top:10px; text-align:right">
                        <button type="button" class="btn btn-neutro" onclick="fecharModal('modal-atividade')">Cancelar</button>
                        <button class="btn btn-ok" type="submit">Salvar</button>
                    </div>
                </form>
            </div>
        </div>
        <script>{JS}</script>
        "#,
        id = equipamento.id,
        tag = esc(&equipamento.tag),
        descricao = esc(&equipamento.descricao),
        campos_novos = campos_atividade(false),
        campos_edicao = campos_atividade(true),
    );
    render_page("Plano de Manutenção", Some(usuario), content)
}

fn extra(valor: &Value) -> String {
    match valor {
        Value::String(s) => esc(s),
        Value::Null => "-".into(),
        outro => esc(&outro.to_string()),
    }
}

/// Painel da PMP; `painel` ausente quando o backend não respondeu.
pub fn painel_page(usuario: &User, painel: Option<&PainelPmp>, equipamentos: &[Equipamento]) -> Html<String> {
    let painel_html = match painel {
        Some(p) => {
            let extras: String = p
                .extras
                .iter()
                .filter(|(_, v)| !v.is_object() && !v.is_array())
                .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>", esc(k), extra(v)))
                .collect();
            format!(
                r#"<div class="painel">
                    <div><div class="numero">{}</div><div class="muted">PMPs</div></div>
                    <div><div class="numero">{}</div><div class="muted">OS geradas</div></div>
                    <div><div class="numero">{}</div><div class="muted">OS pendentes</div></div>
                    <div><div class="numero">{}</div><div class="muted">OS concluídas</div></div>
                </div>
                <table style="margin-top:12px">{extras}</table>"#,
                p.total_pmps, p.os_geradas, p.os_pendentes, p.os_concluidas
            )
        }
        None => r#"<p class="muted">Painel indisponível no momento.</p>"#.to_string(),
    };

    let lista: String = equipamentos
        .iter()
        .map(|e| {
            format!(
                r#"<tr><td><a href="/pmp/equipamento/{id}">{tag}</a></td><td>{descricao}</td></tr>"#,
                id = e.id,
                tag = esc(&e.tag),
                descricao = esc(&e.descricao),
            )
        })
        .collect();

    let content = format!(
        r#"
        <style>{CSS}</style>
        <h1>Manutenção Preventiva</h1>
        <div class="card">
            {painel_html}
            <div style="margin-top:14px">
                <button class="btn btn-ok" onclick="gerarPendentes()">Gerar OS pendentes</button>
            </div>
        </div>
        <div class="card">
            <h3>Equipamentos</h3>
            <table><thead><tr><th>TAG</th><th>Descrição</th></tr></thead><tbody>{lista}</tbody></table>
        </div>
        <script>
            async function gerarPendentes() {{
                if (!confirm('Gerar agora as OS preventivas pendentes?')) return;
                const r = await enviarAcao('POST', '/pmp/gerar-os-pendentes');
                if (r.success) setTimeout(() => location.reload(), 1200);
            }}
        </script>
        "#
    );
    render_page("Manutenção Preventiva", Some(usuario), content)
}
